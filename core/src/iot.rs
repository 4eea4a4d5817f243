//! # IoT Classification
//!
//! Scores a scanned host against the IoT rules of the signature table. The
//! score is a plain sum evaluated in a fixed order, so the same host always
//! yields the same confidence and notes.

use std::collections::BTreeMap;
use std::sync::Arc;

use netsurvey_common::network::host::{Host, PortState};
use netsurvey_common::signatures::SignatureTable;
use netsurvey_common::wireless::IoTDevice;

pub struct IotClassifier {
    signatures: Arc<SignatureTable>,
}

impl IotClassifier {
    pub fn new(signatures: Arc<SignatureTable>) -> Self {
        Self { signatures }
    }

    /// `Some` when the host scores above the threshold.
    ///
    /// `banners` maps TCP port numbers to the text the service sent.
    pub fn classify(&self, host: &Host, banners: &BTreeMap<u16, String>) -> Option<IoTDevice> {
        let rules = &self.signatures.iot;
        let mut score = 0.0_f64;
        let mut notes: Vec<String> = Vec::new();

        if let Some(vendor) = &host.vendor {
            let lower = vendor.to_lowercase();
            if rules.vendors.iter().any(|known| lower.contains(known.as_str())) {
                score += rules.vendor_weight;
                notes.push(format!("IoT vendor: {vendor}"));
            }
        }

        let open: Vec<_> = host.ports.iter().filter(|p| p.state == PortState::Open).collect();
        for port in &open {
            if let Some(rule) = rules
                .ports
                .iter()
                .find(|rule| rule.port == port.number && rule.protocol == port.protocol)
            {
                score += rule.weight;
                notes.push(format!("{} port {}/{}", rule.label, port.number, port.protocol));
            }
        }

        let texts = banners
            .values()
            .map(String::as_str)
            .chain(open.iter().filter_map(|p| p.version.as_deref()));
        if let Some(keyword) = first_keyword(&rules.banner_keywords, texts) {
            score += rules.banner_weight;
            notes.push(format!("embedded banner: {keyword}"));
        }

        let general_purpose = open
            .iter()
            .any(|p| rules.general_purpose_ports.contains(&p.number));
        if !open.is_empty() && !general_purpose {
            score += rules.no_general_purpose_weight;
            notes.push("no general-purpose OS services".to_string());
        }

        let confidence = round2(score.min(1.0));
        if confidence <= rules.threshold || confidence <= 0.0 {
            return None;
        }

        Some(IoTDevice {
            ip: host.ip,
            hostname: host.hostname.clone(),
            vendor: host.vendor.clone(),
            os: host.os.clone(),
            ports: host.ports.clone(),
            confidence,
            notes: Some(notes.join("; ")),
        })
    }
}

fn first_keyword<'a, 'k>(keywords: &'k [String], texts: impl Iterator<Item = &'a str>) -> Option<&'k str> {
    let haystack: Vec<String> = texts.map(str::to_lowercase).collect();
    keywords
        .iter()
        .find(|keyword| haystack.iter().any(|text| text.contains(keyword.as_str())))
        .map(String::as_str)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
