//! Service identification from banners.
//!
//! A banner is whatever a service sent after connecting, or in answer to the
//! request from [`crate::payloads`]. Identification looks at protocol magic
//! first and then at textual markers; the version is whatever product string
//! the service volunteers.

use std::sync::LazyLock;

use regex::Regex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceGuess {
    pub service: &'static str,
    pub version: Option<String>,
}

impl ServiceGuess {
    fn new(service: &'static str, version: Option<String>) -> Self {
        Self { service, version }
    }
}

static SSH_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^SSH-[\d.]+-([^\s\r\n]+)").expect("valid regex"));
static SERVER_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?im)^server:[ \t]*([^\r\n]+)").expect("valid regex"));
static PARENTHESIZED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(([^)]+)\)").expect("valid regex"));
static MAIL_PRODUCT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(postfix|exim [\d.]+|sendmail [\d./]+|dovecot|courier)").expect("valid regex")
});
static REDIS_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"redis_version:([\d.]+)").expect("valid regex"));
static DOTTED_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+\.\d+\.\d+[\w.\-]*)").expect("valid regex"));
static RFB_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^RFB (\d{3})\.(\d{3})").expect("valid regex"));

/// Identifies the service that produced `banner`. `None` when nothing matches.
pub fn identify(banner: &[u8]) -> Option<ServiceGuess> {
    if banner.is_empty() {
        return None;
    }
    if let Some(guess) = identify_binary(banner) {
        return Some(guess);
    }

    let text = String::from_utf8_lossy(banner);
    let text = text.trim_start();
    let lower = text.to_lowercase();

    if text.starts_with("SSH-") {
        let version = capture(&SSH_VERSION, text).map(|v| v.replace('_', " "));
        return Some(ServiceGuess::new("ssh", version));
    }
    if text.starts_with("RTSP/") {
        return Some(ServiceGuess::new("rtsp", capture(&SERVER_HEADER, text)));
    }
    if text.starts_with("HTTP/") {
        return Some(ServiceGuess::new("http", capture(&SERVER_HEADER, text)));
    }
    if text.starts_with("RFB ") {
        let version = RFB_VERSION.captures(text).map(|caps| {
            let major: u32 = caps[1].parse().unwrap_or_default();
            let minor: u32 = caps[2].parse().unwrap_or_default();
            format!("RFB {major}.{minor}")
        });
        return Some(ServiceGuess::new("vnc", version));
    }
    if text.starts_with("220") && lower.contains("ftp") {
        return Some(ServiceGuess::new("ftp", capture(&PARENTHESIZED, text)));
    }
    if text.starts_with("220") && (lower.contains("smtp") || lower.contains("mail")) {
        return Some(ServiceGuess::new("smtp", capture(&MAIL_PRODUCT, text)));
    }
    if text.starts_with("+OK") {
        return Some(ServiceGuess::new("pop3", capture(&MAIL_PRODUCT, text)));
    }
    if text.starts_with("* OK") {
        return Some(ServiceGuess::new("imap", capture(&MAIL_PRODUCT, text)));
    }
    if text.starts_with("+PONG") || lower.contains("redis_version") || text.starts_with("-NOAUTH") {
        return Some(ServiceGuess::new("redis", capture(&REDIS_VERSION, text)));
    }
    if lower.contains("mysql_native_password") || lower.contains("mariadb") {
        return Some(ServiceGuess::new("mysql", capture(&DOTTED_VERSION, text)));
    }
    if lower.contains("login:") || lower.contains("busybox") {
        return Some(ServiceGuess::new("telnet", None));
    }
    None
}

fn identify_binary(banner: &[u8]) -> Option<ServiceGuess> {
    match banner {
        // MQTT CONNACK
        [0x20, 0x02, ..] => Some(ServiceGuess::new("mqtt", None)),
        // Telnet IAC negotiation
        [0xff, 0xfb..=0xfe, ..] => Some(ServiceGuess::new("telnet", None)),
        // CoAP ACK echoing the message id of the discovery request
        [0x60..=0x68, _, 0x12, 0x34, ..] => Some(ServiceGuess::new("coap", None)),
        _ => None,
    }
}

fn capture(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|v| !v.is_empty())
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
