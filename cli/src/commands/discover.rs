use std::time::Instant;

use colored::*;
use netsurvey_common::scanning::NetworkScanner;
use netsurvey_core::ScanEngine;
use tracing::Instrument;

use crate::terminal::{colors, format, print, spinner};

pub async fn discover(engine: &ScanEngine, range: &str, json: bool) -> anyhow::Result<()> {
    let started: Instant = Instant::now();
    let hosts: Vec<String> = engine
        .discover_hosts(range)
        .instrument(spinner::running(format!("Discovering hosts in {range}")))
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&hosts)?);
        return Ok(());
    }

    if hosts.is_empty() {
        print::header("zero hosts detected");
        print::no_results();
        return Ok(());
    }

    print::header("host discovery");
    for (idx, host) in hosts.iter().enumerate() {
        print::tree_head(idx, host);
        if let Ok(ip) = host.parse() {
            print::as_tree_one_level(vec![format::ip_to_detail(&ip)]);
        }
    }

    let active: ColoredString = format!("{} active hosts", hosts.len()).bold().green();
    let total_time: ColoredString = format!("{:.2}s", started.elapsed().as_secs_f64()).bold().yellow();
    print::fat_separator();
    print::centerln(
        &format!("Discovery Complete: {active} identified in {total_time}")
            .color(colors::TEXT_DEFAULT)
            .to_string(),
    );
    Ok(())
}
