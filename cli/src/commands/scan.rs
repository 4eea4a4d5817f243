use colored::*;
use netsurvey_common::network::topology::NetworkTopology;
use netsurvey_core::ScanEngine;
use tracing::Instrument;

use crate::terminal::{colors, format, print, spinner};

pub async fn scan(engine: &ScanEngine, range: &str, scan_type: &str, json: bool) -> anyhow::Result<()> {
    let topology: NetworkTopology = engine
        .scan_network_with_deadline(range, scan_type, engine.config().deadline())
        .instrument(spinner::running(format!("Running {scan_type} scan of {range}")))
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&topology)?);
        return Ok(());
    }

    print_topology(&topology);
    Ok(())
}

pub fn print_topology(topology: &NetworkTopology) {
    if topology.hosts.is_empty() {
        print::header("zero hosts detected");
        print::no_results();
    } else {
        print::header("network scan");
        for (idx, host) in topology.hosts.iter().enumerate() {
            print::tree_head(idx, &format::host_title(host));
            print::as_tree_one_level(format::host_details(host));
        }
    }

    let active: ColoredString = format!("{} of {}", topology.active_hosts, topology.total_hosts)
        .bold()
        .green();
    let total_time: ColoredString = format!("{:.2}s", topology.duration).bold().yellow();
    print::fat_separator();
    print::centerln(
        &format!("Scan Complete: {active} hosts active in {total_time}")
            .color(colors::TEXT_DEFAULT)
            .to_string(),
    );
    print::print_status(format!("scan id {}", topology.scan_id));
}
