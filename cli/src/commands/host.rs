use netsurvey_common::network::host::Host;
use netsurvey_common::scanning::ScanType;
use netsurvey_core::ScanEngine;
use tracing::Instrument;

use crate::terminal::{format, print, spinner};

pub async fn host(engine: &ScanEngine, ip: &str, scan_type: &str, json: bool) -> anyhow::Result<()> {
    let scan_type: ScanType = scan_type.parse()?;
    let host: Host = engine
        .scan_host_with(ip, scan_type)
        .instrument(spinner::running(format!("Scanning {ip}")))
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&host)?);
        return Ok(());
    }

    print::header("host scan");
    print::tree_head(0, &format::host_title(&host));
    print::as_tree_one_level(format::host_details(&host));
    if host.is_up() && host.open_ports().next().is_none() {
        print::print_status("no open ports found");
    }
    Ok(())
}
