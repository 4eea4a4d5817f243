mod commands;
mod terminal;

use commands::{CommandLine, Commands};
use terminal::{logging, print};
use tracing::warn;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CommandLine::parse_args();
    logging::init(cli.verbose);
    if !cli.json {
        print::banner();
    }

    if cli.syn && !is_root::is_root() {
        warn!("--syn needs root; ports will be probed with full handshakes");
    }

    let config = cli.scan_config()?;
    let engine = netsurvey_core::system_engine(config)?;
    let json = cli.json;

    match cli.command {
        Commands::Discover { range } => commands::discover::discover(&engine, &range, json).await,
        Commands::Scan { range, scan_type } => {
            commands::scan::scan(&engine, &range, &scan_type, json).await
        }
        Commands::Host { ip, scan_type } => commands::host::host(&engine, &ip, &scan_type, json).await,
        Commands::Wireless { range } => {
            commands::wireless::wireless(&engine, range.as_deref(), json).await
        }
    }
}
