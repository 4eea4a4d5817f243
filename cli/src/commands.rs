pub mod discover;
pub mod host;
pub mod scan;
pub mod wireless;

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};
use netsurvey_common::config::{ScanConfig, TcpTechnique};

#[derive(Parser)]
#[command(name = "netsurvey", version)]
#[command(about = "Network reconnaissance: host discovery, port and service scanning, fingerprinting and IoT survey.")]
pub struct CommandLine {
    #[command(subcommand)]
    pub command: Commands,

    /// TOML file overriding the default scan configuration
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Overall time budget of a scan in seconds
    #[arg(long, global = true, value_name = "SECS")]
    pub deadline: Option<u64>,

    /// Skip reverse DNS lookups
    #[arg(long, global = true)]
    pub no_dns: bool,

    /// Half-open SYN port scanning (requires root)
    #[arg(long, global = true)]
    pub syn: bool,

    /// Print the result as JSON instead of a tree
    #[arg(long, global = true)]
    pub json: bool,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the responsive hosts of a range
    #[command(alias = "d")]
    Discover { range: String },
    /// Discover a range and scan the ports of every responsive host
    #[command(alias = "s")]
    Scan {
        range: String,
        /// quick or full
        #[arg(short = 't', long = "type", default_value = "quick")]
        scan_type: String,
    },
    /// Scan a single address
    Host {
        ip: String,
        /// quick or full
        #[arg(short = 't', long = "type", default_value = "quick")]
        scan_type: String,
    },
    /// Nearby access points and IoT devices on the local network or a range
    #[command(alias = "w")]
    Wireless { range: Option<String> },
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// The configuration file, if any, with the command line flags applied on top.
    pub fn scan_config(&self) -> anyhow::Result<ScanConfig> {
        let mut config = match &self.config {
            Some(path) => ScanConfig::load(path)?,
            None => ScanConfig::default(),
        };
        if let Some(secs) = self.deadline {
            config.scan_deadline_secs = secs;
        }
        if self.no_dns {
            config.resolve_hostnames = false;
        }
        if self.syn {
            config.tcp_technique = TcpTechnique::Syn;
        }
        config.validate()?;
        Ok(config)
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_defaults() {
        let cli = CommandLine::parse_from([
            "netsurvey", "scan", "10.0.0.0/24", "-t", "full", "--deadline", "30", "--no-dns", "--syn",
        ]);
        let config = cli.scan_config().unwrap();
        assert_eq!(config.scan_deadline_secs, 30);
        assert!(!config.resolve_hostnames);
        assert_eq!(config.tcp_technique, TcpTechnique::Syn);
        assert!(matches!(cli.command, Commands::Scan { ref scan_type, .. } if scan_type == "full"));
    }

    #[test]
    fn wireless_range_is_optional() {
        let cli = CommandLine::parse_from(["netsurvey", "wireless", "--json"]);
        assert!(cli.json);
        assert!(matches!(cli.command, Commands::Wireless { range: None }));
    }
}
