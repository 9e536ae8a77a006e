pub mod audit;
pub mod backup;
pub mod deploy;

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};
use edgemap_core::backup::DEFAULT_BACKUP_DIR;

#[derive(Parser)]
#[command(name = "edgemap")]
#[command(about = "Find out who is plugged in where on Cisco IOS access switches.")]
#[command(version)]
pub struct CommandLine {
    #[command(subcommand)]
    pub command: Commands,

    /// YAML file listing the router, switches, VLANs and DNS servers
    #[arg(short, long, global = true, default_value = "config.yml")]
    pub config: PathBuf,

    /// Device login; prompted for when omitted
    #[arg(short, long, global = true)]
    pub username: Option<String>,

    /// More output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Correlate access ports with MAC, IP and DNS identity
    #[command(alias = "a")]
    Audit {
        /// Abort the whole run when one switch fails
        #[arg(long)]
        fail_fast: bool,
        /// Also write the report as CSV
        #[arg(long)]
        csv: Option<PathBuf>,
        /// Also write the report as a spreadsheet, one sheet per switch
        #[arg(long)]
        xlsx: Option<PathBuf>,
    },
    /// Back up, then push interface configuration to every device
    #[command(alias = "d")]
    Deploy {
        #[arg(long, default_value = DEFAULT_BACKUP_DIR)]
        backup_dir: PathBuf,
    },
    /// Save the running configuration of every device
    #[command(alias = "b")]
    Backup {
        #[arg(long, default_value = DEFAULT_BACKUP_DIR)]
        backup_dir: PathBuf,
    },
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
