mod commands;
mod terminal;

use std::sync::Arc;

use anyhow::Context;
use commands::{audit, backup, deploy, CommandLine, Commands};
use edgemap_common::config::ConfigFile;
use terminal::{logging, print, prompt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let commands = CommandLine::parse_args();

    logging::init_logging(commands.verbose);
    print::banner();

    let config = ConfigFile::from_path(&commands.config)
        .with_context(|| format!("loading {}", commands.config.display()))?;
    let credentials = Arc::new(prompt::credentials(commands.username.as_deref())?);

    match commands.command {
        Commands::Audit { fail_fast, csv, xlsx } => {
            print::header("starting edge audit");
            let opts = audit::AuditOptions { fail_fast, csv, xlsx };
            audit::audit(&config, credentials, opts).await
        }
        Commands::Deploy { backup_dir } => {
            print::header("interface deployment");
            deploy::deploy(&config, credentials, &backup_dir).await
        }
        Commands::Backup { backup_dir } => {
            print::header("running-config backup");
            backup::backup(&config, credentials, &backup_dir).await
        }
    }
}
