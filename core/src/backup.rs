//! Running-configuration backups.
//!
//! One file per device per invocation:
//! `<dir>/<%Y-%m-%d-%H-%M-%S>-<address>-backup.config`, holding the output of
//! `show running-config` verbatim. The directory is created when missing.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use edgemap_common::{error::DeviceError, info, network::device::DeviceEndpoint};
use edgemap_protocols::cli::ios;
use thiserror::Error;

use crate::session::{Connector, Session};

pub const DEFAULT_BACKUP_DIR: &str = "config_backup_files";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d-%H-%M-%S";

#[derive(Debug, Error)]
pub enum BackupError {
    #[error(transparent)]
    Device(#[from] DeviceError),

    #[error("cannot write backup {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub fn backup_file_name(address: &str, at: DateTime<Local>) -> String {
    format!("{}-{address}-backup.config", at.format(TIMESTAMP_FORMAT))
}

/// Saves the running configuration of the device behind `session`.
pub async fn backup_running_config(session: &mut Session, dir: &Path) -> Result<PathBuf, BackupError> {
    backup_running_config_at(session, dir, Local::now()).await
}

pub async fn backup_running_config_at(
    session: &mut Session,
    dir: &Path,
    at: DateTime<Local>,
) -> Result<PathBuf, BackupError> {
    let config = session.run_raw(ios::SHOW_RUNNING_CONFIG).await?;

    tokio::fs::create_dir_all(dir).await.map_err(|source| BackupError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let path = dir.join(backup_file_name(session.host(), at));
    tokio::fs::write(&path, config).await.map_err(|source| BackupError::Io {
        path: path.clone(),
        source,
    })?;

    info!(host = session.host(), path = %path.display(), "running-config saved");
    Ok(path)
}

/// Opens a session to `endpoint` just to back it up.
pub async fn backup_device(
    connector: &dyn Connector,
    endpoint: &DeviceEndpoint,
    dir: &Path,
) -> Result<PathBuf, BackupError> {
    let mut session = Session::open(connector, endpoint).await?;
    let result = backup_running_config(&mut session, dir).await;
    session.close().await;
    result
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::TimeZone;
    use edgemap_common::network::device::Credentials;

    use super::*;
    use crate::session::scripted::{ScriptedConnector, ScriptedDevice};

    const RUNNING: &str = "Building configuration...\n\nhostname sw1\n!\nend\n";

    fn endpoint() -> DeviceEndpoint {
        DeviceEndpoint::new("10.0.1.11", Arc::new(Credentials::new("u", "p")))
    }

    #[test]
    fn file_name_carries_timestamp_and_address() {
        let at = Local.with_ymd_and_hms(2024, 3, 7, 9, 5, 1).unwrap();
        assert_eq!(
            backup_file_name("10.0.1.11", at),
            "2024-03-07-09-05-01-10.0.1.11-backup.config"
        );
    }

    #[tokio::test]
    async fn backup_writes_config_verbatim_into_new_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("config_backup_files");
        let connector = ScriptedConnector::new()
            .with_device("10.0.1.11", ScriptedDevice::new().respond(ios::SHOW_RUNNING_CONFIG, RUNNING));

        let path = backup_device(&connector, &endpoint(), &dir).await.unwrap();

        assert!(path.starts_with(&dir));
        assert!(path.to_string_lossy().ends_with("-10.0.1.11-backup.config"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), RUNNING);
        assert_eq!(connector.open_sessions(), 0);
    }

    #[tokio::test]
    async fn rejected_command_writes_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("backups");
        let connector = ScriptedConnector::new().with_device("10.0.1.11", ScriptedDevice::new());

        let err = backup_device(&connector, &endpoint(), &dir).await.unwrap_err();

        assert!(matches!(err, BackupError::Device(DeviceError::Command { .. })));
        assert!(!dir.exists());
    }
}
