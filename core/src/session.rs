//! The device-interaction **abstraction**.
//!
//! A [`Connector`] opens a [`CommandChannel`] to one device; [`Session`] wraps that channel
//! with the behaviour every caller relies on: rejected commands become
//! [`DeviceError::Command`], structured mode runs the output through the command's
//! template, and [`Session::close`] always releases the connection.
//!
//! Callers follow one shape so the session is released on every exit path:
//!
//! ```ignore
//! let mut session = Session::open(connector, endpoint).await?;
//! let result = do_work(&mut session).await;
//! session.close().await;
//! result
//! ```
//!
//! If a task is cancelled or panics in between, dropping the channel tears the
//! connection down.

use async_trait::async_trait;
use edgemap_common::{
    debug,
    error::DeviceError,
    network::device::DeviceEndpoint,
    warn,
};
use edgemap_protocols::cli::{ios, ParsedRow};

pub mod scripted;
pub mod ssh;

/// A live command-response channel to one device.
#[async_trait]
pub trait CommandChannel: Send {
    /// Runs one exec-mode command and returns everything the device printed.
    async fn send_command(&mut self, command: &str) -> Result<String, DeviceError>;

    /// Enters configuration mode, applies `lines` in order and leaves it again.
    async fn send_config_set(&mut self, lines: &[String]) -> Result<String, DeviceError>;

    async fn close(&mut self) -> Result<(), DeviceError>;
}

/// Opens channels. Authentication, reachability and negotiation failures all surface as
/// [`DeviceError::Connection`].
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, endpoint: &DeviceEndpoint) -> Result<Box<dyn CommandChannel>, DeviceError>;
}

pub struct Session {
    host: String,
    channel: Box<dyn CommandChannel>,
}

impl Session {
    pub async fn open(connector: &dyn Connector, endpoint: &DeviceEndpoint) -> Result<Self, DeviceError> {
        debug!(host = endpoint.address(), class = ?endpoint.class(), "opening session");
        let channel = connector.connect(endpoint).await?;
        Ok(Self {
            host: endpoint.address().to_string(),
            channel,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Runs `command` and returns its output verbatim.
    pub async fn run_raw(&mut self, command: &str) -> Result<String, DeviceError> {
        debug!(host = %self.host, command, "sending command");
        let output = self.channel.send_command(command).await?;
        self.check_rejection(command, &output)?;
        Ok(output)
    }

    /// Runs `command` and structures its output with the command's template.
    pub async fn run_parsed(&mut self, command: &str) -> Result<Vec<ParsedRow>, DeviceError> {
        let output = self.run_raw(command).await?;
        ios::parse(command, &output)
            .ok_or_else(|| DeviceError::command(&self.host, command, "no template for command"))
    }

    pub async fn send_config_set(&mut self, lines: &[String]) -> Result<String, DeviceError> {
        debug!(host = %self.host, lines = lines.len(), "sending configuration set");
        let output = self.channel.send_config_set(lines).await?;
        let summary = lines.first().map(String::as_str).unwrap_or("configure terminal");
        self.check_rejection(summary, &output)?;
        Ok(output)
    }

    /// Releases the connection. A failure to close cleanly is logged, never returned:
    /// the work done on the session already succeeded or failed on its own.
    pub async fn close(mut self) {
        if let Err(e) = self.channel.close().await {
            warn!(host = %self.host, "failed to close session cleanly: {e}");
        }
    }

    fn check_rejection(&self, command: &str, output: &str) -> Result<(), DeviceError> {
        match ios::rejection(output) {
            Some(complaint) => Err(DeviceError::command(&self.host, command, complaint)),
            None => Ok(()),
        }
    }
}
