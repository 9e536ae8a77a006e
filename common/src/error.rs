//! Failure taxonomy shared by the device, resolver and configuration layers.
//!
//! Unparsable rows and ARP misses are not errors at all: they are dropped where they
//! occur. Only failures that end a device's contribution travel as [`DeviceError`].

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeviceError {
    /// Unreachable host, failed authentication or protocol negotiation.
    #[error("cannot connect to {host}: {reason}")]
    Connection { host: String, reason: String },

    /// The device rejected the command or the session dropped while it ran.
    #[error("{host} failed `{command}`: {reason}")]
    Command {
        host: String,
        command: String,
        reason: String,
    },
}

impl DeviceError {
    pub fn connection(host: impl Into<String>, reason: impl ToString) -> Self {
        Self::Connection {
            host: host.into(),
            reason: reason.to_string(),
        }
    }

    pub fn command(host: impl Into<String>, command: impl Into<String>, reason: impl ToString) -> Self {
        Self::Command {
            host: host.into(),
            command: command.into(),
            reason: reason.to_string(),
        }
    }

    pub fn host(&self) -> &str {
        match self {
            Self::Connection { host, .. } | Self::Command { host, .. } => host,
        }
    }
}

/// Outcome of a failed reverse lookup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    /// The resolver answered authoritatively that no PTR record exists.
    #[error("no PTR record")]
    NotFound,

    /// Timeouts, unreachable servers, SERVFAIL/REFUSED.
    #[error("resolver unavailable: {0}")]
    Transport(String),

    /// An answer arrived but could not be decoded.
    #[error("malformed answer: {0}")]
    Malformed(String),
}

impl LookupError {
    /// Whether asking again could produce a different answer.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("`{0}` must list at least one entry")]
    Missing(&'static str),

    #[error("invalid DNS server `{0}`")]
    InvalidDnsServer(String),
}
