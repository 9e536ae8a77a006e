//! SSH transport for IOS devices.
//!
//! Exec-mode commands each run on their own exec channel of one authenticated
//! connection; IOS does not page exec output, so no `terminal length 0` is needed there.
//! Configuration sets need a real shell, so they are typed into a PTY-backed shell channel
//! which is closed with `exit` once the set is applied.

use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use russh::client::{self, Handle, Msg};
use russh::{Channel, ChannelMsg, Disconnect, Preferred};
use tokio::time::timeout;

use edgemap_common::{
    config::Tuning,
    debug,
    error::DeviceError,
    network::device::DeviceEndpoint,
};

use super::{CommandChannel, Connector};

const TERMINAL_TYPE: &str = "vt100";

/// Accepts any host key, as device automation tooling commonly does on first contact.
struct DeviceHandler;

impl client::Handler for DeviceHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        _server_public_key: &russh::keys::ssh_key::PublicKey,
    ) -> Result<bool, Self::Error> {
        Ok(true)
    }
}

#[derive(Debug, Clone)]
pub struct SshConnector {
    connect_timeout: Duration,
    command_timeout: Duration,
}

impl SshConnector {
    pub fn new(connect_timeout: Duration, command_timeout: Duration) -> Self {
        Self {
            connect_timeout,
            command_timeout,
        }
    }

    fn client_config(&self) -> Arc<client::Config> {
        // Older IOS images only offer group14-sha1 key exchange.
        let mut kex = Preferred::default().kex.to_vec();
        if !kex.contains(&russh::kex::DH_G14_SHA1) {
            kex.push(russh::kex::DH_G14_SHA1);
        }

        Arc::new(client::Config {
            inactivity_timeout: Some(self.command_timeout * 2),
            preferred: Preferred {
                kex: Cow::Owned(kex),
                ..Preferred::default()
            },
            ..Default::default()
        })
    }
}

impl From<&Tuning> for SshConnector {
    fn from(tuning: &Tuning) -> Self {
        Self::new(tuning.connect_timeout(), tuning.command_timeout())
    }
}

#[async_trait]
impl Connector for SshConnector {
    async fn connect(&self, endpoint: &DeviceEndpoint) -> Result<Box<dyn CommandChannel>, DeviceError> {
        let host = endpoint.address();
        let addr = (host, endpoint.port());

        let mut handle = timeout(
            self.connect_timeout,
            client::connect(self.client_config(), addr, DeviceHandler),
        )
        .await
        .map_err(|_| DeviceError::connection(host, "connection timed out"))?
        .map_err(|e| DeviceError::connection(host, e))?;

        let creds = endpoint.credentials();
        let auth = handle
            .authenticate_password(creds.username(), creds.password())
            .await
            .map_err(|e| DeviceError::connection(host, e))?;

        if !auth.success() {
            return Err(DeviceError::connection(host, "authentication rejected"));
        }

        debug!(host, user = creds.username(), "ssh session established");
        Ok(Box::new(SshChannel {
            host: host.to_string(),
            handle,
            command_timeout: self.command_timeout,
        }))
    }
}

pub struct SshChannel {
    host: String,
    handle: Handle<DeviceHandler>,
    command_timeout: Duration,
}

impl SshChannel {
    async fn open_channel(&self, command: &str) -> Result<Channel<Msg>, DeviceError> {
        self.handle
            .channel_open_session()
            .await
            .map_err(|e| DeviceError::command(&self.host, command, e))
    }

    /// Reads until the device closes the channel, bounded by the command timeout.
    async fn drain(&self, channel: &mut Channel<Msg>, command: &str) -> Result<String, DeviceError> {
        let mut output: Vec<u8> = Vec::new();

        let read = async {
            while let Some(msg) = channel.wait().await {
                match msg {
                    ChannelMsg::Data { ref data } => output.extend_from_slice(data),
                    ChannelMsg::ExtendedData { ref data, .. } => output.extend_from_slice(data),
                    ChannelMsg::Close => break,
                    _ => {}
                }
            }
        };

        timeout(self.command_timeout, read)
            .await
            .map_err(|_| DeviceError::command(&self.host, command, "timed out waiting for output"))?;

        Ok(String::from_utf8_lossy(&output).replace("\r\n", "\n"))
    }
}

#[async_trait]
impl CommandChannel for SshChannel {
    async fn send_command(&mut self, command: &str) -> Result<String, DeviceError> {
        let mut channel = self.open_channel(command).await?;
        channel
            .exec(true, command)
            .await
            .map_err(|e| DeviceError::command(&self.host, command, e))?;
        self.drain(&mut channel, command).await
    }

    async fn send_config_set(&mut self, lines: &[String]) -> Result<String, DeviceError> {
        let label = "configure terminal";
        let mut channel = self.open_channel(label).await?;

        channel
            .request_pty(false, TERMINAL_TYPE, 0, 0, 0, 0, &[])
            .await
            .map_err(|e| DeviceError::command(&self.host, label, e))?;
        channel
            .request_shell(false)
            .await
            .map_err(|e| DeviceError::command(&self.host, label, e))?;

        let mut script = String::from("terminal length 0\nconfigure terminal\n");
        for line in lines {
            script.push_str(line);
            script.push('\n');
        }
        script.push_str("end\nexit\n");

        channel
            .data(script.as_bytes())
            .await
            .map_err(|e| DeviceError::command(&self.host, label, e))?;

        self.drain(&mut channel, label).await
    }

    async fn close(&mut self) -> Result<(), DeviceError> {
        self.handle
            .disconnect(Disconnect::ByApplication, "", "English")
            .await
            .map_err(|e| DeviceError::connection(&self.host, e))
    }
}
