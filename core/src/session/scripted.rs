//! An in-memory transport that replays canned device output.
//!
//! Used to exercise fetchers, the pipeline and the deploy flow without a network. Every
//! command, configuration set and open/close is recorded so tests can assert on them.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use edgemap_common::{error::DeviceError, network::device::DeviceEndpoint};

use super::{CommandChannel, Connector};

const INVALID_INPUT: &str = "        ^\n% Invalid input detected at '^' marker.\n";

#[derive(Debug, Clone)]
enum Reply {
    Output(String),
    /// The session drops while the command runs.
    Drop,
}

/// Canned behaviour of one device.
#[derive(Debug, Clone, Default)]
pub struct ScriptedDevice {
    replies: HashMap<String, Reply>,
    config_reply: String,
}

impl ScriptedDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, command: impl Into<String>, output: impl Into<String>) -> Self {
        self.replies.insert(command.into(), Reply::Output(output.into()));
        self
    }

    pub fn drop_on(mut self, command: impl Into<String>) -> Self {
        self.replies.insert(command.into(), Reply::Drop);
        self
    }

    /// Output returned for every configuration set.
    pub fn config_reply(mut self, output: impl Into<String>) -> Self {
        self.config_reply = output.into();
        self
    }
}

#[derive(Debug, Default)]
struct Journal {
    commands: HashMap<String, Vec<String>>,
    config_sets: HashMap<String, Vec<Vec<String>>>,
    opened: usize,
    closed: usize,
}

#[derive(Debug, Clone, Default)]
pub struct ScriptedConnector {
    devices: Arc<HashMap<String, ScriptedDevice>>,
    journal: Arc<Mutex<Journal>>,
}

impl ScriptedConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_device(mut self, address: impl Into<String>, device: ScriptedDevice) -> Self {
        Arc::make_mut(&mut self.devices).insert(address.into(), device);
        self
    }

    /// Makes `address` refuse connections. Addresses never scripted refuse them too.
    pub fn with_unreachable(mut self, address: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.devices).remove(&address.into());
        self
    }

    /// Commands sent to `address`, in order.
    pub fn transcript(&self, address: &str) -> Vec<String> {
        self.journal().commands.get(address).cloned().unwrap_or_default()
    }

    pub fn config_sets(&self, address: &str) -> Vec<Vec<String>> {
        self.journal().config_sets.get(address).cloned().unwrap_or_default()
    }

    /// Sessions opened and not yet closed.
    pub fn open_sessions(&self) -> usize {
        let journal = self.journal();
        journal.opened - journal.closed
    }

    pub fn sessions_opened(&self) -> usize {
        self.journal().opened
    }

    fn journal(&self) -> MutexGuard<'_, Journal> {
        self.journal.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl Connector for ScriptedConnector {
    async fn connect(&self, endpoint: &DeviceEndpoint) -> Result<Box<dyn CommandChannel>, DeviceError> {
        let address = endpoint.address();
        let device = self
            .devices
            .get(address)
            .cloned()
            .ok_or_else(|| DeviceError::connection(address, "host unreachable"))?;

        self.journal().opened += 1;
        Ok(Box::new(ScriptedChannel {
            address: address.to_string(),
            device,
            journal: Arc::clone(&self.journal),
            closed: false,
        }))
    }
}

struct ScriptedChannel {
    address: String,
    device: ScriptedDevice,
    journal: Arc<Mutex<Journal>>,
    closed: bool,
}

impl ScriptedChannel {
    fn journal(&self) -> MutexGuard<'_, Journal> {
        self.journal.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl CommandChannel for ScriptedChannel {
    async fn send_command(&mut self, command: &str) -> Result<String, DeviceError> {
        self.journal()
            .commands
            .entry(self.address.clone())
            .or_default()
            .push(command.to_string());

        match self.device.replies.get(command) {
            Some(Reply::Output(out)) => Ok(out.clone()),
            Some(Reply::Drop) => Err(DeviceError::command(&self.address, command, "session dropped")),
            None => Ok(format!("{command}\n{INVALID_INPUT}")),
        }
    }

    async fn send_config_set(&mut self, lines: &[String]) -> Result<String, DeviceError> {
        self.journal()
            .config_sets
            .entry(self.address.clone())
            .or_default()
            .push(lines.to_vec());
        Ok(self.device.config_reply.clone())
    }

    async fn close(&mut self) -> Result<(), DeviceError> {
        if !self.closed {
            self.closed = true;
            self.journal().closed += 1;
        }
        Ok(())
    }
}
