use std::fmt;
use std::sync::Arc;

pub const DEFAULT_SSH_PORT: u16 = 22;

/// Login material supplied by the operator at invocation time.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// The vendor/OS profile a device is driven with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeviceClass {
    #[default]
    CiscoIos,
}

/// One device to talk to: where it is, how to log in and which CLI dialect it speaks.
///
/// Built per operation from configuration plus run-time credentials and never mutated.
#[derive(Debug, Clone)]
pub struct DeviceEndpoint {
    address: String,
    port: u16,
    credentials: Arc<Credentials>,
    class: DeviceClass,
}

impl DeviceEndpoint {
    pub fn new(address: impl Into<String>, credentials: Arc<Credentials>) -> Self {
        Self {
            address: address.into(),
            port: DEFAULT_SSH_PORT,
            credentials,
            class: DeviceClass::default(),
        }
    }

    pub fn with_port(self, port: u16) -> Self {
        Self { port, ..self }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn class(&self) -> DeviceClass {
        self.class
    }
}

impl fmt::Display for DeviceEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.address)
    }
}
