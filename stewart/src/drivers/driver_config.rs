use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::{HomingConfig, NanPolicy};

/// Transport and timing settings of the streaming driver.
///
/// ```rust,ignore
/// // stream to the simulator on localhost
/// let config = StewartDriverConfig::new("127.0.0.1".to_string(), 16060);
/// config.validate()?;
///
/// // or to a board on a serial port (needs the `serial` feature)
/// let config = StewartDriverConfig {
///     serial_path: "/dev/ttyACM0".to_string(),
///     ..Default::default()
/// };
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct StewartDriverConfig {
    pub addr: String,
    pub port: u32,
    pub serial_path: String,
    /// Period of the transmit cadence.
    pub send_interval: Duration,
    /// A write that takes longer than this is treated as a transport failure.
    pub write_timeout: Duration,
    /// Serial read timeout; timeouts are expected and not errors.
    pub read_timeout: Duration,
    pub homing: HomingConfig,
    pub nan_policy: NanPolicy,
    pub max_messages: usize,
}

impl StewartDriverConfig {
    pub fn new(addr: String, port: u32) -> Self {
        Self {
            addr,
            port,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.send_interval.is_zero() {
            return Err("Send interval must be greater than 0.".to_string());
        }
        if self.write_timeout.is_zero() {
            return Err("Write timeout must be greater than 0.".to_string());
        }
        if self.max_messages == 0 {
            return Err("Maximum messages must be greater than 0.".to_string());
        }
        self.homing.validate()
    }

    /// Checks the fields needed to open a TCP link.
    pub fn validate_tcp(&self) -> Result<(), String> {
        if self.addr.is_empty() {
            return Err("Address cannot be empty.".to_string());
        }
        if self.port == 0 {
            return Err("Port number must be greater than 0.".to_string());
        }
        self.validate()
    }

    /// Generates a connection URL from the address and port.
    pub fn connection_url(&self) -> String {
        format!("{}:{}", self.addr, self.port)
    }
}

impl Default for StewartDriverConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1".to_string(),
            port: 16060,
            serial_path: String::new(),
            send_interval: Duration::from_millis(40),
            write_timeout: Duration::from_millis(200),
            read_timeout: Duration::from_millis(100),
            homing: HomingConfig::default(),
            nan_policy: NanPolicy::SkipTick,
            max_messages: 30,
        }
    }
}
