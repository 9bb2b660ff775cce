use std::error::Error;
use std::fmt;
use serde::{Deserialize, Serialize};

/// Failures of the transport and driver plumbing.
///
/// Kinematic conditions never show up here: an unreachable leg is a `NaN`
/// angle and an out-of-reach target is a clamped one.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum StewartError {
    InvalidConfig(String),
    FailedToSend(String),
    FailedToReceive(String),
    Disconnected,
    SerialPort(String),
    DriverClosed,
}

impl Error for StewartError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        None
    }
}

impl fmt::Display for StewartError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            StewartError::InvalidConfig(ref msg) => write!(f, "Invalid configuration: {}", msg),
            StewartError::FailedToSend(ref msg) => write!(f, "SendError: {}", msg),
            StewartError::FailedToReceive(ref msg) => write!(f, "ReceiveError: {}", msg),
            StewartError::Disconnected => write!(f, "Controller board appears to be disconnected"),
            StewartError::SerialPort(ref msg) => write!(f, "Serial port error: {}", msg),
            StewartError::DriverClosed => write!(f, "Driver control task has stopped"),
        }
    }
}
