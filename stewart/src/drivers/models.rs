use serde::{Deserialize, Serialize};

/// Whether outbound frames are currently being written to the transport.
#[derive(Serialize, Deserialize, Copy, Debug, Clone, PartialEq, Eq)]
pub enum LinkState {
    /// No transport attached.
    Detached,
    Streaming,
    /// Stopped after an undefined solve under `NanPolicy::StopStreaming`.
    Suspended,
    /// The transport reported an error; reattach to continue.
    Failed,
}

impl Default for LinkState {
    fn default() -> Self {
        Self::Detached
    }
}

impl LinkState {
    pub fn is_streaming(&self) -> bool {
        *self == LinkState::Streaming
    }
}
