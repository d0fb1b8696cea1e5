//! Error types for the bridge layer
//!
//! Every protocol failure is raised synchronously to the caller of the failing
//! operation. Nothing here retries; see [`crate::shot::retry`] for the
//! caller-side policy that restarts a whole logical operation.

use thiserror::Error;

/// Errors raised while talking to the emulator or the virtual controller
#[derive(Debug, Error)]
pub enum BridgeError {
    /// No response arrived on the emulator pipe within the response timeout
    #[error("emulator ate command: {command}")]
    CommandLost { command: String },

    /// A response arrived but does not echo the command it should answer
    #[error("response `{response}` does not correspond to command `{command}`")]
    ResponseMismatch { command: String, response: String },

    /// A running-mode gesture was not acknowledged by the controller
    #[error("controller ate gesture: {gesture}")]
    GestureLost { gesture: String },

    /// The result token could not be interpreted as the expected value
    #[error("unexpected result `{value}` for command `{command}`")]
    MalformedResponse { command: String, value: String },

    /// The reader task of an endpoint has stopped, its pipe is gone
    #[error("pipe endpoint `{endpoint}` is closed")]
    ChannelClosed { endpoint: String },

    #[error("pipe I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The retry budget of a logical operation is spent
    #[error("{operation} failed after {attempts} attempts: {last}")]
    RetriesExhausted {
        operation: &'static str,
        attempts: u32,
        #[source]
        last: Box<BridgeError>,
    },
}

impl BridgeError {
    /// Whether restarting the logical operation from its entry state can help.
    ///
    /// Lost and mismatched responses are the known pipe race. A closed pipe or
    /// an I/O failure will not heal by replaying commands.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            BridgeError::CommandLost { .. }
                | BridgeError::ResponseMismatch { .. }
                | BridgeError::GestureLost { .. }
                | BridgeError::MalformedResponse { .. }
        )
    }
}
