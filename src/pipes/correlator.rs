//! Command/response correlation on the emulator pipe
//!
//! Responses carry no request id. A response belongs to a command only if it
//! starts with the command's own tokens, so a late answer to an earlier
//! command is caught here instead of being read as a value.

use super::channel::{PipeChannel, Reception};
use crate::error::BridgeError;
use crate::protocol::EmuCommand;
use std::time::Duration;
use tracing::{debug, warn};

/// Default bound on the wait for a single response
pub const RESPONSE_TIMEOUT: Duration = Duration::from_millis(500);

/// Sends commands to an echoing endpoint and extracts their results
#[derive(Clone)]
pub struct Correlator {
    channel: PipeChannel,
    timeout: Duration,
}

impl Correlator {
    pub fn new(channel: PipeChannel, timeout: Duration) -> Self {
        Self { channel, timeout }
    }

    pub fn channel(&self) -> &PipeChannel {
        &self.channel
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn send(&self, command: &EmuCommand) -> Result<String, BridgeError> {
        self.send_line(&command.to_string()).await
    }

    /// One write, one bounded wait, no retries
    pub async fn send_line(&self, command: &str) -> Result<String, BridgeError> {
        let mut io = self.channel.lock().await;
        io.write_line(command).await?;

        match io.next_response(self.timeout).await {
            Reception::Line(response) => {
                let result = match_response(command, &response)?;
                debug!("{} => {}", command, result);
                Ok(result)
            }
            Reception::TimedOut => {
                warn!(
                    "No response to `{}` from {} within {:?}",
                    command,
                    io.name(),
                    self.timeout
                );
                Err(BridgeError::CommandLost {
                    command: command.to_string(),
                })
            }
            Reception::Closed => Err(BridgeError::ChannelClosed {
                endpoint: io.name().to_string(),
            }),
        }
    }
}

/// Checks that `response` echoes `command` and returns its final token
///
/// The response must have strictly more tokens than the command, and every
/// command token must reappear at the same position.
pub fn match_response(command: &str, response: &str) -> Result<String, BridgeError> {
    let sent: Vec<&str> = command.split_whitespace().collect();
    let received: Vec<&str> = response.split_whitespace().collect();

    let echoed = received.len() > sent.len()
        && sent
            .iter()
            .zip(received.iter())
            .all(|(expected, actual)| expected == actual);

    match received.last() {
        Some(result) if echoed => Ok((*result).to_string()),
        _ => Err(BridgeError::ResponseMismatch {
            command: command.to_string(),
            response: response.to_string(),
        }),
    }
}
