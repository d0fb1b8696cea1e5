//! Gesture dispatch to the virtual controller
//!
//! While the emulator is paused the controller only parses its pipe when the
//! emulator samples input, so every paused gesture is followed by an
//! `UpdateInput` on the emulator pipe before the acknowledgment is awaited.

use super::channel::{PipeChannel, Reception};
use super::correlator::Correlator;
use crate::error::BridgeError;
use crate::protocol::{Button, EmuCommand, Gesture};
use std::time::Duration;
use tracing::{debug, warn};

/// How a gesture is synchronised with the emulator's frame clock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    /// Emulator paused: force an input sample, missing acks are only logged
    Paused,
    /// Emulator running: the ack must arrive within the timeout
    Running,
}

#[derive(Clone)]
pub struct GestureDispatcher {
    channel: PipeChannel,
    emulator: Correlator,
    timeout: Duration,
}

impl GestureDispatcher {
    pub fn new(channel: PipeChannel, emulator: Correlator, timeout: Duration) -> Self {
        Self {
            channel,
            emulator,
            timeout,
        }
    }

    pub fn channel(&self) -> &PipeChannel {
        &self.channel
    }

    pub async fn send_gesture(&self, gesture: &Gesture, mode: InputMode) -> Result<(), BridgeError> {
        let line = gesture.to_string();
        let mut io = self.channel.lock().await;
        io.write_line(&line).await?;

        if mode == InputMode::Paused {
            self.emulator.send(&EmuCommand::UpdateInput).await?;
        }

        match io.next_response(self.timeout).await {
            Reception::Line(ack) => {
                debug!("{} acknowledged `{}` with `{}`", io.name(), line, ack);
                Ok(())
            }
            Reception::TimedOut => match mode {
                InputMode::Paused => {
                    warn!("No acknowledgment for paused gesture `{}`, continuing", line);
                    Ok(())
                }
                InputMode::Running => Err(BridgeError::GestureLost { gesture: line }),
            },
            Reception::Closed => Err(BridgeError::ChannelClosed {
                endpoint: io.name().to_string(),
            }),
        }
    }

    pub async fn press(&self, button: Button) -> Result<(), BridgeError> {
        self.send_gesture(&Gesture::Press(button), InputMode::Paused)
            .await
    }

    pub async fn release(&self, button: Button) -> Result<(), BridgeError> {
        self.send_gesture(&Gesture::Release(button), InputMode::Paused)
            .await
    }

    pub async fn aim_pointer(&self, x: f64, y: f64) -> Result<(), BridgeError> {
        self.send_gesture(&Gesture::pointer(x, y), InputMode::Paused)
            .await
    }
}
