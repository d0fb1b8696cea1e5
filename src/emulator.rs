//! Typed emulator controls on top of the correlator

use crate::error::BridgeError;
use crate::pipes::Correlator;
use crate::protocol::EmuCommand;
use tracing::{debug, info};

#[derive(Clone)]
pub struct Emulator {
    correlator: Correlator,
}

impl Emulator {
    pub fn new(correlator: Correlator) -> Self {
        Self { correlator }
    }

    pub fn correlator(&self) -> &Correlator {
        &self.correlator
    }

    pub async fn pause(&self) -> Result<(), BridgeError> {
        self.correlator.send(&EmuCommand::Pause).await.map(drop)
    }

    pub async fn resume(&self) -> Result<(), BridgeError> {
        self.correlator.send(&EmuCommand::Resume).await.map(drop)
    }

    pub async fn is_paused(&self) -> Result<bool, BridgeError> {
        self.flag(&EmuCommand::IsPaused).await
    }

    /// Polls the pause state and pauses until the emulator reports paused
    pub async fn ensure_paused(&self) -> Result<(), BridgeError> {
        while !self.is_paused().await? {
            debug!("Emulator running, pausing");
            self.pause().await?;
        }
        Ok(())
    }

    /// Steps `frames` frames, one acknowledged command each
    pub async fn frame_advance(&self, frames: u32) -> Result<(), BridgeError> {
        for _ in 0..frames {
            self.correlator.send(&EmuCommand::FrameAdvance).await?;
        }
        Ok(())
    }

    pub async fn load_slot(&self, slot: u8) -> Result<(), BridgeError> {
        info!("Loading save slot {}", slot);
        self.correlator.send(&EmuCommand::LoadSlot(slot)).await.map(drop)
    }

    pub async fn update_input(&self) -> Result<(), BridgeError> {
        self.correlator.send(&EmuCommand::UpdateInput).await.map(drop)
    }

    pub async fn is_breakpoint(&self, address: u32) -> Result<bool, BridgeError> {
        self.flag(&EmuCommand::IsBreakpoint(address)).await
    }

    pub async fn toggle_breakpoint(&self, address: u32) -> Result<(), BridgeError> {
        self.correlator
            .send(&EmuCommand::ToggleBreakpoint(address))
            .await
            .map(drop)
    }

    /// Removes instruction breakpoints at `addresses`, leaving others alone.
    /// Returns how many were set.
    pub async fn clear_breakpoints(&self, addresses: &[u32]) -> Result<usize, BridgeError> {
        let mut cleared = 0;
        for &address in addresses {
            if self.is_breakpoint(address).await? {
                self.toggle_breakpoint(address).await?;
                info!("Cleared breakpoint at {:08x}", address);
                cleared += 1;
            }
        }
        Ok(cleared)
    }

    async fn flag(&self, command: &EmuCommand) -> Result<bool, BridgeError> {
        match self.correlator.send(command).await?.as_str() {
            "0" => Ok(false),
            "1" => Ok(true),
            other => Err(BridgeError::MalformedResponse {
                command: command.to_string(),
                value: other.to_string(),
            }),
        }
    }
}
