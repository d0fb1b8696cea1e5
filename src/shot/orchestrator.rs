//! Shot state machine with compile-time state safety via statum
//!
//! Both public sequences, fetching the ball layout for a seed and playing a
//! break shot, are walks through the same states:
//!
//! ```text
//! Idle ──► EnsurePaused ──► SlotLoaded ──► StateInjected ──► Advanced ──► Read
//!                               │               │               │
//!               pre-RNG slot    │  inject_seed  │ resolve_layout│ read_layout
//!               break slot      │  place_balls  │ play          │ read_outcome
//! ```
//!
//! A machine is consumed by every transition, so a sequence cannot be resumed
//! half way. Recovery always starts a fresh machine from `Idle`.

use super::choreography::{tap_button, tap_dpad};
use super::{BallLayout, BallOutcome, BallPosition, ShotParameters, ShotResult};
use crate::emulator::Emulator;
use crate::error::BridgeError;
use crate::memory::MemoryCodec;
use crate::pipes::GestureDispatcher;
use crate::protocol::addresses::{
    BALLS, BALL_COUNT, BALL_PERTURBATION_INSTRUCTIONS, RNG_SEED, SUNK_MARKER,
};
use crate::protocol::Button;
use statum::{machine, state};
use std::time::Duration;
use tracing::{debug, info};

/// Save slots, frame counts and delays of the two sequences
#[derive(Debug, Clone, PartialEq)]
pub struct ShotPlan {
    /// Paused right before the game's first billiards RNG read
    pub pre_rng_slot: u8,
    /// Waiting for controller input for the break shot
    pub break_slot: u8,
    pub slot_settle: Duration,
    /// Frames until the seeded ball placement is written to memory
    pub layout_frames: u32,
    /// Frames spent in the home menu after each toggle
    pub menu_frames: u32,
    /// Frames each swing gesture is held
    pub swing_frames: u32,
    /// Real time the table needs to come to rest after the shot
    pub table_settle: Duration,
    pub clear_breakpoints: bool,
}

impl Default for ShotPlan {
    fn default() -> Self {
        Self {
            pre_rng_slot: 2,
            break_slot: 3,
            slot_settle: Duration::from_millis(100),
            layout_frames: 10,
            menu_frames: 100,
            swing_frames: 20,
            table_settle: Duration::from_millis(4000),
            clear_breakpoints: false,
        }
    }
}

#[state]
#[derive(Debug, Clone)]
pub enum ShotState {
    Idle,
    EnsurePaused,
    SlotLoaded,
    StateInjected,
    Advanced,
    Read,
}

#[machine]
pub struct ShotMachine<S: ShotState> {
    emulator: Emulator,
    controller: GestureDispatcher,
    memory: MemoryCodec,
    plan: ShotPlan,
}

impl<S: ShotState> ShotMachine<S> {
    pub fn plan(&self) -> &ShotPlan {
        &self.plan
    }
}

impl ShotMachine<Idle> {
    pub fn start(
        emulator: Emulator,
        controller: GestureDispatcher,
        memory: MemoryCodec,
        plan: ShotPlan,
    ) -> Self {
        Self::new(emulator, controller, memory, plan)
    }

    pub async fn ensure_paused(self) -> Result<ShotMachine<EnsurePaused>, BridgeError> {
        self.emulator.ensure_paused().await?;
        debug!("Emulator paused");
        Ok(self.transition())
    }
}

impl ShotMachine<EnsurePaused> {
    /// Removes breakpoints that would stall the seeded ball placement
    pub async fn clear_perturbation_breakpoints(self) -> Result<Self, BridgeError> {
        let cleared = self
            .emulator
            .clear_breakpoints(&BALL_PERTURBATION_INSTRUCTIONS)
            .await?;
        if cleared > 0 {
            info!("Cleared {} ball perturbation breakpoints", cleared);
        }
        Ok(self)
    }

    /// Loads the pre-RNG slot and gives the emulator time to settle
    pub async fn load_pre_rng_slot(self) -> Result<ShotMachine<SlotLoaded>, BridgeError> {
        self.emulator.load_slot(self.plan.pre_rng_slot).await?;
        tokio::time::sleep(self.plan.slot_settle).await;
        Ok(self.transition())
    }

    pub async fn load_break_slot(self) -> Result<ShotMachine<SlotLoaded>, BridgeError> {
        self.emulator.load_slot(self.plan.break_slot).await?;
        Ok(self.transition())
    }
}

impl ShotMachine<SlotLoaded> {
    /// Writes `seed` into the RNG register as four raw bytes
    pub async fn inject_seed(self, seed: u32) -> Result<ShotMachine<StateInjected>, BridgeError> {
        info!("Injecting seed {:08x}", seed);
        self.memory.write_u32(RNG_SEED, seed).await?;
        Ok(self.transition())
    }

    pub async fn place_balls(
        self,
        layout: &BallLayout,
    ) -> Result<ShotMachine<StateInjected>, BridgeError> {
        for (addresses, ball) in BALLS.iter().zip(layout.balls.iter()) {
            self.memory.write_f32(addresses.x, ball.x).await?;
            self.memory.write_f32(addresses.z, ball.z).await?;
        }
        debug!("Placed {} balls", BALL_COUNT);
        Ok(self.transition())
    }
}

impl ShotMachine<StateInjected> {
    /// Steps the frames the game needs to place the seeded balls
    pub async fn resolve_layout(self) -> Result<ShotMachine<Advanced>, BridgeError> {
        self.emulator.frame_advance(self.plan.layout_frames).await?;
        Ok(self.transition())
    }

    /// Aims, swings and lets the table settle in real time
    pub async fn play(self, parameters: &ShotParameters) -> Result<ShotMachine<Advanced>, BridgeError> {
        let emulator = &self.emulator;
        let controller = &self.controller;
        let plan = &self.plan;

        // The pointer is set inside the home menu, where it does not drift.
        tap_button(controller, emulator, Button::Home, 1).await?;
        controller
            .aim_pointer(parameters.aim.x, parameters.aim.y)
            .await?;
        emulator.frame_advance(plan.menu_frames).await?;
        tap_button(controller, emulator, Button::Home, 1).await?;
        emulator.frame_advance(plan.menu_frames).await?;

        tap_dpad(controller, emulator, parameters.dpad).await?;

        controller.press(Button::B).await?;
        controller.press(Button::SwingBackward).await?;
        emulator.frame_advance(plan.swing_frames).await?;
        controller.release(Button::SwingBackward).await?;
        controller.press(Button::SwingForward).await?;
        emulator.frame_advance(plan.swing_frames).await?;
        controller.release(Button::SwingForward).await?;
        controller.release(Button::B).await?;

        info!("Shot played, letting the table settle for {:?}", plan.table_settle);
        emulator.resume().await?;
        tokio::time::sleep(plan.table_settle).await;

        Ok(self.transition())
    }
}

impl ShotMachine<Advanced> {
    pub async fn read_layout(self) -> Result<(ShotMachine<Read>, BallLayout), BridgeError> {
        let mut balls = [BallPosition::default(); BALL_COUNT];
        for (addresses, ball) in BALLS.iter().zip(balls.iter_mut()) {
            ball.x = self.memory.read_f32(addresses.x).await?;
            ball.z = self.memory.read_f32(addresses.z).await?;
        }
        Ok((self.transition(), BallLayout::new(balls)))
    }

    pub async fn read_outcome(self) -> Result<(ShotMachine<Read>, ShotResult), BridgeError> {
        let mut balls = [BallOutcome::default(); BALL_COUNT];
        for (addresses, ball) in BALLS.iter().zip(balls.iter_mut()) {
            ball.sunk = self.memory.read_u8(addresses.sunk).await? == SUNK_MARKER;
            ball.x = self.memory.read_f32(addresses.x).await?;
            ball.y = self.memory.read_f32(addresses.y).await?;
            ball.z = self.memory.read_f32(addresses.z).await?;
        }
        let result = ShotResult { balls };
        info!("Shot settled, {} balls sunk", result.sunk_count());
        Ok((self.transition(), result))
    }
}
