//! Consumer-facing entry points
//!
//! [`BilliardsBridge`] is what an outer search driver holds on to. Its two
//! operations, [`get_coords_for_seed`](BilliardsBridge::get_coords_for_seed)
//! and [`shoot`](BilliardsBridge::shoot), take `&mut self`, so a second
//! sequence cannot start before the previous one has finished.

use crate::config::BridgeConfig;
use crate::emulator::Emulator;
use crate::error::BridgeError;
use crate::memory::MemoryCodec;
use crate::pipes::{Correlator, GestureDispatcher, PipeChannel};
use crate::shot::{
    BallLayout, RetryPolicy, ShotMachine, ShotParameters, ShotPlan, ShotResult,
};
use std::time::Duration;
use tracing::{error, info, warn};

pub struct BilliardsBridge {
    emulator: Emulator,
    controller: GestureDispatcher,
    memory: MemoryCodec,
    plan: ShotPlan,
    retry: RetryPolicy,
}

impl BilliardsBridge {
    /// Opens the emulator and controller pipes named in `config`
    #[cfg(unix)]
    pub async fn connect(config: &BridgeConfig) -> Result<Self, BridgeError> {
        let emulator = PipeChannel::open(&config.emulator_endpoint(), config.drain()).await?;
        info!("Emulator connected");
        let controller = PipeChannel::open(&config.controller_endpoint(), config.drain()).await?;
        info!("Controller connected");

        Ok(Self::from_channels(
            emulator,
            controller,
            config.response_timeout(),
            config.shot_plan(),
            config.retry_policy(),
        ))
    }

    pub fn from_channels(
        emulator: PipeChannel,
        controller: PipeChannel,
        timeout: Duration,
        plan: ShotPlan,
        retry: RetryPolicy,
    ) -> Self {
        let correlator = Correlator::new(emulator, timeout);
        Self {
            emulator: Emulator::new(correlator.clone()),
            controller: GestureDispatcher::new(controller, correlator.clone(), timeout),
            memory: MemoryCodec::new(correlator),
            plan,
            retry,
        }
    }

    pub fn plan(&self) -> &ShotPlan {
        &self.plan
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    fn machine(&self) -> ShotMachine<crate::shot::orchestrator::Idle> {
        ShotMachine::start(
            self.emulator.clone(),
            self.controller.clone(),
            self.memory.clone(),
            self.plan.clone(),
        )
    }

    /// Ball layout the game generates for `seed`
    pub async fn get_coords_for_seed(&mut self, seed: u32) -> Result<BallLayout, BridgeError> {
        let mut paused = self.machine().ensure_paused().await?;
        if self.plan.clear_breakpoints {
            paused = paused.clear_perturbation_breakpoints().await?;
        }
        let (_read, layout) = paused
            .load_pre_rng_slot()
            .await?
            .inject_seed(seed)
            .await?
            .resolve_layout()
            .await?
            .read_layout()
            .await?;
        info!("Layout for seed {} read", seed);
        Ok(layout)
    }

    /// Loads the break slot and overwrites every ball position
    pub async fn set_balls(&mut self, layout: &BallLayout) -> Result<(), BridgeError> {
        self.machine()
            .ensure_paused()
            .await?
            .load_break_slot()
            .await?
            .place_balls(layout)
            .await?;
        Ok(())
    }

    /// Plays the break shot from `layout` and reads where every ball ended up
    pub async fn shoot(
        &mut self,
        layout: &BallLayout,
        parameters: &ShotParameters,
    ) -> Result<ShotResult, BridgeError> {
        let (_read, result) = self
            .machine()
            .ensure_paused()
            .await?
            .load_break_slot()
            .await?
            .place_balls(layout)
            .await?
            .play(parameters)
            .await?
            .read_outcome()
            .await?;
        Ok(result)
    }

    /// [`get_coords_for_seed`](Self::get_coords_for_seed) under the retry policy
    pub async fn get_coords_for_seed_retrying(
        &mut self,
        seed: u32,
    ) -> Result<BallLayout, BridgeError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.get_coords_for_seed(seed).await {
                Ok(layout) => return Ok(layout),
                Err(e) => self.recover("get_coords_for_seed", attempt, e).await?,
            }
        }
    }

    /// [`shoot`](Self::shoot) under the retry policy
    pub async fn shoot_retrying(
        &mut self,
        layout: &BallLayout,
        parameters: &ShotParameters,
    ) -> Result<ShotResult, BridgeError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.shoot(layout, parameters).await {
                Ok(result) => return Ok(result),
                Err(e) => self.recover("shoot", attempt, e).await?,
            }
        }
    }

    // Decides whether a failed attempt gets another go and prepares it.
    async fn recover(
        &self,
        operation: &'static str,
        attempt: u32,
        error: BridgeError,
    ) -> Result<(), BridgeError> {
        if !error.is_recoverable() {
            error!("{} failed: {}", operation, error);
            return Err(error);
        }
        if !self.retry.should_retry(attempt, &error) {
            error!("{} failed on attempt {}: {}", operation, attempt, error);
            return Err(BridgeError::RetriesExhausted {
                operation,
                attempts: attempt,
                last: Box::new(error),
            });
        }

        warn!("{} attempt {} failed, restarting: {}", operation, attempt, error);
        tokio::time::sleep(self.retry.backoff()).await;
        self.emulator.correlator().channel().discard_stale().await;
        self.controller.channel().discard_stale().await;
        Ok(())
    }
}
