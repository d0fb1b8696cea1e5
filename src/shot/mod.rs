//! Break shot orchestration
//!
//! - [`choreography`] - directional pad taps and button toggles
//! - [`orchestrator`] - statum state machine for layout and shot sequences
//! - [`retry`] - caller-side restart policy for whole operations
//!
//! The types below are what the external search driver exchanges with the
//! bridge: a ball layout in, shot parameters in, a shot result out.

pub mod choreography;
pub mod orchestrator;
pub mod retry;

pub use orchestrator::{ShotMachine, ShotPlan, ShotState};
pub use retry::RetryPolicy;

use crate::protocol::addresses::{BALL_COUNT, TABLE_HALF_EXTENT};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Ball position on the table plane
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BallPosition {
    pub x: f32,
    pub z: f32,
}

/// Position of all nine balls, indexed like the address table
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BallLayout {
    pub balls: [BallPosition; BALL_COUNT],
}

impl BallLayout {
    pub fn new(balls: [BallPosition; BALL_COUNT]) -> Self {
        Self { balls }
    }

    /// Whether every coordinate lies within the placeable range.
    /// The orchestrator writes whatever it is given; callers check this.
    pub fn within_table(&self) -> bool {
        self.balls
            .iter()
            .all(|ball| ball.x.abs() <= TABLE_HALF_EXTENT && ball.z.abs() <= TABLE_HALF_EXTENT)
    }

    pub fn is_finite(&self) -> bool {
        self.balls
            .iter()
            .all(|ball| ball.x.is_finite() && ball.z.is_finite())
    }
}

/// State of one ball after the table came to rest
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BallOutcome {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub sunk: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ShotResult {
    pub balls: [BallOutcome; BALL_COUNT],
}

impl ShotResult {
    pub fn sunk_count(&self) -> usize {
        self.balls.iter().filter(|ball| ball.sunk).count()
    }
}

/// Absolute pointer aim, both components in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AimPoint {
    pub x: f64,
    pub y: f64,
}

/// Directional pad taps: `x` left (<0) / right, `z` down (<0) / up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DpadOffset {
    pub x: i32,
    pub z: i32,
}

impl DpadOffset {
    pub fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Rounds continuous optimizer output to whole taps (half away from zero)
    pub fn from_components(x: f64, z: f64) -> Self {
        Self {
            x: x.round() as i32,
            z: z.round() as i32,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShotParameters {
    pub aim: AimPoint,
    pub dpad: DpadOffset,
}

/// Everything needed to reproduce and judge one shot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShotReport {
    pub seed: u32,
    pub parameters: ShotParameters,
    pub layout: BallLayout,
    pub result: ShotResult,
    pub sunk_count: usize,
    pub recorded_at: DateTime<Local>,
}

impl ShotReport {
    pub fn new(seed: u32, parameters: ShotParameters, layout: BallLayout, result: ShotResult) -> Self {
        Self {
            seed,
            parameters,
            layout,
            sunk_count: result.sunk_count(),
            result,
            recorded_at: Local::now(),
        }
    }
}
