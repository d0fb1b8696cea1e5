//! Pipe bridge that replays Wii Play billiards break shots in an emulator
//!
//! The bridge drives a paused emulator and a virtual Wii Remote through two
//! pairs of named pipes. For a given RNG seed it reports the ball layout the
//! game would rack, and for a layout plus aim it plays the break and reports
//! where every ball came to rest.
//!
//! - [`pipes`] - pipe channels, response correlation, gesture dispatch
//! - [`protocol`] - command lines, memory addresses, controller gestures
//! - [`emulator`] and [`memory`] - typed emulator controls and memory codec
//! - [`shot`] - state machine and choreography of the two sequences
//! - [`bridge`] - the consumer-facing entry points with retry

pub mod bridge;
pub mod config;
pub mod emulator;
pub mod error;
pub mod memory;
pub mod pipes;
pub mod protocol;
pub mod shot;

#[cfg(test)]
mod testing;

pub use bridge::BilliardsBridge;
pub use config::BridgeConfig;
pub use error::BridgeError;
