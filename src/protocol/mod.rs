//! Text protocol spoken over the emulator and controller pipes
//!
//! ```text
//! bridge ──"ReadMemory mem2 01b4d07c"──► emulator
//! bridge ◄─"ReadMemory mem2 01b4d07c 3f"── emulator
//!
//! bridge ──"Press B"──► controller
//! bridge ◄─"0"───────── controller
//! ```

pub mod addresses;
pub mod command;
pub mod controller;

pub use command::{EmuCommand, MemRegion, MemoryAddress};
pub use controller::{Button, Gesture, StickAxis};
