//! Pipe transport to the emulator and the virtual controller
//!
//! Three layers, leaf first:
//!
//! 1. [`channel`] - pipe pair, background line reader, response queue
//! 2. [`correlator`] - echo-checked command/response exchange with timeout
//! 3. [`gesture`] - controller gestures, optionally synced to the emulator
//!
//! # Concurrency
//!
//! One reader task per endpoint runs for the lifetime of the process. Callers
//! drive every exchange sequentially from their own task; a channel is locked
//! for the full write-then-wait of an exchange, so responses can never be
//! handed to the wrong command by overlapping calls.

pub mod channel;
pub mod correlator;
pub mod gesture;

pub use channel::{PipeChannel, PipeEndpoint, Reception, ResponseQueue};
pub use correlator::{match_response, Correlator, RESPONSE_TIMEOUT};
pub use gesture::{GestureDispatcher, InputMode};
