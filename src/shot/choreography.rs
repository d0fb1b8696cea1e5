//! Button choreography on a paused emulator
//!
//! Each tap is press, one frame, release; the frame in between is what lets
//! the game see the button as a discrete event.

use super::DpadOffset;
use crate::emulator::Emulator;
use crate::error::BridgeError;
use crate::pipes::GestureDispatcher;
use crate::protocol::Button;
use tracing::debug;

/// Taps `button` `times` times
pub async fn tap_button(
    controller: &GestureDispatcher,
    emulator: &Emulator,
    button: Button,
    times: u32,
) -> Result<(), BridgeError> {
    for _ in 0..times {
        controller.press(button).await?;
        emulator.frame_advance(1).await?;
        controller.release(button).await?;
    }
    Ok(())
}

/// Taps the directional pad for both axes of `offset`, x axis first
pub async fn tap_dpad(
    controller: &GestureDispatcher,
    emulator: &Emulator,
    offset: DpadOffset,
) -> Result<(), BridgeError> {
    let x_button = if offset.x < 0 { Button::DLeft } else { Button::DRight };
    let z_button = if offset.z < 0 { Button::DDown } else { Button::DUp };
    debug!(
        "D-pad: {} x {}, {} x {}",
        x_button,
        offset.x.unsigned_abs(),
        z_button,
        offset.z.unsigned_abs()
    );

    tap_button(controller, emulator, x_button, offset.x.unsigned_abs()).await?;
    tap_button(controller, emulator, z_button, offset.z.unsigned_abs()).await
}
