//! Fixed console addresses of the billiards table state
//!
//! All values are specific to the game build the save slots were taken from.
//! Nothing here is discovered at runtime.

use super::command::MemoryAddress;

pub const BALL_COUNT: usize = 9;

/// Value of a ball's sunk flag byte once it has dropped into a pocket
pub const SUNK_MARKER: u8 = 0x01;

/// Largest offset from the rack position a ball may be placed at, per axis
pub const TABLE_HALF_EXTENT: f32 = 0.143925;

/// Register the game's RNG reads its seed from
pub const RNG_SEED: MemoryAddress = MemoryAddress::effective(0x8043_c620);

/// Instructions applying the random ball perturbation (x, then z).
/// A breakpoint on either stalls layout generation.
pub const BALL_PERTURBATION_INSTRUCTIONS: [u32; 2] = [0x802c_1db4, 0x802c_1df4];

/// Memory locations describing one ball
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BallAddresses {
    /// One byte, [`SUNK_MARKER`] when pocketed
    pub sunk: MemoryAddress,
    pub x: MemoryAddress,
    pub y: MemoryAddress,
    pub z: MemoryAddress,
}

const fn ball(sunk: u32, x: u32) -> BallAddresses {
    BallAddresses {
        sunk: MemoryAddress::mem2(sunk),
        x: MemoryAddress::mem2(x),
        y: MemoryAddress::mem2(x + 4),
        z: MemoryAddress::mem2(x + 8),
    }
}

// Sunk flags of balls 1 and 2 are not in x-address order; the table is taken
// as-is from the game.
pub static BALLS: [BallAddresses; BALL_COUNT] = [
    ball(0x1B4_CF7B, 0x1B4_D07C),
    ball(0x1B4_DDDB, 0x1B4_D7AC),
    ball(0x1B4_D6AB, 0x1B4_DEDC),
    ball(0x1B4_E50B, 0x1B4_E60C),
    ball(0x1B4_EC3B, 0x1B4_ED3C),
    ball(0x1B4_F36B, 0x1B4_F46C),
    ball(0x1B4_FA9B, 0x1B4_FB9C),
    ball(0x1B5_01CB, 0x1B5_02CC),
    ball(0x1B5_08FB, 0x1B5_09FC),
];
