//! Emulator control commands and console memory addressing

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::str::FromStr;

/// Address space a memory command operates on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MemRegion {
    Effective,
    Auxiliary,
    Physical,
    Mem1,
    Mem2,
    Fake,
}

impl MemRegion {
    pub fn token(self) -> &'static str {
        match self {
            MemRegion::Effective => "eff",
            MemRegion::Auxiliary => "aux",
            MemRegion::Physical => "phy",
            MemRegion::Mem1 => "mem1",
            MemRegion::Mem2 => "mem2",
            MemRegion::Fake => "fake",
        }
    }
}

impl Display for MemRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for MemRegion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "eff" => Ok(MemRegion::Effective),
            "aux" => Ok(MemRegion::Auxiliary),
            "phy" => Ok(MemRegion::Physical),
            "mem1" => Ok(MemRegion::Mem1),
            "mem2" => Ok(MemRegion::Mem2),
            "fake" => Ok(MemRegion::Fake),
            other => Err(format!("unknown memory region: {}", other)),
        }
    }
}

/// A byte-addressed location in one of the console's address spaces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemoryAddress {
    pub region: MemRegion,
    pub offset: u32,
}

impl MemoryAddress {
    pub const fn new(region: MemRegion, offset: u32) -> Self {
        Self { region, offset }
    }

    pub const fn mem2(offset: u32) -> Self {
        Self::new(MemRegion::Mem2, offset)
    }

    pub const fn effective(offset: u32) -> Self {
        Self::new(MemRegion::Effective, offset)
    }

    /// The address `bytes` further into the same region
    pub const fn offset_by(self, bytes: u32) -> Self {
        Self::new(self.region, self.offset.wrapping_add(bytes))
    }
}

// Wire form: `<region> <8 hex digits>`
impl Display for MemoryAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:08x}", self.region, self.offset)
    }
}

/// One line of the emulator control protocol
///
/// The emulator answers every command with the command's own tokens followed
/// by one result token (`0` for plain acknowledgments).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmuCommand {
    Pause,
    Resume,
    IsPaused,
    FrameAdvance,
    /// Make the emulator sample controller input while paused
    UpdateInput,
    LoadSlot(u8),
    ReadMemory(MemoryAddress),
    WriteMemory(MemoryAddress, u8),
    ToggleBreakpoint(u32),
    IsBreakpoint(u32),
}

impl Display for EmuCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmuCommand::Pause => f.write_str("Pause"),
            EmuCommand::Resume => f.write_str("Resume"),
            EmuCommand::IsPaused => f.write_str("IsPaused"),
            EmuCommand::FrameAdvance => f.write_str("FrameAdvance"),
            EmuCommand::UpdateInput => f.write_str("UpdateInput"),
            EmuCommand::LoadSlot(slot) => write!(f, "LoadSlot {}", slot),
            EmuCommand::ReadMemory(address) => write!(f, "ReadMemory {}", address),
            EmuCommand::WriteMemory(address, value) => {
                write!(f, "WriteMemory {} {:02x}", address, value)
            }
            EmuCommand::ToggleBreakpoint(address) => write!(f, "ToggleBreakpoint {:08x}", address),
            EmuCommand::IsBreakpoint(address) => write!(f, "IsBreakpoint {:08x}", address),
        }
    }
}
