//! Byte-level console memory access over the hex text protocol
//!
//! The emulator reads and writes exactly one byte per command. Multi-byte
//! values are assembled in address order, lowest address first, which is the
//! console's native big-endian layout. Floats are IEEE-754 singles.

use crate::error::BridgeError;
use crate::pipes::Correlator;
use crate::protocol::{EmuCommand, MemoryAddress};
use tracing::debug;

/// How the bytes of a read are interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadFormat {
    /// `len` raw bytes rendered as lowercase hex
    Hex { len: usize },
    /// Four bytes as a big-endian `f32`
    Float32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MemoryValue {
    Hex(String),
    Float(f32),
}

#[derive(Clone)]
pub struct MemoryCodec {
    emulator: Correlator,
}

impl MemoryCodec {
    pub fn new(emulator: Correlator) -> Self {
        Self { emulator }
    }

    pub async fn read(
        &self,
        address: MemoryAddress,
        format: ReadFormat,
    ) -> Result<MemoryValue, BridgeError> {
        match format {
            ReadFormat::Hex { len } => self.read_hex(address, len).await.map(MemoryValue::Hex),
            ReadFormat::Float32 => self.read_f32(address).await.map(MemoryValue::Float),
        }
    }

    /// One `ReadMemory` per byte, in ascending address order
    pub async fn read_bytes(
        &self,
        address: MemoryAddress,
        len: usize,
    ) -> Result<Vec<u8>, BridgeError> {
        let mut bytes = Vec::with_capacity(len);
        for index in 0..len {
            let command = EmuCommand::ReadMemory(address.offset_by(index as u32));
            let value = self.emulator.send(&command).await?;
            bytes.push(parse_hex_byte(&command, &value)?);
        }
        Ok(bytes)
    }

    pub async fn read_hex(&self, address: MemoryAddress, len: usize) -> Result<String, BridgeError> {
        let bytes = self.read_bytes(address, len).await?;
        Ok(bytes.iter().map(|byte| format!("{:02x}", byte)).collect())
    }

    pub async fn read_u8(&self, address: MemoryAddress) -> Result<u8, BridgeError> {
        let bytes = self.read_bytes(address, 1).await?;
        Ok(bytes[0])
    }

    pub async fn read_f32(&self, address: MemoryAddress) -> Result<f32, BridgeError> {
        let bytes = self.read_bytes(address, 4).await?;
        let value = decode_f32([bytes[0], bytes[1], bytes[2], bytes[3]]);
        debug!("{} = {}", address, value);
        Ok(value)
    }

    /// One `WriteMemory` per byte, `bytes[0]` at `address`
    pub async fn write_bytes(&self, address: MemoryAddress, bytes: &[u8]) -> Result<(), BridgeError> {
        for (index, &byte) in bytes.iter().enumerate() {
            let command = EmuCommand::WriteMemory(address.offset_by(index as u32), byte);
            self.emulator.send(&command).await?;
        }
        Ok(())
    }

    pub async fn write_f32(&self, address: MemoryAddress, value: f32) -> Result<(), BridgeError> {
        debug!("{} := {}", address, value);
        self.write_bytes(address, &encode_f32(value)).await
    }

    /// Raw 32-bit write, most significant byte first
    pub async fn write_u32(&self, address: MemoryAddress, value: u32) -> Result<(), BridgeError> {
        self.write_bytes(address, &value.to_be_bytes()).await
    }
}

/// Wire bytes of a float write, lowest address first
///
/// The host float is packed to its 32-bit pattern and that pattern is sent
/// most significant byte first, i.e. exactly the byte order [`decode_f32`]
/// reads back.
pub fn encode_f32(value: f32) -> [u8; 4] {
    value.to_bits().to_be_bytes()
}

pub fn decode_f32(bytes: [u8; 4]) -> f32 {
    f32::from_be_bytes(bytes)
}

fn parse_hex_byte(command: &EmuCommand, value: &str) -> Result<u8, BridgeError> {
    let well_formed = value.len() == 2 && value.bytes().all(|b| b.is_ascii_hexdigit());
    match u8::from_str_radix(value, 16) {
        Ok(byte) if well_formed => Ok(byte),
        _ => Err(BridgeError::MalformedResponse {
            command: command.to_string(),
            value: value.to_string(),
        }),
    }
}
