//! In-process stand-ins for the emulator and the virtual controller
//!
//! [`FakeRig`] connects real [`PipeChannel`]s to two tasks that speak the
//! line protocol over in-memory duplex streams. The fake console keeps a byte
//! map of memory, a frame counter and the pause flag, and places the balls
//! from the seed register on the first frame after the seed was written.
//! Faults (lost, late and garbled answers) are injected through [`Console`].

use crate::bridge::BilliardsBridge;
use crate::emulator::Emulator;
use crate::memory::{decode_f32, encode_f32, MemoryCodec};
use crate::pipes::{Correlator, GestureDispatcher, PipeChannel, RESPONSE_TIMEOUT};
use crate::protocol::addresses::{BALLS, RNG_SEED};
use crate::protocol::{MemRegion, MemoryAddress};
use crate::shot::{RetryPolicy, ShotPlan};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::io::{
    duplex, split, AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader,
    DuplexStream,
};

const PIPE_BUFFER: usize = 64 * 1024;
const DRAIN: Duration = Duration::from_millis(1);

/// Half width of the fake placement range, inside the table bounds
const PLACEMENT_EXTENT: f32 = 0.14;

#[derive(Default)]
struct ConsoleState {
    emulator_log: Vec<String>,
    controller_log: Vec<String>,
    paused: bool,
    frames: u32,
    loaded_slot: Option<u8>,
    memory: HashMap<MemoryAddress, u8>,
    breakpoints: HashSet<u32>,
    seed_written: bool,
    // (command prefix, matching responses still delivered before the drop)
    drops: Vec<(String, usize)>,
    delays: Vec<String>,
    held: Option<String>,
    late: Vec<(String, Duration)>,
    overrides: Vec<(String, String)>,
    controller_muted: bool,
}

impl ConsoleState {
    fn byte(&self, address: MemoryAddress) -> u8 {
        self.memory.get(&address).copied().unwrap_or(0)
    }

    fn word(&self, address: MemoryAddress) -> [u8; 4] {
        [0, 1, 2, 3].map(|index| self.byte(address.offset_by(index)))
    }

    fn write_word(&mut self, address: MemoryAddress, bytes: [u8; 4]) {
        for (index, byte) in bytes.into_iter().enumerate() {
            self.memory.insert(address.offset_by(index as u32), byte);
        }
    }

    fn place_balls_from_seed(&mut self) {
        let mut state = u32::from_be_bytes(self.word(RNG_SEED));
        let mut next = || {
            state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            let unit = (state >> 8) as f32 / (1u32 << 24) as f32;
            (unit * 2.0 - 1.0) * PLACEMENT_EXTENT
        };
        let placed: Vec<(f32, f32)> = BALLS.iter().map(|_| (next(), next())).collect();
        for (addresses, (x, z)) in BALLS.iter().zip(placed) {
            self.write_word(addresses.x, encode_f32(x));
            self.write_word(addresses.z, encode_f32(z));
        }
    }

    /// Applies one command line, returns the result token
    fn execute(&mut self, line: &str) -> String {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let result = match tokens.as_slice() {
            ["Pause"] => {
                self.paused = true;
                "0".to_string()
            }
            ["Resume"] => {
                self.paused = false;
                "0".to_string()
            }
            ["IsPaused"] => flag(self.paused),
            ["FrameAdvance"] => {
                self.frames += 1;
                if self.seed_written {
                    self.place_balls_from_seed();
                    self.seed_written = false;
                }
                "0".to_string()
            }
            ["UpdateInput"] => "0".to_string(),
            ["LoadSlot", slot] => match slot.parse() {
                Ok(slot) => {
                    self.loaded_slot = Some(slot);
                    "0".to_string()
                }
                Err(_) => "-1".to_string(),
            },
            ["ReadMemory", region, offset] => match parse_address(region, offset) {
                Some(address) => format!("{:02x}", self.byte(address)),
                None => "-1".to_string(),
            },
            ["WriteMemory", region, offset, value] => {
                match (parse_address(region, offset), u8::from_str_radix(value, 16)) {
                    (Some(address), Ok(value)) => {
                        self.memory.insert(address, value);
                        if address.region == RNG_SEED.region
                            && (RNG_SEED.offset..RNG_SEED.offset + 4).contains(&address.offset)
                        {
                            self.seed_written = true;
                        }
                        "0".to_string()
                    }
                    _ => "-1".to_string(),
                }
            }
            ["IsBreakpoint", address] => match u32::from_str_radix(address, 16) {
                Ok(address) => flag(self.breakpoints.contains(&address)),
                Err(_) => "-1".to_string(),
            },
            ["ToggleBreakpoint", address] => match u32::from_str_radix(address, 16) {
                Ok(address) => {
                    if !self.breakpoints.remove(&address) {
                        self.breakpoints.insert(address);
                    }
                    "0".to_string()
                }
                Err(_) => "-1".to_string(),
            },
            _ => "-1".to_string(),
        };

        self.overrides
            .iter()
            .find(|(prefix, _)| line.starts_with(prefix.as_str()))
            .map(|(_, value)| value.clone())
            .unwrap_or(result)
    }

    /// Whether the answer to `line` is swallowed
    fn take_drop(&mut self, line: &str) -> bool {
        let Some(index) = self
            .drops
            .iter()
            .position(|(prefix, _)| line.starts_with(prefix.as_str()))
        else {
            return false;
        };
        if self.drops[index].1 == 0 {
            self.drops.remove(index);
            true
        } else {
            self.drops[index].1 -= 1;
            false
        }
    }

    fn take_delay(&mut self, line: &str) -> bool {
        match self.delays.iter().position(|prefix| line.starts_with(prefix.as_str())) {
            Some(index) => {
                self.delays.remove(index);
                true
            }
            None => false,
        }
    }

    fn take_late(&mut self, line: &str) -> Option<Duration> {
        let index = self
            .late
            .iter()
            .position(|(prefix, _)| line.starts_with(prefix.as_str()))?;
        Some(self.late.remove(index).1)
    }

    /// Lines to write back for one received command
    fn respond(&mut self, line: &str) -> Replies {
        self.emulator_log.push(line.to_string());
        let response = format!("{} {}", line, self.execute(line));

        let mut replies = Replies {
            now: self.held.take().into_iter().collect(),
            later: None,
        };
        if self.take_drop(line) {
            return replies;
        }
        if self.take_delay(line) {
            self.held = Some(response);
        } else if let Some(after) = self.take_late(line) {
            replies.later = Some((after, response));
        } else {
            replies.now.push(response);
        }
        replies
    }
}

struct Replies {
    now: Vec<String>,
    // Written on its own once the delay has passed, whatever else arrives
    later: Option<(Duration, String)>,
}

fn flag(value: bool) -> String {
    let token = if value { "1" } else { "0" };
    token.to_string()
}

fn parse_address(region: &str, offset: &str) -> Option<MemoryAddress> {
    let region: MemRegion = region.parse().ok()?;
    let offset = u32::from_str_radix(offset, 16).ok()?;
    Some(MemoryAddress::new(region, offset))
}

/// A channel whose endpoint has stopped writing but still accepts input
///
/// The returned stream is the endpoint's inbound side; keep it alive so
/// writes from the bridge do not fail.
pub async fn silenced_channel(name: &str) -> (PipeChannel, DuplexStream) {
    let (bridge_out, endpoint_in) = duplex(PIPE_BUFFER);
    let (bridge_in, endpoint_out) = duplex(PIPE_BUFFER);
    drop(endpoint_out);
    let channel = PipeChannel::from_io(name, bridge_out, bridge_in, DRAIN).await;
    (channel, endpoint_in)
}

/// Inspection and fault injection handle on the fake console
#[derive(Clone)]
pub struct Console {
    state: Arc<Mutex<ConsoleState>>,
}

impl Console {
    fn state(&self) -> MutexGuard<'_, ConsoleState> {
        self.state.lock().unwrap()
    }

    pub fn emulator_log(&self) -> Vec<String> {
        self.state().emulator_log.clone()
    }

    pub fn controller_log(&self) -> Vec<String> {
        self.state().controller_log.clone()
    }

    pub fn frames(&self) -> u32 {
        self.state().frames
    }

    pub fn is_paused(&self) -> bool {
        self.state().paused
    }

    pub fn loaded_slot(&self) -> Option<u8> {
        self.state().loaded_slot
    }

    /// Swallows the answer to the `skip + 1`-th command starting with `prefix`
    pub fn drop_response(&self, prefix: &str, skip: usize) {
        self.state().drops.push((prefix.to_string(), skip));
    }

    /// Holds back the answer to the next command starting with `prefix`
    /// until another command arrives
    pub fn delay_response(&self, prefix: &str) {
        self.state().delays.push(prefix.to_string());
    }

    /// Answers the next command starting with `prefix` only after `after`
    pub fn late_response(&self, prefix: &str, after: Duration) {
        self.state().late.push((prefix.to_string(), after));
    }

    /// Answers every command starting with `prefix` with `value`
    pub fn override_result(&self, prefix: &str, value: &str) {
        self.state()
            .overrides
            .push((prefix.to_string(), value.to_string()));
    }

    pub fn mute_controller(&self, muted: bool) {
        self.state().controller_muted = muted;
    }

    pub fn set_breakpoint(&self, address: u32) {
        self.state().breakpoints.insert(address);
    }

    pub fn has_breakpoint(&self, address: u32) -> bool {
        self.state().breakpoints.contains(&address)
    }

    pub fn byte_at(&self, address: MemoryAddress) -> u8 {
        self.state().byte(address)
    }

    pub fn set_byte(&self, address: MemoryAddress, value: u8) {
        self.state().memory.insert(address, value);
    }

    pub fn f32_at(&self, address: MemoryAddress) -> f32 {
        decode_f32(self.state().word(address))
    }

    pub fn set_f32(&self, address: MemoryAddress, value: f32) {
        self.state().write_word(address, encode_f32(value));
    }
}

pub struct FakeRig {
    emulator: PipeChannel,
    controller: PipeChannel,
    console: Console,
}

impl FakeRig {
    pub async fn start() -> Self {
        let console = Console {
            state: Arc::new(Mutex::new(ConsoleState::default())),
        };

        let (bridge_side, emulator_side) = duplex(PIPE_BUFFER);
        let (bridge_read, bridge_write) = split(bridge_side);
        let (emulator_read, emulator_write) = split(emulator_side);
        tokio::spawn(run_emulator(console.clone(), emulator_read, emulator_write));
        let emulator = PipeChannel::from_io("emulator", bridge_write, bridge_read, DRAIN).await;

        let (bridge_side, controller_side) = duplex(PIPE_BUFFER);
        let (bridge_read, bridge_write) = split(bridge_side);
        let (controller_read, controller_write) = split(controller_side);
        tokio::spawn(run_controller(console.clone(), controller_read, controller_write));
        let controller =
            PipeChannel::from_io("controller", bridge_write, bridge_read, DRAIN).await;

        Self {
            emulator,
            controller,
            console,
        }
    }

    pub fn console(&self) -> Console {
        self.console.clone()
    }

    pub fn correlator(&self) -> Correlator {
        Correlator::new(self.emulator.clone(), RESPONSE_TIMEOUT)
    }

    pub fn emulator(&self) -> Emulator {
        Emulator::new(self.correlator())
    }

    pub fn controller(&self) -> GestureDispatcher {
        GestureDispatcher::new(self.controller.clone(), self.correlator(), RESPONSE_TIMEOUT)
    }

    pub fn memory(&self) -> MemoryCodec {
        MemoryCodec::new(self.correlator())
    }

    pub fn bridge(&self, retry: RetryPolicy) -> BilliardsBridge {
        self.bridge_with_plan(ShotPlan::default(), retry)
    }

    pub fn bridge_with_plan(&self, plan: ShotPlan, retry: RetryPolicy) -> BilliardsBridge {
        BilliardsBridge::from_channels(
            self.emulator.clone(),
            self.controller.clone(),
            RESPONSE_TIMEOUT,
            plan,
            retry,
        )
    }
}

async fn run_emulator<R, W>(console: Console, reader: R, writer: W)
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Send + Unpin + 'static,
{
    let writer = Arc::new(tokio::sync::Mutex::new(writer));
    let mut lines = BufReader::new(reader).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        let replies = console.state().respond(&line);
        for response in replies.now {
            let mut writer = writer.lock().await;
            if writer.write_all(format!("{}\n", response).as_bytes()).await.is_err() {
                return;
            }
        }
        if let Some((after, response)) = replies.later {
            let writer = writer.clone();
            tokio::spawn(async move {
                tokio::time::sleep(after).await;
                let _ = writer
                    .lock()
                    .await
                    .write_all(format!("{}\n", response).as_bytes())
                    .await;
            });
        }
    }
}

async fn run_controller<R, W>(console: Console, reader: R, mut writer: W)
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        let muted = {
            let mut state = console.state();
            state.controller_log.push(line);
            state.controller_muted
        };
        if !muted && writer.write_all(b"0\n").await.is_err() {
            return;
        }
    }
}
