//! Bridge configuration, stored as TOML
//!
//! Every section and key is optional; anything missing falls back to the
//! values the save slots and pipe layout were built around.

use crate::pipes::PipeEndpoint;
use crate::shot::{RetryPolicy, ShotPlan};
use color_eyre::eyre::{eyre, Result};
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

const CONFIG_DIR: &str = ".config/breakshot";
const CONFIG_FILE: &str = "config.toml";

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct BridgeConfig {
    pub pipes: PipesConfig,
    pub protocol: ProtocolConfig,
    pub slots: SlotConfig,
    pub timing: TimingConfig,
    pub retry: RetryConfig,
    pub breakpoints: BreakpointConfig,
}

/// Location of the four FIFOs
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct PipesConfig {
    pub dir: PathBuf,
    pub emulator_in: String,
    pub emulator_out: String,
    pub controller_in: String,
    pub controller_out: String,
}

impl Default for PipesConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("../Build/Binaries/user/Pipes"),
            emulator_in: "emu_in".to_string(),
            emulator_out: "emu_out".to_string(),
            controller_in: "wiimote_in".to_string(),
            controller_out: "wiimote_out".to_string(),
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct ProtocolConfig {
    /// Bound on every response wait
    pub response_timeout_ms: u64,
    /// How long stale output is collected and dropped when a pipe is opened
    pub drain_ms: u64,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            response_timeout_ms: 500,
            drain_ms: 30,
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct SlotConfig {
    pub pre_rng: u8,
    pub break_ready: u8,
}

impl Default for SlotConfig {
    fn default() -> Self {
        Self {
            pre_rng: 2,
            break_ready: 3,
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct TimingConfig {
    pub slot_settle_ms: u64,
    pub layout_frames: u32,
    pub menu_frames: u32,
    pub swing_frames: u32,
    pub table_settle_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            slot_settle_ms: 100,
            layout_frames: 10,
            menu_frames: 100,
            swing_frames: 20,
            table_settle_ms: 4000,
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct RetryConfig {
    /// Attempts per operation, 0 for no limit
    pub max_attempts: u32,
    pub backoff_ms: u64,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct BreakpointConfig {
    /// Remove ball perturbation breakpoints before generating a layout
    pub clear_before_layout: bool,
}

impl BridgeConfig {
    /// `~/.config/breakshot/config.toml`
    pub fn default_path() -> PathBuf {
        let mut path = get_home_dir();
        path.push(CONFIG_DIR);
        path.push(CONFIG_FILE);
        path
    }

    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Loads `path` if it exists, defaults otherwise
    pub async fn load_or_default(path: &Path) -> Result<Self> {
        if tokio::fs::try_exists(path)
            .await
            .map_err(|e| eyre!("Failed to check if config file exists: {}", e))?
        {
            Self::load(path).await
        } else {
            warn!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| eyre!("Failed to create config directory: {}", e))?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| eyre!("Failed to serialize config: {}", e))?;
        tokio::fs::write(path, content)
            .await
            .map_err(|e| eyre!("Failed to write config file: {}", e))?;
        Ok(())
    }

    /// Writes the default configuration unless `path` already exists.
    /// Returns whether a file was created.
    pub async fn ensure_default_config(path: &Path) -> Result<bool> {
        if tokio::fs::try_exists(path)
            .await
            .map_err(|e| eyre!("Failed to check if config file exists: {}", e))?
        {
            return Ok(false);
        }
        info!("Creating default configuration at {}", path.display());
        Self::default().save(path).await?;
        Ok(true)
    }

    pub fn emulator_endpoint(&self) -> PipeEndpoint {
        PipeEndpoint {
            name: "emulator".to_string(),
            inbound: self.pipes.dir.join(&self.pipes.emulator_in),
            outbound: self.pipes.dir.join(&self.pipes.emulator_out),
        }
    }

    pub fn controller_endpoint(&self) -> PipeEndpoint {
        PipeEndpoint {
            name: "controller".to_string(),
            inbound: self.pipes.dir.join(&self.pipes.controller_in),
            outbound: self.pipes.dir.join(&self.pipes.controller_out),
        }
    }

    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.protocol.response_timeout_ms)
    }

    pub fn drain(&self) -> Duration {
        Duration::from_millis(self.protocol.drain_ms)
    }

    pub fn shot_plan(&self) -> ShotPlan {
        ShotPlan {
            pre_rng_slot: self.slots.pre_rng,
            break_slot: self.slots.break_ready,
            slot_settle: Duration::from_millis(self.timing.slot_settle_ms),
            layout_frames: self.timing.layout_frames,
            menu_frames: self.timing.menu_frames,
            swing_frames: self.timing.swing_frames,
            table_settle: Duration::from_millis(self.timing.table_settle_ms),
            clear_breakpoints: self.breakpoints.clear_before_layout,
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        let policy = match NonZeroU32::new(self.retry.max_attempts) {
            Some(max) => RetryPolicy::bounded(max),
            None => RetryPolicy::unbounded(),
        };
        policy.with_backoff(Duration::from_millis(self.retry.backoff_ms))
    }
}

fn get_home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| {
        warn!("Could not determine home directory, using current directory");
        PathBuf::from(".")
    })
}
