#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schemas and command-script parsing for the actuator controller.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - Script CSV loader enforces headers and checks each row's command.
use std::collections::HashSet;

use serde::Deserialize;

/// Bytes per persisted record: write counter (u32) plus value (i32).
pub const STORE_RECORD_BYTES: usize = 8;

/// Longest accepted travel or overrun window.
const MAX_TRAVEL_MS: u32 = 24 * 60 * 60 * 1000;

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct TimingCfg {
    /// Calibration overrun past an end-stop (ms).
    pub calibration_ms: u32,
    /// Released dwell after every stop (ms).
    pub safety_delay_ms: u32,
}

impl Default for TimingCfg {
    fn default() -> Self {
        Self {
            calibration_ms: 1000,
            safety_delay_ms: 250,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RunnerCfg {
    /// Control loop period (ms).
    pub tick_ms: u32,
}

impl Default for RunnerCfg {
    fn default() -> Self {
        Self { tick_ms: 10 }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StorageCfg {
    /// Backing file for the store image; in-memory when absent.
    pub path: Option<String>,
    /// Records in each slot's wear-leveling ring.
    pub slots_per_key: u16,
    /// Size of the store image in bytes.
    pub size_bytes: usize,
}

impl Default for StorageCfg {
    fn default() -> Self {
        Self {
            path: None,
            slots_per_key: 10,
            size_bytes: 4096,
        }
    }
}

impl StorageCfg {
    /// Number of addressable slots in the configured image.
    pub fn slot_capacity(&self) -> usize {
        let ring = usize::from(self.slots_per_key.max(1)) * STORE_RECORD_BYTES;
        self.size_bytes / ring
    }
}

/// A motorized cover; a plain open/close motor is a cover without tilt.
#[derive(Debug, Deserialize, Clone)]
pub struct CoverCfg {
    pub name: String,
    pub forward_pin: u8,
    pub reverse_pin: u8,
    pub full_travel_ms: u32,
    #[serde(default)]
    pub full_tilt_travel_ms: u32,
    #[serde(default)]
    pub position_slot: Option<u16>,
    #[serde(default)]
    pub tilt_slot: Option<u16>,
    /// Per-cover override of `[timing].calibration_ms`.
    #[serde(default)]
    pub calibration_ms: Option<u32>,
    /// Per-cover override of `[timing].safety_delay_ms`.
    #[serde(default)]
    pub safety_delay_ms: Option<u32>,
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ValveInitial {
    #[default]
    Open,
    Closed,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ValveCfg {
    pub name: String,
    pub pin: u8,
    #[serde(default = "default_valve_travel_ms")]
    pub travel_ms: u32,
    #[serde(default)]
    pub initial: ValveInitial,
}

fn default_valve_travel_ms() -> u32 {
    120_000
}

#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub timing: TimingCfg,
    #[serde(default)]
    pub runner: RunnerCfg,
    #[serde(default)]
    pub logging: Logging,
    #[serde(default)]
    pub storage: StorageCfg,
    #[serde(default, rename = "cover")]
    pub covers: Vec<CoverCfg>,
    #[serde(default, rename = "valve")]
    pub valves: Vec<ValveCfg>,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Timing
        if self.timing.calibration_ms > 60_000 {
            eyre::bail!("timing.calibration_ms must be <= 60000");
        }
        if self.timing.safety_delay_ms > 10_000 {
            eyre::bail!("timing.safety_delay_ms must be <= 10000");
        }

        // Runner
        if !(1..=1000).contains(&self.runner.tick_ms) {
            eyre::bail!("runner.tick_ms must be in [1, 1000]");
        }

        // Storage
        if self.storage.slots_per_key == 0 {
            eyre::bail!("storage.slots_per_key must be >= 1");
        }
        if self.storage.size_bytes < usize::from(self.storage.slots_per_key) * STORE_RECORD_BYTES {
            eyre::bail!("storage.size_bytes must hold at least one slot");
        }

        // Logging
        if let Some(rot) = self.logging.rotation.as_deref()
            && !matches!(rot, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly, got {rot:?}");
        }

        if self.covers.is_empty() && self.valves.is_empty() {
            eyre::bail!("at least one [[cover]] or [[valve]] must be configured");
        }

        let mut names = HashSet::new();
        let mut pins = HashSet::new();
        let mut slots = HashSet::new();
        let capacity = self.storage.slot_capacity();

        for c in &self.covers {
            if c.name.trim().is_empty() {
                eyre::bail!("cover name must not be empty");
            }
            if !names.insert(c.name.as_str()) {
                eyre::bail!("duplicate device name {:?}", c.name);
            }
            if c.full_travel_ms == 0 {
                eyre::bail!("cover {:?}: full_travel_ms must be > 0", c.name);
            }
            if c.full_travel_ms > MAX_TRAVEL_MS || c.full_tilt_travel_ms > MAX_TRAVEL_MS {
                eyre::bail!("cover {:?}: travel times are unreasonably large (>24h)", c.name);
            }
            if c.forward_pin == c.reverse_pin {
                eyre::bail!("cover {:?}: forward_pin and reverse_pin must differ", c.name);
            }
            for pin in [c.forward_pin, c.reverse_pin] {
                if !pins.insert(pin) {
                    eyre::bail!("pin {pin} is used more than once");
                }
            }
            if c.calibration_ms.is_some_and(|v| v > 60_000) {
                eyre::bail!("cover {:?}: calibration_ms must be <= 60000", c.name);
            }
            if c.safety_delay_ms.is_some_and(|v| v > 10_000) {
                eyre::bail!("cover {:?}: safety_delay_ms must be <= 10000", c.name);
            }
            if c.tilt_slot.is_some() && c.full_tilt_travel_ms == 0 {
                eyre::bail!("cover {:?}: tilt_slot requires full_tilt_travel_ms > 0", c.name);
            }
            for slot in [c.position_slot, c.tilt_slot].into_iter().flatten() {
                if usize::from(slot) >= capacity {
                    eyre::bail!(
                        "cover {:?}: slot {slot} does not fit in storage ({capacity} slots)",
                        c.name
                    );
                }
                if !slots.insert(slot) {
                    eyre::bail!("storage slot {slot} is used more than once");
                }
            }
        }

        for v in &self.valves {
            if v.name.trim().is_empty() {
                eyre::bail!("valve name must not be empty");
            }
            if !names.insert(v.name.as_str()) {
                eyre::bail!("duplicate device name {:?}", v.name);
            }
            if v.travel_ms == 0 {
                eyre::bail!("valve {:?}: travel_ms must be > 0", v.name);
            }
            if v.travel_ms > MAX_TRAVEL_MS {
                eyre::bail!("valve {:?}: travel_ms is unreasonably large (>24h)", v.name);
            }
            if !pins.insert(v.pin) {
                eyre::bail!("pin {} is used more than once", v.pin);
            }
        }

        Ok(())
    }
}

// ── Command scripts ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ScriptCommand {
    Target,
    Tilt,
    Position,
    Open,
    Close,
    Stop,
}

impl ScriptCommand {
    pub fn needs_value(self) -> bool {
        matches!(
            self,
            ScriptCommand::Target | ScriptCommand::Tilt | ScriptCommand::Position
        )
    }
}

/// Script CSV schema.
///
/// Expected headers:
/// at_ms,device,command,value
///
/// Example:
/// at_ms,device,command,value
/// 0,living,target,100
/// 4000,living,target,0
/// 9000,garden,open,
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ScriptRow {
    pub at_ms: u32,
    pub device: String,
    pub command: ScriptCommand,
    pub value: Option<u8>,
}

pub fn load_script_csv(path: &std::path::Path) -> eyre::Result<Vec<ScriptRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| eyre::eyre!("open script CSV {:?}: {}", path, e))?;

    // Enforce exact headers
    let headers = rdr
        .headers()
        .map_err(|e| eyre::eyre!("read CSV headers {:?}: {}", path, e))?
        .clone();
    let expected = ["at_ms", "device", "command", "value"];
    let actual: Vec<String> = headers.iter().map(|s| s.to_string()).collect();
    if actual != expected {
        eyre::bail!(
            "script CSV must have headers 'at_ms,device,command,value', got: {}",
            actual.join(",")
        );
    }

    let mut rows: Vec<ScriptRow> = Vec::new();
    for (idx, rec) in rdr.deserialize::<ScriptRow>().enumerate() {
        let line = idx + 2;
        let row = rec.map_err(|e| eyre::eyre!("invalid CSV row {line}: {e}"))?;
        if row.command.needs_value() && row.value.is_none() {
            eyre::bail!("row {line}: command {:?} needs a value", row.command);
        }
        if let Some(prev) = rows.last()
            && row.at_ms < prev.at_ms
        {
            eyre::bail!("row {line}: at_ms must not decrease");
        }
        rows.push(row);
    }
    Ok(rows)
}
