//! Configuration types for the controllers.
//!
//! These are the runtime configuration structs used by `Actuator` and `Valve`.
//! They are separate from the TOML-deserialized config in `reckon_config`.

/// Travel durations of an actuator.
#[derive(Debug, Clone, Copy)]
pub struct TravelCfg {
    /// Time to cross the primary axis from 0% to 100%. Must be > 0.
    pub full_travel_ms: u32,
    /// Time to cross the tilt axis; 0 disables tilt entirely.
    pub full_tilt_travel_ms: u32,
}

impl TravelCfg {
    pub fn without_tilt(full_travel_ms: u32) -> Self {
        Self {
            full_travel_ms,
            full_tilt_travel_ms: 0,
        }
    }
}

/// Timing knobs shared by the guard and the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingCfg {
    /// Overrun allowed past an end-stop when the target is that end-stop.
    pub calibration_ms: u32,
    /// Minimum dwell with both outputs released after any stop.
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

impl TimingCfg {
    /// Apply per-device overrides on top of these defaults.
    pub fn with_overrides(self, calibration_ms: Option<u32>, safety_delay_ms: Option<u32>) -> Self {
        Self {
            calibration_ms: calibration_ms.unwrap_or(self.calibration_ms),
            safety_delay_ms: safety_delay_ms.unwrap_or(self.safety_delay_ms),
        }
    }
}

/// Store slots where settled positions live. `None` disables persistence for that axis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SlotCfg {
    pub position: Option<u16>,
    pub tilt: Option<u16>,
}

/// Resting state a valve assumes at startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ValveStart {
    #[default]
    Open,
    Closed,
}

#[derive(Debug, Clone, Copy)]
pub struct ValveCfg {
    /// Time for a full open or close travel.
    pub travel_ms: u32,
    pub initial: ValveStart,
}

impl Default for ValveCfg {
    fn default() -> Self {
        Self {
            travel_ms: 120_000,
            initial: ValveStart::Open,
        }
    }
}
