//! `From` implementations bridging `reckon_config` types to `reckon_core` types.

use crate::config::{SlotCfg, TimingCfg, TravelCfg, ValveCfg, ValveStart};

// ── TimingCfg ────────────────────────────────────────────────────────────────

impl From<&reckon_config::TimingCfg> for TimingCfg {
    fn from(c: &reckon_config::TimingCfg) -> Self {
        Self {
            calibration_ms: c.calibration_ms,
            safety_delay_ms: c.safety_delay_ms,
        }
    }
}

impl TimingCfg {
    /// Shared defaults with the cover's own overrides applied.
    pub fn for_cover(defaults: &reckon_config::TimingCfg, cover: &reckon_config::CoverCfg) -> Self {
        Self::from(defaults).with_overrides(cover.calibration_ms, cover.safety_delay_ms)
    }
}

// ── TravelCfg / SlotCfg ──────────────────────────────────────────────────────

impl From<&reckon_config::CoverCfg> for TravelCfg {
    fn from(c: &reckon_config::CoverCfg) -> Self {
        Self {
            full_travel_ms: c.full_travel_ms,
            full_tilt_travel_ms: c.full_tilt_travel_ms,
        }
    }
}

impl From<&reckon_config::CoverCfg> for SlotCfg {
    fn from(c: &reckon_config::CoverCfg) -> Self {
        Self {
            position: c.position_slot,
            tilt: c.tilt_slot,
        }
    }
}

// ── ValveCfg ─────────────────────────────────────────────────────────────────

impl From<&reckon_config::ValveCfg> for ValveCfg {
    fn from(c: &reckon_config::ValveCfg) -> Self {
        Self {
            travel_ms: c.travel_ms,
            initial: match c.initial {
                reckon_config::ValveInitial::Open => ValveStart::Open,
                reckon_config::ValveInitial::Closed => ValveStart::Closed,
            },
        }
    }
}
