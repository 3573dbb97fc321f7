//! Type-state builder for `Actuator` and generic `build_actuator` constructor.
//!
//! The builder enforces at compile time that drive outputs and travel
//! durations are provided before `build()` is available. `try_build()` is
//! always available for dynamic checks.

use std::marker::PhantomData;
use std::num::NonZeroU32;

use reckon_traits::{DriveOutputs, PositionStore};

use crate::actuator::{Actuator, BoxedSink, BoxedStore, Pending};
use crate::calibration::CalibrationGuard;
use crate::config::{SlotCfg, TimingCfg, TravelCfg};
use crate::error::{BuildError, Result};
use crate::integrator::Integrator;
use crate::position::Axis;
use crate::safety::SafetyGate;
use crate::status::MotionState;

/// Longest travel we accept; keeps every position sum far inside `i32`.
pub const MAX_TRAVEL_MS: u32 = 24 * 60 * 60 * 1000;
/// Longest safety delay; keeps the wrap-safe comparison valid.
pub const MAX_SAFETY_DELAY_MS: u32 = 60 * 60 * 1000;

/// Boxed drive, the flavor the orchestrator stores.
pub type DynDrive = Box<dyn DriveOutputs + Send>;
/// Dynamically dispatched actuator.
pub type DynActuator = Actuator<DynDrive>;

// ── Type-state markers ───────────────────────────────────────────────────────

pub struct Missing;
pub struct Set;

/// Builder for `Actuator`. All fields are validated on `build()`.
pub struct ActuatorBuilder<D, T> {
    drive: Option<DynDrive>,
    travel: Option<TravelCfg>,
    timing: Option<TimingCfg>,
    slots: SlotCfg,
    store: Option<BoxedStore>,
    sink: Option<BoxedSink>,
    _d: PhantomData<D>,
    _t: PhantomData<T>,
}

impl Default for ActuatorBuilder<Missing, Missing> {
    fn default() -> Self {
        Self {
            drive: None,
            travel: None,
            timing: None,
            slots: SlotCfg::default(),
            store: None,
            sink: None,
            _d: PhantomData,
            _t: PhantomData,
        }
    }
}

impl DynActuator {
    /// Start building a boxed actuator.
    pub fn builder() -> ActuatorBuilder<Missing, Missing> {
        ActuatorBuilder::default()
    }
}

/// Validate configuration and construct an `Actuator` seeded from the store.
///
/// This is the single source of truth for validation and construction,
/// used by both `ActuatorBuilder::try_build()` and `build_actuator()`.
fn validate_and_build<D: DriveOutputs>(
    mut drive: D,
    travel: TravelCfg,
    timing: TimingCfg,
    slots: SlotCfg,
    store: Option<BoxedStore>,
    sink: Option<BoxedSink>,
) -> Result<Actuator<D>> {
    // ── Validation ───────────────────────────────────────────────────────────
    let Some(full) = NonZeroU32::new(travel.full_travel_ms) else {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "full_travel_ms must be > 0",
        )));
    };
    if travel.full_travel_ms > MAX_TRAVEL_MS {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "full_travel_ms must be <= 24h",
        )));
    }
    if travel.full_tilt_travel_ms > MAX_TRAVEL_MS {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "full_tilt_travel_ms must be <= 24h",
        )));
    }
    if timing.calibration_ms > MAX_TRAVEL_MS {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "calibration_ms must be <= 24h",
        )));
    }
    if timing.safety_delay_ms > MAX_SAFETY_DELAY_MS {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "safety_delay_ms must be <= 1h",
        )));
    }
    let tilt_full = NonZeroU32::new(travel.full_tilt_travel_ms);
    if tilt_full.is_none() && slots.tilt.is_some() {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "tilt slot requires a tilt axis",
        )));
    }

    // ── Seed from persisted positions ────────────────────────────────────────
    let seed = |slot: Option<u16>| -> i32 {
        match (slot, store.as_ref()) {
            (Some(slot), Some(store)) => load_or_zero(&**store, slot),
            _ => 0,
        }
    };
    let primary = Axis::at_rest(full, seed(slots.position));
    let tilt = tilt_full.map(|t| Axis::at_rest(t, seed(slots.tilt)));

    // Outputs start released.
    if let Err(e) = drive.set_forward(false).and(drive.set_reverse(false)) {
        tracing::warn!(error = %e, "initial output release failed");
    }

    tracing::debug!(
        full_travel_ms = travel.full_travel_ms,
        full_tilt_travel_ms = travel.full_tilt_travel_ms,
        position_ms = primary.current_ms(),
        "actuator ready"
    );

    Ok(Actuator {
        drive,
        primary,
        tilt,
        state: MotionState::Idle,
        direction: None,
        integrator: Integrator::default(),
        gate: SafetyGate::new(timing.safety_delay_ms),
        guard: CalibrationGuard::new(timing.calibration_ms),
        segment: None,
        slots,
        store,
        sink,
        pending: Pending::default(),
        dirty: false,
    })
}

/// Read a persisted position; a missing or unreadable value means "at 0".
fn load_or_zero(store: &(dyn PositionStore + Send), slot: u16) -> i32 {
    match store.get(slot) {
        Ok(Some(v)) => v,
        Ok(None) => 0,
        Err(e) => {
            tracing::warn!(error = %e, slot, "reading persisted position failed; assuming 0");
            0
        }
    }
}

impl<D, T> ActuatorBuilder<D, T> {
    /// Fallible build available in any type-state; returns detailed error for missing pieces.
    pub fn try_build(self) -> Result<DynActuator> {
        let drive = self
            .drive
            .ok_or_else(|| eyre::Report::new(BuildError::MissingDrive))?;
        let travel = self
            .travel
            .ok_or_else(|| eyre::Report::new(BuildError::MissingTravel))?;
        validate_and_build(
            drive,
            travel,
            self.timing.unwrap_or_default(),
            self.slots,
            self.store,
            self.sink,
        )
    }
}

/// Chainable setters that do not affect type-state.
impl<D, T> ActuatorBuilder<D, T> {
    pub fn with_timing(mut self, timing: TimingCfg) -> Self {
        self.timing = Some(timing);
        self
    }
    pub fn with_slots(mut self, slots: SlotCfg) -> Self {
        self.slots = slots;
        self
    }
    pub fn with_store(mut self, store: impl PositionStore + Send + 'static) -> Self {
        self.store = Some(Box::new(store));
        self
    }
    pub fn with_sink(mut self, sink: impl reckon_traits::StatusSink + Send + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }
}

// Setters that advance type-state
impl<T> ActuatorBuilder<Missing, T> {
    pub fn with_drive(
        self,
        drive: impl DriveOutputs + Send + 'static,
    ) -> ActuatorBuilder<Set, T> {
        ActuatorBuilder {
            drive: Some(Box::new(drive)),
            travel: self.travel,
            timing: self.timing,
            slots: self.slots,
            store: self.store,
            sink: self.sink,
            _d: PhantomData,
            _t: PhantomData,
        }
    }
}

impl<D> ActuatorBuilder<D, Missing> {
    pub fn with_travel(self, travel: TravelCfg) -> ActuatorBuilder<D, Set> {
        ActuatorBuilder {
            drive: self.drive,
            travel: Some(travel),
            timing: self.timing,
            slots: self.slots,
            store: self.store,
            sink: self.sink,
            _d: PhantomData,
            _t: PhantomData,
        }
    }
}

impl ActuatorBuilder<Set, Set> {
    /// Validate and build. Only available when drive and travel are set.
    pub fn build(self) -> Result<DynActuator> {
        self.try_build()
    }
}

/// Build a statically dispatched `Actuator` from a concrete drive.
///
/// Delegates to the shared `validate_and_build`.
pub fn build_actuator<D: DriveOutputs>(
    drive: D,
    travel: TravelCfg,
    timing: TimingCfg,
    slots: SlotCfg,
    store: Option<BoxedStore>,
    sink: Option<BoxedSink>,
) -> Result<Actuator<D>> {
    validate_and_build(drive, travel, timing, slots, store, sink)
}
