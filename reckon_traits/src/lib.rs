pub mod clock;

pub use clock::{Clock, ManualClock, MonotonicClock};

use std::sync::{Arc, Mutex};

/// Two mutually exclusive drive lines of a reversible motor.
///
/// `forward` increases the dead-reckoned position (closing), `reverse`
/// decreases it (opening). Callers never assert both lines at once.
pub trait DriveOutputs {
    fn set_forward(&mut self, on: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    fn set_reverse(&mut self, on: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// A single binary output, e.g. the coil of a valve.
pub trait SwitchOutput {
    fn set(&mut self, on: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Slot-addressed persistence for settled positions (milliseconds of travel).
pub trait PositionStore {
    fn put(&mut self, slot: u16, value: i32) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    fn get(&self, slot: u16) -> Result<Option<i32>, Box<dyn std::error::Error + Send + Sync>>;
}

/// Receives coarse state changes from a controller.
pub trait StatusSink {
    fn report(&mut self, report: StatusReport);
}

/// Coarse semantic state published to the outside world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CoverState {
    Opening,
    Closing,
    Open,
    Closed,
    Stopped,
}

impl CoverState {
    pub fn as_str(self) -> &'static str {
        match self {
            CoverState::Opening => "opening",
            CoverState::Closing => "closing",
            CoverState::Open => "open",
            CoverState::Closed => "closed",
            CoverState::Stopped => "stopped",
        }
    }
}

impl std::fmt::Display for CoverState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One notification: state plus current percentages (0 = open, 100 = closed).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusReport {
    pub state: CoverState,
    pub position: u8,
    /// `None` when the device has no tilt axis.
    pub tilt: Option<u8>,
}

// ── Forwarding impls ─────────────────────────────────────────────────────────

impl<T: DriveOutputs + ?Sized> DriveOutputs for Box<T> {
    fn set_forward(&mut self, on: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).set_forward(on)
    }
    fn set_reverse(&mut self, on: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).set_reverse(on)
    }
}

impl<T: SwitchOutput + ?Sized> SwitchOutput for Box<T> {
    fn set(&mut self, on: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).set(on)
    }
}

impl<T: StatusSink + ?Sized> StatusSink for Box<T> {
    fn report(&mut self, report: StatusReport) {
        (**self).report(report);
    }
}

/// Several controllers usually share one store image.
impl<T: PositionStore + ?Sized> PositionStore for Arc<Mutex<T>> {
    fn put(&mut self, slot: u16, value: i32) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut guard = self.lock().map_err(|_| "position store lock poisoned")?;
        guard.put(slot, value)
    }

    fn get(&self, slot: u16) -> Result<Option<i32>, Box<dyn std::error::Error + Send + Sync>> {
        let guard = self.lock().map_err(|_| "position store lock poisoned")?;
        guard.get(slot)
    }
}
