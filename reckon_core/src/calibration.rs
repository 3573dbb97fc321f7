//! Calibration guard: deliberate overrun past an end-stop to cancel drift.
//!
//! When the driven axis is heading for one of its bounds it keeps moving for
//! up to `window_ms` past the nominal bound, so the mechanism always seats
//! against the physical stop. Intermediate targets settle as soon as they
//! are reached.

use crate::integrator::Direction;
use crate::position::Axis;

/// Outcome of checking a moving axis against its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardVerdict {
    /// Target not reached yet.
    Continue,
    /// Past a bound target, still inside the overrun window.
    Overrunning { overrun_ms: u32 },
    /// Stop now; the caller clamps the axis to its bounds.
    Settle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalibrationGuard {
    window_ms: u32,
}

impl CalibrationGuard {
    pub fn new(window_ms: u32) -> Self {
        Self { window_ms }
    }

    /// A guard that settles exactly at the bound (used for the tilt axis).
    pub fn disabled() -> Self {
        Self { window_ms: 0 }
    }

    #[inline]
    pub fn window_ms(&self) -> u32 {
        self.window_ms
    }

    pub fn assess(&self, axis: &Axis, dir: Direction) -> GuardVerdict {
        let current = axis.current_ms();
        let target = axis.target_ms();
        if dir.is_ahead(current, target) {
            return GuardVerdict::Continue;
        }

        let overrun = match dir {
            Direction::Forward if target >= axis.full_ms() => current - axis.full_ms(),
            Direction::Reverse if target <= 0 => -current,
            _ => return GuardVerdict::Settle,
        };
        match u32::try_from(overrun) {
            Ok(overrun_ms) if overrun_ms < self.window_ms => {
                GuardVerdict::Overrunning { overrun_ms }
            }
            _ => GuardVerdict::Settle,
        }
    }
}
