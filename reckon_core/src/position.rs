//! Position model: one axis measured in milliseconds of drive time.
//!
//! Positions are `i32` so the calibration overrun can briefly leave
//! `[0, full]`; everything at rest is clamped back into range.

use std::num::NonZeroU32;

/// Map a percentage onto `[0, full_ms]`. Values above 100 are clamped.
#[inline]
pub fn percent_to_ms(percent: u8, full_ms: NonZeroU32) -> i32 {
    let p = u64::from(percent.min(100));
    // full_ms is bounded by config validation, the product fits comfortably.
    (p * u64::from(full_ms.get()) / 100) as i32
}

/// Inverse of [`percent_to_ms`], rounding half up and clamping to `0..=100`.
#[inline]
pub fn ms_to_percent(ms: i32, full_ms: NonZeroU32) -> u8 {
    let full = i64::from(full_ms.get());
    let ms = i64::from(ms).clamp(0, full);
    ((ms * 100 + full / 2) / full) as u8
}

/// Current and target position of one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Axis {
    full_ms: NonZeroU32,
    pub(crate) current_ms: i32,
    pub(crate) target_ms: i32,
}

impl Axis {
    /// An axis at rest at `position_ms` (clamped).
    pub fn at_rest(full_ms: NonZeroU32, position_ms: i32) -> Self {
        let pos = position_ms.clamp(0, full_ms.get() as i32);
        Self {
            full_ms,
            current_ms: pos,
            target_ms: pos,
        }
    }

    #[inline]
    pub fn full_ms(&self) -> i32 {
        self.full_ms.get() as i32
    }

    #[inline]
    pub fn current_ms(&self) -> i32 {
        self.current_ms
    }

    #[inline]
    pub fn target_ms(&self) -> i32 {
        self.target_ms
    }

    pub fn current_percent(&self) -> u8 {
        ms_to_percent(self.current_ms, self.full_ms)
    }

    pub fn target_percent(&self) -> u8 {
        ms_to_percent(self.target_ms, self.full_ms)
    }

    pub fn set_target_percent(&mut self, percent: u8) {
        self.target_ms = percent_to_ms(percent, self.full_ms);
    }

    #[inline]
    pub fn is_settled(&self) -> bool {
        self.current_ms == self.target_ms
    }

    /// Clamp the current position into `[0, full]`.
    pub fn clamp_to_bounds(&mut self) {
        self.current_ms = self.current_ms.clamp(0, self.full_ms());
    }

    /// Freeze: target becomes the (clamped) current position.
    pub fn hold(&mut self) {
        self.clamp_to_bounds();
        self.target_ms = self.current_ms;
    }

    #[inline]
    pub fn at_upper_bound(&self) -> bool {
        self.current_ms >= self.full_ms()
    }

    #[inline]
    pub fn at_lower_bound(&self) -> bool {
        self.current_ms <= 0
    }
}
