//! Dead-reckoning integrator.

use crate::position::Axis;

/// Drive direction. Forward increases position (closing), Reverse decreases it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Forward,
    Reverse,
}

impl Direction {
    /// Direction that moves `current` toward `target`, if any.
    pub fn toward(current: i32, target: i32) -> Option<Self> {
        match current.cmp(&target) {
            std::cmp::Ordering::Less => Some(Direction::Forward),
            std::cmp::Ordering::Greater => Some(Direction::Reverse),
            std::cmp::Ordering::Equal => None,
        }
    }

    #[inline]
    pub fn opposite(self) -> Self {
        match self {
            Direction::Forward => Direction::Reverse,
            Direction::Reverse => Direction::Forward,
        }
    }

    #[inline]
    pub fn sign(self) -> i32 {
        match self {
            Direction::Forward => 1,
            Direction::Reverse => -1,
        }
    }

    /// Whether `target` still lies ahead of `current` when moving this way.
    #[inline]
    pub fn is_ahead(self, current: i32, target: i32) -> bool {
        match self {
            Direction::Forward => target > current,
            Direction::Reverse => target < current,
        }
    }
}

/// Tracks the timestamp of the last integration step.
#[derive(Debug, Clone, Copy, Default)]
pub struct Integrator {
    last_tick_at: u32,
}

impl Integrator {
    /// Restart measuring from `now` (called when a drive engages).
    #[inline]
    pub fn reset(&mut self, now: u32) {
        self.last_tick_at = now;
    }

    /// Elapsed milliseconds since the previous step, wrap-safe.
    #[inline]
    pub fn step(&mut self, now: u32) -> u32 {
        let elapsed = now.wrapping_sub(self.last_tick_at);
        self.last_tick_at = now;
        elapsed
    }

    #[inline]
    pub fn last_tick_at(&self) -> u32 {
        self.last_tick_at
    }
}

#[inline]
fn signed_delta(dir: Direction, elapsed_ms: u32) -> i32 {
    i32::try_from(elapsed_ms).unwrap_or(i32::MAX) * dir.sign()
}

/// Advance the driven axis without clamping; the calibration guard owns its bounds.
pub fn advance_driven(axis: &mut Axis, dir: Direction, elapsed_ms: u32) {
    axis.current_ms = axis.current_ms.saturating_add(signed_delta(dir, elapsed_ms));
}

/// Advance a passively coupled axis, clamped to its bounds.
pub fn advance_follower(axis: &mut Axis, dir: Direction, elapsed_ms: u32) {
    axis.current_ms = axis
        .current_ms
        .saturating_add(signed_delta(dir, elapsed_ms))
        .clamp(0, axis.full_ms());
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::num::NonZeroU32;

    fn axis(full: u32, pos: i32) -> Axis {
        Axis::at_rest(NonZeroU32::new(full).unwrap(), pos)
    }

    #[test]
    fn step_measures_across_wraparound() {
        let mut i = Integrator::default();
        i.reset(u32::MAX - 9);
        assert_eq!(i.step(10), 20);
        assert_eq!(i.last_tick_at(), 10);
    }

    #[test]
    fn driven_axis_may_overrun_follower_may_not() {
        let mut driven = axis(1000, 990);
        let mut follower = axis(300, 290);
        advance_driven(&mut driven, Direction::Forward, 40);
        advance_follower(&mut follower, Direction::Forward, 40);
        assert_eq!(driven.current_ms(), 1030);
        assert_eq!(follower.current_ms(), 300);

        advance_follower(&mut follower, Direction::Reverse, 500);
        assert_eq!(follower.current_ms(), 0);
    }

    #[test]
    fn toward_and_is_ahead_agree() {
        assert_eq!(Direction::toward(0, 10), Some(Direction::Forward));
        assert_eq!(Direction::toward(10, 0), Some(Direction::Reverse));
        assert_eq!(Direction::toward(5, 5), None);
        assert!(Direction::Forward.is_ahead(0, 10));
        assert!(!Direction::Reverse.is_ahead(0, 10));
    }
}
