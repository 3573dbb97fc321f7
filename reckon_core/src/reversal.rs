//! Reversal handling: keep dead-reckoned progress continuous when a motion
//! is turned around before it completes.

use crate::integrator::Direction;

/// Time already spent in the old direction, which is exactly the time the
/// new direction needs to get back to where the old motion started.
#[inline]
pub fn elapsed_in_old_direction(old_full_ms: u32, remaining_ms: u32) -> u32 {
    old_full_ms.saturating_sub(remaining_ms)
}

/// One engaged motion from `start_ms` toward `end_ms`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub start_ms: i32,
    pub end_ms: i32,
    pub dir: Direction,
}

impl Segment {
    pub fn new(start_ms: i32, end_ms: i32, dir: Direction) -> Self {
        Self {
            start_ms,
            end_ms,
            dir,
        }
    }

    #[inline]
    pub fn len_ms(&self) -> u32 {
        self.start_ms.abs_diff(self.end_ms)
    }

    /// Distance still to go from `current`, zero once past the end.
    pub fn remaining_ms(&self, current: i32) -> u32 {
        if self.dir.is_ahead(current, self.end_ms) {
            current.abs_diff(self.end_ms)
        } else {
            0
        }
    }

    /// Position reached after `traveled_ms` along this segment.
    pub fn position_after(&self, traveled_ms: u32) -> i32 {
        let traveled = i32::try_from(traveled_ms).unwrap_or(i32::MAX);
        self.start_ms.saturating_add(traveled.saturating_mul(self.dir.sign()))
    }

    /// Position to resume from after turning around at `current`.
    ///
    /// Progress is the time already spent in the old direction, so the result
    /// always lies on the segment: a position past the end (calibration
    /// overrun, or a tick that overshot) rebases onto the end itself.
    pub fn continuity_point(&self, current: i32) -> i32 {
        let traveled = elapsed_in_old_direction(self.len_ms(), self.remaining_ms(current));
        self.position_after(traveled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reversing_at_forty_percent_needs_forty_percent_back() {
        assert_eq!(elapsed_in_old_direction(10_000, 6_000), 4_000);
        assert_eq!(elapsed_in_old_direction(120_000, 0), 120_000);
        assert_eq!(elapsed_in_old_direction(1_000, 5_000), 0);
    }

    #[test]
    fn continuity_point_is_identity_inside_segment() {
        let fwd = Segment::new(0, 10_000, Direction::Forward);
        assert_eq!(fwd.continuity_point(4_000), 4_000);
        let rev = Segment::new(8_000, 2_000, Direction::Reverse);
        assert_eq!(rev.remaining_ms(5_000), 3_000);
        assert_eq!(rev.continuity_point(5_000), 5_000);
    }

    #[test]
    fn overrun_past_the_end_rebases_onto_the_end() {
        let fwd = Segment::new(0, 10_000, Direction::Forward);
        assert_eq!(fwd.remaining_ms(10_510), 0);
        assert_eq!(fwd.continuity_point(10_510), 10_000);
        let rev = Segment::new(6_000, 0, Direction::Reverse);
        assert_eq!(rev.continuity_point(-400), 0);
    }

    #[test]
    fn overshoot_of_an_intermediate_target_lands_on_it() {
        let fwd = Segment::new(1_000, 2_000, Direction::Forward);
        assert_eq!(fwd.continuity_point(2_050), 2_000);
    }
}
