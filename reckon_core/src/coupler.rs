//! Dual-axis coupling: the tilt axis rides on the same drive signal as the
//! primary axis, and a bare position command infers a tilt target.

use std::cmp::Ordering;

use reckon_traits::DriveOutputs;

use crate::actuator::{Actuator, AxisKind};
use crate::integrator::{Direction, advance_driven, advance_follower};

/// Tilt target implied by moving from `current` to `requested` percent.
///
/// Moving further (greater) retracts the slats, moving back closes them;
/// an unchanged position leaves tilt alone.
pub fn tilt_target_for(requested: u8, current: u8) -> Option<u8> {
    match requested.min(100).cmp(&current) {
        Ordering::Greater => Some(0),
        Ordering::Less => Some(100),
        Ordering::Equal => None,
    }
}

impl<D: DriveOutputs> Actuator<D> {
    /// Position command from a source that cannot express tilt.
    ///
    /// The inferred tilt motion runs after the primary settles and shares its
    /// drive signal, so the primary ends up shifted by as much as the full
    /// tilt travel. Callers needing an exact primary position should use
    /// `set_target_percent` instead.
    pub fn command_position(&mut self, percent: u8) {
        if self.tilt.is_some()
            && let Some(tilt_pct) = tilt_target_for(percent, self.current_percent())
        {
            self.set_target_tilt_percent(tilt_pct);
        }
        self.set_target_percent(percent);
    }

    /// Integrate `elapsed_ms` of drive on the driven axis; the other axis follows.
    pub(crate) fn integrate(&mut self, kind: AxisKind, dir: Direction, elapsed_ms: u32) {
        match kind {
            AxisKind::Primary => {
                advance_driven(&mut self.primary, dir, elapsed_ms);
                if let Some(tilt) = self.tilt.as_mut() {
                    advance_follower(tilt, dir, elapsed_ms);
                }
            }
            AxisKind::Tilt => {
                if let Some(tilt) = self.tilt.as_mut() {
                    advance_driven(tilt, dir, elapsed_ms);
                }
                advance_follower(&mut self.primary, dir, elapsed_ms);
            }
        }
        if elapsed_ms > 0 {
            self.dirty = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(70, 50, Some(0))]
    #[case(30, 50, Some(100))]
    #[case(50, 50, None)]
    #[case(200, 100, None)]
    fn heuristic_table(#[case] requested: u8, #[case] current: u8, #[case] want: Option<u8>) {
        assert_eq!(tilt_target_for(requested, current), want);
    }
}
