//! Status returned from each controller tick.

/// Motion state of an actuator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MotionState {
    #[default]
    Idle,
    TargetingPrimary,
    TargetingSecondary,
}

/// What a single `tick()` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionStatus {
    /// Nothing to do.
    Idle,
    /// A target is pending but the safety delay holds the outputs released.
    Waiting,
    /// A drive is engaged and the target is still ahead.
    Running,
    /// Past an end-stop target, inside the calibration window.
    Calibrating,
    /// A motion was interrupted by a target in the opposite direction.
    Reversing,
    /// An axis reached its target; outputs released.
    Settled,
}

impl MotionStatus {
    #[inline]
    pub fn is_active(self) -> bool {
        !matches!(self, MotionStatus::Idle | MotionStatus::Settled)
    }
}
