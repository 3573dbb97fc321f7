//! The actuator controller (`Actuator`).
//!
//! Drives a reversible motor through two mutually exclusive outputs and
//! tracks its position purely from elapsed drive time. Each `tick(now)`
//! runs the motion state machine: it engages a direction once the safety
//! gate allows it, integrates elapsed time while moving, lets the
//! calibration guard decide when a bound target is done, and hands a
//! turned-around motion to the reversal bookkeeping.

use eyre::WrapErr;
use reckon_traits::{CoverState, DriveOutputs, PositionStore, StatusReport, StatusSink};

use crate::calibration::{CalibrationGuard, GuardVerdict};
use crate::config::SlotCfg;
use crate::error::Result;
use crate::hw_error::map_hw_error;
use crate::integrator::{Direction, Integrator};
use crate::position::Axis;
use crate::reversal::{Segment, elapsed_in_old_direction};
use crate::safety::SafetyGate;
use crate::status::{MotionState, MotionStatus};

pub type BoxedStore = Box<dyn PositionStore + Send>;
pub type BoxedSink = Box<dyn StatusSink + Send>;

/// Upper bound on immediate state transitions inside one tick.
const MAX_TRANSITIONS: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AxisKind {
    Primary,
    Tilt,
}

enum Step {
    Again,
    Done(MotionStatus),
}

/// Axes whose target came from a command rather than from following.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Pending {
    pub(crate) primary: bool,
    pub(crate) tilt: bool,
}

impl Pending {
    fn clear(&mut self, kind: AxisKind) {
        match kind {
            AxisKind::Primary => self.primary = false,
            AxisKind::Tilt => self.tilt = false,
        }
    }
}

pub struct Actuator<D: DriveOutputs> {
    pub(crate) drive: D,
    pub(crate) primary: Axis,
    pub(crate) tilt: Option<Axis>,
    pub(crate) state: MotionState,
    pub(crate) direction: Option<Direction>,
    pub(crate) integrator: Integrator,
    pub(crate) gate: SafetyGate,
    pub(crate) guard: CalibrationGuard,
    pub(crate) segment: Option<Segment>,
    pub(crate) slots: SlotCfg,
    pub(crate) store: Option<BoxedStore>,
    pub(crate) sink: Option<BoxedSink>,
    pub(crate) pending: Pending,
    /// Position changed since it was last persisted.
    pub(crate) dirty: bool,
}

impl<D: DriveOutputs> core::fmt::Debug for Actuator<D> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Actuator")
            .field("state", &self.state)
            .field("direction", &self.direction)
            .field("position_ms", &self.primary.current_ms())
            .field("target_ms", &self.primary.target_ms())
            .field("tilt_ms", &self.tilt.map(|t| t.current_ms()))
            .finish()
    }
}

impl<D: DriveOutputs> Actuator<D> {
    // ── Command surface ──────────────────────────────────────────────────────

    /// Set the primary target. Values above 100 are clamped.
    pub fn set_target_percent(&mut self, percent: u8) {
        self.primary.set_target_percent(percent);
        self.pending.primary = true;
        tracing::debug!(target_pct = percent.min(100), "primary target set");
    }

    /// Set the tilt target; ignored when the actuator has no tilt axis.
    pub fn set_target_tilt_percent(&mut self, percent: u8) {
        match self.tilt.as_mut() {
            Some(tilt) => {
                tilt.set_target_percent(percent);
                self.pending.tilt = true;
                tracing::debug!(target_pct = percent.min(100), "tilt target set");
            }
            None => tracing::debug!("tilt axis disabled; ignoring tilt target"),
        }
    }

    /// Fully open: both axes to 0%.
    pub fn open(&mut self) {
        self.set_target_percent(0);
        if self.tilt.is_some() {
            self.set_target_tilt_percent(0);
        }
    }

    /// Fully close: both axes to 100%.
    pub fn close(&mut self) {
        self.set_target_percent(100);
        if self.tilt.is_some() {
            self.set_target_tilt_percent(100);
        }
    }

    /// Stop where we are: release both outputs, freeze both targets at the
    /// current estimate and arm the safety delay.
    pub fn stop(&mut self, now: u32) -> Result<()> {
        if let (Some(dir), Some(kind)) = (self.direction, self.driven_axis()) {
            let elapsed = self.integrator.step(now);
            self.integrate(kind, dir, elapsed);
        }
        let released = self.release(now);
        self.primary.hold();
        if let Some(tilt) = self.tilt.as_mut() {
            tilt.hold();
        }
        self.state = MotionState::Idle;
        self.pending = Pending::default();
        if self.dirty {
            self.persist();
        }

        let resting = self.resting_state();
        let reported = if resting == CoverState::Closed || self.primary.at_lower_bound() {
            resting
        } else {
            CoverState::Stopped
        };
        tracing::info!(position_pct = self.primary.current_percent(), "stopped");
        self.report(reported);
        released
    }

    pub fn current_percent(&self) -> u8 {
        self.primary.current_percent()
    }

    /// `None` when the actuator has no tilt axis.
    pub fn current_tilt_percent(&self) -> Option<u8> {
        self.tilt.as_ref().map(Axis::current_percent)
    }

    pub fn target_percent(&self) -> u8 {
        self.primary.target_percent()
    }

    pub fn target_tilt_percent(&self) -> Option<u8> {
        self.tilt.as_ref().map(Axis::target_percent)
    }

    #[inline]
    pub fn is_moving(&self) -> bool {
        self.state != MotionState::Idle
    }

    #[inline]
    pub fn state(&self) -> MotionState {
        self.state
    }

    #[inline]
    pub fn direction(&self) -> Option<Direction> {
        self.direction
    }

    pub fn primary(&self) -> &Axis {
        &self.primary
    }

    pub fn tilt(&self) -> Option<&Axis> {
        self.tilt.as_ref()
    }

    pub fn has_tilt(&self) -> bool {
        self.tilt.is_some()
    }

    pub fn drive(&self) -> &D {
        &self.drive
    }

    // ── State machine ────────────────────────────────────────────────────────

    /// Advance the controller to `now` (monotonic ms, wrapping).
    ///
    /// A command is acted on in the tick that first observes it: Idle falls
    /// through into a targeting state and engages in the same call.
    pub fn tick(&mut self, now: u32) -> Result<MotionStatus> {
        for _ in 0..MAX_TRANSITIONS {
            let step = match self.state {
                MotionState::Idle => self.step_idle(),
                MotionState::TargetingPrimary => self.step_targeting(AxisKind::Primary, now)?,
                MotionState::TargetingSecondary => self.step_targeting(AxisKind::Tilt, now)?,
            };
            if let Step::Done(status) = step {
                return Ok(status);
            }
        }
        Ok(if self.is_moving() {
            MotionStatus::Waiting
        } else {
            MotionStatus::Idle
        })
    }

    fn step_idle(&mut self) -> Step {
        if !self.primary.is_settled() {
            self.state = MotionState::TargetingPrimary;
            return Step::Again;
        }
        // A command that is already satisfied is no longer pending.
        self.pending.primary = false;
        if self.tilt.is_some_and(|t| !t.is_settled()) {
            self.state = MotionState::TargetingSecondary;
            return Step::Again;
        }
        self.pending.tilt = false;
        Step::Done(MotionStatus::Idle)
    }

    fn step_targeting(&mut self, kind: AxisKind, now: u32) -> Result<Step> {
        let Some(axis) = self.axis(kind).copied() else {
            self.state = MotionState::Idle;
            return Ok(Step::Again);
        };

        let Some(dir) = self.direction else {
            if self.gate.is_active(now) {
                return Ok(Step::Done(MotionStatus::Waiting));
            }
            return match Direction::toward(axis.current_ms(), axis.target_ms()) {
                Some(dir) => {
                    self.engage(kind, dir, now)?;
                    Ok(Step::Done(MotionStatus::Running))
                }
                None => {
                    // Landed exactly on target without a drive engaged (e.g. a
                    // reversal onto the current position).
                    self.pending.clear(kind);
                    if self.dirty {
                        self.persist();
                        let resting = self.resting_state();
                        self.report(resting);
                    }
                    self.state = MotionState::Idle;
                    Ok(Step::Again)
                }
            };
        };

        let elapsed = self.integrator.step(now);
        self.integrate(kind, dir, elapsed);

        let Some(axis) = self.axis(kind).copied() else {
            return Ok(Step::Done(MotionStatus::Running));
        };
        if let Some(seg) = self.segment
            && seg.end_ms != axis.target_ms()
        {
            if dir.is_ahead(axis.current_ms(), axis.target_ms()) {
                tracing::debug!(from_ms = seg.end_ms, to_ms = axis.target_ms(), "retarget ahead");
                self.segment = Some(Segment {
                    end_ms: axis.target_ms(),
                    ..seg
                });
            } else {
                self.reverse(kind, now)?;
                return Ok(if self.gate.is_active(now) {
                    Step::Done(MotionStatus::Reversing)
                } else {
                    Step::Again
                });
            }
        }

        let guard = match kind {
            AxisKind::Primary => self.guard,
            AxisKind::Tilt => CalibrationGuard::disabled(),
        };
        match guard.assess(&axis, dir) {
            GuardVerdict::Continue => Ok(Step::Done(MotionStatus::Running)),
            GuardVerdict::Overrunning { overrun_ms } => {
                tracing::trace!(overrun_ms, window_ms = guard.window_ms(), "calibration overrun");
                Ok(Step::Done(MotionStatus::Calibrating))
            }
            GuardVerdict::Settle => {
                self.settle(kind, now)?;
                Ok(Step::Done(MotionStatus::Settled))
            }
        }
    }

    // ── Private: outputs, bookkeeping, collaborators ─────────────────────────

    fn engage(&mut self, kind: AxisKind, dir: Direction, now: u32) -> Result<()> {
        // Opposite line first: both lines must never be high together.
        let written = match dir {
            Direction::Forward => self
                .drive
                .set_reverse(false)
                .and_then(|()| self.drive.set_forward(true)),
            Direction::Reverse => self
                .drive
                .set_forward(false)
                .and_then(|()| self.drive.set_reverse(true)),
        };
        if let Err(e) = written {
            if let Err(release_err) = self.release(now) {
                tracing::warn!(error = %release_err, "release failed after engage error");
            }
            return Err(eyre::Report::new(map_hw_error(&*e))).wrap_err(match dir {
                Direction::Forward => "engage forward",
                Direction::Reverse => "engage reverse",
            });
        }

        let Some(axis) = self.axis(kind).copied() else {
            return Ok(());
        };
        self.direction = Some(dir);
        self.integrator.reset(now);
        self.segment = Some(Segment::new(axis.current_ms(), axis.target_ms(), dir));
        tracing::debug!(
            axis = ?kind,
            direction = ?dir,
            from_ms = axis.current_ms(),
            to_ms = axis.target_ms(),
            "drive engaged"
        );
        self.report(match dir {
            Direction::Forward => CoverState::Closing,
            Direction::Reverse => CoverState::Opening,
        });
        Ok(())
    }

    /// Release both outputs and arm the safety delay. Both writes are always
    /// attempted; the first failure is returned.
    fn release(&mut self, now: u32) -> Result<()> {
        self.direction = None;
        self.segment = None;
        self.gate.arm(now);
        let forward = self.drive.set_forward(false);
        let reverse = self.drive.set_reverse(false);
        forward
            .and(reverse)
            .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
            .wrap_err("release drive outputs")
    }

    fn reverse(&mut self, kind: AxisKind, now: u32) -> Result<()> {
        if let Some(seg) = self.segment
            && let Some(axis) = self.axis_mut(kind)
        {
            let remaining_ms = seg.remaining_ms(axis.current_ms);
            axis.current_ms = seg.continuity_point(axis.current_ms);
            axis.clamp_to_bounds();
            tracing::debug!(
                axis = ?kind,
                traveled_ms = elapsed_in_old_direction(seg.len_ms(), remaining_ms),
                remaining_ms,
                position_ms = axis.current_ms,
                "direction reversal; waiting out safety delay"
            );
        }
        self.release(now)
    }

    fn settle(&mut self, kind: AxisKind, now: u32) -> Result<()> {
        let released = self.release(now);
        self.pending.clear(kind);
        // The follower keeps its target only when one was commanded; otherwise
        // it rests wherever following left it.
        let (hold_primary, hold_tilt) = match kind {
            AxisKind::Primary => (true, !self.pending.tilt),
            AxisKind::Tilt => (!self.pending.primary, true),
        };
        if hold_primary {
            self.primary.hold();
        } else {
            self.primary.clamp_to_bounds();
        }
        if let Some(tilt) = self.tilt.as_mut() {
            if hold_tilt {
                tilt.hold();
            } else {
                tilt.clamp_to_bounds();
            }
        }
        self.state = MotionState::Idle;
        tracing::debug!(
            axis = ?kind,
            position_ms = self.primary.current_ms(),
            tilt_ms = ?self.tilt.map(|t| t.current_ms()),
            "settled"
        );
        self.persist();
        let resting = self.resting_state();
        self.report(resting);
        released
    }

    fn persist(&mut self) {
        self.dirty = false;
        let Some(store) = self.store.as_mut() else {
            return;
        };
        if let Some(slot) = self.slots.position
            && let Err(e) = store.put(slot, self.primary.current_ms())
        {
            tracing::warn!(error = %e, slot, "persisting position failed; continuing");
        }
        if let (Some(slot), Some(tilt)) = (self.slots.tilt, self.tilt.as_ref())
            && let Err(e) = store.put(slot, tilt.current_ms())
        {
            tracing::warn!(error = %e, slot, "persisting tilt failed; continuing");
        }
    }

    fn report(&mut self, state: CoverState) {
        let report = StatusReport {
            state,
            position: self.primary.current_percent(),
            tilt: self.current_tilt_percent(),
        };
        tracing::debug!(state = %state, position = report.position, tilt = ?report.tilt, "status");
        if let Some(sink) = self.sink.as_mut() {
            sink.report(report);
        }
    }

    /// Closed only when fully closed on every axis; anything else is open.
    fn resting_state(&self) -> CoverState {
        let tilt_closed = self.tilt.is_none_or(|t| t.at_upper_bound());
        if self.primary.at_upper_bound() && tilt_closed {
            CoverState::Closed
        } else {
            CoverState::Open
        }
    }

    pub(crate) fn driven_axis(&self) -> Option<AxisKind> {
        match self.state {
            MotionState::Idle => None,
            MotionState::TargetingPrimary => Some(AxisKind::Primary),
            MotionState::TargetingSecondary => Some(AxisKind::Tilt),
        }
    }

    pub(crate) fn axis(&self, kind: AxisKind) -> Option<&Axis> {
        match kind {
            AxisKind::Primary => Some(&self.primary),
            AxisKind::Tilt => self.tilt.as_ref(),
        }
    }

    fn axis_mut(&mut self, kind: AxisKind) -> Option<&mut Axis> {
        match kind {
            AxisKind::Primary => Some(&mut self.primary),
            AxisKind::Tilt => self.tilt.as_mut(),
        }
    }
}
