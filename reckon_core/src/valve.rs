//! Binary, normally-open valve driven by a single switch output.
//!
//! Energizing the output closes the valve. Travel takes `travel_ms` in
//! either direction; a reversal mid-travel finishes after the time already
//! spent, so the estimate stays continuous.

use eyre::WrapErr;
use reckon_traits::{CoverState, StatusReport, SwitchOutput};

use crate::actuator::BoxedSink;
use crate::config::{ValveCfg, ValveStart};
use crate::error::{BuildError, Result};
use crate::hw_error::map_hw_error;
use crate::reversal::elapsed_in_old_direction;
use crate::status::MotionStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValveState {
    Closed,
    Open,
    Closing,
    Opening,
}

impl ValveState {
    fn as_cover_state(self) -> CoverState {
        match self {
            ValveState::Closed => CoverState::Closed,
            ValveState::Open => CoverState::Open,
            ValveState::Closing => CoverState::Closing,
            ValveState::Opening => CoverState::Opening,
        }
    }

    /// Output level for this state: energized means closing or closed.
    fn energized(self) -> bool {
        matches!(self, ValveState::Closed | ValveState::Closing)
    }
}

pub struct Valve<O: SwitchOutput> {
    output: O,
    travel_ms: u32,
    state: ValveState,
    finish_at: Option<u32>,
    sink: Option<BoxedSink>,
}

impl<O: SwitchOutput> core::fmt::Debug for Valve<O> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Valve")
            .field("state", &self.state)
            .field("travel_ms", &self.travel_ms)
            .field("finish_at", &self.finish_at)
            .finish()
    }
}

impl<O: SwitchOutput> Valve<O> {
    /// Create a valve resting in `cfg.initial` and drive the output to match.
    pub fn new(output: O, cfg: ValveCfg) -> Result<Self> {
        if cfg.travel_ms == 0 {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "valve travel_ms must be > 0",
            )));
        }
        let state = match cfg.initial {
            ValveStart::Open => ValveState::Open,
            ValveStart::Closed => ValveState::Closed,
        };
        let mut valve = Self {
            output,
            travel_ms: cfg.travel_ms,
            state,
            finish_at: None,
            sink: None,
        };
        valve.write_output()?;
        Ok(valve)
    }

    pub fn with_sink(mut self, sink: BoxedSink) -> Self {
        self.sink = Some(sink);
        self
    }

    #[inline]
    pub fn state(&self) -> ValveState {
        self.state
    }

    #[inline]
    pub fn is_moving(&self) -> bool {
        matches!(self.state, ValveState::Opening | ValveState::Closing)
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    pub fn open(&mut self, now: u32) -> Result<()> {
        self.head_for(ValveState::Opening, now)
    }

    pub fn close(&mut self, now: u32) -> Result<()> {
        self.head_for(ValveState::Closing, now)
    }

    /// Complete a travel once its deadline passes.
    pub fn tick(&mut self, now: u32) -> Result<MotionStatus> {
        let Some(finish_at) = self.finish_at else {
            return Ok(MotionStatus::Idle);
        };
        if (now.wrapping_sub(finish_at) as i32) < 0 {
            return Ok(MotionStatus::Running);
        }
        self.finish_at = None;
        self.state = match self.state {
            ValveState::Closing => ValveState::Closed,
            ValveState::Opening => ValveState::Open,
            resting => resting,
        };
        self.write_output()?;
        tracing::debug!(state = ?self.state, "valve travel complete");
        self.report();
        Ok(MotionStatus::Settled)
    }

    fn head_for(&mut self, moving: ValveState, now: u32) -> Result<()> {
        let (resting, opposite) = match moving {
            ValveState::Opening => (ValveState::Open, ValveState::Closing),
            _ => (ValveState::Closed, ValveState::Opening),
        };
        if self.state == moving || self.state == resting {
            return Ok(());
        }

        let travel = if self.state == opposite {
            // An overdue deadline means the old travel already finished.
            let remaining = self.finish_at.map_or(0, |f| {
                let left = f.wrapping_sub(now);
                if (left as i32) < 0 { 0 } else { left.min(self.travel_ms) }
            });
            let elapsed = elapsed_in_old_direction(self.travel_ms, remaining);
            tracing::debug!(elapsed_ms = elapsed, remaining_ms = remaining, "valve reversal");
            elapsed
        } else {
            self.travel_ms
        };

        self.state = moving;
        self.finish_at = Some(now.wrapping_add(travel));
        self.write_output()?;
        self.report();
        Ok(())
    }

    fn write_output(&mut self) -> Result<()> {
        self.output
            .set(self.state.energized())
            .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
            .wrap_err("valve output")
    }

    fn report(&mut self) {
        if let Some(sink) = self.sink.as_mut() {
            sink.report(StatusReport {
                state: self.state.as_cover_state(),
                position: match self.state {
                    ValveState::Closed => 100,
                    _ => 0,
                },
                tilt: None,
            });
        }
    }
}
