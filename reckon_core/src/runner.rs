//! Orchestration: one `Fleet` owns every controller and ticks them from a
//! single clock. Commands from other threads arrive over a channel and are
//! applied between ticks, which is what serializes access to the controllers.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, TryRecvError};
use reckon_traits::{Clock, SwitchOutput};

use crate::builder::DynActuator;
use crate::error::{ReckonError, Result as CoreResult};
use crate::status::MotionStatus;
use crate::valve::Valve;

/// Boxed valve, the flavor the orchestrator stores.
pub type DynValve = Valve<Box<dyn SwitchOutput + Send>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceId {
    Actuator(usize),
    Valve(usize),
}

/// Command applied to the fleet between ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Target { actuator: usize, percent: u8 },
    Tilt { actuator: usize, percent: u8 },
    /// Position without tilt; the tilt target is inferred.
    Position { actuator: usize, percent: u8 },
    Open(DeviceId),
    Close(DeviceId),
    Stop(usize),
    OpenAll,
    CloseAll,
    StopAll,
}

/// Create the command channel feeding a running loop.
pub fn command_channel() -> (Sender<Command>, Receiver<Command>) {
    crossbeam_channel::unbounded()
}

/// Run-time knobs for the control loop.
#[derive(Debug, Clone, Copy)]
pub struct RunParams {
    /// Loop period between ticks.
    pub tick_ms: u32,
}

impl Default for RunParams {
    fn default() -> Self {
        Self { tick_ms: 10 }
    }
}

#[derive(Default)]
pub struct Fleet {
    actuators: Vec<DynActuator>,
    valves: Vec<DynValve>,
}

impl core::fmt::Debug for Fleet {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Fleet")
            .field("actuators", &self.actuators.len())
            .field("valves", &self.valves.len())
            .finish()
    }
}

impl Fleet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_actuator(&mut self, actuator: DynActuator) -> DeviceId {
        self.actuators.push(actuator);
        DeviceId::Actuator(self.actuators.len() - 1)
    }

    pub fn add_valve(&mut self, valve: DynValve) -> DeviceId {
        self.valves.push(valve);
        DeviceId::Valve(self.valves.len() - 1)
    }

    pub fn actuators(&self) -> &[DynActuator] {
        &self.actuators
    }

    pub fn valves(&self) -> &[DynValve] {
        &self.valves
    }

    pub fn actuator_mut(&mut self, idx: usize) -> CoreResult<&mut DynActuator> {
        self.actuators
            .get_mut(idx)
            .ok_or_else(|| eyre::Report::new(ReckonError::State(format!("no actuator #{idx}"))))
    }

    pub fn valve_mut(&mut self, idx: usize) -> CoreResult<&mut DynValve> {
        self.valves
            .get_mut(idx)
            .ok_or_else(|| eyre::Report::new(ReckonError::State(format!("no valve #{idx}"))))
    }

    pub fn any_moving(&self) -> bool {
        self.actuators.iter().any(DynActuator::is_moving) || self.valves.iter().any(DynValve::is_moving)
    }

    /// Tick every device. A failing device is logged and skipped so the
    /// others keep running; returns the number of failures.
    pub fn tick_all(&mut self, now: u32) -> usize {
        let mut failures = 0;
        for (idx, a) in self.actuators.iter_mut().enumerate() {
            match a.tick(now) {
                Ok(MotionStatus::Settled) => {
                    tracing::info!(actuator = idx, position_pct = a.current_percent(), "settled");
                }
                Ok(_) => {}
                Err(e) => {
                    failures += 1;
                    tracing::error!(actuator = idx, error = %e, "actuator tick failed");
                }
            }
        }
        for (idx, v) in self.valves.iter_mut().enumerate() {
            if let Err(e) = v.tick(now) {
                failures += 1;
                tracing::error!(valve = idx, error = %e, "valve tick failed");
            }
        }
        failures
    }

    pub fn open_all(&mut self, now: u32) -> CoreResult<()> {
        self.actuators.iter_mut().for_each(DynActuator::open);
        self.for_each_valve(|v| v.open(now))
    }

    pub fn close_all(&mut self, now: u32) -> CoreResult<()> {
        self.actuators.iter_mut().for_each(DynActuator::close);
        self.for_each_valve(|v| v.close(now))
    }

    /// Stop every actuator; all are attempted, the first error is returned.
    pub fn stop_all(&mut self, now: u32) -> CoreResult<()> {
        let mut first_err = None;
        for (idx, a) in self.actuators.iter_mut().enumerate() {
            if let Err(e) = a.stop(now) {
                tracing::warn!(actuator = idx, error = %e, "stop failed");
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    fn for_each_valve(&mut self, mut f: impl FnMut(&mut DynValve) -> CoreResult<()>) -> CoreResult<()> {
        let mut first_err = None;
        for (idx, v) in self.valves.iter_mut().enumerate() {
            if let Err(e) = f(v) {
                tracing::warn!(valve = idx, error = %e, "valve command failed");
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    pub fn apply(&mut self, cmd: Command, now: u32) -> CoreResult<()> {
        tracing::debug!(?cmd, "command");
        match cmd {
            Command::Target { actuator, percent } => {
                self.actuator_mut(actuator)?.set_target_percent(percent);
            }
            Command::Tilt { actuator, percent } => {
                self.actuator_mut(actuator)?.set_target_tilt_percent(percent);
            }
            Command::Position { actuator, percent } => {
                self.actuator_mut(actuator)?.command_position(percent);
            }
            Command::Open(DeviceId::Actuator(i)) => self.actuator_mut(i)?.open(),
            Command::Close(DeviceId::Actuator(i)) => self.actuator_mut(i)?.close(),
            Command::Open(DeviceId::Valve(i)) => self.valve_mut(i)?.open(now)?,
            Command::Close(DeviceId::Valve(i)) => self.valve_mut(i)?.close(now)?,
            Command::Stop(i) => self.actuator_mut(i)?.stop(now)?,
            Command::OpenAll => self.open_all(now)?,
            Command::CloseAll => self.close_all(now)?,
            Command::StopAll => self.stop_all(now)?,
        }
        Ok(())
    }
}

/// Run the control loop until `shutdown` is set, then stop every actuator.
///
/// Each iteration drains pending commands, ticks the fleet and sleeps one
/// period. A disconnected command channel is not an error; the loop keeps
/// ticking until shutdown.
pub fn run(
    fleet: &mut Fleet,
    clock: &dyn Clock,
    params: RunParams,
    commands: &Receiver<Command>,
    shutdown: &AtomicBool,
) -> CoreResult<()> {
    let period = Duration::from_millis(u64::from(params.tick_ms.max(1)));
    let mut channel_open = true;
    tracing::info!(tick_ms = params.tick_ms, "control loop started");

    while !shutdown.load(Ordering::Relaxed) {
        let now = clock.now_ms();
        while channel_open {
            match commands.try_recv() {
                Ok(cmd) => {
                    if let Err(e) = fleet.apply(cmd, now) {
                        tracing::warn!(error = %e, ?cmd, "command rejected");
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    tracing::debug!("command channel closed");
                    channel_open = false;
                }
            }
        }
        fleet.tick_all(now);
        clock.sleep(period);
    }

    tracing::info!("shutdown requested; stopping all actuators");
    fleet.stop_all(clock.now_ms())
}

/// Tick on `clock` until nothing moves or `max_ms` elapses. Returns the
/// elapsed simulated time.
pub fn run_until_idle(fleet: &mut Fleet, clock: &dyn Clock, params: RunParams, max_ms: u32) -> u32 {
    let period = Duration::from_millis(u64::from(params.tick_ms.max(1)));
    let start = clock.now_ms();
    loop {
        fleet.tick_all(clock.now_ms());
        let elapsed = clock.ms_since(start);
        if !fleet.any_moving() || elapsed >= max_ms {
            return elapsed;
        }
        clock.sleep(period);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{TravelCfg, ValveCfg};
    use crate::mocks::{RecordingDrive, RecordingSwitch};
    use reckon_traits::ManualClock;

    fn fleet_with_one_of_each() -> Fleet {
        let mut fleet = Fleet::new();
        let act = DynActuator::builder()
            .with_drive(RecordingDrive::new())
            .with_travel(TravelCfg::without_tilt(1_000))
            .build()
            .unwrap();
        fleet.add_actuator(act);
        let valve = Valve::new(
            Box::new(RecordingSwitch::new()) as Box<dyn SwitchOutput + Send>,
            ValveCfg {
                travel_ms: 500,
                ..ValveCfg::default()
            },
        )
        .unwrap();
        fleet.add_valve(valve);
        fleet
    }

    #[test]
    fn unknown_device_is_a_state_error() {
        let mut fleet = Fleet::new();
        let err = fleet
            .apply(Command::Target { actuator: 3, percent: 10 }, 0)
            .unwrap_err();
        assert!(matches!(err.downcast_ref::<ReckonError>(), Some(ReckonError::State(_))));
    }

    #[test]
    fn close_all_then_run_until_idle_settles_everything() {
        let mut fleet = fleet_with_one_of_each();
        let clock = ManualClock::new();
        fleet.apply(Command::CloseAll, clock.now_ms()).unwrap();
        let elapsed = run_until_idle(&mut fleet, &clock, RunParams::default(), 60_000);
        assert!(!fleet.any_moving());
        // 1000 ms travel plus the 1000 ms calibration overrun dominates.
        assert!((2_000..=2_020).contains(&elapsed), "elapsed={elapsed}");
        assert_eq!(fleet.actuators()[0].current_percent(), 100);
    }

    #[test]
    fn run_drains_commands_and_stops_on_shutdown() {
        let mut fleet = fleet_with_one_of_each();
        let clock = ManualClock::new();
        let (tx, rx) = command_channel();
        tx.send(Command::Target { actuator: 0, percent: 50 }).unwrap();
        drop(tx);
        let shutdown = AtomicBool::new(false);

        // A clock that raises the shutdown flag after a while.
        struct StopAfter<'a> {
            inner: ManualClock,
            flag: &'a AtomicBool,
            limit: u32,
        }
        impl Clock for StopAfter<'_> {
            fn now_ms(&self) -> u32 {
                self.inner.now_ms()
            }
            fn sleep(&self, d: Duration) {
                self.inner.sleep(d);
                if self.inner.now_ms() >= self.limit {
                    self.flag.store(true, Ordering::Relaxed);
                }
            }
        }
        let stopping = StopAfter {
            inner: clock.clone(),
            flag: &shutdown,
            limit: 2_000,
        };

        run(&mut fleet, &stopping, RunParams { tick_ms: 10 }, &rx, &shutdown).unwrap();
        let a = &fleet.actuators()[0];
        assert_eq!(a.current_percent(), 50);
        assert!(!a.is_moving());
    }
}
