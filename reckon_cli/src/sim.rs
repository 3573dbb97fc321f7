//! `simulate` and `script`: drive the configured devices on a manual clock.

use std::time::Duration;

use crossbeam_channel::Receiver;
use reckon_config::{Config, ScriptRow};
use reckon_core::runner::run_until_idle;
use reckon_core::{Command, DeviceId, ReckonError, RunParams};
use reckon_traits::{Clock, ManualClock};
use serde_json::json;

use crate::commands::to_command;
use crate::events::{StatusEvent, render};
use crate::fleet::{Assembly, Backend, assemble, open_store};

pub struct Simulation {
    asm: Assembly,
    clock: ManualClock,
    events: Receiver<StatusEvent>,
    params: RunParams,
    json: bool,
}

impl Simulation {
    /// Simulated outputs and an in-memory store, so a dry run never touches
    /// the persisted image.
    pub fn new(cfg: &Config, json: bool) -> eyre::Result<Self> {
        let clock = ManualClock::new();
        let store = open_store(&cfg.storage, false)?;
        let (tx, events) = crossbeam_channel::unbounded();
        let asm = assemble(cfg, Backend::Simulated, &store, &tx, &clock)?;
        Ok(Self {
            asm,
            clock,
            events,
            params: RunParams {
                tick_ms: cfg.runner.tick_ms,
            },
            json,
        })
    }

    pub fn id(&self, name: &str) -> eyre::Result<DeviceId> {
        self.asm.id(name)
    }

    pub fn apply(&mut self, cmd: Command) -> eyre::Result<()> {
        self.asm.fleet.apply(cmd, self.clock.now_ms())
    }

    /// Tick until the clock reaches `at_ms`.
    pub fn advance_to(&mut self, at_ms: u32) {
        let period = Duration::from_millis(u64::from(self.params.tick_ms));
        while self.clock.now_ms() < at_ms {
            self.asm.fleet.tick_all(self.clock.now_ms());
            self.print_events();
            self.clock.sleep(period);
        }
    }

    /// Run until every device rests; errors if something still moves after `max_ms`.
    pub fn settle(&mut self, max_ms: u32) -> eyre::Result<u32> {
        let elapsed = run_until_idle(&mut self.asm.fleet, &self.clock, self.params, max_ms);
        self.print_events();
        if self.asm.fleet.any_moving() {
            return Err(eyre::Report::new(ReckonError::State(format!(
                "still moving after {max_ms} ms of simulated time"
            ))));
        }
        Ok(elapsed)
    }

    fn print_events(&self) {
        for ev in self.events.try_iter() {
            println!("{}", render(&ev, self.json));
        }
    }

    /// One summary line per device, in config order.
    pub fn print_summary(&self, cfg: &Config) {
        let now = self.clock.now_ms();
        for name in cfg.covers.iter().map(|c| &c.name).chain(cfg.valves.iter().map(|v| &v.name)) {
            let Ok(id) = self.asm.id(name) else { continue };
            let line = match id {
                DeviceId::Actuator(i) => {
                    let a = &self.asm.fleet.actuators()[i];
                    if self.json {
                        json!({
                            "summary": true,
                            "at_ms": now,
                            "device": name,
                            "position": a.current_percent(),
                            "tilt": a.current_tilt_percent(),
                        })
                        .to_string()
                    } else {
                        let tilt = a
                            .current_tilt_percent()
                            .map(|t| format!(", tilt {t}%"))
                            .unwrap_or_default();
                        format!("{name}: position {}%{tilt}", a.current_percent())
                    }
                }
                DeviceId::Valve(i) => {
                    let state = format!("{:?}", self.asm.fleet.valves()[i].state()).to_lowercase();
                    if self.json {
                        json!({ "summary": true, "at_ms": now, "device": name, "state": state })
                            .to_string()
                    } else {
                        format!("{name}: {state}")
                    }
                }
            };
            println!("{line}");
        }
    }
}

/// What `simulate` was asked to do.
#[derive(Debug, Default, Clone, Copy)]
pub struct Actions {
    pub target: Option<u8>,
    pub tilt: Option<u8>,
    pub position: Option<u8>,
    pub open: bool,
    pub close: bool,
}

impl Actions {
    fn commands(self, id: DeviceId) -> eyre::Result<Vec<Command>> {
        use reckon_config::ScriptCommand as S;
        let mut out = Vec::new();
        if self.open {
            out.push(to_command(id, S::Open, None)?);
        }
        if self.close {
            out.push(to_command(id, S::Close, None)?);
        }
        if let Some(p) = self.position {
            out.push(to_command(id, S::Position, Some(p))?);
        }
        if let Some(p) = self.target {
            out.push(to_command(id, S::Target, Some(p))?);
        }
        if let Some(p) = self.tilt {
            out.push(to_command(id, S::Tilt, Some(p))?);
        }
        if out.is_empty() {
            eyre::bail!("nothing to do; pass --target, --tilt, --position, --open or --close");
        }
        Ok(out)
    }
}

pub fn simulate(cfg: &Config, device: &str, actions: Actions, max_ms: u32, json: bool) -> eyre::Result<()> {
    let mut sim = Simulation::new(cfg, json)?;
    let id = sim.id(device)?;
    for cmd in actions.commands(id)? {
        sim.apply(cmd)?;
    }
    let elapsed = sim.settle(max_ms)?;
    tracing::info!(device, elapsed_ms = elapsed, "simulation settled");
    sim.print_summary(cfg);
    Ok(())
}

pub fn replay_script(cfg: &Config, rows: &[ScriptRow], max_ms: u32, json: bool) -> eyre::Result<()> {
    let mut sim = Simulation::new(cfg, json)?;
    // Resolve every row up front so a typo fails before anything moves.
    let commands = rows
        .iter()
        .enumerate()
        .map(|(idx, row)| {
            let id = sim.id(&row.device)?;
            to_command(id, row.command, row.value)
                .map(|cmd| (row.at_ms, cmd))
                .map_err(|e| e.wrap_err(format!("script row {}", idx + 2)))
        })
        .collect::<eyre::Result<Vec<_>>>()?;

    for (at_ms, cmd) in commands {
        sim.advance_to(at_ms);
        if let Err(e) = sim.apply(cmd) {
            tracing::warn!(error = %e, ?cmd, "script command rejected");
        }
    }
    let elapsed = sim.settle(max_ms)?;
    tracing::info!(rows = rows.len(), elapsed_ms = elapsed, "script finished");
    sim.print_summary(cfg);
    Ok(())
}
