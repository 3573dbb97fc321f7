//! `run` and `self-check`: the real-time control loop and a dry assembly.

use std::io::BufRead;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use eyre::WrapErr;
use reckon_config::Config;
use reckon_core::{RunParams, command_channel, runner};
use reckon_traits::MonotonicClock;
use serde_json::json;

use crate::commands::parse_line;
use crate::events::render;
use crate::fleet::{Backend, assemble, open_store};

pub fn run(cfg: &Config, tick_ms: Option<u32>, duration_ms: Option<u64>, json: bool) -> eyre::Result<()> {
    let clock = MonotonicClock::new();
    let store = open_store(&cfg.storage, true)?;
    let (ev_tx, ev_rx) = crossbeam_channel::unbounded();
    let mut asm = assemble(cfg, Backend::live(), &store, &ev_tx, &clock)?;
    drop(ev_tx);

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let flag = Arc::clone(&shutdown);
        ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed))
            .wrap_err("install Ctrl-C handler")?;
    }
    if let Some(ms) = duration_ms {
        let flag = Arc::clone(&shutdown);
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(ms));
            flag.store(true, Ordering::Relaxed);
        });
    }

    let (cmd_tx, cmd_rx) = command_channel();
    let names = asm.names.clone();
    // Detached: a blocked stdin read must not hold up shutdown.
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            match parse_line(&line, &names) {
                Ok(Some(cmd)) => {
                    if cmd_tx.send(cmd).is_err() {
                        break;
                    }
                }
                Ok(None) => {}
                Err(e) => eprintln!("error: {e}"),
            }
        }
        tracing::debug!("stdin closed");
    });

    let printer = std::thread::spawn(move || {
        for ev in ev_rx.iter() {
            println!("{}", render(&ev, json));
        }
    });

    let params = RunParams {
        tick_ms: tick_ms.unwrap_or(cfg.runner.tick_ms),
    };
    let result = runner::run(&mut asm.fleet, &clock, params, &cmd_rx, &shutdown);
    // Dropping the fleet drops every sink and so closes the event channel.
    drop(asm);
    if printer.join().is_err() {
        tracing::warn!("event printer panicked");
    }
    result.wrap_err("stop all actuators on shutdown")
}

pub fn self_check(cfg: &Config, json: bool) -> eyre::Result<()> {
    let clock = MonotonicClock::new();
    let store = open_store(&cfg.storage, true)?;
    let (ev_tx, _ev_rx) = crossbeam_channel::unbounded();
    let asm = assemble(cfg, Backend::live(), &store, &ev_tx, &clock)?;
    let covers = asm.fleet.actuators().len();
    let valves = asm.fleet.valves().len();
    if json {
        println!("{}", json!({ "ok": true, "covers": covers, "valves": valves }));
    } else {
        println!("ok: {covers} cover(s), {valves} valve(s)");
    }
    Ok(())
}
