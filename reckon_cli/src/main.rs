mod cli;
mod commands;
mod error_fmt;
mod events;
mod fleet;
mod live;
mod logging;
mod sim;

use std::path::Path;

use clap::Parser;
use eyre::WrapErr;
use reckon_core::ReckonError;

use crate::cli::{Cli, Commands, JSON_MODE};
use crate::error_fmt::{exit_code_for_error, format_error_json, humanize};

fn config_error(msg: String) -> eyre::Report {
    eyre::Report::new(ReckonError::Config(msg))
}

fn load_config(path: &Path) -> eyre::Result<reckon_config::Config> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| config_error(format!("read {}: {e}", path.display())))?;
    let cfg = reckon_config::load_toml(&text)
        .map_err(|e| config_error(format!("parse {}: {e}", path.display())))?;
    cfg.validate()
        .map_err(|e| config_error(format!("{}: {e}", path.display())))?;
    Ok(cfg)
}

fn real_main(cli: Cli) -> eyre::Result<()> {
    let cfg = load_config(&cli.config)?;
    logging::init_tracing(cli.json, &cli.log_level, &cfg.logging)?;
    tracing::info!(config = %cli.config.display(), covers = cfg.covers.len(), valves = cfg.valves.len(), "config loaded");

    match cli.cmd {
        Commands::Simulate {
            device,
            target,
            tilt,
            position,
            open,
            close,
            max_ms,
        } => {
            let actions = sim::Actions {
                target,
                tilt,
                position,
                open,
                close,
            };
            sim::simulate(&cfg, &device, actions, max_ms, cli.json)
        }
        Commands::Script { path, max_ms } => {
            let rows = reckon_config::load_script_csv(&path)
                .map_err(|e| config_error(format!("{e:#}")))
                .wrap_err_with(|| format!("load script {}", path.display()))?;
            sim::replay_script(&cfg, &rows, max_ms, cli.json)
        }
        Commands::Run {
            tick_ms,
            duration_ms,
        } => live::run(&cfg, tick_ms, duration_ms, cli.json),
        Commands::SelfCheck => live::self_check(&cfg, cli.json),
    }
}

fn main() {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);
    if let Err(e) = color_eyre::install() {
        eprintln!("warning: color-eyre not installed: {e}");
    }

    if let Err(e) = real_main(cli) {
        if JSON_MODE.get().copied().unwrap_or(false) {
            eprintln!("{}", format_error_json(&e));
        } else {
            eprintln!("{}", humanize(&e));
        }
        std::process::exit(exit_code_for_error(&e));
    }
}
