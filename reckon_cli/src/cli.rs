//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "reckon", version, about = "Dead-reckoning cover and valve controller")]
pub struct Cli {
    /// Path to config TOML (typed)
    #[arg(long, value_name = "FILE", default_value = "etc/reckon.toml")]
    pub config: PathBuf,

    /// Log and print as JSON lines instead of text
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "warn")]
    pub log_level: String,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Drive one device on a simulated clock and print what happened
    Simulate {
        /// Device name from the config
        #[arg(long)]
        device: String,
        /// Primary target in percent (0 = open, 100 = closed)
        #[arg(long, value_name = "PERCENT", value_parser = clap::value_parser!(u8).range(0..=100))]
        target: Option<u8>,
        /// Tilt target in percent
        #[arg(long, value_name = "PERCENT", value_parser = clap::value_parser!(u8).range(0..=100))]
        tilt: Option<u8>,
        /// Position command with inferred tilt
        #[arg(long, value_name = "PERCENT", value_parser = clap::value_parser!(u8).range(0..=100), conflicts_with = "target")]
        position: Option<u8>,
        /// Fully open
        #[arg(long, action = ArgAction::SetTrue, conflicts_with_all = ["close", "target", "position"])]
        open: bool,
        /// Fully close
        #[arg(long, action = ArgAction::SetTrue, conflicts_with_all = ["target", "position"])]
        close: bool,
        /// Give up after this much simulated time
        #[arg(long, value_name = "MS", default_value_t = 600_000)]
        max_ms: u32,
    },
    /// Replay a command script (CSV: at_ms,device,command,value) on a simulated clock
    Script {
        /// Script CSV (strict header)
        #[arg(value_name = "FILE")]
        path: PathBuf,
        /// Simulated time allowed for motion after the last row
        #[arg(long, value_name = "MS", default_value_t = 600_000)]
        max_ms: u32,
    },
    /// Real-time control loop; reads commands from stdin, Ctrl-C stops everything
    Run {
        /// Override runner.tick_ms
        #[arg(long, value_name = "MS", value_parser = clap::value_parser!(u32).range(1..=1000))]
        tick_ms: Option<u32>,
        /// Stop everything and exit after this long
        #[arg(long, value_name = "MS")]
        duration_ms: Option<u64>,
    },
    /// Validate the config and build every device
    SelfCheck,
}
