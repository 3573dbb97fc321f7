#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss
)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Dead-reckoning actuator control (hardware-agnostic).
//!
//! Actuators without position feedback are positioned purely from elapsed
//! drive time. All hardware interactions go through the `reckon_traits`
//! traits (`DriveOutputs`, `SwitchOutput`, `PositionStore`, `StatusSink`).
//!
//! ## Architecture
//!
//! - **Position model**: milliseconds of travel per axis, percent mapping (`position`)
//! - **Integrator**: advances positions from wrapping ms timestamps (`integrator`)
//! - **Calibration guard**: end-stop overrun to cancel drift (`calibration`)
//! - **Reversal handling**: continuity across direction changes (`reversal`)
//! - **Safety gate**: released dwell between stops and engagements (`safety`)
//! - **State machine**: `Actuator::tick` (`actuator`), tilt coupling (`coupler`)
//! - **Valve**: single-output timed valve (`valve`)
//! - **Orchestration**: `Fleet`, command channel and control loop (`runner`)
//!
//! Timestamps are `u32` milliseconds compared with wrapping subtraction, so
//! control keeps working across the ~49.7 day counter wrap.

pub mod actuator;
pub mod builder;
pub mod buttons;
pub mod calibration;
pub mod config;
pub mod conversions;
pub mod coupler;
pub mod error;
pub mod hw_error;
pub mod integrator;
pub mod mocks;
pub mod position;
pub mod reversal;
pub mod runner;
pub mod safety;
pub mod status;
pub mod valve;

pub use actuator::Actuator;
pub use builder::{ActuatorBuilder, DynActuator, DynDrive, build_actuator};
pub use buttons::ButtonEvent;
pub use config::{SlotCfg, TimingCfg, TravelCfg, ValveCfg, ValveStart};
pub use error::{BuildError, ReckonError, Result};
pub use integrator::Direction;
pub use runner::{Command, DeviceId, DynValve, Fleet, RunParams, command_channel};
pub use status::{MotionState, MotionStatus};
pub use valve::{Valve, ValveState};
