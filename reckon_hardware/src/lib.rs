//! Output drivers and persistence backends for `reckon_core`.
//!
//! Simulated outputs are always available; `rppal` GPIO outputs need the
//! `hardware` feature.

pub mod atomic;
pub mod error;
#[cfg(feature = "hardware")]
pub mod gpio;
pub mod sim;
pub mod store;

#[cfg(feature = "hardware")]
pub use gpio::{GpioDrive, GpioSwitch};
pub use sim::{SimulatedDrive, SimulatedSwitch};
pub use store::WearLevelStore;
