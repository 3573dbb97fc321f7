//! Simulated outputs that only log level changes.

use reckon_traits::{DriveOutputs, SwitchOutput};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Simulated pair of drive lines.
#[derive(Debug, Default)]
pub struct SimulatedDrive {
    name: String,
    forward: bool,
    reverse: bool,
}

impl SimulatedDrive {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// `(forward, reverse)` line levels.
    pub fn levels(&self) -> (bool, bool) {
        (self.forward, self.reverse)
    }
}

impl DriveOutputs for SimulatedDrive {
    fn set_forward(&mut self, on: bool) -> Result<(), BoxError> {
        if self.forward != on {
            tracing::debug!(device = %self.name, on, "forward line (simulated)");
        }
        self.forward = on;
        Ok(())
    }

    fn set_reverse(&mut self, on: bool) -> Result<(), BoxError> {
        if self.reverse != on {
            tracing::debug!(device = %self.name, on, "reverse line (simulated)");
        }
        self.reverse = on;
        Ok(())
    }
}

/// Simulated single output, e.g. a valve coil.
#[derive(Debug, Default)]
pub struct SimulatedSwitch {
    name: String,
    on: bool,
}

impl SimulatedSwitch {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            on: false,
        }
    }

    pub fn is_on(&self) -> bool {
        self.on
    }
}

impl SwitchOutput for SimulatedSwitch {
    fn set(&mut self, on: bool) -> Result<(), BoxError> {
        if self.on != on {
            tracing::debug!(device = %self.name, on, "switch output (simulated)");
        }
        self.on = on;
        Ok(())
    }
}
