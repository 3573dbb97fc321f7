//! Raspberry Pi GPIO outputs via `rppal`.

use rppal::gpio::{Gpio, OutputPin};
use reckon_traits::{DriveOutputs, SwitchOutput};

use crate::error::HwError;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

fn output_low(gpio: &Gpio, pin: u8) -> Result<OutputPin, HwError> {
    gpio.get(pin)
        .map(|p| p.into_output_low())
        .map_err(|e| HwError::Gpio(format!("pin {pin}: {e}")))
}

fn write(pin: &mut OutputPin, on: bool) {
    if on {
        pin.set_high();
    } else {
        pin.set_low();
    }
}

/// Forward and reverse relays of a reversible motor. Both start low.
pub struct GpioDrive {
    forward: OutputPin,
    reverse: OutputPin,
}

impl GpioDrive {
    pub fn new(forward_pin: u8, reverse_pin: u8) -> Result<Self, HwError> {
        let gpio = Gpio::new().map_err(|e| HwError::Gpio(e.to_string()))?;
        let forward = output_low(&gpio, forward_pin)?;
        let reverse = output_low(&gpio, reverse_pin)?;
        tracing::info!(forward_pin, reverse_pin, "gpio drive ready");
        Ok(Self { forward, reverse })
    }
}

impl DriveOutputs for GpioDrive {
    fn set_forward(&mut self, on: bool) -> Result<(), BoxError> {
        if on && self.reverse.is_set_high() {
            return Err(HwError::Gpio("refusing forward while reverse is high".into()).into());
        }
        write(&mut self.forward, on);
        Ok(())
    }

    fn set_reverse(&mut self, on: bool) -> Result<(), BoxError> {
        if on && self.forward.is_set_high() {
            return Err(HwError::Gpio("refusing reverse while forward is high".into()).into());
        }
        write(&mut self.reverse, on);
        Ok(())
    }
}

/// Single relay output.
pub struct GpioSwitch {
    pin: OutputPin,
}

impl GpioSwitch {
    pub fn new(pin: u8) -> Result<Self, HwError> {
        let gpio = Gpio::new().map_err(|e| HwError::Gpio(e.to_string()))?;
        let pin = output_low(&gpio, pin)?;
        Ok(Self { pin })
    }
}

impl SwitchOutput for GpioSwitch {
    fn set(&mut self, on: bool) -> Result<(), BoxError> {
        write(&mut self.pin, on);
        Ok(())
    }
}
