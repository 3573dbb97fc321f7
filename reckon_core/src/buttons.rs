//! Mapping of debounced push-button events onto actuator commands.

use reckon_traits::DriveOutputs;

use crate::actuator::Actuator;
use crate::error::Result;
use crate::integrator::Direction;

/// Event delivered by an (external) debounced button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonEvent {
    Clicked,
    Pressed,
    Released,
    LongPressed,
}

impl<D: DriveOutputs> Actuator<D> {
    /// Click toggles stop/open; hold opens until release.
    pub fn on_open_button(&mut self, event: ButtonEvent, now: u32) -> Result<()> {
        self.on_button(event, Direction::Reverse, now)
    }

    /// Click toggles stop/close; hold closes until release.
    pub fn on_close_button(&mut self, event: ButtonEvent, now: u32) -> Result<()> {
        self.on_button(event, Direction::Forward, now)
    }

    fn on_button(&mut self, event: ButtonEvent, toward: Direction, now: u32) -> Result<()> {
        match event {
            ButtonEvent::Clicked if self.is_moving() => self.stop(now),
            ButtonEvent::Clicked => {
                self.command_full(toward);
                Ok(())
            }
            ButtonEvent::Pressed => {
                if self.direction() == Some(toward.opposite()) {
                    self.stop(now)?;
                }
                self.command_full(toward);
                Ok(())
            }
            ButtonEvent::Released => self.stop(now),
            ButtonEvent::LongPressed => Ok(()),
        }
    }

    fn command_full(&mut self, toward: Direction) {
        match toward {
            Direction::Forward => self.close(),
            Direction::Reverse => self.open(),
        }
    }
}
