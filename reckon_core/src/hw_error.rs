//! Maps `Box<dyn Error>` from trait boundaries to typed `ReckonError`.
//!
//! The traits in `reckon_traits` use `Box<dyn Error + Send + Sync>` so any
//! output driver can plug in; this module converts those to our typed error
//! enum, with an optional feature-gated path for `reckon_hardware::HwError`.

use crate::error::ReckonError;

/// Map a trait-boundary error to a typed `ReckonError`.
///
/// Attempts to downcast known hardware error types first, then falls back
/// to a plain hardware error carrying the message.
pub fn map_hw_error(e: &(dyn std::error::Error + 'static)) -> ReckonError {
    #[cfg(feature = "hardware-errors")]
    {
        if let Some(hw) = e.downcast_ref::<reckon_hardware::error::HwError>() {
            return match hw {
                reckon_hardware::error::HwError::Gpio(msg) => ReckonError::HardwareFault(msg.clone()),
                other => ReckonError::Hardware(other.to_string()),
            };
        }
    }

    ReckonError::Hardware(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_errors_keep_their_message() {
        let e = std::io::Error::other("line 17 busy");
        match map_hw_error(&e) {
            ReckonError::Hardware(msg) => assert!(msg.contains("line 17 busy")),
            other => panic!("unexpected mapping: {other:?}"),
        }
    }

    #[cfg(feature = "hardware-errors")]
    #[test]
    fn gpio_errors_become_faults() {
        let e = reckon_hardware::error::HwError::Gpio("pin 5 unavailable".into());
        assert!(matches!(map_hw_error(&e), ReckonError::HardwareFault(_)));
    }
}
