//! Human-readable error descriptions, exit codes and structured JSON errors.

use reckon_core::{BuildError, ReckonError};
use serde_json::json;

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingDrive => {
                "What happened: No drive outputs were provided for a cover.\nLikely causes: The motor pins failed to open or were not wired into the builder.\nHow to fix: Check forward_pin/reverse_pin for the cover and make sure the process can access GPIO.".to_string()
            }
            BuildError::MissingTravel => {
                "What happened: Full travel time not set for a cover.\nLikely causes: full_travel_ms is missing from the [[cover]] table.\nHow to fix: Time one full open-to-close run and set full_travel_ms to it.".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun. See etc/reckon.toml for a sample."
            ),
        };
    }

    if let Some(re) = err.downcast_ref::<ReckonError>() {
        let context = context_line(err);
        return match re {
            ReckonError::Config(msg) => format!(
                "What happened: Configuration is invalid ({msg}).{context}\nLikely causes: A typo, a missing field or an out-of-range value in the TOML or script.\nHow to fix: Edit the file named above and run `reckon self-check`."
            ),
            ReckonError::Hardware(msg) => format!(
                "What happened: An output or the position store failed ({msg}).{context}\nLikely causes: GPIO lines in use by another process, or an unwritable storage path.\nHow to fix: Check the [[cover]]/[[valve]] pins and storage.path, then rerun."
            ),
            ReckonError::HardwareFault(msg) => format!(
                "What happened: Hardware fault ({msg}).{context}\nLikely causes: Wrong pin numbers, missing GPIO permissions or a wiring problem.\nHow to fix: Fix the pins in the config and make sure the process may access /dev/gpiomem."
            ),
            ReckonError::State(msg) => format!(
                "What happened: {msg}.{context}\nLikely causes: A device name that is not in the config, or a command the device does not support.\nHow to fix: Use a name from the config; valves take only open and close."
            ),
        };
    }

    // Generic fallback
    let msg = err.to_string();
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Error: {msg}"
    )
}

/// The outermost context when it differs from the typed error itself.
fn context_line(err: &eyre::Report) -> String {
    let mut chain = err.chain();
    match (chain.next(), chain.next()) {
        (Some(outer), Some(_)) => format!("\nWhile: {outer}."),
        _ => String::new(),
    }
}

/// Stable exit codes: 3 config, 4 hardware, 5 device state, 1 anything else.
/// Usage errors exit with 2 from clap before we get here.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if err.downcast_ref::<BuildError>().is_some() {
        return 3;
    }
    match err.downcast_ref::<ReckonError>() {
        Some(ReckonError::Config(_)) => 3,
        Some(ReckonError::Hardware(_) | ReckonError::HardwareFault(_)) => 4,
        Some(ReckonError::State(_)) => 5,
        None => 1,
    }
}

fn reason_name(err: &eyre::Report) -> &'static str {
    if err.downcast_ref::<BuildError>().is_some() {
        return "Build";
    }
    match err.downcast_ref::<ReckonError>() {
        Some(ReckonError::Config(_)) => "Config",
        Some(ReckonError::Hardware(_)) => "Hardware",
        Some(ReckonError::HardwareFault(_)) => "HardwareFault",
        Some(ReckonError::State(_)) => "State",
        None => "Error",
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    json!({
        "reason": reason_name(err),
        "exit_code": exit_code_for_error(err),
        "message": humanize(err),
    })
    .to_string()
}
