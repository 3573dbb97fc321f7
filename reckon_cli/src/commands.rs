//! Text commands (stdin lines and script rows) mapped onto fleet `Command`s.
//!
//! Line syntax:
//! - `open-all` | `close-all` | `stop-all`
//! - `<device> open|close|stop`
//! - `<device> target|tilt|position <0..=100>`
//!
//! Blank lines and lines starting with `#` are ignored.

use std::collections::HashMap;

use reckon_config::ScriptCommand;
use reckon_core::{Command, DeviceId, ReckonError};

use crate::fleet::lookup;

fn state_error(msg: String) -> eyre::Report {
    eyre::Report::new(ReckonError::State(msg))
}

pub fn verb(s: &str) -> Option<ScriptCommand> {
    match s.to_ascii_lowercase().as_str() {
        "target" => Some(ScriptCommand::Target),
        "tilt" => Some(ScriptCommand::Tilt),
        "position" => Some(ScriptCommand::Position),
        "open" => Some(ScriptCommand::Open),
        "close" => Some(ScriptCommand::Close),
        "stop" => Some(ScriptCommand::Stop),
        _ => None,
    }
}

pub fn to_command(id: DeviceId, cmd: ScriptCommand, value: Option<u8>) -> eyre::Result<Command> {
    if let Some(v) = value
        && v > 100
    {
        eyre::bail!("percent must be in 0..=100, got {v}");
    }
    let percent = || value.ok_or_else(|| eyre::eyre!("{cmd:?} needs a percent value"));
    Ok(match (id, cmd) {
        (_, ScriptCommand::Open) => Command::Open(id),
        (_, ScriptCommand::Close) => Command::Close(id),
        (DeviceId::Actuator(actuator), ScriptCommand::Target) => Command::Target {
            actuator,
            percent: percent()?,
        },
        (DeviceId::Actuator(actuator), ScriptCommand::Tilt) => Command::Tilt {
            actuator,
            percent: percent()?,
        },
        (DeviceId::Actuator(actuator), ScriptCommand::Position) => Command::Position {
            actuator,
            percent: percent()?,
        },
        (DeviceId::Actuator(actuator), ScriptCommand::Stop) => Command::Stop(actuator),
        (DeviceId::Valve(_), other) => {
            return Err(state_error(format!(
                "valves only support open and close, not {other:?}"
            )));
        }
    })
}

pub fn parse_line(line: &str, names: &HashMap<String, DeviceId>) -> eyre::Result<Option<Command>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let mut words = line.split_whitespace();
    let first = words.next().unwrap_or_default();
    let cmd = match first.to_ascii_lowercase().as_str() {
        "open-all" => Some(Command::OpenAll),
        "close-all" => Some(Command::CloseAll),
        "stop-all" => Some(Command::StopAll),
        _ => None,
    };
    if let Some(cmd) = cmd {
        if words.next().is_some() {
            eyre::bail!("{first} takes no arguments");
        }
        return Ok(Some(cmd));
    }

    let id = lookup(names, first)?;
    let Some(verb_word) = words.next() else {
        eyre::bail!("missing command after {first:?}");
    };
    let Some(cmd) = verb(verb_word) else {
        eyre::bail!("unknown command {verb_word:?}");
    };
    let value = match words.next() {
        Some(v) => Some(
            v.parse::<u8>()
                .map_err(|_| eyre::eyre!("invalid percent {v:?}"))?,
        ),
        None => None,
    };
    if words.next().is_some() {
        eyre::bail!("too many arguments in {line:?}");
    }
    to_command(id, cmd, value).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn names() -> HashMap<String, DeviceId> {
        HashMap::from([
            ("living".to_string(), DeviceId::Actuator(0)),
            ("garden".to_string(), DeviceId::Valve(0)),
        ])
    }

    #[rstest]
    #[case("living target 40", Command::Target { actuator: 0, percent: 40 })]
    #[case("  living TILT 100 ", Command::Tilt { actuator: 0, percent: 100 })]
    #[case("living position 0", Command::Position { actuator: 0, percent: 0 })]
    #[case("living stop", Command::Stop(0))]
    #[case("garden close", Command::Close(DeviceId::Valve(0)))]
    #[case("living open", Command::Open(DeviceId::Actuator(0)))]
    #[case("stop-all", Command::StopAll)]
    #[case("CLOSE-ALL", Command::CloseAll)]
    fn parses_valid_lines(#[case] line: &str, #[case] want: Command) {
        assert_eq!(parse_line(line, &names()).unwrap(), Some(want));
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("# living close")]
    fn ignores_blank_and_comments(#[case] line: &str) {
        assert_eq!(parse_line(line, &names()).unwrap(), None);
    }

    #[rstest]
    #[case("kitchen open", "unknown device")]
    #[case("living", "missing command")]
    #[case("living wiggle", "unknown command")]
    #[case("living target", "needs a percent")]
    #[case("living target 101", "0..=100")]
    #[case("living target abc", "invalid percent")]
    #[case("living target 5 6", "too many")]
    #[case("garden stop", "valves only support")]
    #[case("stop-all now", "takes no arguments")]
    fn rejects_invalid_lines(#[case] line: &str, #[case] needle: &str) {
        let err = parse_line(line, &names()).unwrap_err();
        assert!(err.to_string().contains(needle), "{line:?} -> {err}");
    }

    #[test]
    fn unknown_device_is_a_state_error() {
        let err = parse_line("attic open", &names()).unwrap_err();
        assert!(matches!(err.downcast_ref::<ReckonError>(), Some(ReckonError::State(_))));
    }
}
