use reckon_config::{ValveInitial, load_toml};
use rstest::rstest;

const BASE: &str = r#"
[timing]
calibration_ms = 1000
safety_delay_ms = 250

[[cover]]
name = "living"
forward_pin = 17
reverse_pin = 27
full_travel_ms = 30000
full_tilt_travel_ms = 1500
position_slot = 0
tilt_slot = 1

[[valve]]
name = "garden"
pin = 22
"#;

#[test]
fn accepts_minimal_config_with_defaults() {
    let cfg = load_toml(BASE).expect("parse TOML");
    cfg.validate().expect("valid config should pass");
    assert_eq!(cfg.runner.tick_ms, 10);
    assert_eq!(cfg.storage.slots_per_key, 10);
    assert_eq!(cfg.valves[0].travel_ms, 120_000);
    assert_eq!(cfg.valves[0].initial, ValveInitial::Open);
    assert_eq!(cfg.covers[0].calibration_ms, None);
}

#[test]
fn defaults_apply_without_timing_table() {
    let toml = r#"
[[cover]]
name = "motor"
forward_pin = 5
reverse_pin = 6
full_travel_ms = 8000
"#;
    let cfg = load_toml(toml).expect("parse TOML");
    cfg.validate().expect("valid");
    assert_eq!(cfg.timing.calibration_ms, 1000);
    assert_eq!(cfg.timing.safety_delay_ms, 250);
    assert_eq!(cfg.covers[0].full_tilt_travel_ms, 0);
}

#[rstest]
#[case("full_travel_ms = 30000", "full_travel_ms = 0", "full_travel_ms must be > 0")]
#[case("reverse_pin = 27", "reverse_pin = 17", "must differ")]
#[case("pin = 22", "pin = 27", "used more than once")]
#[case("tilt_slot = 1", "tilt_slot = 0", "slot 0 is used more than once")]
#[case("tilt_slot = 1", "tilt_slot = 9999", "does not fit")]
#[case("name = \"garden\"", "name = \"living\"", "duplicate device name")]
#[case("safety_delay_ms = 250", "safety_delay_ms = 60000", "safety_delay_ms must be <= 10000")]
#[case("full_tilt_travel_ms = 1500", "full_tilt_travel_ms = 0", "tilt_slot requires")]
fn rejects_invalid_values(#[case] from: &str, #[case] to: &str, #[case] needle: &str) {
    let toml = BASE.replacen(from, to, 1);
    let cfg = load_toml(&toml).expect("parse TOML");
    let err = cfg.validate().expect_err("should reject");
    assert!(
        err.to_string().contains(needle),
        "expected {needle:?} in {err}"
    );
}

#[test]
fn rejects_empty_device_list() {
    let cfg = load_toml("[timing]\ncalibration_ms = 500\n").expect("parse TOML");
    let err = cfg.validate().expect_err("no devices");
    assert!(err.to_string().contains("at least one"));
}

#[test]
fn rejects_unknown_rotation() {
    let toml = format!("{BASE}\n[logging]\nrotation = \"weekly\"\n");
    let cfg = load_toml(&toml).expect("parse TOML");
    assert!(cfg.validate().is_err());
}

#[test]
fn rejects_bad_tick_period() {
    let toml = format!("{BASE}\n[runner]\ntick_ms = 0\n");
    let cfg = load_toml(&toml).expect("parse TOML");
    let err = cfg.validate().expect_err("tick_ms=0");
    assert!(err.to_string().contains("runner.tick_ms"));
}

#[test]
fn missing_required_cover_field_is_a_parse_error() {
    let toml = r#"
[[cover]]
name = "x"
forward_pin = 1
full_travel_ms = 100
"#;
    assert!(load_toml(toml).is_err());
}
