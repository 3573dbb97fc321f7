use reckon_core::mocks::{RecordingDrive, RecordingSwitch};
use reckon_core::runner::run_until_idle;
use reckon_core::{
    Command, DeviceId, DynActuator, DynValve, Fleet, RunParams, SlotCfg, TimingCfg, TravelCfg,
    Valve, ValveCfg, ValveState,
};
use reckon_traits::{Clock, ManualClock, SwitchOutput};

const CONFIG: &str = r#"
[timing]
calibration_ms = 500
safety_delay_ms = 100

[[cover]]
name = "living"
forward_pin = 17
reverse_pin = 27
full_travel_ms = 4000
full_tilt_travel_ms = 400
position_slot = 0
tilt_slot = 1

[[cover]]
name = "garage"
forward_pin = 5
reverse_pin = 6
full_travel_ms = 2000
safety_delay_ms = 0

[[valve]]
name = "garden"
pin = 22
travel_ms = 3000
"#;

fn fleet_from_config() -> (Fleet, Vec<RecordingDrive>, RecordingSwitch) {
    let cfg = toml::from_str::<reckon_config::Config>(CONFIG).unwrap();
    cfg.validate().unwrap();

    let mut fleet = Fleet::new();
    let mut drives = Vec::new();
    for cover in &cfg.covers {
        let drive = RecordingDrive::new();
        drives.push(drive.clone());
        let act = DynActuator::builder()
            .with_drive(drive)
            .with_travel(TravelCfg::from(cover))
            .with_timing(TimingCfg::for_cover(&cfg.timing, cover))
            .with_slots(SlotCfg::from(cover))
            .build()
            .unwrap();
        fleet.add_actuator(act);
    }
    let switch = RecordingSwitch::new();
    let valve: DynValve = Valve::new(
        Box::new(switch.clone()) as Box<dyn SwitchOutput + Send>,
        ValveCfg::from(&cfg.valves[0]),
    )
    .unwrap();
    fleet.add_valve(valve);
    (fleet, drives, switch)
}

#[test]
fn per_cover_overrides_apply() {
    let cfg = toml::from_str::<reckon_config::Config>(CONFIG).unwrap();
    let living = TimingCfg::for_cover(&cfg.timing, &cfg.covers[0]);
    let garage = TimingCfg::for_cover(&cfg.timing, &cfg.covers[1]);
    assert_eq!((living.calibration_ms, living.safety_delay_ms), (500, 100));
    assert_eq!((garage.calibration_ms, garage.safety_delay_ms), (500, 0));
}

#[test]
fn close_all_settles_every_device() {
    let (mut fleet, drives, switch) = fleet_from_config();
    let clock = ManualClock::new();
    fleet.apply(Command::CloseAll, clock.now_ms()).unwrap();
    assert_eq!(switch.level(), Some(true));

    let elapsed = run_until_idle(&mut fleet, &clock, RunParams::default(), 60_000);
    assert!(!fleet.any_moving());
    // the longest cover: 4000 ms travel plus 500 ms overrun
    assert!((4_500..=4_510).contains(&elapsed), "elapsed={elapsed}");
    for a in fleet.actuators() {
        assert_eq!(a.current_percent(), 100);
    }
    assert_eq!(fleet.valves()[0].state(), ValveState::Closed);
    for d in &drives {
        assert_eq!(d.levels(), (false, false));
        assert!(!d.snapshot().overlap_seen);
    }
}

#[test]
fn stop_all_halts_actuators_mid_travel() {
    let (mut fleet, _drives, _switch) = fleet_from_config();
    fleet.apply(Command::Close(DeviceId::Actuator(0)), 0).unwrap();
    fleet.apply(Command::Target { actuator: 1, percent: 100 }, 0).unwrap();
    for t in (0..=1_000).step_by(10) {
        assert_eq!(fleet.tick_all(t), 0);
    }
    fleet.apply(Command::StopAll, 1_000).unwrap();
    assert!(!fleet.any_moving());
    assert_eq!(fleet.actuators()[0].current_percent(), 25);
    assert_eq!(fleet.actuators()[1].current_percent(), 50);
}

#[test]
fn failing_device_does_not_halt_the_rest() {
    let (mut fleet, drives, _switch) = fleet_from_config();
    drives[0].set_failing(true);
    fleet.apply(Command::OpenAll, 0).unwrap();
    fleet.apply(Command::Close(DeviceId::Actuator(0)), 0).unwrap();
    fleet.apply(Command::Close(DeviceId::Actuator(1)), 0).unwrap();

    assert_eq!(fleet.tick_all(0), 1);
    for t in (10..=2_500).step_by(10) {
        fleet.tick_all(t);
    }
    assert_eq!(fleet.actuators()[1].current_percent(), 100);
    assert!(!fleet.actuators()[1].is_moving());
}

#[test]
fn position_command_goes_through_the_coupler() {
    let (mut fleet, _drives, _switch) = fleet_from_config();
    fleet.apply(Command::Position { actuator: 0, percent: 60 }, 0).unwrap();
    assert_eq!(fleet.actuators()[0].target_tilt_percent(), Some(0));
    fleet.apply(Command::Tilt { actuator: 0, percent: 80 }, 0).unwrap();
    assert_eq!(fleet.actuators()[0].target_tilt_percent(), Some(80));
}
