use reckon_core::mocks::{RecordingSink, RecordingSwitch};
use reckon_core::{MotionStatus, Valve, ValveCfg, ValveStart, ValveState};
use reckon_traits::CoverState;

fn valve(initial: ValveStart) -> (Valve<RecordingSwitch>, RecordingSwitch, RecordingSink) {
    let out = RecordingSwitch::new();
    let sink = RecordingSink::new();
    let v = Valve::new(
        out.clone(),
        ValveCfg {
            travel_ms: 120_000,
            initial,
        },
    )
    .unwrap()
    .with_sink(Box::new(sink.clone()));
    (v, out, sink)
}

#[test]
fn starts_in_configured_state() {
    let (v, out, _) = valve(ValveStart::Open);
    assert_eq!(v.state(), ValveState::Open);
    assert_eq!(out.level(), Some(false));

    let (v, out, _) = valve(ValveStart::Closed);
    assert_eq!(v.state(), ValveState::Closed);
    assert_eq!(out.level(), Some(true));
}

#[test]
fn close_takes_full_travel() {
    let (mut v, out, sink) = valve(ValveStart::Open);
    v.close(1_000).unwrap();
    assert_eq!(v.state(), ValveState::Closing);
    assert_eq!(out.level(), Some(true));
    assert_eq!(v.tick(120_999).unwrap(), MotionStatus::Running);
    assert_eq!(v.tick(121_000).unwrap(), MotionStatus::Settled);
    assert_eq!(v.state(), ValveState::Closed);
    let last = sink.last().unwrap();
    assert_eq!((last.state, last.position), (CoverState::Closed, 100));
}

#[test]
fn reversal_finishes_after_elapsed_time() {
    let (mut v, out, _) = valve(ValveStart::Open);
    v.close(0).unwrap();
    v.tick(40_000).unwrap();
    v.open(40_000).unwrap();
    assert_eq!(v.state(), ValveState::Opening);
    assert_eq!(out.level(), Some(false));

    assert_eq!(v.tick(79_999).unwrap(), MotionStatus::Running);
    assert_eq!(v.tick(80_000).unwrap(), MotionStatus::Settled);
    assert_eq!(v.state(), ValveState::Open);
}

#[test]
fn repeated_commands_are_no_ops() {
    let (mut v, out, sink) = valve(ValveStart::Open);
    v.open(0).unwrap();
    assert_eq!(out.history().len(), 1);
    assert!(sink.reports().is_empty());

    v.close(0).unwrap();
    v.close(5_000).unwrap();
    assert_eq!(out.history().len(), 2);
    assert_eq!(v.tick(120_000).unwrap(), MotionStatus::Settled);
}

#[test]
fn deadline_survives_counter_wrap() {
    let (mut v, _, _) = valve(ValveStart::Open);
    let start = u32::MAX - 10;
    v.close(start).unwrap();
    let finish = start.wrapping_add(120_000);
    assert_eq!(v.tick(finish - 1).unwrap(), MotionStatus::Running);
    assert_eq!(v.tick(finish).unwrap(), MotionStatus::Settled);
}

#[test]
fn zero_travel_is_rejected() {
    let res = Valve::new(
        RecordingSwitch::new(),
        ValveCfg {
            travel_ms: 0,
            initial: ValveStart::Open,
        },
    );
    assert!(res.is_err());
}
