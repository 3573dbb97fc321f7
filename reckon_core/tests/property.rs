use proptest::prelude::*;
use reckon_core::mocks::RecordingDrive;
use reckon_core::{ButtonEvent, DynActuator, TimingCfg, TravelCfg};

#[derive(Debug, Clone)]
enum Op {
    Target(u8),
    Tilt(u8),
    Position(u8),
    Open,
    Close,
    Stop,
    OpenButton(ButtonEvent),
    CloseButton(ButtonEvent),
    Advance(u32),
}

fn button() -> impl Strategy<Value = ButtonEvent> {
    prop_oneof![
        Just(ButtonEvent::Clicked),
        Just(ButtonEvent::Pressed),
        Just(ButtonEvent::Released),
        Just(ButtonEvent::LongPressed),
    ]
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u8..=120).prop_map(Op::Target),
        (0u8..=120).prop_map(Op::Tilt),
        (0u8..=100).prop_map(Op::Position),
        Just(Op::Open),
        Just(Op::Close),
        Just(Op::Stop),
        button().prop_map(Op::OpenButton),
        button().prop_map(Op::CloseButton),
        (1u32..3_000).prop_map(Op::Advance),
    ]
}

proptest! {
    #[test]
    fn outputs_never_overlap_and_rest_stays_in_bounds(
        ops in prop::collection::vec(op(), 1..60),
        start in any::<u32>(),
        delay in 0u32..400,
        tilt_ms in prop_oneof![Just(0u32), 200u32..2_000],
    ) {
        let drive = RecordingDrive::new();
        let mut act = DynActuator::builder()
            .with_drive(drive.clone())
            .with_travel(TravelCfg { full_travel_ms: 5_000, full_tilt_travel_ms: tilt_ms })
            .with_timing(TimingCfg { calibration_ms: 500, safety_delay_ms: delay })
            .build()
            .unwrap();

        let mut now = start;
        for op in ops {
            match op {
                Op::Target(p) => act.set_target_percent(p),
                Op::Tilt(p) => act.set_target_tilt_percent(p),
                Op::Position(p) => act.command_position(p),
                Op::Open => act.open(),
                Op::Close => act.close(),
                Op::Stop => act.stop(now).unwrap(),
                Op::OpenButton(e) => act.on_open_button(e, now).unwrap(),
                Op::CloseButton(e) => act.on_close_button(e, now).unwrap(),
                Op::Advance(ms) => {
                    let mut done = 0;
                    while done < ms {
                        let step = (ms - done).min(10);
                        done += step;
                        now = now.wrapping_add(step);
                        act.tick(now).unwrap();
                        let (f, r) = drive.levels();
                        prop_assert!(!(f && r), "both outputs high at {now}");
                    }
                }
            }
            let (f, r) = drive.levels();
            prop_assert!(!(f && r));
            prop_assert!(act.current_percent() <= 100);
            if !act.is_moving() {
                prop_assert!((0..=5_000).contains(&act.primary().current_ms()));
                if let Some(t) = act.tilt() {
                    prop_assert!((0..=t.full_ms()).contains(&t.current_ms()));
                }
                prop_assert_eq!((f, r), (false, false));
            }
        }
        prop_assert!(!drive.snapshot().overlap_seen);
    }
}
