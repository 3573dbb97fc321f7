//! Status reports from every device, timestamped and funneled into one channel.

use crossbeam_channel::Sender;
use reckon_traits::{Clock, StatusReport, StatusSink};
use serde_json::json;

#[derive(Debug, Clone)]
pub struct StatusEvent {
    pub at_ms: u32,
    pub device: String,
    pub report: StatusReport,
}

pub struct ChannelSink<C> {
    device: String,
    clock: C,
    tx: Sender<StatusEvent>,
}

impl<C: Clock> ChannelSink<C> {
    pub fn new(device: impl Into<String>, clock: C, tx: Sender<StatusEvent>) -> Self {
        Self {
            device: device.into(),
            clock,
            tx,
        }
    }
}

impl<C: Clock> StatusSink for ChannelSink<C> {
    fn report(&mut self, report: StatusReport) {
        tracing::info!(
            device = %self.device,
            state = %report.state,
            position = report.position,
            tilt = ?report.tilt,
            "status"
        );
        // Nobody listening is fine; the log line above still records it.
        let _ = self.tx.send(StatusEvent {
            at_ms: self.clock.now_ms(),
            device: self.device.clone(),
            report,
        });
    }
}

pub fn render(ev: &StatusEvent, json: bool) -> String {
    if json {
        return json!({
            "at_ms": ev.at_ms,
            "device": ev.device,
            "state": ev.report.state.as_str(),
            "position": ev.report.position,
            "tilt": ev.report.tilt,
        })
        .to_string();
    }
    let tilt = ev
        .report
        .tilt
        .map(|t| format!(" tilt={t}%"))
        .unwrap_or_default();
    format!(
        "[{:>8} ms] {}: {} position={}%{tilt}",
        ev.at_ms, ev.device, ev.report.state, ev.report.position
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use reckon_traits::{CoverState, ManualClock};

    #[test]
    fn sink_stamps_with_clock_time() {
        let clock = ManualClock::starting_at(1_500);
        let (tx, rx) = crossbeam_channel::unbounded();
        let mut sink = ChannelSink::new("living", clock, tx);
        sink.report(StatusReport {
            state: CoverState::Closing,
            position: 0,
            tilt: Some(0),
        });
        let ev = rx.try_recv().unwrap();
        assert_eq!(ev.at_ms, 1_500);
        assert_eq!(ev.device, "living");
    }

    #[test]
    fn renders_text_and_json() {
        let ev = StatusEvent {
            at_ms: 11_000,
            device: "living".into(),
            report: StatusReport {
                state: CoverState::Closed,
                position: 100,
                tilt: None,
            },
        };
        assert_eq!(render(&ev, false), "[   11000 ms] living: closed position=100%");
        let v: serde_json::Value = serde_json::from_str(&render(&ev, true)).unwrap();
        assert_eq!(v["state"], "closed");
        assert_eq!(v["tilt"], serde_json::Value::Null);
    }
}
