//! Test and helper mocks for reckon_core.
//!
//! Every mock is a cheap clonable handle around shared state, so a test can
//! hand one clone to the controller and keep another to inspect.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use reckon_traits::{DriveOutputs, PositionStore, StatusReport, StatusSink, SwitchOutput};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Default, Clone)]
pub struct DriveLog {
    pub forward: bool,
    pub reverse: bool,
    /// Every call, including writes that keep the level unchanged.
    pub writes: usize,
    /// Level changes only.
    pub transitions: usize,
    /// Set if both lines were ever high at the same time.
    pub overlap_seen: bool,
}

/// Drive that records every write and flags any overlap of the two lines.
#[derive(Debug, Clone, Default)]
pub struct RecordingDrive {
    log: Arc<Mutex<DriveLog>>,
    failing: Arc<AtomicBool>,
}

impl RecordingDrive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> DriveLog {
        self.log.lock().map(|g| g.clone()).unwrap_or_default()
    }

    /// (forward, reverse)
    pub fn levels(&self) -> (bool, bool) {
        let s = self.snapshot();
        (s.forward, s.reverse)
    }

    pub fn writes(&self) -> usize {
        self.snapshot().writes
    }

    fn write(&self, forward_line: bool, on: bool) -> Result<(), BoxError> {
        if self.failing.load(Ordering::Relaxed) {
            return Err(Box::new(std::io::Error::other("drive write failed")));
        }
        let mut log = self.log.lock().map_err(|_| "drive log poisoned")?;
        let line = if forward_line {
            &mut log.forward
        } else {
            &mut log.reverse
        };
        let changed = *line != on;
        *line = on;
        log.writes += 1;
        if changed {
            log.transitions += 1;
        }
        if log.forward && log.reverse {
            log.overlap_seen = true;
        }
        Ok(())
    }
}

impl DriveOutputs for RecordingDrive {
    fn set_forward(&mut self, on: bool) -> Result<(), BoxError> {
        self.write(true, on)
    }
    fn set_reverse(&mut self, on: bool) -> Result<(), BoxError> {
        self.write(false, on)
    }
}

/// Switch output that records its level history.
#[derive(Debug, Clone, Default)]
pub struct RecordingSwitch {
    history: Arc<Mutex<Vec<bool>>>,
}

impl RecordingSwitch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> Vec<bool> {
        self.history.lock().map(|g| g.clone()).unwrap_or_default()
    }

    pub fn level(&self) -> Option<bool> {
        self.history().last().copied()
    }
}

impl SwitchOutput for RecordingSwitch {
    fn set(&mut self, on: bool) -> Result<(), BoxError> {
        self.history
            .lock()
            .map_err(|_| "switch history poisoned")?
            .push(on);
        Ok(())
    }
}

/// In-memory position store counting its writes.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: Arc<Mutex<HashMap<u16, i32>>>,
    puts: Arc<Mutex<usize>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate a slot.
    pub fn with_value(self, slot: u16, value: i32) -> Self {
        if let Ok(mut v) = self.values.lock() {
            v.insert(slot, value);
        }
        self
    }

    pub fn puts(&self) -> usize {
        self.puts.lock().map(|g| *g).unwrap_or(0)
    }

    pub fn value(&self, slot: u16) -> Option<i32> {
        self.values.lock().ok().and_then(|v| v.get(&slot).copied())
    }
}

impl PositionStore for MemoryStore {
    fn put(&mut self, slot: u16, value: i32) -> Result<(), BoxError> {
        self.values
            .lock()
            .map_err(|_| "store poisoned")?
            .insert(slot, value);
        if let Ok(mut n) = self.puts.lock() {
            *n += 1;
        }
        Ok(())
    }

    fn get(&self, slot: u16) -> Result<Option<i32>, BoxError> {
        Ok(self
            .values
            .lock()
            .map_err(|_| "store poisoned")?
            .get(&slot)
            .copied())
    }
}

/// A store whose every operation fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingStore;

impl PositionStore for FailingStore {
    fn put(&mut self, _slot: u16, _value: i32) -> Result<(), BoxError> {
        Err(Box::new(std::io::Error::other("store offline")))
    }
    fn get(&self, _slot: u16) -> Result<Option<i32>, BoxError> {
        Err(Box::new(std::io::Error::other("store offline")))
    }
}

/// Sink that keeps every report.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    reports: Arc<Mutex<Vec<StatusReport>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> Vec<StatusReport> {
        self.reports.lock().map(|g| g.clone()).unwrap_or_default()
    }

    pub fn last(&self) -> Option<StatusReport> {
        self.reports().last().copied()
    }
}

impl StatusSink for RecordingSink {
    fn report(&mut self, report: StatusReport) {
        if let Ok(mut r) = self.reports.lock() {
            r.push(report);
        }
    }
}
