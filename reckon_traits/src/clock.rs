use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::thread;
use std::time::{Duration, Instant};

/// Monotonic millisecond clock used by every controller tick.
///
/// - now_ms(): milliseconds since an arbitrary origin; wraps at `u32::MAX`
/// - sleep(): sleeps for the provided duration (implementations may simulate)
/// - ms_since(): wrap-safe elapsed milliseconds from an earlier reading
pub trait Clock {
    fn now_ms(&self) -> u32;
    fn sleep(&self, d: Duration);

    /// Milliseconds elapsed since `epoch`, correct across one wraparound.
    fn ms_since(&self, epoch: u32) -> u32 {
        self.now_ms().wrapping_sub(epoch)
    }
}

/// Real-time monotonic clock backed by `std::time::Instant`.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock {
    #[inline]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Clock for MonotonicClock {
    #[inline]
    fn now_ms(&self) -> u32 {
        // Truncation is the wraparound.
        self.origin.elapsed().as_millis() as u32
    }

    #[inline]
    fn sleep(&self, d: Duration) {
        if d.is_zero() {
            return;
        }
        thread::sleep(d);
    }
}

/// Deterministic clock whose time is advanced by hand.
///
/// Clones share the same counter. `sleep(d)` advances time by `d` without
/// blocking, so loops written against `Clock` run instantly in simulation.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU32>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start at an arbitrary timestamp (handy for wraparound tests).
    pub fn starting_at(ms: u32) -> Self {
        Self {
            now: Arc::new(AtomicU32::new(ms)),
        }
    }

    /// Advance the clock by `ms`, wrapping at `u32::MAX`.
    pub fn advance(&self, ms: u32) {
        // fetch_add on atomics wraps on overflow
        self.now.fetch_add(ms, Ordering::Relaxed);
    }

    pub fn set(&self, ms: u32) {
        self.now.store(ms, Ordering::Relaxed);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u32 {
        self.now.load(Ordering::Relaxed)
    }

    fn sleep(&self, d: Duration) {
        self.advance(u32::try_from(d.as_millis()).unwrap_or(u32::MAX));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_wraps_and_measures_across_wrap() {
        let clock = ManualClock::starting_at(u32::MAX - 5);
        let epoch = clock.now_ms();
        clock.advance(10);
        assert_eq!(clock.now_ms(), 4);
        assert_eq!(clock.ms_since(epoch), 10);
    }

    #[test]
    fn sleep_advances_manual_clock() {
        let clock = ManualClock::new();
        let shared = clock.clone();
        clock.sleep(Duration::from_millis(250));
        assert_eq!(shared.now_ms(), 250);
    }
}
