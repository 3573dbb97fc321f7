//! Safety delay gate between a stop and the next engagement.

/// Holds both outputs released for `delay_ms` after every stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SafetyGate {
    delay_ms: u32,
    until: Option<u32>,
}

impl SafetyGate {
    pub fn new(delay_ms: u32) -> Self {
        Self {
            delay_ms,
            until: None,
        }
    }

    #[inline]
    pub fn delay_ms(&self) -> u32 {
        self.delay_ms
    }

    pub fn arm(&mut self, now: u32) {
        self.until = Some(now.wrapping_add(self.delay_ms));
    }

    /// Wrap-safe: valid while the delay stays far below 2^31 ms.
    pub fn is_active(&mut self, now: u32) -> bool {
        match self.until {
            Some(until) if (now.wrapping_sub(until) as i32) < 0 => true,
            Some(_) => {
                self.until = None;
                false
            }
            None => false,
        }
    }

    /// Deadline of the current dwell, if one is pending.
    pub fn until(&self) -> Option<u32> {
        self.until
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_for_exactly_the_delay() {
        let mut g = SafetyGate::new(250);
        assert!(!g.is_active(0));
        g.arm(1_000);
        assert!(g.is_active(1_000));
        assert!(g.is_active(1_249));
        assert!(!g.is_active(1_250));
        assert_eq!(g.until(), None);
    }

    #[test]
    fn survives_wraparound() {
        let mut g = SafetyGate::new(250);
        g.arm(u32::MAX - 100);
        assert!(g.is_active(u32::MAX - 50));
        assert!(g.is_active(100));
        assert!(!g.is_active(149));
    }

    #[test]
    fn zero_delay_never_blocks() {
        let mut g = SafetyGate::new(0);
        g.arm(42);
        assert!(!g.is_active(42));
    }
}
