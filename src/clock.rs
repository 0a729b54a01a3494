// VitalWatch - Millisecond Clock
//
// All timestamps are `u32` milliseconds since boot.  They wrap after
// ~49 days, so durations are always taken with `elapsed_ms`, which stays
// correct across a single wraparound.

use std::thread;
use std::time::{Duration, Instant};

/// `now - since`, modulo 2³².
#[inline]
pub fn elapsed_ms(now: u32, since: u32) -> u32 {
    now.wrapping_sub(since)
}

pub trait Clock {
    fn now_ms(&self) -> u32;

    /// Block (or, for simulated clocks, advance) for `ms` milliseconds.
    fn delay_ms(&mut self, ms: u32);
}

/// Wall clock anchored at construction.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u32 {
        // Truncation is the wraparound.
        self.origin.elapsed().as_millis() as u32
    }

    fn delay_ms(&mut self, ms: u32) {
        thread::sleep(Duration::from_millis(u64::from(ms)));
    }
}

/// Simulated clock: time only moves when told to.
#[derive(Debug, Clone, Copy, Default)]
pub struct ManualClock {
    now: u32,
}

impl ManualClock {
    pub fn starting_at(now_ms: u32) -> Self {
        Self { now: now_ms }
    }

    pub fn advance(&mut self, ms: u32) {
        self.now = self.now.wrapping_add(ms);
    }

    pub fn set(&mut self, now_ms: u32) {
        self.now = now_ms;
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u32 {
        self.now
    }

    fn delay_ms(&mut self, ms: u32) {
        self.advance(ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_survives_wraparound() {
        let start = u32::MAX - 49;
        let now = start.wrapping_add(150);
        assert_eq!(now, 100);
        assert_eq!(elapsed_ms(now, start), 150);
    }

    #[test]
    fn manual_clock_advances_on_delay() {
        let mut clock = ManualClock::starting_at(u32::MAX - 5);
        clock.delay_ms(10);
        assert_eq!(clock.now_ms(), 4);
    }
}
