/// Time sources and frame pacing.

use std::time::{Duration, Instant};

/// Monotonic milliseconds since some fixed origin.
pub trait Clock {
    fn now_ms(&self) -> f64;
}

pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        SystemClock { origin: Instant::now() }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

/// Sleeps out the remainder of each frame period.
pub struct FramePacer {
    period: Duration,
    next: Instant,
}

impl FramePacer {
    pub fn new(period: Duration) -> Self {
        FramePacer { period, next: Instant::now() + period }
    }

    /// Block until the next frame is due. A late frame resynchronises
    /// instead of bursting to catch up.
    pub fn wait(&mut self) {
        let now = Instant::now();
        if self.next > now {
            std::thread::sleep(self.next - now);
            self.next += self.period;
        } else {
            self.next = now + self.period;
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::ManualClock;
    use super::*;

    #[test]
    fn manual_clock_is_shared_between_clones() {
        let a = ManualClock::new();
        let b = a.clone();
        a.advance(16.0);
        assert_eq!(b.now_ms(), 16.0);
    }

    #[test]
    fn system_clock_is_monotonic() {
        let c = SystemClock::new();
        let t0 = c.now_ms();
        std::thread::sleep(Duration::from_millis(2));
        assert!(c.now_ms() > t0);
    }

    #[test]
    fn pacer_waits_about_one_period() {
        let mut p = FramePacer::new(Duration::from_millis(5));
        let start = Instant::now();
        p.wait();
        assert!(start.elapsed() >= Duration::from_millis(3));
    }
}
