use chrono::{DateTime, Local};
use std::cell::Cell;
use std::time::{Duration, Instant};

/// Time source for the control loop.
///
/// `monotonic` is measured from the clock's own origin and drives run
/// durations, debouncing and the actuation hold. `wall` stamps log lines.
/// `sleep` is the only way the loop blocks on time, so a manual clock can
/// replace it in tests.
pub trait Clock {
    fn monotonic(&self) -> Duration;
    fn wall(&self) -> DateTime<Local>;
    fn sleep(&self, duration: Duration);
}

#[derive(Debug, Clone)]
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
    fn monotonic(&self) -> Duration {
        self.origin.elapsed()
    }

    fn wall(&self) -> DateTime<Local> {
        Local::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Clock that only moves when told to. Sleeping advances it instantly.
#[derive(Debug)]
pub struct ManualClock {
    elapsed: Cell<Duration>,
    wall_origin: DateTime<Local>,
}

impl ManualClock {
    pub fn new(wall_origin: DateTime<Local>) -> Self {
        Self {
            elapsed: Cell::new(Duration::ZERO),
            wall_origin,
        }
    }

    pub fn advance(&self, by: Duration) {
        self.elapsed.set(self.elapsed.get() + by);
    }
}

impl Clock for ManualClock {
    fn monotonic(&self) -> Duration {
        self.elapsed.get()
    }

    fn wall(&self) -> DateTime<Local> {
        // Out-of-range durations cannot happen for test-sized offsets.
        self.wall_origin
            + chrono::Duration::from_std(self.elapsed.get()).unwrap_or_else(|_| chrono::Duration::zero())
    }

    fn sleep(&self, duration: Duration) {
        self.advance(duration);
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn monotonic(&self) -> Duration {
        (**self).monotonic()
    }

    fn wall(&self) -> DateTime<Local> {
        (**self).wall()
    }

    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_sleep_advances_both_readings() {
        let origin = Local::now();
        let clock = ManualClock::new(origin);
        clock.sleep(Duration::from_millis(1500));
        assert_eq!(clock.monotonic(), Duration::from_millis(1500));
        assert_eq!(clock.wall() - origin, chrono::Duration::milliseconds(1500));
    }

    #[test]
    fn system_clock_is_monotonic() {
        let clock = SystemClock::new();
        let a = clock.monotonic();
        let b = clock.monotonic();
        assert!(b >= a);
    }
}
