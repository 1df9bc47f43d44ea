use chrono::Utc;

/// Source of the local wall-clock time, in whole seconds since the Unix epoch.
pub trait Clock: Send + Sync {
    fn unix_time(&self) -> i64;
}

/// Reads the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn unix_time(&self) -> i64 {
        Utc::now().timestamp()
    }
}

/// A clock frozen at a fixed instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn unix_time(&self) -> i64 {
        self.0
    }
}
