use chrono::{DateTime, Utc};

/// Time source for the rate limiter. Injected so window behavior is testable
/// with a controlled clock, including clock-skew cases.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
