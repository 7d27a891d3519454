use chrono::{DateTime, Utc};
use chrono_tz::Tz;

/// Where "now" comes from. Schedules are wall-clock times in the same zone.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Tz>;
}

#[derive(Copy, Clone, Debug)]
pub struct ZonedClock {
    timezone: Tz,
}

impl ZonedClock {
    pub fn new(timezone: Tz) -> Self {
        Self { timezone }
    }
}

impl Clock for ZonedClock {
    fn now(&self) -> DateTime<Tz> {
        Utc::now().with_timezone(&self.timezone)
    }
}

/// Always reports the same instant.
#[derive(Clone, Debug)]
pub struct FixedClock {
    instant: DateTime<Tz>,
}

impl FixedClock {
    pub fn new(instant: DateTime<Tz>) -> Self {
        Self { instant }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Tz> {
        self.instant
    }
}
