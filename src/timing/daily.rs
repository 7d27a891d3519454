use serde::{Deserialize, Serialize};

use super::clock_time::{parse_time_to_minutes, try_parse_time, TimeParseError};

/// One day's opening hours as they were entered, e.g. `"9:00 AM"` to `"17:30"`.
///
/// Strings are kept verbatim so that both clock conventions survive a round trip
/// through storage. Empty strings mean the day is closed.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayHours {
    #[serde(default)]
    open: String,
    #[serde(default)]
    close: String,
}

impl DayHours {
    pub fn new(open: &str, close: &str) -> Self {
        Self {
            open: open.to_string(),
            close: close.to_string(),
        }
    }

    pub fn new_closed() -> Self {
        Self::default()
    }

    pub fn open(&self) -> &str {
        &self.open
    }

    pub fn close(&self) -> &str {
        &self.close
    }

    /// A day only counts as having hours when both ends are filled in.
    pub fn has_hours(&self) -> bool {
        !self.open.trim().is_empty() && !self.close.trim().is_empty()
    }

    pub fn has_opening(&self) -> bool {
        !self.open.trim().is_empty()
    }

    pub fn opening_minutes(&self) -> u32 {
        parse_time_to_minutes(&self.open)
    }

    pub fn closing_minutes(&self) -> u32 {
        parse_time_to_minutes(&self.close)
    }

    /// `(open, close)` in minutes, `None` when the day is closed.
    pub fn minutes(&self) -> Option<(u32, u32)> {
        if !self.has_hours() {
            return None;
        }
        Some((self.opening_minutes(), self.closing_minutes()))
    }

    /// Like `minutes` but fails on strings the lenient parser would have zeroed.
    pub fn try_minutes(&self) -> Result<(u32, u32), TimeParseError> {
        Ok((try_parse_time(&self.open)?, try_parse_time(&self.close)?))
    }

    /// Opens by 00:30 and closes from 23:30, or uses one of the all-day encodings.
    pub fn is_full_day(&self) -> bool {
        match self.minutes() {
            Some((open, close)) => {
                (open <= 30 && close >= 1410) || open == close || (open == 0 && close == 1439)
            }
            None => false,
        }
    }
}
