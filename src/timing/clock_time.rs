use chrono::{NaiveTime, Timelike};
use thiserror::Error;

pub const MINUTES_PER_HOUR: u32 = 60;
pub const MINUTES_PER_DAY: u32 = 24 * MINUTES_PER_HOUR;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimeParseError {
    #[error("empty time string")]
    Empty,

    #[error("malformed time string '{0}'")]
    Malformed(String),
}

/// Converts a wall-clock string into minutes since midnight.
///
/// Accepts `"H:MM"`/`"HH:MM"` and `"H:MM AM"`/`"H:MM PM"`. Nothing here fails:
/// components that do not parse, or fall outside a day (hour above 23, minute
/// above 59), count as zero, so an empty string is midnight and the result is
/// always below `MINUTES_PER_DAY`. Use `try_parse_time` when bad input has to be
/// noticed.
pub fn parse_time_to_minutes(text: &str) -> u32 {
    let text = text.trim();
    let (mut hour, minute, period) = if text.contains("AM") || text.contains("PM") {
        let mut parts = text.splitn(2, char::is_whitespace);
        let time = parts.next().unwrap_or_default();
        let period = parts.next().map(str::trim);
        let (hour, minute) = split_hour_minute(time);
        (hour, minute, period)
    } else {
        let (hour, minute) = split_hour_minute(text);
        (hour, minute, None)
    };

    match period {
        Some("PM") if hour < 12 => hour += 12,
        Some("AM") if hour == 12 => hour = 0,
        _ => (),
    }

    hour * MINUTES_PER_HOUR + minute
}

fn split_hour_minute(time: &str) -> (u32, u32) {
    let mut iterator = time.splitn(2, ':');
    let hour = leading_number(iterator.next().unwrap_or_default());
    let minute = leading_number(iterator.next().unwrap_or_default());
    (
        if hour < 24 { hour } else { 0 },
        if minute < MINUTES_PER_HOUR { minute } else { 0 },
    )
}

// Reads the leading run of digits, "07" -> 7, "30PM" -> 30, "" -> 0. Runs too
// long for a u32 also give 0.
fn leading_number(text: &str) -> u32 {
    let digits: String = text
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().unwrap_or(0)
}

/// Strict variant of `parse_time_to_minutes`.
///
/// Rejects anything outside `00:00`..`23:59` or `1:00 AM`..`12:59 PM`. The period
/// must be upper case with a space before it, which is the only spelling the
/// lenient parser reads as a period.
pub fn try_parse_time(text: &str) -> Result<u32, TimeParseError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(TimeParseError::Empty);
    }
    let parsed = if text.ends_with(" AM") || text.ends_with(" PM") {
        NaiveTime::parse_from_str(text, "%I:%M %p")
    } else {
        NaiveTime::parse_from_str(text, "%H:%M")
    };
    match parsed {
        Ok(time) => Ok(time.hour() * MINUTES_PER_HOUR + time.minute()),
        Err(_) => Err(TimeParseError::Malformed(text.to_owned())),
    }
}

/// Renders minutes since midnight as `HH:MM`, wrapping past a full day.
pub fn format_minutes(minutes: u32) -> String {
    let minutes = minutes % MINUTES_PER_DAY;
    format!(
        "{:02}:{:02}",
        minutes / MINUTES_PER_HOUR,
        minutes % MINUTES_PER_HOUR
    )
}
