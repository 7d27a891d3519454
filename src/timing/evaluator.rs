use chrono::{DateTime, Datelike, TimeZone, Timelike, Weekday};
use serde::Serialize;

use super::{
    clock_time::{format_minutes, MINUTES_PER_DAY, MINUTES_PER_HOUR},
    schedule::{WeeklySchedule, WEEK},
};

/// The moment a schedule is evaluated at: a weekday and minutes since midnight.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct EvaluationInstant {
    weekday: Weekday,
    minutes: u32,
}

impl EvaluationInstant {
    pub fn new(weekday: Weekday, minutes: u32) -> Self {
        Self {
            weekday,
            minutes: minutes % MINUTES_PER_DAY,
        }
    }

    pub fn at(weekday: Weekday, hour: u32, minute: u32) -> Self {
        Self::new(weekday, hour * MINUTES_PER_HOUR + minute)
    }

    /// Reads the weekday and time of day in the datetime's own zone.
    pub fn from_datetime<Tz: TimeZone>(datetime: &DateTime<Tz>) -> Self {
        Self::at(datetime.weekday(), datetime.hour(), datetime.minute())
    }

    pub fn weekday(&self) -> Weekday {
        self.weekday
    }

    pub fn minutes(&self) -> u32 {
        self.minutes
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeDirection {
    Opens,
    Closes,
}

impl ChangeDirection {
    fn verb(&self) -> &'static str {
        match self {
            ChangeDirection::Opens => "Opens",
            ChangeDirection::Closes => "Closes",
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Countdown {
    pub minutes: u32,
    pub direction: ChangeDirection,
}

impl Countdown {
    pub fn is_opening(&self) -> bool {
        self.direction == ChangeDirection::Opens
    }

    pub fn label(&self) -> String {
        format_countdown(self.minutes, self.direction)
    }
}

/**
Whether every day of the week is open around the clock.

Every day needs both ends filled in. Monday is checked first, then the rest,
each against the same all-day encodings (see `DayHours::is_full_day`).
*/
pub fn is_always_open(schedule: &WeeklySchedule) -> bool {
    if WEEK.iter().any(|weekday| schedule.hours_on(*weekday).is_none()) {
        return false;
    }
    let monday_qualifies = schedule
        .hours_on(Weekday::Mon)
        .is_some_and(|hours| hours.is_full_day());
    if !monday_qualifies {
        return false;
    }
    WEEK.iter()
        .all(|weekday| schedule.hours_on(*weekday).is_some_and(|hours| hours.is_full_day()))
}

/// Opening is inclusive and closing exclusive. `open >= close` spans midnight.
pub fn is_currently_open(schedule: &WeeklySchedule, instant: EvaluationInstant) -> bool {
    if is_always_open(schedule) {
        return true;
    }
    let Some((open, close)) = schedule
        .hours_on(instant.weekday)
        .and_then(|hours| hours.minutes())
    else {
        return false;
    };
    let now = instant.minutes;
    if open < close {
        open <= now && now < close
    } else {
        now >= open || now < close
    }
}

/**
Minutes until the next opening or closing.

Returns `None` for a 24/7 schedule and for a schedule with nothing to open on.
When closed and today's opening has passed (or today has no hours) the following
seven days are searched for the next one with an opening time.
*/
pub fn minutes_until_change(
    schedule: &WeeklySchedule,
    instant: EvaluationInstant,
) -> Option<Countdown> {
    if is_always_open(schedule) {
        return None;
    }
    let now = instant.minutes;
    let today = schedule
        .hours_on(instant.weekday)
        .and_then(|hours| hours.minutes());

    if is_currently_open(schedule, instant) {
        let (_, close) = today?;
        let minutes = if close > now {
            close - now
        } else {
            (MINUTES_PER_DAY - now) + close
        };
        return Some(Countdown {
            minutes,
            direction: ChangeDirection::Closes,
        });
    }

    if let Some((open, _)) = today {
        if open > now {
            return Some(Countdown {
                minutes: open - now,
                direction: ChangeDirection::Opens,
            });
        }
    }

    let mut weekday = instant.weekday;
    for days_until in 1..=7 {
        weekday = weekday.succ();
        let Some(next) = schedule.day(weekday).filter(|hours| hours.has_opening()) else {
            continue;
        };
        let minutes =
            (MINUTES_PER_DAY - now) + (days_until - 1) * MINUTES_PER_DAY + next.opening_minutes();
        return Some(Countdown {
            minutes,
            direction: ChangeDirection::Opens,
        });
    }
    None
}

/// Human readable countdown, e.g. `"Closes in 45 min"`. Empty when nothing applies
/// or when today has no hours.
pub fn time_until_change(schedule: &WeeklySchedule, instant: EvaluationInstant) -> String {
    if is_always_open(schedule) || schedule.hours_on(instant.weekday).is_none() {
        return String::new();
    }
    minutes_until_change(schedule, instant)
        .map(|countdown| countdown.label())
        .unwrap_or_default()
}

pub fn format_countdown(minutes: u32, direction: ChangeDirection) -> String {
    if minutes == 0 {
        return String::new();
    }
    let verb = direction.verb();
    let hours = minutes / MINUTES_PER_HOUR;
    let remainder = minutes % MINUTES_PER_HOUR;

    if hours >= 24 {
        let days = hours / 24;
        let unit = if days == 1 { "day" } else { "days" };
        format!("{verb} in {days} {unit}")
    } else if hours > 0 && remainder == 0 {
        let unit = if hours == 1 { "hr" } else { "hrs" };
        format!("{verb} in {hours} {unit}")
    } else if hours > 0 {
        format!("{verb} in {hours} hr {remainder} min")
    } else {
        format!("{verb} in {minutes} min")
    }
}

/// Open, closed, or not decidable from the data we have.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleStatus {
    Open,
    Closed,
    Unknown,
}

impl ScheduleStatus {
    /**
    Same answer as `is_currently_open`, except where the lenient parser would hide
    bad data: a schedule without a single day of hours, or today's entry being
    half filled in, unparseable, or read differently by the strict parser, gives
    `Unknown`.
    */
    pub fn evaluate(schedule: &WeeklySchedule, instant: EvaluationInstant) -> Self {
        if !schedule.has_any_hours() {
            return ScheduleStatus::Unknown;
        }
        if is_always_open(schedule) {
            return ScheduleStatus::Open;
        }
        if let Some(today) = schedule.day(instant.weekday) {
            let half_filled = today.open().trim().is_empty() != today.close().trim().is_empty();
            let misread = today.has_hours() && today.try_minutes().ok() != today.minutes();
            if half_filled || misread {
                return ScheduleStatus::Unknown;
            }
        }
        if is_currently_open(schedule, instant) {
            ScheduleStatus::Open
        } else {
            ScheduleStatus::Closed
        }
    }
}

/// Everything the display layer needs, recomputed on every evaluation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenState {
    pub is_open: bool,
    #[serde(rename = "is24x7")]
    pub is_24x7: bool,
    pub minutes_until_change: Option<u32>,
    pub change_direction: Option<ChangeDirection>,
    /// Wall-clock time of the next change, `HH:MM`.
    pub changes_at: Option<String>,
    pub label: String,
    pub status: ScheduleStatus,
}

impl OpenState {
    pub fn evaluate(schedule: &WeeklySchedule, instant: EvaluationInstant) -> Self {
        let countdown = minutes_until_change(schedule, instant);
        Self {
            is_open: is_currently_open(schedule, instant),
            is_24x7: is_always_open(schedule),
            minutes_until_change: countdown.map(|countdown| countdown.minutes),
            change_direction: countdown.map(|countdown| countdown.direction),
            changes_at: countdown.map(|countdown| format_minutes(instant.minutes + countdown.minutes)),
            label: time_until_change(schedule, instant),
            status: ScheduleStatus::evaluate(schedule, instant),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use chrono_tz::Europe::London;

    use super::*;
    use crate::timing::daily::DayHours;

    fn every_day(open: &str, close: &str) -> WeeklySchedule {
        WEEK.iter().fold(WeeklySchedule::new(), |schedule, weekday| {
            schedule.with_day(*weekday, DayHours::new(open, close))
        })
    }

    fn weekdays(open: &str, close: &str) -> WeeklySchedule {
        WEEK[..5].iter().fold(WeeklySchedule::new(), |schedule, weekday| {
            schedule.with_day(*weekday, DayHours::new(open, close))
        })
    }

    #[test]
    fn midnight_to_midnight_every_day_is_always_open() {
        assert!(is_always_open(&every_day("00:00", "23:59")));
        assert!(is_always_open(&every_day("12:00 AM", "12:00 AM")));
        assert!(is_always_open(&every_day("00:15", "23:45")));
    }

    #[test]
    fn one_missing_day_breaks_always_open() {
        let mut schedule = every_day("00:00", "23:59");
        schedule.set_day(Weekday::Thu, None);
        assert!(!is_always_open(&schedule));

        let mut schedule = every_day("00:00", "23:59");
        schedule.set_day(Weekday::Sun, Some(DayHours::new("00:00", "")));
        assert!(!is_always_open(&schedule));
    }

    #[test]
    fn every_day_must_qualify_not_just_monday() {
        let schedule = every_day("00:00", "23:59").with_day(Weekday::Fri, DayHours::new("09:00", "17:00"));
        assert!(!is_always_open(&schedule));
        let schedule = every_day("00:00", "23:59").with_day(Weekday::Mon, DayHours::new("09:00", "17:00"));
        assert!(!is_always_open(&schedule));
    }

    #[test]
    fn narrow_overnight_hours_read_as_always_open() {
        // Tolerance band: opening at 00:20 and closing at 23:40 counts as all day.
        assert!(is_always_open(&every_day("00:20", "23:40")));
    }

    #[test]
    fn same_day_window() {
        let schedule = weekdays("09:00", "17:00");
        assert!(is_currently_open(&schedule, EvaluationInstant::at(Weekday::Mon, 10, 0)));
        assert!(is_currently_open(&schedule, EvaluationInstant::at(Weekday::Mon, 9, 0)));
        assert!(!is_currently_open(&schedule, EvaluationInstant::at(Weekday::Mon, 17, 0)));
        assert!(!is_currently_open(&schedule, EvaluationInstant::at(Weekday::Mon, 8, 59)));
        assert!(!is_currently_open(&schedule, EvaluationInstant::at(Weekday::Sat, 10, 0)));
    }

    #[test]
    fn overnight_window() {
        let schedule = every_day("22:00", "02:00");
        assert!(is_currently_open(&schedule, EvaluationInstant::at(Weekday::Tue, 23, 30)));
        assert!(is_currently_open(&schedule, EvaluationInstant::at(Weekday::Tue, 1, 0)));
        assert!(!is_currently_open(&schedule, EvaluationInstant::at(Weekday::Tue, 10, 0)));
        assert!(!is_currently_open(&schedule, EvaluationInstant::at(Weekday::Tue, 2, 0)));
    }

    #[test]
    fn countdown_formatting() {
        assert_eq!(format_countdown(45, ChangeDirection::Opens), "Opens in 45 min");
        assert_eq!(format_countdown(45, ChangeDirection::Closes), "Closes in 45 min");
        assert_eq!(format_countdown(125, ChangeDirection::Closes), "Closes in 2 hr 5 min");
        assert_eq!(format_countdown(120, ChangeDirection::Closes), "Closes in 2 hrs");
        assert_eq!(format_countdown(60, ChangeDirection::Opens), "Opens in 1 hr");
        assert_eq!(format_countdown(1500, ChangeDirection::Opens), "Opens in 1 day");
        assert_eq!(format_countdown(2 * 1440 + 300, ChangeDirection::Opens), "Opens in 2 days");
        assert_eq!(format_countdown(0, ChangeDirection::Opens), "");
    }

    #[test]
    fn counts_down_to_closing() {
        let schedule = weekdays("09:00", "17:00");
        let instant = EvaluationInstant::at(Weekday::Wed, 16, 15);
        assert_eq!(
            minutes_until_change(&schedule, instant),
            Some(Countdown { minutes: 45, direction: ChangeDirection::Closes })
        );
        assert_eq!(time_until_change(&schedule, instant), "Closes in 45 min");
    }

    #[test]
    fn counts_down_to_closing_past_midnight() {
        let schedule = every_day("22:00", "02:00");
        let late = EvaluationInstant::at(Weekday::Fri, 23, 30);
        assert_eq!(minutes_until_change(&schedule, late).unwrap().minutes, 150);
        assert_eq!(time_until_change(&schedule, late), "Closes in 2 hr 30 min");

        let early = EvaluationInstant::at(Weekday::Sat, 1, 0);
        assert_eq!(time_until_change(&schedule, early), "Closes in 1 hr");
    }

    #[test]
    fn counts_down_to_opening_later_today() {
        let schedule = weekdays("09:00", "17:00");
        let instant = EvaluationInstant::at(Weekday::Mon, 6, 55);
        let countdown = minutes_until_change(&schedule, instant).unwrap();
        assert!(countdown.is_opening());
        assert_eq!(countdown.minutes, 125);
        assert_eq!(time_until_change(&schedule, instant), "Opens in 2 hr 5 min");
    }

    #[test]
    fn counts_down_to_opening_tomorrow() {
        let schedule = weekdays("09:00", "17:00");
        let instant = EvaluationInstant::at(Weekday::Tue, 18, 0);
        assert_eq!(minutes_until_change(&schedule, instant).unwrap().minutes, 360 + 540);
        assert_eq!(time_until_change(&schedule, instant), "Opens in 15 hrs");
    }

    #[test]
    fn scans_across_a_closed_weekend() {
        let schedule = weekdays("09:00", "17:00");
        let saturday = EvaluationInstant::at(Weekday::Sat, 10, 0);
        assert_eq!(
            minutes_until_change(&schedule, saturday),
            Some(Countdown {
                minutes: (1440 - 600) + 1440 + 540,
                direction: ChangeDirection::Opens
            })
        );
        // Today has no hours, so there is no label.
        assert_eq!(time_until_change(&schedule, saturday), "");

        let friday = EvaluationInstant::at(Weekday::Fri, 18, 0);
        assert_eq!(
            minutes_until_change(&schedule, friday).unwrap().minutes,
            (1440 - 1080) + 2 * 1440 + 540
        );
        assert_eq!(time_until_change(&schedule, friday), "Opens in 2 days");
    }

    #[test]
    fn wraps_to_the_same_weekday_next_week() {
        let schedule = WeeklySchedule::new().with_day(Weekday::Wed, DayHours::new("09:00", "12:00"));
        let instant = EvaluationInstant::at(Weekday::Wed, 13, 0);
        assert_eq!(
            minutes_until_change(&schedule, instant).unwrap().minutes,
            (1440 - 780) + 6 * 1440 + 540
        );
        assert_eq!(time_until_change(&schedule, instant), "Opens in 6 days");
    }

    #[test]
    fn nothing_to_count_down_to() {
        let empty = WeeklySchedule::new();
        let instant = EvaluationInstant::at(Weekday::Mon, 12, 0);
        assert_eq!(minutes_until_change(&empty, instant), None);
        assert_eq!(time_until_change(&empty, instant), "");

        let always = every_day("00:00", "23:59");
        assert_eq!(minutes_until_change(&always, instant), None);
        assert_eq!(time_until_change(&always, instant), "");
    }

    #[test]
    fn equal_open_and_close_on_one_day_is_open_all_that_day() {
        let schedule = weekdays("09:00", "17:00").with_day(Weekday::Sat, DayHours::new("00:00", "00:00"));
        let instant = EvaluationInstant::at(Weekday::Sat, 10, 0);
        assert!(is_currently_open(&schedule, instant));
        assert_eq!(time_until_change(&schedule, instant), "Closes in 14 hrs");
    }

    #[test]
    fn evaluation_is_repeatable() {
        let schedule = every_day("22:00", "02:00");
        let instant = EvaluationInstant::at(Weekday::Thu, 23, 10);
        assert_eq!(
            OpenState::evaluate(&schedule, instant),
            OpenState::evaluate(&schedule, instant)
        );
        assert_eq!(
            time_until_change(&schedule, instant),
            time_until_change(&schedule, instant)
        );
    }

    #[test]
    fn open_state_for_a_weekday_afternoon() {
        let schedule = weekdays("9:00 AM", "5:00 PM");
        let state = OpenState::evaluate(&schedule, EvaluationInstant::at(Weekday::Mon, 15, 0));
        assert_eq!(
            state,
            OpenState {
                is_open: true,
                is_24x7: false,
                minutes_until_change: Some(120),
                change_direction: Some(ChangeDirection::Closes),
                changes_at: Some("17:00".to_string()),
                label: "Closes in 2 hrs".to_string(),
                status: ScheduleStatus::Open,
            }
        );
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["is24x7"], false);
        assert_eq!(json["changeDirection"], "closes");
        assert_eq!(json["minutesUntilChange"], 120);
        assert_eq!(json["changesAt"], "17:00");
    }

    #[test]
    fn status_flags_data_problems() {
        let instant = EvaluationInstant::at(Weekday::Mon, 10, 0);
        assert_eq!(ScheduleStatus::evaluate(&WeeklySchedule::new(), instant), ScheduleStatus::Unknown);

        let garbled = weekdays("09:00", "17:00").with_day(Weekday::Mon, DayHours::new("nine", "17:00"));
        assert_eq!(ScheduleStatus::evaluate(&garbled, instant), ScheduleStatus::Unknown);

        let half = weekdays("09:00", "17:00").with_day(Weekday::Mon, DayHours::new("09:00", ""));
        assert_eq!(ScheduleStatus::evaluate(&half, instant), ScheduleStatus::Unknown);

        let lowercase = weekdays("09:00", "17:00").with_day(Weekday::Mon, DayHours::new("9:00 pm", "11:00 pm"));
        assert!(is_currently_open(&lowercase, instant));
        assert_eq!(ScheduleStatus::evaluate(&lowercase, instant), ScheduleStatus::Unknown);

        let unspaced = weekdays("09:00", "17:00").with_day(Weekday::Mon, DayHours::new("9:00AM", "5:00PM"));
        assert_eq!(ScheduleStatus::evaluate(&unspaced, instant), ScheduleStatus::Unknown);

        let fine = weekdays("09:00", "17:00");
        assert_eq!(ScheduleStatus::evaluate(&fine, instant), ScheduleStatus::Open);
        assert_eq!(
            ScheduleStatus::evaluate(&fine, EvaluationInstant::at(Weekday::Sun, 10, 0)),
            ScheduleStatus::Closed
        );
    }

    #[test]
    fn oversized_times_degrade_without_overflow() {
        let schedule = weekdays("09:00", "17:00")
            .with_day(Weekday::Mon, DayHours::new("1:4294967295", "71582789:00"));
        let instant = EvaluationInstant::at(Weekday::Mon, 10, 0);

        // Reads as 01:00 to 00:00, an overnight window.
        let state = OpenState::evaluate(&schedule, instant);
        assert!(state.is_open);
        assert_eq!(state.minutes_until_change, Some(840));
        assert_eq!(state.changes_at.as_deref(), Some("00:00"));
        assert_eq!(state.status, ScheduleStatus::Unknown);

        let sunday = EvaluationInstant::at(Weekday::Sun, 23, 59);
        let state = OpenState::evaluate(&schedule, sunday);
        assert!(!state.is_open);
        assert_eq!(state.minutes_until_change, Some(1 + 60));
    }

    #[test]
    fn instant_from_a_zoned_datetime() {
        let datetime = London
            .from_local_datetime(
                &NaiveDate::from_ymd_opt(2024, 7, 6)
                    .unwrap()
                    .and_hms_opt(10, 30, 0)
                    .unwrap(),
            )
            .unwrap();
        let instant = EvaluationInstant::from_datetime(&datetime);
        assert_eq!(instant.weekday(), Weekday::Sat);
        assert_eq!(instant.minutes(), 630);
    }
}
