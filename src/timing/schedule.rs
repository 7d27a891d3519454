use chrono::Weekday;
use serde::{ser::SerializeMap, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use super::daily::DayHours;

pub const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

pub fn day_key(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "monday",
        Weekday::Tue => "tuesday",
        Weekday::Wed => "wednesday",
        Weekday::Thu => "thursday",
        Weekday::Fri => "friday",
        Weekday::Sat => "saturday",
        Weekday::Sun => "sunday",
    }
}

/// Opening hours for a week, one optional entry per day starting on Monday.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WeeklySchedule {
    timings: [Option<DayHours>; 7],
}

impl WeeklySchedule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_day(mut self, weekday: Weekday, hours: DayHours) -> Self {
        self.set_day(weekday, Some(hours));
        self
    }

    pub fn set_day(&mut self, weekday: Weekday, hours: Option<DayHours>) {
        self.timings[weekday.num_days_from_monday() as usize] = hours;
    }

    pub fn day(&self, weekday: Weekday) -> Option<&DayHours> {
        self.timings[weekday.num_days_from_monday() as usize].as_ref()
    }

    /// Today's hours, skipping entries with an empty end.
    pub fn hours_on(&self, weekday: Weekday) -> Option<&DayHours> {
        self.day(weekday).filter(|hours| hours.has_hours())
    }

    pub fn has_any_hours(&self) -> bool {
        WEEK.iter().any(|weekday| self.hours_on(*weekday).is_some())
    }

    /**
    Builds a schedule out of whatever JSON the record carried.

    Day keys match case-insensitively and unknown keys are dropped. A day whose
    value is not an object, or whose `open`/`close` are not strings, ends up as
    a closed day instead of an error. A JSON string holding an encoded object is
    decoded first, since some rows store hours that way.
    */
    pub fn from_json(value: &Value) -> Self {
        let mut schedule = Self::new();
        let object = match value {
            Value::Object(object) => object.clone(),
            Value::String(text) => match serde_json::from_str::<Value>(text) {
                Ok(Value::Object(object)) => object,
                _ => return schedule,
            },
            _ => return schedule,
        };

        for (key, day_value) in object.iter() {
            let Some(weekday) = WEEK
                .iter()
                .find(|weekday| day_key(**weekday).eq_ignore_ascii_case(key.trim()))
            else {
                continue;
            };
            let hours = match day_value {
                Value::Object(fields) => {
                    let open = fields.get("open").and_then(Value::as_str).unwrap_or("");
                    let close = fields.get("close").and_then(Value::as_str).unwrap_or("");
                    Some(DayHours::new(open, close))
                }
                Value::Null => None,
                _ => Some(DayHours::new_closed()),
            };
            schedule.set_day(*weekday, hours);
        }
        schedule
    }
}

impl Serialize for WeeklySchedule {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let present = self.timings.iter().filter(|day| day.is_some()).count();
        let mut map = serializer.serialize_map(Some(present))?;
        for weekday in WEEK {
            if let Some(hours) = self.day(weekday) {
                map.serialize_entry(day_key(weekday), hours)?;
            }
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for WeeklySchedule {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::from_json(&value))
    }
}
