use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::timing::schedule::WeeklySchedule;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("business record is not a JSON object")]
    NotAnObject,

    #[error("business record has no usable '{0}'")]
    MissingField(&'static str),
}

/// A directory entry after normalization. Every field name here is final; the
/// alternatives seen in stored rows are resolved in `Business::from_record`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Business {
    pub id: String,
    pub name: String,
    pub slug: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub cover_image_url: Option<String>,
    pub logo_url: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub hours: WeeklySchedule,
}

const ID_KEYS: &[&str] = &["id", "business_id"];
const NAME_KEYS: &[&str] = &["name", "business_name", "title"];
const SLUG_KEYS: &[&str] = &["slug"];
const CATEGORY_KEYS: &[&str] = &["category", "category_name", "business_type"];
const DESCRIPTION_KEYS: &[&str] = &["description", "about"];
const COVER_KEYS: &[&str] = &["cover_image_url", "cover_url", "cover_image", "image_url"];
const LOGO_KEYS: &[&str] = &["logo_url", "logo", "avatar_url"];
const ADDRESS_KEYS: &[&str] = &["address", "location", "street_address"];
const PHONE_KEYS: &[&str] = &["phone", "phone_number", "contact_phone"];
const WEBSITE_KEYS: &[&str] = &["website", "website_url", "url"];
const HOURS_KEYS: &[&str] = &["hours", "opening_hours", "business_hours"];

impl Business {
    /**
    Maps a stored row of unknown shape onto `Business`.

    Each field is looked up under a list of names, first match wins. Empty strings
    and nulls count as absent. `category` may be a plain string or an object with
    a `name`. Hours may be an object or a JSON string holding one; anything else
    becomes an empty schedule. Only `id` and `name` are required.
    */
    pub fn from_record(record: &Value) -> Result<Self, NormalizeError> {
        let Value::Object(fields) = record else {
            return Err(NormalizeError::NotAnObject);
        };

        let id = first_string(fields, ID_KEYS).ok_or(NormalizeError::MissingField("id"))?;
        let name = first_string(fields, NAME_KEYS).ok_or(NormalizeError::MissingField("name"))?;
        let hours = HOURS_KEYS
            .iter()
            .filter_map(|key| fields.get(*key))
            .find(|value| !value.is_null())
            .map(WeeklySchedule::from_json)
            .unwrap_or_default();

        Ok(Self {
            id,
            name,
            slug: first_string(fields, SLUG_KEYS),
            category: first_string(fields, CATEGORY_KEYS),
            description: first_string(fields, DESCRIPTION_KEYS),
            cover_image_url: first_string(fields, COVER_KEYS),
            logo_url: first_string(fields, LOGO_KEYS),
            address: first_string(fields, ADDRESS_KEYS),
            phone: first_string(fields, PHONE_KEYS),
            website: first_string(fields, WEBSITE_KEYS),
            hours,
        })
    }

    pub fn in_category(&self, category: &str) -> bool {
        self.category
            .as_deref()
            .is_some_and(|own| own.eq_ignore_ascii_case(category.trim()))
    }
}

fn first_string(fields: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| fields.get(*key))
        .find_map(as_text)
}

fn as_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(text) => text.trim().to_string(),
        Value::Number(number) => number.to_string(),
        Value::Object(object) => return object.get("name").and_then(as_text),
        _ => return None,
    };
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}
