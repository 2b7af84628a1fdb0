//! Typed view over Nova's field-array resource envelopes.
//!
//! The legacy admin API represents every record as
//! `{id: {value}, fields: [{attribute, value, belongsToId?}]}`. Resources are
//! parsed once, here, into a map keyed by attribute name; callers use the
//! typed accessors and never re-scan raw arrays.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde_json::Value as JsonValue;
use std::collections::HashMap;

/// A single attribute slot on a Nova resource.
///
/// `value` holds the display value (string, number, bool); `belongs_to_id`
/// holds the related record's id for relation fields. Either may be absent.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldValue {
    pub value: Option<JsonValue>,
    pub belongs_to_id: Option<i64>,
}

/// A parsed Nova resource: legacy id plus its attribute map.
#[derive(Debug, Clone)]
pub struct NovaResource {
    pub id: i64,
    fields: HashMap<String, FieldValue>,
}

impl NovaResource {
    /// Parse a resource envelope. Returns `None` when the envelope has no
    /// usable integer id; such records are unaddressable and get skipped
    /// upstream.
    pub fn from_value(value: &JsonValue) -> Option<Self> {
        let id = value.get("id")?.get("value").and_then(json_as_i64)?;

        let mut fields = HashMap::new();
        if let Some(entries) = value.get("fields").and_then(JsonValue::as_array) {
            for entry in entries {
                let Some(attribute) = entry.get("attribute").and_then(JsonValue::as_str) else {
                    continue;
                };

                let field_value = entry
                    .get("value")
                    .filter(|v| !v.is_null())
                    .cloned();
                let belongs_to_id = entry.get("belongsToId").and_then(json_as_i64);

                fields.insert(
                    attribute.to_string(),
                    FieldValue {
                        value: field_value,
                        belongs_to_id,
                    },
                );
            }
        }

        Some(Self { id, fields })
    }

    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Display value of an attribute as a string, if present and non-empty.
    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)?
            .value
            .as_ref()?
            .as_str()
            .filter(|s| !s.trim().is_empty())
    }

    /// Integer value of an attribute; tolerates numbers serialized as strings.
    pub fn i64_field(&self, name: &str) -> Option<i64> {
        let value = self.fields.get(name)?.value.as_ref()?;
        json_as_i64(value)
    }

    /// Related record id of a belongs-to attribute.
    pub fn belongs_to(&self, name: &str) -> Option<i64> {
        self.fields.get(name)?.belongs_to_id
    }

    /// Attribute parsed as a `YYYY-MM-DD` date.
    pub fn date_field(&self, name: &str) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(self.str_field(name)?, "%Y-%m-%d").ok()
    }

    /// Attribute parsed as an `HH:MM` (or `HH:MM:SS`) time of day.
    pub fn time_field(&self, name: &str) -> Option<NaiveTime> {
        let raw = self.str_field(name)?;
        NaiveTime::parse_from_str(raw, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
            .ok()
    }

    /// Attribute parsed as an RFC 3339 timestamp.
    pub fn datetime_field(&self, name: &str) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(self.str_field(name)?)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

fn json_as_i64(value: &JsonValue) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
}
