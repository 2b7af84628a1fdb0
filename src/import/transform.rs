//! Legacy-to-local entity mapping
//!
//! Converts parsed Nova resources into the field sets the repositories
//! persist. Transformation never gates inclusion: by the time these run,
//! the status rules have already decided what survives, so unmapped values
//! degrade to safe defaults instead of erroring.

use chrono::{DateTime, NaiveTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::import::status::{ApplicationStatus, categorize};
use crate::models::signup::SignupStatus;
use crate::nova::{NovaClient, NovaError, NovaResource};
use crate::repositories::{NewSignup, NewUser};

/// Shift type applied when no surviving signup carries a position name.
pub const GENERAL_VOLUNTEERING: &str = "General Volunteering";

/// Prefix of the human-readable back-reference written into shift notes.
pub const LEGACY_REF_PREFIX: &str = "Nova ID: ";

/// Start of day applied when a legacy event has no start time.
const DEFAULT_START_TIME: (u32, u32) = (9, 0);

#[derive(Debug, Error)]
pub enum TransformError {
    #[error("legacy event {0} has no usable date")]
    EventWithoutDate(i64),

    #[error("legacy user {0} has no email")]
    UserWithoutEmail(i64),

    #[error(transparent)]
    Nova(#[from] NovaError),
}

/// Shift fields derived from a legacy event, before the shift type has been
/// resolved to a local row.
#[derive(Debug, Clone)]
pub struct ShiftDraft {
    pub type_name: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub capacity: i32,
    pub location: Option<String>,
    pub notes: String,
    pub legacy_event_id: i64,
}

/// Derive shift fields from a legacy event and the position names of its
/// surviving signups (one entry per signup, `None` where the application
/// carried no position).
///
/// The shift type is the majority position name, the capacity falls back to
/// the surviving signup count when the event does not state one, and the
/// notes preserve any legacy free text ahead of the mandatory back-reference
/// token.
pub fn transform_event(
    event: &NovaResource,
    positions: &[Option<String>],
) -> Result<ShiftDraft, TransformError> {
    let date = event
        .date_field("date")
        .ok_or(TransformError::EventWithoutDate(event.id))?;

    let start_time = event.time_field("start_time").unwrap_or_else(|| {
        NaiveTime::from_hms_opt(DEFAULT_START_TIME.0, DEFAULT_START_TIME.1, 0)
            .expect("default start time is valid")
    });
    let starts_at = date.and_time(start_time).and_utc();

    let ends_at = event
        .time_field("end_time")
        .map(|end| date.and_time(end).and_utc())
        .filter(|end| *end >= starts_at)
        .unwrap_or(starts_at);

    let capacity = event
        .i64_field("volunteers_needed")
        .and_then(|n| i32::try_from(n).ok())
        .filter(|n| *n > 0)
        .unwrap_or(positions.len() as i32);

    let notes = match event.str_field("note") {
        Some(note) => format!("{}\n\n{}{}", note, LEGACY_REF_PREFIX, event.id),
        None => format!("{}{}", LEGACY_REF_PREFIX, event.id),
    };

    Ok(ShiftDraft {
        type_name: majority_position(positions),
        starts_at,
        ends_at,
        capacity,
        location: event.str_field("location").map(str::to_string),
        notes,
        legacy_event_id: event.id,
    })
}

/// Most frequent position name, ties broken by first appearance so the
/// result is stable across runs.
fn majority_position(positions: &[Option<String>]) -> String {
    let mut counts: Vec<(&str, usize)> = Vec::new();

    for name in positions.iter().flatten() {
        let name = name.trim();
        if name.is_empty() {
            continue;
        }
        match counts.iter_mut().find(|(seen, _)| *seen == name) {
            Some((_, count)) => *count += 1,
            None => counts.push((name, 1)),
        }
    }

    counts
        .iter()
        .max_by_key(|(_, count)| *count)
        .map(|(name, _)| name.to_string())
        .unwrap_or_else(|| GENERAL_VOLUNTEERING.to_string())
}

/// Derive signup fields from a legacy event application.
///
/// The status mapping shares `categorize` with the inclusion rules so the
/// two can never disagree; anything unmapped lands on `confirmed`, the safe
/// default for an application that already passed the filter.
pub fn transform_signup(signup: &NovaResource, user_id: Uuid, shift_id: Uuid) -> NewSignup {
    let status = match categorize(
        signup.belongs_to("application_status"),
        signup.str_field("application_status"),
    ) {
        Some(ApplicationStatus::Attended) => SignupStatus::Attended,
        Some(ApplicationStatus::Pending) => SignupStatus::Pending,
        _ => SignupStatus::Confirmed,
    };

    NewSignup {
        user_id,
        shift_id,
        status,
        created_at: signup.datetime_field("created_at"),
        updated_at: signup.datetime_field("updated_at"),
    }
}

/// Derive local user fields from a legacy user record.
///
/// Search results are abbreviated projections; when the name fields are
/// missing, the full record is fetched by id before giving up on them.
pub async fn transform_user(
    user: &NovaResource,
    client: &NovaClient,
) -> Result<NewUser, TransformError> {
    let email = user
        .str_field("email")
        .ok_or(TransformError::UserWithoutEmail(user.id))?
        .to_lowercase();

    let mut first_name = user.str_field("first_name").map(str::to_string);
    let mut last_name = user.str_field("last_name").map(str::to_string);
    let mut phone = user.str_field("phone").map(str::to_string);

    if first_name.is_none() || last_name.is_none() {
        if let Some(full) = client.fetch_user(user.id).await? {
            first_name = first_name.or_else(|| full.str_field("first_name").map(str::to_string));
            last_name = last_name.or_else(|| full.str_field("last_name").map(str::to_string));
            phone = phone.or_else(|| full.str_field("phone").map(str::to_string));
        }
    }

    Ok(NewUser {
        email,
        first_name: first_name.unwrap_or_else(|| "Unknown".to_string()),
        last_name: last_name.unwrap_or_else(|| "Unknown".to_string()),
        phone,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(fields: serde_json::Value) -> NovaResource {
        NovaResource::from_value(&json!({"id": {"value": 917}, "fields": fields})).unwrap()
    }

    fn positions(names: &[&str]) -> Vec<Option<String>> {
        names.iter().map(|n| Some(n.to_string())).collect()
    }

    #[test]
    fn event_maps_times_location_and_capacity() {
        let event = event(json!([
            {"attribute": "date", "value": "2024-05-01"},
            {"attribute": "start_time", "value": "09:00"},
            {"attribute": "end_time", "value": "13:30"},
            {"attribute": "location", "value": "Main Hall"},
            {"attribute": "volunteers_needed", "value": 12}
        ]));

        let draft = transform_event(&event, &positions(&["Kitchen Help"])).unwrap();

        assert_eq!(draft.starts_at.to_rfc3339(), "2024-05-01T09:00:00+00:00");
        assert_eq!(draft.ends_at.to_rfc3339(), "2024-05-01T13:30:00+00:00");
        assert_eq!(draft.location.as_deref(), Some("Main Hall"));
        assert_eq!(draft.capacity, 12);
        assert_eq!(draft.legacy_event_id, 917);
    }

    #[test]
    fn event_without_date_is_an_error() {
        let event = event(json!([{"attribute": "start_time", "value": "09:00"}]));
        assert!(matches!(
            transform_event(&event, &[]),
            Err(TransformError::EventWithoutDate(917))
        ));
    }

    #[test]
    fn missing_times_fall_back() {
        let event = event(json!([{"attribute": "date", "value": "2024-05-01"}]));
        let draft = transform_event(&event, &positions(&["Driver", "Driver"])).unwrap();

        // Default start, end collapses to start, capacity from signup count.
        assert_eq!(draft.starts_at.to_rfc3339(), "2024-05-01T09:00:00+00:00");
        assert_eq!(draft.ends_at, draft.starts_at);
        assert_eq!(draft.capacity, 2);
    }

    #[test]
    fn end_before_start_collapses_to_start() {
        let event = event(json!([
            {"attribute": "date", "value": "2024-05-01"},
            {"attribute": "start_time", "value": "18:00"},
            {"attribute": "end_time", "value": "06:00"}
        ]));
        let draft = transform_event(&event, &positions(&["Driver"])).unwrap();
        assert_eq!(draft.ends_at, draft.starts_at);
    }

    #[test]
    fn notes_preserve_legacy_text_and_back_reference() {
        let with_note = event(json!([
            {"attribute": "date", "value": "2024-05-01"},
            {"attribute": "note", "value": "Bring gloves"}
        ]));
        let draft = transform_event(&with_note, &[]).unwrap();
        assert_eq!(draft.notes, "Bring gloves\n\nNova ID: 917");

        let without_note = event(json!([{"attribute": "date", "value": "2024-05-01"}]));
        let draft = transform_event(&without_note, &[]).unwrap();
        assert_eq!(draft.notes, "Nova ID: 917");
    }

    #[test]
    fn shift_type_is_majority_position() {
        let event = event(json!([{"attribute": "date", "value": "2024-05-01"}]));

        let draft = transform_event(
            &event,
            &positions(&["Driver", "Kitchen Help", "Kitchen Help"]),
        )
        .unwrap();
        assert_eq!(draft.type_name, "Kitchen Help");
    }

    #[test]
    fn shift_type_tie_breaks_by_first_appearance() {
        let event = event(json!([{"attribute": "date", "value": "2024-05-01"}]));
        let draft = transform_event(&event, &positions(&["Driver", "Kitchen Help"])).unwrap();
        assert_eq!(draft.type_name, "Driver");
    }

    #[test]
    fn shift_type_defaults_without_positions() {
        let event = event(json!([{"attribute": "date", "value": "2024-05-01"}]));

        let draft = transform_event(&event, &[None, None]).unwrap();
        assert_eq!(draft.type_name, GENERAL_VOLUNTEERING);
        // The two position-less signups still count toward capacity.
        assert_eq!(draft.capacity, 2);
    }

    #[test]
    fn signup_status_maps_through_shared_categories() {
        let user_id = Uuid::new_v4();
        let shift_id = Uuid::new_v4();

        let signup = |status_id: i64, name: &str| {
            NovaResource::from_value(&json!({
                "id": {"value": 1},
                "fields": [
                    {"attribute": "application_status", "value": name, "belongsToId": status_id},
                    {"attribute": "created_at", "value": "2024-04-20T08:30:00Z"},
                    {"attribute": "updated_at", "value": "2024-04-21T08:30:00Z"}
                ]
            }))
            .unwrap()
        };

        let attended = transform_signup(&signup(5, "Attended"), user_id, shift_id);
        assert_eq!(attended.status, SignupStatus::Attended);
        assert_eq!(
            attended.created_at.unwrap().to_rfc3339(),
            "2024-04-20T08:30:00+00:00"
        );

        let pending = transform_signup(&signup(1, "Pending"), user_id, shift_id);
        assert_eq!(pending.status, SignupStatus::Pending);

        let accepted = transform_signup(&signup(2, "Accepted"), user_id, shift_id);
        assert_eq!(accepted.status, SignupStatus::Confirmed);
    }

    #[test]
    fn unmapped_signup_status_degrades_to_confirmed() {
        let signup = NovaResource::from_value(&json!({
            "id": {"value": 1},
            "fields": []
        }))
        .unwrap();

        let mapped = transform_signup(&signup, Uuid::new_v4(), Uuid::new_v4());
        assert_eq!(mapped.status, SignupStatus::Confirmed);
        assert!(mapped.created_at.is_none());
    }
}
