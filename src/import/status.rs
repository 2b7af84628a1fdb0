//! Application status rules
//!
//! Pure decision logic for which legacy event applications are worth
//! importing. The rules fail closed: an application whose status cannot be
//! resolved, or whose event has no date, is excluded rather than imported as
//! a garbage row.

use chrono::{DateTime, Utc};

/// Closed set of application status categories used by the legacy system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplicationStatus {
    Pending,
    Accepted,
    Declined,
    Cancelled,
    Attended,
    NoShow,
}

/// Resolve a legacy status id and/or display name into a category.
///
/// The id is authoritative (Nova's status records are stable 1..=6); the name
/// is the fallback so an upstream id drift degrades to name resolution
/// instead of misclassification. Unknown id and unknown name resolve to
/// `None`.
pub fn categorize(status_id: Option<i64>, status_name: Option<&str>) -> Option<ApplicationStatus> {
    if let Some(status) = status_id.and_then(categorize_id) {
        return Some(status);
    }

    status_name.and_then(categorize_name)
}

fn categorize_id(id: i64) -> Option<ApplicationStatus> {
    match id {
        1 => Some(ApplicationStatus::Pending),
        2 => Some(ApplicationStatus::Accepted),
        3 => Some(ApplicationStatus::Declined),
        4 => Some(ApplicationStatus::Cancelled),
        5 => Some(ApplicationStatus::Attended),
        6 => Some(ApplicationStatus::NoShow),
        _ => None,
    }
}

fn categorize_name(name: &str) -> Option<ApplicationStatus> {
    match name.trim().to_lowercase().as_str() {
        "pending" | "applied" => Some(ApplicationStatus::Pending),
        "accepted" | "approved" | "confirmed" => Some(ApplicationStatus::Accepted),
        "declined" | "rejected" => Some(ApplicationStatus::Declined),
        "cancelled" | "canceled" | "withdrawn" => Some(ApplicationStatus::Cancelled),
        "attended" | "checked in" | "checked_in" => Some(ApplicationStatus::Attended),
        "no show" | "no_show" | "no-show" | "absent" => Some(ApplicationStatus::NoShow),
        _ => None,
    }
}

/// Decide whether a legacy application should be imported.
///
/// `now` is passed in rather than read from the clock so the decision is a
/// pure function of its inputs; the orchestrator samples the clock once per
/// run.
///
/// A completed shift only matters if the volunteer actually committed to it
/// (attended, or accepted without an attendance record). A future shift is a
/// live commitment while accepted or still pending. Declined, cancelled and
/// no-show applications never import.
pub fn should_import(
    event_date: Option<DateTime<Utc>>,
    status_id: Option<i64>,
    status_name: Option<&str>,
    now: DateTime<Utc>,
) -> bool {
    let Some(event_date) = event_date else {
        return false;
    };

    let Some(status) = categorize(status_id, status_name) else {
        return false;
    };

    let in_past = event_date < now;

    match status {
        ApplicationStatus::Attended => in_past,
        ApplicationStatus::Accepted => true,
        ApplicationStatus::Pending => !in_past,
        ApplicationStatus::Declined | ApplicationStatus::Cancelled | ApplicationStatus::NoShow => {
            false
        }
    }
}
