// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use std::fmt;
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

use crate::ids::ApplicationId;

pub const ENTITY_NAME: &str = "Application";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ApplicationState {
    Submitted,
    Approved,
    Completed,
    Canceled,
    Rejected,
    ResubmissionRequired,
}

impl ApplicationState {
    pub const COUNT: usize = 6;

    pub const ALL: [Self; Self::COUNT] = [
        Self::Submitted,
        Self::Approved,
        Self::Completed,
        Self::Canceled,
        Self::Rejected,
        Self::ResubmissionRequired,
    ];

    /// Position of the state in [`ApplicationState::ALL`].
    pub const fn index(self) -> usize {
        match self {
            Self::Submitted => 0,
            Self::Approved => 1,
            Self::Completed => 2,
            Self::Canceled => 3,
            Self::Rejected => 4,
            Self::ResubmissionRequired => 5,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Submitted => "submitted",
            Self::Approved => "approved",
            Self::Completed => "completed",
            Self::Canceled => "canceled",
            Self::Rejected => "rejected",
            Self::ResubmissionRequired => "resubmission_required",
        }
    }

    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Submitted => "Submitted",
            Self::Approved => "Approved",
            Self::Completed => "Completed",
            Self::Canceled => "Canceled",
            Self::Rejected => "Rejected",
            Self::ResubmissionRequired => "Resubmission required",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "submitted" => Some(Self::Submitted),
            "approved" => Some(Self::Approved),
            "completed" => Some(Self::Completed),
            "canceled" => Some(Self::Canceled),
            "rejected" => Some(Self::Rejected),
            "resubmission_required" => Some(Self::ResubmissionRequired),
            _ => None,
        }
    }

    pub fn parse_stored(value: &str) -> Result<Self, CorruptRecord> {
        Self::parse(value)
            .ok_or_else(|| CorruptRecord(format!("illegal application state {value:?}")))
    }
}

/// A stored record that falls outside the closed schema this client knows.
///
/// Stores attach it to their error chain so callers can tell data
/// inconsistencies apart from transient failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorruptRecord(pub String);

impl fmt::Display for CorruptRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for CorruptRecord {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    pub created_by: String,
    pub created_date: OffsetDateTime,
    pub last_modified_by: String,
    pub last_modified_date: OffsetDateTime,
    pub details: String,
    pub appointment_date: Option<OffsetDateTime>,
    pub state: ApplicationState,
}

impl Application {
    /// Blank record for the new-item editor. The identifier is generated
    /// client side; the backend decides whether to accept it.
    pub fn draft(created_by: &str, now: OffsetDateTime) -> Self {
        Self {
            id: ApplicationId::generate(),
            created_by: created_by.to_owned(),
            created_date: now,
            last_modified_by: created_by.to_owned(),
            last_modified_date: now,
            details: String::new(),
            appointment_date: None,
            state: ApplicationState::Submitted,
        }
    }
}

pub fn format_datetime(value: OffsetDateTime) -> String {
    value
        .to_offset(UtcOffset::UTC)
        .format(format_description!(
            "[day]/[month]/[year] [hour]:[minute]"
        ))
        .unwrap_or_default()
}

pub fn format_optional_datetime(value: Option<OffsetDateTime>) -> String {
    value.map_or_else(String::new, format_datetime)
}

#[cfg(test)]
mod tests {
    use super::{Application, ApplicationState, format_datetime, format_optional_datetime};
    use time::macros::datetime;

    #[test]
    fn all_states_round_trip_through_storage_keys() {
        for (position, state) in ApplicationState::ALL.iter().enumerate() {
            assert_eq!(state.index(), position);
            assert_eq!(ApplicationState::parse(state.as_str()), Some(*state));
        }
    }

    #[test]
    fn unknown_storage_key_is_reported_as_corrupt() {
        let error = ApplicationState::parse_stored("archived").expect_err("unknown state");
        assert!(error.to_string().contains("illegal application state"));
        assert!(error.to_string().contains("archived"));
    }

    #[test]
    fn display_names_are_human_readable() {
        assert_eq!(
            ApplicationState::ResubmissionRequired.display_name(),
            "Resubmission required"
        );
        assert_eq!(ApplicationState::Canceled.display_name(), "Canceled");
    }

    #[test]
    fn datetimes_use_fixed_day_first_pattern_in_utc() {
        assert_eq!(
            format_datetime(datetime!(2026-03-07 09:05 UTC)),
            "07/03/2026 09:05"
        );
        assert_eq!(
            format_datetime(datetime!(2026-03-07 01:30 +02:00)),
            "06/03/2026 23:30"
        );
        assert_eq!(format_optional_datetime(None), "");
    }

    #[test]
    fn draft_starts_submitted_and_owned_by_creator() {
        let now = datetime!(2026-01-01 00:00 UTC);
        let draft = Application::draft("citizen", now);
        assert_eq!(draft.state, ApplicationState::Submitted);
        assert_eq!(draft.created_by, "citizen");
        assert_eq!(draft.last_modified_by, "citizen");
        assert_eq!(draft.created_date, now);
        assert!(draft.appointment_date.is_none());
    }
}
