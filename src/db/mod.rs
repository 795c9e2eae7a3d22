pub mod schema;
pub mod member_repo;
pub mod group_repo;
pub mod membership_repo;
pub mod activity_repo;
pub mod attendance_repo;
pub mod audit_repo;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use crate::error::{RosterError, RosterResult};

pub(crate) const TIME_FORMAT: &str = "%H:%M";

pub(crate) fn parse_date(s: &str) -> RosterResult<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| RosterError::Other(format!("Invalid date: {}", e)))
}

pub(crate) fn parse_optional_date(s: Option<String>) -> RosterResult<Option<NaiveDate>> {
    s.as_deref().map(parse_date).transpose()
}

pub(crate) fn parse_optional_time(s: Option<String>) -> RosterResult<Option<NaiveTime>> {
    s.as_deref()
        .map(|t| {
            NaiveTime::parse_from_str(t, TIME_FORMAT)
                .map_err(|e| RosterError::Other(format!("Invalid time: {}", e)))
        })
        .transpose()
}

pub(crate) fn format_optional_time(t: Option<NaiveTime>) -> Option<String> {
    t.map(|t| t.format(TIME_FORMAT).to_string())
}

pub(crate) fn parse_timestamp(s: &str) -> RosterResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RosterError::Other(format!("Invalid timestamp: {}", e)))
}
