use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::activity::Activity;
use super::ids::Id;
use super::member::Member;
use super::user::User;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    Absent,
}

impl AttendanceStatus {
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "present" => Some(AttendanceStatus::Present),
            "absent" => Some(AttendanceStatus::Absent),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "present",
            AttendanceStatus::Absent => "absent",
        }
    }
}

/// Whether one member attended one activity. At most one per pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attendance {
    pub id: Id<Attendance>,
    pub activity_id: Id<Activity>,
    pub member_id: Id<Member>,
    pub status: AttendanceStatus,
    pub note: Option<String>,
    pub marked_by: Id<User>,
    pub marked_at: DateTime<Utc>,
}

/// One line of a bulk marking request.
#[derive(Debug, Clone)]
pub struct AttendanceMark {
    pub member_id: Id<Member>,
    pub status: AttendanceStatus,
    pub note: Option<String>,
}

impl AttendanceMark {
    pub fn new(member_id: Id<Member>, status: AttendanceStatus) -> Self {
        Self {
            member_id,
            status,
            note: None,
        }
    }
}
