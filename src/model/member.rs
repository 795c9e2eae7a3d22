use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::group::MemberGroup;
use super::ids::Id;

/// A person on the membership roll.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    pub id: Id<Member>,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub guardian_name: Option<String>,
    pub guardian_phone: Option<String>,
    pub guardian_email: Option<String>,
    pub notes: Option<String>,
    /// Groups this member belongs to, in the order they were joined.
    pub group_ids: Vec<Id<MemberGroup>>,
    pub is_active: bool,
}

impl Member {
    pub fn create(first_name: String, last_name: String) -> Self {
        Self {
            id: Id::generate(),
            first_name,
            last_name,
            email: None,
            phone: None,
            birth_date: None,
            guardian_name: None,
            guardian_phone: None,
            guardian_email: None,
            notes: None,
            group_ids: Vec::new(),
            is_active: true,
        }
    }

    pub fn full_name(&self) -> String {
        if self.last_name.is_empty() {
            self.first_name.clone()
        } else {
            format!("{} {}", self.first_name, self.last_name)
        }
    }
}

/// Input for registering a new member.
#[derive(Debug, Clone, Default)]
pub struct NewMember {
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub guardian_name: Option<String>,
    pub guardian_phone: Option<String>,
    pub guardian_email: Option<String>,
    pub notes: Option<String>,
    pub group_ids: Vec<Id<MemberGroup>>,
}

/// Partial update of a member. `None` leaves a field alone; for optional
/// fields `Some(None)` clears it. A supplied `group_ids` replaces the full
/// membership set.
#[derive(Debug, Clone, Default)]
pub struct MemberPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<Option<String>>,
    pub phone: Option<Option<String>>,
    pub birth_date: Option<Option<NaiveDate>>,
    pub guardian_name: Option<Option<String>>,
    pub guardian_phone: Option<Option<String>>,
    pub guardian_email: Option<Option<String>>,
    pub notes: Option<Option<String>>,
    pub group_ids: Option<Vec<Id<MemberGroup>>>,
}
