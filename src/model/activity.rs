use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use super::group::MemberGroup;
use super::ids::Id;
use super::member::Member;
use super::user::User;

/// How far apart the occurrences of a recurring series are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecurrenceRule {
    Weekly,
    Biweekly,
    Monthly,
}

impl RecurrenceRule {
    pub const ALL: &'static [RecurrenceRule] = &[
        RecurrenceRule::Weekly,
        RecurrenceRule::Biweekly,
        RecurrenceRule::Monthly,
    ];

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "weekly" => Some(RecurrenceRule::Weekly),
            "biweekly" => Some(RecurrenceRule::Biweekly),
            "monthly" => Some(RecurrenceRule::Monthly),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            RecurrenceRule::Weekly => "weekly",
            RecurrenceRule::Biweekly => "biweekly",
            RecurrenceRule::Monthly => "monthly",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recurrence {
    pub rule: RecurrenceRule,
    /// Last date (inclusive) an occurrence may fall on.
    pub until: NaiveDate,
}

/// Whether an activity stands alone or heads a recurring series.
/// Generated instances are always `Single`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ActivityKind {
    Single,
    Recurring(Recurrence),
}

impl ActivityKind {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            ActivityKind::Single => "single",
            ActivityKind::Recurring(_) => "recurring",
        }
    }
}

/// A scheduled event: a standalone activity, the head of a series, or one
/// generated occurrence of a series (`parent_activity_id` set).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: Id<Activity>,
    pub name: String,
    pub description: Option<String>,
    pub date: NaiveDate,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub location: Option<String>,
    pub color: Option<String>,
    pub target_group_ids: Vec<Id<MemberGroup>>,
    pub target_member_ids: Vec<Id<Member>>,
    pub kind: ActivityKind,
    pub parent_activity_id: Option<Id<Activity>>,
    pub created_by: Id<User>,
}

impl Activity {
    pub fn create(name: String, date: NaiveDate, created_by: Id<User>) -> Self {
        Self {
            id: Id::generate(),
            name,
            description: None,
            date,
            start_time: None,
            end_time: None,
            location: None,
            color: None,
            target_group_ids: Vec::new(),
            target_member_ids: Vec::new(),
            kind: ActivityKind::Single,
            parent_activity_id: None,
            created_by,
        }
    }

    pub fn recurrence(&self) -> Option<Recurrence> {
        match self.kind {
            ActivityKind::Recurring(r) => Some(r),
            ActivityKind::Single => None,
        }
    }

    pub fn is_head(&self) -> bool {
        matches!(self.kind, ActivityKind::Recurring(_))
    }

    /// Builds the generated occurrence of this head on `date`.
    pub fn instance_on(&self, date: NaiveDate) -> Activity {
        Activity {
            id: Id::generate(),
            name: self.name.clone(),
            description: self.description.clone(),
            date,
            start_time: self.start_time,
            end_time: self.end_time,
            location: self.location.clone(),
            color: self.color.clone(),
            target_group_ids: self.target_group_ids.clone(),
            target_member_ids: self.target_member_ids.clone(),
            kind: ActivityKind::Single,
            parent_activity_id: Some(self.id),
            created_by: self.created_by,
        }
    }
}

/// Input for scheduling an activity. With `recurrence` set the activity
/// becomes the head of a series and its occurrences are generated eagerly.
#[derive(Debug, Clone)]
pub struct NewActivity {
    pub name: String,
    pub description: Option<String>,
    pub date: NaiveDate,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub location: Option<String>,
    pub color: Option<String>,
    pub target_group_ids: Vec<Id<MemberGroup>>,
    pub target_member_ids: Vec<Id<Member>>,
    pub recurrence: Option<Recurrence>,
}

impl NewActivity {
    pub fn single(name: &str, date: NaiveDate) -> Self {
        Self {
            name: name.to_string(),
            description: None,
            date,
            start_time: None,
            end_time: None,
            location: None,
            color: None,
            target_group_ids: Vec::new(),
            target_member_ids: Vec::new(),
            recurrence: None,
        }
    }

    pub fn recurring(name: &str, date: NaiveDate, rule: RecurrenceRule, until: NaiveDate) -> Self {
        Self {
            recurrence: Some(Recurrence { rule, until }),
            ..Self::single(name, date)
        }
    }
}

/// Field edits for an activity. `date` only ever applies to the targeted
/// record; the rest is what gets fanned out over a series.
#[derive(Debug, Clone, Default)]
pub struct ActivityPatch {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub date: Option<NaiveDate>,
    pub start_time: Option<Option<NaiveTime>>,
    pub end_time: Option<Option<NaiveTime>>,
    pub location: Option<Option<String>>,
    pub color: Option<Option<String>>,
    pub target_group_ids: Option<Vec<Id<MemberGroup>>>,
    pub target_member_ids: Option<Vec<Id<Member>>>,
}

impl ActivityPatch {
    pub fn apply(&self, activity: &mut Activity) {
        if let Some(date) = self.date {
            activity.date = date;
        }
        self.apply_shared(activity);
    }

    /// Applies everything except `date`.
    pub fn apply_shared(&self, activity: &mut Activity) {
        if let Some(name) = &self.name {
            activity.name = name.clone();
        }
        if let Some(description) = &self.description {
            activity.description = description.clone();
        }
        if let Some(start) = self.start_time {
            activity.start_time = start;
        }
        if let Some(end) = self.end_time {
            activity.end_time = end;
        }
        if let Some(location) = &self.location {
            activity.location = location.clone();
        }
        if let Some(color) = &self.color {
            activity.color = color.clone();
        }
        if let Some(groups) = &self.target_group_ids {
            activity.target_group_ids = groups.clone();
        }
        if let Some(members) = &self.target_member_ids {
            activity.target_member_ids = members.clone();
        }
    }
}
