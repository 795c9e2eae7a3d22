use chrono::NaiveDate;
use rusqlite::Connection;
use serde::Serialize;

use crate::db::activity_repo;
use crate::error::{RosterError, RosterResult};
use crate::model::{Activity, Id, MemberGroup};

/// A head together with its generated instances.
#[derive(Debug, Clone, Serialize)]
pub struct Series {
    pub head: Activity,
    /// Ordered by date.
    pub instances: Vec<Activity>,
}

impl Series {
    /// Every occurrence date, head first.
    pub fn dates(&self) -> Vec<NaiveDate> {
        std::iter::once(self.head.date)
            .chain(self.instances.iter().map(|i| i.date))
            .collect()
    }
}

pub fn find_activity(conn: &Connection, activity_id: Id<Activity>) -> RosterResult<Option<Activity>> {
    activity_repo::find_by_id(conn, activity_id)
}

pub fn activities_in_range(
    conn: &Connection,
    from: NaiveDate,
    to: NaiveDate,
) -> RosterResult<Vec<Activity>> {
    activity_repo::find_in_range(conn, from, to)
}

pub fn activities_for_group(
    conn: &Connection,
    group_id: Id<MemberGroup>,
) -> RosterResult<Vec<Activity>> {
    activity_repo::find_for_group(conn, group_id)
}

/// The series `activity_id` belongs to, whether it is the head or an
/// instance. A standalone activity has no series.
pub fn series(conn: &Connection, activity_id: Id<Activity>) -> RosterResult<Series> {
    let activity = activity_repo::find_by_id(conn, activity_id)?
        .ok_or_else(|| RosterError::not_found("Activity", activity_id))?;

    let head = if activity.is_head() {
        activity
    } else {
        let parent_id = activity.parent_activity_id.ok_or_else(|| {
            RosterError::InvalidState(format!("activity {} is not part of a series", activity_id))
        })?;
        activity_repo::find_by_id(conn, parent_id)?
            .ok_or_else(|| RosterError::not_found("Activity", parent_id))?
    };

    let instances = activity_repo::find_by_parent(conn, head.id)?;
    Ok(Series { head, instances })
}
