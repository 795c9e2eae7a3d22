use std::collections::HashSet;

use rusqlite::Connection;
use serde::Serialize;

use crate::db::{activity_repo, attendance_repo, group_repo, member_repo};
use crate::error::{RosterError, RosterResult};
use crate::model::{Activity, Attendance, AttendanceStatus, Id, Member};

/// One audience member and what has been recorded for them so far.
#[derive(Debug, Clone, Serialize)]
pub struct SheetLine {
    pub member: Member,
    pub status: Option<AttendanceStatus>,
    pub note: Option<String>,
}

pub fn attendance_for_activity(
    conn: &Connection,
    activity_id: Id<Activity>,
) -> RosterResult<Vec<Attendance>> {
    attendance_repo::find_by_activity(conn, activity_id)
}

pub fn attendance_for_member(
    conn: &Connection,
    member_id: Id<Member>,
) -> RosterResult<Vec<Attendance>> {
    attendance_repo::find_by_member(conn, member_id)
}

pub fn find_attendance(
    conn: &Connection,
    activity_id: Id<Activity>,
    member_id: Id<Member>,
) -> RosterResult<Option<Attendance>> {
    attendance_repo::find_by_pair(conn, activity_id, member_id)
}

/// The active members an activity is meant for: members of any target
/// group plus the directly targeted members, each once, sorted by name.
pub fn audience(conn: &Connection, activity_id: Id<Activity>) -> RosterResult<Vec<Member>> {
    let activity = activity_repo::find_by_id(conn, activity_id)?
        .ok_or_else(|| RosterError::not_found("Activity", activity_id))?;

    let mut candidates: Vec<Id<Member>> = Vec::new();
    for group_id in &activity.target_group_ids {
        // Targets are not re-resolved, so a group may have been deleted since.
        if let Some(group) = group_repo::find_by_id(conn, *group_id)? {
            candidates.extend(group.member_ids);
        }
    }
    candidates.extend(activity.target_member_ids.iter().copied());

    let mut seen = HashSet::new();
    let mut members = Vec::new();
    for member_id in candidates {
        if !seen.insert(member_id) {
            continue;
        }
        if let Some(member) = member_repo::find_by_id(conn, member_id)? {
            if member.is_active {
                members.push(member);
            }
        }
    }

    members.sort_by_key(|m| m.full_name());
    Ok(members)
}

/// The audience of an activity paired with any recorded attendance.
pub fn attendance_sheet(conn: &Connection, activity_id: Id<Activity>) -> RosterResult<Vec<SheetLine>> {
    let members = audience(conn, activity_id)?;
    let records = attendance_repo::find_by_activity(conn, activity_id)?;

    Ok(members
        .into_iter()
        .map(|member| {
            let record = records.iter().find(|r| r.member_id == member.id);
            SheetLine {
                status: record.map(|r| r.status),
                note: record.and_then(|r| r.note.clone()),
                member,
            }
        })
        .collect())
}
