//! Read-only statistics over activities, attendance and members.

use std::collections::HashMap;

use chrono::NaiveDate;
use rusqlite::Connection;
use serde::Serialize;

use crate::db::{activity_repo, attendance_repo, group_repo, member_repo};
use crate::error::{RosterError, RosterResult};
use crate::model::{Activity, AttendanceStatus, Id, Member, MemberGroup};
use crate::validation;

#[derive(Debug, Clone, Serialize)]
pub struct MemberAttendance {
    pub member_id: Id<Member>,
    pub name: String,
    pub present: u32,
    pub absent: u32,
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActivityAttendance {
    pub activity_id: Id<Activity>,
    pub name: String,
    pub date: NaiveDate,
    pub present: u32,
    pub absent: u32,
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MemberListing {
    pub member_id: Id<Member>,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub guardian_name: Option<String>,
    /// The first group the member joined, if any.
    pub group_name: Option<String>,
}

#[derive(Debug, Clone, Copy, Default)]
struct Tally {
    present: u32,
    absent: u32,
}

impl Tally {
    fn add(&mut self, status: AttendanceStatus) {
        match status {
            AttendanceStatus::Present => self.present += 1,
            AttendanceStatus::Absent => self.absent += 1,
        }
    }
}

/// `present / (present + absent) * 100`, and 0 when nothing was recorded.
pub fn attendance_rate(present: u32, absent: u32) -> f64 {
    let total = present + absent;
    if total == 0 {
        0.0
    } else {
        f64::from(present) / f64::from(total) * 100.0
    }
}

/// Present/absent counts per active member over activities dated within
/// `from..=to`, optionally restricted to members of one group.
pub fn attendance_report(
    conn: &Connection,
    from: NaiveDate,
    to: NaiveDate,
    group_id: Option<Id<MemberGroup>>,
) -> RosterResult<Vec<MemberAttendance>> {
    validation::not_before(from, to, "to")?;

    let members: Vec<Member> = match group_id {
        Some(g) => {
            let group = load_group(conn, g)?;
            member_repo::find_active(conn)?
                .into_iter()
                .filter(|m| group.member_ids.contains(&m.id))
                .collect()
        }
        None => member_repo::find_active(conn)?,
    };

    let mut tallies: HashMap<Id<Member>, Tally> = HashMap::new();
    for record in attendance_repo::find_in_date_range(conn, from, to)? {
        tallies.entry(record.member_id).or_default().add(record.status);
    }

    Ok(members
        .into_iter()
        .map(|m| {
            let tally = tallies.get(&m.id).copied().unwrap_or_default();
            MemberAttendance {
                name: m.full_name(),
                member_id: m.id,
                present: tally.present,
                absent: tally.absent,
                percentage: attendance_rate(tally.present, tally.absent),
            }
        })
        .collect())
}

/// Present/absent counts per activity dated within `from..=to`. With a
/// group, only activities targeting that group are listed.
pub fn activities_report(
    conn: &Connection,
    from: NaiveDate,
    to: NaiveDate,
    group_id: Option<Id<MemberGroup>>,
) -> RosterResult<Vec<ActivityAttendance>> {
    validation::not_before(from, to, "to")?;

    if let Some(g) = group_id {
        load_group(conn, g)?;
    }

    let activities: Vec<Activity> = activity_repo::find_in_range(conn, from, to)?
        .into_iter()
        .filter(|a| group_id.map_or(true, |g| a.target_group_ids.contains(&g)))
        .collect();

    let mut tallies: HashMap<Id<Activity>, Tally> = HashMap::new();
    for record in attendance_repo::find_in_date_range(conn, from, to)? {
        tallies.entry(record.activity_id).or_default().add(record.status);
    }

    Ok(activities
        .into_iter()
        .map(|a| {
            let tally = tallies.get(&a.id).copied().unwrap_or_default();
            ActivityAttendance {
                activity_id: a.id,
                name: a.name,
                date: a.date,
                present: tally.present,
                absent: tally.absent,
                percentage: attendance_rate(tally.present, tally.absent),
            }
        })
        .collect())
}

/// Active members with contact details and one group name.
pub fn members_report(
    conn: &Connection,
    group_id: Option<Id<MemberGroup>>,
) -> RosterResult<Vec<MemberListing>> {
    if let Some(g) = group_id {
        load_group(conn, g)?;
    }

    let group_names: HashMap<Id<MemberGroup>, String> = group_repo::find_all(conn)?
        .into_iter()
        .map(|g| (g.id, g.name))
        .collect();

    Ok(member_repo::find_active(conn)?
        .into_iter()
        .filter(|m| group_id.map_or(true, |g| m.group_ids.contains(&g)))
        .map(|m| MemberListing {
            name: m.full_name(),
            member_id: m.id,
            group_name: m.group_ids.first().and_then(|g| group_names.get(g).cloned()),
            email: m.email,
            phone: m.phone,
            guardian_name: m.guardian_name,
        })
        .collect())
}

fn load_group(conn: &Connection, group_id: Id<MemberGroup>) -> RosterResult<MemberGroup> {
    group_repo::find_by_id(conn, group_id)?
        .ok_or_else(|| RosterError::not_found("MemberGroup", group_id))
}
