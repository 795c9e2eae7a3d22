use chrono::Utc;
use rusqlite::Connection;
use tracing::info;

use crate::auth;
use crate::db::{activity_repo, attendance_repo};
use crate::error::{RosterError, RosterResult};
use crate::model::{Activity, Attendance, AttendanceMark, AttendanceStatus, Id, Member, User};
use crate::ops::{audit, membership};
use crate::validation::trim_optional;

/// Records the status of one member for one activity. Marking a pair that
/// is already recorded updates that record in place.
pub fn mark(
    conn: &Connection,
    caller: Option<&User>,
    activity_id: Id<Activity>,
    member_id: Id<Member>,
    status: AttendanceStatus,
    note: Option<&str>,
) -> RosterResult<Id<Attendance>> {
    let actor = auth::require_caller(caller)?;

    let tx = conn.unchecked_transaction()?;
    require_activity(&tx, activity_id)?;
    let id = mark_one(&tx, actor, activity_id, member_id, status, trim_optional(note))?;
    tx.commit()?;

    info!(activity_id = %activity_id, member_id = %member_id, status = status.to_db_str(), "attendance marked");
    audit(conn, actor, "attendance.mark", id, Some(status.to_db_str().to_string()));
    Ok(id)
}

/// Marks several members for one activity. The batch is all-or-nothing:
/// an unknown member rolls back every entry.
pub fn bulk_mark(
    conn: &Connection,
    caller: Option<&User>,
    activity_id: Id<Activity>,
    marks: &[AttendanceMark],
) -> RosterResult<Vec<Id<Attendance>>> {
    let actor = auth::require_caller(caller)?;

    let tx = conn.unchecked_transaction()?;
    require_activity(&tx, activity_id)?;
    let ids = marks
        .iter()
        .map(|m| {
            mark_one(
                &tx,
                actor,
                activity_id,
                m.member_id,
                m.status,
                trim_optional(m.note.as_deref()),
            )
        })
        .collect::<RosterResult<Vec<_>>>()?;
    tx.commit()?;

    info!(activity_id = %activity_id, marked = ids.len(), "attendance bulk marked");
    audit(
        conn,
        actor,
        "attendance.bulk_mark",
        activity_id,
        Some(format!("{} member(s)", ids.len())),
    );
    Ok(ids)
}

/// Removes the record for a pair. Returns false if nothing was recorded.
pub fn unmark(
    conn: &Connection,
    caller: Option<&User>,
    activity_id: Id<Activity>,
    member_id: Id<Member>,
) -> RosterResult<bool> {
    let actor = auth::require_caller(caller)?;
    require_activity(conn, activity_id)?;
    membership::require_member(conn, member_id)?;

    let removed = attendance_repo::delete_by_pair(conn, activity_id, member_id)?;
    if removed {
        info!(activity_id = %activity_id, member_id = %member_id, "attendance removed");
        audit(conn, actor, "attendance.unmark", activity_id, Some(member_id.to_string()));
    }
    Ok(removed)
}

/// Deletes every attendance row of an activity. Must run before the
/// activity record itself is deleted, inside the same transaction.
pub(crate) fn remove_for_activity(conn: &Connection, activity_id: Id<Activity>) -> RosterResult<usize> {
    attendance_repo::delete_by_activity(conn, activity_id)
}

fn mark_one(
    conn: &Connection,
    actor: Id<User>,
    activity_id: Id<Activity>,
    member_id: Id<Member>,
    status: AttendanceStatus,
    note: Option<String>,
) -> RosterResult<Id<Attendance>> {
    membership::require_member(conn, member_id)?;

    match attendance_repo::find_by_pair(conn, activity_id, member_id)? {
        Some(mut record) => {
            record.status = status;
            record.note = note;
            record.marked_by = actor;
            record.marked_at = Utc::now();
            attendance_repo::update(conn, &record)?;
            Ok(record.id)
        }
        None => {
            let record = Attendance {
                id: Id::generate(),
                activity_id,
                member_id,
                status,
                note,
                marked_by: actor,
                marked_at: Utc::now(),
            };
            attendance_repo::insert(conn, &record)?;
            Ok(record.id)
        }
    }
}

fn require_activity(conn: &Connection, activity_id: Id<Activity>) -> RosterResult<()> {
    if activity_repo::exists(conn, activity_id)? {
        Ok(())
    } else {
        Err(RosterError::not_found("Activity", activity_id))
    }
}
