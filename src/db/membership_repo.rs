//! The group/member edge set. `Member::group_ids` and
//! `MemberGroup::member_ids` are both read from here, so the two views
//! cannot disagree.

use rusqlite::{params, Connection};

use crate::error::RosterResult;
use crate::model::{Id, Member, MemberGroup};

/// Adds the edge if it is not already present.
pub fn link(conn: &Connection, group_id: Id<MemberGroup>, member_id: Id<Member>) -> RosterResult<bool> {
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO group_members (group_id, member_id) VALUES (?1, ?2)",
        params![group_id, member_id],
    )?;
    Ok(inserted > 0)
}

pub fn unlink(conn: &Connection, group_id: Id<MemberGroup>, member_id: Id<Member>) -> RosterResult<bool> {
    let removed = conn.execute(
        "DELETE FROM group_members WHERE group_id = ?1 AND member_id = ?2",
        params![group_id, member_id],
    )?;
    Ok(removed > 0)
}

pub fn unlink_group(conn: &Connection, group_id: Id<MemberGroup>) -> RosterResult<usize> {
    Ok(conn.execute(
        "DELETE FROM group_members WHERE group_id = ?1",
        params![group_id],
    )?)
}

pub fn group_ids_for_member(conn: &Connection, member_id: Id<Member>) -> RosterResult<Vec<Id<MemberGroup>>> {
    let mut stmt =
        conn.prepare("SELECT group_id FROM group_members WHERE member_id = ?1 ORDER BY rowid")?;
    let ids = stmt
        .query_map(params![member_id], |row| row.get(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ids)
}

pub fn member_ids_for_group(conn: &Connection, group_id: Id<MemberGroup>) -> RosterResult<Vec<Id<Member>>> {
    let mut stmt =
        conn.prepare("SELECT member_id FROM group_members WHERE group_id = ?1 ORDER BY rowid")?;
    let ids = stmt
        .query_map(params![group_id], |row| row.get(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ids)
}
