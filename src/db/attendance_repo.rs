use chrono::NaiveDate;
use rusqlite::{params, Connection};

use crate::db::parse_timestamp;
use crate::error::{RosterError, RosterResult};
use crate::model::{Activity, Attendance, AttendanceStatus, Id, Member};

pub fn insert(conn: &Connection, record: &Attendance) -> RosterResult<()> {
    conn.execute(
        "INSERT INTO attendance (id, activity_id, member_id, status, note, marked_by, marked_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            record.id,
            record.activity_id,
            record.member_id,
            record.status.to_db_str(),
            record.note,
            record.marked_by,
            record.marked_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

pub fn update(conn: &Connection, record: &Attendance) -> RosterResult<()> {
    conn.execute(
        "UPDATE attendance SET status = ?1, note = ?2, marked_by = ?3, marked_at = ?4 WHERE id = ?5",
        params![
            record.status.to_db_str(),
            record.note,
            record.marked_by,
            record.marked_at.to_rfc3339(),
            record.id,
        ],
    )?;
    Ok(())
}

pub fn delete_by_pair(
    conn: &Connection,
    activity_id: Id<Activity>,
    member_id: Id<Member>,
) -> RosterResult<bool> {
    let removed = conn.execute(
        "DELETE FROM attendance WHERE activity_id = ?1 AND member_id = ?2",
        params![activity_id, member_id],
    )?;
    Ok(removed > 0)
}

pub fn delete_by_activity(conn: &Connection, activity_id: Id<Activity>) -> RosterResult<usize> {
    Ok(conn.execute(
        "DELETE FROM attendance WHERE activity_id = ?1",
        params![activity_id],
    )?)
}

pub fn count_by_activity(conn: &Connection, activity_id: Id<Activity>) -> RosterResult<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM attendance WHERE activity_id = ?1",
        params![activity_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

pub fn find_by_pair(
    conn: &Connection,
    activity_id: Id<Activity>,
    member_id: Id<Member>,
) -> RosterResult<Option<Attendance>> {
    let mut stmt = conn.prepare(
        "SELECT id, activity_id, member_id, status, note, marked_by, marked_at
         FROM attendance WHERE activity_id = ?1 AND member_id = ?2",
    )?;

    let result = stmt.query_row(params![activity_id, member_id], |row| {
        Ok(row_to_attendance(row))
    });

    match result {
        Ok(record) => Ok(Some(record?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn find_by_activity(conn: &Connection, activity_id: Id<Activity>) -> RosterResult<Vec<Attendance>> {
    let mut stmt = conn.prepare(
        "SELECT id, activity_id, member_id, status, note, marked_by, marked_at
         FROM attendance WHERE activity_id = ?1 ORDER BY rowid",
    )?;

    let records = stmt
        .query_map(params![activity_id], |row| Ok(row_to_attendance(row)))?
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .collect::<RosterResult<Vec<_>>>()?;

    Ok(records)
}

/// A member's attendance history, newest activity first.
pub fn find_by_member(conn: &Connection, member_id: Id<Member>) -> RosterResult<Vec<Attendance>> {
    let mut stmt = conn.prepare(
        "SELECT att.id, att.activity_id, att.member_id, att.status, att.note, att.marked_by, att.marked_at
         FROM attendance att
         JOIN activities a ON a.id = att.activity_id
         WHERE att.member_id = ?1
         ORDER BY a.date DESC",
    )?;

    let records = stmt
        .query_map(params![member_id], |row| Ok(row_to_attendance(row)))?
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .collect::<RosterResult<Vec<_>>>()?;

    Ok(records)
}

/// Attendance belonging to activities dated within `from..=to`.
pub fn find_in_date_range(
    conn: &Connection,
    from: NaiveDate,
    to: NaiveDate,
) -> RosterResult<Vec<Attendance>> {
    let mut stmt = conn.prepare(
        "SELECT att.id, att.activity_id, att.member_id, att.status, att.note, att.marked_by, att.marked_at
         FROM attendance att
         JOIN activities a ON a.id = att.activity_id
         WHERE a.date >= ?1 AND a.date <= ?2",
    )?;

    let records = stmt
        .query_map(params![from.to_string(), to.to_string()], |row| {
            Ok(row_to_attendance(row))
        })?
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .collect::<RosterResult<Vec<_>>>()?;

    Ok(records)
}

fn row_to_attendance(row: &rusqlite::Row) -> RosterResult<Attendance> {
    let status_str: String = row.get(3)?;
    let marked_at: String = row.get(6)?;

    Ok(Attendance {
        id: row.get(0)?,
        activity_id: row.get(1)?,
        member_id: row.get(2)?,
        status: AttendanceStatus::from_db_str(&status_str)
            .ok_or_else(|| RosterError::Other(format!("Unknown status: {}", status_str)))?,
        note: row.get(4)?,
        marked_by: row.get(5)?,
        marked_at: parse_timestamp(&marked_at)?,
    })
}
