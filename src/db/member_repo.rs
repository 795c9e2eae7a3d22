use rusqlite::{params, Connection};

use crate::db::{membership_repo, parse_optional_date};
use crate::error::RosterResult;
use crate::model::{Id, Member};

const MEMBER_COLUMNS: &str = "id, first_name, last_name, email, phone, birth_date, guardian_name,
     guardian_phone, guardian_email, notes, is_active";

/// Inserts the member row only; group edges are written by `membership_repo`.
pub fn insert(conn: &Connection, member: &Member) -> RosterResult<()> {
    conn.execute(
        "INSERT INTO members (id, first_name, last_name, email, phone, birth_date, guardian_name,
         guardian_phone, guardian_email, notes, is_active)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            member.id,
            member.first_name,
            member.last_name,
            member.email,
            member.phone,
            member.birth_date.map(|d| d.to_string()),
            member.guardian_name,
            member.guardian_phone,
            member.guardian_email,
            member.notes,
            member.is_active as i32,
        ],
    )?;
    Ok(())
}

pub fn update(conn: &Connection, member: &Member) -> RosterResult<()> {
    conn.execute(
        "UPDATE members SET first_name = ?1, last_name = ?2, email = ?3, phone = ?4, birth_date = ?5,
         guardian_name = ?6, guardian_phone = ?7, guardian_email = ?8, notes = ?9, is_active = ?10,
         updated_at = datetime('now')
         WHERE id = ?11",
        params![
            member.first_name,
            member.last_name,
            member.email,
            member.phone,
            member.birth_date.map(|d| d.to_string()),
            member.guardian_name,
            member.guardian_phone,
            member.guardian_email,
            member.notes,
            member.is_active as i32,
            member.id,
        ],
    )?;
    Ok(())
}

pub fn exists(conn: &Connection, id: Id<Member>) -> RosterResult<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM members WHERE id = ?1",
        params![id],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

pub fn find_by_id(conn: &Connection, id: Id<Member>) -> RosterResult<Option<Member>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM members WHERE id = ?1",
        MEMBER_COLUMNS
    ))?;

    let result = stmt.query_row(params![id], |row| Ok(row_to_member(row)));

    match result {
        Ok(member) => Ok(Some(with_groups(conn, member?)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn find_all(conn: &Connection) -> RosterResult<Vec<Member>> {
    find_where(conn, "1 = 1")
}

pub fn find_active(conn: &Connection) -> RosterResult<Vec<Member>> {
    find_where(conn, "is_active = 1")
}

pub fn find_inactive(conn: &Connection) -> RosterResult<Vec<Member>> {
    find_where(conn, "is_active = 0")
}

pub fn find_by_name(conn: &Connection, query: &str) -> RosterResult<Vec<Member>> {
    let pattern = format!("%{}%", query.to_lowercase());
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM members
         WHERE LOWER(first_name || ' ' || last_name) LIKE ?1
         ORDER BY first_name, last_name",
        MEMBER_COLUMNS
    ))?;

    let members = stmt
        .query_map(params![pattern], |row| Ok(row_to_member(row)))?
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .collect::<RosterResult<Vec<_>>>()?;

    members.into_iter().map(|m| with_groups(conn, m)).collect()
}

fn find_where(conn: &Connection, filter: &str) -> RosterResult<Vec<Member>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM members WHERE {} ORDER BY first_name, last_name",
        MEMBER_COLUMNS, filter
    ))?;

    let members = stmt
        .query_map([], |row| Ok(row_to_member(row)))?
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .collect::<RosterResult<Vec<_>>>()?;

    members.into_iter().map(|m| with_groups(conn, m)).collect()
}

fn with_groups(conn: &Connection, mut member: Member) -> RosterResult<Member> {
    member.group_ids = membership_repo::group_ids_for_member(conn, member.id)?;
    Ok(member)
}

fn row_to_member(row: &rusqlite::Row) -> RosterResult<Member> {
    let birth_date: Option<String> = row.get(5)?;

    Ok(Member {
        id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        email: row.get(3)?,
        phone: row.get(4)?,
        birth_date: parse_optional_date(birth_date)?,
        guardian_name: row.get(6)?,
        guardian_phone: row.get(7)?,
        guardian_email: row.get(8)?,
        notes: row.get(9)?,
        group_ids: Vec::new(),
        is_active: row.get::<_, i32>(10)? != 0,
    })
}
