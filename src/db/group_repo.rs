use rusqlite::{params, Connection};

use crate::db::membership_repo;
use crate::error::RosterResult;
use crate::model::{Id, MemberGroup};

/// Inserts the group row only; member edges are written by `membership_repo`.
pub fn insert(conn: &Connection, group: &MemberGroup) -> RosterResult<()> {
    conn.execute(
        "INSERT INTO member_groups (id, name, color, description) VALUES (?1, ?2, ?3, ?4)",
        params![group.id, group.name, group.color, group.description],
    )?;
    Ok(())
}

pub fn update(conn: &Connection, group: &MemberGroup) -> RosterResult<()> {
    conn.execute(
        "UPDATE member_groups SET name = ?1, color = ?2, description = ?3 WHERE id = ?4",
        params![group.name, group.color, group.description, group.id],
    )?;
    Ok(())
}

/// Removes the group row and drops it from activity target lists.
/// Callers must drop its member edges first.
pub fn delete(conn: &Connection, group_id: Id<MemberGroup>) -> RosterResult<()> {
    conn.execute(
        "DELETE FROM activity_target_groups WHERE group_id = ?1",
        params![group_id],
    )?;
    conn.execute("DELETE FROM member_groups WHERE id = ?1", params![group_id])?;
    Ok(())
}

pub fn exists(conn: &Connection, id: Id<MemberGroup>) -> RosterResult<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM member_groups WHERE id = ?1",
        params![id],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

pub fn find_by_id(conn: &Connection, id: Id<MemberGroup>) -> RosterResult<Option<MemberGroup>> {
    let mut stmt =
        conn.prepare("SELECT id, name, color, description FROM member_groups WHERE id = ?1")?;

    let result = stmt.query_row(params![id], |row| {
        Ok(MemberGroup {
            id: row.get(0)?,
            name: row.get(1)?,
            color: row.get(2)?,
            description: row.get(3)?,
            member_ids: Vec::new(),
        })
    });

    match result {
        Ok(mut group) => {
            group.member_ids = membership_repo::member_ids_for_group(conn, group.id)?;
            Ok(Some(group))
        }
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn find_all(conn: &Connection) -> RosterResult<Vec<MemberGroup>> {
    let mut stmt =
        conn.prepare("SELECT id, name, color, description FROM member_groups ORDER BY name")?;

    let groups: Vec<MemberGroup> = stmt
        .query_map([], |row| {
            Ok(MemberGroup {
                id: row.get(0)?,
                name: row.get(1)?,
                color: row.get(2)?,
                description: row.get(3)?,
                member_ids: Vec::new(),
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    groups
        .into_iter()
        .map(|mut g| {
            g.member_ids = membership_repo::member_ids_for_group(conn, g.id)?;
            Ok(g)
        })
        .collect()
}

pub fn find_by_name(conn: &Connection, name: &str) -> RosterResult<Option<MemberGroup>> {
    Ok(find_all(conn)?
        .into_iter()
        .find(|g| g.name.eq_ignore_ascii_case(name)))
}
