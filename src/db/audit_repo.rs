use rusqlite::{params, Connection};

use crate::db::parse_timestamp;
use crate::error::RosterResult;
use crate::model::AuditEntry;

pub fn append(conn: &Connection, entry: &AuditEntry) -> RosterResult<()> {
    conn.execute(
        "INSERT INTO audit_log (id, actor, action, target, details, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            entry.id,
            entry.actor,
            entry.action,
            entry.target,
            entry.details,
            entry.at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

/// Newest entries first.
pub fn find_recent(conn: &Connection, limit: usize) -> RosterResult<Vec<AuditEntry>> {
    let mut stmt = conn.prepare(
        "SELECT id, actor, action, target, details, created_at
         FROM audit_log ORDER BY rowid DESC LIMIT ?1",
    )?;

    let rows = stmt
        .query_map(params![limit as i64], |row| Ok(row_to_entry(row)))?
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .collect::<RosterResult<Vec<_>>>()?;

    Ok(rows)
}

fn row_to_entry(row: &rusqlite::Row) -> RosterResult<AuditEntry> {
    let at: String = row.get(5)?;

    Ok(AuditEntry {
        id: row.get(0)?,
        actor: row.get(1)?,
        action: row.get(2)?,
        target: row.get(3)?,
        details: row.get(4)?,
        at: parse_timestamp(&at)?,
    })
}
