use rusqlite::Connection;

use crate::db::audit_repo;
use crate::error::RosterResult;
use crate::model::AuditEntry;

pub fn recent(conn: &Connection, limit: usize) -> RosterResult<Vec<AuditEntry>> {
    audit_repo::find_recent(conn, limit)
}
