pub mod member_ops;
pub mod group_ops;
pub mod activity_ops;
pub mod attendance_ops;

mod membership;

use chrono::Utc;
use rusqlite::Connection;
use tracing::warn;

use crate::db::audit_repo;
use crate::model::{AuditEntry, Id, User};

/// Appends to the audit log after a committed mutation. Failures are
/// logged and otherwise ignored.
pub(crate) fn audit(
    conn: &Connection,
    actor: Id<User>,
    action: &str,
    target: impl ToString,
    details: Option<String>,
) {
    let entry = AuditEntry {
        id: Id::generate(),
        actor,
        action: action.to_string(),
        target: target.to_string(),
        details,
        at: Utc::now(),
    };
    if let Err(e) = audit_repo::append(conn, &entry) {
        warn!(action, error = %e, "failed to write audit entry");
    }
}

/// Drops repeated ids, keeping the first occurrence of each.
pub(crate) fn dedup_ids<T>(ids: &[Id<T>]) -> Vec<Id<T>> {
    let mut seen = std::collections::HashSet::new();
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}
