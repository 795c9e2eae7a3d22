use rusqlite::Connection;

use crate::error::RosterResult;

/// Initialize the database schema. Creates all tables if they don't exist.
///
/// `attendance.activity_id` has no `ON DELETE CASCADE`: attendance rows
/// must be deleted before their activity, otherwise the delete fails.
pub fn initialize(conn: &Connection) -> RosterResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS members (
            id TEXT PRIMARY KEY NOT NULL,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL DEFAULT '',
            email TEXT,
            phone TEXT,
            birth_date TEXT,
            guardian_name TEXT,
            guardian_phone TEXT,
            guardian_email TEXT,
            notes TEXT,
            is_active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS member_groups (
            id TEXT PRIMARY KEY NOT NULL,
            name TEXT NOT NULL,
            color TEXT,
            description TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS group_members (
            group_id TEXT NOT NULL REFERENCES member_groups(id),
            member_id TEXT NOT NULL REFERENCES members(id),
            PRIMARY KEY (group_id, member_id)
        );

        CREATE INDEX IF NOT EXISTS idx_group_members_member ON group_members(member_id);

        CREATE TABLE IF NOT EXISTS activities (
            id TEXT PRIMARY KEY NOT NULL,
            name TEXT NOT NULL,
            description TEXT,
            date TEXT NOT NULL,
            start_time TEXT,
            end_time TEXT,
            location TEXT,
            color TEXT,
            kind TEXT NOT NULL,
            recurrence_rule TEXT,
            recurrence_end TEXT,
            parent_activity_id TEXT,
            created_by TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            CHECK (kind = 'recurring' OR (recurrence_rule IS NULL AND recurrence_end IS NULL)),
            CHECK (parent_activity_id IS NULL OR kind = 'single')
        );

        CREATE INDEX IF NOT EXISTS idx_activities_parent ON activities(parent_activity_id);
        CREATE INDEX IF NOT EXISTS idx_activities_date ON activities(date);

        CREATE TABLE IF NOT EXISTS activity_target_groups (
            activity_id TEXT NOT NULL REFERENCES activities(id) ON DELETE CASCADE,
            group_id TEXT NOT NULL REFERENCES member_groups(id) ON DELETE CASCADE,
            PRIMARY KEY (activity_id, group_id)
        );

        CREATE TABLE IF NOT EXISTS activity_target_members (
            activity_id TEXT NOT NULL REFERENCES activities(id) ON DELETE CASCADE,
            member_id TEXT NOT NULL REFERENCES members(id) ON DELETE CASCADE,
            PRIMARY KEY (activity_id, member_id)
        );

        CREATE TABLE IF NOT EXISTS attendance (
            id TEXT PRIMARY KEY NOT NULL,
            activity_id TEXT NOT NULL REFERENCES activities(id),
            member_id TEXT NOT NULL REFERENCES members(id),
            status TEXT NOT NULL,
            note TEXT,
            marked_by TEXT NOT NULL,
            marked_at TEXT NOT NULL,
            UNIQUE (activity_id, member_id)
        );

        CREATE INDEX IF NOT EXISTS idx_attendance_member ON attendance(member_id);

        CREATE TABLE IF NOT EXISTS audit_log (
            id TEXT PRIMARY KEY NOT NULL,
            actor TEXT NOT NULL,
            action TEXT NOT NULL,
            target TEXT NOT NULL,
            details TEXT,
            created_at TEXT NOT NULL
        );

        PRAGMA foreign_keys = ON;
        ",
    )?;
    Ok(())
}

/// Create an in-memory connection for testing.
pub fn test_connection() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    initialize(&conn).unwrap();
    conn
}
