use chrono::NaiveDate;
use rusqlite::{params, Connection};

use crate::db::{format_optional_time, parse_date, parse_optional_date, parse_optional_time};
use crate::error::{RosterError, RosterResult};
use crate::model::{Activity, ActivityKind, Id, Member, MemberGroup, Recurrence, RecurrenceRule};

const ACTIVITY_COLUMNS: &str = "id, name, description, date, start_time, end_time, location, color,
     kind, recurrence_rule, recurrence_end, parent_activity_id, created_by";

pub fn insert(conn: &Connection, activity: &Activity) -> RosterResult<()> {
    let recurrence = activity.recurrence();
    conn.execute(
        "INSERT INTO activities (id, name, description, date, start_time, end_time, location, color,
         kind, recurrence_rule, recurrence_end, parent_activity_id, created_by)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            activity.id,
            activity.name,
            activity.description,
            activity.date.to_string(),
            format_optional_time(activity.start_time),
            format_optional_time(activity.end_time),
            activity.location,
            activity.color,
            activity.kind.to_db_str(),
            recurrence.map(|r| r.rule.to_db_str()),
            recurrence.map(|r| r.until.to_string()),
            activity.parent_activity_id,
            activity.created_by,
        ],
    )?;

    write_targets(conn, activity)
}

/// Rewrites every column and the target lists of an existing activity.
pub fn update(conn: &Connection, activity: &Activity) -> RosterResult<()> {
    let recurrence = activity.recurrence();
    conn.execute(
        "UPDATE activities SET name = ?1, description = ?2, date = ?3, start_time = ?4, end_time = ?5,
         location = ?6, color = ?7, kind = ?8, recurrence_rule = ?9, recurrence_end = ?10,
         parent_activity_id = ?11
         WHERE id = ?12",
        params![
            activity.name,
            activity.description,
            activity.date.to_string(),
            format_optional_time(activity.start_time),
            format_optional_time(activity.end_time),
            activity.location,
            activity.color,
            activity.kind.to_db_str(),
            recurrence.map(|r| r.rule.to_db_str()),
            recurrence.map(|r| r.until.to_string()),
            activity.parent_activity_id,
            activity.id,
        ],
    )?;

    clear_targets(conn, activity.id)?;
    write_targets(conn, activity)
}

/// Re-points every instance of `old_parent` to `new_parent`.
pub fn reparent(
    conn: &Connection,
    old_parent: Id<Activity>,
    new_parent: Id<Activity>,
) -> RosterResult<usize> {
    Ok(conn.execute(
        "UPDATE activities SET parent_activity_id = ?1 WHERE parent_activity_id = ?2",
        params![new_parent, old_parent],
    )?)
}

/// Removes the activity row and its target lists. Attendance must already be gone.
pub fn delete(conn: &Connection, id: Id<Activity>) -> RosterResult<()> {
    clear_targets(conn, id)?;
    conn.execute("DELETE FROM activities WHERE id = ?1", params![id])?;
    Ok(())
}

pub fn exists(conn: &Connection, id: Id<Activity>) -> RosterResult<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM activities WHERE id = ?1",
        params![id],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

pub fn find_by_id(conn: &Connection, id: Id<Activity>) -> RosterResult<Option<Activity>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM activities WHERE id = ?1",
        ACTIVITY_COLUMNS
    ))?;

    let result = stmt.query_row(params![id], |row| Ok(row_to_activity(row)));

    match result {
        Ok(activity) => Ok(Some(with_targets(conn, activity?)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Instances of a series, ordered by date.
pub fn find_by_parent(conn: &Connection, parent_id: Id<Activity>) -> RosterResult<Vec<Activity>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM activities WHERE parent_activity_id = ?1 ORDER BY date, rowid",
        ACTIVITY_COLUMNS
    ))?;
    let instances = collect(conn, stmt.query_map(params![parent_id], |row| Ok(row_to_activity(row)))?);
    instances
}

pub fn count_by_parent(conn: &Connection, parent_id: Id<Activity>) -> RosterResult<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM activities WHERE parent_activity_id = ?1",
        params![parent_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

pub fn find_heads(conn: &Connection) -> RosterResult<Vec<Activity>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM activities WHERE kind = 'recurring' ORDER BY date, rowid",
        ACTIVITY_COLUMNS
    ))?;
    let heads = collect(conn, stmt.query_map([], |row| Ok(row_to_activity(row)))?);
    heads
}

/// Activities dated within `from..=to`, ordered by date and start time.
pub fn find_in_range(conn: &Connection, from: NaiveDate, to: NaiveDate) -> RosterResult<Vec<Activity>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM activities WHERE date >= ?1 AND date <= ?2
         ORDER BY date, COALESCE(start_time, ''), name",
        ACTIVITY_COLUMNS
    ))?;
    let activities = collect(
        conn,
        stmt.query_map(params![from.to_string(), to.to_string()], |row| {
            Ok(row_to_activity(row))
        })?,
    );
    activities
}

/// Activities that list `group_id` among their target groups.
pub fn find_for_group(conn: &Connection, group_id: Id<MemberGroup>) -> RosterResult<Vec<Activity>> {
    let mut stmt = conn.prepare(
        "SELECT a.id, a.name, a.description, a.date, a.start_time, a.end_time, a.location, a.color,
         a.kind, a.recurrence_rule, a.recurrence_end, a.parent_activity_id, a.created_by
         FROM activities a
         JOIN activity_target_groups t ON t.activity_id = a.id
         WHERE t.group_id = ?1
         ORDER BY a.date, a.name",
    )?;
    let activities = collect(conn, stmt.query_map(params![group_id], |row| Ok(row_to_activity(row)))?);
    activities
}

fn collect<F>(
    conn: &Connection,
    rows: rusqlite::MappedRows<'_, F>,
) -> RosterResult<Vec<Activity>>
where
    F: FnMut(&rusqlite::Row<'_>) -> rusqlite::Result<RosterResult<Activity>>,
{
    rows.collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .map(|a| with_targets(conn, a?))
        .collect()
}

fn write_targets(conn: &Connection, activity: &Activity) -> RosterResult<()> {
    for group_id in &activity.target_group_ids {
        conn.execute(
            "INSERT OR IGNORE INTO activity_target_groups (activity_id, group_id) VALUES (?1, ?2)",
            params![activity.id, group_id],
        )?;
    }
    for member_id in &activity.target_member_ids {
        conn.execute(
            "INSERT OR IGNORE INTO activity_target_members (activity_id, member_id) VALUES (?1, ?2)",
            params![activity.id, member_id],
        )?;
    }
    Ok(())
}

fn clear_targets(conn: &Connection, id: Id<Activity>) -> RosterResult<()> {
    conn.execute(
        "DELETE FROM activity_target_groups WHERE activity_id = ?1",
        params![id],
    )?;
    conn.execute(
        "DELETE FROM activity_target_members WHERE activity_id = ?1",
        params![id],
    )?;
    Ok(())
}

fn with_targets(conn: &Connection, mut activity: Activity) -> RosterResult<Activity> {
    let mut stmt = conn.prepare(
        "SELECT group_id FROM activity_target_groups WHERE activity_id = ?1 ORDER BY rowid",
    )?;
    activity.target_group_ids = stmt
        .query_map(params![activity.id], |row| row.get::<_, Id<MemberGroup>>(0))?
        .collect::<Result<Vec<_>, _>>()?;

    let mut stmt = conn.prepare(
        "SELECT member_id FROM activity_target_members WHERE activity_id = ?1 ORDER BY rowid",
    )?;
    activity.target_member_ids = stmt
        .query_map(params![activity.id], |row| row.get::<_, Id<Member>>(0))?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(activity)
}

fn row_to_activity(row: &rusqlite::Row) -> RosterResult<Activity> {
    let date: String = row.get(3)?;
    let kind_str: String = row.get(8)?;
    let rule_str: Option<String> = row.get(9)?;
    let end_str: Option<String> = row.get(10)?;

    let kind = match kind_str.as_str() {
        "single" => ActivityKind::Single,
        "recurring" => {
            let rule_str = rule_str.ok_or_else(|| {
                RosterError::InvalidState("recurring activity without recurrence rule".into())
            })?;
            let rule = RecurrenceRule::from_db_str(&rule_str)
                .ok_or_else(|| RosterError::Other(format!("Unknown recurrence rule: {}", rule_str)))?;
            let until = parse_optional_date(end_str)?.ok_or_else(|| {
                RosterError::InvalidState("recurring activity without recurrence end".into())
            })?;
            ActivityKind::Recurring(Recurrence { rule, until })
        }
        other => return Err(RosterError::Other(format!("Unknown activity kind: {}", other))),
    };

    Ok(Activity {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        date: parse_date(&date)?,
        start_time: parse_optional_time(row.get(4)?)?,
        end_time: parse_optional_time(row.get(5)?)?,
        location: row.get(6)?,
        color: row.get(7)?,
        target_group_ids: Vec::new(),
        target_member_ids: Vec::new(),
        kind,
        parent_activity_id: row.get(11)?,
        created_by: row.get(12)?,
    })
}
