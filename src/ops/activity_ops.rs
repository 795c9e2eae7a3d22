//! Scheduling of activities and recurring series.
//!
//! A recurring head is stored together with one generated `Single`
//! instance per later occurrence, all in one transaction. Edits and
//! deletes can fan out over "this and all future occurrences": for a head
//! that is the whole series, for an instance it is the head (when not
//! dated before the instance) plus every sibling dated on or after it.

use chrono::NaiveDate;
use rusqlite::Connection;
use serde::Serialize;
use tracing::{debug, info};

use crate::auth;
use crate::db::activity_repo;
use crate::error::{RosterError, RosterResult};
use crate::model::{
    Activity, ActivityKind, ActivityPatch, Id, Member, MemberGroup, NewActivity, Recurrence, User,
};
use crate::ops::{attendance_ops, audit, dedup_ids, membership};
use crate::recurrence;
use crate::validation::{self, trim_optional};

/// Outcome of [`fix_recurring_activities`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RepairSummary {
    pub heads_checked: usize,
    pub heads_repaired: usize,
    pub instances_created: usize,
}

/// Stores the activity and, for a recurring one, every later occurrence up
/// to the recurrence end. Returns the id of the stored (head) activity.
pub fn create_activity(
    conn: &Connection,
    caller: Option<&User>,
    new: NewActivity,
) -> RosterResult<Id<Activity>> {
    let actor = auth::require_caller(caller)?;
    let name = validation::non_blank(&new.name, "name")?;
    validation::optional_not_before(new.start_time, new.end_time, "endTime")?;

    let instance_dates = match new.recurrence {
        Some(r) => {
            validation::not_before(new.date, r.until, "recurrenceEnd")?;
            recurrence::instance_dates(new.date, r)?
        }
        None => Vec::new(),
    };

    let mut head = Activity::create(name, new.date, actor);
    head.description = trim_optional(new.description.as_deref());
    head.start_time = new.start_time;
    head.end_time = new.end_time;
    head.location = trim_optional(new.location.as_deref());
    head.color = trim_optional(new.color.as_deref());
    head.target_group_ids = dedup_ids(&new.target_group_ids);
    head.target_member_ids = dedup_ids(&new.target_member_ids);
    head.kind = new
        .recurrence
        .map_or(ActivityKind::Single, ActivityKind::Recurring);

    let tx = conn.unchecked_transaction()?;
    check_targets(&tx, &head.target_group_ids, &head.target_member_ids)?;
    activity_repo::insert(&tx, &head)?;
    for date in &instance_dates {
        activity_repo::insert(&tx, &head.instance_on(*date))?;
    }
    tx.commit()?;

    info!(
        activity_id = %head.id,
        kind = head.kind.to_db_str(),
        instances = instance_dates.len(),
        "activity created"
    );
    audit(conn, actor, "activity.create", head.id, Some(head.name.clone()));
    Ok(head.id)
}

/// Applies `patch` to the activity. With `update_all_future` the patch,
/// minus its date, is also applied to the rest of the series from this
/// occurrence on; earlier occurrences are left alone.
pub fn update_activity(
    conn: &Connection,
    caller: Option<&User>,
    activity_id: Id<Activity>,
    patch: &ActivityPatch,
    update_all_future: bool,
) -> RosterResult<Activity> {
    let actor = auth::require_caller(caller)?;
    let patch = normalize_patch(patch)?;

    let tx = conn.unchecked_transaction()?;
    let original = load(&tx, activity_id)?;
    check_targets(
        &tx,
        patch.target_group_ids.as_deref().unwrap_or_default(),
        patch.target_member_ids.as_deref().unwrap_or_default(),
    )?;

    let mut updated = original.clone();
    patch.apply(&mut updated);
    validation::optional_not_before(updated.start_time, updated.end_time, "endTime")?;
    activity_repo::update(&tx, &updated)?;

    let mut fanned_out = 0usize;
    if update_all_future {
        for mut other in future_series(&tx, &original)? {
            patch.apply_shared(&mut other);
            activity_repo::update(&tx, &other)?;
            fanned_out += 1;
        }
    }
    tx.commit()?;

    debug!(activity_id = %activity_id, fanned_out, "series update applied");
    info!(activity_id = %activity_id, update_all_future, "activity updated");
    audit(
        conn,
        actor,
        "activity.update",
        activity_id,
        Some(format!("{} related occurrence(s) updated", fanned_out)),
    );
    Ok(updated)
}

/// Deletes the activity with its attendance. With `delete_recurring` the
/// rest of the series from this occurrence on goes too. When a head is
/// removed while instances remain, the earliest remaining instance takes
/// over as head. Returns the number of activities removed.
pub fn delete_activity(
    conn: &Connection,
    caller: Option<&User>,
    activity_id: Id<Activity>,
    delete_recurring: bool,
) -> RosterResult<usize> {
    let actor = auth::require_caller(caller)?;

    let tx = conn.unchecked_transaction()?;
    let target = load(&tx, activity_id)?;

    let mut doomed = vec![target.clone()];
    if delete_recurring {
        doomed.extend(future_series(&tx, &target)?);
    }

    let mut attendance_removed = 0usize;
    for activity in &doomed {
        attendance_removed += remove(&tx, activity.id)?;
    }

    let mut promoted = None;
    for head in doomed.iter().filter(|a| a.is_head()) {
        promoted = promote_successor(&tx, head)?.or(promoted);
    }
    if delete_recurring {
        let surviving_head = promoted.or_else(|| {
            target
                .parent_activity_id
                .filter(|p| !doomed.iter().any(|a| a.id == *p))
        });
        if let Some(head_id) = surviving_head {
            close_series(&tx, head_id)?;
        }
    }
    tx.commit()?;

    info!(
        activity_id = %activity_id,
        delete_recurring,
        removed = doomed.len(),
        attendance_removed,
        "activity deleted"
    );
    if let Some(new_head) = promoted {
        info!(old_head = %activity_id, new_head = %new_head, "series head promoted");
    }
    audit(
        conn,
        actor,
        "activity.delete",
        activity_id,
        Some(format!("{} activities removed", doomed.len())),
    );
    Ok(doomed.len())
}

/// Moves the end of a recurring series. Occurrences after the new end are
/// deleted with their attendance; extending generates the occurrences
/// between the old and the new end.
pub fn change_recurrence_end(
    conn: &Connection,
    caller: Option<&User>,
    head_id: Id<Activity>,
    new_end: NaiveDate,
) -> RosterResult<Activity> {
    let actor = auth::require_caller(caller)?;

    let tx = conn.unchecked_transaction()?;
    let head = load(&tx, head_id)?;
    let (head, removed, created) = set_series_end(&tx, head, new_end)?;
    tx.commit()?;

    info!(activity_id = %head_id, %new_end, removed, created, "recurrence end changed");
    audit(
        conn,
        actor,
        "activity.change_recurrence_end",
        head_id,
        Some(new_end.to_string()),
    );
    Ok(head)
}

/// Generates the instances of every recurring head that has none. Heads
/// that already have instances are skipped, so running this repeatedly is
/// harmless.
pub fn fix_recurring_activities(conn: &Connection) -> RosterResult<RepairSummary> {
    let mut summary = RepairSummary::default();

    let tx = conn.unchecked_transaction()?;
    for head in activity_repo::find_heads(&tx)? {
        summary.heads_checked += 1;
        if activity_repo::count_by_parent(&tx, head.id)? > 0 {
            continue;
        }

        let rule = head.recurrence().ok_or_else(|| {
            RosterError::InvalidState(format!("activity {} has no recurrence rule", head.id))
        })?;
        let dates = recurrence::instance_dates(head.date, rule)?;
        if dates.is_empty() {
            continue;
        }

        for date in &dates {
            activity_repo::insert(&tx, &head.instance_on(*date))?;
        }
        debug!(activity_id = %head.id, instances = dates.len(), "series regenerated");
        summary.heads_repaired += 1;
        summary.instances_created += dates.len();
    }
    tx.commit()?;

    info!(
        heads_checked = summary.heads_checked,
        heads_repaired = summary.heads_repaired,
        instances_created = summary.instances_created,
        "recurring activities repaired"
    );
    Ok(summary)
}

/// The part of `activity`'s series that a "this and all future" edit or
/// delete also reaches, excluding `activity` itself.
fn future_series(conn: &Connection, activity: &Activity) -> RosterResult<Vec<Activity>> {
    if activity.is_head() {
        return activity_repo::find_by_parent(conn, activity.id);
    }

    let parent_id = match activity.parent_activity_id {
        Some(p) => p,
        None => return Ok(Vec::new()),
    };

    let mut series = Vec::new();
    if let Some(head) = activity_repo::find_by_id(conn, parent_id)? {
        if head.date >= activity.date {
            series.push(head);
        }
    }
    series.extend(
        activity_repo::find_by_parent(conn, parent_id)?
            .into_iter()
            .filter(|s| s.id != activity.id && s.date >= activity.date),
    );
    Ok(series)
}

/// Moves the recurrence end of `head` to `new_end`, deleting instances
/// after it and generating the ones between the old and the new end.
/// Returns the updated head with the number of instances removed and created.
fn set_series_end(
    conn: &Connection,
    mut head: Activity,
    new_end: NaiveDate,
) -> RosterResult<(Activity, usize, usize)> {
    let current = head.recurrence().ok_or_else(|| {
        RosterError::InvalidState(format!("activity {} does not head a recurring series", head.id))
    })?;
    validation::not_before(head.date, new_end, "recurrenceEnd")?;

    let wanted = Recurrence {
        rule: current.rule,
        until: new_end,
    };
    let dates = recurrence::instance_dates(head.date, wanted)?;

    let mut removed = 0usize;
    for instance in activity_repo::find_by_parent(conn, head.id)? {
        if instance.date > new_end {
            remove(conn, instance.id)?;
            removed += 1;
        }
    }

    let mut created = 0usize;
    for date in dates.into_iter().filter(|d| *d > current.until) {
        activity_repo::insert(conn, &head.instance_on(date))?;
        created += 1;
    }

    head.kind = ActivityKind::Recurring(wanted);
    activity_repo::update(conn, &head)?;
    Ok((head, removed, created))
}

/// After a "this and all future" delete, ends the surviving series on its
/// last remaining occurrence so a later repair does not bring the deleted
/// occurrences back.
fn close_series(conn: &Connection, head_id: Id<Activity>) -> RosterResult<()> {
    let head = load(conn, head_id)?;
    let until = match head.recurrence() {
        Some(r) => r.until,
        None => return Ok(()),
    };

    let last = activity_repo::find_by_parent(conn, head_id)?
        .iter()
        .map(|i| i.date)
        .fold(head.date, NaiveDate::max);
    if last < until {
        set_series_end(conn, head, last)?;
        debug!(activity_id = %head_id, until = %last, "series end moved back");
    }
    Ok(())
}

/// After `old_head` has been deleted, hands its recurrence over to the
/// earliest instance still pointing at it and re-points the others. The
/// successor's own date is the anchor for later extensions of the series.
fn promote_successor(conn: &Connection, old_head: &Activity) -> RosterResult<Option<Id<Activity>>> {
    let remaining = activity_repo::find_by_parent(conn, old_head.id)?;
    let mut successor = match remaining.into_iter().next() {
        Some(first) => first,
        None => return Ok(None),
    };

    successor.kind = old_head.kind;
    successor.parent_activity_id = None;
    activity_repo::update(conn, &successor)?;
    let moved = activity_repo::reparent(conn, old_head.id, successor.id)?;

    debug!(new_head = %successor.id, moved, "instances re-pointed to new head");
    Ok(Some(successor.id))
}

/// Deletes one activity record after its attendance. Returns the number
/// of attendance rows removed.
fn remove(conn: &Connection, activity_id: Id<Activity>) -> RosterResult<usize> {
    let attendance = attendance_ops::remove_for_activity(conn, activity_id)?;
    activity_repo::delete(conn, activity_id)?;
    Ok(attendance)
}

fn check_targets(
    conn: &Connection,
    group_ids: &[Id<MemberGroup>],
    member_ids: &[Id<Member>],
) -> RosterResult<()> {
    for group_id in group_ids {
        membership::require_group(conn, *group_id)?;
    }
    for member_id in member_ids {
        membership::require_member(conn, *member_id)?;
    }
    Ok(())
}

fn normalize_patch(patch: &ActivityPatch) -> RosterResult<ActivityPatch> {
    let mut patch = patch.clone();
    if let Some(name) = &patch.name {
        patch.name = Some(validation::non_blank(name, "name")?);
    }
    if let Some(d) = &patch.description {
        patch.description = Some(trim_optional(d.as_deref()));
    }
    if let Some(l) = &patch.location {
        patch.location = Some(trim_optional(l.as_deref()));
    }
    if let Some(c) = &patch.color {
        patch.color = Some(trim_optional(c.as_deref()));
    }
    if let Some(groups) = &patch.target_group_ids {
        patch.target_group_ids = Some(dedup_ids(groups));
    }
    if let Some(members) = &patch.target_member_ids {
        patch.target_member_ids = Some(dedup_ids(members));
    }
    Ok(patch)
}

fn load(conn: &Connection, activity_id: Id<Activity>) -> RosterResult<Activity> {
    activity_repo::find_by_id(conn, activity_id)?
        .ok_or_else(|| RosterError::not_found("Activity", activity_id))
}
