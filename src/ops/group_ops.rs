use rusqlite::Connection;
use tracing::info;

use crate::auth;
use crate::db::{group_repo, membership_repo};
use crate::error::{RosterError, RosterResult};
use crate::model::{Id, Member, MemberGroup, User};
use crate::ops::{audit, dedup_ids, membership};
use crate::validation::{self, trim_optional};

pub fn create_group(
    conn: &Connection,
    caller: Option<&User>,
    name: &str,
    color: Option<&str>,
    description: Option<&str>,
    member_ids: Vec<Id<Member>>,
) -> RosterResult<MemberGroup> {
    let actor = auth::require_caller(caller)?;
    let valid_name = validation::non_blank(name, "name")?;

    let group = MemberGroup::create(valid_name, trim_optional(color), trim_optional(description));

    let tx = conn.unchecked_transaction()?;
    group_repo::insert(&tx, &group)?;
    membership::reconcile_group_members(&tx, group.id, &dedup_ids(&member_ids))?;
    tx.commit()?;

    let group = load(conn, group.id)?;
    info!(group_id = %group.id, members = group.member_ids.len(), "group created");
    audit(conn, actor, "group.create", group.id, Some(group.name.clone()));
    Ok(group)
}

pub fn update_group(
    conn: &Connection,
    caller: Option<&User>,
    group_id: Id<MemberGroup>,
    name: Option<&str>,
    color: Option<Option<&str>>,
    description: Option<Option<&str>>,
) -> RosterResult<MemberGroup> {
    let actor = auth::require_caller(caller)?;
    let mut group = load(conn, group_id)?;

    if let Some(n) = name {
        group.name = validation::non_blank(n, "name")?;
    }
    if let Some(c) = color {
        group.color = trim_optional(c);
    }
    if let Some(desc) = description {
        group.description = trim_optional(desc);
    }

    group_repo::update(conn, &group)?;
    info!(group_id = %group_id, "group updated");
    audit(conn, actor, "group.update", group_id, None);
    Ok(group)
}

/// Replaces the whole member list of a group.
pub fn set_group_members(
    conn: &Connection,
    caller: Option<&User>,
    group_id: Id<MemberGroup>,
    member_ids: &[Id<Member>],
) -> RosterResult<MemberGroup> {
    let actor = auth::require_caller(caller)?;

    let tx = conn.unchecked_transaction()?;
    membership::require_group(&tx, group_id)?;
    membership::reconcile_group_members(&tx, group_id, &dedup_ids(member_ids))?;
    tx.commit()?;

    let group = load(conn, group_id)?;
    info!(group_id = %group_id, members = group.member_ids.len(), "group members replaced");
    audit(conn, actor, "group.set_members", group_id, None);
    Ok(group)
}

/// Idempotent: adding an existing member changes nothing.
pub fn add_member_to_group(
    conn: &Connection,
    caller: Option<&User>,
    group_id: Id<MemberGroup>,
    member_id: Id<Member>,
) -> RosterResult<MemberGroup> {
    let actor = auth::require_caller(caller)?;

    let tx = conn.unchecked_transaction()?;
    membership::require_group(&tx, group_id)?;
    membership::require_member(&tx, member_id)?;
    let added = membership_repo::link(&tx, group_id, member_id)?;
    tx.commit()?;

    if added {
        info!(group_id = %group_id, member_id = %member_id, "member added to group");
        audit(conn, actor, "group.add_member", group_id, Some(member_id.to_string()));
    }
    load(conn, group_id)
}

/// Idempotent: removing a non-member changes nothing.
pub fn remove_member_from_group(
    conn: &Connection,
    caller: Option<&User>,
    group_id: Id<MemberGroup>,
    member_id: Id<Member>,
) -> RosterResult<MemberGroup> {
    let actor = auth::require_caller(caller)?;

    let tx = conn.unchecked_transaction()?;
    membership::require_group(&tx, group_id)?;
    membership::require_member(&tx, member_id)?;
    let removed = membership_repo::unlink(&tx, group_id, member_id)?;
    tx.commit()?;

    if removed {
        info!(group_id = %group_id, member_id = %member_id, "member removed from group");
        audit(conn, actor, "group.remove_member", group_id, Some(member_id.to_string()));
    }
    load(conn, group_id)
}

/// Removes the group from every member first, then the group itself.
/// Members are not touched otherwise.
pub fn delete_group(
    conn: &Connection,
    caller: Option<&User>,
    group_id: Id<MemberGroup>,
) -> RosterResult<()> {
    let actor = auth::require_caller(caller)?;

    let tx = conn.unchecked_transaction()?;
    let group = load(&tx, group_id)?;
    let unlinked = membership_repo::unlink_group(&tx, group_id)?;
    group_repo::delete(&tx, group_id)?;
    tx.commit()?;

    info!(group_id = %group_id, unlinked, "group deleted");
    audit(conn, actor, "group.delete", group_id, Some(group.name));
    Ok(())
}

fn load(conn: &Connection, group_id: Id<MemberGroup>) -> RosterResult<MemberGroup> {
    group_repo::find_by_id(conn, group_id)?
        .ok_or_else(|| RosterError::not_found("MemberGroup", group_id))
}
