//! Reconciliation of the group/member edge set. Every directory operation
//! that changes membership ends up here.

use std::collections::HashSet;

use rusqlite::Connection;

use crate::db::{group_repo, member_repo, membership_repo};
use crate::error::{RosterError, RosterResult};
use crate::model::{Id, Member, MemberGroup};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Edge {
    group_id: Id<MemberGroup>,
    member_id: Id<Member>,
}

/// Brings the stored edges from `current` to `desired`: edges missing from
/// `desired` are removed, new ones are added in `desired` order.
fn reconcile(conn: &Connection, current: &[Edge], desired: &[Edge]) -> RosterResult<()> {
    let keep: HashSet<Edge> = desired.iter().copied().collect();
    let have: HashSet<Edge> = current.iter().copied().collect();

    for edge in current.iter().filter(|e| !keep.contains(e)) {
        membership_repo::unlink(conn, edge.group_id, edge.member_id)?;
    }
    for edge in desired.iter().filter(|e| !have.contains(e)) {
        membership_repo::link(conn, edge.group_id, edge.member_id)?;
    }
    Ok(())
}

/// Makes `desired` the complete group set of one member.
pub(crate) fn reconcile_member_groups(
    conn: &Connection,
    member_id: Id<Member>,
    desired: &[Id<MemberGroup>],
) -> RosterResult<()> {
    for group_id in desired {
        require_group(conn, *group_id)?;
    }

    let edge = |group_id| Edge { group_id, member_id };
    let current: Vec<Edge> = membership_repo::group_ids_for_member(conn, member_id)?
        .into_iter()
        .map(edge)
        .collect();
    let desired: Vec<Edge> = desired.iter().copied().map(edge).collect();

    reconcile(conn, &current, &desired)
}

/// Makes `desired` the complete member set of one group.
pub(crate) fn reconcile_group_members(
    conn: &Connection,
    group_id: Id<MemberGroup>,
    desired: &[Id<Member>],
) -> RosterResult<()> {
    for member_id in desired {
        require_member(conn, *member_id)?;
    }

    let edge = |member_id| Edge { group_id, member_id };
    let current: Vec<Edge> = membership_repo::member_ids_for_group(conn, group_id)?
        .into_iter()
        .map(edge)
        .collect();
    let desired: Vec<Edge> = desired.iter().copied().map(edge).collect();

    reconcile(conn, &current, &desired)
}

pub(crate) fn require_group(conn: &Connection, group_id: Id<MemberGroup>) -> RosterResult<()> {
    if group_repo::exists(conn, group_id)? {
        Ok(())
    } else {
        Err(RosterError::not_found("MemberGroup", group_id))
    }
}

pub(crate) fn require_member(conn: &Connection, member_id: Id<Member>) -> RosterResult<()> {
    if member_repo::exists(conn, member_id)? {
        Ok(())
    } else {
        Err(RosterError::not_found("Member", member_id))
    }
}
