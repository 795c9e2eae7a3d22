use rusqlite::Connection;
use tracing::info;

use crate::auth;
use crate::db::member_repo;
use crate::error::{RosterError, RosterResult};
use crate::model::{Id, Member, MemberPatch, NewMember, User};
use crate::ops::{audit, dedup_ids, membership};
use crate::validation::{self, trim_optional};

pub fn create_member(
    conn: &Connection,
    caller: Option<&User>,
    new: NewMember,
) -> RosterResult<Member> {
    let actor = auth::require_caller(caller)?;
    let first_name = validation::non_blank(&new.first_name, "firstName")?;

    let mut member = Member::create(first_name, new.last_name.trim().to_string());
    member.email = trim_optional(new.email.as_deref());
    member.phone = trim_optional(new.phone.as_deref());
    member.birth_date = new.birth_date;
    member.guardian_name = trim_optional(new.guardian_name.as_deref());
    member.guardian_phone = trim_optional(new.guardian_phone.as_deref());
    member.guardian_email = trim_optional(new.guardian_email.as_deref());
    member.notes = trim_optional(new.notes.as_deref());

    let tx = conn.unchecked_transaction()?;
    member_repo::insert(&tx, &member)?;
    membership::reconcile_member_groups(&tx, member.id, &dedup_ids(&new.group_ids))?;
    tx.commit()?;

    let member = load(conn, member.id)?;
    info!(member_id = %member.id, groups = member.group_ids.len(), "member created");
    audit(conn, actor, "member.create", member.id, Some(member.full_name()));
    Ok(member)
}

/// Applies a partial update. When `patch.group_ids` is present the member's
/// whole group set is reconciled against it in the same transaction.
pub fn update_member(
    conn: &Connection,
    caller: Option<&User>,
    member_id: Id<Member>,
    patch: MemberPatch,
) -> RosterResult<Member> {
    let actor = auth::require_caller(caller)?;

    let tx = conn.unchecked_transaction()?;
    let mut member = load(&tx, member_id)?;

    if let Some(n) = &patch.first_name {
        member.first_name = validation::non_blank(n, "firstName")?;
    }
    if let Some(n) = &patch.last_name {
        member.last_name = n.trim().to_string();
    }
    if let Some(v) = &patch.email {
        member.email = trim_optional(v.as_deref());
    }
    if let Some(v) = &patch.phone {
        member.phone = trim_optional(v.as_deref());
    }
    if let Some(bd) = patch.birth_date {
        member.birth_date = bd;
    }
    if let Some(v) = &patch.guardian_name {
        member.guardian_name = trim_optional(v.as_deref());
    }
    if let Some(v) = &patch.guardian_phone {
        member.guardian_phone = trim_optional(v.as_deref());
    }
    if let Some(v) = &patch.guardian_email {
        member.guardian_email = trim_optional(v.as_deref());
    }
    if let Some(v) = &patch.notes {
        member.notes = trim_optional(v.as_deref());
    }

    member_repo::update(&tx, &member)?;
    if let Some(group_ids) = &patch.group_ids {
        membership::reconcile_member_groups(&tx, member_id, &dedup_ids(group_ids))?;
    }
    tx.commit()?;

    let member = load(conn, member_id)?;
    info!(member_id = %member_id, "member updated");
    audit(conn, actor, "member.update", member_id, None);
    Ok(member)
}

/// Soft delete. Group edges and attendance history are kept; inactive
/// members drop out of activity audiences and reports.
pub fn deactivate_member(
    conn: &Connection,
    caller: Option<&User>,
    member_id: Id<Member>,
) -> RosterResult<Member> {
    set_active(conn, caller, member_id, false)
}

pub fn reactivate_member(
    conn: &Connection,
    caller: Option<&User>,
    member_id: Id<Member>,
) -> RosterResult<Member> {
    set_active(conn, caller, member_id, true)
}

fn set_active(
    conn: &Connection,
    caller: Option<&User>,
    member_id: Id<Member>,
    active: bool,
) -> RosterResult<Member> {
    let actor = auth::require_caller(caller)?;
    let mut member = load(conn, member_id)?;

    member.is_active = active;
    member_repo::update(conn, &member)?;

    info!(member_id = %member_id, active, "member activation changed");
    let action = if active { "member.reactivate" } else { "member.deactivate" };
    audit(conn, actor, action, member_id, None);
    Ok(member)
}

fn load(conn: &Connection, member_id: Id<Member>) -> RosterResult<Member> {
    member_repo::find_by_id(conn, member_id)?
        .ok_or_else(|| RosterError::not_found("Member", member_id))
}
