use rusqlite::Connection;

use crate::db::{group_repo, member_repo};
use crate::error::RosterResult;
use crate::model::{Id, Member, MemberGroup};

pub fn active_members(conn: &Connection) -> RosterResult<Vec<Member>> {
    member_repo::find_active(conn)
}

pub fn inactive_members(conn: &Connection) -> RosterResult<Vec<Member>> {
    member_repo::find_inactive(conn)
}

pub fn all_members(conn: &Connection) -> RosterResult<Vec<Member>> {
    member_repo::find_all(conn)
}

pub fn find_member(conn: &Connection, member_id: Id<Member>) -> RosterResult<Option<Member>> {
    member_repo::find_by_id(conn, member_id)
}

pub fn find_members_by_name(conn: &Connection, query: &str) -> RosterResult<Vec<Member>> {
    member_repo::find_by_name(conn, query)
}

pub fn all_groups(conn: &Connection) -> RosterResult<Vec<MemberGroup>> {
    group_repo::find_all(conn)
}

pub fn find_group(conn: &Connection, group_id: Id<MemberGroup>) -> RosterResult<Option<MemberGroup>> {
    group_repo::find_by_id(conn, group_id)
}

pub fn find_group_by_name(conn: &Connection, name: &str) -> RosterResult<Option<MemberGroup>> {
    group_repo::find_by_name(conn, name)
}

/// Members of a group sorted by name, inactive ones included.
pub fn members_of_group(conn: &Connection, group_id: Id<MemberGroup>) -> RosterResult<Vec<Member>> {
    let group = match group_repo::find_by_id(conn, group_id)? {
        Some(g) => g,
        None => return Ok(Vec::new()),
    };

    let mut members = Vec::new();
    for member_id in &group.member_ids {
        if let Some(member) = member_repo::find_by_id(conn, *member_id)? {
            members.push(member);
        }
    }

    members.sort_by_key(|m| m.full_name());
    Ok(members)
}

pub fn groups_for_member(conn: &Connection, member_id: Id<Member>) -> RosterResult<Vec<MemberGroup>> {
    let member = match member_repo::find_by_id(conn, member_id)? {
        Some(m) => m,
        None => return Ok(Vec::new()),
    };

    let mut groups = Vec::new();
    for group_id in &member.group_ids {
        if let Some(group) = group_repo::find_by_id(conn, *group_id)? {
            groups.push(group);
        }
    }
    Ok(groups)
}
