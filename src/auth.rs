use crate::error::{RosterError, RosterResult};
use crate::model::{Id, User};

/// Resolves the caller of a mutating operation. Identity is only recorded
/// (`created_by`, `marked_by`, audit actor); it grants nothing.
pub fn require_caller(caller: Option<&User>) -> RosterResult<Id<User>> {
    caller.map(|u| u.id).ok_or(RosterError::Unauthenticated)
}
