use serde::{Deserialize, Serialize};

use super::ids::Id;
use super::member::Member;

/// A named, colored grouping of members (a team, age class, committee...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberGroup {
    pub id: Id<MemberGroup>,
    pub name: String,
    pub color: Option<String>,
    pub description: Option<String>,
    pub member_ids: Vec<Id<Member>>,
}

impl MemberGroup {
    pub fn create(name: String, color: Option<String>, description: Option<String>) -> Self {
        Self {
            id: Id::generate(),
            name,
            color,
            description,
            member_ids: Vec::new(),
        }
    }
}
