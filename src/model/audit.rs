use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::Id;
use super::user::User;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: Id<AuditEntry>,
    pub actor: Id<User>,
    pub action: String,
    pub target: String,
    pub details: Option<String>,
    pub at: DateTime<Utc>,
}
