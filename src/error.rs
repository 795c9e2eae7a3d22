use thiserror::Error;

#[derive(Debug, Error)]
pub enum RosterError {
    #[error("No caller identity supplied")]
    Unauthenticated,

    #[error("{entity_type} not found: {id}")]
    NotFound { entity_type: String, id: String },

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("{field} cannot be blank")]
    BlankField { field: String },

    #[error("{field} cannot be earlier than its start")]
    DateOrder { field: String },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("{0}")]
    Other(String),
}

impl RosterError {
    pub fn not_found(entity_type: &str, id: impl ToString) -> Self {
        RosterError::NotFound {
            entity_type: entity_type.into(),
            id: id.to_string(),
        }
    }
}

pub type RosterResult<T> = Result<T, RosterError>;
