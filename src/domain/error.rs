use thiserror::Error;

use crate::domain::types::EntityKind;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("{kind} `{id}` not found")]
    NotFound { kind: EntityKind, id: i64 },
    #[error("catalogue invariant violated: {message}")]
    Invariant { message: String },
}

impl DomainError {
    pub fn not_found(kind: EntityKind, id: i64) -> Self {
        Self::NotFound { kind, id }
    }

    pub fn invariant(message: impl Into<String>) -> Self {
        Self::Invariant {
            message: message.into(),
        }
    }
}
