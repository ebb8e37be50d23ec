//! Error types shared across layers

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Validation: {0}")]
    Validation(String),

    #[error("Cannot decode {entity} {key}: {reason}")]
    Decode {
        entity: &'static str,
        key: String,
        reason: String,
    },

    #[error("Storage: {0}")]
    Storage(String),
}

impl DomainError {
    pub fn decode(entity: &'static str, key: impl ToString, reason: impl ToString) -> Self {
        Self::Decode {
            entity,
            key: key.to_string(),
            reason: reason.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum InfraError {
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Scheduler error: {0}")]
    Scheduler(String),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Infra(#[from] InfraError),

    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_error_names_entity_and_key() {
        let err = DomainError::decode("ConsumerBalance", 42, "missing field `accountNumber`");
        assert_eq!(
            err.to_string(),
            "Cannot decode ConsumerBalance 42: missing field `accountNumber`"
        );
    }
}
