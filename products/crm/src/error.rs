use platform_api::ApiError;
use sea_orm::{DbErr, SqlErr};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum CrmError {
    #[error("database error: {0}")]
    Db(#[from] DbErr),
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: String },
    #[error("{kind} {id} does not exist")]
    InvalidReference { kind: &'static str, id: Uuid },
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    InvalidInput(String),
    #[error("credential error: {0}")]
    Credential(String),
}

pub type CrmResult<T> = Result<T, CrmError>;

impl CrmError {
    pub fn not_found(kind: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// A write refused by a unique index is a conflict, not a backend failure.
    pub(crate) fn on_write(err: DbErr, kind: &'static str) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(detail)) => {
                tracing::debug!(kind, %detail, "unique constraint violated");
                Self::Conflict(format!("{kind} already exists"))
            }
            _ => Self::Db(err),
        }
    }
}

impl From<CrmError> for ApiError {
    fn from(err: CrmError) -> Self {
        match err {
            CrmError::NotFound { kind, .. } => ApiError::not_found(kind),
            CrmError::InvalidReference { .. } | CrmError::InvalidInput(_) => {
                ApiError::invalid(err.to_string())
            }
            CrmError::Conflict(message) => ApiError::Conflict(message),
            CrmError::Db(_) | CrmError::Credential(_) => ApiError::internal(err.into()),
        }
    }
}

/// Rejects blank free-text fields.
pub(crate) fn require_text(field: &'static str, value: &str) -> CrmResult<()> {
    if value.trim().is_empty() {
        Err(CrmError::invalid(format!("{field} must not be blank")))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_onto_api_taxonomy() {
        let missing: ApiError = CrmError::not_found("deal", Uuid::nil()).into();
        assert_eq!(missing.status_code(), 404);

        let dangling: ApiError = CrmError::InvalidReference {
            kind: "dealer",
            id: Uuid::nil(),
        }
        .into();
        assert_eq!(dangling.status_code(), 400);

        let db: ApiError = CrmError::Db(DbErr::Custom("socket closed".into())).into();
        assert_eq!(db.status_code(), 500);
        assert_eq!(db.to_string(), "internal server error");
    }

    #[test]
    fn blank_text_is_rejected() {
        assert!(require_text("text", "  ").is_err());
        assert!(require_text("text", "Bank statements").is_ok());
    }
}
