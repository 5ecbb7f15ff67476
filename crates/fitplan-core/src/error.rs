use thiserror::Error;

/// Failure of a service-level operation.
///
/// A duplicate generated occurrence is never an error: the bulk insert
/// absorbs it. Everything that is not a lookup, ownership or input problem
/// is a persistence failure, and the transaction it happened in has been
/// rolled back by the time the caller sees it.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("{0} belongs to another user")]
    Forbidden(String),

    #[error("invalid input: {0}")]
    Invalid(String),

    #[error(transparent)]
    Persistence(#[from] anyhow::Error),
}

impl ServiceError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn forbidden(what: impl Into<String>) -> Self {
        Self::Forbidden(what.into())
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }
}

impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        Self::Persistence(anyhow::Error::new(err).context("database error"))
    }
}

/// Lifecycle operations only ever produce `NotFound`, `Forbidden` or
/// `Persistence`.
pub type LifecycleError = ServiceError;

pub type ServiceResult<T> = Result<T, ServiceError>;
