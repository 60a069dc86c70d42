use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("unknown role code: {0}")]
    UnknownRole(String),
    #[error("invalid decision signal: {0:?}")]
    InvalidDecision(Option<String>),
    #[error("duplicate field label in form: {0}")]
    DuplicateLabel(String),
    #[error("{0}")]
    ValidationError(String),
}
