//! Errores del core: repositorio, motor y notificaciones.

use thiserror::Error;
use ticket_domain::{DomainError, FormId, ProcessId, Role};
use uuid::Uuid;

use crate::forms::ValidationErrors;

/// Errores de los repositorios (memoria o Postgres).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepoError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("update conflict: {0}")]
    UpdateConflict(String),
    #[error("backend error: {0}")]
    Backend(String),
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),
    #[error("unknown process {0}")]
    UnknownProcess(ProcessId),
    #[error("unknown form {0}")]
    UnknownForm(FormId),
    #[error("unknown entry {0}")]
    UnknownEntry(Uuid),
    #[error("stage mismatch: expected {expected:?}, got {got}")]
    WrongStage { expected: Option<Role>, got: Role },
    #[error("process {0} already finished")]
    ProcessFinished(ProcessId),
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

impl From<ValidationErrors> for EngineError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

/// Fallo de transporte de correo. El dispatcher lo registra y lo descarta.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NotifyError {
    #[error("mail transport failed: {0}")]
    Transport(String),
}
