use thiserror::Error;
use ticket_core::EngineError;
use ticket_persistence::PersistenceError;

/// Errores de los binarios (demo y CLI).
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Error de configuración: {0}")]
    Config(String),
    #[error("Entrada inválida: {0}")]
    Input(String),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error("Error en IO: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// Código de salida: 2 config, 3 entrada, 4 rechazo del motor, 5 backend.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) | Self::Persistence(PersistenceError::Config(_)) => 2,
            Self::Input(_) | Self::Io(_) => 3,
            Self::Engine(EngineError::Repo(_)) | Self::Persistence(_) => 5,
            Self::Engine(_) => 4,
        }
    }
}
