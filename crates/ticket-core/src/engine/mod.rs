//! Motor de aprobación: orquesta builder, merge, snapshot, plugin de
//! workflow, repositorio y notificaciones.

mod config;
mod core;
mod views;

pub use self::config::{EngineConfig, DEFAULT_START_URL};
pub use self::core::ApprovalEngine;
pub use self::views::{StageSubmission, StageView, StartRequest, StartView, TransitionResult};

/// Mensaje cuando la señal de decisión falta o no es válida.
pub const DECISION_REQUIRED: &str = "Please click Approve or Reject.";
