//! ticketflow
//!
//! Tickets de aprobación multi-rol sobre formularios dinámicos. Este crate
//! reúne los crates del workspace y agrega lo que comparten los binarios:
//! - `config`: `AppConfig` desde variables `TICKETFLOW_*`.
//! - `errors`: `AppError` con códigos de salida.
//! - `logging`: subscriber de `tracing`.

pub mod config;
pub mod errors;
pub mod logging;

pub use config::AppConfig;
pub use errors::AppError;
pub use ticket_core as core;
pub use ticket_domain as domain;
pub use ticket_persistence as persistence;

use ticket_core::{ApprovalEngine, LinearWorkflow, Mailer, TicketStore};

/// Motor con `LinearWorkflow` según la política configurada.
pub fn engine_with<S: TicketStore, M: Mailer>(store: S, mailer: M, config: &AppConfig) -> ApprovalEngine<S, LinearWorkflow, M> {
    ApprovalEngine::new(store,
                        LinearWorkflow::new(config.rejection_policy),
                        mailer,
                        config.engine.clone())
}
