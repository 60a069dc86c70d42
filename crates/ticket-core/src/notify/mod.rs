//! Notificaciones por correo de las transiciones del workflow.
//!
//! El envío es best-effort: un fallo del mailer se registra y se descarta,
//! nunca bloquea la transición que lo disparó.

mod dispatcher;
mod mailer;

pub use dispatcher::{compose, DispatchOutcome, NotificationDispatcher};
pub use mailer::{EmailMessage, LogMailer, Mailer, OutboxMailer};
