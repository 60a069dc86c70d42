//! Abstracción de transporte de correo.
use std::sync::{Arc, Mutex};

use log::info;
use serde::{Deserialize, Serialize};

use crate::errors::NotifyError;

/// Mensaje multipart: texto plano + alternativa HTML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailMessage {
    pub subject: String,
    pub plain: String,
    pub html: String,
    pub to: Vec<String>,
}

pub trait Mailer {
    fn send(&self, message: &EmailMessage) -> Result<(), NotifyError>;
}

impl<M: Mailer + ?Sized> Mailer for Box<M> {
    fn send(&self, message: &EmailMessage) -> Result<(), NotifyError> {
        (**self).send(message)
    }
}

/// Writes each message to the log instead of delivering it.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMailer;

impl Mailer for LogMailer {
    fn send(&self, message: &EmailMessage) -> Result<(), NotifyError> {
        info!("mail to={} subject={:?}\n{}", message.to.join(","), message.subject, message.plain);
        Ok(())
    }
}

/// Bandeja en memoria. Los clones comparten la misma bandeja, útil para
/// inspeccionar lo enviado desde un test.
#[derive(Debug, Clone, Default)]
pub struct OutboxMailer {
    sent: Arc<Mutex<Vec<EmailMessage>>>,
}

impl OutboxMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

impl Mailer for OutboxMailer {
    fn send(&self, message: &EmailMessage) -> Result<(), NotifyError> {
        let mut sent = self.sent
                           .lock()
                           .map_err(|e| NotifyError::Transport(format!("outbox poisoned: {e}")))?;
        sent.push(message.clone());
        Ok(())
    }
}
