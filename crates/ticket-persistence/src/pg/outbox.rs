//! Mailer que encola en `email_outbox`.
use chrono::Utc;
use diesel::prelude::*;
use log::debug;
use ticket_core::{EmailMessage, Mailer, NotifyError};

use super::rows::{NewOutboxRow, OutboxRow};
use super::{with_retry, ConnectionProvider};
use crate::error::PersistenceError;
use crate::schema::email_outbox;

pub struct PgOutboxMailer<P: ConnectionProvider> {
    provider: P,
}

impl<P: ConnectionProvider> PgOutboxMailer<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// Correos aún no marcados como enviados, en orden de llegada.
    pub fn pending(&self) -> Result<Vec<OutboxRow>, PersistenceError> {
        with_retry(|| {
            let mut conn = self.provider.connection()?;
            Ok(email_outbox::table.filter(email_outbox::sent_at.is_null())
                                  .order(email_outbox::id.asc())
                                  .select(OutboxRow::as_select())
                                  .load(&mut conn)?)
        })
    }

    pub fn mark_sent(&self, id: i64) -> Result<(), PersistenceError> {
        let updated = with_retry(|| {
            let mut conn = self.provider.connection()?;
            Ok(diesel::update(email_outbox::table.find(id)).set(email_outbox::sent_at.eq(Some(Utc::now())))
                                                           .execute(&mut conn)?)
        })?;
        if updated == 0 {
            return Err(PersistenceError::NotFound);
        }
        Ok(())
    }
}

impl<P: ConnectionProvider> Mailer for PgOutboxMailer<P> {
    fn send(&self, message: &EmailMessage) -> Result<(), NotifyError> {
        let id: i64 = with_retry(|| {
                          let mut conn = self.provider.connection()?;
                          Ok(diesel::insert_into(email_outbox::table).values(NewOutboxRow { subject: &message.subject,
                                                                                            body_plain: &message.plain,
                                                                                            body_html: &message.html,
                                                                                            recipients: &message.to })
                                                                     .returning(email_outbox::id)
                                                                     .get_result(&mut conn)?)
                      }).map_err(|e| NotifyError::Transport(e.to_string()))?;
        debug!("outbox: queued mail id={id} subject={:?}", message.subject);
        Ok(())
    }
}
