// dispatcher.rs
use log::{debug, warn};
use ticket_domain::{Form, TicketProcess};

use super::{EmailMessage, Mailer};
use crate::snapshot::escape_html;

/// Qué pasó con una notificación.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Sent { recipients: Vec<String> },
    /// No recipients configured on the form.
    Skipped,
    /// The mailer failed; the error was logged and swallowed.
    Suppressed { error: String },
}

/// Arma el mensaje a partir del snapshot del proceso. Devuelve `None` si el
/// formulario no tiene destinatarios.
pub fn compose(process: &TicketProcess, form: &Form, prefix: &str) -> Option<EmailMessage> {
    let to = form.recipients();
    if to.is_empty() {
        return None;
    }
    let subject = format!("{prefix}: {}", form.name);
    let rows: String = process.ticket_data
                              .iter()
                              .map(|(k, v)| {
                                  format!("<tr><th align='left' style='padding:6px 10px'>{}</th><td style='padding:6px 10px'>{}</td></tr>",
                                          escape_html(k),
                                          escape_html(v))
                              })
                              .collect();
    let html = format!("<h3>{}</h3>\n<table border=\"1\" cellpadding=\"0\" cellspacing=\"0\" style=\"border-collapse:collapse\">{rows}</table>\n<p>Process ID: {}</p>",
                       escape_html(&subject),
                       process.id);
    let plain = process.ticket_data
                       .iter()
                       .map(|(k, v)| format!("{k}: {v}"))
                       .collect::<Vec<_>>()
                       .join("\n");
    Some(EmailMessage { subject, plain, html, to })
}

pub struct NotificationDispatcher<M: Mailer> {
    mailer: M,
}

impl<M: Mailer> NotificationDispatcher<M> {
    pub fn new(mailer: M) -> Self {
        Self { mailer }
    }

    pub fn mailer(&self) -> &M {
        &self.mailer
    }

    /// Envía el resumen del proceso. Nunca devuelve error.
    pub fn dispatch(&self, process: &TicketProcess, form: &Form, prefix: &str) -> DispatchOutcome {
        let Some(message) = compose(process, form, prefix) else {
            debug!("dispatch: no recipients for form '{}', skipping", form.name);
            return DispatchOutcome::Skipped;
        };
        match self.mailer.send(&message) {
            Ok(()) => DispatchOutcome::Sent { recipients: message.to },
            Err(e) => {
                warn!("dispatch: mail for process {} suppressed: {e}", process.id);
                DispatchOutcome::Suppressed { error: e.to_string() }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::NotifyError;
    use crate::notify::OutboxMailer;
    use ticket_domain::Snapshot;

    struct FailingMailer;

    impl Mailer for FailingMailer {
        fn send(&self, _message: &EmailMessage) -> Result<(), NotifyError> {
            Err(NotifyError::Transport("smtp down".into()))
        }
    }

    fn process_for(form: &Form) -> TicketProcess {
        let mut process = TicketProcess::new(form.id, None);
        process.ticket_data = Snapshot([("Description".to_string(), "server outage".to_string()),
                                        ("Attachment".to_string(), String::new())].into_iter()
                                                                                   .collect());
        process
    }

    #[test]
    fn empty_recipients_skip_without_sending() {
        let form = Form::new("Risk Intake");
        let outbox = OutboxMailer::new();
        let dispatcher = NotificationDispatcher::new(outbox.clone());
        assert_eq!(dispatcher.dispatch(&process_for(&form), &form, "New submission"), DispatchOutcome::Skipped);
        assert!(outbox.sent().is_empty());
    }

    #[test]
    fn message_layout() {
        let form = Form::new("Risk Intake").with_notify_emails("a@example.com, b@example.com");
        let process = process_for(&form);
        let outbox = OutboxMailer::new();
        let outcome = NotificationDispatcher::new(outbox.clone()).dispatch(&process, &form, "New submission");
        assert!(matches!(outcome, DispatchOutcome::Sent { ref recipients } if recipients.len() == 2));
        let sent = outbox.sent();
        assert_eq!(sent[0].subject, "New submission: Risk Intake");
        assert_eq!(sent[0].plain, "Description: server outage\nAttachment: ");
        assert!(sent[0].html.contains(&format!("Process ID: {}", process.id)));
    }

    #[test]
    fn mailer_failure_is_suppressed() {
        let form = Form::new("Risk Intake").with_notify_emails("a@example.com");
        let outcome = NotificationDispatcher::new(FailingMailer).dispatch(&process_for(&form), &form, "Ticket completed");
        assert!(matches!(outcome, DispatchOutcome::Suppressed { .. }));
    }
}
