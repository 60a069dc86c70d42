//! Fachada `ticketflow`: configuración -> motor en memoria.
use ticket_core::forms::Submission;
use ticket_core::{InMemoryTicketStore, OutboxMailer, StageSubmission, StartRequest};
use ticket_domain::{FieldDefinition, FieldKind, Form, ProcessOutcome, Role, WorkflowTemplate};
use ticketflow::config::{ENV_COMPLETION_PREFIX, ENV_REJECTION_POLICY, ENV_START_URL};
use ticketflow::{engine_with, AppConfig};

fn config(pairs: &'static [(&'static str, &'static str)]) -> AppConfig {
    AppConfig::from_lookup(|key| pairs.iter().find(|(k, _)| *k == key).map(|(_, v)| v.to_string())).unwrap()
}

#[test]
fn halt_policy_from_env_stops_on_first_rejection() {
    let cfg = config(&[(ENV_REJECTION_POLICY, "halt"), (ENV_COMPLETION_PREFIX, "Closed")]);
    let outbox = OutboxMailer::new();
    let mut engine = engine_with(InMemoryTicketStore::new(), outbox.clone(), &cfg);

    let template = WorkflowTemplate::linear("Access approval");
    engine.register_template(&template).unwrap();
    let title = FieldDefinition::new("Title", FieldKind::Text, Role::Representative).required();
    let form = Form::new("Access Request").with_template(template.id)
                                          .with_notify_emails("it@example.com")
                                          .with_field(title.clone());
    engine.register_form(&form).unwrap();

    let started = engine.start_process(StartRequest { form_id: form.id,
                                                      submitted_by: "dana".into(),
                                                      submission: Submission::new().with_value(title.key(), "VPN access") })
                        .unwrap();
    let id = started.process.id;
    engine.submit_stage(StageSubmission { process_id: id,
                                          role: Role::Representative,
                                          decision: Some("approved".into()),
                                          comment: String::new(),
                                          decided_by: "dana".into(),
                                          submission: Submission::new().with_value(title.key(), "VPN access") })
          .unwrap();
    let result = engine.submit_stage(StageSubmission { process_id: id,
                                                       role: Role::Champion,
                                                       decision: Some("rejected".into()),
                                                       comment: "no business case".into(),
                                                       decided_by: "erin".into(),
                                                       submission: Submission::new() })
                       .unwrap();

    assert_eq!(result.process.outcome, Some(ProcessOutcome::Rejected));
    let row = engine.status_row(id).unwrap();
    assert_eq!(row["Risk Champion"], "rejected");
    assert_eq!(row["Risk Approver"], "-");
    let subjects: Vec<String> = outbox.sent().into_iter().map(|m| m.subject).collect();
    assert_eq!(subjects, vec!["New submission: Access Request".to_string(), "Closed: Access Request".to_string()]);
}

#[test]
fn start_url_comes_from_config() {
    let cfg = config(&[(ENV_START_URL, "/tickets/new/")]);
    let engine = engine_with(InMemoryTicketStore::new(), OutboxMailer::new(), &cfg);
    let form_id = uuid::Uuid::nil();
    assert_eq!(engine.start_redirect(form_id), format!("/tickets/new/?form={form_id}"));
}

#[test]
fn events_serialize_for_the_cli() {
    let cfg = AppConfig::default();
    let mut engine = engine_with(InMemoryTicketStore::new(), OutboxMailer::new(), &cfg);
    let form = Form::new("Loose").with_field(FieldDefinition::new("Note", FieldKind::Text, Role::Representative));
    engine.register_form(&form).unwrap();
    let started = engine.start_process(StartRequest { form_id: form.id,
                                                      submitted_by: "x".into(),
                                                      submission: Submission::new() })
                        .unwrap();
    let json = serde_json::to_value(&started.events[0]).unwrap();
    assert!(json["kind"]["ProcessStarted"]["template_hash"].is_string());
}
