//! PgTicketStore contra una base real. Se omite sin DATABASE_URL.

use chrono::Utc;
use test_support::{unique, with_pool};
use ticket_core::forms::Submission;
use ticket_core::{ApprovalEngine, CommitScope, EngineConfig, EventStore, FormRepository, LinearWorkflow, ProcessColumn,
                  ProcessEventKind, ProcessRepository, RejectionPolicy, StageSubmission, StartRequest, TransitionCommit};
use ticket_domain::{Decision, FieldDefinition, FieldKind, Form, ProcessOutcome, Role, RoleDecision, TicketProcess,
                    WorkflowTemplate};
use ticket_persistence::pg::{PgOutboxMailer, PgTicketStore, PoolProvider};

fn seed(store: &mut PgTicketStore<PoolProvider>, notify: &str) -> (WorkflowTemplate, Form) {
    let template = WorkflowTemplate::linear(unique("Risk approval"));
    store.save_template(&template).expect("template");
    let form = Form::new(unique("Risk Intake")).with_template(template.id)
                                               .with_notify_emails(notify)
                                               .with_field(FieldDefinition::new("Title", FieldKind::Text, Role::Representative).required())
                                               .with_field(FieldDefinition::new("Severity", FieldKind::Select, Role::Representative).with_choices("low,high"))
                                               .with_field(FieldDefinition::new("Impact", FieldKind::Textarea, Role::Champion))
                                               .with_field(FieldDefinition::new("Budget", FieldKind::Number, Role::Approver).with_bounds(Some(0), None));
    store.save_form(&form).expect("form");
    (template, form)
}

#[test]
fn form_and_template_round_trip() {
    if std::env::var("DATABASE_URL").is_err() {
        eprintln!("skip form_and_template_round_trip (no DATABASE_URL)");
        return;
    }
    with_pool(|pool| {
        let mut store = PgTicketStore::new(PoolProvider::new(pool.clone()));
        let (template, form) = seed(&mut store, "");

        let loaded = store.get_template(template.id).unwrap().expect("template row");
        let roles: Vec<Role> = loaded.stages_in_order().iter().map(|s| s.role).collect();
        assert_eq!(roles, Role::ALL.to_vec());

        let loaded = store.get_form(form.id).unwrap().expect("form row");
        let labels: Vec<&str> = loaded.fields_in_order().iter().map(|f| f.label.as_str()).collect();
        assert_eq!(labels, vec!["Title", "Severity", "Impact", "Budget"]);
        let budget = loaded.field_by_label("Budget").unwrap();
        assert_eq!(budget.kind, FieldKind::Number);
        assert_eq!(budget.min_value, Some(0));
        assert_eq!(loaded.field_by_label("Severity").unwrap().choices.as_deref(), Some("low,high"));

        // Re-guardar sin un campo lo elimina.
        let mut trimmed = loaded.clone();
        trimmed.fields.retain(|f| f.label != "Budget");
        store.save_form(&trimmed).unwrap();
        assert!(store.get_form(form.id).unwrap().unwrap().field_by_label("Budget").is_none());

        let duplicate = Form::new(form.name.clone());
        assert!(store.save_form(&duplicate).is_err());
    });
}

#[test]
fn full_approval_walk_on_postgres() {
    if std::env::var("DATABASE_URL").is_err() {
        eprintln!("skip full_approval_walk_on_postgres (no DATABASE_URL)");
        return;
    }
    with_pool(|pool| {
        let provider = PoolProvider::new(pool.clone());
        let mut store = PgTicketStore::new(provider.clone());
        let (_, form) = seed(&mut store, "risk@example.com");
        let mut engine = ApprovalEngine::new(store,
                                             LinearWorkflow::new(RejectionPolicy::Proceed),
                                             PgOutboxMailer::new(provider),
                                             EngineConfig::default());

        let title = form.field_by_label("Title").unwrap().key();
        let severity = form.field_by_label("Severity").unwrap().key();
        let started = engine.start_process(StartRequest { form_id: form.id,
                                                          submitted_by: "alice".into(),
                                                          submission: Submission::new().with_value(title, "VPN down")
                                                                                       .with_value(severity, "high") })
                            .expect("start");
        let process_id = started.process.id;

        let impact = form.field_by_label("Impact").unwrap().key();
        let budget = form.field_by_label("Budget").unwrap().key();
        for (role, submission) in [(Role::Representative, Submission::new()),
                                   (Role::Champion, Submission::new().with_value(impact, "all remote staff")),
                                   (Role::Approver, Submission::new().with_value(budget, "1200")),
                                   (Role::Executive, Submission::new())]
        {
            engine.submit_stage(StageSubmission { process_id,
                                                  role,
                                                  decision: Some("approved".into()),
                                                  comment: String::new(),
                                                  decided_by: role.code().into(),
                                                  submission })
                  .expect("stage");
        }

        let process = engine.process(process_id).unwrap();
        assert_eq!(process.outcome, Some(ProcessOutcome::Completed));
        assert_eq!(process.decisions.len(), 4);
        let labels: Vec<&str> = process.ticket_data.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(labels, vec!["Title", "Severity", "Impact", "Budget"]);
        assert_eq!(process.ticket_data.get("Budget"), Some("1200"));
        assert_eq!(process.ticket_data.get("Title"), Some("VPN down"));

        let events = engine.process_events(process_id).unwrap();
        assert!(matches!(events[0].kind, ProcessEventKind::ProcessStarted { .. }));
        assert!(events.windows(2).all(|w| w[0].seq < w[1].seq));

        let pending = engine.mailer().pending().unwrap();
        let subjects: Vec<&str> = pending.iter().map(|m| m.subject.as_str()).collect();
        assert!(subjects.contains(&format!("Ticket completed: {}", form.name).as_str()));
    });
}

#[test]
fn narrow_commit_on_missing_row_falls_back_to_full_save() {
    if std::env::var("DATABASE_URL").is_err() {
        eprintln!("skip narrow_commit_on_missing_row_falls_back_to_full_save (no DATABASE_URL)");
        return;
    }
    with_pool(|pool| {
        let mut store = PgTicketStore::new(PoolProvider::new(pool.clone()));
        let (template, form) = seed(&mut store, "");
        let mut process = TicketProcess::new(form.id, Some(template.id));
        process.stage_cursor = 1;
        process.record_decision(Role::Representative,
                                RoleDecision { decision: Decision::Approved,
                                               comment: "ok".into(),
                                               decided_by: "alice".into(),
                                               decided_at: Utc::now() });
        let commit = TransitionCommit { process: process.clone(),
                                        entry: None,
                                        touched: vec![],
                                        events: vec![ProcessEventKind::NotificationSkipped { subject: "x".into() }],
                                        scope: CommitScope::Fields(vec![ProcessColumn::StageCursor,
                                                                        ProcessColumn::Decision(Role::Representative)]) };
        let events = store.commit(commit).expect("commit");
        assert_eq!(events.len(), 1);

        let stored = store.get_process(process.id).unwrap().expect("row written");
        assert_eq!(stored.stage_cursor, 1);
        assert_eq!(stored.decisions[&Role::Representative].decided_by, "alice");
        assert_eq!(store.list(process.id).unwrap().len(), 1);
        assert!(store.list_processes(Some(form.id)).unwrap().iter().any(|p| p.id == process.id));
    });
}
