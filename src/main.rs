//! Demo en memoria: recorre un ticket "Risk Intake" por los cuatro roles e
//! imprime la vista de cada etapa, el estado y el log de eventos.
use std::process::ExitCode;

use ticket_core::forms::{Submission, Upload};
use ticket_core::{InMemoryTicketStore, LogMailer, StageSubmission, StartRequest};
use ticket_domain::{FieldDefinition, FieldKind, Form, Role, WorkflowTemplate};
use ticketflow::{engine_with, logging, AppConfig, AppError};

fn demo_form(template: &WorkflowTemplate) -> Form {
    Form::new("Risk Intake").with_template(template.id)
                            .with_notify_emails("risk-office@example.com")
                            .with_field(FieldDefinition::new("Title", FieldKind::Text, Role::Representative).required())
                            .with_field(FieldDefinition::new("Description", FieldKind::Textarea, Role::Representative).required())
                            .with_field(FieldDefinition::new("Severity", FieldKind::Radio, Role::Representative).with_choices("low,medium,high")
                                                                                                             .with_default("medium"))
                            .with_field(FieldDefinition::new("Evidence", FieldKind::File, Role::Champion))
                            .with_field(FieldDefinition::new("Mitigation budget", FieldKind::Number, Role::Approver).with_bounds(Some(0), Some(1_000_000)))
                            .with_field(FieldDefinition::new("Accepted", FieldKind::Checkbox, Role::Executive))
}

fn run() -> Result<(), AppError> {
    let config = AppConfig::from_env()?;
    let mut engine = engine_with(InMemoryTicketStore::new(), LogMailer, &config);

    let template = WorkflowTemplate::linear("Risk approval");
    engine.register_template(&template)?;
    let form = demo_form(&template);
    engine.register_form(&form)?;
    println!("start url: {}", engine.start_redirect(form.id));

    let key = |label: &str| form.field_by_label(label).map(|f| f.key()).ok_or_else(|| AppError::Input(label.to_string()));
    let started = engine.start_process(StartRequest { form_id: form.id,
                                                      submitted_by: "alice".into(),
                                                      submission: Submission::new().with_value(key("Title")?, "Vendor outage")
                                                                                   .with_value(key("Description")?,
                                                                                               "Payments provider down for 3h")
                                                                                   .with_value(key("Severity")?, "high") })?;
    let process_id = started.process.id;
    println!("process {process_id} started");

    let steps = [(Role::Representative, "approved", Submission::new()),
                 (Role::Champion,
                  "approved",
                  Submission::new().with_file(key("Evidence")?, Upload::new("incident-report.pdf", 48_213))),
                 (Role::Approver, "approved", Submission::new().with_value(key("Mitigation budget")?, "25000")),
                 (Role::Executive, "approved", Submission::new().with_value(key("Accepted")?, "on"))];

    for (role, decision, submission) in steps {
        let view = engine.stage_view(process_id, role)?;
        let labels: Vec<&str> = view.fields.controls.values().map(|c| c.label.as_str()).collect();
        println!("\n[{}] fields: {}", view.role_display, labels.join(", "));
        let result = engine.submit_stage(StageSubmission { process_id,
                                                           role,
                                                           decision: Some(decision.to_string()),
                                                           comment: format!("{} ok", role.display_name()),
                                                           decided_by: role.code().to_string(),
                                                           submission })?;
        println!("[{}] {decision} -> cursor {}", role.display_name(), result.process.stage_cursor);
    }

    println!("\nstatus:");
    for (column, value) in engine.status_row(process_id)? {
        println!("  {column:<16} {value}");
    }
    println!("\nticket data:");
    for (label, value) in engine.process(process_id)?.ticket_data.iter() {
        println!("  {label:<18} {value}");
    }
    println!("\nevents:");
    for event in engine.process_events(process_id)? {
        println!("  #{:<3} {}", event.seq, event.kind.event_type());
    }
    Ok(())
}

fn main() -> ExitCode {
    logging::init("info");
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("ticketflow-demo: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}
