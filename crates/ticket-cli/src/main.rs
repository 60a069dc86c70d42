//! CLI de ticketflow contra Postgres (`DATABASE_URL`).
//!
//! Códigos de salida: 0 ok, 2 configuración/uso, 3 entrada inválida,
//! 4 rechazado por el motor, 5 error de backend.
use std::path::Path;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use log::info;
use ticket_core::forms::{Submission, Upload};
use ticket_core::{ApprovalEngine, EngineError, FormRepository, LinearWorkflow, StageSubmission, StartRequest};
use ticket_domain::{Form, Role};
use ticket_persistence::{build_dev_pool_from_env, PgOutboxMailer, PgTicketStore, PoolProvider};
use ticketflow::{engine_with, logging, AppConfig, AppError};
use uuid::Uuid;

type PgEngine = ApprovalEngine<PgTicketStore<PoolProvider>, LinearWorkflow, PgOutboxMailer<PoolProvider>>;

#[derive(Parser, Debug)]
#[command(name = "ticketflow", version, about = "Multi-role approval tickets over dynamic forms")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Formularios con workflow asignado.
    Forms,
    /// URL de inicio de proceso para un formulario.
    StartUrl {
        #[arg(long)]
        form: Uuid,
    },
    /// Start a process with the Representative's values.
    Start {
        #[arg(long)]
        form: Uuid,
        /// `label=value`, repetible.
        #[arg(long = "set", short = 's', value_parser = parse_key_val)]
        values: Vec<(String, String)>,
        /// `label=path`; se registran nombre y tamaño del archivo.
        #[arg(long = "file", value_parser = parse_key_val)]
        files: Vec<(String, String)>,
        #[arg(long, env = "USER", default_value = "anonymous")]
        by: String,
    },
    /// Campos que ve un rol sobre un proceso.
    View {
        #[arg(long)]
        process: Uuid,
        /// Código de rol: user, dev, ba, pm.
        #[arg(long, value_parser = parse_role)]
        role: Role,
    },
    /// Cierra la etapa de un rol con approved/rejected.
    Approve {
        #[arg(long)]
        process: Uuid,
        #[arg(long, value_parser = parse_role)]
        role: Role,
        #[arg(long)]
        decision: Option<String>,
        #[arg(long, default_value = "")]
        comment: String,
        #[arg(long = "set", short = 's', value_parser = parse_key_val)]
        values: Vec<(String, String)>,
        #[arg(long = "file", value_parser = parse_key_val)]
        files: Vec<(String, String)>,
        #[arg(long, env = "USER", default_value = "anonymous")]
        by: String,
    },
    /// Una fila de estado: decisión por rol.
    Status {
        #[arg(long)]
        process: Uuid,
    },
    /// Log de eventos del proceso.
    Events {
        #[arg(long)]
        process: Uuid,
        /// Una línea JSON por evento.
        #[arg(long)]
        json: bool,
    },
    /// Correos pendientes en el outbox.
    Outbox,
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s.split_once('=').ok_or_else(|| format!("invalid label=value pair: {s}"))?;
    if key.trim().is_empty() {
        return Err(format!("empty label in {s:?}"));
    }
    Ok((key.trim().to_string(), value.to_string()))
}

fn parse_role(s: &str) -> Result<Role, String> {
    Role::from_code(s.trim()).map_err(|e| e.to_string())
}

/// Traduce `label=value` / `label=path` a un `Submission` indexado por key.
fn submission_for(form: &Form, values: &[(String, String)], files: &[(String, String)]) -> Result<Submission, AppError> {
    let key_for = |label: &str| {
        form.field_by_label(label)
            .map(|f| f.key())
            .ok_or_else(|| AppError::Input(format!("form '{}' has no field '{label}'", form.name)))
    };
    let mut submission = Submission::new();
    for (label, value) in values {
        submission = submission.with_value(key_for(label)?, value.clone());
    }
    for (label, raw_path) in files {
        let path = Path::new(raw_path);
        let size = std::fs::metadata(path)?.len();
        let name = path.file_name()
                       .and_then(|n| n.to_str())
                       .ok_or_else(|| AppError::Input(format!("invalid file path {raw_path:?}")))?;
        submission = submission.with_file(key_for(label)?, Upload::new(name, size));
    }
    Ok(submission)
}

fn load_form(engine: &PgEngine, form_id: Uuid) -> Result<Form, AppError> {
    engine.store()
          .get_form(form_id)
          .map_err(EngineError::from)?
          .ok_or(AppError::Engine(EngineError::UnknownForm(form_id)))
}

fn connect(config: &AppConfig) -> Result<PgEngine, AppError> {
    let pool = build_dev_pool_from_env()?;
    let provider = PoolProvider::new(pool);
    Ok(engine_with(PgTicketStore::new(provider.clone()), PgOutboxMailer::new(provider), config))
}

fn run(cli: Cli) -> Result<(), AppError> {
    let config = AppConfig::from_env()?;
    let mut engine = connect(&config)?;

    match cli.command {
        Command::Forms => {
            for form in engine.forms_with_workflow()? {
                println!("{}\t{}", form.id, form.name);
            }
        }
        Command::StartUrl { form } => {
            println!("{}", engine.start_redirect(form));
        }
        Command::Start { form,
                         values,
                         files,
                         by } => {
            let definition = load_form(&engine, form)?;
            let submission = submission_for(&definition, &values, &files)?;
            let result = engine.start_process(StartRequest { form_id: form,
                                                             submitted_by: by,
                                                             submission })?;
            info!("started process {} for form {}", result.process.id, definition.name);
            println!("{}", result.process.id);
        }
        Command::View { process, role } => {
            let view = engine.stage_view(process, role)?;
            println!("{} ({})", view.role_display, if view.is_actionable() { "open" } else { "read-only" });
            for control in view.fields.controls.values() {
                println!("  {:<24} {:<12} required={} initial={}",
                         control.label,
                         control.kind.widget(),
                         control.required,
                         control.initial.as_deref().unwrap_or(""));
            }
            println!("{}", view.summary_html);
        }
        Command::Approve { process,
                           role,
                           decision,
                           comment,
                           values,
                           files,
                           by } => {
            let form_id = engine.process(process)?.form_id;
            let definition = load_form(&engine, form_id)?;
            let submission = submission_for(&definition, &values, &files)?;
            let result = engine.submit_stage(StageSubmission { process_id: process,
                                                               role,
                                                               decision,
                                                               comment,
                                                               decided_by: by,
                                                               submission })?;
            match result.process.outcome {
                Some(outcome) => println!("{process} finished: {}", outcome.as_str()),
                None => println!("{process} cursor={}", result.process.stage_cursor),
            }
        }
        Command::Status { process } => {
            for (column, value) in engine.status_row(process)? {
                println!("{column}\t{value}");
            }
        }
        Command::Events { process, json } => {
            for event in engine.process_events(process)? {
                if json {
                    println!("{}", serde_json::to_string(&event).unwrap_or_default());
                } else {
                    println!("{}\t{}\t{}", event.seq, event.ts.to_rfc3339(), event.kind.event_type());
                }
            }
        }
        Command::Outbox => {
            for mail in engine.mailer().pending()? {
                println!("{}\t{}\t{}", mail.id, mail.recipients.join(","), mail.subject);
            }
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    logging::init("warn");
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("ticketflow: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use ticket_domain::{FieldDefinition, FieldKind};

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn approve_parses_role_codes_and_pairs() {
        let cli = Cli::try_parse_from(["ticketflow",
                                       "approve",
                                       "--process",
                                       "8c1f2a4e-6f1b-4c3a-9d2e-1f0a5b6c7d8e",
                                       "--role",
                                       "ba",
                                       "--decision",
                                       "approved",
                                       "-s",
                                       "Budget=1200",
                                       "--by",
                                       "carol"]).unwrap();
        match cli.command {
            Command::Approve { role, values, by, .. } => {
                assert_eq!(role, Role::Approver);
                assert_eq!(values, vec![("Budget".to_string(), "1200".to_string())]);
                assert_eq!(by, "carol");
            }
            other => panic!("unexpected command {other:?}"),
        }
        assert!(Cli::try_parse_from(["ticketflow", "status", "--process", "not-a-uuid"]).is_err());
        assert!(parse_role("admin").is_err());
    }

    #[test]
    fn key_val_keeps_equals_in_value() {
        assert_eq!(parse_key_val("Note=a=b").unwrap(), ("Note".to_string(), "a=b".to_string()));
        assert!(parse_key_val("novalue").is_err());
        assert!(parse_key_val("=x").is_err());
    }

    #[test]
    fn unknown_labels_are_input_errors() {
        let form = Form::new("Risk Intake").with_field(FieldDefinition::new("Title", FieldKind::Text, Role::Representative));
        let ok = submission_for(&form, &[("Title".into(), "x".into())], &[]).unwrap();
        assert_eq!(ok.data.len(), 1);
        let err = submission_for(&form, &[("Nope".into(), "x".into())], &[]).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }
}
