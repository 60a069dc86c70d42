//! Filas Diesel y mapeo dominio <-> tablas.
//!
//! El dominio no conoce Diesel: cada tabla tiene aquí su struct de fila y las
//! funciones de conversión en ambos sentidos. Los códigos de rol, tipo de
//! campo, decisión y outcome se guardan como texto estable.
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use indexmap::IndexMap;
use serde_json::Value;
use ticket_core::{ProcessEvent, ProcessEventKind};
use ticket_domain::{Decision, Entry, FieldDefinition, FieldKind, FieldValue, FileRef, Form, ProcessOutcome, Role,
                    RoleDecision, Snapshot, Stage, StoredValue, TicketProcess, WorkflowTemplate};
use uuid::Uuid;

use crate::error::PersistenceError;
use crate::schema::{email_outbox, form_entries, form_entry_values, form_fields, forms, process_decisions, process_events,
                    ticket_processes, workflow_stages, workflow_templates};

#[derive(Queryable, Selectable, Insertable, AsChangeset, Debug, Clone)]
#[diesel(table_name = workflow_templates)]
pub struct TemplateRow {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = workflow_stages)]
pub struct StageRow {
    pub id: Uuid,
    pub template_id: Uuid,
    pub stage_order: i32,
    pub name: String,
    pub role: String,
    pub show_in_diagram: bool,
}

#[derive(Queryable, Selectable, Insertable, AsChangeset, Debug, Clone)]
#[diesel(table_name = forms)]
#[diesel(treat_none_as_null = true)]
pub struct FormRow {
    pub id: Uuid,
    pub name: String,
    pub workflow_template_id: Option<Uuid>,
    pub notify_emails: String,
    pub created: DateTime<Utc>,
}

#[derive(Queryable, Selectable, Insertable, AsChangeset, Debug, Clone)]
#[diesel(table_name = form_fields)]
#[diesel(treat_none_as_null = true)]
pub struct FieldRow {
    pub id: Uuid,
    pub form_id: Uuid,
    pub label: String,
    pub field_type: String,
    pub role: String,
    pub field_order: i32,
    pub required: bool,
    pub readonly: bool,
    pub hidden: bool,
    pub regex: Option<String>,
    pub min_value: Option<i64>,
    pub max_value: Option<i64>,
    pub max_length: Option<i32>,
    pub choices: Option<String>,
    pub default_value: Option<String>,
    pub placeholder: Option<String>,
    pub help_text: String,
}

#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = form_entries)]
pub struct EntryRow {
    pub id: Uuid,
    pub form_id: Uuid,
    pub submitted_by: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = form_entry_values)]
pub struct ValueRow {
    pub id: i64,
    pub entry_id: Uuid,
    pub field_id: Uuid,
    pub value_text: Option<String>,
    pub value_file: Option<String>,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = form_entry_values)]
pub struct NewValueRow {
    pub entry_id: Uuid,
    pub field_id: Uuid,
    pub value_text: Option<String>,
    pub value_file: Option<String>,
}

#[derive(Queryable, Selectable, Insertable, AsChangeset, Debug, Clone)]
#[diesel(table_name = ticket_processes)]
#[diesel(treat_none_as_null = true)]
pub struct ProcessRow {
    pub id: Uuid,
    pub form_id: Uuid,
    pub workflow_template_id: Option<Uuid>,
    pub entry_id: Option<Uuid>,
    pub ticket_data: Value,
    pub stage_cursor: i32,
    pub outcome: Option<String>,
    pub created: DateTime<Utc>,
    pub finished: Option<DateTime<Utc>>,
}

/// UPDATE acotado: `None` = columna fuera del SET, `Some(None)` = NULL.
#[derive(AsChangeset, Debug, Clone, Default)]
#[diesel(table_name = ticket_processes)]
pub struct ProcessChangeset {
    pub entry_id: Option<Option<Uuid>>,
    pub ticket_data: Option<Value>,
    pub stage_cursor: Option<i32>,
    pub outcome: Option<Option<String>>,
    pub finished: Option<Option<DateTime<Utc>>>,
}

impl ProcessChangeset {
    pub fn is_empty(&self) -> bool {
        self.entry_id.is_none()
        && self.ticket_data.is_none()
        && self.stage_cursor.is_none()
        && self.outcome.is_none()
        && self.finished.is_none()
    }
}

#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = process_decisions)]
pub struct DecisionRow {
    pub process_id: Uuid,
    pub role: String,
    pub decision: String,
    pub comment: String,
    pub decided_by: String,
    pub decided_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = process_events)]
pub struct NewEventRow<'a> {
    pub process_id: &'a Uuid,
    pub event_type: &'a str,
    pub payload: &'a Value,
}

#[derive(Queryable, Selectable, Debug)]
#[diesel(table_name = process_events)]
pub struct EventRow {
    pub seq: i64,
    pub process_id: Uuid,
    pub ts: DateTime<Utc>,
    pub event_type: String,
    pub payload: Value,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = email_outbox)]
pub struct NewOutboxRow<'a> {
    pub subject: &'a str,
    pub body_plain: &'a str,
    pub body_html: &'a str,
    pub recipients: &'a [String],
}

/// Correo pendiente o enviado en la tabla `email_outbox`.
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = email_outbox)]
pub struct OutboxRow {
    pub id: i64,
    pub subject: String,
    pub body_plain: String,
    pub body_html: String,
    pub recipients: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
}

pub(crate) fn to_i32(n: impl TryInto<i32>) -> i32 {
    n.try_into().unwrap_or(i32::MAX)
}

fn to_u32(n: i32) -> u32 {
    u32::try_from(n).unwrap_or(0)
}

// --- plantillas ---

pub fn template_rows(template: &WorkflowTemplate) -> (TemplateRow, Vec<StageRow>) {
    let row = TemplateRow { id: template.id,
                            name: template.name.clone(),
                            description: template.description.clone(),
                            created: template.created,
                            updated: template.updated };
    let stages = template.stages
                         .iter()
                         .map(|s| StageRow { id: s.id,
                                             template_id: template.id,
                                             stage_order: to_i32(s.order),
                                             name: s.name.clone(),
                                             role: s.role.code().to_string(),
                                             show_in_diagram: s.show_in_diagram })
                         .collect();
    (row, stages)
}

pub fn template_from_rows(row: TemplateRow, stages: Vec<StageRow>) -> Result<WorkflowTemplate, PersistenceError> {
    let stages = stages.into_iter()
                       .map(|s| {
                           Ok(Stage { id: s.id,
                                      order: to_u32(s.stage_order),
                                      name: s.name,
                                      role: Role::from_code(&s.role)?,
                                      show_in_diagram: s.show_in_diagram })
                       })
                       .collect::<Result<Vec<_>, PersistenceError>>()?;
    Ok(WorkflowTemplate { id: row.id,
                          name: row.name,
                          description: row.description,
                          created: row.created,
                          updated: row.updated,
                          stages })
}

// --- formularios ---

pub fn form_row(form: &Form) -> FormRow {
    FormRow { id: form.id,
              name: form.name.clone(),
              workflow_template_id: form.workflow_template_id,
              notify_emails: form.notify_emails.clone(),
              created: form.created }
}

pub fn field_row(form_id: Uuid, field: &FieldDefinition) -> FieldRow {
    FieldRow { id: field.id,
               form_id,
               label: field.label.clone(),
               field_type: field.kind.code().to_string(),
               role: field.role.code().to_string(),
               field_order: to_i32(field.order),
               required: field.required,
               readonly: field.readonly,
               hidden: field.hidden,
               regex: field.regex.clone(),
               min_value: field.min_value,
               max_value: field.max_value,
               max_length: field.max_length.map(to_i32),
               choices: field.choices.clone(),
               default_value: field.default_value.clone(),
               placeholder: field.placeholder.clone(),
               help_text: field.help_text.clone() }
}

fn field_from_row(row: FieldRow) -> Result<FieldDefinition, PersistenceError> {
    Ok(FieldDefinition { id: row.id,
                         label: row.label,
                         kind: FieldKind::from_code(&row.field_type),
                         role: Role::from_code(&row.role)?,
                         order: to_u32(row.field_order),
                         required: row.required,
                         readonly: row.readonly,
                         hidden: row.hidden,
                         regex: row.regex,
                         min_value: row.min_value,
                         max_value: row.max_value,
                         max_length: row.max_length.and_then(|n| u32::try_from(n).ok()),
                         choices: row.choices,
                         default_value: row.default_value,
                         placeholder: row.placeholder,
                         help_text: row.help_text })
}

pub fn form_from_rows(row: FormRow, fields: Vec<FieldRow>) -> Result<Form, PersistenceError> {
    let fields = fields.into_iter().map(field_from_row).collect::<Result<Vec<_>, _>>()?;
    Ok(Form { id: row.id,
              name: row.name,
              workflow_template_id: row.workflow_template_id,
              notify_emails: row.notify_emails,
              created: row.created,
              fields })
}

// --- entries ---

pub fn entry_row(entry: &Entry) -> EntryRow {
    EntryRow { id: entry.id,
               form_id: entry.form_id,
               submitted_by: entry.submitted_by.clone(),
               submitted_at: entry.submitted_at }
}

pub fn value_row(entry_id: Uuid, value: &FieldValue) -> NewValueRow {
    let (value_text, value_file) = match &value.value {
        StoredValue::Text(text) => (Some(text.clone()), None),
        StoredValue::File(file) => (None, Some(file.name.clone())),
    };
    NewValueRow { entry_id,
                  field_id: value.field_id,
                  value_text,
                  value_file }
}

pub fn entry_from_rows(row: EntryRow, values: Vec<ValueRow>) -> Entry {
    let mut map = IndexMap::with_capacity(values.len());
    for v in values {
        let value = match (v.value_text, v.value_file) {
            (_, Some(name)) => StoredValue::File(FileRef::new(name)),
            (text, None) => StoredValue::Text(text.unwrap_or_default()),
        };
        map.insert(v.field_id,
                   FieldValue { field_id: v.field_id,
                                value });
    }
    Entry { id: row.id,
            form_id: row.form_id,
            submitted_by: row.submitted_by,
            submitted_at: row.submitted_at,
            values: map }
}

// --- procesos ---

/// JSONB no conserva el orden de claves; el snapshot se guarda como lista de
/// pares `[label, valor]`.
pub fn snapshot_to_json(snapshot: &Snapshot) -> Value {
    Value::Array(snapshot.iter()
                         .map(|(k, v)| Value::Array(vec![Value::String(k.clone()), Value::String(v.clone())]))
                         .collect())
}

pub fn snapshot_from_json(value: Value) -> Result<Snapshot, PersistenceError> {
    let pairs: Vec<(String, String)> = serde_json::from_value(value)?;
    Ok(Snapshot(pairs.into_iter().collect()))
}

fn parse_outcome(code: &str) -> Result<ProcessOutcome, PersistenceError> {
    match code {
        "completed" => Ok(ProcessOutcome::Completed),
        "rejected" => Ok(ProcessOutcome::Rejected),
        other => Err(PersistenceError::InvalidRow(format!("unknown outcome {other}"))),
    }
}

pub fn process_row(process: &TicketProcess) -> ProcessRow {
    ProcessRow { id: process.id,
                 form_id: process.form_id,
                 workflow_template_id: process.workflow_template_id,
                 entry_id: process.entry_id,
                 ticket_data: snapshot_to_json(&process.ticket_data),
                 stage_cursor: to_i32(process.stage_cursor),
                 outcome: process.outcome.map(|o| o.as_str().to_string()),
                 created: process.created,
                 finished: process.finished }
}

pub fn decision_row(process_id: Uuid, role: Role, decision: &RoleDecision) -> DecisionRow {
    DecisionRow { process_id,
                  role: role.code().to_string(),
                  decision: decision.decision.as_str().to_string(),
                  comment: decision.comment.clone(),
                  decided_by: decision.decided_by.clone(),
                  decided_at: decision.decided_at }
}

pub fn process_from_rows(row: ProcessRow, decisions: Vec<DecisionRow>) -> Result<TicketProcess, PersistenceError> {
    let mut map = BTreeMap::new();
    for d in decisions {
        let role = Role::from_code(&d.role)?;
        map.insert(role,
                   RoleDecision { decision: d.decision.parse::<Decision>()?,
                                  comment: d.comment,
                                  decided_by: d.decided_by,
                                  decided_at: d.decided_at });
    }
    Ok(TicketProcess { id: row.id,
                       form_id: row.form_id,
                       workflow_template_id: row.workflow_template_id,
                       entry_id: row.entry_id,
                       decisions: map,
                       ticket_data: snapshot_from_json(row.ticket_data)?,
                       stage_cursor: usize::try_from(row.stage_cursor).unwrap_or(0),
                       outcome: row.outcome.as_deref().map(parse_outcome).transpose()?,
                       created: row.created,
                       finished: row.finished })
}

// --- eventos ---

/// Payload = enum completo serializado; `event_type` duplica la variante en
/// minúsculas para el CHECK de la tabla.
pub fn event_payload(kind: &ProcessEventKind) -> Result<Value, PersistenceError> {
    Ok(serde_json::to_value(kind)?)
}

/// `None` si el payload no deserializa (fila ajena al enum actual).
pub fn event_from_row(row: EventRow) -> Option<ProcessEvent> {
    let kind: ProcessEventKind = serde_json::from_value(row.payload).ok()?;
    Some(ProcessEvent { seq: u64::try_from(row.seq).ok()?,
                        process_id: row.process_id,
                        kind,
                        ts: row.ts })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_json_keeps_label_order() {
        let mut map = IndexMap::new();
        map.insert("Zeta".to_string(), "1".to_string());
        map.insert("Alpha".to_string(), "2".to_string());
        let json = snapshot_to_json(&Snapshot(map.clone()));
        assert_eq!(json, serde_json::json!([["Zeta", "1"], ["Alpha", "2"]]));
        assert_eq!(snapshot_from_json(json).unwrap(), Snapshot(map));
    }

    #[test]
    fn process_rows_map_back_to_domain() {
        let mut process = TicketProcess::new(Uuid::new_v4(), None);
        process.record_decision(Role::Champion,
                                RoleDecision { decision: Decision::Rejected,
                                               comment: "no".into(),
                                               decided_by: "bob".into(),
                                               decided_at: Utc::now() });
        process.outcome = Some(ProcessOutcome::Rejected);
        process.stage_cursor = 2;
        let row = process_row(&process);
        assert_eq!(row.outcome.as_deref(), Some("rejected"));
        let decisions = vec![decision_row(process.id, Role::Champion, &process.decisions[&Role::Champion])];
        assert_eq!(decisions[0].role, "dev");
        let back = process_from_rows(row, decisions).unwrap();
        assert_eq!(back, process);
    }

    #[test]
    fn bad_role_code_is_an_invalid_row() {
        let row = DecisionRow { process_id: Uuid::new_v4(),
                                role: "admin".into(),
                                decision: "approved".into(),
                                comment: String::new(),
                                decided_by: "x".into(),
                                decided_at: Utc::now() };
        let process = process_row(&TicketProcess::new(Uuid::new_v4(), None));
        assert!(matches!(process_from_rows(process, vec![row]), Err(PersistenceError::InvalidRow(_))));
    }

    #[test]
    fn file_values_win_over_text() {
        let entry_id = Uuid::new_v4();
        let field_id = Uuid::new_v4();
        let entry = entry_from_rows(EntryRow { id: entry_id,
                                               form_id: Uuid::new_v4(),
                                               submitted_by: None,
                                               submitted_at: Utc::now() },
                                    vec![ValueRow { id: 1,
                                                    entry_id,
                                                    field_id,
                                                    value_text: None,
                                                    value_file: Some("a.pdf".into()) }]);
        assert_eq!(entry.display_value(field_id), Some("a.pdf"));
    }
}
