//! `PgTicketStore`: repositorios y EventStore sobre Postgres.
//!
//! Lecturas y escrituras pasan por `with_retry`. Un `TransitionCommit` se
//! aplica en una transacción read-write: entry (sólo valores tocados),
//! proceso, decisiones y eventos. La actualización acotada del proceso corre
//! bajo un savepoint; si la fila no existe se hace un upsert completo en la
//! misma transacción.
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::upsert::excluded;
use log::{debug, error, warn};
use ticket_core::{CommitScope, EventStore, FormRepository, ProcessColumn, ProcessEvent, ProcessEventKind, ProcessRepository,
                  RepoError, TransitionCommit};
use ticket_domain::{Entry, EntryId, FieldId, Form, FormId, ProcessId, Role, TemplateId, TicketProcess, WorkflowTemplate};
use uuid::Uuid;

use super::rows::{decision_row, entry_from_rows, entry_row, event_from_row, event_payload, field_row, form_from_rows, form_row,
                  process_from_rows, process_row, snapshot_to_json, template_from_rows, template_rows, to_i32, value_row, DecisionRow,
                  EntryRow, EventRow, FieldRow, FormRow, NewEventRow, NewValueRow, ProcessChangeset, ProcessRow, StageRow,
                  TemplateRow, ValueRow};
use super::{with_retry, ConnectionProvider};
use crate::error::PersistenceError;
use crate::schema::{form_entries, form_entry_values, form_fields, forms, process_decisions, process_events, ticket_processes,
                    workflow_stages, workflow_templates};

pub struct PgTicketStore<P: ConnectionProvider> {
    provider: P,
}

impl<P: ConnectionProvider> PgTicketStore<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Ejecuta `f` con una conexión del provider, con reintentos.
    fn read<T>(&self, f: impl Fn(&mut PgConnection) -> Result<T, PersistenceError>) -> Result<T, PersistenceError> {
        with_retry(|| {
            let mut conn = self.provider.connection()?;
            f(&mut conn)
        })
    }

    /// Igual que `read` pero dentro de una transacción read-write.
    fn write<T>(&self, f: impl Fn(&mut PgConnection) -> Result<T, PersistenceError>) -> Result<T, PersistenceError> {
        with_retry(|| {
            let mut conn = self.provider.connection()?;
            conn.build_transaction().read_write().run(|tx| f(tx))
        })
    }
}

// --- plantillas ---

fn load_template(conn: &mut PgConnection, id: TemplateId) -> Result<Option<WorkflowTemplate>, PersistenceError> {
    let row: Option<TemplateRow> = workflow_templates::table.find(id)
                                                            .select(TemplateRow::as_select())
                                                            .first(conn)
                                                            .optional()?;
    let Some(row) = row else { return Ok(None) };
    let stages: Vec<StageRow> = workflow_stages::table.filter(workflow_stages::template_id.eq(id))
                                                      .order((workflow_stages::stage_order.asc(), workflow_stages::id.asc()))
                                                      .select(StageRow::as_select())
                                                      .load(conn)?;
    Ok(Some(template_from_rows(row, stages)?))
}

fn write_template(conn: &mut PgConnection, template: &WorkflowTemplate) -> Result<(), PersistenceError> {
    let (row, stages) = template_rows(template);
    diesel::insert_into(workflow_templates::table).values(&row)
                                                  .on_conflict(workflow_templates::id)
                                                  .do_update()
                                                  .set(&row)
                                                  .execute(conn)?;
    diesel::delete(workflow_stages::table.filter(workflow_stages::template_id.eq(template.id))).execute(conn)?;
    if !stages.is_empty() {
        diesel::insert_into(workflow_stages::table).values(&stages).execute(conn)?;
    }
    Ok(())
}

// --- formularios ---

fn load_fields(conn: &mut PgConnection, form_ids: Vec<Uuid>) -> Result<HashMap<Uuid, Vec<FieldRow>>, PersistenceError> {
    let rows: Vec<FieldRow> = form_fields::table.filter(form_fields::form_id.eq_any(form_ids))
                                                .order((form_fields::field_order.asc(), form_fields::id.asc()))
                                                .select(FieldRow::as_select())
                                                .load(conn)?;
    let mut by_form: HashMap<Uuid, Vec<FieldRow>> = HashMap::new();
    for row in rows {
        by_form.entry(row.form_id).or_default().push(row);
    }
    Ok(by_form)
}

fn load_form(conn: &mut PgConnection, id: FormId) -> Result<Option<Form>, PersistenceError> {
    let row: Option<FormRow> = forms::table.find(id).select(FormRow::as_select()).first(conn).optional()?;
    let Some(row) = row else { return Ok(None) };
    let fields = load_fields(conn, vec![id])?.remove(&id).unwrap_or_default();
    Ok(Some(form_from_rows(row, fields)?))
}

fn load_forms(conn: &mut PgConnection) -> Result<Vec<Form>, PersistenceError> {
    let rows: Vec<FormRow> = forms::table.order(forms::name.asc()).select(FormRow::as_select()).load(conn)?;
    let mut fields = load_fields(conn, rows.iter().map(|r| r.id).collect())?;
    rows.into_iter()
        .map(|row| {
            let own = fields.remove(&row.id).unwrap_or_default();
            form_from_rows(row, own)
        })
        .collect()
}

fn write_form(conn: &mut PgConnection, form: &Form) -> Result<(), PersistenceError> {
    let row = form_row(form);
    diesel::insert_into(forms::table).values(&row)
                                     .on_conflict(forms::id)
                                     .do_update()
                                     .set(&row)
                                     .execute(conn)?;
    let keep: Vec<FieldId> = form.fields.iter().map(|f| f.id).collect();
    diesel::delete(form_fields::table.filter(form_fields::form_id.eq(form.id))
                                     .filter(form_fields::id.ne_all(keep))).execute(conn)?;
    for field in &form.fields {
        let row = field_row(form.id, field);
        diesel::insert_into(form_fields::table).values(&row)
                                               .on_conflict(form_fields::id)
                                               .do_update()
                                               .set(&row)
                                               .execute(conn)?;
    }
    Ok(())
}

// --- entries ---

fn load_entry(conn: &mut PgConnection, id: EntryId) -> Result<Option<Entry>, PersistenceError> {
    let row: Option<EntryRow> = form_entries::table.find(id).select(EntryRow::as_select()).first(conn).optional()?;
    let Some(row) = row else { return Ok(None) };
    let values: Vec<ValueRow> = form_entry_values::table.filter(form_entry_values::entry_id.eq(id))
                                                        .order(form_entry_values::id.asc())
                                                        .select(ValueRow::as_select())
                                                        .load(conn)?;
    Ok(Some(entry_from_rows(row, values)))
}

/// Entry nuevo: se escriben todos sus valores. Entry existente: sólo los
/// `touched`, con upsert por (entry_id, field_id).
fn write_entry(conn: &mut PgConnection, entry: &Entry, touched: &[FieldId]) -> Result<(), PersistenceError> {
    let inserted = diesel::insert_into(form_entries::table).values(&entry_row(entry))
                                                           .on_conflict(form_entries::id)
                                                           .do_nothing()
                                                           .execute(conn)?;
    let fresh = inserted == 1;
    let rows: Vec<NewValueRow> = entry.values
                                      .values()
                                      .filter(|v| fresh || touched.contains(&v.field_id))
                                      .map(|v| value_row(entry.id, v))
                                      .collect();
    if rows.is_empty() {
        return Ok(());
    }
    diesel::insert_into(form_entry_values::table).values(&rows)
                                                 .on_conflict((form_entry_values::entry_id, form_entry_values::field_id))
                                                 .do_update()
                                                 .set((form_entry_values::value_text.eq(excluded(form_entry_values::value_text)),
                                                       form_entry_values::value_file.eq(excluded(form_entry_values::value_file))))
                                                 .execute(conn)?;
    Ok(())
}

// --- procesos ---

fn attach_decisions(conn: &mut PgConnection, rows: Vec<ProcessRow>) -> Result<Vec<TicketProcess>, PersistenceError> {
    let ids: Vec<ProcessId> = rows.iter().map(|r| r.id).collect();
    let decisions: Vec<DecisionRow> = process_decisions::table.filter(process_decisions::process_id.eq_any(ids))
                                                              .select(DecisionRow::as_select())
                                                              .load(conn)?;
    let mut by_process: HashMap<Uuid, Vec<DecisionRow>> = HashMap::new();
    for d in decisions {
        by_process.entry(d.process_id).or_default().push(d);
    }
    rows.into_iter()
        .map(|row| {
            let own = by_process.remove(&row.id).unwrap_or_default();
            process_from_rows(row, own)
        })
        .collect()
}

fn load_process(conn: &mut PgConnection, id: ProcessId) -> Result<Option<TicketProcess>, PersistenceError> {
    let row: Option<ProcessRow> = ticket_processes::table.find(id).select(ProcessRow::as_select()).first(conn).optional()?;
    match row {
        Some(row) => Ok(attach_decisions(conn, vec![row])?.pop()),
        None => Ok(None),
    }
}

fn load_processes(conn: &mut PgConnection, form_id: Option<FormId>) -> Result<Vec<TicketProcess>, PersistenceError> {
    let mut query = ticket_processes::table.select(ProcessRow::as_select())
                                           .order((ticket_processes::created.asc(), ticket_processes::id.asc()))
                                           .into_boxed();
    if let Some(form_id) = form_id {
        query = query.filter(ticket_processes::form_id.eq(form_id));
    }
    let rows: Vec<ProcessRow> = query.load(conn)?;
    attach_decisions(conn, rows)
}

fn write_decision(conn: &mut PgConnection, process: &TicketProcess, role: Role) -> Result<(), PersistenceError> {
    use crate::schema::process_decisions::dsl as d;
    match process.decisions.get(&role) {
        Some(decision) => {
            let row = decision_row(process.id, role, decision);
            diesel::insert_into(d::process_decisions).values(&row)
                                                     .on_conflict((d::process_id, d::role))
                                                     .do_update()
                                                     .set((d::decision.eq(excluded(d::decision)),
                                                           d::comment.eq(excluded(d::comment)),
                                                           d::decided_by.eq(excluded(d::decided_by)),
                                                           d::decided_at.eq(excluded(d::decided_at))))
                                                     .execute(conn)?;
        }
        None => {
            diesel::delete(d::process_decisions.filter(d::process_id.eq(process.id))
                                               .filter(d::role.eq(role.code()))).execute(conn)?;
        }
    }
    Ok(())
}

fn full_save(conn: &mut PgConnection, process: &TicketProcess) -> Result<(), PersistenceError> {
    let row = process_row(process);
    diesel::insert_into(ticket_processes::table).values(&row)
                                                .on_conflict(ticket_processes::id)
                                                .do_update()
                                                .set(&row)
                                                .execute(conn)?;
    diesel::delete(process_decisions::table.filter(process_decisions::process_id.eq(process.id))).execute(conn)?;
    let decisions: Vec<DecisionRow> = process.decisions
                                             .iter()
                                             .map(|(role, d)| decision_row(process.id, *role, d))
                                             .collect();
    if !decisions.is_empty() {
        diesel::insert_into(process_decisions::table).values(&decisions).execute(conn)?;
    }
    Ok(())
}

fn changeset_for(process: &TicketProcess, columns: &[ProcessColumn]) -> ProcessChangeset {
    let mut changes = ProcessChangeset::default();
    for column in columns {
        match column {
            ProcessColumn::Entry => changes.entry_id = Some(process.entry_id),
            ProcessColumn::TicketData => changes.ticket_data = Some(snapshot_to_json(&process.ticket_data)),
            ProcessColumn::StageCursor => changes.stage_cursor = Some(to_i32(process.stage_cursor)),
            ProcessColumn::Outcome => changes.outcome = Some(process.outcome.map(|o| o.as_str().to_string())),
            ProcessColumn::Finished => changes.finished = Some(process.finished),
            ProcessColumn::Decision(_) => {}
        }
    }
    changes
}

/// UPDATE acotado a `columns`. `NotFound` si la fila no existe.
fn narrow_update(conn: &mut PgConnection, process: &TicketProcess, columns: &[ProcessColumn]) -> Result<(), PersistenceError> {
    let changes = changeset_for(process, columns);
    let matched = if changes.is_empty() {
        diesel::select(diesel::dsl::exists(ticket_processes::table.find(process.id))).get_result::<bool>(conn)?
    } else {
        diesel::update(ticket_processes::table.find(process.id)).set(&changes).execute(conn)? > 0
    };
    if !matched {
        return Err(PersistenceError::NotFound);
    }
    for column in columns {
        if let ProcessColumn::Decision(role) = column {
            write_decision(conn, process, *role)?;
        }
    }
    Ok(())
}

fn insert_event(conn: &mut PgConnection,
                process_id: ProcessId,
                kind: &ProcessEventKind)
                -> Result<(i64, DateTime<Utc>), PersistenceError> {
    let payload = event_payload(kind)?;
    let inserted = diesel::insert_into(process_events::table).values(NewEventRow { process_id: &process_id,
                                                                                   event_type: kind.event_type(),
                                                                                   payload: &payload })
                                                             .returning((process_events::seq, process_events::ts))
                                                             .get_result::<(i64, DateTime<Utc>)>(conn)?;
    Ok(inserted)
}

fn apply_commit(conn: &mut PgConnection, commit: &TransitionCommit) -> Result<Vec<(i64, DateTime<Utc>)>, PersistenceError> {
    let process = &commit.process;
    if let Some(entry) = &commit.entry {
        write_entry(conn, entry, &commit.touched)?;
    }
    match &commit.scope {
        CommitScope::Full => full_save(conn, process)?,
        CommitScope::Fields(columns) => {
            // Transacción anidada = savepoint; si falla sólo se revierte el
            // UPDATE acotado.
            if let Err(e) = conn.transaction(|sp| narrow_update(sp, process, columns)) {
                debug!("commit: narrow update rejected for process {} ({e}), falling back to full save",
                       process.id);
                full_save(conn, process)?;
            }
        }
    }
    commit.events.iter().map(|kind| insert_event(conn, process.id, kind)).collect()
}

impl<P: ConnectionProvider> FormRepository for PgTicketStore<P> {
    fn get_form(&self, id: FormId) -> Result<Option<Form>, RepoError> {
        Ok(self.read(|conn| load_form(conn, id))?)
    }

    fn list_forms(&self) -> Result<Vec<Form>, RepoError> {
        Ok(self.read(load_forms)?)
    }

    fn save_form(&mut self, form: &Form) -> Result<(), RepoError> {
        form.validate().map_err(|e| RepoError::Backend(e.to_string()))?;
        Ok(self.write(|conn| write_form(conn, form))?)
    }

    fn get_template(&self, id: TemplateId) -> Result<Option<WorkflowTemplate>, RepoError> {
        Ok(self.read(|conn| load_template(conn, id))?)
    }

    fn save_template(&mut self, template: &WorkflowTemplate) -> Result<(), RepoError> {
        Ok(self.write(|conn| write_template(conn, template))?)
    }
}

impl<P: ConnectionProvider> ProcessRepository for PgTicketStore<P> {
    fn get_process(&self, id: ProcessId) -> Result<Option<TicketProcess>, RepoError> {
        Ok(self.read(|conn| load_process(conn, id))?)
    }

    fn list_processes(&self, form_id: Option<FormId>) -> Result<Vec<TicketProcess>, RepoError> {
        Ok(self.read(|conn| load_processes(conn, form_id))?)
    }

    fn get_entry(&self, id: EntryId) -> Result<Option<Entry>, RepoError> {
        Ok(self.read(|conn| load_entry(conn, id))?)
    }

    fn commit(&mut self, commit: TransitionCommit) -> Result<Vec<ProcessEvent>, RepoError> {
        let inserted = self.write(|conn| apply_commit(conn, &commit)).map_err(|e| {
                                                                       error!("commit failed process={} err={e:?}",
                                                                              commit.process.id);
                                                                       e
                                                                   })?;
        let process_id = commit.process.id;
        let events: Vec<ProcessEvent> = commit.events
                                              .into_iter()
                                              .zip(inserted)
                                              .map(|(kind, (seq, ts))| ProcessEvent { seq: seq as u64,
                                                                                      process_id,
                                                                                      kind,
                                                                                      ts })
                                              .collect();
        debug!("commit: process={process_id} events={} touched={}", events.len(), commit.touched.len());
        Ok(events)
    }
}

impl<P: ConnectionProvider> EventStore for PgTicketStore<P> {
    fn append_kind(&mut self, process_id: Uuid, kind: ProcessEventKind) -> Result<ProcessEvent, RepoError> {
        let (seq, ts) = self.write(|conn| insert_event(conn, process_id, &kind))?;
        debug!("append_kind: process={process_id} seq={seq} kind={}", kind.event_type());
        Ok(ProcessEvent { seq: seq as u64,
                          process_id,
                          kind,
                          ts })
    }

    fn list(&self, process_id: Uuid) -> Result<Vec<ProcessEvent>, RepoError> {
        let rows: Vec<EventRow> = self.read(|conn| {
                                          Ok(process_events::table.filter(process_events::process_id.eq(process_id))
                                                                  .order(process_events::seq.asc())
                                                                  .select(EventRow::as_select())
                                                                  .load(conn)?)
                                      })?;
        let total = rows.len();
        let events: Vec<ProcessEvent> = rows.into_iter().filter_map(event_from_row).collect();
        if events.len() != total {
            warn!("list: skipped {} undecodable event(s) for process {process_id}", total - events.len());
        }
        Ok(events)
    }
}
