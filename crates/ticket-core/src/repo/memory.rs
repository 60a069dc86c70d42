//! Backend en memoria: referencia de comportamiento para tests y demo.
//!
//! `commit` prepara todas las filas nuevas antes de tocar el estado, así
//! una transición se aplica entera o no se aplica.
use std::collections::HashMap;

use log::debug;
use ticket_domain::{Entry, EntryId, Form, FormId, ProcessId, TemplateId, TicketProcess, WorkflowTemplate};
use uuid::Uuid;

use super::types::{CommitScope, FormRepository, ProcessRepository, TransitionCommit};
use crate::errors::RepoError;
use crate::event::{EventStore, InMemoryEventStore, ProcessEvent, ProcessEventKind};

#[derive(Debug, Default)]
pub struct InMemoryTicketStore {
    forms: HashMap<FormId, Form>,
    templates: HashMap<TemplateId, WorkflowTemplate>,
    processes: HashMap<ProcessId, TicketProcess>,
    entries: HashMap<EntryId, Entry>,
    events: InMemoryEventStore,
}

impl InMemoryTicketStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Número de procesos guardados.
    pub fn process_count(&self) -> usize {
        self.processes.len()
    }

    fn stage_process(&self, process: &TicketProcess, scope: &CommitScope) -> TicketProcess {
        match scope {
            CommitScope::Full => process.clone(),
            CommitScope::Fields(columns) => match self.processes.get(&process.id) {
                Some(existing) => {
                    let mut row = existing.clone();
                    for column in columns {
                        column.apply(process, &mut row);
                    }
                    row
                }
                None => {
                    debug!("commit: narrow update rejected for process {} (row absent), falling back to full save",
                           process.id);
                    process.clone()
                }
            },
        }
    }

    fn stage_entry(&self, entry: &Entry, touched: &[Uuid]) -> Entry {
        match self.entries.get(&entry.id) {
            Some(existing) => {
                let mut row = existing.clone();
                for field_id in touched {
                    if let Some(value) = entry.value(*field_id) {
                        row.values.insert(*field_id, value.clone());
                    }
                }
                row
            }
            None => entry.clone(),
        }
    }
}

impl FormRepository for InMemoryTicketStore {
    fn get_form(&self, id: FormId) -> Result<Option<Form>, RepoError> {
        Ok(self.forms.get(&id).cloned())
    }

    fn list_forms(&self) -> Result<Vec<Form>, RepoError> {
        let mut forms: Vec<Form> = self.forms.values().cloned().collect();
        forms.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(forms)
    }

    fn save_form(&mut self, form: &Form) -> Result<(), RepoError> {
        form.validate().map_err(|e| RepoError::Backend(e.to_string()))?;
        if self.forms.values().any(|f| f.name == form.name && f.id != form.id) {
            return Err(RepoError::Backend(format!("form name '{}' already exists", form.name)));
        }
        self.forms.insert(form.id, form.clone());
        Ok(())
    }

    fn get_template(&self, id: TemplateId) -> Result<Option<WorkflowTemplate>, RepoError> {
        Ok(self.templates.get(&id).cloned())
    }

    fn save_template(&mut self, template: &WorkflowTemplate) -> Result<(), RepoError> {
        if self.templates.values().any(|t| t.name == template.name && t.id != template.id) {
            return Err(RepoError::Backend(format!("template name '{}' already exists", template.name)));
        }
        self.templates.insert(template.id, template.clone());
        Ok(())
    }
}

impl ProcessRepository for InMemoryTicketStore {
    fn get_process(&self, id: ProcessId) -> Result<Option<TicketProcess>, RepoError> {
        Ok(self.processes.get(&id).cloned())
    }

    fn list_processes(&self, form_id: Option<FormId>) -> Result<Vec<TicketProcess>, RepoError> {
        let mut out: Vec<TicketProcess> = self.processes
                                              .values()
                                              .filter(|p| form_id.map_or(true, |f| p.form_id == f))
                                              .cloned()
                                              .collect();
        out.sort_by(|a, b| a.created.cmp(&b.created).then_with(|| a.id.cmp(&b.id)));
        Ok(out)
    }

    fn get_entry(&self, id: EntryId) -> Result<Option<Entry>, RepoError> {
        Ok(self.entries.get(&id).cloned())
    }

    fn commit(&mut self, commit: TransitionCommit) -> Result<Vec<ProcessEvent>, RepoError> {
        let TransitionCommit { process,
                               entry,
                               touched,
                               events,
                               scope } = commit;
        if !self.forms.contains_key(&process.form_id) {
            return Err(RepoError::NotFound(format!("form {}", process.form_id)));
        }
        let process_row = self.stage_process(&process, &scope);
        let entry_row = entry.as_ref().map(|e| self.stage_entry(e, &touched));

        if let Some(row) = entry_row {
            self.entries.insert(row.id, row);
        }
        self.processes.insert(process_row.id, process_row);
        let mut appended = Vec::with_capacity(events.len());
        for kind in events {
            appended.push(self.events.append_kind(process.id, kind)?);
        }
        debug!("commit: process={} events={} touched={}", process.id, appended.len(), touched.len());
        Ok(appended)
    }
}

impl EventStore for InMemoryTicketStore {
    fn append_kind(&mut self, process_id: Uuid, kind: ProcessEventKind) -> Result<ProcessEvent, RepoError> {
        self.events.append_kind(process_id, kind)
    }

    fn list(&self, process_id: Uuid) -> Result<Vec<ProcessEvent>, RepoError> {
        self.events.list(process_id)
    }
}
