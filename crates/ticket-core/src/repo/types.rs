//! Traits de repositorio y unidad de commit de una transición.
//!
//! Una transición del motor se calcula completa en memoria y se entrega al
//! repositorio como un único `TransitionCommit`: proceso, entry, ids de
//! campos tocados y eventos. El repositorio lo aplica todo o nada.
use serde::{Deserialize, Serialize};
use ticket_domain::{Entry, EntryId, FieldId, Form, FormId, ProcessId, Role, TemplateId, TicketProcess, WorkflowTemplate};

use crate::errors::RepoError;
use crate::event::{EventStore, ProcessEvent, ProcessEventKind};

/// Columnas del proceso que admiten actualización parcial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProcessColumn {
    Entry,
    TicketData,
    Decision(Role),
    StageCursor,
    Outcome,
    Finished,
}

impl ProcessColumn {
    /// Copia la columna de `from` en `into`.
    pub fn apply(&self, from: &TicketProcess, into: &mut TicketProcess) {
        match self {
            Self::Entry => into.entry_id = from.entry_id,
            Self::TicketData => into.ticket_data = from.ticket_data.clone(),
            Self::Decision(role) => match from.decisions.get(role) {
                Some(d) => {
                    into.decisions.insert(*role, d.clone());
                }
                None => {
                    into.decisions.remove(role);
                }
            },
            Self::StageCursor => into.stage_cursor = from.stage_cursor,
            Self::Outcome => into.outcome = from.outcome,
            Self::Finished => into.finished = from.finished,
        }
    }
}

/// Alcance de escritura del proceso.
///
/// `Fields` pide una actualización acotada a ciertas columnas. Si la fila no
/// existe o la actualización es rechazada, el repositorio cae a un guardado
/// completo dentro de la misma transacción; el llamador no lo ve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitScope {
    Full,
    Fields(Vec<ProcessColumn>),
}

#[derive(Debug, Clone)]
pub struct TransitionCommit {
    pub process: TicketProcess,
    pub entry: Option<Entry>,
    /// Field values of `entry` written by this transition.
    pub touched: Vec<FieldId>,
    pub events: Vec<ProcessEventKind>,
    pub scope: CommitScope,
}

pub trait FormRepository {
    fn get_form(&self, id: FormId) -> Result<Option<Form>, RepoError>;
    fn list_forms(&self) -> Result<Vec<Form>, RepoError>;
    fn save_form(&mut self, form: &Form) -> Result<(), RepoError>;
    fn get_template(&self, id: TemplateId) -> Result<Option<WorkflowTemplate>, RepoError>;
    fn save_template(&mut self, template: &WorkflowTemplate) -> Result<(), RepoError>;
}

pub trait ProcessRepository {
    fn get_process(&self, id: ProcessId) -> Result<Option<TicketProcess>, RepoError>;
    fn list_processes(&self, form_id: Option<FormId>) -> Result<Vec<TicketProcess>, RepoError>;
    fn get_entry(&self, id: EntryId) -> Result<Option<Entry>, RepoError>;
    /// Aplica la transición de forma atómica y devuelve los eventos ya
    /// numerados.
    fn commit(&mut self, commit: TransitionCommit) -> Result<Vec<ProcessEvent>, RepoError>;
}

/// Backend completo que necesita el motor.
pub trait TicketStore: FormRepository + ProcessRepository + EventStore {}

impl<T> TicketStore for T where T: FormRepository + ProcessRepository + EventStore {}
