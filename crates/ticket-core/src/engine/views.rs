//! Entradas y salidas del motor para la capa de presentación.
use indexmap::IndexMap;
use ticket_domain::{Form, FormId, ProcessId, Role, TicketProcess};

use crate::event::ProcessEvent;
use crate::forms::{DynamicForm, Submission};
use crate::notify::DispatchOutcome;

/// Formulario de inicio: campos del Representative del formulario elegido.
#[derive(Debug, Clone, Default)]
pub struct StartView {
    /// `None` when no form was selected or the id is unknown.
    pub form: Option<Form>,
    pub fields: DynamicForm,
}

#[derive(Debug, Clone)]
pub struct StartRequest {
    pub form_id: FormId,
    pub submitted_by: String,
    pub submission: Submission,
}

#[derive(Debug, Clone)]
pub struct StageView {
    pub process: TicketProcess,
    pub role: Role,
    pub role_display: &'static str,
    pub comment_label: String,
    pub fields: DynamicForm,
    pub summary_html: String,
    pub status_row: IndexMap<&'static str, String>,
    /// Rol dueño de la etapa abierta (puede diferir de `role`).
    pub current_stage: Option<Role>,
}

impl StageView {
    pub fn is_actionable(&self) -> bool {
        self.current_stage == Some(self.role)
    }
}

#[derive(Debug, Clone)]
pub struct StageSubmission {
    pub process_id: ProcessId,
    pub role: Role,
    /// Raw decision signal; only `approved` and `rejected` are accepted.
    pub decision: Option<String>,
    pub comment: String,
    pub decided_by: String,
    pub submission: Submission,
}

#[derive(Debug, Clone)]
pub struct TransitionResult {
    pub process: TicketProcess,
    pub events: Vec<ProcessEvent>,
    pub notification: Option<DispatchOutcome>,
}
