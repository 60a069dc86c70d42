//! Integración con el plugin de workflow: cursor de etapas y cierre.
//!
//! El motor nunca mueve el cursor por sí mismo; delega en un
//! `WorkflowPlugin` inyectado. `LinearWorkflow` es la implementación
//! incluida: recorre las etapas de la plantilla en orden.

mod linear;

use chrono::{DateTime, Utc};
use ticket_domain::{Decision, ProcessOutcome, Role, TicketProcess, WorkflowTemplate};

pub use linear::{LinearWorkflow, RejectionPolicy};

/// Resultado de completar la etapa actual.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
    Advanced { from: Role, next: Role },
    Finished { from: Role, outcome: ProcessOutcome },
}

impl StageOutcome {
    pub fn from_role(&self) -> Role {
        match self {
            Self::Advanced { from, .. } | Self::Finished { from, .. } => *from,
        }
    }

    pub fn next_role(&self) -> Option<Role> {
        match self {
            Self::Advanced { next, .. } => Some(*next),
            Self::Finished { .. } => None,
        }
    }
}

pub trait WorkflowPlugin {
    /// Roles de las etapas, en orden.
    fn stages(&self, template: Option<&WorkflowTemplate>) -> Vec<Role>;

    /// Rol dueño de la etapa actual; `None` cuando el proceso terminó.
    fn current_stage(&self, process: &TicketProcess, template: Option<&WorkflowTemplate>) -> Option<Role> {
        if process.is_finished() {
            return None;
        }
        self.stages(template).get(process.stage_cursor).copied()
    }

    /// Completa la etapa actual con `decision`. Mueve el cursor y, en la
    /// última etapa, fija `finished` y `outcome`. Devuelve `None` si no hay
    /// etapa abierta.
    fn complete_stage(&self,
                      process: &mut TicketProcess,
                      template: Option<&WorkflowTemplate>,
                      decision: Decision,
                      at: DateTime<Utc>)
                      -> Option<StageOutcome>;
}
