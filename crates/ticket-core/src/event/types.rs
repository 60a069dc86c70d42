//! Tipos de evento del proceso de aprobación y estructura `ProcessEvent`.
//!
//! Cada transición del `ApprovalEngine` emite eventos a un store
//! append-only. El log es la traza de auditoría del proceso: quién decidió
//! qué, qué campos se tocaron y cómo avanzó el cursor de etapas.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ticket_domain::{Decision, EntryId, FieldId, FormId, ProcessOutcome, Role};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProcessEventKind {
    /// Primer evento de un proceso. Fija la huella de la plantilla de
    /// workflow vigente al inicio.
    ProcessStarted {
        form_id: FormId,
        entry_id: EntryId,
        template_hash: String,
        started_by: String,
    },
    /// Valores de un rol aplicados al `Entry`; incluye el digest del snapshot
    /// resultante.
    ValuesMerged {
        role: Role,
        fields: Vec<FieldId>,
        snapshot_digest: String,
    },
    DecisionRecorded {
        role: Role,
        decision: Decision,
        decided_by: String,
    },
    /// Cursor movido. `next` es `None` cuando ya no quedan etapas.
    StageAdvanced {
        from: Role,
        next: Option<Role>,
        cursor: usize,
    },
    ProcessFinished { outcome: ProcessOutcome },
    NotificationSent { subject: String, recipients: Vec<String> },
    NotificationSkipped { subject: String },
    /// Mailer failure, logged and swallowed.
    NotificationSuppressed { subject: String, error: String },
}

impl ProcessEventKind {
    /// Nombre estable en minúsculas (columna `event_type` en Postgres).
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::ProcessStarted { .. } => "processstarted",
            Self::ValuesMerged { .. } => "valuesmerged",
            Self::DecisionRecorded { .. } => "decisionrecorded",
            Self::StageAdvanced { .. } => "stageadvanced",
            Self::ProcessFinished { .. } => "processfinished",
            Self::NotificationSent { .. } => "notificationsent",
            Self::NotificationSkipped { .. } => "notificationskipped",
            Self::NotificationSuppressed { .. } => "notificationsuppressed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessEvent {
    pub seq: u64,
    pub process_id: Uuid,
    pub kind: ProcessEventKind,
    pub ts: DateTime<Utc>,
}
