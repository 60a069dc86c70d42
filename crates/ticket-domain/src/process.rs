//! Instancia del workflow de aprobación (`TicketProcess`) y su snapshot
//! desnormalizado.
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entry::EntryId;
use crate::form::FormId;
use crate::template::TemplateId;
use crate::{Decision, Role};

pub type ProcessId = Uuid;

/// Vista label -> valor del `Entry`, en orden de declaración de campos.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot(pub IndexMap<String, String>);

impl Snapshot {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, label: &str) -> Option<&str> {
        self.0.get(label).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.0.iter()
    }
}

/// Decision slot of one role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleDecision {
    pub decision: Decision,
    pub comment: String,
    pub decided_by: String,
    pub decided_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessOutcome {
    Completed,
    Rejected,
}

impl ProcessOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Rejected => "rejected",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketProcess {
    pub id: ProcessId,
    pub form_id: FormId,
    pub workflow_template_id: Option<TemplateId>,
    pub entry_id: Option<EntryId>,
    pub decisions: BTreeMap<Role, RoleDecision>,
    /// Último estado conocido del `Entry` (label -> valor).
    pub ticket_data: Snapshot,
    /// Index of the current stage as reported by the workflow plugin.
    pub stage_cursor: usize,
    pub outcome: Option<ProcessOutcome>,
    pub created: DateTime<Utc>,
    pub finished: Option<DateTime<Utc>>,
}

impl TicketProcess {
    pub fn new(form_id: FormId, workflow_template_id: Option<TemplateId>) -> Self {
        Self { id: Uuid::new_v4(),
               form_id,
               workflow_template_id,
               entry_id: None,
               decisions: BTreeMap::new(),
               ticket_data: Snapshot::default(),
               stage_cursor: 0,
               outcome: None,
               created: Utc::now(),
               finished: None }
    }

    pub fn decision_for(&self, role: Role) -> Option<&RoleDecision> {
        self.decisions.get(&role)
    }

    pub fn record_decision(&mut self, role: Role, decision: RoleDecision) {
        self.decisions.insert(role, decision);
    }

    pub fn is_finished(&self) -> bool {
        self.finished.is_some()
    }

    /// `{role display name: decision or "-"}` in approval order.
    pub fn status_row(&self) -> IndexMap<&'static str, String> {
        Role::ALL.iter()
                 .map(|role| {
                     let shown = self.decision_for(*role)
                                     .map(|d| d.decision.as_str().to_string())
                                     .unwrap_or_else(|| "-".to_string());
                     (role.display_name(), shown)
                 })
                 .collect()
    }
}
