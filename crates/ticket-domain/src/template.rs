//! Plantillas de workflow reutilizables: lista ordenada de etapas, cada una
//! ligada a un rol.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Role;

pub type TemplateId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    pub id: Uuid,
    pub order: u32,
    pub name: String,
    pub role: Role,
    /// Whether the stage is drawn in the workflow diagram.
    pub show_in_diagram: bool,
}

impl Stage {
    pub fn new(order: u32, name: impl Into<String>, role: Role) -> Self {
        Self { id: Uuid::new_v4(),
               order,
               name: name.into(),
               role,
               show_in_diagram: true }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowTemplate {
    pub id: TemplateId,
    pub name: String,
    pub description: String,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub stages: Vec<Stage>,
}

impl WorkflowTemplate {
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self { id: Uuid::new_v4(),
               name: name.into(),
               description: String::new(),
               created: now,
               updated: now,
               stages: Vec::new() }
    }

    /// Template with one stage per role, in approval order.
    pub fn linear(name: impl Into<String>) -> Self {
        let mut template = Self::new(name);
        template.stages = Role::ALL.iter()
                                   .enumerate()
                                   .map(|(i, role)| Stage::new(i as u32 + 1, format!("{} review", role.display_name()), *role))
                                   .collect();
        template
    }

    pub fn with_stage(mut self, stage: Stage) -> Self {
        self.stages.push(stage);
        self.updated = Utc::now();
        self
    }

    /// Stages sorted by (`order`, `id`).
    pub fn stages_in_order(&self) -> Vec<&Stage> {
        let mut stages: Vec<&Stage> = self.stages.iter().collect();
        stages.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.id.cmp(&b.id)));
        stages
    }
}
