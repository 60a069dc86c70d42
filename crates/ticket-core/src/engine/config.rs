use crate::forms::FileRules;

pub const DEFAULT_START_URL: &str = "/ticketflow/ticket/start/";

/// Parámetros del motor que no dependen del backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Process-start entry point used by `start_redirect`.
    pub start_url: String,
    pub submission_prefix: String,
    pub completion_prefix: String,
    pub file_rules: FileRules,
    /// Labels hidden on every stage view (shown in the summary instead).
    pub stage_exclude_labels: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { start_url: DEFAULT_START_URL.to_string(),
               submission_prefix: "New submission".to_string(),
               completion_prefix: "Ticket completed".to_string(),
               file_rules: FileRules::default(),
               stage_exclude_labels: vec!["Description".to_string()] }
    }
}
