//! Configuración central de la aplicación.
//! Lee variables `TICKETFLOW_*` (y `.env` si existe) y arma el `EngineConfig`
//! y la política de rechazo. La conexión a Postgres se configura aparte con
//! `ticket_persistence::DbConfig` (`DATABASE_URL`).
use std::env;

use once_cell::sync::Lazy;
use ticket_core::{EngineConfig, RejectionPolicy};

use crate::errors::AppError;

pub const ENV_START_URL: &str = "TICKETFLOW_START_URL";
pub const ENV_SUBMISSION_PREFIX: &str = "TICKETFLOW_SUBMISSION_PREFIX";
pub const ENV_COMPLETION_PREFIX: &str = "TICKETFLOW_COMPLETION_PREFIX";
pub const ENV_REJECTION_POLICY: &str = "TICKETFLOW_REJECTION_POLICY";
pub const ENV_MAX_UPLOAD_BYTES: &str = "TICKETFLOW_MAX_UPLOAD_BYTES";
pub const ENV_ALLOWED_EXTENSIONS: &str = "TICKETFLOW_ALLOWED_EXTENSIONS";
pub const ENV_STAGE_EXCLUDE: &str = "TICKETFLOW_STAGE_EXCLUDE";

static DOTENV_LOADED: Lazy<()> = Lazy::new(|| {
    let _ = dotenvy::dotenv();
});

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppConfig {
    pub engine: EngineConfig,
    pub rejection_policy: RejectionPolicy,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Lazy::force(&DOTENV_LOADED);
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Variables ausentes conservan el default. En las listas, un valor
    /// vacío significa lista vacía.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let mut cfg = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = non_empty(ENV_START_URL) {
            cfg.engine.start_url = v.trim().to_string();
        }
        if let Some(v) = non_empty(ENV_SUBMISSION_PREFIX) {
            cfg.engine.submission_prefix = v;
        }
        if let Some(v) = non_empty(ENV_COMPLETION_PREFIX) {
            cfg.engine.completion_prefix = v;
        }
        if let Some(v) = non_empty(ENV_REJECTION_POLICY) {
            cfg.rejection_policy = v.parse().map_err(|e| AppError::Config(format!("{ENV_REJECTION_POLICY}: {e}")))?;
        }
        if let Some(v) = non_empty(ENV_MAX_UPLOAD_BYTES) {
            cfg.engine.file_rules.max_bytes =
                v.trim()
                 .parse()
                 .map_err(|_| AppError::Config(format!("{ENV_MAX_UPLOAD_BYTES}: invalid byte count {v:?}")))?;
        }
        if let Some(v) = lookup(ENV_ALLOWED_EXTENSIONS) {
            cfg.engine.file_rules.allowed_extensions = split_list(&v).into_iter()
                                                                     .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
                                                                     .collect();
        }
        if let Some(v) = lookup(ENV_STAGE_EXCLUDE) {
            cfg.engine.stage_exclude_labels = split_list(&v);
        }
        Ok(cfg)
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty()).map(str::to_string).collect()
}
