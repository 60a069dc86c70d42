//! Envíos, datos limpios y errores de validación.
use std::fmt;

use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use ticket_domain::FileRef;

use super::Upload;

/// Datos crudos enviados por la capa de presentación, indexados por la key
/// del control (id del campo).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub data: IndexMap<String, String>,
    pub files: IndexMap<String, Upload>,
}

impl Submission {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    pub fn with_file(mut self, key: impl Into<String>, upload: Upload) -> Self {
        self.files.insert(key.into(), upload);
        self
    }
}

/// Valor validado de un control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CleanedValue {
    Text(String),
    Integer(i64),
    Boolean(bool),
    Date(NaiveDate),
    Empty,
}

impl CleanedValue {
    /// Texto tal como se guarda en un `FieldValue`.
    pub fn to_text(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Integer(n) => n.to_string(),
            Self::Boolean(true) => "True".to_string(),
            Self::Boolean(false) => "False".to_string(),
            Self::Date(d) => d.format("%Y-%m-%d").to_string(),
            Self::Empty => String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanedData {
    pub values: IndexMap<String, CleanedValue>,
    /// Accepted uploads, already reduced to the reference kept in the entry.
    pub files: IndexMap<String, FileRef>,
}

impl CleanedData {
    pub fn text(&self, key: &str) -> Option<String> {
        self.values.get(key).map(CleanedValue::to_text)
    }
}

/// Errores por campo y errores generales del formulario.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrors {
    pub field_errors: IndexMap<String, Vec<String>>,
    pub non_field_errors: Vec<String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn non_field(message: impl Into<String>) -> Self {
        Self { field_errors: IndexMap::new(),
               non_field_errors: vec![message.into()] }
    }

    pub fn add(&mut self, key: impl Into<String>, message: impl Into<String>) {
        self.field_errors.entry(key.into()).or_default().push(message.into());
    }

    pub fn add_non_field(&mut self, message: impl Into<String>) {
        self.non_field_errors.push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.field_errors.is_empty() && self.non_field_errors.is_empty()
    }

    pub fn for_field(&self, key: &str) -> &[String] {
        self.field_errors.get(key).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = self.non_field_errors.clone();
        for (key, messages) in &self.field_errors {
            parts.push(format!("{key}: {}", messages.join(" ")));
        }
        write!(f, "{}", parts.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}
