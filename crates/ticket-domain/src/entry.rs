// entry.rs
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::form::{FieldId, FormId};

pub type EntryId = Uuid;

/// Referencia a un archivo ya almacenado por el colaborador externo de
/// almacenamiento. El core sólo conserva el nombre.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileRef {
    pub name: String,
}

impl FileRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Valor almacenado de un campo: texto o archivo, nunca ambos.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum StoredValue {
    Text(String),
    File(FileRef),
}

impl StoredValue {
    /// Display form: the text itself or the stored file name.
    pub fn display(&self) -> &str {
        match self {
            Self::Text(text) => text,
            Self::File(file) => &file.name,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::File(_) => None,
        }
    }

    pub fn as_file(&self) -> Option<&FileRef> {
        match self {
            Self::Text(_) => None,
            Self::File(file) => Some(file),
        }
    }
}

impl Default for StoredValue {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldValue {
    pub field_id: FieldId,
    pub value: StoredValue,
}

/// Registro acumulado de un proceso: un valor por campo, indexado por la
/// identidad del campo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub id: EntryId,
    pub form_id: FormId,
    pub submitted_by: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub values: IndexMap<FieldId, FieldValue>,
}

impl Entry {
    pub fn new(form_id: FormId, submitted_by: Option<String>) -> Self {
        Self { id: Uuid::new_v4(),
               form_id,
               submitted_by,
               submitted_at: Utc::now(),
               values: IndexMap::new() }
    }

    pub fn value(&self, field_id: FieldId) -> Option<&FieldValue> {
        self.values.get(&field_id)
    }

    /// Create-or-fetch: returns the row for `field_id`, inserting an empty text
    /// row when absent.
    pub fn value_mut(&mut self, field_id: FieldId) -> &mut FieldValue {
        self.values
            .entry(field_id)
            .or_insert_with(|| FieldValue { field_id,
                                            value: StoredValue::default() })
    }

    pub fn display_value(&self, field_id: FieldId) -> Option<&str> {
        self.value(field_id).map(|v| v.value.display())
    }

    /// Initial-value map keyed by field id string, as consumed by the form
    /// builder.
    pub fn initial_map(&self) -> IndexMap<String, String> {
        self.values
            .values()
            .map(|v| (v.field_id.to_string(), v.value.display().to_string()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_mut_creates_once() {
        let mut entry = Entry::new(Uuid::new_v4(), None);
        let field = Uuid::new_v4();
        entry.value_mut(field).value = StoredValue::Text("a".into());
        entry.value_mut(field);
        assert_eq!(entry.values.len(), 1);
        assert_eq!(entry.display_value(field), Some("a"));
    }

    #[test]
    fn file_display_is_name() {
        let v = StoredValue::File(FileRef::new("report.pdf"));
        assert_eq!(v.display(), "report.pdf");
        assert!(v.as_text().is_none());
    }
}
