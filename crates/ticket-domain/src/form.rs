// form.rs
use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{DomainError, Role};

pub type FormId = Uuid;
pub type FieldId = Uuid;

/// Tipo declarado de un campo dinámico.
///
/// Se persiste como texto. Los códigos desconocidos no se rechazan: se
/// conservan en `Other` y el builder los renderiza como texto simple.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldKind {
    Text,
    Textarea,
    Select,
    File,
    Email,
    Date,
    Number,
    Checkbox,
    Radio,
    Other(String),
}

impl FieldKind {
    pub fn code(&self) -> &str {
        match self {
            Self::Text => "text",
            Self::Textarea => "textarea",
            Self::Select => "select",
            Self::File => "file",
            Self::Email => "email",
            Self::Date => "date",
            Self::Number => "number",
            Self::Checkbox => "checkbox",
            Self::Radio => "radio",
            Self::Other(code) => code,
        }
    }

    pub fn from_code(code: &str) -> Self {
        match code {
            "text" => Self::Text,
            "textarea" => Self::Textarea,
            "select" => Self::Select,
            "file" => Self::File,
            "email" => Self::Email,
            "date" => Self::Date,
            "number" => Self::Number,
            "checkbox" => Self::Checkbox,
            "radio" => Self::Radio,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for FieldKind {
    fn from(code: String) -> Self {
        Self::from_code(&code)
    }
}

impl From<FieldKind> for String {
    fn from(kind: FieldKind) -> Self {
        kind.code().to_string()
    }
}

/// Definición configurada de un campo de formulario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub id: FieldId,
    pub label: String,
    pub kind: FieldKind,
    pub role: Role,
    pub order: u32,
    pub required: bool,
    pub readonly: bool,
    pub hidden: bool,
    pub regex: Option<String>,
    pub min_value: Option<i64>,
    pub max_value: Option<i64>,
    pub max_length: Option<u32>,
    /// Comma separated option list for select/radio fields.
    pub choices: Option<String>,
    pub default_value: Option<String>,
    pub placeholder: Option<String>,
    pub help_text: String,
}

impl FieldDefinition {
    pub fn new(label: impl Into<String>, kind: FieldKind, role: Role) -> Self {
        Self { id: Uuid::new_v4(),
               label: label.into(),
               kind,
               role,
               order: 0,
               required: false,
               readonly: false,
               hidden: false,
               regex: None,
               min_value: None,
               max_value: None,
               max_length: None,
               choices: None,
               default_value: None,
               placeholder: None,
               help_text: String::new() }
    }

    pub fn with_order(mut self, order: u32) -> Self {
        self.order = order;
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn readonly(mut self) -> Self {
        self.readonly = true;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn with_regex(mut self, pattern: impl Into<String>) -> Self {
        self.regex = Some(pattern.into());
        self
    }

    pub fn with_bounds(mut self, min: Option<i64>, max: Option<i64>) -> Self {
        self.min_value = min;
        self.max_value = max;
        self
    }

    pub fn with_max_length(mut self, max_length: u32) -> Self {
        self.max_length = Some(max_length);
        self
    }

    pub fn with_choices(mut self, choices: impl Into<String>) -> Self {
        self.choices = Some(choices.into());
        self
    }

    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    pub fn with_help_text(mut self, help: impl Into<String>) -> Self {
        self.help_text = help.into();
        self
    }

    /// Stable key used by rendered controls, submissions and uploads.
    pub fn key(&self) -> String {
        self.id.to_string()
    }

    /// Parsed option list. Blank items are dropped; a malformed or missing
    /// list yields no options.
    pub fn choice_list(&self) -> Vec<String> {
        self.choices
            .as_deref()
            .unwrap_or("")
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Contenedor con nombre de definiciones de campos.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Form {
    pub id: FormId,
    pub name: String,
    pub workflow_template_id: Option<Uuid>,
    /// Comma separated notification recipients.
    pub notify_emails: String,
    pub created: DateTime<Utc>,
    pub fields: Vec<FieldDefinition>,
}

impl Form {
    pub fn new(name: impl Into<String>) -> Self {
        Self { id: Uuid::new_v4(),
               name: name.into(),
               workflow_template_id: None,
               notify_emails: String::new(),
               created: Utc::now(),
               fields: Vec::new() }
    }

    pub fn with_template(mut self, template_id: Uuid) -> Self {
        self.workflow_template_id = Some(template_id);
        self
    }

    pub fn with_notify_emails(mut self, emails: impl Into<String>) -> Self {
        self.notify_emails = emails.into();
        self
    }

    /// Adds a field. When the field has no explicit order it is placed after
    /// the fields already present.
    pub fn with_field(mut self, mut field: FieldDefinition) -> Self {
        if field.order == 0 {
            field.order = self.fields.iter().map(|f| f.order).max().unwrap_or(0).saturating_add(1);
        }
        self.fields.push(field);
        self
    }

    /// Fields in render order: `order` first, then the order they were added.
    pub fn fields_in_order(&self) -> Vec<&FieldDefinition> {
        let mut fields: Vec<&FieldDefinition> = self.fields.iter().collect();
        // sort estable: a igual `order` queda el orden de inserción.
        fields.sort_by_key(|f| f.order);
        fields
    }

    pub fn fields_for_role(&self, role: Role) -> Vec<&FieldDefinition> {
        self.fields_in_order().into_iter().filter(|f| f.role == role).collect()
    }

    pub fn field(&self, id: FieldId) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.id == id)
    }

    pub fn field_by_label(&self, label: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.label == label)
    }

    pub fn has_workflow(&self) -> bool {
        self.workflow_template_id.is_some()
    }

    /// Trimmed, non-empty recipients from `notify_emails`.
    pub fn recipients(&self) -> Vec<String> {
        self.notify_emails
            .split(',')
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Snapshots are keyed by label, so labels must be unique in a form.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::ValidationError("form name must not be empty".to_string()));
        }
        let mut seen = HashSet::new();
        for field in &self.fields {
            if !seen.insert(field.label.as_str()) {
                return Err(DomainError::DuplicateLabel(field.label.clone()));
            }
        }
        Ok(())
    }
}
