// control.rs
use indexmap::IndexMap;
use regex::Regex;
use ticket_domain::FieldId;

/// Tipo de control generado para un campo. Variante cerrada: cada
/// `FieldKind` mapea exactamente a una de estas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlKind {
    Text { max_length: u32 },
    Textarea { rows: u32 },
    Select { choices: Vec<String> },
    Radio { choices: Vec<String> },
    /// Upload control.
    File,
    /// Read-only text showing the stored file name, used when a form is
    /// rendered in review mode.
    FileName,
    Email,
    Date,
    Integer { min: Option<i64>, max: Option<i64> },
    Checkbox,
    /// Generic single-line text for unknown field kinds.
    Fallback,
}

impl ControlKind {
    /// Nombre del widget para la capa de presentación.
    pub fn widget(&self) -> &'static str {
        match self {
            Self::Text { .. } | Self::FileName | Self::Fallback => "text_input",
            Self::Textarea { .. } => "textarea",
            Self::Select { .. } => "select",
            Self::Radio { .. } => "radio_select",
            Self::File => "file_input",
            Self::Email => "email_input",
            Self::Date => "date_input",
            Self::Integer { .. } => "number_input",
            Self::Checkbox => "checkbox_input",
        }
    }

    pub fn is_upload(&self) -> bool {
        matches!(self, Self::File)
    }

    pub fn choices(&self) -> &[String] {
        match self {
            Self::Select { choices } | Self::Radio { choices } => choices,
            _ => &[],
        }
    }
}

/// Control listo para renderizar y validar.
#[derive(Debug, Clone)]
pub struct Control {
    pub key: String,
    pub field_id: FieldId,
    pub label: String,
    pub kind: ControlKind,
    pub required: bool,
    pub readonly: bool,
    /// Disabled controls ignore posted data and keep `initial`.
    pub disabled: bool,
    pub initial: Option<String>,
    pub help_text: String,
    /// Atributos del widget (`placeholder`, `rows`, `readonly`, `disabled`).
    pub attrs: IndexMap<String, String>,
    pub pattern: Option<Regex>,
}

impl Control {
    /// Checkbox state derived from `initial`.
    pub fn checked(&self) -> bool {
        matches!(self.initial.as_deref(), Some("True" | "true" | "1"))
    }

    pub(crate) fn lock(&mut self) {
        self.required = false;
        self.readonly = true;
        self.disabled = true;
        self.attrs.insert("readonly".to_string(), "true".to_string());
        self.attrs.insert("disabled".to_string(), "true".to_string());
    }
}
