//! Builder de formularios dinámicos.
//!
//! Reglas:
//! - Se filtran los campos por rol (si se indica); los `hidden` y los labels
//!   excluidos nunca generan control.
//! - Valor inicial: mapa por id > mapa por label > `default_value`. Un
//!   string vacío cuenta como ausente en cada nivel.
//! - `required` efectivo = `required && !readonly`.
//! - Campo readonly o formulario readonly: control no obligatorio, marcado
//!   `readonly` y `disabled`. Un control deshabilitado ignora lo enviado.
//! - Archivo en modo readonly: texto con el nombre almacenado, sin upload.
use chrono::NaiveDate;
use indexmap::IndexMap;
use log::warn;
use regex::Regex;
use ticket_domain::{FieldDefinition, FieldKind, FileRef, Form, Role};

use super::control::{Control, ControlKind};
use super::validation::{CleanedData, CleanedValue, Submission, ValidationErrors};
use super::{FileRules, INVALID_FORMAT, REQUIRED};

/// Mapa ordenado `key -> Control`, en orden de render.
pub type FormFieldMapping = IndexMap<String, Control>;

/// Valores iniciales indexados por id de campo (string) o por label.
pub type InitialValues = IndexMap<String, String>;

const DEFAULT_MAX_LENGTH: u32 = 255;
const TEXTAREA_ROWS: u32 = 4;

pub struct FormBuilder<'a> {
    form: &'a Form,
    role: Option<Role>,
    initial: InitialValues,
    exclude_labels: Vec<String>,
    readonly: bool,
    file_rules: FileRules,
}

impl<'a> FormBuilder<'a> {
    pub fn new(form: &'a Form) -> Self {
        Self { form,
               role: None,
               initial: InitialValues::new(),
               exclude_labels: Vec::new(),
               readonly: false,
               file_rules: FileRules::default() }
    }

    pub fn role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    pub fn initial(mut self, initial: InitialValues) -> Self {
        self.initial = initial;
        self
    }

    pub fn exclude(mut self, label: impl Into<String>) -> Self {
        self.exclude_labels.push(label.into());
        self
    }

    pub fn readonly(mut self, readonly: bool) -> Self {
        self.readonly = readonly;
        self
    }

    pub fn file_rules(mut self, rules: FileRules) -> Self {
        self.file_rules = rules;
        self
    }

    pub fn build(self) -> DynamicForm {
        let mut controls = FormFieldMapping::new();
        for field in self.form.fields_in_order() {
            if self.role.is_some_and(|r| r != field.role) {
                continue;
            }
            if field.hidden || self.exclude_labels.iter().any(|l| *l == field.label) {
                continue;
            }
            let initial = resolve_initial(field, &self.initial);
            let control = control_for(field, initial, self.readonly);
            controls.insert(control.key.clone(), control);
        }
        DynamicForm { controls,
                      file_rules: self.file_rules }
    }
}

fn resolve_initial(field: &FieldDefinition, initial: &InitialValues) -> Option<String> {
    let present = |v: Option<&String>| v.filter(|s| !s.is_empty()).cloned();
    present(initial.get(&field.key())).or_else(|| present(initial.get(&field.label)))
                                      .or_else(|| present(field.default_value.as_ref()))
}

fn compile_pattern(field: &FieldDefinition) -> Option<Regex> {
    let pattern = field.regex.as_deref().filter(|p| !p.is_empty())?;
    match Regex::new(pattern) {
        Ok(re) => Some(re),
        Err(e) => {
            warn!("ignoring invalid regex on field '{}' ({}): {e}", field.label, field.id);
            None
        }
    }
}

/// Mapeo puro `(FieldDefinition, initial, readonly) -> Control`.
pub fn control_for(field: &FieldDefinition, initial: Option<String>, readonly: bool) -> Control {
    let mut attrs = IndexMap::new();
    let placeholder = field.placeholder.clone().unwrap_or_default();
    let mut pattern = compile_pattern(field);
    let mut initial = initial;

    let kind = match &field.kind {
        FieldKind::Text => {
            attrs.insert("placeholder".to_string(), placeholder);
            ControlKind::Text { max_length: field.max_length.unwrap_or(DEFAULT_MAX_LENGTH) }
        }
        FieldKind::Textarea => {
            attrs.insert("placeholder".to_string(), placeholder);
            attrs.insert("rows".to_string(), TEXTAREA_ROWS.to_string());
            ControlKind::Textarea { rows: TEXTAREA_ROWS }
        }
        FieldKind::Select => ControlKind::Select { choices: field.choice_list() },
        FieldKind::Radio => ControlKind::Radio { choices: field.choice_list() },
        FieldKind::File if readonly => {
            pattern = None;
            ControlKind::FileName
        }
        FieldKind::File => ControlKind::File,
        FieldKind::Email => {
            attrs.insert("placeholder".to_string(), placeholder);
            ControlKind::Email
        }
        FieldKind::Date => {
            attrs.insert("placeholder".to_string(), "YYYY-MM-DD".to_string());
            ControlKind::Date
        }
        FieldKind::Number => ControlKind::Integer { min: field.min_value,
                                                    max: field.max_value },
        FieldKind::Checkbox => {
            pattern = None;
            let checked = matches!(initial.as_deref(), Some("True" | "true" | "1"));
            initial = Some(if checked { "True" } else { "False" }.to_string());
            ControlKind::Checkbox
        }
        FieldKind::Other(_) => ControlKind::Fallback,
    };

    let mut control = Control { key: field.key(),
                                field_id: field.id,
                                label: field.label.clone(),
                                required: field.required && !readonly,
                                kind,
                                readonly: false,
                                disabled: false,
                                initial,
                                help_text: field.help_text.clone(),
                                attrs,
                                pattern };
    if field.readonly || readonly {
        control.lock();
    }
    control
}

/// Formulario construido: controles ordenados + reglas de upload.
#[derive(Debug, Clone, Default)]
pub struct DynamicForm {
    pub controls: FormFieldMapping,
    pub file_rules: FileRules,
}

impl DynamicForm {
    pub fn get(&self, key: &str) -> Option<&Control> {
        self.controls.get(key)
    }

    pub fn by_label(&self, label: &str) -> Option<&Control> {
        self.controls.values().find(|c| c.label == label)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.controls.keys()
    }

    pub fn len(&self) -> usize {
        self.controls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controls.is_empty()
    }

    /// Valida un envío contra los controles. Todos los errores se acumulan.
    pub fn clean(&self, submission: &Submission) -> Result<CleanedData, ValidationErrors> {
        let mut cleaned = CleanedData::default();
        let mut errors = ValidationErrors::new();

        for (key, control) in &self.controls {
            if control.disabled {
                cleaned.values.insert(key.clone(), locked_value(control));
                continue;
            }
            if control.kind.is_upload() {
                match submission.files.get(key) {
                    Some(upload) => {
                        let mut ok = true;
                        if let Err(msg) = self.file_rules.validate(upload) {
                            errors.add(key.as_str(), msg);
                            ok = false;
                        }
                        if let Some(re) = &control.pattern {
                            if !re.is_match(&upload.name) {
                                errors.add(key.as_str(), INVALID_FORMAT);
                                ok = false;
                            }
                        }
                        if ok {
                            cleaned.files.insert(key.clone(), FileRef::new(upload.name.clone()));
                        }
                    }
                    // Un archivo ya guardado cumple el requerido; el merge lo conserva.
                    None if control.required && control.initial.as_deref().map_or(true, str::is_empty) => {
                        errors.add(key.as_str(), REQUIRED)
                    }
                    None => {}
                }
                cleaned.values.insert(key.clone(), CleanedValue::Empty);
                continue;
            }
            match clean_value(control, submission.data.get(key).map(String::as_str)) {
                Ok(value) => {
                    cleaned.values.insert(key.clone(), value);
                }
                Err(messages) => {
                    for msg in messages {
                        errors.add(key.as_str(), msg);
                    }
                }
            }
        }

        if errors.is_empty() {
            Ok(cleaned)
        } else {
            Err(errors)
        }
    }
}

/// Valor de un control deshabilitado: su inicial, convertido sin validar.
fn locked_value(control: &Control) -> CleanedValue {
    let Some(initial) = control.initial.as_deref() else {
        return match control.kind {
            ControlKind::Checkbox => CleanedValue::Boolean(false),
            _ => CleanedValue::Empty,
        };
    };
    match &control.kind {
        ControlKind::Checkbox => CleanedValue::Boolean(control.checked()),
        ControlKind::Integer { .. } => initial.trim()
                                             .parse()
                                             .map(CleanedValue::Integer)
                                             .unwrap_or_else(|_| CleanedValue::Text(initial.to_string())),
        ControlKind::Date => NaiveDate::parse_from_str(initial.trim(), "%Y-%m-%d").map(CleanedValue::Date)
                                                                                  .unwrap_or_else(|_| CleanedValue::Text(initial.to_string())),
        _ => CleanedValue::Text(initial.to_string()),
    }
}

fn clean_value(control: &Control, raw: Option<&str>) -> Result<CleanedValue, Vec<String>> {
    if let ControlKind::Checkbox = control.kind {
        let checked = !matches!(raw.map(str::trim), None | Some("" | "false" | "False"));
        if control.required && !checked {
            return Err(vec![REQUIRED.to_string()]);
        }
        return Ok(CleanedValue::Boolean(checked));
    }

    let value = raw.map(str::trim).unwrap_or("");
    if value.is_empty() {
        return if control.required {
            Err(vec![REQUIRED.to_string()])
        } else {
            Ok(CleanedValue::Empty)
        };
    }

    let mut messages = Vec::new();
    let cleaned = match &control.kind {
        ControlKind::Text { max_length } => {
            let count = value.chars().count();
            if count > *max_length as usize {
                messages.push(format!("Ensure this value has at most {max_length} characters (it has {count})."));
            }
            CleanedValue::Text(value.to_string())
        }
        ControlKind::Select { choices } | ControlKind::Radio { choices } => {
            if !choices.iter().any(|c| c == value) {
                messages.push(format!("Select a valid choice. {value} is not one of the available choices."));
            }
            CleanedValue::Text(value.to_string())
        }
        ControlKind::Email => {
            if !is_valid_email(value) {
                messages.push("Enter a valid email address.".to_string());
            }
            CleanedValue::Text(value.to_string())
        }
        ControlKind::Date => match NaiveDate::parse_from_str(value, "%Y-%m-%d") {
            Ok(date) => CleanedValue::Date(date),
            Err(_) => return Err(vec!["Enter a valid date.".to_string()]),
        },
        ControlKind::Integer { min, max } => match value.parse::<i64>() {
            Ok(n) => {
                if let Some(min) = (*min).filter(|m| n < *m) {
                    messages.push(format!("Ensure this value is greater than or equal to {min}."));
                }
                if let Some(max) = (*max).filter(|m| n > *m) {
                    messages.push(format!("Ensure this value is less than or equal to {max}."));
                }
                CleanedValue::Integer(n)
            }
            Err(_) => return Err(vec!["Enter a whole number.".to_string()]),
        },
        _ => CleanedValue::Text(value.to_string()),
    };

    if let Some(re) = &control.pattern {
        if !re.is_match(&cleaned.to_text()) {
            messages.push(INVALID_FORMAT.to_string());
        }
    }

    if messages.is_empty() {
        Ok(cleaned)
    } else {
        Err(messages)
    }
}

fn is_valid_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
    && !domain.contains('@')
    && domain.contains('.')
    && !domain.starts_with('.')
    && !domain.ends_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::Upload;
    use ticket_domain::FieldDefinition;

    fn form() -> Form {
        Form::new("Risk Intake").with_field(FieldDefinition::new("Description", FieldKind::Text, Role::Representative).required())
                                .with_field(FieldDefinition::new("Severity", FieldKind::Select, Role::Representative).with_choices("low,high"))
                                .with_field(FieldDefinition::new("Internal", FieldKind::Text, Role::Representative).hidden())
                                .with_field(FieldDefinition::new("Attachment", FieldKind::File, Role::Champion))
    }

    #[test]
    fn role_filter_and_hidden_fields() {
        let form = form();
        let built = FormBuilder::new(&form).role(Role::Representative).build();
        let labels: Vec<&str> = built.controls.values().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["Description", "Severity"]);
    }

    #[test]
    fn initial_precedence_skips_empty_values() {
        let field = FieldDefinition::new("Owner", FieldKind::Text, Role::Representative).with_default("default");
        let form = Form::new("F").with_field(field.clone());
        let mut initial = InitialValues::new();
        initial.insert(field.key(), String::new());
        initial.insert("Owner".to_string(), "by-label".to_string());
        let built = FormBuilder::new(&form).initial(initial).build();
        assert_eq!(built.get(&field.key()).and_then(|c| c.initial.clone()), Some("by-label".to_string()));

        let mut by_id = InitialValues::new();
        by_id.insert(field.key(), "by-id".to_string());
        by_id.insert("Owner".to_string(), "by-label".to_string());
        let built = FormBuilder::new(&form).initial(by_id).build();
        assert_eq!(built.get(&field.key()).and_then(|c| c.initial.clone()), Some("by-id".to_string()));

        let built = FormBuilder::new(&form).build();
        assert_eq!(built.get(&field.key()).and_then(|c| c.initial.clone()), Some("default".to_string()));
    }

    #[test]
    fn invalid_regex_is_dropped() {
        let field = FieldDefinition::new("Code", FieldKind::Text, Role::Representative).with_regex("([");
        let control = control_for(&field, None, false);
        assert!(control.pattern.is_none());
    }

    #[test]
    fn regex_mismatch_reports_invalid_format() {
        let field = FieldDefinition::new("Code", FieldKind::Text, Role::Representative).with_regex(r"^[A-Z]{3}-\d+$");
        let form = Form::new("F").with_field(field.clone());
        let built = FormBuilder::new(&form).build();
        let err = built.clean(&Submission::new().with_value(field.key(), "abc")).unwrap_err();
        assert_eq!(err.for_field(&field.key()), [INVALID_FORMAT.to_string()]);
        assert!(built.clean(&Submission::new().with_value(field.key(), "ABC-12")).is_ok());
    }

    #[test]
    fn typed_cleaning() {
        let n = FieldDefinition::new("Amount", FieldKind::Number, Role::Representative).with_bounds(Some(1), Some(10));
        let d = FieldDefinition::new("Due", FieldKind::Date, Role::Representative);
        let c = FieldDefinition::new("Urgent", FieldKind::Checkbox, Role::Representative);
        let e = FieldDefinition::new("Contact", FieldKind::Email, Role::Representative);
        let form = Form::new("F").with_field(n.clone()).with_field(d.clone()).with_field(c.clone()).with_field(e.clone());
        let built = FormBuilder::new(&form).build();

        let ok = built.clean(&Submission::new().with_value(n.key(), " 7 ")
                                               .with_value(d.key(), "2024-02-29")
                                               .with_value(c.key(), "on")
                                               .with_value(e.key(), "risk@example.com"))
                      .unwrap();
        assert_eq!(ok.text(&n.key()).as_deref(), Some("7"));
        assert_eq!(ok.text(&d.key()).as_deref(), Some("2024-02-29"));
        assert_eq!(ok.text(&c.key()).as_deref(), Some("True"));

        let err = built.clean(&Submission::new().with_value(n.key(), "11")
                                                .with_value(d.key(), "29/02/2024")
                                                .with_value(e.key(), "not-an-email"))
                       .unwrap_err();
        assert_eq!(err.field_errors.len(), 3);
    }

    #[test]
    fn file_upload_goes_through_rules() {
        let f = FieldDefinition::new("Attachment", FieldKind::File, Role::Champion).required();
        let form = Form::new("F").with_field(f.clone());
        let built = FormBuilder::new(&form).build();
        assert_eq!(built.clean(&Submission::new()).unwrap_err().for_field(&f.key()), [REQUIRED.to_string()]);
        assert!(built.clean(&Submission::new().with_file(f.key(), Upload::new("tool.exe", 10))).is_err());
        let ok = built.clean(&Submission::new().with_file(f.key(), Upload::new("report.pdf", 10))).unwrap();
        assert_eq!(ok.files.get(&f.key()).map(|r| r.name.as_str()), Some("report.pdf"));
    }

    #[test]
    fn field_level_readonly_keeps_initial() {
        let f = FieldDefinition::new("Reference", FieldKind::Text, Role::Representative).readonly().required();
        let form = Form::new("F").with_field(f.clone());
        let mut initial = InitialValues::new();
        initial.insert(f.key(), "REF-1".to_string());
        let built = FormBuilder::new(&form).initial(initial).build();
        let control = built.get(&f.key()).unwrap();
        assert!(!control.required);
        assert_eq!(control.attrs.get("disabled").map(String::as_str), Some("true"));
        let cleaned = built.clean(&Submission::new().with_value(f.key(), "tampered")).unwrap();
        assert_eq!(cleaned.text(&f.key()).as_deref(), Some("REF-1"));
    }

    #[test]
    fn unknown_kind_falls_back_to_text() {
        let f = FieldDefinition::new("Signature", FieldKind::Other("signature".into()), Role::Representative);
        let control = control_for(&f, None, false);
        assert_eq!(control.kind, ControlKind::Fallback);
        assert_eq!(control.kind.widget(), "text_input");
    }
}
