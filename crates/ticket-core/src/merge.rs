//! Merge de valores enviados por un rol dentro del `Entry` acumulado.
use indexmap::IndexMap;
use ticket_domain::{Entry, FieldId, FieldKind, FileRef, Form, Role, StoredValue};

use crate::forms::CleanedValue;

/// Persiste un `FieldValue` por cada campo del `role` y devuelve los ids
/// tocados.
///
/// - Archivo: si hay upload con la key del campo se guarda la referencia
///   (reemplaza cualquier texto previo); sin upload la fila queda intacta.
/// - Resto: el valor limpio convertido a texto; ausente se guarda como `""`.
///
/// Idempotente por (Entry, FieldDefinition): repetir la misma entrada deja
/// el mismo estado.
pub fn update_values_for_role(entry: &mut Entry,
                              form: &Form,
                              role: Role,
                              cleaned: &IndexMap<String, CleanedValue>,
                              files: &IndexMap<String, FileRef>)
                              -> Vec<FieldId> {
    let mut touched = Vec::new();
    for field in form.fields_for_role(role) {
        let key = field.key();
        let value = match field.kind {
            FieldKind::File => match files.get(&key) {
                Some(file) => StoredValue::File(file.clone()),
                None => continue,
            },
            _ => StoredValue::Text(cleaned.get(&key).map(CleanedValue::to_text).unwrap_or_default()),
        };
        entry.value_mut(field.id).value = value;
        touched.push(field.id);
    }
    touched
}

#[cfg(test)]
mod tests {
    use super::*;
    use ticket_domain::FieldDefinition;

    #[test]
    fn file_omission_keeps_stored_file() {
        let file = FieldDefinition::new("Attachment", FieldKind::File, Role::Champion);
        let note = FieldDefinition::new("Note", FieldKind::Text, Role::Champion);
        let form = Form::new("F").with_field(file.clone()).with_field(note.clone());
        let mut entry = Entry::new(form.id, None);

        let mut files = IndexMap::new();
        files.insert(file.key(), FileRef::new("a.pdf"));
        update_values_for_role(&mut entry, &form, Role::Champion, &IndexMap::new(), &files);
        let touched = update_values_for_role(&mut entry, &form, Role::Champion, &IndexMap::new(), &IndexMap::new());

        assert_eq!(touched, vec![note.id]);
        assert_eq!(entry.display_value(file.id), Some("a.pdf"));
        assert_eq!(entry.display_value(note.id), Some(""));
    }

    #[test]
    fn other_roles_are_untouched() {
        let mine = FieldDefinition::new("Mine", FieldKind::Text, Role::Representative);
        let theirs = FieldDefinition::new("Theirs", FieldKind::Text, Role::Executive);
        let form = Form::new("F").with_field(mine.clone()).with_field(theirs.clone());
        let mut entry = Entry::new(form.id, None);
        let mut cleaned = IndexMap::new();
        cleaned.insert(mine.key(), CleanedValue::Text("x".into()));
        cleaned.insert(theirs.key(), CleanedValue::Text("y".into()));
        update_values_for_role(&mut entry, &form, Role::Representative, &cleaned, &IndexMap::new());
        assert!(entry.value(theirs.id).is_none());
        assert_eq!(entry.display_value(mine.id), Some("x"));
    }
}
