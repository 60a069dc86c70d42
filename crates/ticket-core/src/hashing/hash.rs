//! Hash helpers (blake3, hex).

use blake3::Hasher;
use serde_json::{json, Value};
use ticket_domain::{Role, Snapshot, WorkflowTemplate};

use super::to_canonical_json;

/// Hashea un string y devuelve hex.
pub fn hash_str(input: &str) -> String {
    let mut h = Hasher::new();
    h.update(input.as_bytes());
    h.finalize().to_hex().to_string()
}

/// Hash of the canonical JSON form of `value`.
pub fn hash_value(value: &Value) -> String {
    hash_str(&to_canonical_json(value))
}

/// Huella de la definición de un workflow: lista ordenada de (nombre, rol).
///
/// Sin plantilla se usa la secuencia por defecto de roles, de modo que dos
/// procesos "sin plantilla" comparten huella.
pub fn template_hash(template: Option<&WorkflowTemplate>) -> String {
    let stages: Vec<Value> = match template {
        Some(t) => t.stages_in_order()
                    .iter()
                    .map(|s| json!({"name": s.name, "role": s.role.code()}))
                    .collect(),
        None => Role::ALL.iter()
                         .map(|r| json!({"name": r.display_name(), "role": r.code()}))
                         .collect(),
    };
    hash_value(&Value::Array(stages))
}

/// Digest of a snapshot. Label order is part of the digest.
pub fn snapshot_digest(snapshot: &Snapshot) -> String {
    let rows: Vec<Value> = snapshot.iter().map(|(k, v)| json!([k, v])).collect();
    hash_value(&Value::Array(rows))
}
