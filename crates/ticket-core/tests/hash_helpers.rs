use serde_json::json;
use ticket_core::hashing::{hash_value, snapshot_digest, template_hash};
use ticket_domain::{Role, Snapshot, Stage, WorkflowTemplate};

#[test]
fn hash_value_produces_hex_64() {
    let h = hash_value(&json!({"b": 2, "a": 1}));
    assert_eq!(h.len(), 64);
    assert_eq!(h, hash_value(&json!({"a": 1, "b": 2})));
}

#[test]
fn template_hash_ignores_ids_and_timestamps() {
    let a = WorkflowTemplate::new("Risk").with_stage(Stage::new(1, "Intake", Role::Representative))
                                         .with_stage(Stage::new(2, "Review", Role::Champion));
    let b = WorkflowTemplate::new("Risk copy").with_stage(Stage::new(2, "Review", Role::Champion))
                                              .with_stage(Stage::new(1, "Intake", Role::Representative));
    assert_eq!(template_hash(Some(&a)), template_hash(Some(&b)));

    let c = WorkflowTemplate::new("Risk").with_stage(Stage::new(1, "Intake", Role::Representative));
    assert_ne!(template_hash(Some(&a)), template_hash(Some(&c)));
    assert_eq!(template_hash(None), template_hash(None));
}

#[test]
fn snapshot_digest_depends_on_order() {
    let ab = Snapshot([("a".to_string(), "1".to_string()), ("b".to_string(), "2".to_string())].into_iter().collect());
    let ba = Snapshot([("b".to_string(), "2".to_string()), ("a".to_string(), "1".to_string())].into_iter().collect());
    assert_ne!(snapshot_digest(&ab), snapshot_digest(&ba));
}
