use ticket_domain::{DomainError, FieldDefinition, FieldKind, Form, Role, WorkflowTemplate};

#[test]
fn test_fields_in_order_uses_order_then_insertion() {
    let form = Form::new("Risk Intake").with_field(FieldDefinition::new("B", FieldKind::Text, Role::Representative).with_order(2))
                                       .with_field(FieldDefinition::new("A", FieldKind::Text, Role::Representative).with_order(1))
                                       .with_field(FieldDefinition::new("C", FieldKind::Text, Role::Champion).with_order(3));
    let labels: Vec<&str> = form.fields_in_order().iter().map(|f| f.label.as_str()).collect();
    assert_eq!(labels, vec!["A", "B", "C"]);

    let user_labels: Vec<&str> = form.fields_for_role(Role::Representative).iter().map(|f| f.label.as_str()).collect();
    assert_eq!(user_labels, vec!["A", "B"]);
}

#[test]
fn test_with_field_appends_after_existing_order() {
    let form = Form::new("F").with_field(FieldDefinition::new("first", FieldKind::Text, Role::Representative))
                             .with_field(FieldDefinition::new("second", FieldKind::Text, Role::Representative));
    assert_eq!(form.fields[0].order, 1);
    assert_eq!(form.fields[1].order, 2);
}

#[test]
fn test_duplicate_labels_are_rejected() {
    let form = Form::new("Dup").with_field(FieldDefinition::new("Description", FieldKind::Text, Role::Representative))
                               .with_field(FieldDefinition::new("Description", FieldKind::Textarea, Role::Champion));
    assert_eq!(form.validate(), Err(DomainError::DuplicateLabel("Description".into())));
}

#[test]
fn test_recipients_are_trimmed_and_empty_items_dropped() {
    let form = Form::new("F").with_notify_emails(" a@example.com, ,b@example.com ,");
    assert_eq!(form.recipients(), vec!["a@example.com".to_string(), "b@example.com".to_string()]);
    assert!(Form::new("G").recipients().is_empty());
}

#[test]
fn test_choice_list_ignores_blanks() {
    let field = FieldDefinition::new("Severity", FieldKind::Select, Role::Representative).with_choices("low, medium,,high ,");
    assert_eq!(field.choice_list(), vec!["low", "medium", "high"]);
    let none = FieldDefinition::new("Empty", FieldKind::Radio, Role::Representative);
    assert!(none.choice_list().is_empty());
}

#[test]
fn test_unknown_kind_survives_serde() {
    let kind: FieldKind = serde_json::from_str("\"signature\"").unwrap();
    assert_eq!(kind, FieldKind::Other("signature".into()));
    assert_eq!(serde_json::to_string(&FieldKind::Textarea).unwrap(), "\"textarea\"");
}

#[test]
fn test_linear_template_has_one_stage_per_role() {
    let template = WorkflowTemplate::linear("Risk");
    let roles: Vec<Role> = template.stages_in_order().iter().map(|s| s.role).collect();
    assert_eq!(roles, Role::ALL.to_vec());
    assert!(template.stages.iter().all(|s| s.show_in_diagram));
}

#[test]
fn test_equal_order_keeps_insertion_order() {
    let form = Form::new("F").with_field(FieldDefinition::new("zeta", FieldKind::Text, Role::Representative).with_order(5))
                             .with_field(FieldDefinition::new("alpha", FieldKind::Text, Role::Representative).with_order(5))
                             .with_field(FieldDefinition::new("mid", FieldKind::Text, Role::Representative).with_order(5));
    let labels: Vec<&str> = form.fields_in_order().iter().map(|f| f.label.as_str()).collect();
    assert_eq!(labels, vec!["zeta", "alpha", "mid"]);
}

#[test]
fn test_with_field_after_max_order_does_not_overflow() {
    let form = Form::new("F").with_field(FieldDefinition::new("last", FieldKind::Text, Role::Representative).with_order(u32::MAX))
                             .with_field(FieldDefinition::new("auto", FieldKind::Text, Role::Representative));
    assert_eq!(form.fields[1].order, u32::MAX);
    let labels: Vec<&str> = form.fields_in_order().iter().map(|f| f.label.as_str()).collect();
    assert_eq!(labels, vec!["last", "auto"]);
}
