//! Esquema Diesel (escrito a mano, equivalente a `diesel print-schema`).

diesel::table! {
    workflow_templates (id) {
        id -> Uuid,
        name -> Text,
        description -> Text,
        created -> Timestamptz,
        updated -> Timestamptz,
    }
}

diesel::table! {
    workflow_stages (id) {
        id -> Uuid,
        template_id -> Uuid,
        stage_order -> Int4,
        name -> Text,
        role -> Text,
        show_in_diagram -> Bool,
    }
}

diesel::table! {
    forms (id) {
        id -> Uuid,
        name -> Text,
        workflow_template_id -> Nullable<Uuid>,
        notify_emails -> Text,
        created -> Timestamptz,
    }
}

diesel::table! {
    form_fields (id) {
        id -> Uuid,
        form_id -> Uuid,
        label -> Text,
        field_type -> Text,
        role -> Text,
        field_order -> Int4,
        required -> Bool,
        readonly -> Bool,
        hidden -> Bool,
        regex -> Nullable<Text>,
        min_value -> Nullable<Int8>,
        max_value -> Nullable<Int8>,
        max_length -> Nullable<Int4>,
        choices -> Nullable<Text>,
        default_value -> Nullable<Text>,
        placeholder -> Nullable<Text>,
        help_text -> Text,
    }
}

diesel::table! {
    form_entries (id) {
        id -> Uuid,
        form_id -> Uuid,
        submitted_by -> Nullable<Text>,
        submitted_at -> Timestamptz,
    }
}

diesel::table! {
    form_entry_values (id) {
        id -> Int8,
        entry_id -> Uuid,
        field_id -> Uuid,
        value_text -> Nullable<Text>,
        value_file -> Nullable<Text>,
    }
}

diesel::table! {
    ticket_processes (id) {
        id -> Uuid,
        form_id -> Uuid,
        workflow_template_id -> Nullable<Uuid>,
        entry_id -> Nullable<Uuid>,
        ticket_data -> Jsonb,
        stage_cursor -> Int4,
        outcome -> Nullable<Text>,
        created -> Timestamptz,
        finished -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    process_decisions (process_id, role) {
        process_id -> Uuid,
        role -> Text,
        decision -> Text,
        comment -> Text,
        decided_by -> Text,
        decided_at -> Timestamptz,
    }
}

diesel::table! {
    process_events (seq) {
        seq -> Int8,
        process_id -> Uuid,
        ts -> Timestamptz,
        event_type -> Text,
        payload -> Jsonb,
    }
}

diesel::table! {
    email_outbox (id) {
        id -> Int8,
        subject -> Text,
        body_plain -> Text,
        body_html -> Text,
        recipients -> Array<Text>,
        created_at -> Timestamptz,
        sent_at -> Nullable<Timestamptz>,
    }
}

diesel::joinable!(workflow_stages -> workflow_templates (template_id));
diesel::joinable!(forms -> workflow_templates (workflow_template_id));
diesel::joinable!(form_fields -> forms (form_id));
diesel::joinable!(form_entries -> forms (form_id));
diesel::joinable!(form_entry_values -> form_entries (entry_id));
diesel::joinable!(form_entry_values -> form_fields (field_id));
diesel::joinable!(ticket_processes -> forms (form_id));
diesel::joinable!(process_decisions -> ticket_processes (process_id));
diesel::joinable!(process_events -> ticket_processes (process_id));

diesel::allow_tables_to_appear_in_same_query!(
    workflow_templates,
    workflow_stages,
    forms,
    form_fields,
    form_entries,
    form_entry_values,
    ticket_processes,
    process_decisions,
    process_events,
    email_outbox,
);
