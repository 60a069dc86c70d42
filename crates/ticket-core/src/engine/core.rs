//! Core ApprovalEngine implementation

use chrono::Utc;
use indexmap::IndexMap;
use log::{debug, info, warn};
use ticket_domain::{Decision, Entry, Form, FormId, ProcessId, Role, RoleDecision, TicketProcess, WorkflowTemplate};

use super::config::EngineConfig;
use super::views::{StageSubmission, StageView, StartRequest, StartView, TransitionResult};
use super::DECISION_REQUIRED;
use crate::errors::EngineError;
use crate::event::{EventStore, ProcessEvent, ProcessEventKind};
use crate::forms::{CleanedValue, DynamicForm, FormBuilder, ValidationErrors};
use crate::hashing::{snapshot_digest, template_hash};
use crate::merge::update_values_for_role;
use crate::notify::{DispatchOutcome, LogMailer, Mailer, NotificationDispatcher};
use crate::repo::{CommitScope, InMemoryTicketStore, ProcessColumn, TicketStore, TransitionCommit};
use crate::snapshot::{build_snapshot, summary_html};
use crate::workflow::{LinearWorkflow, StageOutcome, WorkflowPlugin};

/// Motor del workflow de aprobación multi-rol.
///
/// Cada transición se calcula completa en memoria (merge, snapshot,
/// decisión, cursor) y se entrega al repositorio en un único commit. Las
/// notificaciones salen después del commit y no pueden fallar la
/// transición.
pub struct ApprovalEngine<S, W = LinearWorkflow, M = LogMailer>
    where S: TicketStore,
          W: WorkflowPlugin,
          M: Mailer
{
    store: S,
    workflow: W,
    dispatcher: NotificationDispatcher<M>,
    config: EngineConfig,
}

impl ApprovalEngine<InMemoryTicketStore> {
    /// Motor con backend en memoria, workflow lineal y mailer de log.
    pub fn in_memory() -> Self {
        Self::new(InMemoryTicketStore::new(), LinearWorkflow::default(), LogMailer, EngineConfig::default())
    }
}

impl<S, W, M> ApprovalEngine<S, W, M>
    where S: TicketStore,
          W: WorkflowPlugin,
          M: Mailer
{
    pub fn new(store: S, workflow: W, mailer: M, config: EngineConfig) -> Self {
        Self { store,
               workflow,
               dispatcher: NotificationDispatcher::new(mailer),
               config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn workflow(&self) -> &W {
        &self.workflow
    }

    pub fn mailer(&self) -> &M {
        self.dispatcher.mailer()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ---- schema ----

    pub fn register_template(&mut self, template: &WorkflowTemplate) -> Result<(), EngineError> {
        self.store.save_template(template)?;
        Ok(())
    }

    pub fn register_form(&mut self, form: &Form) -> Result<(), EngineError> {
        form.validate()?;
        self.store.save_form(form)?;
        Ok(())
    }

    /// Formularios con plantilla de workflow, ordenados por nombre.
    pub fn forms_with_workflow(&self) -> Result<Vec<Form>, EngineError> {
        let mut forms: Vec<Form> = self.store.list_forms()?.into_iter().filter(Form::has_workflow).collect();
        forms.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(forms)
    }

    /// Destino de redirección hacia el inicio real del proceso. No muta nada.
    pub fn start_redirect(&self, form_id: FormId) -> String {
        format!("{}?form={}", self.config.start_url, form_id)
    }

    // ---- start ----

    /// Formulario de inicio. Un id ausente o desconocido produce un
    /// formulario vacío, nunca un error de referencia.
    pub fn start_form(&self, form_id: Option<FormId>) -> Result<StartView, EngineError> {
        let Some(id) = form_id else {
            return Ok(StartView::default());
        };
        let Some(form) = self.store.get_form(id)? else {
            debug!("start_form: unknown form {id}, rendering empty form");
            return Ok(StartView::default());
        };
        let fields = FormBuilder::new(&form).role(Role::Representative)
                                            .file_rules(self.config.file_rules.clone())
                                            .build();
        Ok(StartView { form: Some(form),
                       fields })
    }

    pub fn start_process(&mut self, request: StartRequest) -> Result<TransitionResult, EngineError> {
        let view = self.start_form(Some(request.form_id))?;
        let Some(form) = view.form else {
            return Err(EngineError::UnknownForm(request.form_id));
        };
        let cleaned = view.fields.clean(&request.submission)?;
        let template = self.load_template(&form)?;

        let submitted_by = Some(request.submitted_by.clone()).filter(|s| !s.is_empty());
        let mut process = TicketProcess::new(form.id, form.workflow_template_id);
        let mut entry = Entry::new(form.id, submitted_by);
        process.entry_id = Some(entry.id);

        let touched = update_values_for_role(&mut entry, &form, Role::Representative, &cleaned.values, &cleaned.files);
        process.ticket_data = build_snapshot(&form, &entry);

        let events = vec![ProcessEventKind::ProcessStarted { form_id: form.id,
                                                              entry_id: entry.id,
                                                              template_hash: template_hash(template.as_ref()),
                                                              started_by: request.submitted_by.clone() },
                          ProcessEventKind::ValuesMerged { role: Role::Representative,
                                                           fields: touched.clone(),
                                                           snapshot_digest: snapshot_digest(&process.ticket_data) },];
        let mut events = self.store.commit(TransitionCommit { process: process.clone(),
                                                              entry: Some(entry),
                                                              touched,
                                                              events,
                                                              scope: CommitScope::Full })?;
        info!("process {} started for form '{}' by {}", process.id, form.name, request.submitted_by);

        let prefix = self.config.submission_prefix.clone();
        let notification = self.notify(&process, &form, &prefix, &mut events);
        Ok(TransitionResult { process,
                              events,
                              notification: Some(notification) })
    }

    // ---- stages ----

    /// Vista de una etapa: campos del rol pre-llenados desde el `Entry`,
    /// resumen HTML y fila de estado.
    pub fn stage_view(&self, process_id: ProcessId, role: Role) -> Result<StageView, EngineError> {
        let process = self.load_process(process_id)?;
        let form = self.load_form(process.form_id)?;
        let template = self.load_template(&form)?;
        let entry = self.load_entry(&process)?;
        let fields = self.role_form(&form, role, entry.as_ref());
        Ok(StageView { role,
                       role_display: role.display_name(),
                       comment_label: format!("{} comment", role.display_name()),
                       fields,
                       summary_html: summary_html(&form, entry.as_ref()),
                       status_row: process.status_row(),
                       current_stage: self.workflow.current_stage(&process, template.as_ref()),
                       process })
    }

    /// Todos los campos del formulario en modo sólo lectura, con los valores
    /// guardados.
    pub fn review_form(&self, process_id: ProcessId) -> Result<DynamicForm, EngineError> {
        let process = self.load_process(process_id)?;
        let form = self.load_form(process.form_id)?;
        let entry = self.load_entry(&process)?;
        Ok(FormBuilder::new(&form).initial(entry.map(|e| e.initial_map()).unwrap_or_default())
                                  .readonly(true)
                                  .build())
    }

    /// Completa la etapa de `submission.role`.
    ///
    /// Sin mutación si la decisión no es `approved`/`rejected`, si el rol no
    /// es dueño de la etapa abierta o si los campos no validan.
    pub fn submit_stage(&mut self, submission: StageSubmission) -> Result<TransitionResult, EngineError> {
        let mut process = self.load_process(submission.process_id)?;
        if process.is_finished() {
            return Err(EngineError::ProcessFinished(process.id));
        }
        let decision = Decision::parse_signal(submission.decision.as_deref())
            .map_err(|_| EngineError::Validation(ValidationErrors::non_field(DECISION_REQUIRED)))?;

        let form = self.load_form(process.form_id)?;
        let template = self.load_template(&form)?;
        let role = submission.role;
        let current = self.workflow.current_stage(&process, template.as_ref());
        if current != Some(role) {
            return Err(EngineError::WrongStage { expected: current,
                                                 got: role });
        }

        let mut entry = match self.load_entry(&process)? {
            Some(entry) => entry,
            None => {
                let entry = Entry::new(form.id, Some(submission.decided_by.clone()));
                process.entry_id = Some(entry.id);
                entry
            }
        };
        let fields = self.role_form(&form, role, Some(&entry));
        let mut cleaned = fields.clean(&submission.submission)?;
        // Campos del rol sin control (excluidos u ocultos) conservan su valor.
        for field in form.fields_for_role(role) {
            let key = field.key();
            if fields.get(&key).is_some() {
                continue;
            }
            if let Some(current) = entry.value(field.id).and_then(|v| v.value.as_text()) {
                cleaned.values.insert(key, CleanedValue::Text(current.to_string()));
            }
        }

        let now = Utc::now();
        let touched = update_values_for_role(&mut entry, &form, role, &cleaned.values, &cleaned.files);
        process.ticket_data = build_snapshot(&form, &entry);
        process.record_decision(role,
                                RoleDecision { decision,
                                               comment: submission.comment.clone(),
                                               decided_by: submission.decided_by.clone(),
                                               decided_at: now });
        let Some(outcome) = self.workflow.complete_stage(&mut process, template.as_ref(), decision, now) else {
            return Err(EngineError::WrongStage { expected: None,
                                                 got: role });
        };

        let mut events = vec![ProcessEventKind::ValuesMerged { role,
                                                               fields: touched.clone(),
                                                               snapshot_digest: snapshot_digest(&process.ticket_data) },
                              ProcessEventKind::DecisionRecorded { role,
                                                                   decision,
                                                                   decided_by: submission.decided_by.clone() },
                              ProcessEventKind::StageAdvanced { from: outcome.from_role(),
                                                                next: outcome.next_role(),
                                                                cursor: process.stage_cursor }];
        if let StageOutcome::Finished { outcome, .. } = outcome {
            events.push(ProcessEventKind::ProcessFinished { outcome });
        }

        let scope = CommitScope::Fields(vec![ProcessColumn::Entry,
                                             ProcessColumn::TicketData,
                                             ProcessColumn::Decision(role),
                                             ProcessColumn::StageCursor,
                                             ProcessColumn::Outcome,
                                             ProcessColumn::Finished]);
        let mut events = self.store.commit(TransitionCommit { process: process.clone(),
                                                              entry: Some(entry),
                                                              touched,
                                                              events,
                                                              scope })?;
        debug!("process {}: {} {} by {}", process.id, role, decision, submission.decided_by);

        let notification = match process.outcome {
            Some(outcome) => {
                info!("process {} finished ({})", process.id, outcome.as_str());
                let prefix = self.config.completion_prefix.clone();
                Some(self.notify(&process, &form, &prefix, &mut events))
            }
            None => None,
        };
        Ok(TransitionResult { process,
                              events,
                              notification })
    }

    // ---- reporting ----

    pub fn process(&self, process_id: ProcessId) -> Result<TicketProcess, EngineError> {
        self.load_process(process_id)
    }

    pub fn status_row(&self, process_id: ProcessId) -> Result<IndexMap<&'static str, String>, EngineError> {
        Ok(self.load_process(process_id)?.status_row())
    }

    pub fn process_events(&self, process_id: ProcessId) -> Result<Vec<ProcessEvent>, EngineError> {
        self.load_process(process_id)?;
        Ok(self.store.list(process_id)?)
    }

    // ---- helpers ----

    fn role_form(&self, form: &Form, role: Role, entry: Option<&Entry>) -> DynamicForm {
        let mut builder = FormBuilder::new(form).role(role)
                                                .initial(entry.map(Entry::initial_map).unwrap_or_default())
                                                .file_rules(self.config.file_rules.clone());
        for label in &self.config.stage_exclude_labels {
            builder = builder.exclude(label.clone());
        }
        builder.build()
    }

    fn load_process(&self, id: ProcessId) -> Result<TicketProcess, EngineError> {
        self.store.get_process(id)?.ok_or(EngineError::UnknownProcess(id))
    }

    fn load_form(&self, id: FormId) -> Result<Form, EngineError> {
        self.store.get_form(id)?.ok_or(EngineError::UnknownForm(id))
    }

    fn load_entry(&self, process: &TicketProcess) -> Result<Option<Entry>, EngineError> {
        let Some(id) = process.entry_id else {
            return Ok(None);
        };
        match self.store.get_entry(id)? {
            Some(entry) => Ok(Some(entry)),
            None => Err(EngineError::UnknownEntry(id)),
        }
    }

    fn load_template(&self, form: &Form) -> Result<Option<WorkflowTemplate>, EngineError> {
        let Some(id) = form.workflow_template_id else {
            return Ok(None);
        };
        let template = self.store.get_template(id)?;
        if template.is_none() {
            warn!("form '{}' references missing workflow template {id}; using default stages", form.name);
        }
        Ok(template)
    }

    /// Envía la notificación y registra el resultado en el log de eventos.
    fn notify(&mut self, process: &TicketProcess, form: &Form, prefix: &str, events: &mut Vec<ProcessEvent>) -> DispatchOutcome {
        let outcome = self.dispatcher.dispatch(process, form, prefix);
        let subject = format!("{prefix}: {}", form.name);
        let kind = match &outcome {
            DispatchOutcome::Sent { recipients } => ProcessEventKind::NotificationSent { subject,
                                                                                         recipients: recipients.clone() },
            DispatchOutcome::Skipped => ProcessEventKind::NotificationSkipped { subject },
            DispatchOutcome::Suppressed { error } => ProcessEventKind::NotificationSuppressed { subject,
                                                                                               error: error.clone() },
        };
        match self.store.append_kind(process.id, kind) {
            Ok(ev) => events.push(ev),
            Err(e) => warn!("process {}: could not record notification event: {e}", process.id),
        }
        outcome
    }
}
