//! ticket-core: motor de aprobación multi-rol sobre formularios dinámicos.
//!
//! - `forms`: construcción y validación de formularios por rol.
//! - `merge` / `snapshot`: acumulación de valores en el `Entry` y vista
//!   label -> valor.
//! - `workflow`: plugin de etapas (`LinearWorkflow`).
//! - `engine`: `ApprovalEngine`, transiciones atómicas.
//! - `repo` / `event`: traits de persistencia y backend en memoria.
//! - `notify`: correos best-effort.
pub mod engine;
pub mod errors;
pub mod event;
pub mod forms;
pub mod hashing;
pub mod merge;
pub mod notify;
pub mod repo;
pub mod snapshot;
pub mod workflow;

pub use engine::{ApprovalEngine, EngineConfig, StageSubmission, StageView, StartRequest, StartView, TransitionResult};
pub use errors::{EngineError, NotifyError, RepoError};
pub use event::{EventStore, InMemoryEventStore, ProcessEvent, ProcessEventKind};
pub use forms::{CleanedData, CleanedValue, Control, ControlKind, DynamicForm, FileRules, FormBuilder, Submission, Upload, ValidationErrors};
pub use merge::update_values_for_role;
pub use notify::{DispatchOutcome, EmailMessage, LogMailer, Mailer, NotificationDispatcher, OutboxMailer};
pub use repo::{CommitScope, FormRepository, InMemoryTicketStore, ProcessColumn, ProcessRepository, TicketStore, TransitionCommit};
pub use snapshot::{build_snapshot, summary_html};
pub use workflow::{LinearWorkflow, RejectionPolicy, StageOutcome, WorkflowPlugin};
