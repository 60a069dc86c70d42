// ticket-domain library entry point
pub mod entry;
pub mod error;
pub mod form;
pub mod process;
pub mod role;
pub mod template;

pub use entry::{Entry, EntryId, FieldValue, FileRef, StoredValue};
pub use error::DomainError;
pub use form::{FieldDefinition, FieldId, FieldKind, Form, FormId};
pub use process::{ProcessId, ProcessOutcome, RoleDecision, Snapshot, TicketProcess};
pub use role::{Decision, Role};
pub use template::{Stage, TemplateId, WorkflowTemplate};
