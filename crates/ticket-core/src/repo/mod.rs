pub mod memory;
pub mod types;

pub use memory::InMemoryTicketStore;
pub use types::{CommitScope, FormRepository, ProcessColumn, ProcessRepository, TicketStore, TransitionCommit};
