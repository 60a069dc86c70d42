use std::collections::HashMap;

use chrono::Utc;
use uuid::Uuid;

use super::{ProcessEvent, ProcessEventKind};
use crate::errors::RepoError;

/// Almacenamiento de eventos append-only.
pub trait EventStore {
    /// Agrega un evento a partir de su kind y devuelve el evento completo
    /// (con seq y ts).
    fn append_kind(&mut self, process_id: Uuid, kind: ProcessEventKind) -> Result<ProcessEvent, RepoError>;
    /// Lista eventos de un proceso (orden ascendente por seq).
    fn list(&self, process_id: Uuid) -> Result<Vec<ProcessEvent>, RepoError>;
}

#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    inner: HashMap<Uuid, Vec<ProcessEvent>>,
    next_seq: u64,
}

impl EventStore for InMemoryEventStore {
    fn append_kind(&mut self, process_id: Uuid, kind: ProcessEventKind) -> Result<ProcessEvent, RepoError> {
        self.next_seq += 1;
        let ev = ProcessEvent { seq: self.next_seq,
                                process_id,
                                kind,
                                ts: Utc::now() };
        self.inner.entry(process_id).or_default().push(ev.clone());
        Ok(ev)
    }

    fn list(&self, process_id: Uuid) -> Result<Vec<ProcessEvent>, RepoError> {
        Ok(self.inner.get(&process_id).cloned().unwrap_or_default())
    }
}
