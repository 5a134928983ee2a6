use std::collections::HashMap;
use chrono::Utc;
use uuid::Uuid;

use super::{RunEvent, RunEventKind};

/// Registro append-only de eventos, indexado por corrida.
pub trait EventStore: Send {
    /// Añade un evento a la corrida `run_id`, asignándole `seq` y `ts`.
    fn append_kind(&mut self, run_id: Uuid, kind: RunEventKind) -> RunEvent;
    /// Lista eventos de una corrida (orden ascendente por seq).
    fn list(&self, run_id: Uuid) -> Vec<RunEvent>;

    /// Sólo los `kind` de una corrida, en orden de `seq`.
    fn list_kinds(&self, run_id: Uuid) -> Vec<RunEventKind> {
        self.list(run_id).into_iter().map(|e| e.kind).collect()
    }
}

/// Store en memoria; cada corrida numera sus eventos desde 0.
#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    runs: HashMap<Uuid, Vec<RunEvent>>,
}

impl InMemoryEventStore {
    /// Corridas con al menos un evento registrado.
    pub fn run_ids(&self) -> Vec<Uuid> {
        self.runs.keys().copied().collect()
    }
}

impl EventStore for InMemoryEventStore {
    fn append_kind(&mut self, run_id: Uuid, kind: RunEventKind) -> RunEvent {
        let log = self.runs.entry(run_id).or_default();
        let event = RunEvent { seq: log.len() as u64,
                               run_id,
                               kind,
                               ts: Utc::now() };
        log.push(event.clone());
        event
    }

    fn list(&self, run_id: Uuid) -> Vec<RunEvent> {
        self.runs.get(&run_id).cloned().unwrap_or_default()
    }

    fn list_kinds(&self, run_id: Uuid) -> Vec<RunEventKind> {
        self.runs
            .get(&run_id)
            .map(|log| log.iter().map(|e| e.kind.clone()).collect())
            .unwrap_or_default()
    }
}
