//! Tipos de evento de una corrida y estructura `RunEvent`.
//!
//! Rol en el flujo:
//! - El `Runner` emite un evento por cada transición a un `EventStore`
//!   append-only.
//! - La secuencia permite verificar a posteriori el orden de ejecución y de
//!   limpieza sin instrumentar los steps.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::RunOutcome;
use crate::step::StepAction;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunEventKind {
    /// Primer evento de toda corrida.
    RunStarted { step_count: usize },
    /// Se va a invocar `run` del step (ya está en la pila de completados).
    StepStarted { step_index: usize, step_name: String },
    /// `run` devolvió.
    StepFinished { step_index: usize, step_name: String, action: StepAction },
    /// Se observó la cancelación antes de iniciar `next_index`.
    CancelObserved { next_index: usize },
    /// Comienza el `cleanup` de un step iniciado.
    CleanupStarted { step_index: usize, step_name: String },
    /// Terminó el `cleanup`; `panicked` indica que se capturó un panic.
    CleanupFinished { step_index: usize, step_name: String, panicked: bool },
    /// Cierre de la corrida.
    RunFinished { outcome: RunOutcome },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunEvent {
    pub seq: u64, // asignado por el store (orden append)
    pub run_id: Uuid,
    pub kind: RunEventKind,
    pub ts: DateTime<Utc>,
}
