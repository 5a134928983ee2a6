use serde::{Deserialize, Serialize};

/// Estado de un step dentro de una corrida.
///
/// Las transiciones válidas son:
/// - `Pending` -> `Running`
/// - `Running` -> `Finished` | `Halted`
/// - `Running` | `Finished` | `Halted` -> `CleanedUp`
///
/// Un step que nunca pasó de `Pending` no recibe `cleanup`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepStatus {
    /// No se ha iniciado.
    Pending,
    /// `run` en curso.
    Running,
    /// `run` devolvió `Continue`.
    Finished,
    /// `run` devolvió `Halt`.
    Halted,
    /// Ya se ejecutó su `cleanup`.
    CleanedUp,
}
