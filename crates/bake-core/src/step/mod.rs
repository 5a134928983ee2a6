//! Contrato de Steps.
//!
//! Un Step es una unidad de trabajo con una acción hacia adelante (`run`) y
//! una acción de deshacer (`cleanup`). Este módulo define:
//! - `Step`: interfaz usada por el `Runner`.
//! - `StepAction`: señal de continuación (`Continue` / `Halt`).
//! - `EarlyCleanup`: handle de limpieza que un step publica en el estado.
//! - `StepStatus`: ciclo de vida observado por el runner.

mod definition;
mod status;

pub use definition::{halt_with, EarlyCleanup, Step, StepAction};
pub use status::StepStatus;
