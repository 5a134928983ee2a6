//! Errores del core.
//!
//! `CoreEngineError` cubre fallos del propio motor (uso incorrecto del
//! `Runner`). `StepError` es el valor que los steps dejan en la ranura
//! `error` del `StateBag`: es `Clone` + serializable para poder viajar tanto
//! en el estado compartido como en los eventos de la corrida.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub enum CoreEngineError {
    #[error("runner already ran its pipeline")] AlreadyRan,
    #[error("cancellation watcher failed: {0}")] Watcher(String),
}

/// Taxonomía de errores de un step.
///
/// La cancelación no aparece aquí: es un motivo de terminación, no un error.
#[derive(Debug, Error, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub enum StepError {
    /// Configuración incompleta o inválida detectada al iniciar el step.
    #[error("{0}")] Config(String),
    /// Falló la adquisición de un recurso (directorio, mount, ...).
    #[error("{0}")] Acquire(String),
    /// Falló la liberación de un recurso ya adquirido.
    #[error("{0}")] Release(String),
    /// Un step entró en pánico dentro de `run`.
    #[error("internal: {0}")] Internal(String),
}

impl StepError {
    /// Nombre corto de la categoría (útil en logs y eventos).
    pub fn category(&self) -> &'static str {
        match self {
            StepError::Config(_) => "config",
            StepError::Acquire(_) => "acquire",
            StepError::Release(_) => "release",
            StepError::Internal(_) => "internal",
        }
    }
}
