use serde::{Deserialize, Serialize};

use crate::cancel::CancelToken;
use crate::errors::StepError;
use crate::state::StateBag;

/// Resultado del `run` de un step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepAction {
    /// Seguir con el siguiente step.
    Continue,
    /// Detener el avance; el runner pasa a deshacer lo iniciado.
    Halt,
}

/// Contrato de un step del pipeline.
pub trait Step: Send {
    /// Nombre estable usado en eventos y logs.
    fn name(&self) -> &str;

    /// Trabajo hacia adelante. Se invoca como mucho una vez por corrida.
    ///
    /// Ante un fallo interno el step debe dejar el error en la ranura
    /// `error` del estado, avisar por la UI y devolver `Halt` (ver
    /// [`halt_with`]). Nunca invoca el `cleanup` de otros steps.
    fn run(&mut self, cancel: &CancelToken, state: &StateBag) -> StepAction;

    /// Deshace lo que `run` haya adquirido.
    ///
    /// Debe tolerar que `run` no haya corrido o haya fallado a mitad, y ser
    /// idempotente. Sus propios fallos se reportan por la UI / ranura de
    /// error, nunca se propagan.
    fn cleanup(&mut self, state: &StateBag);
}

/// Handle que un step deja en el estado para que un controlador externo
/// libere sus recursos fuera del unwind normal.
pub trait EarlyCleanup: Send + Sync {
    fn cleanup_now(&self, state: &StateBag) -> Result<(), StepError>;
}

/// Convención de fallo de un step: registra el error, lo emite por la UI y
/// devuelve `Halt`.
pub fn halt_with(state: &StateBag, err: StepError) -> StepAction {
    log::error!("step halted ({}): {err}", err.category());
    if let Some(ui) = state.ui_opt() {
        ui.error(&err.to_string());
    }
    state.set_error(err);
    StepAction::Halt
}
