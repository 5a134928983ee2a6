//! bake-core: motor secuencial de steps con deshacer en orden inverso.
//!
//! Piezas:
//! - `state`: contexto compartido (`StateBag`) con banderas `cancelled` / `halted`.
//! - `step`: contrato `Step` (`run` / `cleanup`) y `StepAction`.
//! - `engine`: `Runner`, que ejecuta, vigila la cancelación y deshace.
//! - `resource`: pila LIFO de recursos anidados.
//! - `event`: registro append-only de lo ocurrido en cada corrida.
//! - `ui`: sink de mensajes para el usuario.
pub mod cancel;
pub mod engine;
pub mod errors;
pub mod event;
pub mod resource;
pub mod state;
pub mod step;
pub mod ui;


pub use cancel::CancelToken;
pub use engine::{RunOutcome, RunState, Runner, RunnerBuilder};
pub use errors::{CoreEngineError, StepError};
pub use event::{EventStore, InMemoryEventStore, RunEvent, RunEventKind};
pub use resource::{DrainReport, Release, ResourceStack};
pub use state::StateBag;
pub use step::{halt_with, EarlyCleanup, Step, StepAction, StepStatus};
pub use ui::{BasicUi, MemoryUi, SharedUi, Ui, UiLine};
