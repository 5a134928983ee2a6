//! Core Runner implementation

use std::panic::{catch_unwind, resume_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cancel::CancelToken;
use crate::engine::RunnerBuilder;
use crate::errors::{CoreEngineError, StepError};
use crate::event::{EventStore, InMemoryEventStore, RunEvent, RunEventKind};
use crate::state::StateBag;
use crate::step::{Step, StepAction, StepStatus};

/// Intervalo por defecto con el que el vigilante revisa si la corrida terminó.
pub const DEFAULT_WATCH_INTERVAL: Duration = Duration::from_millis(50);

/// Motivo de terminación de una corrida.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunOutcome {
    /// Todos los steps devolvieron `Continue`.
    Completed,
    /// Algún step devolvió `Halt` sin que hubiera cancelación.
    Halted,
    /// La corrida fue interrumpida desde fuera.
    Cancelled,
}

/// Fase del runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Aún no se corrió.
    Idle,
    /// Ejecutando steps en orden.
    Running,
    /// Invocando `cleanup` sobre los steps iniciados.
    Unwinding,
    /// Terminal.
    Done,
}

/// Motor de ejecución secuencial de steps.
///
/// Corre cada step en orden de declaración, vigila la cancelación desde un
/// hilo aparte y, al terminar por cualquier motivo, invoca `cleanup` sobre
/// todos los steps que llegaron a iniciarse, en orden inverso.
pub struct Runner<E: EventStore = InMemoryEventStore> {
    steps: Vec<Box<dyn Step>>,
    statuses: Vec<StepStatus>,
    event_store: E,
    run_id: Uuid,
    phase: RunState,
    outcome: Option<RunOutcome>,
    watch_interval: Duration,
}

impl<E: EventStore> std::fmt::Debug for Runner<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runner")
         .field("steps", &self.step_names())
         .field("run_id", &self.run_id)
         .field("phase", &self.phase)
         .field("outcome", &self.outcome)
         .finish()
    }
}

impl Runner<InMemoryEventStore> {
    /// Crea un runner con store de eventos en memoria.
    pub fn new(steps: Vec<Box<dyn Step>>) -> Self {
        Self::new_with_store(steps, InMemoryEventStore::default())
    }

    /// Crea un builder para encadenar steps.
    #[inline]
    pub fn builder() -> RunnerBuilder<InMemoryEventStore> {
        RunnerBuilder::new(InMemoryEventStore::default())
    }
}

impl<E: EventStore> Runner<E> {
    /// Crea un runner con el store de eventos proporcionado.
    pub fn new_with_store(steps: Vec<Box<dyn Step>>, event_store: E) -> Self {
        let statuses = vec![StepStatus::Pending; steps.len()];
        Self { steps,
               statuses,
               event_store,
               run_id: Uuid::new_v4(),
               phase: RunState::Idle,
               outcome: None,
               watch_interval: DEFAULT_WATCH_INTERVAL }
    }

    pub(crate) fn set_watch_interval(&mut self, interval: Duration) {
        self.watch_interval = interval;
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn state(&self) -> RunState {
        self.phase
    }

    /// Resultado de la corrida, si ya terminó.
    pub fn outcome(&self) -> Option<RunOutcome> {
        self.outcome
    }

    pub fn statuses(&self) -> &[StepStatus] {
        &self.statuses
    }

    pub fn step_names(&self) -> Vec<String> {
        self.steps.iter().map(|s| s.name().to_string()).collect()
    }

    pub fn event_store(&self) -> &E {
        &self.event_store
    }

    /// Eventos de esta corrida.
    pub fn events(&self) -> Vec<RunEvent> {
        self.event_store.list(self.run_id)
    }

    fn record(&mut self, kind: RunEventKind) {
        let _ = self.event_store.append_kind(self.run_id, kind);
    }

    /// Ejecuta el pipeline completo.
    ///
    /// Devuelve el motivo de terminación; el error concreto (si lo hubo) y
    /// las banderas `cancelled` / `halted` quedan en `state`. Un runner sólo
    /// corre una vez: una segunda llamada devuelve `AlreadyRan` sin tocar
    /// ningún step.
    pub fn run(&mut self, cancel: &CancelToken, state: &StateBag) -> Result<RunOutcome, CoreEngineError> {
        if self.phase != RunState::Idle {
            return Err(CoreEngineError::AlreadyRan);
        }
        self.phase = RunState::Running;
        self.record(RunEventKind::RunStarted { step_count: self.steps.len() });
        info!("run {} started with {} step(s)", self.run_id, self.steps.len());

        let finished = AtomicBool::new(false);
        let interval = self.watch_interval;
        let mut panicked_in_run = None;
        let result = thread::scope(|scope| -> Result<RunOutcome, CoreEngineError> {
            let watcher = thread::Builder::new().name("bake-cancel-watcher".into())
                                                .spawn_scoped(scope, || watch_cancellation(cancel, state, &finished, interval))
                                                .map_err(|e| CoreEngineError::Watcher(e.to_string()))?;
            // Libera al vigilante pase lo que pase dentro de este bloque.
            let _release = WatcherRelease(&finished);

            let mut started: Vec<usize> = Vec::with_capacity(self.steps.len());
            let forward = catch_unwind(AssertUnwindSafe(|| self.forward(cancel, state, &mut started)));
            if let Err(payload) = forward {
                self.record_run_panic(&started, state);
                panicked_in_run = Some(payload);
            }

            let outcome = if state.is_cancelled() {
                RunOutcome::Cancelled
            } else if state.is_halted() {
                RunOutcome::Halted
            } else {
                RunOutcome::Completed
            };

            self.phase = RunState::Unwinding;
            self.unwind(started, state);

            finished.store(true, Ordering::SeqCst);
            if watcher.join().is_err() {
                warn!("cancel watcher thread panicked");
            }
            Ok(outcome)
        });

        self.phase = RunState::Done;
        if let Some(payload) = panicked_in_run {
            // Violación de contrato: ya se deshizo lo iniciado, el panic sigue su curso.
            resume_unwind(payload);
        }
        let outcome = result?;
        self.outcome = Some(outcome);
        self.record(RunEventKind::RunFinished { outcome });
        info!("run {} finished: {:?}", self.run_id, outcome);
        Ok(outcome)
    }

    /// Deja constancia de un panic dentro de `run` del último step iniciado.
    fn record_run_panic(&mut self, started: &[usize], state: &StateBag) {
        let Some(&index) = started.last() else { return };
        let name = self.steps[index].name().to_string();
        error!("step #{index} '{name}' panicked during run; unwinding started steps");
        self.statuses[index] = StepStatus::Halted;
        state.mark_halted();
        if state.error().is_none() {
            state.set_error(StepError::Internal(format!("step '{name}' panicked during run")));
        }
    }

    /// Pasada hacia adelante. Apila en `started` los índices iniciados.
    fn forward(&mut self, cancel: &CancelToken, state: &StateBag, started: &mut Vec<usize>) {
        for index in 0..self.steps.len() {
            if cancel.is_cancelled() || state.is_cancelled() {
                state.mark_cancelled();
                self.record(RunEventKind::CancelObserved { next_index: index });
                info!("cancellation observed before step #{index}; no further steps will run");
                break;
            }

            let name = self.steps[index].name().to_string();
            // Se apila antes de `run`: un step que falla a mitad también
            // recibe su `cleanup`.
            started.push(index);
            self.statuses[index] = StepStatus::Running;
            self.record(RunEventKind::StepStarted { step_index: index,
                                                    step_name: name.clone() });
            debug!("step #{index} '{name}' running");

            let action = self.steps[index].run(cancel, state);

            self.record(RunEventKind::StepFinished { step_index: index,
                                                     step_name: name.clone(),
                                                     action });
            match action {
                StepAction::Continue => {
                    self.statuses[index] = StepStatus::Finished;
                }
                StepAction::Halt => {
                    self.statuses[index] = StepStatus::Halted;
                    state.mark_halted();
                    info!("step #{index} '{name}' halted the pipeline");
                    break;
                }
            }
        }
        // El vigilante puede tardar un intervalo en reaccionar.
        if cancel.is_cancelled() {
            state.mark_cancelled();
        }
    }

    /// Invoca `cleanup` sobre los steps iniciados, del último al primero.
    fn unwind(&mut self, mut started: Vec<usize>, state: &StateBag) {
        while let Some(index) = started.pop() {
            let name = self.steps[index].name().to_string();
            self.record(RunEventKind::CleanupStarted { step_index: index,
                                                       step_name: name.clone() });
            debug!("step #{index} '{name}' cleanup");

            let step = &mut self.steps[index];
            let panicked = catch_unwind(AssertUnwindSafe(|| step.cleanup(state))).is_err();
            if panicked {
                error!("cleanup of step #{index} '{name}' panicked; continuing unwind");
                let msg = format!("cleanup of step '{name}' panicked");
                if let Some(ui) = state.ui_opt() {
                    ui.error(&msg);
                }
                // El error original de la pasada hacia adelante prevalece.
                if state.error().is_none() {
                    state.set_error(StepError::Release(msg));
                }
            }

            self.statuses[index] = StepStatus::CleanedUp;
            self.record(RunEventKind::CleanupFinished { step_index: index,
                                                        step_name: name,
                                                        panicked });
        }
    }

    /// Variante compacta de eventos de la corrida.
    pub fn event_variants(&self) -> Vec<&'static str> {
        self.event_store
            .list_kinds(self.run_id)
            .iter()
            .map(|kind| match kind {
                RunEventKind::RunStarted { .. } => "I",
                RunEventKind::StepStarted { .. } => "S",
                RunEventKind::StepFinished { action: StepAction::Continue, .. } => "F",
                RunEventKind::StepFinished { action: StepAction::Halt, .. } => "H",
                RunEventKind::CancelObserved { .. } => "X",
                RunEventKind::CleanupStarted { .. } => "U",
                RunEventKind::CleanupFinished { .. } => "D",
                RunEventKind::RunFinished { .. } => "C",
            })
            .collect()
    }

    /// Índices de steps en el orden en que se invocó su `cleanup`.
    pub fn cleanup_order(&self) -> Vec<usize> {
        self.event_store
            .list_kinds(self.run_id)
            .iter()
            .filter_map(|kind| match kind {
                RunEventKind::CleanupStarted { step_index, .. } => Some(*step_index),
                _ => None,
            })
            .collect()
    }
}

/// Marca la corrida como terminada al salir del scope, incluso durante un panic.
struct WatcherRelease<'a>(&'a AtomicBool);

impl Drop for WatcherRelease<'_> {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

/// Cuerpo del hilo vigilante: traslada la cancelación del token a la
/// bandera del estado hasta que la corrida termine.
fn watch_cancellation(cancel: &CancelToken, state: &StateBag, finished: &AtomicBool, interval: Duration) {
    while !finished.load(Ordering::SeqCst) {
        if cancel.wait_timeout(interval) {
            state.mark_cancelled();
            debug!("cancel watcher marked state as cancelled");
            return;
        }
    }
}
