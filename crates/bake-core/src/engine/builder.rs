//! Builder para `Runner`.
//!
//! Acumula los steps en orden de declaración y permite elegir el store de
//! eventos y el intervalo del vigilante de cancelación antes de construir.
//!
//! ```ignore
//! let mut runner = Runner::builder()
//!     .add_step(StepOutputDir::new(dir, false))
//!     .add_step(StepMountExtra::new(mounts))
//!     .build();
//! ```

use std::time::Duration;

use crate::engine::core::DEFAULT_WATCH_INTERVAL;
use crate::engine::Runner;
use crate::event::EventStore;
use crate::step::Step;

pub struct RunnerBuilder<E: EventStore> {
    event_store: E,
    steps: Vec<Box<dyn Step>>,
    watch_interval: Duration,
}

impl<E: EventStore> RunnerBuilder<E> {
    pub fn new(event_store: E) -> Self {
        Self { event_store,
               steps: Vec::new(),
               watch_interval: DEFAULT_WATCH_INTERVAL }
    }

    /// Reemplaza el store de eventos conservando los steps ya añadidos.
    pub fn with_event_store<E2: EventStore>(self, event_store: E2) -> RunnerBuilder<E2> {
        RunnerBuilder { event_store,
                        steps: self.steps,
                        watch_interval: self.watch_interval }
    }

    /// Añade un step al final del pipeline.
    #[inline]
    pub fn add_step<S>(mut self, step: S) -> Self
        where S: Step + 'static
    {
        self.steps.push(Box::new(step));
        self
    }

    /// Añade un step ya empaquetado (p. ej. elegido en runtime).
    pub fn add_boxed(mut self, step: Box<dyn Step>) -> Self {
        self.steps.push(step);
        self
    }

    /// Cada cuánto el vigilante revisa si la corrida ya terminó.
    pub fn watch_interval(mut self, interval: Duration) -> Self {
        self.watch_interval = interval;
        self
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    #[inline]
    pub fn build(self) -> Runner<E> {
        let mut runner = Runner::new_with_store(self.steps, self.event_store);
        runner.set_watch_interval(self.watch_interval);
        runner
    }
}
