//! Token de cancelación cooperativa.
//!
//! El token se clona libremente: todas las copias comparten el mismo estado.
//! Una vez cancelado no vuelve atrás. Los steps lo consultan entre
//! sub-operaciones; el `Runner` lo vigila desde un hilo aparte.

use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

#[derive(Debug, Default)]
struct Inner {
    cancelled: Mutex<bool>,
    signal: Condvar,
}

#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marca el token como cancelado y despierta a quien esté esperando.
    pub fn cancel(&self) {
        let mut flag = match self.inner.cancelled.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        if !*flag {
            *flag = true;
            log::debug!("cancel token fired");
        }
        self.inner.signal.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        match self.inner.cancelled.lock() {
            Ok(g) => *g,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    /// Espera hasta `timeout` a que el token se cancele. Devuelve el estado
    /// final observado.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let guard = match self.inner.cancelled.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        if *guard {
            return true;
        }
        match self.inner.signal.wait_timeout_while(guard, timeout, |c| !*c) {
            Ok((g, _)) => *g,
            Err(poisoned) => *poisoned.into_inner().0,
        }
    }
}
