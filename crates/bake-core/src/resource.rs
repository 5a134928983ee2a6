//! Pila de recursos anidados (LIFO).
//!
//! Un step que adquiere varios recursos dependientes entre sí (p. ej. mounts
//! anidados) los apila en orden de adquisición y los libera en orden inverso.
//! Invariante: tras cualquier operación la pila contiene exactamente los
//! recursos que siguen retenidos.
//!
//! El handle es clonable; todas las copias comparten la misma pila, lo que
//! permite publicar un handle de limpieza temprana sin mover el step.

use std::sync::{Arc, Mutex, MutexGuard};

/// Resultado de liberar un recurso.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Release {
    /// Se liberó en esta llamada.
    Released,
    /// Ya estaba liberado por un agente externo; cuenta como éxito.
    AlreadyGone,
}

/// Resumen de un drenado completo.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    pub released: usize,
    pub already_gone: usize,
}

#[derive(Debug)]
pub struct ResourceStack<R> {
    inner: Arc<Mutex<Vec<R>>>,
}

impl<R> Clone for ResourceStack<R> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<R> Default for ResourceStack<R> {
    fn default() -> Self {
        Self { inner: Arc::new(Mutex::new(Vec::new())) }
    }
}

impl<R> ResourceStack<R> {
    pub fn new() -> Self {
        Self::default()
    }

    fn items(&self) -> MutexGuard<'_, Vec<R>> {
        match self.inner.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Registra un recurso recién adquirido.
    pub fn push(&self, resource: R) {
        self.items().push(resource);
    }

    pub fn len(&self) -> usize {
        self.items().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items().is_empty()
    }

    /// Olvida todos los recursos sin liberarlos.
    pub fn clear(&self) {
        self.items().clear();
    }

    /// Libera los recursos de arriba hacia abajo.
    ///
    /// El lock no se mantiene mientras corre `release`. Ante el primer error
    /// el recurso que falló vuelve a la cima y el drenado se detiene: lo que
    /// queda en la pila sigue retenido y puede reintentarse.
    pub fn drain<E, F>(&self, mut release: F) -> Result<DrainReport, E>
        where F: FnMut(&R) -> Result<Release, E>
    {
        let mut report = DrainReport::default();
        loop {
            let top = self.items().pop();
            let Some(resource) = top else { break };
            match release(&resource) {
                Ok(Release::Released) => report.released += 1,
                Ok(Release::AlreadyGone) => report.already_gone += 1,
                Err(e) => {
                    self.items().push(resource);
                    return Err(e);
                }
            }
        }
        Ok(report)
    }
}

impl<R: Clone> ResourceStack<R> {
    /// Copia del contenido actual, de la base a la cima.
    pub fn snapshot(&self) -> Vec<R> {
        self.items().clone()
    }
}
