use std::any::{type_name, Any};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use super::keys;
use crate::errors::StepError;
use crate::step::EarlyCleanup;
use crate::ui::SharedUi;

type Slot = Arc<dyn Any + Send + Sync>;

/// Contexto de ejecución compartido por todos los steps de una corrida.
///
/// Mapa clave -> valor heterogéneo protegido por mutex, más dos banderas
/// reservadas (`cancelled`, `halted`) que viven fuera del mapa para que el
/// hilo vigilante de cancelación pueda escribirlas sin competir por el lock
/// de los valores ordinarios. Ambas banderas son monótonas.
#[derive(Default)]
pub struct StateBag {
    values: Mutex<HashMap<String, Slot>>,
    cancelled: AtomicBool,
    halted: AtomicBool,
}

impl std::fmt::Debug for StateBag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateBag")
         .field("keys", &self.keys())
         .field("cancelled", &self.is_cancelled())
         .field("halted", &self.is_halted())
         .finish()
    }
}

impl StateBag {
    pub fn new() -> Self {
        Self::default()
    }

    fn values(&self) -> MutexGuard<'_, HashMap<String, Slot>> {
        // Un panic dentro de otro step no invalida el mapa: seguimos usándolo.
        match self.values.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Escribe (o sobrescribe) `key`.
    pub fn put<T: Any + Send + Sync>(&self, key: &str, value: T) {
        self.values().insert(key.to_string(), Arc::new(value));
    }

    /// Lee un valor requerido.
    ///
    /// # Panics
    /// Si la clave no existe o el tipo no coincide. Ambos casos son bugs de
    /// autoría del pipeline (un step anterior debía establecer el valor), no
    /// condiciones de runtime.
    pub fn get<T: Any + Clone>(&self, key: &str) -> T {
        let values = self.values();
        let slot = values.get(key)
                         .unwrap_or_else(|| panic!("state key '{key}' is required but was never set"));
        match slot.downcast_ref::<T>() {
            Some(v) => v.clone(),
            None => panic!("state key '{key}' does not hold a value of type {}", type_name::<T>()),
        }
    }

    /// Lectura opcional: `None` si la clave falta o el tipo no coincide.
    pub fn get_ok<T: Any + Clone>(&self, key: &str) -> Option<T> {
        self.values().get(key).and_then(|slot| slot.downcast_ref::<T>()).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values().contains_key(key)
    }

    /// Elimina `key`. Devuelve si existía.
    pub fn remove(&self, key: &str) -> bool {
        self.values().remove(key).is_some()
    }

    /// Claves presentes, ordenadas.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.values().keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn mark_cancelled(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn mark_halted(&self) {
        self.halted.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub fn is_halted(&self) -> bool {
        self.halted.load(Ordering::SeqCst)
    }

    // ---------------------------------------------------------------------
    // Accesores tipados de claves conocidas
    // ---------------------------------------------------------------------

    /// Error registrado por algún step, si lo hay.
    pub fn error(&self) -> Option<StepError> {
        self.get_ok(keys::ERROR)
    }

    pub fn set_error(&self, err: StepError) {
        self.put(keys::ERROR, err);
    }

    /// Sink de UI. Requerido: el caller lo instala antes de correr.
    pub fn ui(&self) -> SharedUi {
        self.get(keys::UI)
    }

    pub fn ui_opt(&self) -> Option<SharedUi> {
        self.get_ok(keys::UI)
    }

    pub fn set_ui(&self, ui: SharedUi) {
        self.put(keys::UI, ui);
    }

    /// Raíz bajo la que se montan los paths anidados.
    pub fn mount_path(&self) -> PathBuf {
        self.get(keys::MOUNT_PATH)
    }

    pub fn set_mount_path(&self, path: impl Into<PathBuf>) {
        self.put(keys::MOUNT_PATH, path.into());
    }

    /// Registra un handle de limpieza temprana bajo `key`.
    pub fn register_early_cleanup(&self, key: &str, handle: Arc<dyn EarlyCleanup>) {
        self.put(key, handle);
    }

    pub fn early_cleanup(&self, key: &str) -> Option<Arc<dyn EarlyCleanup>> {
        self.get_ok(key)
    }
}
