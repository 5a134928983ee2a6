//! Step que crea el directorio de salida y lo elimina si la corrida no
//! termina bien.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use bake_core::{halt_with, CancelToken, StateBag, Step, StepAction, StepError};
use log::{debug, error, warn};
use thiserror::Error;

/// Archivo temporal con el que se comprueba permiso de escritura.
pub const PERMISSION_PROBE: &str = "_bake_perm_check";
pub const DEFAULT_REMOVAL_ATTEMPTS: u32 = 5;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OutputDirError {
    #[error("Output directory exists: {}\n\nUse the force flag to delete it prior to building.", .0.display())]
    Exists(PathBuf),
    #[error("Error deleting previous output directory {}: {reason}", .path.display())]
    RemovePrevious { path: PathBuf, reason: String },
    #[error("Error creating output directory {}: {reason}", .path.display())]
    Create { path: PathBuf, reason: String },
    #[error("Output directory {} is not writable: {reason}", .path.display())]
    NotWritable { path: PathBuf, reason: String },
}

impl From<OutputDirError> for StepError {
    fn from(err: OutputDirError) -> Self {
        match err {
            OutputDirError::Exists(_) => StepError::Config(err.to_string()),
            _ => StepError::Acquire(err.to_string()),
        }
    }
}

/// Prepara `path` para los artefactos de la corrida.
///
/// En `cleanup` sólo borra el directorio si la corrida fue cancelada o
/// detenida, y sólo si este step llegó a hacerse cargo de él.
#[derive(Debug, Clone)]
pub struct StepOutputDir {
    path: PathBuf,
    force: bool,
    removal_attempts: u32,
    retry_delay: Duration,
    created: bool,
}

impl StepOutputDir {
    pub fn new(path: impl Into<PathBuf>, force: bool) -> Self {
        Self { path: path.into(),
               force,
               removal_attempts: DEFAULT_REMOVAL_ATTEMPTS,
               retry_delay: DEFAULT_RETRY_DELAY,
               created: false }
    }

    /// Ajusta los reintentos de borrado en `cleanup`. Se fuerza al menos un intento.
    pub fn with_retry(mut self, attempts: u32, delay: Duration) -> Self {
        self.removal_attempts = attempts.max(1);
        self.retry_delay = delay;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn force(&self) -> bool {
        self.force
    }

    fn prepare(&mut self, state: &StateBag) -> Result<(), OutputDirError> {
        let ui = state.ui();
        if self.path.exists() {
            if !self.force {
                return Err(OutputDirError::Exists(self.path.clone()));
            }
            ui.say("Deleting previous output directory...");
            fs::remove_dir_all(&self.path).map_err(|e| OutputDirError::RemovePrevious { path: self.path.clone(),
                                                                                         reason: e.to_string() })?;
        }

        // A partir de aquí el directorio es nuestro.
        self.created = true;
        debug!("creating output directory {}", self.path.display());
        fs::create_dir_all(&self.path).map_err(|e| OutputDirError::Create { path: self.path.clone(),
                                                                            reason: e.to_string() })?;

        let probe = self.path.join(PERMISSION_PROBE);
        File::create(&probe).and_then(|_| fs::remove_file(&probe))
                            .map_err(|e| OutputDirError::NotWritable { path: self.path.clone(),
                                                                       reason: e.to_string() })
    }

    fn remove_with_retry(&self) -> io::Result<()> {
        let mut attempt = 1;
        loop {
            match fs::remove_dir_all(&self.path) {
                Ok(()) => return Ok(()),
                Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
                Err(e) if attempt >= self.removal_attempts => return Err(e),
                Err(e) => {
                    warn!("attempt {attempt} to delete {} failed: {e}", self.path.display());
                    attempt += 1;
                    thread::sleep(self.retry_delay);
                }
            }
        }
    }
}

impl Step for StepOutputDir {
    fn name(&self) -> &str {
        "output_dir"
    }

    fn run(&mut self, _cancel: &CancelToken, state: &StateBag) -> StepAction {
        match self.prepare(state) {
            Ok(()) => StepAction::Continue,
            Err(err) => halt_with(state, err.into()),
        }
    }

    fn cleanup(&mut self, state: &StateBag) {
        if !self.created || !(state.is_cancelled() || state.is_halted()) {
            return;
        }
        self.created = false;

        if let Some(ui) = state.ui_opt() {
            ui.say("Deleting output directory...");
        }
        if let Err(e) = self.remove_with_retry() {
            error!("giving up deleting output directory {}: {e}", self.path.display());
            if let Some(ui) = state.ui_opt() {
                ui.error(&format!("Error deleting output directory {}: {e}", self.path.display()));
            }
        }
    }
}
