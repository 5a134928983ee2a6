//! Step que monta rutas adicionales dentro de la raíz del chroot y las
//! desmonta en orden inverso.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bake_core::{halt_with, CancelToken, DrainReport, EarlyCleanup, Release, ResourceStack, StateBag, Step, StepAction,
                StepError};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::command::{CommandRunner, CommandWrapper, WrapError};
use crate::keys::{CommandState, MOUNT_EXTRA_CLEANUP};

/// Tipo de mount que se traduce a `--bind` en lugar de `-t <kind>`.
pub const BIND_KIND: &str = "bind";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MountError {
    #[error("invalid chroot mount {0:?}: expected [kind, source, destination]")]
    InvalidSpec(Vec<String>),
    #[error("Error creating mount directory: {0}")]
    CreateDir(String),
    #[error("Error creating mount command: {0}")]
    WrapMount(WrapError),
    #[error("Error mounting: {reason}\nStderr: {stderr}")]
    Mount { reason: String, stderr: String },
    #[error("Error creating grep command: {0}")]
    WrapProbe(WrapError),
    #[error("Error creating unmount command: {0}")]
    WrapUnmount(WrapError),
    #[error("Error unmounting device: {reason}\nStderr: {stderr}")]
    Unmount { reason: String, stderr: String },
}

impl From<MountError> for StepError {
    fn from(err: MountError) -> Self {
        let msg = err.to_string();
        match err {
            MountError::InvalidSpec(_) => StepError::Config(msg),
            MountError::CreateDir(_) | MountError::WrapMount(_) | MountError::Mount { .. } => StepError::Acquire(msg),
            MountError::WrapProbe(_) | MountError::WrapUnmount(_) | MountError::Unmount { .. } => {
                StepError::Release(msg)
            }
        }
    }
}

/// Un mount a realizar: tipo, origen y destino relativo a la raíz.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountSpec {
    pub kind: String,
    pub source: String,
    pub destination: String,
}

impl MountSpec {
    pub fn new(kind: impl Into<String>, source: impl Into<String>, destination: impl Into<String>) -> Self {
        Self { kind: kind.into(),
               source: source.into(),
               destination: destination.into() }
    }

    /// Construye desde la forma `[kind, source, destination]` de la plantilla.
    pub fn from_triple(parts: &[String]) -> Result<Self, MountError> {
        match parts {
            [kind, source, destination] if !kind.is_empty() && !destination.is_empty() => {
                Ok(Self::new(kind.as_str(), source.as_str(), destination.as_str()))
            }
            _ => Err(MountError::InvalidSpec(parts.to_vec())),
        }
    }

    /// Flags de `mount` para este tipo.
    pub fn flags(&self) -> String {
        if self.kind == BIND_KIND {
            "--bind".to_string()
        } else {
            format!("-t {}", self.kind)
        }
    }

    /// Ruta absoluta del destino bajo `root`.
    pub fn resolve(&self, root: &Path) -> PathBuf {
        root.join(self.destination.trim_start_matches('/'))
    }

    pub fn mount_command(&self, root: &Path) -> String {
        format!("mount {} {} {}", self.flags(), self.source, self.resolve(root).display())
    }
}

/// Monta `chroot_mounts` bajo `mount_path`.
///
/// Lee del estado: `mount_path`, `wrappedCommand`, `ui` y opcionalmente
/// `command_runner`. Publica: `mount_extra_cleanup`.
#[derive(Debug, Default)]
pub struct StepMountExtra {
    mounts: Vec<MountSpec>,
    stack: ResourceStack<PathBuf>,
}

impl StepMountExtra {
    pub fn new(mounts: Vec<MountSpec>) -> Self {
        Self { mounts,
               stack: ResourceStack::new() }
    }

    pub fn from_triples(triples: &[Vec<String>]) -> Result<Self, MountError> {
        let mounts = triples.iter()
                            .map(|t| MountSpec::from_triple(t))
                            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(mounts))
    }

    pub fn mounts(&self) -> &[MountSpec] {
        &self.mounts
    }

    /// Rutas montadas y aún no liberadas, en orden de montaje.
    pub fn mounted(&self) -> Vec<PathBuf> {
        self.stack.snapshot()
    }

    /// Handle que comparte la pila de mounts con este step.
    pub fn cleanup_handle(&self) -> MountExtraCleanup {
        MountExtraCleanup { stack: self.stack.clone() }
    }

    fn mount_one(spec: &MountSpec,
                 root: &Path,
                 wrap: &CommandWrapper,
                 runner: &dyn CommandRunner)
                 -> Result<PathBuf, MountError> {
        let inner = spec.resolve(root);
        fs::create_dir_all(&inner).map_err(|e| MountError::CreateDir(e.to_string()))?;

        let command = wrap(&spec.mount_command(root)).map_err(MountError::WrapMount)?;
        let output = runner.run(&command).map_err(|e| MountError::Mount { reason: e.to_string(),
                                                                         stderr: String::new() })?;
        if !output.success() {
            return Err(MountError::Mount { reason: output.status_text(),
                                           stderr: output.stderr });
        }
        Ok(inner)
    }
}

impl Step for StepMountExtra {
    fn name(&self) -> &str {
        "mount_extra"
    }

    fn run(&mut self, cancel: &CancelToken, state: &StateBag) -> StepAction {
        let root = state.mount_path();
        let ui = state.ui();
        let wrap = state.command_wrapper();
        let runner = state.command_runner();

        ui.say("Mounting additional paths within the chroot...");
        for spec in &self.mounts {
            if cancel.is_cancelled() || state.is_cancelled() {
                info!("mount_extra interrupted with {} path(s) mounted", self.stack.len());
                ui.say("Interrupted while mounting additional paths.");
                return StepAction::Halt;
            }

            ui.message(&format!("Mounting: {}", spec.destination));
            match Self::mount_one(spec, &root, &wrap, runner.as_ref()) {
                Ok(inner) => {
                    debug!("mounted {} at {}", spec.source, inner.display());
                    self.stack.push(inner);
                    state.register_early_cleanup(MOUNT_EXTRA_CLEANUP, Arc::new(self.cleanup_handle()));
                }
                Err(err) => return halt_with(state, err.into()),
            }
        }
        StepAction::Continue
    }

    fn cleanup(&mut self, state: &StateBag) {
        if let Err(err) = self.cleanup_handle().cleanup_now(state) {
            error!("mount_extra cleanup failed: {err}");
            if let Some(ui) = state.ui_opt() {
                ui.error(&err.to_string());
            }
            if state.error().is_none() {
                state.set_error(err);
            }
        }
    }
}

/// Limpieza temprana de los mounts de `StepMountExtra`.
///
/// Comparte la pila con el step: lo que se desmonta aquí ya no se intenta
/// desmontar en el `cleanup` del step, y viceversa.
#[derive(Debug, Clone)]
pub struct MountExtraCleanup {
    stack: ResourceStack<PathBuf>,
}

impl MountExtraCleanup {
    /// Desmonta todo lo apilado, de la cima a la base.
    ///
    /// Se detiene en el primer fallo real; la ruta que falló y las que quedan
    /// debajo permanecen en la pila.
    pub fn unmount_all(&self, state: &StateBag) -> Result<DrainReport, MountError> {
        if self.stack.is_empty() {
            return Ok(DrainReport::default());
        }
        let wrap = state.command_wrapper();
        let runner = state.command_runner();
        let report = self.stack.drain(|path| unmount_one(path, &wrap, runner.as_ref()))?;
        debug!("unmounted {} path(s), {} already gone", report.released, report.already_gone);
        Ok(report)
    }
}

impl EarlyCleanup for MountExtraCleanup {
    fn cleanup_now(&self, state: &StateBag) -> Result<(), StepError> {
        self.unmount_all(state).map(|_| ()).map_err(StepError::from)
    }
}

fn unmount_one(path: &Path, wrap: &CommandWrapper, runner: &dyn CommandRunner) -> Result<Release, MountError> {
    let probe = wrap(&format!("grep {} /proc/mounts", path.display())).map_err(MountError::WrapProbe)?;
    // grep sale con 1 cuando no encuentra la ruta: ya está desmontada.
    match runner.run(&probe) {
        Ok(out) if out.code == Some(1) => {
            debug!("{} is no longer mounted, skipping", path.display());
            return Ok(Release::AlreadyGone);
        }
        Ok(_) => {}
        Err(e) => warn!("mount probe for {} did not run: {e}", path.display()),
    }

    let command = wrap(&format!("umount {}", path.display())).map_err(MountError::WrapUnmount)?;
    match runner.run(&command) {
        Ok(out) if out.success() => Ok(Release::Released),
        Ok(out) => Err(MountError::Unmount { reason: out.status_text(),
                                             stderr: out.stderr }),
        Err(e) => Err(MountError::Unmount { reason: e.to_string(),
                                            stderr: String::new() }),
    }
}
