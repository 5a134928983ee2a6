//! Ensamblado del pipeline de un builder `chroot`: directorio de salida y
//! mounts adicionales, en ese orden.

use std::path::{Path, PathBuf};

use bake_core::{CancelToken, RunEvent, RunOutcome, Runner, SharedUi, StateBag, StepError};
use bake_steps::{template_wrapper, CommandState, MountSpec, SharedRunner, StepMountExtra, StepOutputDir};
use bake_template::{parse_file, parse_str, ChrootConfig, Template, CHROOT_BUILDER};
use serde::Serialize;
use uuid::Uuid;

use crate::config::BakeConfig;
use crate::errors::BakeError;

/// Todo lo necesario para construir y correr un pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildPlan {
    pub builder: String,
    pub mount_root: PathBuf,
    pub output_dir: PathBuf,
    pub force: bool,
    pub mounts: Vec<MountSpec>,
    pub command_wrapper: String,
}

impl BuildPlan {
    /// Resuelve el builder elegido y aplica encima la configuración de entorno.
    pub fn from_template(template: &Template, cfg: &BakeConfig) -> Result<Self, BakeError> {
        let builder = match cfg.builder.as_deref() {
            Some(name) => template.builder(name)
                                  .ok_or_else(|| BakeError::UnknownBuilder(name.to_string()))?,
            None => {
                let mut chroots = template.builders_of_type(CHROOT_BUILDER);
                let first = chroots.next().ok_or(BakeError::NoChrootBuilder)?;
                if chroots.next().is_some() {
                    let names: Vec<&str> = template.builders_of_type(CHROOT_BUILDER)
                                                   .map(|b| b.name.as_str())
                                                   .collect();
                    return Err(BakeError::AmbiguousBuilder(names.join(", ")));
                }
                first
            }
        };
        let chroot = ChrootConfig::from_builder(builder)?;

        let mount_root = cfg.mount_root
                            .clone()
                            .or(chroot.mount_path)
                            .ok_or_else(|| BakeError::MissingMountPath(builder.name.clone()))?;
        let output_dir = cfg.output_dir
                            .clone()
                            .or(chroot.output_directory)
                            .unwrap_or_else(|| PathBuf::from(format!("output-{}", builder.name)));

        Ok(Self { builder: builder.name.clone(),
                  mount_root,
                  output_dir,
                  force: cfg.force.unwrap_or(chroot.force),
                  mounts: chroot.chroot_mounts,
                  command_wrapper: cfg.command_wrapper.clone().unwrap_or(chroot.command_wrapper) })
    }

    pub fn from_json(template: &str, cfg: &BakeConfig) -> Result<Self, BakeError> {
        Self::from_template(&parse_str(template)?, cfg)
    }

    pub fn from_file(path: &Path, cfg: &BakeConfig) -> Result<Self, BakeError> {
        Self::from_template(&parse_file(path)?, cfg)
    }

    /// Carga la plantilla indicada en `cfg.template`.
    pub fn load(cfg: &BakeConfig) -> Result<Self, BakeError> {
        let path = cfg.template.as_deref().ok_or(BakeError::NoTemplate)?;
        Self::from_file(path, cfg)
    }

    pub fn runner(&self) -> Runner {
        Runner::builder().add_step(StepOutputDir::new(&self.output_dir, self.force))
                         .add_step(StepMountExtra::new(self.mounts.clone()))
                         .build()
    }

    /// Deja en `state` las claves que leen los steps.
    pub fn prepare_state(&self, state: &StateBag, ui: SharedUi, commands: SharedRunner) {
        state.set_ui(ui);
        state.set_mount_path(&self.mount_root);
        state.set_command_wrapper(template_wrapper(self.command_wrapper.clone()));
        state.set_command_runner(commands);
    }

    /// Corre el pipeline completo sobre un estado nuevo.
    pub fn execute(&self, cancel: &CancelToken, ui: SharedUi, commands: SharedRunner) -> Result<RunSummary, BakeError> {
        let state = StateBag::new();
        self.prepare_state(&state, ui, commands);
        let mut runner = self.runner();
        log::info!("building '{}' into {}", self.builder, self.output_dir.display());
        let outcome = runner.run(cancel, &state)?;
        Ok(RunSummary { run_id: runner.run_id(),
                        builder: self.builder.clone(),
                        outcome,
                        error: state.error(),
                        events: runner.events() })
    }
}

/// Resultado de una corrida, serializable para logs.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub builder: String,
    pub outcome: RunOutcome,
    pub error: Option<StepError>,
    pub events: Vec<RunEvent>,
}

impl RunSummary {
    /// Código de salida del proceso para este resultado.
    pub fn exit_code(&self) -> u8 {
        match self.outcome {
            RunOutcome::Completed => 0,
            RunOutcome::Halted => 1,
            RunOutcome::Cancelled => 130,
        }
    }
}
