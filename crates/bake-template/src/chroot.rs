//! Configuración de un builder `chroot` tomada de la plantilla.

use std::path::PathBuf;

use bake_steps::{template_wrapper, CommandWrapper, MountSpec, COMMAND_PLACEHOLDER};
use serde::Deserialize;
use serde_json::Value;

use crate::errors::{TemplateError, TemplateErrors};
use crate::types::Builder;

pub const CHROOT_BUILDER: &str = "chroot";

#[derive(Debug, Default, Deserialize)]
struct RawChroot {
    mount_path: Option<String>,
    #[serde(default)]
    chroot_mounts: Vec<Vec<String>>,
    command_wrapper: Option<String>,
    output_directory: Option<String>,
    #[serde(default)]
    force: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChrootConfig {
    /// Raíz del chroot; puede venir después del entorno.
    pub mount_path: Option<PathBuf>,
    pub chroot_mounts: Vec<MountSpec>,
    pub command_wrapper: String,
    pub output_directory: Option<PathBuf>,
    pub force: bool,
}

impl Default for ChrootConfig {
    fn default() -> Self {
        Self { mount_path: None,
               chroot_mounts: default_mounts(),
               command_wrapper: COMMAND_PLACEHOLDER.to_string(),
               output_directory: None,
               force: false }
    }
}

/// Mounts estándar cuando el builder no declara `chroot_mounts`.
pub fn default_mounts() -> Vec<MountSpec> {
    vec![MountSpec::new("proc", "proc", "/proc"),
         MountSpec::new("sysfs", "sysfs", "/sys"),
         MountSpec::new("bind", "/dev", "/dev"),
         MountSpec::new("devpts", "devpts", "/dev/pts"),
         MountSpec::new("binfmt_misc", "binfmt_misc", "/proc/sys/fs/binfmt_misc")]
}

impl ChrootConfig {
    pub fn from_builder(builder: &Builder) -> Result<Self, TemplateErrors> {
        let err = |reason: String| TemplateError::Chroot { name: builder.name.clone(),
                                                           reason };
        let raw: RawChroot =
            serde_json::from_value(Value::Object(builder.config.clone())).map_err(|e| err(e.to_string()))?;

        let mut errs = Vec::new();
        let mut mounts = Vec::with_capacity(raw.chroot_mounts.len());
        for (i, triple) in raw.chroot_mounts.iter().enumerate() {
            match MountSpec::from_triple(triple) {
                Ok(spec) => mounts.push(spec),
                Err(e) => errs.push(err(format!("chroot_mounts[{i}]: {e}"))),
            }
        }

        let command_wrapper = raw.command_wrapper
                                 .filter(|w| !w.is_empty())
                                 .unwrap_or_else(|| COMMAND_PLACEHOLDER.to_string());
        if !command_wrapper.contains(COMMAND_PLACEHOLDER) {
            errs.push(err(format!("command_wrapper must contain {COMMAND_PLACEHOLDER}")));
        }

        if !errs.is_empty() {
            return Err(TemplateErrors(errs));
        }
        if mounts.is_empty() {
            mounts = default_mounts();
        }

        Ok(Self { mount_path: raw.mount_path.filter(|p| !p.is_empty()).map(PathBuf::from),
                  chroot_mounts: mounts,
                  command_wrapper,
                  output_directory: raw.output_directory.filter(|p| !p.is_empty()).map(PathBuf::from),
                  force: raw.force })
    }

    pub fn wrapper(&self) -> CommandWrapper {
        template_wrapper(self.command_wrapper.clone())
    }
}
