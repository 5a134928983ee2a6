//! Configuración desde variables de entorno (.env incluido).
//!
//! Todo es opcional: lo que falte aquí se toma de la plantilla. Lo que sí
//! esté definido tiene prioridad sobre la plantilla.

use std::env;
use std::path::PathBuf;

use dotenvy::dotenv;
use once_cell::sync::Lazy;

pub const ENV_TEMPLATE: &str = "BAKE_TEMPLATE";
pub const ENV_MOUNT_ROOT: &str = "BAKE_MOUNT_ROOT";
pub const ENV_COMMAND_WRAPPER: &str = "BAKE_COMMAND_WRAPPER";
pub const ENV_OUTPUT_DIR: &str = "BAKE_OUTPUT_DIR";
pub const ENV_FORCE: &str = "BAKE_FORCE";
pub const ENV_BUILDER: &str = "BAKE_BUILDER";

// Carga perezosa del archivo .env una sola vez.
static DOTENV_LOADED: Lazy<()> = Lazy::new(|| {
    let _ = dotenv(); // ignora error si no existe .env
});

/// Forzar carga temprana de .env.
pub fn init_dotenv() {
    Lazy::force(&DOTENV_LOADED);
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BakeConfig {
    pub template: Option<PathBuf>,
    /// Nombre del builder a usar si la plantilla define varios.
    pub builder: Option<String>,
    pub mount_root: Option<PathBuf>,
    pub command_wrapper: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub force: Option<bool>,
}

impl BakeConfig {
    pub fn from_env() -> Self {
        init_dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Igual que `from_env` pero con un origen de variables arbitrario.
    pub fn from_lookup<F>(lookup: F) -> Self
        where F: Fn(&str) -> Option<String>
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self { template: get(ENV_TEMPLATE).map(PathBuf::from),
               builder: get(ENV_BUILDER),
               mount_root: get(ENV_MOUNT_ROOT).map(PathBuf::from),
               command_wrapper: get(ENV_COMMAND_WRAPPER),
               output_dir: get(ENV_OUTPUT_DIR).map(PathBuf::from),
               force: get(ENV_FORCE).and_then(|v| parse_bool(&v)) }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        other => {
            log::warn!("ignoring unrecognised boolean value {other:?}");
            None
        }
    }
}
