//! Claves reservadas del `StateBag`.
//!
//! Cada crate que añade claves propias las declara en su propio módulo; aquí
//! sólo viven las que el core entiende.

/// Último error registrado por un step (`StepError`).
pub const ERROR: &str = "error";
/// Sink de salida para el usuario (`SharedUi`).
pub const UI: &str = "ui";
/// Raíz de los mounts anidados (`PathBuf`).
pub const MOUNT_PATH: &str = "mount_path";
