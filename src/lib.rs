//! bake: arma y corre el pipeline de un builder `chroot` descrito en una
//! plantilla JSON.
//!
//! - `config`: variables de entorno (`BAKE_*`), con `.env` opcional.
//! - `pipeline`: `BuildPlan` (plantilla + entorno) y `RunSummary`.
//! - `errors`: `BakeError`.

pub mod config;
pub mod errors;
pub mod pipeline;

pub use config::BakeConfig;
pub use errors::BakeError;
pub use pipeline::{BuildPlan, RunSummary};
