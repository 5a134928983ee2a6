//! `bake [template.json]`: corre el pipeline del builder chroot.
//!
//! Ctrl-C cancela la corrida; los steps ya iniciados se deshacen igual.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use bake_core::{BasicUi, CancelToken};
use bake_steps::ShellCommandRunner;
use bakeflow_rust::{config, BakeConfig, BuildPlan};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    config::init_dotenv();
    tracing_subscriber::fmt().with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
                             .init();

    let mut cfg = BakeConfig::from_env();
    if let Some(path) = std::env::args().nth(1) {
        cfg.template = Some(PathBuf::from(path));
    }

    let plan = match BuildPlan::load(&cfg) {
        Ok(plan) => plan,
        Err(e) => {
            tracing::error!("{e}");
            eprintln!("{e}");
            return ExitCode::from(2);
        }
    };

    let cancel = CancelToken::new();
    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupt received, cancelling build");
                cancel.cancel();
            }
        })
    };

    let result = tokio::task::spawn_blocking(move || {
                     plan.execute(&cancel, Arc::new(BasicUi::stdio()), Arc::new(ShellCommandRunner::new()))
                 }).await;
    interrupt.abort();

    match result {
        Ok(Ok(summary)) => {
            tracing::debug!("run summary: {}", serde_json::to_string(&summary).unwrap_or_default());
            match &summary.error {
                Some(err) => tracing::error!("build '{}' {:?}: {err}", summary.builder, summary.outcome),
                None => tracing::info!("build '{}' {:?}", summary.builder, summary.outcome),
            }
            ExitCode::from(summary.exit_code())
        }
        Ok(Err(e)) => {
            tracing::error!("{e}");
            ExitCode::from(2)
        }
        Err(join) => {
            tracing::error!("build task failed: {join}");
            ExitCode::FAILURE
        }
    }
}
