use std::fs;
use std::sync::Arc;
use std::time::Duration;

use bake_core::{CancelToken, MemoryUi, StateBag, Step, StepAction, StepError};
use bake_steps::{StepOutputDir, PERMISSION_PROBE};

fn state() -> (StateBag, Arc<MemoryUi>) {
    let state = StateBag::new();
    let ui = Arc::new(MemoryUi::new());
    state.set_ui(ui.clone());
    (state, ui)
}

fn fresh_path() -> (tempfile::TempDir, std::path::PathBuf) {
    let parent = tempfile::tempdir().unwrap();
    let path = parent.path().join("output");
    (parent, path)
}

#[test]
fn completed_run_keeps_the_directory() {
    let (state, _ui) = state();
    let (_parent, path) = fresh_path();
    let mut step = StepOutputDir::new(&path, false);

    assert_eq!(step.run(&CancelToken::new(), &state), StepAction::Continue);
    assert!(state.error().is_none());
    assert!(path.is_dir());
    assert!(!path.join(PERMISSION_PROBE).exists());

    step.cleanup(&state);
    assert!(path.is_dir());
}

#[test]
fn cancelled_run_removes_the_directory() {
    let (state, _ui) = state();
    let (_parent, path) = fresh_path();
    let mut step = StepOutputDir::new(&path, false);

    step.run(&CancelToken::new(), &state);
    fs::write(path.join("artifact.img"), b"partial").unwrap();
    state.mark_cancelled();
    step.cleanup(&state);

    assert!(!path.exists());
}

#[test]
fn halted_run_removes_the_directory_and_second_cleanup_is_quiet() {
    let (state, ui) = state();
    let (_parent, path) = fresh_path();
    let mut step = StepOutputDir::new(&path, false).with_retry(2, Duration::ZERO);

    step.run(&CancelToken::new(), &state);
    state.mark_halted();
    step.cleanup(&state);
    assert!(!path.exists());

    let said = ui.lines().len();
    step.cleanup(&state);
    assert_eq!(ui.lines().len(), said);
    assert!(ui.errors().is_empty());
}

#[test]
fn existing_directory_without_force_halts_and_survives_cleanup() {
    let (state, ui) = state();
    let (_parent, path) = fresh_path();
    fs::create_dir_all(&path).unwrap();
    fs::write(path.join("keep.txt"), b"mine").unwrap();
    let mut step = StepOutputDir::new(&path, false);

    assert_eq!(step.run(&CancelToken::new(), &state), StepAction::Halt);
    let err = state.error().expect("error recorded");
    assert!(matches!(err, StepError::Config(_)));
    assert!(err.to_string().starts_with("Output directory exists:"));
    assert_eq!(ui.errors().len(), 1);

    // el runner marca la corrida como detenida; aun así no es nuestro
    state.mark_halted();
    step.cleanup(&state);
    assert!(path.join("keep.txt").exists());
}

#[test]
fn force_replaces_an_existing_directory() {
    let (state, _ui) = state();
    let (_parent, path) = fresh_path();
    fs::create_dir_all(&path).unwrap();
    fs::write(path.join("stale.txt"), b"old").unwrap();
    let mut step = StepOutputDir::new(&path, true);

    assert_eq!(step.run(&CancelToken::new(), &state), StepAction::Continue);
    assert!(path.is_dir());
    assert!(!path.join("stale.txt").exists());
}

#[test]
fn cleanup_tolerates_directory_already_removed() {
    let (state, ui) = state();
    let (_parent, path) = fresh_path();
    let mut step = StepOutputDir::new(&path, false).with_retry(1, Duration::ZERO);

    step.run(&CancelToken::new(), &state);
    fs::remove_dir_all(&path).unwrap();
    state.mark_cancelled();
    step.cleanup(&state);

    assert!(ui.errors().is_empty());
}
