use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use bake_core::{CancelToken, MemoryUi, RunOutcome, Runner, StateBag, Step, StepAction, StepError};

type Trace = Arc<Mutex<Vec<String>>>;

/// Step configurable para escenarios de cancelación.
struct Scripted {
    name: &'static str,
    trace: Trace,
    behaviour: Behaviour,
}

enum Behaviour {
    Continue,
    /// Cancela el token desde dentro de `run` (interrupción durante el step).
    CancelDuringRun,
    /// Espera a que el *estado* quede marcado como cancelado (sólo lo hace el vigilante).
    WaitForStateFlag,
    /// Espera cooperativamente el token y devuelve `Halt` al verlo.
    PollTokenThenHalt,
    PanicInCleanup,
}

impl Scripted {
    fn boxed(name: &'static str, behaviour: Behaviour, trace: &Trace) -> Box<dyn Step> {
        Box::new(Self { name,
                        trace: trace.clone(),
                        behaviour })
    }
}

impl Step for Scripted {
    fn name(&self) -> &str {
        self.name
    }

    fn run(&mut self, cancel: &CancelToken, state: &StateBag) -> StepAction {
        self.trace.lock().unwrap().push(format!("run:{}", self.name));
        match self.behaviour {
            Behaviour::CancelDuringRun => cancel.cancel(),
            Behaviour::WaitForStateFlag => {
                let deadline = Instant::now() + Duration::from_secs(5);
                while !state.is_cancelled() && Instant::now() < deadline {
                    thread::sleep(Duration::from_millis(2));
                }
            }
            Behaviour::PollTokenThenHalt => {
                if cancel.wait_timeout(Duration::from_secs(5)) {
                    return StepAction::Halt;
                }
            }
            Behaviour::Continue | Behaviour::PanicInCleanup => {}
        }
        StepAction::Continue
    }

    fn cleanup(&mut self, _state: &StateBag) {
        self.trace.lock().unwrap().push(format!("cleanup:{}", self.name));
        if let Behaviour::PanicInCleanup = self.behaviour {
            panic!("cleanup exploded");
        }
    }
}

#[test]
fn cancellation_at_step_boundary_stops_forward_progress() {
    let trace: Trace = Arc::default();
    let mut runner = Runner::new(vec![Scripted::boxed("a", Behaviour::Continue, &trace),
                                      Scripted::boxed("b", Behaviour::CancelDuringRun, &trace),
                                      Scripted::boxed("c", Behaviour::Continue, &trace)]);
    let state = StateBag::new();

    let outcome = runner.run(&CancelToken::new(), &state).expect("run");

    assert_eq!(outcome, RunOutcome::Cancelled);
    assert!(state.is_cancelled());
    assert!(!state.is_halted());
    assert!(state.error().is_none(), "cancellation is not an error");
    assert_eq!(*trace.lock().unwrap(), vec!["run:a", "run:b", "cleanup:b", "cleanup:a"]);
    assert_eq!(runner.event_variants(), vec!["I", "S", "F", "S", "F", "X", "U", "D", "U", "D", "C"]);
}

#[test]
fn watcher_thread_marks_state_while_step_is_in_flight() {
    let trace: Trace = Arc::default();
    let mut runner = Runner::builder().add_boxed(Scripted::boxed("slow", Behaviour::WaitForStateFlag, &trace))
                                      .add_boxed(Scripted::boxed("never", Behaviour::Continue, &trace))
                                      .watch_interval(Duration::from_millis(5))
                                      .build();
    let state = StateBag::new();
    let token = CancelToken::new();

    let remote = token.clone();
    let interrupter = thread::spawn(move || {
        thread::sleep(Duration::from_millis(30));
        remote.cancel();
    });

    let outcome = runner.run(&token, &state).expect("run");
    interrupter.join().unwrap();

    assert_eq!(outcome, RunOutcome::Cancelled);
    assert!(state.is_cancelled());
    assert_eq!(*trace.lock().unwrap(), vec!["run:slow", "cleanup:slow"]);
}

#[test]
fn cooperative_halt_after_cancel_is_reported_as_cancellation() {
    let trace: Trace = Arc::default();
    let mut runner = Runner::new(vec![Scripted::boxed("a", Behaviour::Continue, &trace),
                                      Scripted::boxed("b", Behaviour::PollTokenThenHalt, &trace),
                                      Scripted::boxed("c", Behaviour::Continue, &trace)]);
    let state = StateBag::new();
    let token = CancelToken::new();
    let remote = token.clone();
    let interrupter = thread::spawn(move || {
        thread::sleep(Duration::from_millis(20));
        remote.cancel();
    });

    let outcome = runner.run(&token, &state).expect("run");
    interrupter.join().unwrap();

    assert_eq!(outcome, RunOutcome::Cancelled);
    assert!(state.is_cancelled() && state.is_halted());
    assert_eq!(runner.cleanup_order(), vec![1, 0]);
}

#[test]
fn cancelled_before_start_runs_nothing() {
    let trace: Trace = Arc::default();
    let mut runner = Runner::new(vec![Scripted::boxed("a", Behaviour::Continue, &trace)]);
    let token = CancelToken::new();
    token.cancel();
    let state = StateBag::new();

    assert_eq!(runner.run(&token, &state).expect("run"), RunOutcome::Cancelled);
    assert!(trace.lock().unwrap().is_empty());
    assert!(runner.cleanup_order().is_empty());
}

#[test]
fn panicking_cleanup_does_not_abort_unwind() {
    let trace: Trace = Arc::default();
    let mut runner = Runner::new(vec![Scripted::boxed("a", Behaviour::Continue, &trace),
                                      Scripted::boxed("b", Behaviour::PanicInCleanup, &trace),
                                      Scripted::boxed("c", Behaviour::Continue, &trace)]);
    let state = StateBag::new();
    let ui = Arc::new(MemoryUi::new());
    state.set_ui(ui.clone());

    let outcome = runner.run(&CancelToken::new(), &state).expect("run");

    assert_eq!(outcome, RunOutcome::Completed);
    assert_eq!(*trace.lock().unwrap(),
               vec!["run:a", "run:b", "run:c", "cleanup:c", "cleanup:b", "cleanup:a"]);
    assert_eq!(state.error(), Some(StepError::Release("cleanup of step 'b' panicked".into())));
    assert_eq!(ui.errors(), vec!["cleanup of step 'b' panicked".to_string()]);
}
