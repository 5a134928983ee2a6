use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use bake_core::{CancelToken, Runner, StateBag, Step, StepAction, StepError};

type Trace = Arc<Mutex<Vec<String>>>;

struct Noted {
    name: &'static str,
    trace: Trace,
}

impl Step for Noted {
    fn name(&self) -> &str {
        self.name
    }

    fn run(&mut self, _cancel: &CancelToken, _state: &StateBag) -> StepAction {
        self.trace.lock().unwrap().push(format!("run:{}", self.name));
        StepAction::Continue
    }

    fn cleanup(&mut self, _state: &StateBag) {
        self.trace.lock().unwrap().push(format!("cleanup:{}", self.name));
    }
}

/// Lee una clave requerida que nadie estableció.
struct NeedsMountPath {
    trace: Trace,
}

impl Step for NeedsMountPath {
    fn name(&self) -> &str {
        "needs_mount_path"
    }

    fn run(&mut self, _cancel: &CancelToken, state: &StateBag) -> StepAction {
        self.trace.lock().unwrap().push("run:needs_mount_path".into());
        let _root = state.mount_path();
        StepAction::Continue
    }

    fn cleanup(&mut self, _state: &StateBag) {
        self.trace.lock().unwrap().push("cleanup:needs_mount_path".into());
    }
}

#[test]
fn panic_in_run_unwinds_started_steps_and_propagates() {
    let trace: Trace = Arc::default();
    let state = Arc::new(StateBag::new());

    let worker = {
        let trace = trace.clone();
        let state = state.clone();
        thread::spawn(move || {
            let mut runner = Runner::builder().add_step(Noted { name: "a",
                                                                trace: trace.clone() })
                                              .add_step(NeedsMountPath { trace: trace.clone() })
                                              .add_step(Noted { name: "c", trace })
                                              .watch_interval(Duration::from_millis(5))
                                              .build();
            runner.run(&CancelToken::new(), &state)
        })
    };

    let deadline = Instant::now() + Duration::from_secs(5);
    while !worker.is_finished() && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(10));
    }
    assert!(worker.is_finished(), "runner did not return after a step panicked in run");
    assert!(worker.join().is_err(), "the contract violation must keep propagating");

    assert_eq!(*trace.lock().unwrap(),
               vec!["run:a", "run:needs_mount_path", "cleanup:needs_mount_path", "cleanup:a"]);
    assert!(state.is_halted());
    assert_eq!(state.error(),
               Some(StepError::Internal("step 'needs_mount_path' panicked during run".into())));
}
