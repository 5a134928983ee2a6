use std::sync::{Arc, Mutex};

use bake_core::{halt_with, CancelToken, RunEventKind, RunOutcome, Runner, StateBag, Step, StepAction, StepError};

type Trace = Arc<Mutex<Vec<(String, usize)>>>;

/// Step que anota `run`/`cleanup` y puede detener el pipeline.
struct Recorder {
    index: usize,
    name: String,
    halt: bool,
    trace: Trace,
}

impl Step for Recorder {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&mut self, _cancel: &CancelToken, state: &StateBag) -> StepAction {
        self.trace.lock().unwrap().push(("run".into(), self.index));
        if self.halt {
            return halt_with(state, StepError::Acquire(format!("step {} failed", self.index)));
        }
        StepAction::Continue
    }

    fn cleanup(&mut self, _state: &StateBag) {
        self.trace.lock().unwrap().push(("cleanup".into(), self.index));
    }
}

fn pipeline(n: usize, halt_at: Option<usize>, trace: &Trace) -> Runner {
    let steps: Vec<Box<dyn Step>> = (0..n).map(|i| {
                                              Box::new(Recorder { index: i,
                                                                  name: format!("step-{i}"),
                                                                  halt: Some(i) == halt_at,
                                                                  trace: trace.clone() })
                                                  as Box<dyn Step>
                                          })
                                          .collect();
    Runner::new(steps)
}

#[test]
fn steps_run_in_declaration_order_and_clean_up_in_reverse() {
    for n in [1usize, 2, 5, 8] {
        let trace: Trace = Arc::default();
        let mut runner = pipeline(n, None, &trace);
        let outcome = runner.run(&CancelToken::new(), &StateBag::new()).expect("run");
        assert_eq!(outcome, RunOutcome::Completed);

        let t = trace.lock().unwrap();
        let runs: Vec<usize> = t.iter().filter(|(k, _)| k == "run").map(|(_, i)| *i).collect();
        let cleanups: Vec<usize> = t.iter().filter(|(k, _)| k == "cleanup").map(|(_, i)| *i).collect();
        assert_eq!(runs, (0..n).collect::<Vec<_>>());
        assert_eq!(cleanups, (0..n).rev().collect::<Vec<_>>());
        // toda la pasada hacia adelante precede al unwind
        assert!(t[..n].iter().all(|(k, _)| k == "run"));
    }
}

#[test]
fn halt_cleans_up_exactly_the_started_steps() {
    for k in 0..5usize {
        let trace: Trace = Arc::default();
        let mut runner = pipeline(5, Some(k), &trace);
        let state = StateBag::new();
        let outcome = runner.run(&CancelToken::new(), &state).expect("run");

        assert_eq!(outcome, RunOutcome::Halted);
        assert!(state.is_halted());
        assert!(!state.is_cancelled());
        assert_eq!(state.error(), Some(StepError::Acquire(format!("step {k} failed"))));
        assert_eq!(runner.cleanup_order(), (0..=k).rev().collect::<Vec<_>>());

        let t = trace.lock().unwrap();
        assert!(t.iter().all(|(_, i)| *i <= k), "steps after the halting one must never run");
    }
}

#[test]
fn events_record_the_full_lifecycle() {
    let trace: Trace = Arc::default();
    let mut runner = pipeline(2, Some(1), &trace);
    runner.run(&CancelToken::new(), &StateBag::new()).expect("run");

    let events = runner.events();
    assert!(matches!(events.first().map(|e| &e.kind), Some(RunEventKind::RunStarted { step_count: 2 })));
    assert!(matches!(events.last().map(|e| &e.kind),
                     Some(RunEventKind::RunFinished { outcome: RunOutcome::Halted })));
    assert_eq!(runner.event_variants(), vec!["I", "S", "F", "S", "H", "U", "D", "U", "D", "C"]);
    let seqs: Vec<u64> = events.iter().map(|e| e.seq).collect();
    assert_eq!(seqs, (0..events.len() as u64).collect::<Vec<_>>());
}
