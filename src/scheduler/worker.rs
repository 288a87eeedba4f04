use std::sync::mpsc::{Receiver, Sender};
use std::sync::Mutex;

use tracing::{debug, trace};

use crate::error::Result;
use crate::fitness::Evaluator;
use crate::genome::Genome;
use crate::population::Individual;

/// A genome waiting for evaluation.
#[derive(Debug)]
pub(crate) struct Task {
    pub id: usize,
    pub genome: Genome,
}

/// Task id with the evaluated individual or the evaluation error.
pub(crate) type Completed = (usize, Result<Individual>);

/// Evaluates tasks until the pending channel is closed or the master stops
/// listening.
///
/// The receiver lock is held only while waiting for the next task, never
/// across an evaluation.
pub(crate) fn run_worker(
    index: usize,
    evaluator: &Evaluator,
    pending: &Mutex<Receiver<Task>>,
    completed: Sender<Completed>,
) {
    debug!(worker = index, "worker started");
    let mut evaluated = 0usize;
    loop {
        let next = {
            let receiver = pending.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            receiver.recv()
        };
        let Ok(task) = next else { break };

        trace!(worker = index, task = task.id, "evaluating");
        let outcome = evaluator
            .evaluate(&task.genome)
            .map(|evaluation| Individual::new(task.genome, evaluation));
        evaluated += 1;
        if completed.send((task.id, outcome)).is_err() {
            break;
        }
    }
    debug!(worker = index, evaluated, "worker stopped");
}
