//! Concurrent execution of one batch of actions.

use std::num::NonZeroUsize;
use std::ops::Range;
use std::slice::IterMut;
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, error};

use crate::action::Action;
use crate::context::FlowContext;
use crate::error::Result;
use crate::state::{State, StateMachine};

/// Default bound on concurrently running actions within a group.
pub fn default_max_workers() -> usize {
    thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(4)
}

/// A transient view over a contiguous run of a job's actions.
///
/// Every action is dispatched to a scoped worker pool and every worker is
/// joined before the group reports: a failing action never abandons its
/// siblings.
#[derive(Debug)]
pub struct Group<'a> {
    index: usize,
    actions: &'a mut [Action],
    machine: StateMachine,
    max_workers: usize,
}

/// Outcome of a finished group, kept by the job for reporting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupReport {
    /// 1-based position within the job.
    pub index: usize,
    /// Step indices covered by the group.
    pub actions: Range<usize>,
    /// Terminal (or last known) state.
    pub state: State,
    /// Wall time of the whole batch.
    pub elapsed: Duration,
}

impl<'a> Group<'a> {
    /// Create a group over `actions`; `index` is 1-based.
    pub fn new(index: usize, actions: &'a mut [Action]) -> Self {
        Self {
            index,
            actions,
            machine: StateMachine::new(format!("Group: {}", index)),
            max_workers: default_max_workers(),
        }
    }

    /// Bound the number of worker threads (at least one).
    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers.max(1);
        self
    }

    /// 1-based position within the job.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Actions in the group.
    pub fn actions(&self) -> &[Action] {
        self.actions
    }

    /// Current state.
    pub fn state(&self) -> State {
        self.machine.state()
    }

    /// Run every action concurrently and aggregate their outcome.
    ///
    /// `success` iff every action ended in `success`.
    pub fn execute(&mut self, ctx: &FlowContext) -> Result<State> {
        self.machine.start()?;

        let workers = self.max_workers.min(self.actions.len()).max(1);
        debug!(
            "[Group {}] Dispatching {} action(s) on {} worker(s)",
            self.index,
            self.actions.len(),
            workers
        );

        let queue = Mutex::new(self.actions.iter_mut());
        let workers_ok = thread::scope(|scope| {
            let handles: Vec<_> = (0..workers)
                .map(|_| scope.spawn(|| drain(&queue, ctx)))
                .collect();

            // Join every handle before deciding anything.
            handles
                .into_iter()
                .map(|handle| match handle.join() {
                    Ok(clean) => clean,
                    Err(_) => {
                        error!("[Group {}] Worker panicked", self.index);
                        false
                    }
                })
                .fold(true, |acc, clean| acc && clean)
        });

        let success = workers_ok && self.actions.iter().all(|a| a.state() == State::Success);
        self.machine.finish(success)?;
        Ok(self.machine.state())
    }

    /// Snapshot for reporting; `actions` is the step range the group covered.
    pub fn report(&self, actions: Range<usize>) -> GroupReport {
        GroupReport {
            index: self.index,
            actions,
            state: self.machine.state(),
            elapsed: self.machine.elapsed(),
        }
    }
}

/// Worker loop: execute queued actions until the queue is empty.
///
/// Returns false if any action could not even be started.
fn drain(queue: &Mutex<IterMut<'_, Action>>, ctx: &FlowContext) -> bool {
    let mut clean = true;
    loop {
        let next = queue
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .next();
        let Some(action) = next else {
            return clean;
        };
        if let Err(e) = action.execute(ctx) {
            error!("Action {} could not run: {}", action.id(), e);
            clean = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{ActionPolicy, Task};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Barrier};
    use std::time::Instant;

    struct Sleepy {
        millis: u64,
        succeed: bool,
        finished: Arc<AtomicUsize>,
    }

    impl Task for Sleepy {
        fn run(&mut self, _ctx: &FlowContext) -> anyhow::Result<bool> {
            thread::sleep(Duration::from_millis(self.millis));
            self.finished.fetch_add(1, Ordering::SeqCst);
            Ok(self.succeed)
        }
    }

    struct Rendezvous(Arc<Barrier>);

    impl Task for Rendezvous {
        fn run(&mut self, _ctx: &FlowContext) -> anyhow::Result<bool> {
            self.0.wait();
            Ok(true)
        }
    }

    fn sleepy(millis: u64, succeed: bool, finished: &Arc<AtomicUsize>) -> Action {
        Action::from_task(
            "sleepy",
            Sleepy {
                millis,
                succeed,
                finished: Arc::clone(finished),
            },
        )
    }

    fn ctx() -> FlowContext {
        FlowContext::new(std::env::temp_dir())
    }

    #[test]
    fn all_success_is_success() {
        let finished = Arc::new(AtomicUsize::new(0));
        let mut actions = vec![sleepy(1, true, &finished), sleepy(1, true, &finished)];
        let mut group = Group::new(1, &mut actions);

        assert_eq!(group.execute(&ctx()).unwrap(), State::Success);
        assert_eq!(finished.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn partial_failure_waits_for_every_action() {
        let finished = Arc::new(AtomicUsize::new(0));
        let mut actions = vec![
            sleepy(0, false, &finished),
            sleepy(50, true, &finished),
            sleepy(80, true, &finished),
        ];
        let mut group = Group::new(1, &mut actions);

        assert_eq!(group.execute(&ctx()).unwrap(), State::Failure);
        assert_eq!(finished.load(Ordering::SeqCst), 3);
        drop(group);
        assert_eq!(actions[0].state(), State::Failure);
        assert_eq!(actions[1].state(), State::Success);
        assert_eq!(actions[2].state(), State::Success);
    }

    #[test]
    fn actions_run_concurrently() {
        // Every action blocks until all three are running at once.
        let barrier = Arc::new(Barrier::new(3));
        let mut actions: Vec<Action> = (0..3)
            .map(|_| Action::from_task("meet", Rendezvous(Arc::clone(&barrier))))
            .collect();
        let mut group = Group::new(1, &mut actions).with_max_workers(3);

        assert_eq!(group.execute(&ctx()).unwrap(), State::Success);
    }

    #[test]
    fn single_worker_runs_everything() {
        let finished = Arc::new(AtomicUsize::new(0));
        let mut actions: Vec<Action> = (0..5).map(|_| sleepy(1, true, &finished)).collect();
        let mut group = Group::new(1, &mut actions).with_max_workers(1);

        assert_eq!(group.execute(&ctx()).unwrap(), State::Success);
        assert_eq!(finished.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn bounded_pool_is_faster_than_serial() {
        let finished = Arc::new(AtomicUsize::new(0));
        let mut actions: Vec<Action> = (0..4).map(|_| sleepy(100, true, &finished)).collect();
        let mut group = Group::new(1, &mut actions).with_max_workers(4);

        let start = Instant::now();
        group.execute(&ctx()).unwrap();
        assert!(start.elapsed() < Duration::from_millis(400));
    }

    #[test]
    fn already_executed_action_fails_the_group() {
        let finished = Arc::new(AtomicUsize::new(0));
        let mut actions = vec![sleepy(0, true, &finished)];
        actions[0].execute(&ctx()).unwrap();

        let mut group = Group::new(1, &mut actions);
        assert_eq!(group.execute(&ctx()).unwrap(), State::Failure);
    }

    #[test]
    fn zero_retry_action_fails_group() {
        let finished = Arc::new(AtomicUsize::new(0));
        let mut actions = vec![
            sleepy(0, true, &finished),
            sleepy(0, true, &finished).with_policy(ActionPolicy {
                retry: 0,
                ..ActionPolicy::default()
            }),
        ];
        let mut group = Group::new(2, &mut actions);
        assert_eq!(group.execute(&ctx()).unwrap(), State::Failure);
        assert_eq!(finished.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn report_captures_state() {
        let finished = Arc::new(AtomicUsize::new(0));
        let mut actions = vec![sleepy(0, true, &finished)];
        let mut group = Group::new(3, &mut actions);
        group.execute(&ctx()).unwrap();

        let report = group.report(4..5);
        assert_eq!(report.index, 3);
        assert_eq!(report.actions, 4..5);
        assert_eq!(report.state, State::Success);
    }

    #[test]
    fn executing_twice_is_rejected() {
        let finished = Arc::new(AtomicUsize::new(0));
        let mut actions = vec![sleepy(0, true, &finished)];
        let mut group = Group::new(1, &mut actions);
        group.execute(&ctx()).unwrap();
        assert!(group.execute(&ctx()).is_err());
    }
}
