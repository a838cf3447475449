//! Jobs: ordered steps run group by group.

use std::ops::Range;

use tracing::{error, info};

use crate::action::Action;
use crate::context::FlowContext;
use crate::error::Result;
use crate::flow::batch;
use crate::flow::group::{default_max_workers, Group, GroupReport};
use crate::state::{State, StateMachine};

/// A named, ordered list of actions.
///
/// Groups are computed once at construction from each action's
/// `sequential` flag and executed strictly in order. The first group that
/// does not succeed fails the job; later groups never start.
#[derive(Debug)]
pub struct Job {
    name: String,
    steps: Vec<Action>,
    batches: Vec<Range<usize>>,
    reports: Vec<GroupReport>,
    machine: StateMachine,
}

impl Job {
    /// Create a job; groups are derived from the steps' policies.
    pub fn new(name: impl Into<String>, steps: Vec<Action>) -> Self {
        let name = name.into();
        let batches = batch::partition_by(&steps, Action::is_sequential);
        Self {
            machine: StateMachine::new(format!("Job: {}", name)),
            name,
            steps,
            batches,
            reports: Vec::new(),
        }
    }

    /// Give every action its stable id `{job}_{name}_{group}_{action}_{kind}`.
    ///
    /// `job_index` is the 1-based position in the flow; group and action
    /// indices are 1-based within the job and group.
    pub fn assign_ids(&mut self, job_index: usize) {
        for (group_index, range) in self.batches.iter().enumerate() {
            for (action_index, action) in self.steps[range.clone()].iter_mut().enumerate() {
                let id = format!(
                    "{}_{}_{}_{}_{}",
                    job_index,
                    self.name,
                    group_index + 1,
                    action_index + 1,
                    action.name()
                );
                action.set_id(id);
            }
        }
    }

    /// Job name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All actions in declaration order.
    pub fn steps(&self) -> &[Action] {
        &self.steps
    }

    /// Step ranges of every group, in execution order.
    pub fn batches(&self) -> &[Range<usize>] {
        &self.batches
    }

    /// Actions of each group, in execution order.
    pub fn groups(&self) -> impl Iterator<Item = &[Action]> + '_ {
        self.batches.iter().map(|range| &self.steps[range.clone()])
    }

    /// Reports of the groups that have run.
    pub fn reports(&self) -> &[GroupReport] {
        &self.reports
    }

    /// State of the `index`-th group (0-based); `pending` if it never ran.
    pub fn group_state(&self, index: usize) -> State {
        self.reports
            .get(index)
            .map(|report| report.state)
            .unwrap_or(State::Pending)
    }

    /// Current state.
    pub fn state(&self) -> State {
        self.machine.state()
    }

    /// Lifecycle and timing.
    pub fn machine(&self) -> &StateMachine {
        &self.machine
    }

    /// First action that ended in failure.
    pub fn failed_action(&self) -> Option<&Action> {
        self.steps.iter().find(|a| a.state() == State::Failure)
    }

    /// Execute with the default worker bound.
    pub fn execute(&mut self, ctx: &FlowContext) -> Result<State> {
        self.execute_with(ctx, default_max_workers())
    }

    /// Execute groups in order, stopping at the first failed group.
    pub fn execute_with(&mut self, ctx: &FlowContext, max_workers: usize) -> Result<State> {
        self.machine.start()?;
        info!("[Job: {}] Starting execution...", self.name);

        let total = self.batches.len();
        for (i, range) in self.batches.iter().enumerate() {
            let index = i + 1;
            info!(
                "[Job: {}] [Group {}/{}] Executing {} action(s)...",
                self.name,
                index,
                total,
                range.len()
            );

            let mut group =
                Group::new(index, &mut self.steps[range.clone()]).with_max_workers(max_workers);
            let outcome = group.execute(ctx);
            self.reports.push(group.report(range.clone()));

            match outcome {
                Ok(State::Success) => {
                    info!("[Job: {}] [Group {}/{}] Completed.", self.name, index, total)
                }
                Ok(state) => {
                    error!(
                        "[Job: {}] [Group {}/{}] Ended in {}, stopping job.",
                        self.name, index, total, state
                    );
                    self.machine.fail()?;
                    return Ok(self.machine.state());
                }
                Err(e) => {
                    error!("[Job: {}] [Group {}/{}] Error: {}", self.name, index, total, e);
                    self.machine.fail()?;
                    return Ok(self.machine.state());
                }
            }
        }

        info!("[Job: {}] Completed successfully.", self.name);
        self.machine.complete()?;
        Ok(self.machine.state())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{ActionPolicy, Task};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Counted {
        succeed: bool,
        runs: Arc<AtomicUsize>,
    }

    impl Task for Counted {
        fn run(&mut self, _ctx: &FlowContext) -> anyhow::Result<bool> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            Ok(self.succeed)
        }
    }

    fn step(name: &str, sequential: bool, succeed: bool, runs: &Arc<AtomicUsize>) -> Action {
        Action::from_task(
            name,
            Counted {
                succeed,
                runs: Arc::clone(runs),
            },
        )
        .with_policy(ActionPolicy {
            sequential,
            ..ActionPolicy::default()
        })
    }

    fn ctx() -> FlowContext {
        FlowContext::new(std::env::temp_dir())
    }

    #[test]
    fn groups_follow_sequential_flags() {
        let runs = Arc::new(AtomicUsize::new(0));
        let job = Job::new(
            "build",
            vec![
                step("a", false, true, &runs),
                step("b", false, true, &runs),
                step("c", true, true, &runs),
                step("d", false, true, &runs),
            ],
        );
        assert_eq!(job.batches(), &[0..3, 3..4]);
        let sizes: Vec<usize> = job.groups().map(|g| g.len()).collect();
        assert_eq!(sizes, vec![3, 1]);
    }

    #[test]
    fn ids_encode_position() {
        let runs = Arc::new(AtomicUsize::new(0));
        let mut job = Job::new(
            "deploy",
            vec![
                step("sleep", false, true, &runs),
                step("command", true, true, &runs),
                step("fail", true, true, &runs),
            ],
        );
        job.assign_ids(2);
        let ids: Vec<&str> = job.steps().iter().map(Action::id).collect();
        assert_eq!(
            ids,
            vec!["2_deploy_1_1_sleep", "2_deploy_1_2_command", "2_deploy_2_1_fail"]
        );
    }

    #[test]
    fn all_groups_succeed() {
        let runs = Arc::new(AtomicUsize::new(0));
        let mut job = Job::new(
            "ok",
            vec![step("a", true, true, &runs), step("b", true, true, &runs)],
        );
        assert_eq!(job.execute(&ctx()).unwrap(), State::Success);
        assert_eq!(runs.load(Ordering::SeqCst), 2);
        assert_eq!(job.reports().len(), 2);
        assert!(job.failed_action().is_none());
    }

    #[test]
    fn failed_group_stops_the_job() {
        let runs = Arc::new(AtomicUsize::new(0));
        let mut job = Job::new(
            "broken",
            vec![
                step("first", true, false, &runs),
                step("never", true, true, &runs),
            ],
        );
        assert_eq!(job.execute(&ctx()).unwrap(), State::Failure);
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(job.steps()[1].state(), State::Pending);
        assert_eq!(job.group_state(0), State::Failure);
        assert_eq!(job.group_state(1), State::Pending);
        assert_eq!(job.failed_action().map(Action::name), Some("first"));
    }

    #[test]
    fn failure_after_success_leaves_later_groups_pending() {
        let runs = Arc::new(AtomicUsize::new(0));
        let third_runs = Arc::new(AtomicUsize::new(0));
        let mut job = Job::new(
            "staged",
            vec![
                step("first", true, true, &runs),
                step("second", true, false, &runs),
                step("third", true, true, &third_runs),
            ],
        );

        assert_eq!(job.execute(&ctx()).unwrap(), State::Failure);
        assert_eq!(job.group_state(0), State::Success);
        assert_eq!(job.group_state(1), State::Failure);
        assert_eq!(job.group_state(2), State::Pending);
        assert_eq!(job.steps()[2].state(), State::Pending);
        assert_eq!(runs.load(Ordering::SeqCst), 2);
        assert_eq!(third_runs.load(Ordering::SeqCst), 0);
        assert_eq!(job.failed_action().map(Action::name), Some("second"));
    }

    #[test]
    fn failure_in_batch_still_runs_siblings() {
        let runs = Arc::new(AtomicUsize::new(0));
        let mut job = Job::new(
            "mixed",
            vec![
                step("bad", false, false, &runs),
                step("good", false, true, &runs),
                step("join", true, true, &runs),
                step("after", true, true, &runs),
            ],
        );
        assert_eq!(job.execute_with(&ctx(), 2).unwrap(), State::Failure);
        assert_eq!(runs.load(Ordering::SeqCst), 3);
        assert_eq!(job.steps()[3].state(), State::Pending);
    }

    #[test]
    fn empty_job_succeeds() {
        let mut job = Job::new("empty", Vec::new());
        assert_eq!(job.execute(&ctx()).unwrap(), State::Success);
    }
}
