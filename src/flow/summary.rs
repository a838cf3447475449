//! Run summaries: human-readable lines and a serializable report.

use std::iter;

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::action::Action;
use crate::flow::job::Job;
use crate::flow::runner::Flow;
use crate::state::State;

/// Summary lines of `flow`, produced lazily.
///
/// ```text
/// Job 1: build
/// Group 1: success
/// Action 1: download -> 0.01234s (success)
/// Total execution time: 0.01500s
/// ```
///
/// Groups that never ran are listed as `pending`.
pub fn lines(flow: &Flow) -> impl Iterator<Item = String> + '_ {
    flow.jobs()
        .iter()
        .enumerate()
        .flat_map(|(i, job)| iter::once(format!("Job {}: {}", i + 1, job.name())).chain(job_lines(job)))
        .chain(iter::once_with(move || {
            format!("Total execution time: {:.5}s", flow.elapsed().as_secs_f64())
        }))
}

fn job_lines(job: &Job) -> impl Iterator<Item = String> + '_ {
    job.groups().enumerate().flat_map(move |(g, actions)| {
        iter::once(format!("Group {}: {}", g + 1, job.group_state(g))).chain(
            actions
                .iter()
                .enumerate()
                .map(|(a, action)| action_line(a + 1, action)),
        )
    })
}

fn action_line(index: usize, action: &Action) -> String {
    format!(
        "Action {}: {} -> {:.5}s ({})",
        index,
        action.name(),
        action.elapsed().as_secs_f64(),
        action.state()
    )
}

/// Structured report of a flow run.
#[derive(Debug, Clone, Serialize)]
pub struct FlowReport {
    pub name: String,
    pub state: State,
    pub elapsed_secs: f64,
    pub started_at: Option<DateTime<Local>>,
    pub ended_at: Option<DateTime<Local>>,
    pub jobs: Vec<JobReport>,
}

/// One job of a [`FlowReport`].
#[derive(Debug, Clone, Serialize)]
pub struct JobReport {
    pub index: usize,
    pub name: String,
    pub state: State,
    pub elapsed_secs: f64,
    pub groups: Vec<GroupSummary>,
}

/// One group of a [`JobReport`].
#[derive(Debug, Clone, Serialize)]
pub struct GroupSummary {
    pub index: usize,
    pub state: State,
    pub actions: Vec<ActionReport>,
}

/// One action of a [`GroupSummary`].
#[derive(Debug, Clone, Serialize)]
pub struct ActionReport {
    pub index: usize,
    pub id: String,
    pub name: String,
    pub state: State,
    pub attempts: u32,
    pub elapsed_secs: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FlowReport {
    /// Snapshot `flow` in its current state.
    pub fn from_flow(flow: &Flow) -> Self {
        Self {
            name: flow.name().to_string(),
            state: flow.state(),
            elapsed_secs: flow.elapsed().as_secs_f64(),
            started_at: flow.machine().started_at(),
            ended_at: flow.machine().ended_at(),
            jobs: flow
                .jobs()
                .iter()
                .enumerate()
                .map(|(i, job)| JobReport::from_job(i + 1, job))
                .collect(),
        }
    }

    /// Whether the flow ended in success.
    pub fn succeeded(&self) -> bool {
        self.state == State::Success
    }

    /// First failed action, with the job it belongs to.
    pub fn first_failure(&self) -> Option<(&JobReport, &ActionReport)> {
        self.jobs.iter().find_map(|job| {
            job.groups
                .iter()
                .flat_map(|g| g.actions.iter())
                .find(|a| a.state == State::Failure)
                .map(|action| (job, action))
        })
    }
}

impl JobReport {
    fn from_job(index: usize, job: &Job) -> Self {
        Self {
            index,
            name: job.name().to_string(),
            state: job.state(),
            elapsed_secs: job.machine().elapsed().as_secs_f64(),
            groups: job
                .groups()
                .enumerate()
                .map(|(g, actions)| GroupSummary {
                    index: g + 1,
                    state: job.group_state(g),
                    actions: actions
                        .iter()
                        .enumerate()
                        .map(|(a, action)| ActionReport {
                            index: a + 1,
                            id: action.id().to_string(),
                            name: action.name().to_string(),
                            state: action.state(),
                            attempts: action.attempts(),
                            elapsed_secs: action.elapsed().as_secs_f64(),
                            error: action.error().map(str::to_string),
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{ActionPolicy, Task};
    use crate::context::FlowContext;

    struct Fixed(bool);

    impl Task for Fixed {
        fn run(&mut self, _ctx: &FlowContext) -> anyhow::Result<bool> {
            Ok(self.0)
        }
    }

    fn concurrent(name: &str, ok: bool) -> Action {
        Action::from_task(name, Fixed(ok)).with_policy(ActionPolicy {
            sequential: false,
            ..ActionPolicy::default()
        })
    }

    fn sample() -> Flow {
        Flow::new(
            "sample",
            vec![
                Job::new(
                    "build",
                    vec![
                        concurrent("fetch", true),
                        Action::from_task("compile", Fixed(true)),
                    ],
                ),
                Job::new(
                    "ship",
                    vec![
                        Action::from_task("upload", Fixed(false)),
                        Action::from_task("notify", Fixed(true)),
                    ],
                ),
            ],
            FlowContext::new(std::env::temp_dir()),
        )
    }

    #[test]
    fn summary_before_run_is_pending() {
        let flow = sample();
        let lines: Vec<String> = flow.summary().collect();
        assert_eq!(lines[0], "Job 1: build");
        assert_eq!(lines[1], "Group 1: pending");
        assert!(lines[2].starts_with("Action 1: fetch -> "));
        assert!(lines[2].ends_with("(pending)"));
        assert!(lines.last().unwrap().starts_with("Total execution time: "));
    }

    #[test]
    fn summary_after_run_lists_every_group() {
        let mut flow = sample();
        flow.execute().unwrap();
        let lines: Vec<String> = flow.summary().collect();

        let expected_prefixes = [
            "Job 1: build",
            "Group 1: success",
            "Action 1: fetch -> ",
            "Action 2: compile -> ",
            "Job 2: ship",
            "Group 1: failure",
            "Action 1: upload -> ",
            "Group 2: pending",
            "Action 1: notify -> ",
            "Total execution time: ",
        ];
        assert_eq!(lines.len(), expected_prefixes.len());
        for (line, prefix) in lines.iter().zip(expected_prefixes) {
            assert!(line.starts_with(prefix), "{:?} !~ {:?}", line, prefix);
        }
        assert!(lines[6].ends_with("(failure)"));
    }

    #[test]
    fn elapsed_has_five_decimals() {
        let mut flow = sample();
        flow.execute().unwrap();
        let line = flow.summary().nth(2).unwrap();
        let secs = line
            .split(" -> ")
            .nth(1)
            .and_then(|s| s.split('s').next())
            .unwrap();
        assert_eq!(secs.split('.').nth(1).unwrap().len(), 5);
    }

    #[test]
    fn report_serializes_states_lowercase() {
        let mut flow = sample();
        flow.execute().unwrap();
        let json = serde_json::to_value(flow.report()).unwrap();
        assert_eq!(json["state"], "failure");
        assert_eq!(json["jobs"][0]["state"], "success");
        assert_eq!(json["jobs"][1]["groups"][0]["actions"][0]["id"], "2_ship_1_1_upload");
        assert_eq!(json["jobs"][1]["groups"][1]["actions"][0]["state"], "pending");
    }

    #[test]
    fn first_failure_points_at_action() {
        let mut flow = sample();
        flow.execute().unwrap();
        let report = flow.report();
        assert!(!report.succeeded());
        let (job, action) = report.first_failure().unwrap();
        assert_eq!(job.name, "ship");
        assert_eq!(action.name, "upload");
        assert_eq!(action.error.as_deref(), Some("failed after 1 attempt(s)"));
    }
}
