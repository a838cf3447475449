//! Integration tests for flow loading.

use std::collections::HashMap;
use std::fs;

use actionflow::config::{load_flow, FlowLoader, Settings};
use actionflow::registry::ActionRegistry;
use actionflow::state::State;
use actionflow::FlowError;
use tempfile::TempDir;

fn settings(temp: &TempDir) -> Settings {
    Settings::default().with_home(temp.path().join("home"))
}

#[test]
fn file_stem_names_unnamed_flows() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("nightly.yml");
    fs::write(&path, "jobs:\n  prep:\n    steps:\n      - name: sleep\n        with: { seconds: 0 }\n").unwrap();
    let registry = ActionRegistry::with_builtins().unwrap();

    let flow = load_flow(&path, &registry, &settings(&temp)).unwrap();

    assert_eq!(flow.name(), "nightly");
    assert_eq!(flow.jobs()[0].steps()[0].id(), "1_prep_1_1_sleep");
    assert_eq!(flow.context().workspace(), temp.path().join("home").join("workspace"));
    assert!(!flow.context().workspace().exists());
}

#[test]
fn missing_file_is_flow_not_found() {
    let temp = TempDir::new().unwrap();
    let registry = ActionRegistry::with_builtins().unwrap();

    let result = load_flow(&temp.path().join("absent.yml"), &registry, &settings(&temp));

    assert!(matches!(result, Err(FlowError::FlowNotFound { .. })));
}

#[test]
fn unknown_action_is_rejected_before_running() {
    let temp = TempDir::new().unwrap();
    let registry = ActionRegistry::with_builtins().unwrap();
    let loader = FlowLoader::new(&registry, settings(&temp));

    let result = loader.load_str("jobs:\n  j:\n    steps:\n      - name: teleport\n");

    assert!(matches!(result, Err(FlowError::ActionNotFound { name }) if name == "teleport"));
}

#[test]
fn policy_keys_reach_the_action() {
    let temp = TempDir::new().unwrap();
    let registry = ActionRegistry::with_builtins().unwrap();
    let loader = FlowLoader::new(&registry, settings(&temp));

    let flow = loader
        .load_str(
            "jobs:\n  j:\n    steps:\n      - name: fail\n        with: { retry: 5, continue_on_error: true, wait: true }\n",
        )
        .unwrap();

    let policy = flow.jobs()[0].steps()[0].policy();
    assert_eq!(policy.retry, 5);
    assert!(policy.continue_on_error);
    assert!(policy.sequential);
}

#[cfg(unix)]
#[test]
fn interpolation_precedence_end_to_end() {
    let temp = TempDir::new().unwrap();
    let workspace = temp.path().join("ws");
    let registry = ActionRegistry::with_builtins().unwrap();
    let process: HashMap<String, String> = [
        ("AF_TARGET", "override"),
        ("TARGET", "process"),
        ("USER_NAME", "ops"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    let loader = FlowLoader::new(&registry, settings(&temp)).with_process_env(process);

    let yaml = format!(
        r#"
name: interpolated
env:
  TARGET: document
  GREETING: "hello ${{USER_NAME}}"
context:
  workspace: {}
jobs:
  write:
    steps:
      - name: command
        with:
          command: "echo ${{TARGET}} ${{GREETING}} ${{MISSING}} > out.txt"
"#,
        workspace.display()
    );
    let mut flow = loader.load_str(&yaml).unwrap();

    assert_eq!(flow.execute().unwrap(), State::Success);
    let written = fs::read_to_string(workspace.join("out.txt")).unwrap();
    assert_eq!(written.trim(), "override hello ops");
}
