//! Terminal rendering of a finished run.

use crate::flow::FlowReport;
use crate::state::State;
use crate::ui::theme::FlowTheme;

/// Render `report` as indented, styled lines.
///
/// ```text
/// Job 1: prepare
///   Group 1: ✓ success
///     Action 1: download -> 0.01234s (✓ success)
/// Total execution time: 0.01500s
/// ```
pub fn render_report(report: &FlowReport, theme: &FlowTheme) -> Vec<String> {
    let mut lines = Vec::new();

    for job in &report.jobs {
        lines.push(format!(
            "{} {}",
            theme.key.apply_to(format!("Job {}:", job.index)),
            theme.highlight.apply_to(&job.name)
        ));
        for group in &job.groups {
            lines.push(format!(
                "  Group {}: {}",
                group.index,
                theme.format_state(group.state)
            ));
            for action in &group.actions {
                lines.push(format!(
                    "    Action {}: {} -> {} ({})",
                    action.index,
                    action.name,
                    theme
                        .duration
                        .apply_to(format!("{:.5}s", action.elapsed_secs)),
                    theme.format_state(action.state)
                ));
            }
        }
    }

    lines.push(format!(
        "Total execution time: {}",
        theme
            .duration
            .apply_to(format!("{:.5}s", report.elapsed_secs))
    ));
    lines
}

/// One-line outcome, naming the first failed action if any.
pub fn render_outcome(report: &FlowReport, theme: &FlowTheme) -> String {
    match (report.state, report.first_failure()) {
        (State::Success, _) => theme.format_success(&format!("Flow '{}' completed", report.name)),
        (_, Some((job, action))) => theme.format_error(&format!(
            "Flow '{}' failed at job '{}', action '{}': {}",
            report.name,
            job.name,
            action.id,
            action.error.as_deref().unwrap_or("failed")
        )),
        (state, None) => theme.format_error(&format!("Flow '{}' ended in {}", report.name, state)),
    }
}
