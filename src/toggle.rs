use std::sync::LazyLock;

use anyhow::Result;
use regex::Regex;
use tracing::{debug, info};

use crate::config::Settings;
use crate::format::line::ID_MARKER;
use crate::tracker::Tracker;

static ISSUE_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"{ID_MARKER} ([A-Z][A-Z0-9_]*-[0-9]+)")).expect("invalid issue id regex")
});

/// The ID after the last `🆔` marker. IDs elsewhere in the line are ignored.
pub fn extract_issue_id(line: &str) -> Option<&str> {
    ISSUE_ID
        .captures_iter(line)
        .last()
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Whether the task checkbox, as written in the line text at click time, is `[ ]`.
/// Any list bullet (`-`, `*`, `+`) is accepted.
///
/// Only a literal space counts as unchecked, so a custom status symbol such
/// as `[d]` reads as checked.
pub fn is_unchecked(line: &str) -> bool {
    line.trim_start()
        .strip_prefix(['-', '*', '+'])
        .is_some_and(|rest| rest.starts_with(" [ ]"))
}

/// Workflow state to apply for each checkbox state.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowStates {
    pub open: String,
    pub done: String,
}

impl Default for WorkflowStates {
    fn default() -> Self {
        Self {
            open: "Backlog".into(),
            done: "Done".into(),
        }
    }
}

impl WorkflowStates {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            open: settings.open_state.clone(),
            done: settings.done_state.clone(),
        }
    }

    pub fn target_for(&self, line: &str) -> &str {
        if is_unchecked(line) {
            &self.open
        } else {
            &self.done
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ToggleOutcome {
    /// The line has no ID marker.
    NoIssueId,
    /// The search did not resolve to exactly one issue; nothing was changed.
    Unresolved { issue_id: String, matches: usize },
    Changed { issue_id: String, state: String },
}

/// React to a checkbox click on `line`: look the issue up and move it to the matching state.
pub async fn handle_toggle(
    tracker: &dyn Tracker,
    line: &str,
    project: &str,
    states: &WorkflowStates,
) -> Result<ToggleOutcome> {
    debug!(line, "checkbox toggled");
    let Some(issue_id) = extract_issue_id(line) else {
        return Ok(ToggleOutcome::NoIssueId);
    };

    let matches = tracker.search(&format!("project: {project} {issue_id}")).await?;
    let db_id = match matches.as_slice() {
        [only] => only.id.clone(),
        _ => None,
    };
    let Some(db_id) = db_id else {
        debug!(issue_id, matches = matches.len(), "no unique match, leaving issue untouched");
        return Ok(ToggleOutcome::Unresolved {
            issue_id: issue_id.to_string(),
            matches: matches.len(),
        });
    };

    let state = states.target_for(line);
    tracker
        .execute_command(&format!("State: {state}"), &[db_id])
        .await?;
    info!(issue_id, state, "issue state changed");

    Ok(ToggleOutcome::Changed {
        issue_id: issue_id.to_string(),
        state: state.to_string(),
    })
}
