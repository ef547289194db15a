use std::fmt;

use crate::error::ConfigError;

/// Short user-facing message, shown once and not persisted.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    FetchedIssues(usize),
    FilteredIssues(usize),
    ZeroIssues { query: String },
    RetrieveFailed(String),
    Config(ConfigError),
    StateChanged { issue_id: String, state: String },
    ToggleFailed { issue_id: String, error: String },
    LoggedAs(String),
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FetchedIssues(count) => write!(f, "Fetched {count} issue(s) from YouTrack"),
            Self::FilteredIssues(count) => {
                write!(f, "Skipped {count} issue(s) already tracked as tasks")
            }
            Self::ZeroIssues { query } => write!(f, "Query returned zero issues: {query}"),
            Self::RetrieveFailed(error) => write!(f, "Failed to retrieve issues: {error}"),
            Self::Config(err) => {
                write!(f, "{err}\nConfigure it with `youtasks config set <key> <value>`")
            }
            Self::StateChanged { issue_id, state } => {
                write!(f, "State of YouTrack issue {issue_id} has been changed to {state}")
            }
            Self::ToggleFailed { issue_id, error } => {
                write!(f, "Failed to update YouTrack issue {issue_id}: {error}")
            }
            Self::LoggedAs(login) => write!(f, "Logged in to YouTrack as {login}"),
        }
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Prints notices to stderr so they stay out of piped output.
pub struct StderrNotifier;

impl Notifier for StderrNotifier {
    fn notify(&self, notice: Notice) {
        eprintln!("youtasks: {notice}");
    }
}

#[cfg(test)]
pub mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    /// Collects notices for assertions.
    #[derive(Clone, Default)]
    pub struct RecordingNotifier {
        pub notices: Arc<Mutex<Vec<Notice>>>,
    }

    impl RecordingNotifier {
        pub fn taken(&self) -> Vec<Notice> {
            self.notices.lock().unwrap().clone()
        }
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, notice: Notice) {
            self.notices.lock().unwrap().push(notice);
        }
    }

    #[test]
    fn config_notice_points_to_settings() {
        let text = Notice::Config(ConfigError::MissingToken).to_string();
        assert!(text.starts_with("YouTrack token is not set"));
        assert!(text.contains("config set"));
    }

    #[test]
    fn state_change_names_issue_and_state() {
        let notice = Notice::StateChanged {
            issue_id: "ABC-1".into(),
            state: "Done".into(),
        };
        assert_eq!(
            notice.to_string(),
            "State of YouTrack issue ABC-1 has been changed to Done"
        );
    }
}
