pub mod youtrack;

use anyhow::Result;
use async_trait::async_trait;

use crate::config::Settings;
use crate::error::ConfigError;
use crate::model::issue::{Issue, IssueDetail};
use crate::model::user::User;

/// Remote issue tracker operations used by the formatter and toggle handling.
#[async_trait]
pub trait Tracker: Send + Sync {
    fn name(&self) -> &str;
    async fn search(&self, query: &str) -> Result<Vec<Issue>>;
    async fn issue_detail(&self, id: &str) -> Result<IssueDetail>;
    /// Apply a free-text command (e.g. `State: Done`) to the given issues.
    async fn execute_command(&self, command: &str, issue_ids: &[String]) -> Result<()>;
    async fn current_user(&self) -> Result<User>;
}


pub fn create_tracker(settings: &Settings) -> Result<Box<dyn Tracker>, ConfigError> {
    settings.require_connection()?;
    Ok(Box::new(youtrack::YouTrackTracker::new(
        settings.server_url.clone(),
        settings.token.clone(),
    )))
}
