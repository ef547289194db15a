use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info};

use super::Tracker;
use crate::model::issue::{Issue, IssueDetail};
use crate::model::user::User;

const SEARCH_FIELDS: &str = "id,numberInProject,summary";
const DETAIL_FIELDS: &str =
    "id,created,tags(name),fields($type,name,value($type,name,presentation,minutes))";
const SEARCH_LIMIT: &str = "200";

pub struct YouTrackTracker {
    base_url: String,
    auth_header: String,
    client: reqwest::Client,
}

impl YouTrackTracker {
    pub fn new(server_url: String, token: String) -> Self {
        Self {
            base_url: server_url.trim_end_matches('/').to_string(),
            auth_header: format!("Bearer {token}"),
            client: reqwest::Client::new(),
        }
    }

    fn api(&self, path: &str) -> String {
        format!("{}/api/{path}", self.base_url)
    }
}

#[derive(Serialize)]
struct CommandRequest<'a> {
    query: &'a str,
    issues: Vec<IssueRef<'a>>,
}

#[derive(Serialize)]
struct IssueRef<'a> {
    id: &'a str,
}

#[async_trait]
impl Tracker for YouTrackTracker {
    fn name(&self) -> &str {
        "YouTrack"
    }

    async fn search(&self, query: &str) -> Result<Vec<Issue>> {
        debug!(query, "searching issues");
        let issues: Vec<Issue> = self
            .client
            .get(self.api("issues"))
            .header("Authorization", &self.auth_header)
            .header("Accept", "application/json")
            .query(&[
                ("query", query),
                ("fields", SEARCH_FIELDS),
                ("$top", SEARCH_LIMIT),
            ])
            .send()
            .await
            .context("YouTrack issue search failed")?
            .error_for_status()
            .context("YouTrack rejected the issue search")?
            .json()
            .await
            .context("Failed to parse YouTrack search response")?;

        debug!(count = issues.len(), "search returned");
        Ok(issues)
    }

    async fn issue_detail(&self, id: &str) -> Result<IssueDetail> {
        let url = self.api(&format!("issues/{}", urlencoding::encode(id)));
        let detail = self
            .client
            .get(url)
            .header("Authorization", &self.auth_header)
            .header("Accept", "application/json")
            .query(&[("fields", DETAIL_FIELDS)])
            .send()
            .await
            .with_context(|| format!("YouTrack request for issue {id} failed"))?
            .error_for_status()
            .with_context(|| format!("YouTrack rejected the request for issue {id}"))?
            .json()
            .await
            .with_context(|| format!("Failed to parse YouTrack issue {id}"))?;
        Ok(detail)
    }

    async fn execute_command(&self, command: &str, issue_ids: &[String]) -> Result<()> {
        let body = CommandRequest {
            query: command,
            issues: issue_ids.iter().map(|id| IssueRef { id }).collect(),
        };

        self.client
            .post(self.api("commands"))
            .header("Authorization", &self.auth_header)
            .header("Accept", "application/json")
            .json(&body)
            .send()
            .await
            .context("YouTrack command request failed")?
            .error_for_status()
            .with_context(|| format!("YouTrack rejected command `{command}`"))?;

        info!(command, ?issue_ids, "command applied");
        Ok(())
    }

    async fn current_user(&self) -> Result<User> {
        let user = self
            .client
            .get(self.api("users/me"))
            .header("Authorization", &self.auth_header)
            .header("Accept", "application/json")
            .query(&[("fields", "login,fullName")])
            .send()
            .await
            .context("YouTrack user request failed")?
            .error_for_status()
            .context("YouTrack rejected the credentials")?
            .json()
            .await
            .context("Failed to parse YouTrack user")?;
        Ok(user)
    }
}
