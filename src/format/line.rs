use std::fmt;

use chrono::DateTime;

/// Trailing marker that precedes the issue ID on every task line.
pub const ID_MARKER: &str = "🆔";
pub const ESTIMATION_MARKER: &str = "⏰";
pub const CREATED_MARKER: &str = "➕";
pub const DEADLINE_MARKER: &str = "📅";
pub const FALLBACK_TAG: &str = "#youtrack";

/// One issue rendered as a checklist line.
///
/// Segment order is fixed: checkbox, summary, link, tags, estimation,
/// priority, created, deadline, ID. Optional segments are skipped entirely.
#[derive(Debug, Clone, Default)]
pub struct TaskLine {
    pub symbol: String,
    pub summary: String,
    pub link: Option<(String, String)>,
    pub tags: Vec<String>,
    pub estimation: Option<String>,
    pub priority: Option<&'static str>,
    pub created: Option<String>,
    pub deadline: Option<String>,
    pub issue_id: String,
}

impl fmt::Display for TaskLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut segments = vec![format!("- [{}]", self.symbol)];

        let summary = self.summary.trim();
        if !summary.is_empty() {
            segments.push(single_line(summary));
        }
        if let Some((label, url)) = &self.link {
            segments.push(format!("[{label}]({url})"));
        }
        segments.extend(self.tags.iter().map(|t| format!("#{}", tag_token(t))));
        if let Some(estimation) = &self.estimation {
            segments.push(format!("{ESTIMATION_MARKER} {estimation}"));
        }
        if let Some(priority) = self.priority {
            segments.push(priority.to_string());
        }
        if let Some(created) = &self.created {
            segments.push(format!("{CREATED_MARKER} {created}"));
        }
        if let Some(deadline) = &self.deadline {
            segments.push(format!("{DEADLINE_MARKER} {deadline}"));
        }
        segments.push(format!("{ID_MARKER} {}", self.issue_id));

        f.write_str(&segments.join(" "))
    }
}

/// Degraded line for search results that came back without a database ID.
pub fn fallback_line(issue_id: &str, summary: &str, server_url: &str) -> String {
    let mut segments = vec![
        "- [ ]".to_string(),
        format!("[{issue_id}]({})", issue_url(server_url, issue_id)),
    ];
    let summary = single_line(summary.trim());
    if !summary.is_empty() {
        segments.push(summary);
    }
    segments.push(FALLBACK_TAG.to_string());
    segments.push(format!("{ID_MARKER} {issue_id}"));
    segments.join(" ")
}

pub fn issue_url(server_url: &str, issue_id: &str) -> String {
    format!("{}/issue/{issue_id}", server_url.trim_end_matches('/'))
}

/// Epoch milliseconds as `YYYY-MM-DD` (UTC).
pub fn format_date(millis: i64) -> Option<String> {
    DateTime::from_timestamp_millis(millis).map(|dt| dt.format("%Y-%m-%d").to_string())
}

// Summaries are user text; a newline would split the task into two lines.
fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn tag_token(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join("_")
}
