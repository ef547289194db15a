pub mod line;
pub mod symbols;

use std::collections::HashSet;

use futures::stream::{self, StreamExt};
use tracing::{debug, warn};

use crate::config::Settings;
use crate::model::issue::{Issue, IssueDetail};
use crate::notice::{Notice, Notifier};
use crate::tracker::Tracker;

use line::{fallback_line, format_date, issue_url, TaskLine};
use symbols::{priority_glyph, StatusSymbols, BLANK};

/// Everything the formatter needs from the settings.
#[derive(Debug, Clone)]
pub struct FormatOptions {
    pub project_name: String,
    pub server_url: String,
    pub link_label: String,
    pub use_custom_statuses: bool,
    pub status_symbols: StatusSymbols,
    pub detail_concurrency: usize,
}

impl FormatOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            project_name: settings.project_name.trim().to_string(),
            server_url: settings.server_url.trim_end_matches('/').to_string(),
            link_label: settings.link_label.clone(),
            use_custom_statuses: settings.use_custom_statuses,
            status_symbols: StatusSymbols::parse(&settings.custom_statuses_mapping),
            detail_concurrency: settings.detail_concurrency.max(1),
        }
    }

    fn checkbox_symbol(&self, detail: Option<&IssueDetail>) -> String {
        if !self.use_custom_statuses {
            return BLANK.to_string();
        }
        detail
            .and_then(|d| d.text_field("Type"))
            .and_then(|t| self.status_symbols.symbol_for(t))
            .unwrap_or(BLANK)
            .to_string()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormatReport {
    /// Task lines in input order, duplicates removed.
    pub lines: Vec<String>,
    pub fetched: usize,
    pub duplicates: usize,
}

/// Turn search results into task lines, skipping issues whose ID is already tracked.
///
/// Detail lookups run concurrently up to `detail_concurrency`, but lines are
/// emitted in input order. A failed lookup only degrades that issue's line.
pub async fn format_issues(
    tracker: &dyn Tracker,
    issues: &[Issue],
    options: &FormatOptions,
    tracked: &HashSet<String>,
    notifier: &dyn Notifier,
) -> FormatReport {
    let mut duplicates = 0;
    let mut pending = Vec::with_capacity(issues.len());
    for issue in issues {
        let issue_id = issue.readable_id(&options.project_name);
        if tracked.contains(&issue_id) {
            debug!(%issue_id, "already tracked, skipping");
            duplicates += 1;
            continue;
        }
        pending.push((issue, issue_id));
    }

    let lines = stream::iter(pending)
        .map(|(issue, issue_id)| format_issue(tracker, issue, issue_id, options))
        .buffered(options.detail_concurrency)
        .collect::<Vec<_>>()
        .await;

    notifier.notify(Notice::FetchedIssues(issues.len()));
    notifier.notify(Notice::FilteredIssues(duplicates));

    FormatReport {
        lines,
        fetched: issues.len(),
        duplicates,
    }
}

async fn format_issue(
    tracker: &dyn Tracker,
    issue: &Issue,
    issue_id: String,
    options: &FormatOptions,
) -> String {
    let Some(db_id) = issue.id.as_deref() else {
        debug!(%issue_id, "no database id, using fallback line");
        return fallback_line(&issue_id, &issue.summary, &options.server_url);
    };

    let detail = match tracker.issue_detail(db_id).await {
        Ok(detail) => Some(detail),
        Err(err) => {
            warn!(%issue_id, error = %format!("{err:#}"), "issue detail unavailable, formatting without it");
            None
        }
    };

    task_line(issue, issue_id, detail.as_ref(), options).to_string()
}

pub fn task_line(
    issue: &Issue,
    issue_id: String,
    detail: Option<&IssueDetail>,
    options: &FormatOptions,
) -> TaskLine {
    let mut line = TaskLine {
        symbol: options.checkbox_symbol(detail),
        summary: issue.summary.clone(),
        link: Some((
            options.link_label.clone(),
            issue_url(&options.server_url, &issue_id),
        )),
        issue_id,
        ..TaskLine::default()
    };

    let Some(detail) = detail else {
        return line;
    };
    line.tags = detail.tag_names().map(String::from).collect();

    if detail.fields.is_some() {
        line.estimation = detail.text_field("Estimation").map(String::from);
        line.priority = detail.text_field("Priority").and_then(priority_glyph);
        line.created = detail.created.and_then(format_date);
        line.deadline = detail.number_field("Deadline date").and_then(format_date);
    }

    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::issue::{CustomField, NamedValue, PeriodValue, Tag};
    use crate::notice::tests::RecordingNotifier;
    use crate::toggle::extract_issue_id;
    use crate::tracker::tests::{issue, MockTracker};

    fn options(use_custom_statuses: bool) -> FormatOptions {
        FormatOptions::from_settings(&Settings {
            project_name: "ABC".into(),
            server_url: "https://yt.example.com".into(),
            use_custom_statuses,
            ..Settings::default()
        })
    }

    fn type_field(name: &str) -> CustomField {
        CustomField::SingleEnumIssueCustomField {
            name: "Type".into(),
            value: Some(NamedValue { name: name.into() }),
        }
    }

    fn detail(id: &str, fields: Vec<CustomField>) -> IssueDetail {
        IssueDetail {
            id: id.into(),
            created: None,
            tags: None,
            fields: Some(fields),
        }
    }

    async fn run(
        tracker: &MockTracker,
        opts: &FormatOptions,
        tracked: &[&str],
    ) -> (FormatReport, Vec<Notice>) {
        let notifier = RecordingNotifier::default();
        let tracked: HashSet<String> = tracked.iter().map(|s| s.to_string()).collect();
        let report =
            format_issues(tracker, &tracker.search_results, opts, &tracked, &notifier).await;
        (report, notifier.taken())
    }

    #[tokio::test]
    async fn bug_gets_custom_symbol_and_trailing_id() {
        let tracker = MockTracker::with_results(vec![issue(Some("3-1"), 42, "Fix bug")])
            .with_detail(detail("3-1", vec![type_field("Bug")]));

        let (report, _) = run(&tracker, &options(true), &[]).await;

        assert_eq!(report.lines.len(), 1);
        let line = &report.lines[0];
        assert!(line.starts_with("- [d] Fix bug"));
        assert!(line.ends_with("🆔 ABC-42"));
    }

    #[tokio::test]
    async fn statuses_disabled_uses_blank_checkbox() {
        let tracker = MockTracker::with_results(vec![issue(Some("3-1"), 42, "Fix bug")])
            .with_detail(detail("3-1", vec![type_field("Bug")]));

        let (report, _) = run(&tracker, &options(false), &[]).await;
        assert!(report.lines[0].starts_with("- [ ] Fix bug"));
    }

    #[tokio::test]
    async fn unknown_type_uses_blank_checkbox() {
        let tracker = MockTracker::with_results(vec![issue(Some("3-1"), 1, "Spike")])
            .with_detail(detail("3-1", vec![type_field("Research")]));

        let (report, _) = run(&tracker, &options(true), &[]).await;
        assert!(report.lines[0].starts_with("- [ ] Spike"));
    }

    #[tokio::test]
    async fn unparseable_mapping_still_formats_task() {
        let tracker = MockTracker::with_results(vec![issue(Some("3-1"), 5, "Do it")])
            .with_detail(detail("3-1", vec![type_field("Task")]));
        let mut opts = options(true);
        opts.status_symbols = StatusSymbols::parse("not json");

        let (report, _) = run(&tracker, &opts, &[]).await;
        assert_eq!(report.lines.len(), 1);
        assert!(report.lines[0].starts_with("- [ ] Do it"));
    }

    #[tokio::test]
    async fn tracked_issues_are_skipped_and_counted() {
        let tracker = MockTracker::with_results(vec![
            issue(Some("3-1"), 1, "One"),
            issue(Some("3-2"), 2, "Two"),
            issue(None, 3, "Three"),
        ])
        .with_detail(detail("3-2", vec![]));

        let (report, notices) = run(&tracker, &options(false), &["ABC-1", "ABC-3"]).await;

        assert_eq!(report.duplicates, 2);
        assert_eq!(report.fetched, 3);
        assert_eq!(report.lines.len(), 1);
        assert!(report.lines[0].ends_with("🆔 ABC-2"));
        assert_eq!(
            notices,
            vec![Notice::FetchedIssues(3), Notice::FilteredIssues(2)]
        );
        // Skipped issues never cost a detail request.
        assert_eq!(*tracker.detail_requests.lock().unwrap(), vec!["3-2"]);
    }

    #[tokio::test]
    async fn repeated_runs_never_reemit_tracked_issue() {
        let tracker = MockTracker::with_results(vec![issue(Some("3-1"), 1, "One")]);
        for _ in 0..3 {
            let (report, _) = run(&tracker, &options(false), &["ABC-1"]).await;
            assert!(report.lines.is_empty());
            assert_eq!(report.duplicates, 1);
        }
    }

    #[tokio::test]
    async fn issue_without_id_gets_fallback_line() {
        let tracker = MockTracker::with_results(vec![issue(None, 9, "Partial")]);

        let (report, _) = run(&tracker, &options(true), &[]).await;
        assert_eq!(
            report.lines,
            vec!["- [ ] [ABC-9](https://yt.example.com/issue/ABC-9) Partial #youtrack 🆔 ABC-9"]
        );
        assert!(tracker.detail_requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_detail_degrades_single_issue() {
        let tracker = MockTracker::with_results(vec![
            issue(Some("3-1"), 1, "Broken"),
            issue(Some("3-2"), 2, "Fine"),
        ])
        .with_detail(IssueDetail {
            id: "3-2".into(),
            created: Some(1_700_000_000_000),
            tags: Some(vec![Tag { name: "ui".into() }]),
            fields: Some(vec![]),
        });

        let (report, _) = run(&tracker, &options(true), &[]).await;
        assert_eq!(
            report.lines,
            vec![
                "- [ ] Broken [Open](https://yt.example.com/issue/ABC-1) 🆔 ABC-1",
                "- [ ] Fine [Open](https://yt.example.com/issue/ABC-2) #ui ➕ 2023-11-14 🆔 ABC-2",
            ]
        );
    }

    #[tokio::test]
    async fn detail_without_fields_omits_field_segments() {
        let tracker = MockTracker::with_results(vec![issue(Some("3-1"), 1, "Bare")])
            .with_detail(IssueDetail {
                id: "3-1".into(),
                created: Some(1_700_000_000_000),
                tags: None,
                fields: None,
            });

        let (report, _) = run(&tracker, &options(true), &[]).await;
        assert_eq!(
            report.lines[0],
            "- [ ] Bare [Open](https://yt.example.com/issue/ABC-1) 🆔 ABC-1"
        );
    }

    #[tokio::test]
    async fn all_field_segments_render() {
        let fields = vec![
            type_field("Feature"),
            CustomField::PeriodIssueCustomField {
                name: "Estimation".into(),
                value: Some(PeriodValue {
                    presentation: Some("1d 4h".into()),
                    minutes: Some(720),
                }),
            },
            CustomField::SingleEnumIssueCustomField {
                name: "Priority".into(),
                value: Some(NamedValue {
                    name: "Critical".into(),
                }),
            },
            CustomField::DateIssueCustomField {
                name: "Deadline date".into(),
                value: Some(1_700_600_000_000),
            },
        ];
        let tracker = MockTracker::with_results(vec![issue(Some("3-1"), 12, "Ship it")])
            .with_detail(IssueDetail {
                id: "3-1".into(),
                created: Some(1_700_000_000_000),
                tags: Some(vec![Tag {
                    name: "release".into(),
                }]),
                fields: Some(fields),
            });

        let (report, _) = run(&tracker, &options(true), &[]).await;
        assert_eq!(
            report.lines[0],
            "- [I] Ship it [Open](https://yt.example.com/issue/ABC-12) #release ⏰ 1d 4h 🔺 ➕ 2023-11-14 📅 2023-11-21 🆔 ABC-12"
        );
    }

    #[tokio::test]
    async fn output_order_follows_input_order() {
        let mut tracker = MockTracker::with_results(
            (1..=10)
                .map(|n| issue(Some(&format!("3-{n}")), n, &format!("Issue {n}")))
                .collect(),
        );
        for n in 1..=10 {
            tracker = tracker.with_detail(detail(&format!("3-{n}"), vec![]));
        }

        let (report, _) = run(&tracker, &options(false), &[]).await;
        let ids: Vec<_> = report
            .lines
            .iter()
            .map(|l| extract_issue_id(l).unwrap().to_string())
            .collect();
        let expected: Vec<_> = (1..=10).map(|n| format!("ABC-{n}")).collect();
        assert_eq!(ids, expected);
    }

    #[tokio::test]
    async fn every_emitted_line_round_trips_its_id() {
        let tracker = MockTracker::with_results(vec![
            issue(Some("3-1"), 1, "Mentions XYZ-999 in the summary"),
            issue(None, 2, "Partial ABC-77"),
        ])
        .with_detail(detail("3-1", vec![type_field("Epic")]));

        let (report, _) = run(&tracker, &options(true), &[]).await;
        assert_eq!(extract_issue_id(&report.lines[0]), Some("ABC-1"));
        assert_eq!(extract_issue_id(&report.lines[1]), Some("ABC-2"));
    }
}
