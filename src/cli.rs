use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::debug;

use crate::config::{self, Settings, SettingsStore};
use crate::document::{new_cursor_position, CursorPosition, Document};
use crate::format::{format_issues, FormatOptions};
use crate::notice::{Notice, Notifier};
use crate::toggle::{handle_toggle, ToggleOutcome, WorkflowStates};
use crate::tracked::{TrackedIds, VaultScanner};
use crate::tracker::{create_tracker, Tracker};

#[derive(Parser)]
#[command(
    name = "youtasks",
    version,
    about = "Pull YouTrack issues into Markdown task lists and push checkbox changes back"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Settings file (defaults to ~/.youtasks/config.toml)
    #[arg(long, global = true, env = "YOUTASKS_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Replace a line of a note with task lines for the issues matching the search query
    Insert(InsertArgs),
    /// Flip a task's checkbox and move its issue to the matching workflow state
    Toggle(ToggleArgs),
    /// Show the YouTrack user the token belongs to
    Whoami,
    /// Inspect or change settings
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Args)]
pub struct InsertArgs {
    /// Note to edit. Without it the task lines are printed to stdout.
    #[arg(long, short)]
    pub file: Option<PathBuf>,
    /// 1-based line to replace
    #[arg(long, short, default_value_t = 1)]
    pub line: usize,
    /// Directory scanned for already tracked task IDs (defaults to the note's directory)
    #[arg(long)]
    pub vault: Option<PathBuf>,
}

#[derive(Args)]
pub struct ToggleArgs {
    /// Note containing the task
    #[arg(long, short, required_unless_present = "text", requires = "line")]
    pub file: Option<PathBuf>,
    /// 1-based line of the task
    #[arg(long, short)]
    pub line: Option<usize>,
    /// Task line text as seen after the click, instead of editing a file
    #[arg(long, conflicts_with = "file")]
    pub text: Option<String>,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Print the effective settings
    Show,
    /// Print the settings file location
    Path,
    /// Set one setting; `logging.<target>` sets a log level
    Set { key: String, value: String },
    /// Restore every setting to its default
    Reset,
}

pub fn config_path(cli: &Cli) -> PathBuf {
    cli.config.clone().unwrap_or_else(config::default_config_path)
}

pub async fn handle_insert(
    settings: &Settings,
    args: &InsertArgs,
    notifier: &dyn Notifier,
) -> Result<()> {
    let query = settings.search_query()?;
    let tracker = create_tracker(settings)?;

    let mut document = match &args.file {
        Some(path) => Some(Document::open(path)?),
        None => None,
    };
    let index = line_index(args.line)?;
    if let Some(doc) = &document {
        if doc.line(index).is_none() {
            bail!("Line {} does not exist in {}", args.line, doc.path().display());
        }
    }

    let vault = args
        .vault
        .clone()
        .or_else(|| args.file.as_deref().and_then(Path::parent).map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."));
    let tracked = VaultScanner::new(vault).tracked_ids()?;

    let Some(lines) = fetch_lines(tracker.as_ref(), settings, &query, &tracked, notifier).await
    else {
        return Ok(());
    };
    let text = lines.join("\n");

    match &mut document {
        Some(doc) => {
            doc.set_line(index, &text)?;
            doc.save()?;
            let cursor = new_cursor_position(
                CursorPosition { line: index, ch: 0 },
                &text,
                CursorPosition {
                    line: 0,
                    ch: text.chars().count(),
                },
            );
            println!("{}:{}", cursor.line + 1, cursor.ch);
        }
        None => {
            if !text.is_empty() {
                println!("{text}");
            }
        }
    }
    Ok(())
}

async fn fetch_lines(
    tracker: &dyn Tracker,
    settings: &Settings,
    query: &str,
    tracked: &std::collections::HashSet<String>,
    notifier: &dyn Notifier,
) -> Option<Vec<String>> {
    debug!(tracker = tracker.name(), query, "fetching issues");
    let issues = match tracker.search(query).await {
        Ok(issues) => issues,
        Err(err) => {
            notifier.notify(Notice::RetrieveFailed(format!("{err:#}")));
            return None;
        }
    };
    if issues.is_empty() {
        notifier.notify(Notice::ZeroIssues {
            query: query.to_string(),
        });
        return None;
    }

    let options = FormatOptions::from_settings(settings);
    let report = format_issues(tracker, &issues, &options, tracked, notifier).await;
    debug!(lines = report.lines.len(), duplicates = report.duplicates, "formatted issues");
    Some(report.lines)
}

pub async fn handle_toggle_command(
    settings: &Settings,
    args: &ToggleArgs,
    notifier: &dyn Notifier,
) -> Result<()> {
    settings.require_project()?;
    let tracker = create_tracker(settings)?;
    toggle_with(tracker.as_ref(), settings, args, notifier).await
}

async fn toggle_with(
    tracker: &dyn Tracker,
    settings: &Settings,
    args: &ToggleArgs,
    notifier: &dyn Notifier,
) -> Result<()> {
    // Must fail before the note is edited.
    settings.require_project()?;

    let line = match (&args.text, &args.file) {
        (Some(text), _) => text.clone(),
        (None, Some(path)) => {
            let index = line_index(args.line.unwrap_or(1))?;
            let mut doc = Document::open(path)?;
            let line = doc.toggle_checkbox(index)?;
            doc.save()?;
            line
        }
        (None, None) => bail!("Either --file/--line or --text is required"),
    };

    toggle_line(tracker, settings, &line, notifier).await;
    Ok(())
}

async fn toggle_line(tracker: &dyn Tracker, settings: &Settings, line: &str, notifier: &dyn Notifier) {
    let states = WorkflowStates::from_settings(settings);
    let project = settings.project_name.trim();
    match handle_toggle(tracker, line, project, &states).await {
        Ok(ToggleOutcome::Changed { issue_id, state }) => {
            notifier.notify(Notice::StateChanged { issue_id, state });
        }
        Ok(outcome) => debug!(?outcome, "toggle left tracker unchanged"),
        Err(err) => notifier.notify(Notice::ToggleFailed {
            issue_id: crate::toggle::extract_issue_id(line).unwrap_or_default().to_string(),
            error: format!("{err:#}"),
        }),
    }
}

pub async fn handle_whoami(settings: &Settings, notifier: &dyn Notifier) -> Result<()> {
    let tracker = create_tracker(settings)?;
    let user = tracker
        .current_user()
        .await
        .with_context(|| format!("Could not reach {}", settings.server_url))?;
    notifier.notify(Notice::LoggedAs(user.login.clone()));
    match user.full_name {
        Some(name) => println!("{} ({name})", user.login),
        None => println!("{}", user.login),
    }
    Ok(())
}

pub fn handle_config(store: &mut SettingsStore, command: &ConfigCommand) -> Result<()> {
    match command {
        ConfigCommand::Show => {
            let mut settings = store.get();
            if !settings.token.is_empty() {
                settings.token = "********".into();
            }
            print!("{}", toml::to_string_pretty(&settings).context("Failed to render settings")?);
        }
        ConfigCommand::Path => println!("{}", store.path().display()),
        ConfigCommand::Set { key, value } => {
            store.set(key, value)?;
            store.save()?;
        }
        ConfigCommand::Reset => {
            store.reset();
            store.save()?;
        }
    }
    Ok(())
}

fn line_index(line: usize) -> Result<usize> {
    line.checked_sub(1).context("Line numbers start at 1")
}
