use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

pub const DEFAULT_STATUS_MAPPING: &str =
    r#"{"Epic": "*", "Task": " ", "Bug": "d", "Feature": "I", "User Story": "n"}"#;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub token: String,
    pub server_url: String,
    pub project_name: String,
    pub custom_search_query: String,
    pub use_custom_statuses: bool,
    /// JSON object mapping issue type name to a checkbox symbol.
    pub custom_statuses_mapping: String,
    /// Workflow state set when a task is unchecked.
    pub open_state: String,
    /// Workflow state set when a task is checked.
    pub done_state: String,
    pub link_label: String,
    /// Upper bound on concurrent detail requests while formatting.
    pub detail_concurrency: usize,
    pub logging: LoggingOptions,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            token: String::new(),
            server_url: String::new(),
            project_name: String::new(),
            custom_search_query: String::new(),
            use_custom_statuses: false,
            custom_statuses_mapping: DEFAULT_STATUS_MAPPING.to_string(),
            open_state: "Backlog".to_string(),
            done_state: "Done".to_string(),
            link_label: "Open".to_string(),
            detail_concurrency: 4,
            logging: LoggingOptions::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingOptions {
    /// Logger name to minimum level. The empty name is the root logger.
    pub min_levels: BTreeMap<String, String>,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self {
            min_levels: BTreeMap::from([(String::new(), "info".to_string())]),
        }
    }
}

impl Settings {
    /// Add default entries for any setting the user has not set. Never replaces a present value.
    pub fn backfill_defaults(&mut self) {
        for (logger, level) in LoggingOptions::default().min_levels {
            self.logging.min_levels.entry(logger).or_insert(level);
        }
    }

    pub fn require_project(&self) -> Result<&str, ConfigError> {
        let project = self.project_name.trim();
        if project.is_empty() {
            return Err(ConfigError::MissingProject);
        }
        Ok(project)
    }

    /// The query to run for `insert`: the custom query if set, else the default one.
    pub fn search_query(&self) -> Result<String, ConfigError> {
        let project = self.require_project()?;

        let query = if self.custom_search_query.trim().is_empty() {
            format!("project: {project} sort by: updated Assignee: me State: -Done -Canceled")
        } else {
            self.custom_search_query.clone()
        };

        let scoped = Regex::new(&format!(r"project:\s*{}", regex::escape(project)))
            .map(|re| re.is_match(&query))
            .unwrap_or(false);
        if !scoped {
            return Err(ConfigError::QueryNotScopedToProject {
                project: project.to_string(),
            });
        }

        Ok(query)
    }

    pub fn require_connection(&self) -> Result<(), ConfigError> {
        if self.server_url.trim().is_empty() {
            return Err(ConfigError::MissingServerUrl);
        }
        if self.token.trim().is_empty() {
            return Err(ConfigError::MissingToken);
        }
        Ok(())
    }

    pub fn apply(&mut self, update: SettingsUpdate) {
        if let Some(v) = update.token {
            self.token = v;
        }
        if let Some(v) = update.server_url {
            self.server_url = v;
        }
        if let Some(v) = update.project_name {
            self.project_name = v;
        }
        if let Some(v) = update.custom_search_query {
            self.custom_search_query = v;
        }
        if let Some(v) = update.use_custom_statuses {
            self.use_custom_statuses = v;
        }
        if let Some(v) = update.custom_statuses_mapping {
            self.custom_statuses_mapping = v;
        }
        if let Some(v) = update.open_state {
            self.open_state = v;
        }
        if let Some(v) = update.done_state {
            self.done_state = v;
        }
        if let Some(v) = update.link_label {
            self.link_label = v;
        }
        if let Some(v) = update.detail_concurrency {
            self.detail_concurrency = v;
        }
        if let Some((logger, level)) = update.min_level {
            self.logging.min_levels.insert(logger, level);
        }
    }
}

/// Partial settings change. `None` keeps the current value.
#[derive(Debug, Default, PartialEq)]
pub struct SettingsUpdate {
    pub token: Option<String>,
    pub server_url: Option<String>,
    pub project_name: Option<String>,
    pub custom_search_query: Option<String>,
    pub use_custom_statuses: Option<bool>,
    pub custom_statuses_mapping: Option<String>,
    pub open_state: Option<String>,
    pub done_state: Option<String>,
    pub link_label: Option<String>,
    pub detail_concurrency: Option<usize>,
    /// Level for one logger; `logging.root` addresses the root logger.
    pub min_level: Option<(String, String)>,
}

impl SettingsUpdate {
    /// Single-key update from `config set <key> <value>`.
    pub fn parse(key: &str, value: &str) -> Result<Self, ConfigError> {
        let invalid = || ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        };
        let mut update = Self::default();
        match key {
            "token" => update.token = Some(value.to_string()),
            "server_url" => update.server_url = Some(value.trim_end_matches('/').to_string()),
            "project_name" => update.project_name = Some(value.to_string()),
            "custom_search_query" => update.custom_search_query = Some(value.to_string()),
            "use_custom_statuses" => {
                update.use_custom_statuses = Some(value.parse().map_err(|_| invalid())?)
            }
            "custom_statuses_mapping" => update.custom_statuses_mapping = Some(value.to_string()),
            "open_state" => update.open_state = Some(value.to_string()),
            "done_state" => update.done_state = Some(value.to_string()),
            "link_label" => update.link_label = Some(value.to_string()),
            "detail_concurrency" => {
                let n: usize = value.parse().map_err(|_| invalid())?;
                if n == 0 {
                    return Err(invalid());
                }
                update.detail_concurrency = Some(n);
            }
            other => {
                let Some(logger) = other.strip_prefix("logging.") else {
                    return Err(ConfigError::InvalidKey(other.to_string()));
                };
                let logger = if logger == "root" { "" } else { logger };
                update.min_level = Some((logger.to_string(), value.to_string()));
            }
        }
        Ok(update)
    }
}

/// Owns the persisted settings: load, merge, save.
pub struct SettingsStore {
    path: PathBuf,
    settings: Settings,
}

impl SettingsStore {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let mut settings = if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str::<Settings>(&contents)
                .with_context(|| format!("Failed to parse {}", path.display()))?
        } else {
            Settings::default()
        };
        settings.backfill_defaults();
        Ok(Self { path, settings })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self) -> Settings {
        let mut settings = self.settings.clone();
        settings.backfill_defaults();
        settings
    }

    /// Apply `update` and replace the stored value as a whole.
    pub fn update(&mut self, update: SettingsUpdate) -> Settings {
        let mut next = self.settings.clone();
        next.apply(update);
        self.settings = next;
        self.get()
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<Settings, ConfigError> {
        let update = SettingsUpdate::parse(key, value)?;
        Ok(self.update(update))
    }

    pub fn reset(&mut self) -> Settings {
        self.settings = Settings::default();
        self.get()
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let contents = toml::to_string_pretty(&self.get()).context("Failed to serialize settings")?;
        std::fs::write(&self.path, contents)
            .with_context(|| format!("Failed to write config to {}", self.path.display()))?;
        Ok(())
    }
}

pub fn data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".youtasks")
}

pub fn default_config_path() -> PathBuf {
    data_dir().join("config.toml")
}
