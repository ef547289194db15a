use thiserror::Error;

/// Settings problems detected before any request is sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("YouTrack server URL is not set")]
    MissingServerUrl,
    #[error("YouTrack token is not set")]
    MissingToken,
    #[error("YouTrack project is not set")]
    MissingProject,
    #[error("search query must contain `project: {project}`, otherwise issue IDs cannot be derived")]
    QueryNotScopedToProject { project: String },
    #[error("unknown setting `{0}`")]
    InvalidKey(String),
    #[error("invalid value `{value}` for setting `{key}`")]
    InvalidValue { key: String, value: String },
}
