use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DevtoolsError {
    #[error("failed to load connector dependency `{url}`: {reason}")]
    DependencyLoad { url: String, reason: String },

    #[error("connector dependency is not loaded")]
    DependencyUnavailable,

    #[error("host operation failed: {0}")]
    Host(String),

    #[error("invalid devtools configuration: {0}")]
    Config(String),
}

pub type Result<T, E = DevtoolsError> = std::result::Result<T, E>;
