//! CLI error types and exit-code mapping

use flowctl_client::ConfigError;
use flowctl_engine::{ClientError, EngineError};
use thiserror::Error;

/// CLI error types
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Engine-level failure (convergence, lineage, lifecycle)
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Bare client call failure
    #[error("api call failed: {0}")]
    Client(#[from] ClientError),

    /// Invalid input
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file parsing error
    #[error("config file error: {0}")]
    Toml(#[from] toml::de::Error),

    /// JSON rendering error
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML rendering error
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    /// Process exit code reported for this error.
    ///
    /// 2 usage/configuration, 3 not found, 4 gave up waiting
    /// (retries or deadline), 5 precondition refusal, 1 anything else.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Config(_) | CliError::InvalidInput(_) | CliError::Toml(_) => 2,
            CliError::Engine(EngineError::NotFound { .. }) => 3,
            CliError::Client(ClientError::NotFound) => 3,
            CliError::Engine(
                EngineError::RetriesExhausted { .. } | EngineError::DeadlineExceeded { .. },
            ) => 4,
            CliError::Engine(EngineError::CancelWait { .. }) => 4,
            CliError::Engine(EngineError::Precondition { .. }) => 5,
            CliError::Client(ClientError::InvalidState { .. }) => 5,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowctl_types::FlowKey;

    #[test]
    fn test_exit_codes_distinguish_failure_classes() {
        let not_found = CliError::Engine(EngineError::NotFound {
            key: FlowKey::new("1"),
        });
        assert_eq!(not_found.exit_code(), 3);

        let gave_up = CliError::Engine(EngineError::RetriesExhausted { attempts: 5 });
        assert_eq!(gave_up.exit_code(), 4);

        let refused = CliError::Engine(EngineError::Precondition {
            key: FlowKey::new("1"),
            message: "still active".to_string(),
        });
        assert_eq!(refused.exit_code(), 5);

        let invalid = CliError::InvalidInput("bad state".to_string());
        assert_eq!(invalid.exit_code(), 2);
    }
}
