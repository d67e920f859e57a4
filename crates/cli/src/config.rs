//! Global configuration: flags with environment-variable fallbacks.

use std::time::Duration;

use apiclient::{ClientConfig, LabelError, Labels, UnauthorisedScopePolicy};
use clap::{Args, ValueEnum};
use thiserror::Error;

/// Settings shared by every command.
#[derive(Debug, Clone, Args)]
pub struct GlobalArgs {
    /// API endpoints as host:port, comma separated. The first is used.
    #[arg(
        long,
        env = "STORAGEOS_ENDPOINTS",
        value_delimiter = ',',
        default_value = "localhost:5705",
        global = true
    )]
    pub endpoints: Vec<String>,

    /// Deadline for each command, e.g. "5s" or "1m 30s".
    #[arg(
        long,
        env = "STORAGEOS_API_TIMEOUT",
        value_parser = humantime::parse_duration,
        default_value = "5s",
        global = true
    )]
    pub timeout: Duration,

    #[arg(long, env = "STORAGEOS_USER_NAME", default_value = "storageos", global = true)]
    pub username: String,

    #[arg(
        long,
        env = "STORAGEOS_PASSWORD",
        default_value = "storageos",
        hide_default_value = true,
        hide_env_values = true,
        global = true
    )]
    pub password: String,

    /// Treat resource arguments as identifiers rather than names.
    #[arg(long, env = "STORAGEOS_USE_IDS", global = true)]
    pub use_ids: bool,

    /// Namespace for volume commands.
    #[arg(short, long, env = "STORAGEOS_NAMESPACE", global = true)]
    pub namespace: Option<String>,

    /// What to do when every namespace in a listing denies access.
    #[arg(long, value_enum, default_value_t = UnauthorisedNamespaces::Skip, global = true)]
    pub unauthorised_namespaces: UnauthorisedNamespaces,

    /// Encoding of diagnostic logs on stderr. Filter them with RUST_LOG.
    #[arg(long, value_enum, default_value_t = LogOutput::Text, global = true)]
    pub log_format: LogOutput,
}

impl GlobalArgs {
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            command_timeout: Some(self.timeout),
            unauthorised_scopes: self.unauthorised_namespaces.into(),
        }
    }

    pub fn endpoint(&self) -> Result<&str, ConfigError> {
        self.endpoints
            .iter()
            .map(|e| e.trim())
            .find(|e| !e.is_empty())
            .ok_or(ConfigError::NoEndpoint)
    }

    pub fn require_namespace(&self) -> Result<&str, ConfigError> {
        self.namespace.as_deref().ok_or(ConfigError::NamespaceRequired)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum UnauthorisedNamespaces {
    Skip,
    Fail,
}

impl From<UnauthorisedNamespaces> for UnauthorisedScopePolicy {
    fn from(value: UnauthorisedNamespaces) -> Self {
        match value {
            UnauthorisedNamespaces::Skip => Self::Skip,
            UnauthorisedNamespaces::Fail => Self::Fail,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogOutput {
    Text,
    Json,
}

/// Invalid command-line input detected before any API call.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no API endpoint configured")]
    NoEndpoint,

    #[error("a namespace is required: pass --namespace or set STORAGEOS_NAMESPACE")]
    NamespaceRequired,

    #[error("{kind} identifier must not be empty")]
    EmptyId { kind: &'static str },

    #[error("version token must not be empty")]
    EmptyVersion,

    #[error(transparent)]
    Labels(#[from] LabelError),
}

/// Parses repeated `key=value` label arguments.
pub fn parse_labels(pairs: &[String]) -> Result<Labels, ConfigError> {
    Ok(Labels::from_pairs(pairs)?)
}
