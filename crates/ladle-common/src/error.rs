//! Error types shared by the composer crates.

use std::path::PathBuf;

use miette::Diagnostic;

/// Failure reported by one of the external profile/search/publish collaborators.
///
/// The composer never surfaces these to the user. They are logged where they
/// happen and the feature degrades (fewer suggestions, no preload).
#[derive(thiserror::Error, Debug, Diagnostic, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProviderError {
    /// Transport-level failure (connection refused, relay closed, timeout).
    #[error("network error: {0}")]
    #[diagnostic(code(ladle::provider::network))]
    Network(String),

    /// The provider answered, but with something we could not use.
    #[error("invalid response from provider: {0}")]
    #[diagnostic(code(ladle::provider::invalid_response))]
    InvalidResponse(String),

    /// Provider refused the request (rate limit, auth).
    #[error("request rejected: {0}")]
    #[diagnostic(code(ladle::provider::rejected))]
    Rejected(String),
}

impl ProviderError {
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }
}

/// Errors loading [`ComposerConfig`](crate::config::ComposerConfig).
#[derive(thiserror::Error, Debug, Diagnostic)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("failed to read config file {path}")]
    #[diagnostic(code(ladle::config::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    #[diagnostic(code(ladle::config::toml))]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    #[diagnostic(code(ladle::config::json))]
    Json(#[from] serde_json::Error),

    #[error("unsupported config format: {0}")]
    #[diagnostic(
        code(ladle::config::format),
        help("use a .toml or .json file")
    )]
    UnsupportedFormat(String),

    #[error("invalid config value for `{field}`: {reason}")]
    #[diagnostic(code(ladle::config::invalid))]
    Invalid { field: &'static str, reason: String },
}

/// Errors from composer operations that have a caller to report to.
#[derive(thiserror::Error, Debug, Diagnostic)]
#[non_exhaustive]
pub enum ComposerError {
    /// The publish collaborator failed.
    #[error(transparent)]
    #[diagnostic_source]
    Provider(#[from] ProviderError),

    /// Nothing to publish.
    #[error("composer is empty")]
    #[diagnostic(code(ladle::composer::empty))]
    Empty,

    /// The controller was torn down before the operation ran.
    #[error("composer has been torn down")]
    #[diagnostic(code(ladle::composer::torn_down))]
    TornDown,
}
