//! ladle-common: types and contracts shared by the composer crates.

pub mod config;
pub mod error;
pub mod profile;
pub mod provider;
#[cfg(feature = "telemetry")]
pub mod telemetry;

pub use crate::config::ComposerConfig;
pub use crate::error::{ComposerError, ConfigError, ProviderError};
pub use crate::profile::{ProfileRecord, SuggestionEntry};
pub use crate::provider::{ProfileResolver, PublishDraft, Publisher, SearchProvider};
