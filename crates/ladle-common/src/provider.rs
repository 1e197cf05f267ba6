//! Contracts for the external collaborators the composer talks to.
//!
//! Implementations live in the host application (relay pool, directory
//! service, publishing pipeline). The traits are object safe so a composer
//! can hold `Arc<dyn SearchProvider>` and friends; implementors return boxed
//! futures, usually by writing `async move { .. }.boxed()`.

use std::collections::BTreeSet;

use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::error::ProviderError;
use crate::profile::ProfileRecord;

/// Resolves follow lists and profile metadata.
pub trait ProfileResolver: Send + Sync {
    /// Identifiers followed by `owner`.
    fn fetch_follow_list<'a>(
        &'a self,
        owner: &'a str,
    ) -> BoxFuture<'a, Result<Vec<SmolStr>, ProviderError>>;

    /// Profile metadata for a batch of identifiers. Unknown identifiers are
    /// simply absent from the result.
    fn fetch_profiles<'a>(
        &'a self,
        identifiers: &'a [SmolStr],
    ) -> BoxFuture<'a, Result<Vec<ProfileRecord>, ProviderError>>;
}

/// Free-text profile search.
pub trait SearchProvider: Send + Sync {
    /// Short name used in logs and metrics labels.
    fn name(&self) -> &'static str;

    fn search_by_text<'a>(
        &'a self,
        query: &'a str,
        limit: usize,
    ) -> BoxFuture<'a, Result<Vec<ProfileRecord>, ProviderError>>;
}

/// The two artifacts a finished composition hands to the publisher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishDraft {
    /// Canonical text, every mention in `scheme:identifier` form.
    pub content: String,
    /// Identifiers referenced by the content, for recipient tagging.
    pub mentioned: BTreeSet<SmolStr>,
}

impl PublishDraft {
    pub fn is_empty(&self) -> bool {
        self.content.trim().is_empty()
    }
}

/// Receives finished drafts. The composer never publishes by itself.
pub trait Publisher: Send + Sync {
    fn publish<'a>(&'a self, draft: PublishDraft) -> BoxFuture<'a, Result<(), ProviderError>>;
}
