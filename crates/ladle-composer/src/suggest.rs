//! Suggestion provider pipeline: cache first, then the network, merged and
//! ranked.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;

use futures_util::future::join;
use ladle_common::{ComposerConfig, ProfileRecord, ProfileResolver, SearchProvider, SuggestionEntry};
use smol_str::SmolStr;

use crate::cache::ProfileCache;

/// Combines the shared [`ProfileCache`] with a keyword search provider and
/// an optional directory search provider.
#[derive(Clone)]
pub struct SuggestionPipeline {
    cache: Arc<ProfileCache>,
    keyword: Arc<dyn SearchProvider>,
    directory: Option<Arc<dyn SearchProvider>>,
    follows: Option<FollowSource>,
    directory_min_query_len: usize,
    preload_batch_size: usize,
}

#[derive(Clone)]
struct FollowSource {
    owner: SmolStr,
    resolver: Arc<dyn ProfileResolver>,
}

impl SuggestionPipeline {
    pub fn new(cache: Arc<ProfileCache>, keyword: Arc<dyn SearchProvider>) -> Self {
        let defaults = ComposerConfig::default();
        Self {
            cache,
            keyword,
            directory: None,
            follows: None,
            directory_min_query_len: defaults.directory_min_query_len,
            preload_batch_size: defaults.preload_batch_size,
        }
    }

    /// Second provider, only consulted for queries of at least
    /// `directory_min_query_len` chars.
    pub fn with_directory(mut self, directory: Arc<dyn SearchProvider>) -> Self {
        self.directory = Some(directory);
        self
    }

    /// Preload `owner`'s follow list through `resolver` on first search.
    pub fn with_follow_list(
        mut self,
        owner: impl Into<SmolStr>,
        resolver: Arc<dyn ProfileResolver>,
    ) -> Self {
        self.follows = Some(FollowSource {
            owner: owner.into(),
            resolver,
        });
        self
    }

    pub fn with_config(mut self, config: &ComposerConfig) -> Self {
        self.directory_min_query_len = config.directory_min_query_len;
        self.preload_batch_size = config.preload_batch_size;
        self
    }

    pub fn cache(&self) -> &Arc<ProfileCache> {
        &self.cache
    }

    /// Kick off the follow-list preload without waiting for it.
    pub fn spawn_preload(&self) {
        let Some(follows) = self.follows.clone() else {
            return;
        };
        if self.cache.is_preloaded() {
            return;
        }
        let cache = self.cache.clone();
        let batch_size = self.preload_batch_size;
        n0_future::task::spawn(async move {
            cache
                .preload_from_follow_list(&follows.owner, follows.resolver.as_ref(), batch_size)
                .await;
        });
    }

    /// First-pass result straight from the cache. Never waits.
    pub fn cached_matches(&self, query: &str, limit: usize) -> Vec<SuggestionEntry> {
        let mut entries = self.cache.matching(query);
        rank(&mut entries, query);
        entries.truncate(limit);
        entries
    }

    /// Most recently cached entries, for an empty query.
    pub fn recent(&self, limit: usize) -> Vec<SuggestionEntry> {
        self.cache.recent(limit)
    }

    /// Cache matches merged with network results, ranked and truncated.
    ///
    /// A failing provider is logged and ignored; with every provider down
    /// this degrades to cache-only results.
    pub async fn search(&self, query: &str, limit: usize) -> Vec<SuggestionEntry> {
        self.spawn_preload();

        let mut merged = self.cache.matching(query);
        let mut seen: HashSet<SmolStr> = merged.iter().map(|e| e.identifier.clone()).collect();

        let query_len = query.chars().count();
        let keyword = async {
            if query_len >= 1 {
                self.run_provider(self.keyword.as_ref(), query, limit).await
            } else {
                Vec::new()
            }
        };
        let directory = async {
            match &self.directory {
                Some(directory) if query_len >= self.directory_min_query_len => {
                    self.run_provider(directory.as_ref(), query, limit).await
                }
                _ => Vec::new(),
            }
        };
        let (from_keyword, from_directory) = join(keyword, directory).await;

        for record in from_keyword.into_iter().chain(from_directory) {
            if record.identifier.is_empty() {
                continue;
            }
            let entry = SuggestionEntry::from(record);
            self.cache.upsert(entry.clone());
            if seen.insert(entry.identifier.clone()) {
                merged.push(entry);
            }
        }

        // Pick up richer fields that arrived for entries already in the set.
        for entry in &mut merged {
            if let Some(fresh) = self.cache.get(&entry.identifier) {
                *entry = fresh;
            }
        }

        rank(&mut merged, query);
        merged.truncate(limit);
        tracing::debug!(query, results = merged.len(), "suggestion search finished");
        merged
    }

    async fn run_provider(
        &self,
        provider: &dyn SearchProvider,
        query: &str,
        limit: usize,
    ) -> Vec<ProfileRecord> {
        match provider.search_by_text(query, limit).await {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(provider = provider.name(), query, error = %e, "search provider failed");
                metrics::counter!("ladle_search_provider_failures_total", "provider" => provider.name())
                    .increment(1);
                Vec::new()
            }
        }
    }
}

fn starts_with_query(entry: &SuggestionEntry, needle: &str) -> bool {
    entry.display_name.to_lowercase().starts_with(needle)
        || entry.handle.to_lowercase().starts_with(needle)
}

/// Prefix matches on name or handle first, then case-insensitive name
/// order. Entries that matched nothing (network results the provider
/// matched on other fields) rank with the non-prefix group.
pub fn rank(entries: &mut [SuggestionEntry], query: &str) {
    let needle = query.to_lowercase();
    entries.sort_by_cached_key(|entry| {
        (
            !starts_with_query(entry, &needle),
            entry.label().to_lowercase(),
            entry.identifier.clone(),
        )
    });
}

/// Comparison used by [`rank`], for hosts merging their own lists.
pub fn compare(a: &SuggestionEntry, b: &SuggestionEntry, query: &str) -> Ordering {
    let needle = query.to_lowercase();
    (!starts_with_query(a, &needle))
        .cmp(&!starts_with_query(b, &needle))
        .then_with(|| a.label().to_lowercase().cmp(&b.label().to_lowercase()))
        .then_with(|| a.identifier.cmp(&b.identifier))
}

#[cfg(test)]
mod tests {
    use futures_util::FutureExt;
    use futures_util::future::BoxFuture;
    use ladle_common::ProviderError;

    use super::*;

    struct Fixed {
        name: &'static str,
        result: Result<Vec<ProfileRecord>, ProviderError>,
    }

    impl SearchProvider for Fixed {
        fn name(&self) -> &'static str {
            self.name
        }

        fn search_by_text<'a>(
            &'a self,
            _query: &'a str,
            _limit: usize,
        ) -> BoxFuture<'a, Result<Vec<ProfileRecord>, ProviderError>> {
            let result = self.result.clone();
            async move { result }.boxed()
        }
    }

    fn provider(name: &'static str, records: Vec<ProfileRecord>) -> Arc<dyn SearchProvider> {
        Arc::new(Fixed {
            name,
            result: Ok(records),
        })
    }

    fn failing(name: &'static str) -> Arc<dyn SearchProvider> {
        Arc::new(Fixed {
            name,
            result: Err(ProviderError::network("down")),
        })
    }

    fn names(entries: &[SuggestionEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.display_name.as_str()).collect()
    }

    #[test]
    fn test_rank_prefix_before_substring() {
        let cache = Arc::new(ProfileCache::new());
        for (id, name) in [("1", "Balaji"), ("2", "Alice"), ("3", "Alan"), ("4", "Bob")] {
            cache.upsert(SuggestionEntry::new(id, name));
        }
        let pipeline = SuggestionPipeline::new(cache, provider("kw", vec![]));
        let results = pipeline.cached_matches("al", 10);
        assert_eq!(names(&results), ["Alan", "Alice", "Balaji"]);
    }

    #[test]
    fn test_rank_uses_handle_prefix() {
        let mut entries = vec![
            SuggestionEntry::new("1", "Zed").with_handle("xy"),
            SuggestionEntry::new("2", "Ann").with_handle("b-xy"),
            SuggestionEntry::new("3", "Mia").with_handle("xylo"),
        ];
        rank(&mut entries, "XY");
        assert_eq!(names(&entries), ["Mia", "Zed", "Ann"]);
        assert_eq!(compare(&entries[0], &entries[2], "xy"), Ordering::Less);
    }

    #[tokio::test]
    async fn test_search_merges_and_dedupes() {
        let cache = Arc::new(ProfileCache::new());
        cache.upsert(SuggestionEntry::new("a", "Alice"));

        let keyword = provider(
            "kw",
            vec![
                ProfileRecord::new("a", "Alice").with_avatar("pic"),
                ProfileRecord::new("b", "Alfred"),
            ],
        );
        let directory = provider("dir", vec![ProfileRecord::new("b", "Alfred"), ProfileRecord::new("c", "Sal")]);
        let pipeline = SuggestionPipeline::new(cache.clone(), keyword).with_directory(directory);

        let results = pipeline.search("al", 10).await;
        assert_eq!(names(&results), ["Alfred", "Alice", "Sal"]);
        // Richer field merged into the cache and the result.
        assert_eq!(results[1].avatar_ref.as_deref(), Some("pic"));
        assert_eq!(cache.len(), 3);
    }

    #[tokio::test]
    async fn test_search_truncates() {
        let records = (0..5)
            .map(|i| ProfileRecord::new(format!("id{i}"), format!("al{i}")))
            .collect();
        let pipeline = SuggestionPipeline::new(Arc::new(ProfileCache::new()), provider("kw", records));
        assert_eq!(names(&pipeline.search("al", 2).await), ["al0", "al1"]);
    }

    #[tokio::test]
    async fn test_directory_needs_min_query_len() {
        let pipeline = SuggestionPipeline::new(Arc::new(ProfileCache::new()), provider("kw", vec![]))
            .with_directory(provider("dir", vec![ProfileRecord::new("d", "Dana")]));
        assert!(pipeline.search("d", 10).await.is_empty());
        assert_eq!(names(&pipeline.search("da", 10).await), ["Dana"]);
    }

    #[tokio::test]
    async fn test_provider_failure_degrades() {
        let cache = Arc::new(ProfileCache::new());
        cache.upsert(SuggestionEntry::new("a", "Alice"));

        let pipeline = SuggestionPipeline::new(cache.clone(), failing("kw"))
            .with_directory(provider("dir", vec![ProfileRecord::new("b", "Alba")]));
        assert_eq!(names(&pipeline.search("al", 10).await), ["Alba", "Alice"]);

        let offline = Arc::new(ProfileCache::new());
        offline.upsert(SuggestionEntry::new("a", "Alice"));
        let pipeline =
            SuggestionPipeline::new(offline, failing("kw")).with_directory(failing("dir"));
        assert_eq!(names(&pipeline.search("al", 10).await), ["Alice"]);
    }

    #[tokio::test]
    async fn test_empty_query_skips_network() {
        let pipeline = SuggestionPipeline::new(
            Arc::new(ProfileCache::new()),
            provider("kw", vec![ProfileRecord::new("x", "Xena")]),
        );
        assert!(pipeline.search("", 10).await.is_empty());
    }
}
