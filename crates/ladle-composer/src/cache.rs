//! Profile suggestion cache.
//!
//! One `ProfileCache` is created by the host and shared by `Arc` with every
//! composer it mounts. Writes are additive upserts, so overlapping preloads
//! and searches can race freely.

use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use ladle_common::{ProfileRecord, ProfileResolver, SuggestionEntry};
use ladle_editor_core::DisplayNames;
use smol_str::SmolStr;

const PRELOAD_IDLE: u8 = 0;
const PRELOAD_RUNNING: u8 = 1;
const PRELOAD_DONE: u8 = 2;

#[derive(Debug)]
struct Slot {
    entry: SuggestionEntry,
    /// Recency stamp, bumped on every upsert.
    touched: u64,
}

/// Identifier → resolved profile, populated by the follow-list preload and
/// by search results.
#[derive(Debug, Default)]
pub struct ProfileCache {
    entries: DashMap<SmolStr, Slot>,
    clock: AtomicU64,
    preload: AtomicU8,
    /// Bumped by `destroy`. A preload started under an older epoch stops
    /// writing.
    epoch: AtomicU64,
}

/// What a preload call ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreloadOutcome {
    /// Another call already loaded, or is loading, the follow list.
    Skipped,
    /// Follow list fetched. Counts are profiles upserted and batches that
    /// failed.
    Loaded { profiles: usize, failed_batches: usize },
    /// The follow list itself could not be fetched. A later call retries.
    Failed,
    /// The cache was destroyed while the preload ran. Nothing further was
    /// written.
    Abandoned,
}

impl ProfileCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every entry and forget that the follow list was loaded.
    pub fn destroy(&self) {
        self.epoch.fetch_add(1, Ordering::AcqRel);
        let dropped = self.entries.len();
        self.entries.clear();
        self.preload.store(PRELOAD_IDLE, Ordering::Release);
        tracing::debug!(dropped, "profile cache destroyed");
    }

    fn epoch_is(&self, epoch: u64) -> bool {
        self.epoch.load(Ordering::Acquire) == epoch
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, identifier: &str) -> Option<SuggestionEntry> {
        self.entries
            .get(identifier)
            .map(|slot| slot.entry.clone())
    }

    /// Insert `entry`, or merge its non-empty fields into the known one.
    pub fn upsert(&self, entry: SuggestionEntry) {
        let touched = self.clock.fetch_add(1, Ordering::Relaxed) + 1;
        match self.entries.entry(entry.identifier.clone()) {
            Entry::Occupied(mut occupied) => {
                let slot = occupied.get_mut();
                slot.entry.merge_from(&entry);
                slot.touched = touched;
            }
            Entry::Vacant(vacant) => {
                vacant.insert(Slot { entry, touched });
            }
        }
    }

    pub fn upsert_records(&self, records: impl IntoIterator<Item = ProfileRecord>) -> usize {
        let mut count = 0;
        for record in records {
            if record.identifier.is_empty() {
                continue;
            }
            self.upsert(record.into());
            count += 1;
        }
        count
    }

    /// Entries whose display name or handle contains `query`,
    /// case-insensitively. An empty query matches everything.
    pub fn matching(&self, query: &str) -> Vec<SuggestionEntry> {
        let needle = query.to_lowercase();
        self.entries
            .iter()
            .filter(|slot| {
                slot.entry.display_name.to_lowercase().contains(&needle)
                    || slot.entry.handle.to_lowercase().contains(&needle)
            })
            .map(|slot| slot.entry.clone())
            .collect()
    }

    /// Most recently touched entries first.
    pub fn recent(&self, limit: usize) -> Vec<SuggestionEntry> {
        let mut stamped: Vec<(u64, SuggestionEntry)> = self
            .entries
            .iter()
            .map(|slot| (slot.touched, slot.entry.clone()))
            .collect();
        stamped.sort_by(|a, b| b.0.cmp(&a.0));
        stamped
            .into_iter()
            .take(limit)
            .map(|(_, entry)| entry)
            .collect()
    }

    pub fn is_preloaded(&self) -> bool {
        self.preload.load(Ordering::Acquire) == PRELOAD_DONE
    }

    /// Fill the cache from `owner`'s follow list, once per cache lifetime.
    ///
    /// Profiles are resolved in sequential batches of `batch_size`. A failed
    /// batch is logged and skipped. If the follow list itself cannot be
    /// fetched the guard is released so a later call can retry. A
    /// `destroy` while this runs ends the lifetime it belongs to: remaining
    /// batches are dropped and the guard is left to the new lifetime.
    pub async fn preload_from_follow_list(
        &self,
        owner: &str,
        resolver: &dyn ProfileResolver,
        batch_size: usize,
    ) -> PreloadOutcome {
        let epoch = self.epoch.load(Ordering::Acquire);
        if self
            .preload
            .compare_exchange(
                PRELOAD_IDLE,
                PRELOAD_RUNNING,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_err()
        {
            return PreloadOutcome::Skipped;
        }

        let follows = match resolver.fetch_follow_list(owner).await {
            Ok(follows) => follows,
            Err(e) => {
                tracing::warn!(owner, error = %e, "failed to fetch follow list");
                metrics::counter!("ladle_preload_failures_total").increment(1);
                if !self.epoch_is(epoch) {
                    return PreloadOutcome::Abandoned;
                }
                self.preload.store(PRELOAD_IDLE, Ordering::Release);
                return PreloadOutcome::Failed;
            }
        };

        let mut profiles = 0;
        let mut failed_batches = 0;
        for (i, batch) in follows.chunks(batch_size.max(1)).enumerate() {
            let fetched = resolver.fetch_profiles(batch).await;
            if !self.epoch_is(epoch) {
                tracing::debug!(owner, batch = i, "cache destroyed during preload");
                return PreloadOutcome::Abandoned;
            }
            match fetched {
                Ok(records) => profiles += self.upsert_records(records),
                Err(e) => {
                    failed_batches += 1;
                    tracing::warn!(batch = i, size = batch.len(), error = %e, "profile batch failed, skipping");
                    metrics::counter!("ladle_preload_batch_failures_total").increment(1);
                }
            }
        }

        if !self.epoch_is(epoch) {
            return PreloadOutcome::Abandoned;
        }
        self.preload.store(PRELOAD_DONE, Ordering::Release);
        tracing::debug!(
            owner,
            follows = follows.len(),
            profiles,
            failed_batches,
            "follow list preloaded"
        );
        PreloadOutcome::Loaded {
            profiles,
            failed_batches,
        }
    }
}

impl DisplayNames for ProfileCache {
    fn display_name(&self, identifier: &str) -> Option<SmolStr> {
        self.entries
            .get(identifier)
            .map(|slot| slot.entry.display_name.clone())
            .filter(|name| !name.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use futures_util::FutureExt;
    use futures_util::future::BoxFuture;
    use ladle_common::ProviderError;

    use super::*;

    #[derive(Default)]
    struct Resolver {
        follows: Vec<SmolStr>,
        fail_follows: bool,
        fail_batch: Option<usize>,
        batch_delay: Duration,
        calls: Mutex<Vec<usize>>,
    }

    impl ProfileResolver for Resolver {
        fn fetch_follow_list<'a>(
            &'a self,
            _owner: &'a str,
        ) -> BoxFuture<'a, Result<Vec<SmolStr>, ProviderError>> {
            async move {
                if self.fail_follows {
                    Err(ProviderError::network("relay closed"))
                } else {
                    Ok(self.follows.clone())
                }
            }
            .boxed()
        }

        fn fetch_profiles<'a>(
            &'a self,
            identifiers: &'a [SmolStr],
        ) -> BoxFuture<'a, Result<Vec<ProfileRecord>, ProviderError>> {
            async move {
                let call = {
                    let mut calls = self.calls.lock().unwrap();
                    calls.push(identifiers.len());
                    calls.len() - 1
                };
                if !self.batch_delay.is_zero() {
                    tokio::time::sleep(self.batch_delay).await;
                }
                if self.fail_batch == Some(call) {
                    return Err(ProviderError::network("timeout"));
                }
                Ok(identifiers
                    .iter()
                    .map(|id| ProfileRecord::new(id.clone(), format!("name-{id}")))
                    .collect())
            }
            .boxed()
        }
    }

    fn follows(n: usize) -> Vec<SmolStr> {
        (0..n).map(|i| SmolStr::from(format!("id{i}"))).collect()
    }

    #[test]
    fn test_upsert_merges() {
        let cache = ProfileCache::new();
        cache.upsert(SuggestionEntry {
            identifier: "a".into(),
            display_name: "Alice".into(),
            handle: "alice".into(),
            avatar_ref: Some("pic".into()),
        });
        cache.upsert(SuggestionEntry::new("a", ""));
        let entry = cache.get("a").unwrap();
        assert_eq!(entry.display_name, "Alice");
        assert_eq!(entry.avatar_ref.as_deref(), Some("pic"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_matching_is_case_insensitive_substring() {
        let cache = ProfileCache::new();
        cache.upsert(SuggestionEntry::new("1", "Alan"));
        cache.upsert(SuggestionEntry::new("2", "Balaji"));
        cache.upsert(SuggestionEntry::new("3", "Bob").with_handle("ALbert"));
        cache.upsert(SuggestionEntry::new("4", "Carol"));

        let mut ids: Vec<_> = cache
            .matching("aL")
            .into_iter()
            .map(|e| e.identifier)
            .collect();
        ids.sort();
        assert_eq!(ids, ["1", "2", "3"]);
    }

    #[test]
    fn test_recent_orders_by_last_touch() {
        let cache = ProfileCache::new();
        cache.upsert(SuggestionEntry::new("1", "One"));
        cache.upsert(SuggestionEntry::new("2", "Two"));
        cache.upsert(SuggestionEntry::new("3", "Three"));
        cache.upsert(SuggestionEntry::new("1", "One"));

        let ids: Vec<_> = cache.recent(2).into_iter().map(|e| e.identifier).collect();
        assert_eq!(ids, ["1", "3"]);
    }

    #[test]
    fn test_display_names() {
        let cache = ProfileCache::new();
        cache.upsert(SuggestionEntry::new("1", "One"));
        cache.upsert(SuggestionEntry::new("2", "").with_handle("two"));
        assert_eq!(cache.display_name("1").as_deref(), Some("One"));
        assert_eq!(cache.display_name("2"), None);
        assert_eq!(cache.display_name("3"), None);
    }

    #[tokio::test]
    async fn test_preload_batches_and_skips_failures() {
        let cache = ProfileCache::new();
        let resolver = Resolver {
            follows: follows(5),
            fail_batch: Some(1),
            ..Default::default()
        };

        let outcome = cache.preload_from_follow_list("me", &resolver, 2).await;
        assert_eq!(
            outcome,
            PreloadOutcome::Loaded {
                profiles: 3,
                failed_batches: 1
            }
        );
        assert_eq!(*resolver.calls.lock().unwrap(), vec![2, 2, 1]);
        assert!(cache.get("id0").is_some());
        assert!(cache.get("id2").is_none());
        assert!(cache.get("id4").is_some());
        assert!(cache.is_preloaded());

        // Once per lifetime.
        let again = cache.preload_from_follow_list("me", &resolver, 2).await;
        assert_eq!(again, PreloadOutcome::Skipped);
        assert_eq!(resolver.calls.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_preload_failure_releases_guard() {
        let cache = ProfileCache::new();
        let failing = Resolver {
            fail_follows: true,
            ..Default::default()
        };
        assert_eq!(
            cache.preload_from_follow_list("me", &failing, 10).await,
            PreloadOutcome::Failed
        );
        assert!(!cache.is_preloaded());

        let working = Resolver {
            follows: follows(1),
            ..Default::default()
        };
        assert!(matches!(
            cache.preload_from_follow_list("me", &working, 10).await,
            PreloadOutcome::Loaded { profiles: 1, .. }
        ));
    }

    #[tokio::test]
    async fn test_destroy_resets() {
        let cache = ProfileCache::new();
        let resolver = Resolver {
            follows: follows(2),
            ..Default::default()
        };
        cache.preload_from_follow_list("me", &resolver, 10).await;
        assert_eq!(cache.len(), 2);

        cache.destroy();
        assert!(cache.is_empty());
        assert!(!cache.is_preloaded());
    }

    #[tokio::test(start_paused = true)]
    async fn test_destroy_during_preload_discards_it() {
        let cache = ProfileCache::new();
        let resolver = Resolver {
            follows: follows(3),
            batch_delay: Duration::from_millis(500),
            ..Default::default()
        };

        let (outcome, ()) = tokio::join!(
            cache.preload_from_follow_list("old-owner", &resolver, 10),
            async {
                tokio::time::sleep(Duration::from_millis(100)).await;
                cache.destroy();
            }
        );

        assert_eq!(outcome, PreloadOutcome::Abandoned);
        assert!(cache.is_empty());
        assert!(!cache.is_preloaded());

        // The next owner gets a fresh preload.
        let next = Resolver {
            follows: follows(1),
            ..Default::default()
        };
        assert!(matches!(
            cache.preload_from_follow_list("new-owner", &next, 10).await,
            PreloadOutcome::Loaded { profiles: 1, .. }
        ));
        assert!(cache.is_preloaded());
    }
}
