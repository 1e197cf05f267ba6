//! Composer input controller.
//!
//! Wires key, text and paste events on a [`SurfaceDocument`] to query
//! detection, debounced suggestion search and atomic mention editing. The
//! dropdown state is published through a `tokio::sync::watch` channel.
//!
//! Timers and searches run as tokio tasks, so the controller must be driven
//! from inside a runtime.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use ladle_common::{ComposerConfig, ComposerError, PublishDraft, Publisher, SuggestionEntry};
use ladle_editor_core::{
    Direction, Key, KeydownResult, PlainSurface, ReferenceSyntax, SurfaceAction,
    SurfaceDocument, execute_action,
};
use n0_future::task::JoinHandle;
use smol_str::SmolStr;
use tokio::sync::watch;

use crate::publish::draft_from_tree;
use crate::state::ComposerState;
use crate::suggest::SuggestionPipeline;

/// Codec settings derived from the composer config.
pub fn reference_syntax(config: &ComposerConfig) -> ReferenceSyntax {
    ReferenceSyntax::new(config.scheme.clone())
        .with_prefixes(config.identifier_prefixes.iter().cloned())
        .with_shortening(config.shorten_head, config.shorten_tail)
}

/// State shared with timer and search tasks.
struct Shared {
    state: watch::Sender<ComposerState>,
    /// Bumped on every query change. A search result is applied only if
    /// its generation is still current.
    generation: AtomicU64,
    alive: AtomicBool,
}

impl Shared {
    fn is_current(&self, generation: u64) -> bool {
        self.alive.load(Ordering::Acquire) && self.generation.load(Ordering::Acquire) == generation
    }

    /// Run `f` on the state if `generation` is current and the dropdown is
    /// still open for `query`. Returns whether it ran.
    fn apply(&self, generation: u64, query: &str, f: impl FnOnce(&mut ComposerState)) -> bool {
        if !self.is_current(generation) {
            return false;
        }
        let mut applied = false;
        self.state.send_if_modified(|state| {
            if state.suggestions_open && state.query_text == query {
                f(state);
                applied = true;
            }
            applied
        });
        applied
    }
}

/// One controller per editable surface.
pub struct ComposerController<D: SurfaceDocument = PlainSurface> {
    doc: D,
    pipeline: SuggestionPipeline,
    config: ComposerConfig,
    syntax: ReferenceSyntax,
    shared: Arc<Shared>,
    pending: Option<JoinHandle<()>>,
}

impl ComposerController<PlainSurface> {
    pub fn new(pipeline: SuggestionPipeline, config: ComposerConfig) -> Self {
        Self::with_document(PlainSurface::new(), pipeline, config)
    }
}

impl<D: SurfaceDocument> ComposerController<D> {
    pub fn with_document(doc: D, pipeline: SuggestionPipeline, config: ComposerConfig) -> Self {
        let (state, _) = watch::channel(ComposerState::default());
        Self {
            doc,
            pipeline: pipeline.with_config(&config),
            syntax: reference_syntax(&config),
            config,
            shared: Arc::new(Shared {
                state,
                generation: AtomicU64::new(0),
                alive: AtomicBool::new(true),
            }),
            pending: None,
        }
    }

    pub fn document(&self) -> &D {
        &self.doc
    }

    /// Direct access for hosts that mutate the surface themselves. Call
    /// [`handle_input`](Self::handle_input) afterwards.
    pub fn document_mut(&mut self) -> &mut D {
        &mut self.doc
    }

    pub fn syntax(&self) -> &ReferenceSyntax {
        &self.syntax
    }

    pub fn subscribe(&self) -> watch::Receiver<ComposerState> {
        self.shared.state.subscribe()
    }

    /// Snapshot of the dropdown state.
    pub fn state(&self) -> ComposerState {
        self.shared.state.borrow().clone()
    }

    pub fn is_alive(&self) -> bool {
        self.shared.alive.load(Ordering::Acquire)
    }

    /// Load canonical text (a saved draft, a quoted reply) into the surface.
    pub fn load(&mut self, canonical: &str) {
        let cache = self.pipeline.cache().clone();
        self.doc.load_canonical(canonical, &self.syntax, cache.as_ref());
        self.handle_input();
    }

    /// React to any change of content or caret: promote raw references to
    /// pills, then open, update or close the query.
    pub fn handle_input(&mut self) {
        if !self.is_alive() {
            return;
        }
        let cache = self.pipeline.cache().clone();
        if self.doc.promote_references(&self.syntax, cache.as_ref()) {
            tracing::debug!("promoted raw references to mentions");
        }
        self.refresh_query();
    }

    /// Typed text at the caret.
    pub fn handle_text(&mut self, text: &str) -> bool {
        if !self.is_alive() {
            return false;
        }
        let changed = execute_action(&mut self.doc, &SurfaceAction::insert(text));
        if changed {
            self.handle_input();
        }
        changed
    }

    /// Clipboard paste. While alive the default paste is always suppressed;
    /// the sanitized plain text is inserted instead.
    pub fn handle_paste(&mut self, text: &str) -> KeydownResult {
        if !self.is_alive() {
            return KeydownResult::NotHandled;
        }
        if execute_action(&mut self.doc, &SurfaceAction::Paste(text.to_string())) {
            self.handle_input();
        }
        KeydownResult::Handled
    }

    pub fn handle_key(&mut self, key: &Key) -> KeydownResult {
        if !self.is_alive() {
            return KeydownResult::NotHandled;
        }

        let state = self.state();
        let has_suggestions = state.suggestions_open && !state.suggestions.is_empty();

        match key {
            Key::ArrowDown if has_suggestions => {
                self.shared.state.send_modify(|s| {
                    s.select_next();
                });
                KeydownResult::Handled
            }
            Key::ArrowUp if has_suggestions => {
                self.shared.state.send_modify(|s| {
                    s.select_previous();
                });
                KeydownResult::Handled
            }
            Key::Enter | Key::Tab if has_suggestions => {
                self.accept_selected();
                KeydownResult::Handled
            }
            Key::Escape if state.suggestions_open => {
                self.close_query();
                KeydownResult::Handled
            }
            Key::Backspace => self.delete(Direction::Backward),
            Key::Delete => self.delete(Direction::Forward),
            Key::Character(text) => {
                if self.handle_text(text) {
                    KeydownResult::Handled
                } else {
                    KeydownResult::NotHandled
                }
            }
            _ => KeydownResult::NotHandled,
        }
    }

    fn delete(&mut self, direction: Direction) -> KeydownResult {
        let changed = self.doc.delete_atomic(direction)
            || execute_action(&mut self.doc, &SurfaceAction::delete(direction));
        if changed {
            self.handle_input();
            KeydownResult::Handled
        } else {
            KeydownResult::NotHandled
        }
    }

    /// Insert the highlighted suggestion. False if nothing is selected.
    pub fn accept_selected(&mut self) -> bool {
        let Some(entry) = self.state().selected().cloned() else {
            return false;
        };
        self.accept(entry)
    }

    /// Replace the open query with a pill for `entry`.
    pub fn accept(&mut self, entry: SuggestionEntry) -> bool {
        let reference = self.syntax.reference(entry.identifier.clone());
        let label = SmolStr::new(entry.label());
        let inserted = self
            .doc
            .insert_mention(reference, label, self.config.trailing_space);
        if inserted {
            tracing::debug!(identifier = %entry.identifier, "mention inserted");
            // Touch it so it shows up first for an empty query.
            self.pipeline.cache().upsert(entry);
            self.close_query();
        }
        inserted
    }

    fn refresh_query(&mut self) {
        match self.doc.open_query() {
            Some(query) => self.open_query(query.text),
            None => self.close_query(),
        }
    }

    fn open_query(&mut self, query: SmolStr) {
        {
            let state = self.shared.state.borrow();
            if state.suggestions_open && state.query_text == query {
                return;
            }
        }

        let generation = self.shared.generation.fetch_add(1, Ordering::AcqRel) + 1;
        self.cancel_pending();

        // Rows found for the previous query must never be accepted for this
        // one, so the cache pass replaces them before any timer runs.
        let limit = self.config.suggestion_limit;
        let first_pass = if query.is_empty() {
            self.pipeline.recent(limit)
        } else {
            self.pipeline.cached_matches(&query, limit)
        };
        self.shared.state.send_modify(|state| {
            state.open(query.clone());
            state.set_suggestions(first_pass, false);
        });
        tracing::trace!(%query, generation, "query open");

        if query.is_empty() {
            return;
        }

        let shared = self.shared.clone();
        let pipeline = self.pipeline.clone();
        let delay = self.config.debounce();
        self.pending = Some(n0_future::task::spawn(async move {
            n0_future::time::sleep(delay).await;
            if !shared.is_current(generation) {
                return;
            }
            // Detached: the next keystroke aborts the timer, not the search.
            n0_future::task::spawn(run_search(shared, pipeline, query, generation, limit));
        }));
    }

    fn close_query(&mut self) {
        self.cancel_pending();
        if self.shared.state.borrow().is_idle() {
            return;
        }
        self.shared.generation.fetch_add(1, Ordering::AcqRel);
        self.shared.state.send_modify(ComposerState::close);
        tracing::trace!("query closed");
    }

    fn cancel_pending(&mut self) {
        if let Some(timer) = self.pending.take() {
            timer.abort();
        }
    }

    /// Canonical text and referenced identifiers of the current content.
    pub fn submit(&self) -> PublishDraft {
        draft_from_tree(self.doc.tree(), &self.syntax)
    }

    /// Hand the draft to `publisher`, then clear the surface.
    pub async fn publish(&mut self, publisher: &dyn Publisher) -> Result<PublishDraft, ComposerError> {
        if !self.is_alive() {
            return Err(ComposerError::TornDown);
        }
        let draft = self.submit();
        if draft.is_empty() {
            return Err(ComposerError::Empty);
        }
        publisher.publish(draft.clone()).await?;
        tracing::debug!(mentions = draft.mentioned.len(), "draft published");
        self.doc.clear();
        self.close_query();
        Ok(draft)
    }

    /// Cancel the pending timer and make any in-flight search a no-op.
    pub fn teardown(&mut self) {
        if !self.shared.alive.swap(false, Ordering::AcqRel) {
            return;
        }
        self.cancel_pending();
        self.shared.state.send_modify(ComposerState::close);
        tracing::debug!("composer torn down");
    }
}

impl<D: SurfaceDocument> Drop for ComposerController<D> {
    fn drop(&mut self) {
        self.teardown();
    }
}

async fn run_search(
    shared: Arc<Shared>,
    pipeline: SuggestionPipeline,
    query: SmolStr,
    generation: u64,
    limit: usize,
) {
    let first_pass = pipeline.cached_matches(&query, limit);
    shared.apply(generation, &query, |state| {
        state.set_suggestions(first_pass, true)
    });

    metrics::counter!("ladle_suggestion_searches_total").increment(1);
    let results = pipeline.search(&query, limit).await;

    let applied = shared.apply(generation, &query, |state| {
        state.set_suggestions(results, false)
    });
    if !applied {
        tracing::debug!(%query, generation, "discarding stale suggestions");
        metrics::counter!("ladle_stale_results_total").increment(1);
    }
}
