//! Dropdown state published by the controller.

use ladle_common::SuggestionEntry;
use smol_str::SmolStr;

/// What the rendering layer needs to draw the suggestion dropdown.
///
/// Only the owning controller mutates it. Invariants:
/// - `selected_index < suggestions.len()` whenever `suggestions` is non-empty
/// - closed implies no suggestions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComposerState {
    /// Characters typed after the `@`.
    pub query_text: SmolStr,
    pub suggestions_open: bool,
    pub suggestions: Vec<SuggestionEntry>,
    pub selected_index: usize,
    /// A network search is in flight for `query_text`.
    pub searching: bool,
}

impl ComposerState {
    /// Open (or keep open) for `query`. Rows belonging to any other query
    /// are dropped.
    pub(crate) fn open(&mut self, query: SmolStr) {
        if !self.suggestions_open || self.query_text != query {
            self.suggestions.clear();
            self.selected_index = 0;
            self.searching = false;
        }
        self.query_text = query;
        self.suggestions_open = true;
    }

    pub(crate) fn close(&mut self) {
        *self = Self::default();
    }

    pub(crate) fn set_suggestions(&mut self, suggestions: Vec<SuggestionEntry>, searching: bool) {
        if !self.suggestions_open {
            return;
        }
        self.suggestions = suggestions;
        self.selected_index = 0;
        self.searching = searching;
    }

    pub(crate) fn select_next(&mut self) -> bool {
        let len = self.suggestions.len();
        if !self.suggestions_open || len == 0 {
            return false;
        }
        self.selected_index = (self.selected_index + 1) % len;
        true
    }

    pub(crate) fn select_previous(&mut self) -> bool {
        let len = self.suggestions.len();
        if !self.suggestions_open || len == 0 {
            return false;
        }
        self.selected_index = (self.selected_index + len - 1) % len;
        true
    }

    pub fn selected(&self) -> Option<&SuggestionEntry> {
        if !self.suggestions_open {
            return None;
        }
        self.suggestions.get(self.selected_index)
    }

    pub fn is_idle(&self) -> bool {
        !self.suggestions_open
    }

    /// Checks the invariants above.
    pub fn is_consistent(&self) -> bool {
        let index_ok = self.suggestions.is_empty() || self.selected_index < self.suggestions.len();
        let closed_ok = self.suggestions_open || self.suggestions.is_empty();
        index_ok && closed_ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three() -> Vec<SuggestionEntry> {
        ["A", "B", "C"]
            .into_iter()
            .map(|n| SuggestionEntry::new(n, n))
            .collect()
    }

    #[test]
    fn test_selection_wraps() {
        let mut state = ComposerState::default();
        state.open("a".into());
        state.set_suggestions(three(), false);

        assert!(state.select_previous());
        assert_eq!(state.selected().unwrap().identifier, "C");
        assert!(state.select_next());
        assert!(state.select_next());
        assert_eq!(state.selected_index, 1);
        assert!(state.is_consistent());
    }

    #[test]
    fn test_new_query_drops_old_rows() {
        let mut state = ComposerState::default();
        state.open("a".into());
        state.set_suggestions(three(), true);
        state.select_next();

        state.open("a".into());
        assert_eq!(state.suggestions.len(), 3);
        assert_eq!(state.selected_index, 1);

        state.open("ab".into());
        assert!(state.suggestions.is_empty());
        assert_eq!(state.selected_index, 0);
        assert!(!state.searching);
        assert!(state.selected().is_none());
    }

    #[test]
    fn test_closed_state_ignores_results() {
        let mut state = ComposerState::default();
        state.set_suggestions(three(), false);
        assert!(state.suggestions.is_empty());
        assert!(!state.select_next());
        assert!(state.selected().is_none());

        state.open("a".into());
        state.set_suggestions(three(), true);
        state.close();
        assert_eq!(state, ComposerState::default());
        assert!(state.is_consistent());
    }
}
