//! Surface document trait and the plain in-memory implementation.
//!
//! `SurfaceDocument` is what a host implements to get the synchronizer
//! operations bound to its own tree and caret. [`PlainSurface`] is the
//! DOM-free host used by the composer and in tests.

use smol_str::SmolStr;

use crate::actions::Direction;
use crate::codec::{CanonicalReference, DisplayNames, ReferenceSyntax};
use crate::sync::{
    OpenQuery, delete_atomic_boundary, insert_mention_at_caret, promote_raw_references,
    query_before_caret, render, serialize, text_before_caret,
};
use crate::tree::{Caret, SurfaceTree};

/// An editable surface: a node tree plus an optional caret.
///
/// The caret is absent while the host has no selection (unfocused, or a
/// programmatic mutation collapsed it). Every caret-dependent method is a
/// no-op then.
pub trait SurfaceDocument {
    fn tree(&self) -> &SurfaceTree;

    fn tree_mut(&mut self) -> &mut SurfaceTree;

    fn caret(&self) -> Option<Caret>;

    fn set_caret(&mut self, caret: Option<Caret>);

    // === Provided methods ===

    /// Canonical text of the whole surface.
    fn canonical_text(&self) -> String {
        serialize(self.tree())
    }

    fn is_empty(&self) -> bool {
        self.tree().is_empty()
    }

    fn text_before_caret(&self) -> Option<String> {
        let caret = self.caret()?;
        text_before_caret(self.tree(), &caret)
    }

    fn open_query(&self) -> Option<OpenQuery> {
        let caret = self.caret()?;
        query_before_caret(self.tree(), &caret)
    }

    /// Replace the open query with a mention pill. False without a caret.
    fn insert_mention(
        &mut self,
        reference: CanonicalReference,
        label: SmolStr,
        trailing_space: bool,
    ) -> bool {
        let Some(caret) = self.caret() else {
            return false;
        };
        match insert_mention_at_caret(self.tree_mut(), &caret, reference, label, trailing_space) {
            Some(after) => {
                self.set_caret(Some(after));
                true
            }
            None => false,
        }
    }

    /// Remove a mention adjacent to the caret on the `direction` side.
    fn delete_atomic(&mut self, direction: Direction) -> bool {
        let Some(mut caret) = self.caret() else {
            return false;
        };
        let handled = delete_atomic_boundary(self.tree_mut(), &mut caret, direction);
        if handled {
            self.set_caret(Some(caret));
        }
        handled
    }

    /// Promote raw references in the text to pills, keeping the caret.
    fn promote_references(&mut self, syntax: &ReferenceSyntax, names: &dyn DisplayNames) -> bool {
        let had_caret = self.caret();
        let mut caret = had_caret.clone().unwrap_or_else(|| self.tree().end_caret());
        let changed = promote_raw_references(self.tree_mut(), &mut caret, syntax, names);
        if changed && had_caret.is_some() {
            self.set_caret(Some(caret));
        }
        changed
    }

    /// Replace the content with rendered canonical text, caret at the end.
    fn load_canonical(&mut self, text: &str, syntax: &ReferenceSyntax, names: &dyn DisplayNames) {
        *self.tree_mut() = render(text, syntax, names);
        let end = self.tree().end_caret();
        self.set_caret(Some(end));
    }

    fn clear(&mut self) {
        self.tree_mut().clear();
        self.set_caret(Some(Caret::root(0)));
    }
}

/// In-memory surface.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlainSurface {
    tree: SurfaceTree,
    caret: Option<Caret>,
}

impl PlainSurface {
    /// An empty surface with the caret at the start.
    pub fn new() -> Self {
        Self {
            tree: SurfaceTree::default(),
            caret: Some(Caret::root(0)),
        }
    }

    pub fn from_tree(tree: SurfaceTree, caret: Option<Caret>) -> Self {
        Self { tree, caret }
    }
}

impl SurfaceDocument for PlainSurface {
    fn tree(&self) -> &SurfaceTree {
        &self.tree
    }

    fn tree_mut(&mut self) -> &mut SurfaceTree {
        &mut self.tree
    }

    fn caret(&self) -> Option<Caret> {
        self.caret.clone()
    }

    fn set_caret(&mut self, caret: Option<Caret>) {
        self.caret = caret;
    }
}
