//! ladle-editor-core: mention-aware editing logic without framework dependencies.
//!
//! This crate provides:
//! - `codec` - canonical `scheme:identifier` references, bare `@identifier`
//!   shorthand, display-name resolution
//! - `SurfaceTree` - the editable surface as an explicit node tree, with carets
//! - `sync` - render/serialize between canonical text and the tree, plus the
//!   caret-aware mention operations
//! - `SurfaceDocument` / `PlainSurface` - tree + caret bound together
//! - `execute_action` - default plain-text editing

pub mod actions;
pub mod codec;
pub mod document;
pub mod execute;
pub mod markup;
pub mod sync;
pub mod text_helpers;
pub mod tree;

pub use actions::{Direction, Key, KeydownResult, SurfaceAction};
pub use codec::{
    CanonicalReference, DisplayNames, ReferenceForm, ReferenceMatch, ReferenceSyntax,
    canonicalize, parse_references, resolve_display_name, to_canonical,
};
pub use document::{PlainSurface, SurfaceDocument};
pub use execute::execute_action;
pub use markup::render_markup;
pub use smol_str::SmolStr;
pub use sync::{
    OpenQuery, delete_atomic_boundary, insert_mention_at_caret, promote_raw_references,
    query_before_caret, render, serialize, text_before_caret,
};
pub use tree::{Caret, MentionNode, Node, Position, SurfaceTree};
