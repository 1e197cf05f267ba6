//! Turning a finished surface into the artifacts the publisher receives.

use std::collections::BTreeSet;

use ladle_common::PublishDraft;
use ladle_editor_core::{ReferenceSyntax, SurfaceTree, canonicalize, parse_references, serialize};
use smol_str::SmolStr;

/// Canonical content plus every referenced identifier.
///
/// Mentions come from two places: pills in the tree, and canonical or bare
/// references that are still plain text (for instance one that was being
/// typed across the caret). The content is canonicalized, so both end up
/// as `scheme:identifier`.
pub fn draft_from_tree(tree: &SurfaceTree, syntax: &ReferenceSyntax) -> PublishDraft {
    let content = canonicalize(&serialize(tree), syntax);

    let mut mentioned: BTreeSet<SmolStr> = tree
        .mentions()
        .into_iter()
        .map(|m| SmolStr::new(m.reference.identifier()))
        .collect();
    mentioned.extend(
        parse_references(&content, syntax)
            .into_iter()
            .map(|m| SmolStr::new(m.reference.identifier())),
    );

    PublishDraft { content, mentioned }
}
