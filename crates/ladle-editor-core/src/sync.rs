//! Editable surface synchronizer.
//!
//! [`render`] and [`serialize`] convert between canonical text and the node
//! tree. They are inverses modulo [`canonicalize`](crate::codec::canonicalize):
//! `serialize(render(canonicalize(t))) == canonicalize(t)`.
//!
//! The caret-aware operations mutate the tree in place and never leave a
//! mention half-edited: a pill is inserted whole, removed whole, or not
//! touched.

use smol_str::SmolStr;

use crate::actions::Direction;
use crate::codec::{
    CanonicalReference, DisplayNames, ReferenceMatch, ReferenceSyntax, parse_references,
    resolve_display_name,
};
use crate::text_helpers::{
    MENTION_PLACEHOLDER, char_len, char_to_byte, is_zero_width_only, open_query_start,
    strip_zero_width,
};
use crate::tree::{Caret, MentionNode, Node, Position, SurfaceTree, breaks_after_group};

/// Build a tree from canonical (or bare) text.
pub fn render(
    text: &str,
    syntax: &ReferenceSyntax,
    names: &(impl DisplayNames + ?Sized),
) -> SurfaceTree {
    let mut nodes = Vec::new();
    let mut last = 0;
    for m in parse_references(text, syntax) {
        push_text_with_breaks(&mut nodes, &text[last..m.byte_range.start]);
        let label = resolve_display_name(&m.reference, names, syntax);
        nodes.push(Node::Mention(MentionNode::new(m.reference, label)));
        last = m.byte_range.end;
    }
    push_text_with_breaks(&mut nodes, &text[last..]);
    SurfaceTree::new(nodes)
}

pub(crate) fn push_text_with_breaks(nodes: &mut Vec<Node>, text: &str) {
    for (i, piece) in text.split('\n').enumerate() {
        if i > 0 {
            nodes.push(Node::LineBreak);
        }
        if !piece.is_empty() {
            nodes.push(Node::Text(piece.to_string()));
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Flatten {
    /// Mentions as their canonical reference.
    Canonical,
    /// Mentions as a placeholder char. Only used to look for an open query.
    Opaque,
}

/// Flatten the tree to canonical text.
pub fn serialize(tree: &SurfaceTree) -> String {
    let mut out = String::new();
    write_nodes(&tree.nodes, &mut out, Flatten::Canonical);
    out
}

fn write_nodes(nodes: &[Node], out: &mut String, mode: Flatten) {
    for (i, node) in nodes.iter().enumerate() {
        match node {
            Node::Text(s) => out.push_str(&strip_zero_width(s)),
            Node::LineBreak => out.push('\n'),
            Node::Mention(m) => match mode {
                Flatten::Canonical => out.push_str(&m.reference.to_smolstr()),
                Flatten::Opaque => out.push(MENTION_PLACEHOLDER),
            },
            Node::Group(children) => {
                if i > 0 {
                    out.push('\n');
                }
                write_nodes(children, out, mode);
                if breaks_after_group(nodes, i) {
                    out.push('\n');
                }
            }
        }
    }
}

/// Canonical text from the start of the surface up to the caret.
///
/// Works on a clone; the live tree is untouched. None if the caret does not
/// resolve against `tree`.
pub fn text_before_caret(tree: &SurfaceTree, caret: &Caret) -> Option<String> {
    let position = tree.resolve(caret)?;
    Some(serialize(&tree.clone_before(&position)))
}

/// An `@query` ending at the caret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenQuery {
    /// Characters after the `@`. May be empty.
    pub text: SmolStr,
}

/// Detect an open `@query` immediately before the caret. A mention between
/// the `@` and the caret closes it.
pub fn query_before_caret(tree: &SurfaceTree, caret: &Caret) -> Option<OpenQuery> {
    let position = tree.resolve(caret)?;
    let mut before = String::new();
    write_nodes(
        &tree.clone_before(&position).nodes,
        &mut before,
        Flatten::Opaque,
    );
    let at = open_query_start(&before)?;
    Some(OpenQuery {
        text: SmolStr::new(&before[at + 1..]),
    })
}

/// A gap right after a text node is the same spot as the end of that text.
fn prefer_text(children: &[Node], position: Position) -> Position {
    match position {
        Position::Between { container, index } if index > 0 => match &children[index - 1] {
            Node::Text(s) => Position::Text {
                container,
                index: index - 1,
                offset: char_len(s),
            },
            _ => Position::Between { container, index },
        },
        other => other,
    }
}

/// Merge the run of text nodes ending at `index` into one node.
/// Returns the new index and the char offset of the old node's start.
fn coalesce_backward(children: &mut Vec<Node>, index: usize) -> (usize, usize) {
    let mut start = index;
    while start > 0 && matches!(children[start - 1], Node::Text(_)) {
        start -= 1;
    }
    if start == index {
        return (index, 0);
    }
    let mut merged = String::new();
    for node in &children[start..index] {
        if let Node::Text(s) = node {
            merged.push_str(s);
        }
    }
    let shift = char_len(&merged);
    if let Some(Node::Text(s)) = children.get(index) {
        merged.push_str(s);
    }
    children.splice(start..=index, [Node::Text(merged)]);
    (start, shift)
}

/// Replace the open query before the caret (if any) with a mention pill,
/// optionally followed by a space. Returns the caret right after the
/// inserted content, or None if the caret does not resolve.
pub fn insert_mention_at_caret(
    tree: &mut SurfaceTree,
    caret: &Caret,
    reference: CanonicalReference,
    label: impl Into<SmolStr>,
    trailing_space: bool,
) -> Option<Caret> {
    let position = tree.resolve(caret)?;
    let children = tree.container_mut(position.container())?;
    let position = prefer_text(children, position);
    let mention = Node::Mention(MentionNode::new(reference, label));

    let after_caret = match position {
        Position::Text {
            container,
            index,
            offset,
        } => {
            let (index, shift) = coalesce_backward(children, index);
            let Node::Text(text) = &children[index] else {
                return None;
            };
            let split = char_to_byte(text, offset + shift);
            let mut before = text[..split].to_string();
            let after = &text[split..];
            if let Some(at) = open_query_start(&before) {
                before.truncate(at);
            }

            let mut replacement = Vec::with_capacity(3);
            if !before.is_empty() {
                replacement.push(Node::Text(before));
            }
            replacement.push(mention);
            let mention_index = index + replacement.len() - 1;
            let tail = if trailing_space {
                format!(" {after}")
            } else {
                after.to_string()
            };
            let has_tail = !tail.is_empty();
            if has_tail {
                replacement.push(Node::Text(tail));
            }
            children.splice(index..=index, replacement);

            caret_after_mention(container, mention_index, has_tail, trailing_space)
        }
        Position::Between { container, index } => {
            children.insert(index, mention);
            if trailing_space {
                children.insert(index + 1, Node::Text(" ".to_string()));
            }
            caret_after_mention(container, index, trailing_space, trailing_space)
        }
    };
    Some(after_caret.into_caret())
}

fn caret_after_mention(
    container: Vec<usize>,
    mention_index: usize,
    has_tail: bool,
    trailing_space: bool,
) -> Position {
    if has_tail {
        Position::Text {
            container,
            index: mention_index + 1,
            offset: usize::from(trailing_space),
        }
    } else {
        Position::Between {
            container,
            index: mention_index + 1,
        }
    }
}

/// If the caret sits right next to a mention (ignoring empty or zero-width
/// text between them), remove the whole mention and return true. Otherwise
/// leave the tree alone and return false so the caller's default deletion
/// runs.
pub fn delete_atomic_boundary(tree: &mut SurfaceTree, caret: &mut Caret, direction: Direction) -> bool {
    let Some(position) = tree.resolve(caret) else {
        return false;
    };
    let Some(children) = tree.container_mut(position.container()) else {
        return false;
    };

    // Where the neighbour scan starts, and whether the caret's own text
    // already has real content on that side.
    let scan_from = match (&position, direction) {
        (Position::Text { index, offset, .. }, Direction::Backward) => {
            let Some(Node::Text(s)) = children.get(*index) else {
                return false;
            };
            if !is_zero_width_only(&s[..char_to_byte(s, *offset)]) {
                return false;
            }
            *index
        }
        (Position::Text { index, offset, .. }, Direction::Forward) => {
            let Some(Node::Text(s)) = children.get(*index) else {
                return false;
            };
            if !is_zero_width_only(&s[char_to_byte(s, *offset)..]) {
                return false;
            }
            index + 1
        }
        (Position::Between { index, .. }, _) => *index,
    };

    let Some(target) = find_adjacent_mention(children, scan_from, direction) else {
        return false;
    };
    children.remove(target);

    let mut position = position;
    if target < position.index() {
        *position.index_mut() -= 1;
    }
    tracing::trace!(index = target, ?direction, "removed mention at caret boundary");
    *caret = position.into_caret();
    true
}

fn find_adjacent_mention(children: &[Node], from: usize, direction: Direction) -> Option<usize> {
    let is_skippable = |node: &Node| matches!(node, Node::Text(s) if is_zero_width_only(s));
    match direction {
        Direction::Backward => {
            let mut j = from;
            while j > 0 {
                j -= 1;
                match &children[j] {
                    Node::Mention(_) => return Some(j),
                    node if is_skippable(node) => continue,
                    _ => return None,
                }
            }
            None
        }
        Direction::Forward => {
            for (j, node) in children.iter().enumerate().skip(from) {
                match node {
                    Node::Mention(_) => return Some(j),
                    node if is_skippable(node) => continue,
                    _ => return None,
                }
            }
            None
        }
    }
}

/// Turn raw references typed or pasted as text into mention pills.
///
/// Each run of adjacent text nodes is scanned as one string. When the caret
/// is inside a run, a marker splits the run there and each side is scanned
/// separately, so a reference still being typed across the caret stays text
/// and the caret keeps its place relative to the surrounding content.
/// Applying this twice is the same as applying it once.
pub fn promote_raw_references(
    tree: &mut SurfaceTree,
    caret: &mut Caret,
    syntax: &ReferenceSyntax,
    names: &(impl DisplayNames + ?Sized),
) -> bool {
    let mut position = tree.resolve(caret);
    let changed = promote_in(&mut tree.nodes, &mut Vec::new(), &mut position, syntax, names);
    if let (true, Some(position)) = (changed, position) {
        *caret = position.into_caret();
    }
    changed
}

fn promote_in(
    nodes: &mut Vec<Node>,
    path: &mut Vec<usize>,
    caret: &mut Option<Position>,
    syntax: &ReferenceSyntax,
    names: &(impl DisplayNames + ?Sized),
) -> bool {
    let mut changed = false;

    // Groups first: recursing never changes this container's length.
    for i in 0..nodes.len() {
        if let Node::Group(children) = &mut nodes[i] {
            path.push(i);
            changed |= promote_in(children, path, caret, syntax, names);
            path.pop();
        }
    }

    // Runs back to front so earlier indices stay valid.
    let mut end = nodes.len();
    while end > 0 {
        if !matches!(nodes[end - 1], Node::Text(_)) {
            end -= 1;
            continue;
        }
        let mut start = end - 1;
        while start > 0 && matches!(nodes[start - 1], Node::Text(_)) {
            start -= 1;
        }
        changed |= promote_run(nodes, path, start..end, caret, syntax, names);
        end = start;
    }

    changed
}

fn promote_run(
    nodes: &mut Vec<Node>,
    path: &[usize],
    run: std::ops::Range<usize>,
    caret: &mut Option<Position>,
    syntax: &ReferenceSyntax,
    names: &(impl DisplayNames + ?Sized),
) -> bool {
    let mut joined = String::new();
    let mut marker = None;
    for i in run.clone() {
        let Node::Text(s) = &nodes[i] else {
            continue;
        };
        match caret.as_ref() {
            Some(Position::Text {
                container,
                index,
                offset,
            }) if container.as_slice() == path && *index == i => {
                marker = Some(joined.len() + char_to_byte(s, *offset));
            }
            Some(Position::Between { container, index })
                if container.as_slice() == path && *index == i && i > run.start =>
            {
                marker = Some(joined.len());
            }
            _ => {}
        }
        joined.push_str(s);
    }

    let split = marker.unwrap_or(joined.len());
    let (left, right) = joined.split_at(split);
    let left_matches = parse_references(left, syntax);
    let right_matches = parse_references(right, syntax);
    if left_matches.is_empty() && right_matches.is_empty() {
        return false;
    }

    let mut rebuilt = Vec::new();
    push_promoted(&mut rebuilt, left, left_matches, syntax, names);
    let marker_caret = marker.map(|_| match rebuilt.last() {
        Some(Node::Text(s)) => Position::Text {
            container: path.to_vec(),
            index: run.start + rebuilt.len() - 1,
            offset: char_len(s),
        },
        _ => Position::Between {
            container: path.to_vec(),
            index: run.start + rebuilt.len(),
        },
    });
    push_promoted(&mut rebuilt, right, right_matches, syntax, names);

    let old_len = run.len();
    let new_len = rebuilt.len();
    let run_end = run.end;
    nodes.splice(run, rebuilt);

    if let Some(position) = marker_caret {
        *caret = Some(position);
    } else if let Some(position) = caret.as_mut() {
        shift_after(position, path, run_end, new_len as isize - old_len as isize);
    }
    true
}

fn push_promoted(
    out: &mut Vec<Node>,
    text: &str,
    matches: Vec<ReferenceMatch>,
    syntax: &ReferenceSyntax,
    names: &(impl DisplayNames + ?Sized),
) {
    let mut last = 0;
    for m in matches {
        if m.byte_range.start > last {
            out.push(Node::Text(text[last..m.byte_range.start].to_string()));
        }
        let label = resolve_display_name(&m.reference, names, syntax);
        out.push(Node::Mention(MentionNode::new(m.reference, label)));
        last = m.byte_range.end;
    }
    if last < text.len() {
        out.push(Node::Text(text[last..].to_string()));
    }
}

/// Adjust a position for a splice in container `path` that changed the
/// number of children at or after `at` by `delta`.
fn shift_after(position: &mut Position, path: &[usize], at: usize, delta: isize) {
    let shift = |i: &mut usize| {
        if *i >= at {
            *i = i.saturating_add_signed(delta);
        }
    };
    let depth = path.len();
    if position.container() == path {
        shift(position.index_mut());
    } else if position.container().len() > depth && position.container().starts_with(path) {
        shift(&mut position.container_mut()[depth]);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::codec::{canonicalize, nip19};

    fn npub(seed: u8) -> String {
        nip19::encode("npub", &[seed; 32]).unwrap()
    }

    fn syntax() -> ReferenceSyntax {
        ReferenceSyntax::default()
    }

    fn names() -> HashMap<SmolStr, SmolStr> {
        let mut names = HashMap::new();
        names.insert(SmolStr::from(npub(1)), SmolStr::new("Alice"));
        names
    }

    #[test]
    fn test_render_serialize_round_trip() {
        let a = npub(1);
        let b = npub(2);
        let texts = [
            String::new(),
            "plain".to_string(),
            format!("hi nostr:{a}"),
            format!("nostr:{a}\n\nnostr:{b} and more\n"),
            format!("(nostr:{a}),nostr:{b}."),
            "broken nostr:npub1zzz and @abc123".to_string(),
            "<b>&amp;</b>".to_string(),
        ];
        for t in texts {
            assert_eq!(serialize(&render(&t, &syntax(), &names())), t, "{t:?}");
        }
    }

    #[test]
    fn test_round_trip_through_canonicalize() {
        let a = npub(1);
        let t = format!("hey @{a}\u{200B}!");
        let canonical = canonicalize(&t, &syntax());
        let tree = render(&t, &syntax(), &names());
        assert_eq!(serialize(&tree), canonical);
        assert_eq!(serialize(&render(&canonical, &syntax(), &names())), canonical);
    }

    #[test]
    fn test_render_shapes_tree() {
        let a = npub(1);
        let tree = render(&format!("hi nostr:{a}\nbye"), &syntax(), &names());
        assert_eq!(tree.nodes.len(), 4);
        assert_eq!(tree.nodes[0], Node::text("hi "));
        assert!(matches!(&tree.nodes[1], Node::Mention(m) if m.label == "Alice"));
        assert_eq!(tree.nodes[2], Node::LineBreak);
        assert_eq!(tree.visible_text(), "hi @Alice\nbye");
    }

    #[test]
    fn test_empty_surface() {
        assert_eq!(serialize(&render("", &syntax(), &())), "");
        assert_eq!(serialize(&SurfaceTree::default()), "");
    }

    #[test]
    fn test_serialize_groups_and_adjacent_text() {
        let tree = SurfaceTree::new(vec![
            Node::Group(vec![Node::text("one"), Node::text("\u{200B}"), Node::text(" two")]),
            Node::Group(vec![Node::text("three")]),
            Node::Group(vec![]),
        ]);
        assert_eq!(serialize(&tree), "one two\nthree\n");
    }

    #[test]
    fn test_group_followed_by_text() {
        let tree = SurfaceTree::new(vec![
            Node::text("x"),
            Node::Group(vec![Node::text("a")]),
            Node::text("b @q"),
        ]);
        assert_eq!(serialize(&tree), "x\na\nb @q");
        assert_eq!(tree.visible_text(), "x\na\nb @q");

        // Query detection sees the same boundaries as serialization.
        let caret = Caret::new(vec![2], 4);
        assert_eq!(text_before_caret(&tree, &caret).unwrap(), "x\na\nb @q");
        assert_eq!(query_before_caret(&tree, &caret).unwrap().text, "q");

        let tree = SurfaceTree::new(vec![
            Node::Group(vec![Node::text("a@")]),
            Node::text("b"),
        ]);
        assert_eq!(query_before_caret(&tree, &Caret::new(vec![1], 1)), None);
    }

    #[test]
    fn test_text_before_caret() {
        let a = npub(1);
        let tree = render(&format!("x nostr:{a} hello"), &syntax(), &names());
        let caret = Caret::new(vec![2], 3);
        assert_eq!(
            text_before_caret(&tree, &caret).unwrap(),
            format!("x nostr:{a} he")
        );
        assert_eq!(text_before_caret(&tree, &Caret::new(vec![9], 0)), None);
    }

    #[test]
    fn test_query_before_caret() {
        let tree = SurfaceTree::new(vec![Node::text("Hello @ali")]);
        let q = query_before_caret(&tree, &Caret::new(vec![0], 10)).unwrap();
        assert_eq!(q.text, "ali");

        // Caret in the middle of the word: query is what precedes it.
        let q = query_before_caret(&tree, &Caret::new(vec![0], 8)).unwrap();
        assert_eq!(q.text, "a");

        // Whitespace closes it.
        let tree = SurfaceTree::new(vec![Node::text("Hello @ali ")]);
        assert_eq!(query_before_caret(&tree, &Caret::new(vec![0], 11)), None);
    }

    #[test]
    fn test_query_closed_by_mention() {
        let a = npub(1);
        let tree = SurfaceTree::new(vec![
            Node::text("@"),
            Node::mention(syntax().reference(a), "Alice"),
            Node::text("x"),
        ]);
        assert_eq!(query_before_caret(&tree, &Caret::new(vec![2], 1)), None);
    }

    #[test]
    fn test_query_spans_split_text_nodes() {
        let tree = SurfaceTree::new(vec![Node::text("hi @a"), Node::text("li")]);
        let q = query_before_caret(&tree, &Caret::new(vec![1], 2)).unwrap();
        assert_eq!(q.text, "ali");
    }

    #[test]
    fn test_insert_mention_replaces_query() {
        let mut tree = SurfaceTree::new(vec![Node::text("Hello @ali")]);
        let caret = insert_mention_at_caret(
            &mut tree,
            &Caret::new(vec![0], 10),
            CanonicalReference::new("nostr", "abc123"),
            "Alice",
            true,
        )
        .unwrap();

        assert_eq!(tree.visible_text(), "Hello @Alice ");
        assert_eq!(serialize(&tree), "Hello nostr:abc123 ");
        assert_eq!(caret, Caret::new(vec![2], 1));
    }

    #[test]
    fn test_insert_mention_keeps_text_after_caret() {
        let mut tree = SurfaceTree::new(vec![Node::text("cc @al"), Node::text("! thanks")]);
        let caret = insert_mention_at_caret(
            &mut tree,
            &Caret::new(vec![0], 6),
            CanonicalReference::new("nostr", "abc123"),
            "Alice",
            false,
        )
        .unwrap();
        assert_eq!(serialize(&tree), "cc nostr:abc123! thanks");
        assert_eq!(tree.resolve(&caret).unwrap().index(), 2);
    }

    #[test]
    fn test_insert_mention_with_query_split_across_nodes() {
        let mut tree = SurfaceTree::new(vec![Node::text("hey @a"), Node::text("li tail")]);
        let caret = insert_mention_at_caret(
            &mut tree,
            &Caret::new(vec![1], 2),
            CanonicalReference::new("nostr", "abc123"),
            "Alice",
            true,
        )
        .unwrap();
        assert_eq!(serialize(&tree), "hey nostr:abc123  tail");
        assert_eq!(caret, Caret::new(vec![2], 1));
    }

    #[test]
    fn test_insert_mention_in_gap() {
        let a = npub(1);
        let mut tree = SurfaceTree::new(vec![Node::mention(syntax().reference(a.clone()), "Alice")]);
        let caret = insert_mention_at_caret(
            &mut tree,
            &Caret::root(1),
            CanonicalReference::new("nostr", "abc123"),
            "Bob",
            false,
        )
        .unwrap();
        assert_eq!(serialize(&tree), format!("nostr:{a}nostr:abc123"));
        assert_eq!(caret, Caret::root(2));
    }

    #[test]
    fn test_backspace_after_mention_removes_it_whole() {
        let mut tree = SurfaceTree::new(vec![Node::text("Hello @ali")]);
        let mut caret = insert_mention_at_caret(
            &mut tree,
            &Caret::new(vec![0], 10),
            CanonicalReference::new("nostr", "abc123"),
            "Alice",
            false,
        )
        .unwrap();

        assert!(delete_atomic_boundary(&mut tree, &mut caret, Direction::Backward));
        assert_eq!(serialize(&tree), "Hello ");
        assert!(tree.mentions().is_empty());
        assert_eq!(caret, Caret::root(1));
    }

    #[test]
    fn test_delete_skips_zero_width_text() {
        let a = npub(1);
        let mut tree = SurfaceTree::new(vec![
            Node::text("x"),
            Node::mention(syntax().reference(a), "Alice"),
            Node::text("\u{200B}"),
            Node::text("\u{200B}tail"),
        ]);
        let mut caret = Caret::new(vec![3], 1);
        assert!(delete_atomic_boundary(&mut tree, &mut caret, Direction::Backward));
        assert_eq!(serialize(&tree), "xtail");
        assert_eq!(caret, Caret::new(vec![2], 1));
    }

    #[test]
    fn test_delete_forward_before_mention() {
        let a = npub(1);
        let mut tree = SurfaceTree::new(vec![
            Node::text("x"),
            Node::mention(syntax().reference(a), "Alice"),
            Node::text(" y"),
        ]);
        let mut caret = Caret::new(vec![0], 1);
        assert!(delete_atomic_boundary(&mut tree, &mut caret, Direction::Forward));
        assert_eq!(serialize(&tree), "x y");
        assert_eq!(caret, Caret::new(vec![0], 1));
    }

    #[test]
    fn test_delete_not_adjacent_is_noop() {
        let a = npub(1);
        let mut tree = SurfaceTree::new(vec![
            Node::mention(syntax().reference(a), "Alice"),
            Node::text("ab"),
        ]);
        let before = tree.clone();
        let mut caret = Caret::new(vec![1], 1);
        assert!(!delete_atomic_boundary(&mut tree, &mut caret, Direction::Backward));
        assert!(!delete_atomic_boundary(&mut tree, &mut caret, Direction::Forward));
        assert_eq!(tree, before);

        let mut bad = Caret::new(vec![5], 0);
        assert!(!delete_atomic_boundary(&mut tree, &mut bad, Direction::Backward));
    }

    #[test]
    fn test_promote_pasted_reference() {
        let a = npub(1);
        let mut tree = SurfaceTree::new(vec![Node::text(format!("hi @{a} there"))]);
        let mut caret = Caret::new(vec![0], 3 + 1 + a.len() + 6);

        assert!(promote_raw_references(&mut tree, &mut caret, &syntax(), &names()));
        assert_eq!(tree.visible_text(), "hi @Alice there");
        assert_eq!(serialize(&tree), format!("hi nostr:{a} there"));
        // Caret stays at the end of " there".
        assert_eq!(caret, Caret::new(vec![2], 6));
    }

    #[test]
    fn test_promote_is_idempotent() {
        let a = npub(1);
        let b = npub(2);
        let mut tree = SurfaceTree::new(vec![
            Node::text(format!("one nostr:{a} ")),
            Node::text(format!("two @{b}")),
            Node::LineBreak,
            Node::Group(vec![Node::text(format!("@{a}"))]),
        ]);
        let mut caret = Caret::new(vec![1], 4);

        assert!(promote_raw_references(&mut tree, &mut caret, &syntax(), &names()));
        let once = tree.clone();
        let caret_once = caret.clone();

        assert!(!promote_raw_references(&mut tree, &mut caret, &syntax(), &names()));
        assert_eq!(tree, once);
        assert_eq!(caret, caret_once);
        assert_eq!(tree.mentions().len(), 3);
    }

    #[test]
    fn test_promote_leaves_reference_across_caret() {
        let a = npub(1);
        let mut tree = SurfaceTree::new(vec![Node::text(format!("@{a}"))]);
        let mut caret = Caret::new(vec![0], 10);
        assert!(!promote_raw_references(&mut tree, &mut caret, &syntax(), &names()));
        assert!(tree.mentions().is_empty());
    }

    #[test]
    fn test_promote_shifts_caret_after_run() {
        let a = npub(1);
        let mut tree = SurfaceTree::new(vec![
            Node::text(format!("x @{a} y")),
            Node::LineBreak,
            Node::text("tail"),
        ]);
        let mut caret = Caret::new(vec![2], 2);
        assert!(promote_raw_references(&mut tree, &mut caret, &syntax(), &names()));
        // The first run became three nodes.
        assert_eq!(caret, Caret::new(vec![4], 2));
    }

    #[test]
    fn test_promote_shifts_caret_inside_later_group() {
        let a = npub(1);
        let mut tree = SurfaceTree::new(vec![
            Node::text(format!("@{a} y")),
            Node::Group(vec![Node::text("abc")]),
        ]);
        let mut caret = Caret::new(vec![1, 0], 1);
        assert!(promote_raw_references(&mut tree, &mut caret, &syntax(), &names()));
        assert_eq!(caret, Caret::new(vec![2, 0], 1));
    }
}
