//! The editable surface as an explicit node tree, plus caret addressing.
//!
//! A host (contenteditable bridge, native text view, test harness) mirrors
//! its widget into a [`SurfaceTree`] and reports the caret as a [`Caret`].
//! Everything in [`crate::sync`] works on these two values only.

use smol_str::SmolStr;

use crate::codec::CanonicalReference;
use crate::text_helpers::{char_len, char_to_byte};

/// One node of the surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Editable plain text. May be empty; adjacent text nodes are allowed.
    Text(String),
    /// Native line break (`<br>`).
    LineBreak,
    /// Atomic mention pill. Always a leaf.
    Mention(MentionNode),
    /// Block-level grouping (a `<div>` line in contenteditable hosts).
    Group(Vec<Node>),
}

impl Node {
    pub fn text(s: impl Into<String>) -> Self {
        Node::Text(s.into())
    }

    pub fn mention(reference: CanonicalReference, label: impl Into<SmolStr>) -> Self {
        Node::Mention(MentionNode::new(reference, label))
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Node::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// A mention token: the reference it stands for and the label it shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MentionNode {
    pub reference: CanonicalReference,
    pub label: SmolStr,
}

impl MentionNode {
    pub fn new(reference: CanonicalReference, label: impl Into<SmolStr>) -> Self {
        Self {
            reference,
            label: label.into(),
        }
    }

    /// What the user sees: `@label`.
    pub fn display(&self) -> String {
        format!("@{}", self.label)
    }
}

/// DOM-like caret: a node path from the root and an offset into that node.
///
/// - empty path: `offset` is a child index into the root
/// - path to a `Text`: `offset` is a char offset
/// - path to a `Group`: `offset` is a child index
/// - path to a `Mention` or `LineBreak`: `0` is before it, anything else after
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Caret {
    pub path: Vec<usize>,
    pub offset: usize,
}

impl Caret {
    pub fn new(path: Vec<usize>, offset: usize) -> Self {
        Self { path, offset }
    }

    /// Between root children, before child `index`.
    pub fn root(index: usize) -> Self {
        Self {
            path: Vec::new(),
            offset: index,
        }
    }
}

/// A caret resolved against a concrete tree. Offsets are clamped and
/// positions on atomic leaves are normalized to the gap before or after them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Position {
    /// Inside the text node `container[index]`, `offset` chars in.
    Text {
        container: Vec<usize>,
        index: usize,
        offset: usize,
    },
    /// In the gap before child `index` of `container`.
    Between { container: Vec<usize>, index: usize },
}

impl Position {
    pub fn container(&self) -> &[usize] {
        match self {
            Position::Text { container, .. } | Position::Between { container, .. } => container,
        }
    }

    pub(crate) fn container_mut(&mut self) -> &mut Vec<usize> {
        match self {
            Position::Text { container, .. } | Position::Between { container, .. } => container,
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Position::Text { index, .. } | Position::Between { index, .. } => *index,
        }
    }

    pub(crate) fn index_mut(&mut self) -> &mut usize {
        match self {
            Position::Text { index, .. } | Position::Between { index, .. } => index,
        }
    }

    pub fn into_caret(self) -> Caret {
        match self {
            Position::Text {
                mut container,
                index,
                offset,
            } => {
                container.push(index);
                Caret::new(container, offset)
            }
            Position::Between { container, index } => Caret::new(container, index),
        }
    }
}

/// A group is a block: a newline separates it from the sibling before it,
/// and from a following sibling that is not itself a group.
pub(crate) fn breaks_after_group(nodes: &[Node], index: usize) -> bool {
    nodes
        .get(index + 1)
        .is_some_and(|next| !matches!(next, Node::Group(_)))
}

/// Root of the surface.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SurfaceTree {
    pub nodes: Vec<Node>,
}

impl SurfaceTree {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    pub fn is_empty(&self) -> bool {
        fn empty(nodes: &[Node]) -> bool {
            nodes.iter().all(|n| match n {
                Node::Text(s) => s.is_empty(),
                Node::Group(children) => empty(children),
                Node::LineBreak | Node::Mention(_) => false,
            })
        }
        empty(&self.nodes)
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
    }

    /// Children of the root (empty path) or of the group at `path`.
    pub fn container(&self, path: &[usize]) -> Option<&Vec<Node>> {
        let mut nodes = &self.nodes;
        for &i in path {
            match nodes.get(i)? {
                Node::Group(children) => nodes = children,
                _ => return None,
            }
        }
        Some(nodes)
    }

    pub fn container_mut(&mut self, path: &[usize]) -> Option<&mut Vec<Node>> {
        let mut nodes = &mut self.nodes;
        for &i in path {
            match nodes.get_mut(i)? {
                Node::Group(children) => nodes = children,
                _ => return None,
            }
        }
        Some(nodes)
    }

    /// Resolve a caret. None if its path does not address a node.
    pub fn resolve(&self, caret: &Caret) -> Option<Position> {
        let Some((&index, container)) = caret.path.split_last() else {
            return Some(Position::Between {
                container: Vec::new(),
                index: caret.offset.min(self.nodes.len()),
            });
        };

        let children = self.container(container)?;
        let position = match children.get(index)? {
            Node::Text(s) => Position::Text {
                container: container.to_vec(),
                index,
                offset: caret.offset.min(char_len(s)),
            },
            Node::Group(inner) => Position::Between {
                container: caret.path.clone(),
                index: caret.offset.min(inner.len()),
            },
            Node::Mention(_) | Node::LineBreak => Position::Between {
                container: container.to_vec(),
                index: if caret.offset == 0 { index } else { index + 1 },
            },
        };
        Some(position)
    }

    pub fn start_caret(&self) -> Caret {
        Caret::root(0)
    }

    pub fn end_caret(&self) -> Caret {
        Caret::root(self.nodes.len())
    }

    /// All mention nodes, in document order.
    pub fn mentions(&self) -> Vec<&MentionNode> {
        fn collect<'a>(nodes: &'a [Node], out: &mut Vec<&'a MentionNode>) {
            for node in nodes {
                match node {
                    Node::Mention(m) => out.push(m),
                    Node::Group(children) => collect(children, out),
                    Node::Text(_) | Node::LineBreak => {}
                }
            }
        }
        let mut out = Vec::new();
        collect(&self.nodes, &mut out);
        out
    }

    /// The text a user sees: pills as `@label`.
    pub fn visible_text(&self) -> String {
        fn write(nodes: &[Node], out: &mut String) {
            for (i, node) in nodes.iter().enumerate() {
                match node {
                    Node::Text(s) => out.push_str(s),
                    Node::LineBreak => out.push('\n'),
                    Node::Mention(m) => out.push_str(&m.display()),
                    Node::Group(children) => {
                        if i > 0 {
                            out.push('\n');
                        }
                        write(children, out);
                        if breaks_after_group(nodes, i) {
                            out.push('\n');
                        }
                    }
                }
            }
        }
        let mut out = String::new();
        write(&self.nodes, &mut out);
        out
    }

    /// Copy of everything from the start of the tree up to `position`.
    pub fn clone_before(&self, position: &Position) -> SurfaceTree {
        let (index, text_offset) = match position {
            Position::Text { index, offset, .. } => (*index, Some(*offset)),
            Position::Between { index, .. } => (*index, None),
        };
        SurfaceTree::new(clone_prefix(
            &self.nodes,
            position.container(),
            index,
            text_offset,
        ))
    }
}

fn clone_prefix(
    nodes: &[Node],
    container: &[usize],
    index: usize,
    text_offset: Option<usize>,
) -> Vec<Node> {
    match container.split_first() {
        None => {
            let end = index.min(nodes.len());
            let mut out = nodes[..end].to_vec();
            if let (Some(offset), Some(Node::Text(s))) = (text_offset, nodes.get(index)) {
                out.push(Node::Text(s[..char_to_byte(s, offset)].to_string()));
            }
            out
        }
        Some((&group, rest)) => {
            let end = group.min(nodes.len());
            let mut out = nodes[..end].to_vec();
            if let Some(Node::Group(children)) = nodes.get(group) {
                out.push(Node::Group(clone_prefix(children, rest, index, text_offset)));
            }
            out
        }
    }
}
