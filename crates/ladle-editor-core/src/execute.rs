//! Default editing on a [`SurfaceDocument`].
//!
//! `execute_action` applies a [`SurfaceAction`] at the caret. Mentions are
//! never entered: typing next to one lands in a neighbouring text node,
//! and a single-char delete that reaches one removes it whole.

use crate::actions::{Direction, SurfaceAction};
use crate::document::SurfaceDocument;
use crate::text_helpers::{char_len, char_to_byte, sanitize_pasted_text};
use crate::tree::{Node, Position};

/// Execute an editing action on a document.
///
/// Returns true if the document was modified. Without a caret (or with one
/// that no longer resolves) nothing happens.
pub fn execute_action<D: SurfaceDocument + ?Sized>(doc: &mut D, action: &SurfaceAction) -> bool {
    match action {
        SurfaceAction::InsertText(text) => execute_insert(doc, text),
        SurfaceAction::InsertLineBreak => execute_insert_line_break(doc),
        SurfaceAction::Paste(text) => execute_insert(doc, &sanitize_pasted_text(text)),
        SurfaceAction::DeleteBackward => execute_delete(doc, Direction::Backward),
        SurfaceAction::DeleteForward => execute_delete(doc, Direction::Forward),
    }
}

fn current_position<D: SurfaceDocument + ?Sized>(doc: &D) -> Option<Position> {
    let caret = doc.caret()?;
    doc.tree().resolve(&caret)
}

fn execute_insert<D: SurfaceDocument + ?Sized>(doc: &mut D, text: &str) -> bool {
    if text.is_empty() {
        return false;
    }
    let mut changed = false;
    for (i, piece) in text.split('\n').enumerate() {
        if i > 0 {
            changed |= execute_insert_line_break(doc);
        }
        if !piece.is_empty() {
            changed |= insert_plain(doc, piece);
        }
    }
    changed
}

/// Insert text without line breaks at the caret.
fn insert_plain<D: SurfaceDocument + ?Sized>(doc: &mut D, text: &str) -> bool {
    let Some(position) = current_position(doc) else {
        return false;
    };
    let Some(children) = doc.tree_mut().container_mut(position.container()) else {
        return false;
    };
    let inserted = char_len(text);

    let after = match position {
        Position::Text {
            container,
            index,
            offset,
        } => {
            let Some(Node::Text(s)) = children.get_mut(index) else {
                return false;
            };
            s.insert_str(char_to_byte(s, offset), text);
            Position::Text {
                container,
                index,
                offset: offset + inserted,
            }
        }
        Position::Between { container, index } => {
            if let Some(Node::Text(s)) = index.checked_sub(1).and_then(|i| children.get_mut(i)) {
                s.push_str(text);
                let offset = char_len(s);
                Position::Text {
                    container,
                    index: index - 1,
                    offset,
                }
            } else if let Some(Node::Text(s)) = children.get_mut(index) {
                s.insert_str(0, text);
                Position::Text {
                    container,
                    index,
                    offset: inserted,
                }
            } else {
                children.insert(index, Node::Text(text.to_string()));
                Position::Text {
                    container,
                    index,
                    offset: inserted,
                }
            }
        }
    };
    doc.set_caret(Some(after.into_caret()));
    true
}

fn execute_insert_line_break<D: SurfaceDocument + ?Sized>(doc: &mut D) -> bool {
    let Some(position) = current_position(doc) else {
        return false;
    };
    let Some(children) = doc.tree_mut().container_mut(position.container()) else {
        return false;
    };

    let after = match position {
        Position::Text {
            container,
            index,
            offset,
        } => {
            let Some(Node::Text(s)) = children.get(index) else {
                return false;
            };
            let split = char_to_byte(s, offset);
            let (before, rest) = (s[..split].to_string(), s[split..].to_string());

            let mut replacement = Vec::with_capacity(3);
            if !before.is_empty() {
                replacement.push(Node::Text(before));
            }
            replacement.push(Node::LineBreak);
            let break_index = index + replacement.len() - 1;
            let has_rest = !rest.is_empty();
            if has_rest {
                replacement.push(Node::Text(rest));
            }
            children.splice(index..=index, replacement);

            if has_rest {
                Position::Text {
                    container,
                    index: break_index + 1,
                    offset: 0,
                }
            } else {
                Position::Between {
                    container,
                    index: break_index + 1,
                }
            }
        }
        Position::Between { container, index } => {
            children.insert(index, Node::LineBreak);
            Position::Between {
                container,
                index: index + 1,
            }
        }
    };
    doc.set_caret(Some(after.into_caret()));
    true
}

/// Delete one char, line break or mention next to the caret.
///
/// Empty text nodes between the caret and the target are skipped. Deletion
/// never crosses a group boundary.
fn execute_delete<D: SurfaceDocument + ?Sized>(doc: &mut D, direction: Direction) -> bool {
    let Some(position) = current_position(doc) else {
        return false;
    };
    let Some(children) = doc.tree_mut().container_mut(position.container()) else {
        return false;
    };

    // Inside a text node with a char on the requested side.
    if let Position::Text {
        container,
        index,
        offset,
    } = &position
    {
        if let Some(Node::Text(s)) = children.get_mut(*index) {
            let len = char_len(s);
            let target = match direction {
                Direction::Backward if *offset > 0 => Some(*offset - 1),
                Direction::Forward if *offset < len => Some(*offset),
                _ => None,
            };
            if let Some(at) = target {
                let start = char_to_byte(s, at);
                let end = char_to_byte(s, at + 1);
                s.replace_range(start..end, "");
                let after = if s.is_empty() {
                    children.remove(*index);
                    Position::Between {
                        container: container.clone(),
                        index: *index,
                    }
                } else {
                    Position::Text {
                        container: container.clone(),
                        index: *index,
                        offset: at,
                    }
                };
                doc.set_caret(Some(after.into_caret()));
                return true;
            }
        }
    }

    // At a node boundary: look at the sibling on that side.
    let gap = match (&position, direction) {
        (Position::Text { index, .. }, Direction::Backward) => *index,
        (Position::Text { index, .. }, Direction::Forward) => index + 1,
        (Position::Between { index, .. }, _) => *index,
    };
    let container = position.container().to_vec();

    let after = match direction {
        Direction::Backward => {
            let mut j = gap;
            loop {
                if j == 0 {
                    return false;
                }
                j -= 1;
                match &mut children[j] {
                    Node::Text(s) if s.is_empty() => continue,
                    Node::Text(s) => {
                        if let Some((last, _)) = s.char_indices().next_back() {
                            s.truncate(last);
                        }
                        if s.is_empty() {
                            children.remove(j);
                            break Position::Between { container, index: j };
                        }
                        let offset = char_len(s);
                        break Position::Text {
                            container,
                            index: j,
                            offset,
                        };
                    }
                    Node::LineBreak | Node::Mention(_) => {
                        children.remove(j);
                        break Position::Between { container, index: j };
                    }
                    Node::Group(_) => return false,
                }
            }
        }
        Direction::Forward => {
            let mut j = gap;
            loop {
                let Some(node) = children.get_mut(j) else {
                    return false;
                };
                match node {
                    Node::Text(s) if s.is_empty() => j += 1,
                    Node::Text(s) => {
                        s.remove(0);
                        if s.is_empty() {
                            children.remove(j);
                        }
                        break position;
                    }
                    Node::LineBreak | Node::Mention(_) => {
                        children.remove(j);
                        break position;
                    }
                    Node::Group(_) => return false,
                }
            }
        }
    };
    doc.set_caret(Some(after.into_caret()));
    true
}
