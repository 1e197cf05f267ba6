//! Small text utilities shared by the codec, the synchronizer and the
//! default editing actions.

use std::borrow::Cow;

/// Stand-in emitted for a mention when scanning for an open `@query`.
/// It ends any query, so a pill right after `@` never reads as one.
pub const MENTION_PLACEHOLDER: char = '\u{FFFC}';

/// Zero-width chars hosts leave behind as caret anchors.
///
/// U+200D (joiner) is deliberately absent: it glues emoji sequences.
pub fn is_zero_width(c: char) -> bool {
    matches!(c, '\u{200B}' | '\u{200C}' | '\u{FEFF}')
}

/// True for empty strings too.
pub fn is_zero_width_only(s: &str) -> bool {
    s.chars().all(is_zero_width)
}

pub fn strip_zero_width(s: &str) -> Cow<'_, str> {
    if s.chars().any(is_zero_width) {
        Cow::Owned(s.chars().filter(|c| !is_zero_width(*c)).collect())
    } else {
        Cow::Borrowed(s)
    }
}

/// Byte index of the `@` that opens a query running to the end of `text`.
///
/// The query is `@` followed by zero or more chars that are neither
/// whitespace nor `@` (nor a mention placeholder).
pub fn open_query_start(text: &str) -> Option<usize> {
    let at = text.rfind('@')?;
    let query = &text[at + 1..];
    query
        .chars()
        .all(|c| !c.is_whitespace() && c != MENTION_PLACEHOLDER)
        .then_some(at)
}

/// The open query text (without the `@`), if any.
pub fn open_query(text: &str) -> Option<&str> {
    open_query_start(text).map(|at| &text[at + 1..])
}

/// Clean clipboard text before it enters the surface.
///
/// Normalizes line endings to `\n`, drops zero-width anchors and control
/// chars other than newline and tab.
pub fn sanitize_pasted_text(text: &str) -> String {
    let text = text.replace("\r\n", "\n").replace('\r', "\n");
    text.chars()
        .filter(|c| !is_zero_width(*c))
        .filter(|c| *c == '\n' || *c == '\t' || !c.is_control())
        .collect()
}

/// Byte offset of the `char_offset`th char, clamped to the end.
pub fn char_to_byte(s: &str, char_offset: usize) -> usize {
    s.char_indices()
        .nth(char_offset)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub fn char_len(s: &str) -> usize {
    s.chars().count()
}
