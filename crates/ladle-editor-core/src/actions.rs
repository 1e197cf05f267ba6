//! Input vocabulary for the surface.
//!
//! Hosts translate their native key and input events into these types. The
//! composer decides what to do with a [`Key`]; plain editing falls through
//! to [`SurfaceAction`] and [`crate::execute::execute_action`].

use smol_str::SmolStr;

/// Which side of the caret an operation applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Towards the start (Backspace).
    Backward,
    /// Towards the end (Delete).
    Forward,
}

/// Key values the composer cares about.
///
/// Platform code converts native key events to this enum; everything the
/// composer does not intercept maps to `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    /// A character key.
    Character(SmolStr),
    Backspace,
    Delete,
    Enter,
    Tab,
    Escape,
    ArrowUp,
    ArrowDown,
    /// Anything else (modifiers, function keys, horizontal navigation).
    Other,
}

impl Key {
    pub fn character(s: impl Into<SmolStr>) -> Self {
        Self::Character(s.into())
    }
}

/// Result of handling a keydown event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeydownResult {
    /// Event was handled, prevent default.
    Handled,
    /// Not ours, let the platform handle it.
    NotHandled,
}

impl KeydownResult {
    pub fn is_handled(self) -> bool {
        matches!(self, Self::Handled)
    }
}

/// Plain editing operations applied at the caret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceAction {
    /// Insert typed text.
    InsertText(SmolStr),
    /// Insert a native line break (Shift+Enter).
    InsertLineBreak,
    /// Insert clipboard plain text. Sanitized before it lands.
    Paste(String),
    /// Delete one char (or atomic node) before the caret.
    DeleteBackward,
    /// Delete one char (or atomic node) after the caret.
    DeleteForward,
}

impl SurfaceAction {
    pub fn insert(text: impl Into<SmolStr>) -> Self {
        Self::InsertText(text.into())
    }

    pub fn delete(direction: Direction) -> Self {
        match direction {
            Direction::Backward => Self::DeleteBackward,
            Direction::Forward => Self::DeleteForward,
        }
    }
}
