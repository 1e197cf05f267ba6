//! Profile rows as returned by providers, and the suggestion entries built from them.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// A resolved profile as delivered by a resolver or search provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRecord {
    pub identifier: SmolStr,
    #[serde(default)]
    pub name: SmolStr,
    #[serde(default)]
    pub handle: SmolStr,
    #[serde(default)]
    pub avatar_ref: Option<SmolStr>,
}

impl ProfileRecord {
    pub fn new(identifier: impl Into<SmolStr>, name: impl Into<SmolStr>) -> Self {
        Self {
            identifier: identifier.into(),
            name: name.into(),
            handle: SmolStr::default(),
            avatar_ref: None,
        }
    }

    pub fn with_handle(mut self, handle: impl Into<SmolStr>) -> Self {
        self.handle = handle.into();
        self
    }

    pub fn with_avatar(mut self, avatar_ref: impl Into<SmolStr>) -> Self {
        self.avatar_ref = Some(avatar_ref.into());
        self
    }
}

/// One row of the mention dropdown. Keyed by `identifier`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionEntry {
    pub identifier: SmolStr,
    pub display_name: SmolStr,
    pub handle: SmolStr,
    pub avatar_ref: Option<SmolStr>,
}

impl SuggestionEntry {
    pub fn new(identifier: impl Into<SmolStr>, display_name: impl Into<SmolStr>) -> Self {
        Self {
            identifier: identifier.into(),
            display_name: display_name.into(),
            handle: SmolStr::default(),
            avatar_ref: None,
        }
    }

    pub fn with_handle(mut self, handle: impl Into<SmolStr>) -> Self {
        self.handle = handle.into();
        self
    }

    /// Label shown in the dropdown and on the inserted pill.
    ///
    /// Falls back to the handle when no display name is known.
    pub fn label(&self) -> &str {
        if !self.display_name.is_empty() {
            &self.display_name
        } else if !self.handle.is_empty() {
            &self.handle
        } else {
            &self.identifier
        }
    }

    /// Overwrite the fields that are non-empty on `newer`, keep the rest.
    ///
    /// Returns true if anything changed.
    pub fn merge_from(&mut self, newer: &SuggestionEntry) -> bool {
        let mut changed = false;
        if !newer.display_name.is_empty() && newer.display_name != self.display_name {
            self.display_name = newer.display_name.clone();
            changed = true;
        }
        if !newer.handle.is_empty() && newer.handle != self.handle {
            self.handle = newer.handle.clone();
            changed = true;
        }
        if let Some(avatar) = newer.avatar_ref.as_ref().filter(|a| !a.is_empty()) {
            if self.avatar_ref.as_ref() != Some(avatar) {
                self.avatar_ref = Some(avatar.clone());
                changed = true;
            }
        }
        changed
    }
}

impl From<ProfileRecord> for SuggestionEntry {
    fn from(record: ProfileRecord) -> Self {
        Self {
            identifier: record.identifier,
            display_name: record.name,
            handle: record.handle,
            avatar_ref: record.avatar_ref.filter(|a| !a.is_empty()),
        }
    }
}
