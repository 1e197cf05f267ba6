//! Reference codec: canonical `scheme:identifier` tokens, bare `@identifier`
//! shorthand, and display-name resolution.
//!
//! Everything here is pure text processing. Nothing blocks and nothing
//! touches the network; display names come from whatever [`DisplayNames`]
//! the caller passes in (usually the composer's profile cache).

pub mod nip19;

use std::collections::HashMap;
use std::fmt;
use std::ops::Range;

use smol_str::{SmolStr, format_smolstr};

use crate::text_helpers::{is_zero_width, strip_zero_width};

/// Immutable pointer to a subject (usually a person), `scheme:identifier`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CanonicalReference {
    scheme: SmolStr,
    identifier: SmolStr,
}

impl CanonicalReference {
    pub fn new(scheme: impl Into<SmolStr>, identifier: impl Into<SmolStr>) -> Self {
        Self {
            scheme: scheme.into(),
            identifier: identifier.into(),
        }
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn to_smolstr(&self) -> SmolStr {
        format_smolstr!("{}:{}", self.scheme, self.identifier)
    }
}

impl fmt::Display for CanonicalReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.scheme, self.identifier)
    }
}

/// Which spelling a reference had in the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceForm {
    /// `scheme:identifier`
    Canonical,
    /// `@identifier`
    Bare,
}

/// One reference found by [`parse_references`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceMatch {
    /// The text exactly as it appeared in the input.
    pub raw: SmolStr,
    pub reference: CanonicalReference,
    pub form: ReferenceForm,
    /// Position in chars.
    pub char_range: Range<usize>,
    /// Position in bytes, for slicing the input.
    pub byte_range: Range<usize>,
}

/// Codec configuration: which scheme and identifier kinds count as references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceSyntax {
    scheme: SmolStr,
    prefixes: Vec<SmolStr>,
    shorten_head: usize,
    shorten_tail: usize,
}

impl Default for ReferenceSyntax {
    fn default() -> Self {
        Self {
            scheme: SmolStr::new_static("nostr"),
            prefixes: vec![SmolStr::new_static("npub"), SmolStr::new_static("nprofile")],
            shorten_head: 12,
            shorten_tail: 6,
        }
    }
}

impl ReferenceSyntax {
    pub fn new(scheme: impl Into<SmolStr>) -> Self {
        Self {
            scheme: scheme.into(),
            ..Self::default()
        }
    }

    pub fn with_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SmolStr>,
    {
        self.prefixes = prefixes.into_iter().map(Into::into).collect();
        self
    }

    /// Chars kept at the start and end when shortening an identifier.
    pub fn with_shortening(mut self, head: usize, tail: usize) -> Self {
        self.shorten_head = head;
        self.shorten_tail = tail;
        self
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn prefixes(&self) -> &[SmolStr] {
        &self.prefixes
    }

    /// Build a reference under this syntax's scheme. No validation: a
    /// suggestion accepted from the dropdown is trusted as-is.
    pub fn reference(&self, identifier: impl Into<SmolStr>) -> CanonicalReference {
        CanonicalReference::new(self.scheme.clone(), identifier)
    }

    /// Structural check: bech32 checksum, accepted prefix, payload shape.
    pub fn is_valid_identifier(&self, identifier: &str) -> bool {
        let Some(decoded) = nip19::decode(identifier) else {
            return false;
        };
        if !self.prefixes.contains(&decoded.hrp) {
            return false;
        }
        payload_is_well_formed(&decoded.hrp, &decoded.data)
    }

    /// `npub1abcdefgh…uvwxyz` style short form.
    pub fn shorten(&self, identifier: &str) -> SmolStr {
        let len = identifier.chars().count();
        if len <= self.shorten_head + self.shorten_tail + 1 {
            return SmolStr::new(identifier);
        }
        let head: String = identifier.chars().take(self.shorten_head).collect();
        let tail: String = identifier.chars().skip(len - self.shorten_tail).collect();
        format_smolstr!("{head}…{tail}")
    }
}

fn payload_is_well_formed(hrp: &str, data: &[u8]) -> bool {
    match hrp {
        "npub" | "nsec" | "note" => data.len() == 32,
        "nprofile" | "nevent" | "naddr" => tlv_has_special(data),
        _ => !data.is_empty(),
    }
}

/// TLV payloads must carry a type-0 record. For profiles and events it is
/// a 32-byte key or id.
fn tlv_has_special(mut data: &[u8]) -> bool {
    let mut found = false;
    while !data.is_empty() {
        let [t, l, rest @ ..] = data else {
            return false;
        };
        let len = usize::from(*l);
        if rest.len() < len {
            return false;
        }
        if *t == 0 && len == 32 {
            found = true;
        }
        data = &rest[len..];
    }
    found
}

/// Lookup of cached display names by identifier.
pub trait DisplayNames {
    fn display_name(&self, identifier: &str) -> Option<SmolStr>;
}

/// No names known; everything falls back to the shortened identifier.
impl DisplayNames for () {
    fn display_name(&self, _identifier: &str) -> Option<SmolStr> {
        None
    }
}

impl DisplayNames for HashMap<SmolStr, SmolStr> {
    fn display_name(&self, identifier: &str) -> Option<SmolStr> {
        self.get(identifier).cloned()
    }
}

impl<T: DisplayNames + ?Sized> DisplayNames for &T {
    fn display_name(&self, identifier: &str) -> Option<SmolStr> {
        (**self).display_name(identifier)
    }
}

fn is_identifier_byte(b: u8) -> bool {
    b.is_ascii_lowercase() || b.is_ascii_digit()
}

/// Scan `text` left to right for canonical and bare references.
///
/// At each position the first matching form wins; after a match the scan
/// resumes at its end, so results never overlap. A candidate whose
/// identifier fails structural decode is plain text and the scan moves on
/// by one char.
pub fn parse_references(text: &str, syntax: &ReferenceSyntax) -> Vec<ReferenceMatch> {
    let canonical_prefix = format!("{}:", syntax.scheme);
    let mut matches = Vec::new();
    let mut byte_pos = 0;
    let mut char_pos = 0;

    while byte_pos < text.len() {
        let rest = &text[byte_pos..];

        if let Some((len, form, identifier)) = match_at(rest, &canonical_prefix, syntax) {
            let raw = &rest[..len];
            let raw_chars = raw.chars().count();
            matches.push(ReferenceMatch {
                raw: SmolStr::new(raw),
                reference: syntax.reference(identifier),
                form,
                char_range: char_pos..char_pos + raw_chars,
                byte_range: byte_pos..byte_pos + len,
            });
            byte_pos += len;
            char_pos += raw_chars;
            continue;
        }

        let Some(ch) = rest.chars().next() else {
            break;
        };
        byte_pos += ch.len_utf8();
        char_pos += 1;
    }

    matches
}

fn match_at<'t>(
    rest: &'t str,
    canonical_prefix: &str,
    syntax: &ReferenceSyntax,
) -> Option<(usize, ReferenceForm, &'t str)> {
    let (form, id_start) = if rest.starts_with(canonical_prefix) {
        (ReferenceForm::Canonical, canonical_prefix.len())
    } else if rest.starts_with('@') {
        (ReferenceForm::Bare, 1)
    } else {
        return None;
    };

    let id_len = rest.as_bytes()[id_start..]
        .iter()
        .take_while(|b| is_identifier_byte(**b))
        .count();
    if id_len == 0 {
        return None;
    }

    let identifier = &rest[id_start..id_start + id_len];
    syntax
        .is_valid_identifier(identifier)
        .then_some((id_start + id_len, form, identifier))
}

/// Canonical spelling of a single raw reference.
///
/// Bare shorthand becomes `scheme:identifier`; canonical input and anything
/// that is not a valid reference come back unchanged.
pub fn to_canonical(raw: &str, syntax: &ReferenceSyntax) -> String {
    match raw.strip_prefix('@') {
        Some(identifier) if syntax.is_valid_identifier(identifier) => {
            syntax.reference(identifier).to_string()
        }
        _ => raw.to_string(),
    }
}

/// Normal form of a whole text: every bare reference rewritten canonical,
/// zero-width anchors removed.
pub fn canonicalize(text: &str, syntax: &ReferenceSyntax) -> String {
    let text = strip_zero_width(text);
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for m in parse_references(&text, syntax) {
        out.push_str(&text[last..m.byte_range.start]);
        match m.form {
            ReferenceForm::Canonical => out.push_str(&m.raw),
            ReferenceForm::Bare => out.push_str(&m.reference.to_smolstr()),
        }
        last = m.byte_range.end;
    }
    out.push_str(&text[last..]);
    debug_assert!(!out.chars().any(is_zero_width));
    out
}

/// Human label for a reference: the cached name if known, else the
/// shortened identifier.
pub fn resolve_display_name(
    reference: &CanonicalReference,
    names: &(impl DisplayNames + ?Sized),
    syntax: &ReferenceSyntax,
) -> SmolStr {
    names
        .display_name(reference.identifier())
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| syntax.shorten(reference.identifier()))
}
