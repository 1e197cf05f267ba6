//! Bech32 entity strings (`npub1…`, `nprofile1…`) on top of the `bech32`
//! crate.
//!
//! Identifiers use the BIP-173 checksum, not bech32m, and are always
//! lowercase.

use bech32::primitives::decode::CheckedHrpstring;
use bech32::{Bech32, Hrp};
use smol_str::{SmolStr, ToSmolStr};

/// A decoded entity: human-readable part plus 8-bit payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub hrp: SmolStr,
    pub data: Vec<u8>,
}

/// Decode a lowercase bech32 string. None on any structural problem
/// (uppercase, missing separator, bad charset, bad checksum).
pub fn decode(s: &str) -> Option<Decoded> {
    if !s.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit()) {
        return None;
    }
    let checked = CheckedHrpstring::new::<Bech32>(s).ok()?;
    Some(Decoded {
        hrp: checked.hrp().to_smolstr(),
        data: checked.byte_iter().collect(),
    })
}

/// Encode `data` under `hrp`. None if `hrp` is not a valid human-readable
/// part.
pub fn encode(hrp: &str, data: &[u8]) -> Option<String> {
    let hrp = Hrp::parse(hrp).ok()?;
    bech32::encode::<Bech32>(hrp, data).ok()
}
