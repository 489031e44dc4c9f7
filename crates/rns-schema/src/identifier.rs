//! Non-fungible local identifier codec.
//!
//! The ledger knows three lexical forms of a local id: `#n#` (integer),
//! `[hex]` (bytes / RUID) and `{s}` (string). Callers hand us ids in any of
//! these forms, or bare; everything that reaches a manifest goes through
//! [`format_id`] first so a given raw value always has exactly one rendering.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Number of digest bytes kept when deriving a domain's local id.
const DOMAIN_ID_BYTES: usize = 16;

const BRACKETS: [(char, char); 3] = [('#', '#'), ('[', ']'), ('{', '}')];

/// Lexical class of a canonical local id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdKind {
    Integer,
    Ruid,
}

/// A canonicalized non-fungible local id (`#n#` or `[hex]`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NonFungibleId(String);

impl NonFungibleId {
    /// Canonicalize any accepted lexical form.
    pub fn parse(id: &str) -> Self {
        Self(format_id(id))
    }

    /// Canonical id of an integer-keyed badge.
    pub fn integer(n: u64) -> Self {
        Self(format!("#{n}#"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The payload without its bracket pair.
    pub fn raw(&self) -> &str {
        strip_id(&self.0)
    }

    pub fn kind(&self) -> IdKind {
        classify_id(&self.0)
    }
}

impl fmt::Display for NonFungibleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Remove exactly one matching bracket pair, if present.
pub fn strip_id(id: &str) -> &str {
    for (open, close) in BRACKETS {
        if id.len() >= 2 && id.starts_with(open) && id.ends_with(close) {
            return &id[open.len_utf8()..id.len() - close.len_utf8()];
        }
    }
    id
}

/// Strip, then re-wrap as `#raw#` when the payload is all digits, else `[raw]`.
pub fn format_id(id: &str) -> String {
    let raw = strip_id(id);
    if is_integer_payload(raw) {
        format!("#{raw}#")
    } else {
        format!("[{raw}]")
    }
}

pub fn classify_id(id: &str) -> IdKind {
    if is_integer_payload(strip_id(id)) {
        IdKind::Integer
    } else {
        IdKind::Ruid
    }
}

fn is_integer_payload(raw: &str) -> bool {
    !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit())
}

/// Derive the deterministic local id of a domain name.
///
/// SHA-256 over the UTF-8 name, first 16 bytes, byte order reversed,
/// lowercase hex, wrapped in the byte-id brackets. Used both to mint ids for
/// new domains and to look up existing ones, so it must stay bit-exact.
pub fn domain_to_non_fungible_id(name: &str) -> NonFungibleId {
    let digest = Sha256::digest(name.as_bytes());
    let mut prefix = digest[..DOMAIN_ID_BYTES].to_vec();
    prefix.reverse();
    NonFungibleId(format!("[{}]", hex::encode(prefix)))
}
