//! Canonical record identifiers
//!
//! v1 documents carry 32-character identifiers. The v2 loader expects the
//! hyphenated `8-4-4-4-12` form.

use thiserror::Error;

const RAW_LEN: usize = 32;
const CANONICAL_LEN: usize = 36;
const GROUPS: [usize; 5] = [8, 4, 4, 4, 12];

/// Errors raised while formatting identifiers
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentifierError {
    #[error("Identifier '{id}' has {len} characters, expected {RAW_LEN}")]
    InvalidLength { id: String, len: usize },

    #[error("Identifier '{id}' contains invalid character '{ch}'")]
    InvalidCharacter { id: String, ch: char },
}

/// Format a 32-character source identifier as `8-4-4-4-12`
///
/// Identifiers already in canonical form are returned unchanged.
pub fn canonical_id(raw: &str) -> Result<String, IdentifierError> {
    if is_canonical(raw) {
        return Ok(raw.to_string());
    }

    let len = raw.chars().count();
    if len != RAW_LEN {
        return Err(IdentifierError::InvalidLength {
            id: raw.to_string(),
            len,
        });
    }
    if let Some(ch) = raw.chars().find(|c| !c.is_ascii_alphanumeric()) {
        return Err(IdentifierError::InvalidCharacter {
            id: raw.to_string(),
            ch,
        });
    }

    let mut groups = Vec::with_capacity(GROUPS.len());
    let mut start = 0;
    for width in GROUPS {
        groups.push(&raw[start..start + width]);
        start += width;
    }
    Ok(groups.join("-"))
}

/// Canonical identifier, or a fresh random UUID when the source has none
pub fn canonical_or_random(raw: Option<&str>) -> Result<String, IdentifierError> {
    match raw.map(str::trim) {
        Some(id) if !id.is_empty() => canonical_id(id),
        _ => Ok(uuid::Uuid::new_v4().to_string()),
    }
}

fn is_canonical(id: &str) -> bool {
    if id.len() != CANONICAL_LEN {
        return false;
    }
    let mut offset = 0;
    for (n, width) in GROUPS.iter().enumerate() {
        let group = &id.as_bytes()[offset..offset + width];
        if !group.iter().all(u8::is_ascii_alphanumeric) {
            return false;
        }
        offset += width;
        if n < GROUPS.len() - 1 {
            if id.as_bytes()[offset] != b'-' {
                return false;
            }
            offset += 1;
        }
    }
    true
}
