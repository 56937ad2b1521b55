//! Pattern content hash
//!
//! Computes the stable identity of an event sequence: canonical (already
//! sorted-within-event) JSON encoding, SHA1, full 40-hex digest.
//! Truncation is never used for identity — only the `PTRN|` presentation
//! prefix is cosmetic.

use sha1::{Digest, Sha1};

/// Presentation-only prefix. Never part of a pattern's stored identity.
pub const PATTERN_NAME_PRESENTATION_PREFIX: &str = "PTRN|";

/// Compute the full 40-hex-character SHA1 digest over the canonical
/// encoding of `events`.
///
/// `events` must already have each event's symbols sorted; this
/// function does not re-sort, since re-sorting here would hide a caller bug
/// that skipped normalization.
pub fn pattern_name(events: &[Vec<String>]) -> String {
    let canonical =
        serde_json::to_vec(events).expect("Vec<Vec<String>> serialization is infallible");
    let mut hasher = Sha1::new();
    hasher.update(&canonical);
    let digest = hasher.finalize();
    hex_encode(&digest)
}

/// Prefix a pattern's bare identity with the presentation affix.
pub fn present(name: &str) -> String {
    format!("{PATTERN_NAME_PRESENTATION_PREFIX}{name}")
}

fn hex_encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        out.push_str(&format!("{:02x}", b));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_sequences_hash_identically() {
        let e = vec![vec!["a".to_string(), "b".to_string()], vec!["c".to_string()]];
        assert_eq!(pattern_name(&e), pattern_name(&e.clone()));
    }

    #[test]
    fn different_sequences_hash_differently() {
        let e1 = vec![vec!["a".to_string()]];
        let e2 = vec![vec!["b".to_string()]];
        assert_ne!(pattern_name(&e1), pattern_name(&e2));
    }

    #[test]
    fn digest_is_full_40_hex_chars() {
        let e = vec![vec!["x".to_string()]];
        assert_eq!(pattern_name(&e).len(), 40);
    }

    #[test]
    fn event_order_matters_symbol_order_within_event_does_not_if_presorted() {
        let e1 = vec![vec!["a".to_string()], vec!["b".to_string()]];
        let e2 = vec![vec!["b".to_string()], vec!["a".to_string()]];
        assert_ne!(pattern_name(&e1), pattern_name(&e2));
    }
}
