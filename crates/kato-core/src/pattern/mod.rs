//! The pattern data model and its two derivation components:
//! the content hasher and the MinHash/LSH signer.

pub mod hash;
pub mod minhash;

use std::collections::BTreeMap;
use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use hash::{pattern_name, present as present_pattern_name};
pub use minhash::{lsh_bands, signature, LshBands, MinHashParams, MinHashSignature};

/// One event: an ordered sequence of symbols, stored sorted.
pub type Event = Vec<String>;

/// An ordered sequence of events.
pub type EventSequence = Vec<Event>;

/// Left-to-right concatenation of an event sequence's symbols.
pub fn flatten(events: &[Event]) -> Vec<String> {
    events.iter().flatten().cloned().collect()
}

/// The immutable body of a pattern: everything derived purely from `events`
/// and never mutated by subsequent learns.
///
/// `created_at`/`updated_at` are `None` for a body freshly produced by
/// [`PatternCore::derive`] (not yet persisted) and `Some` once loaded back
/// from the columnar store, which is the only source of truth for them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternCore {
    pub name: String,
    pub events: EventSequence,
    pub length: u32,
    pub token_count: u32,
    pub first_token: String,
    pub last_token: String,
    pub minhash: MinHashSignature,
    pub lsh_bands: LshBands,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl PatternCore {
    /// Derive the full immutable body from a (already within-event-sorted)
    /// event sequence. `created_at`/`updated_at` are unset until the row is
    /// actually persisted and re-fetched.
    pub fn derive(events: EventSequence, params: MinHashParams) -> Self {
        let name = hash::pattern_name(&events);
        let flat = flatten(&events);
        let sig = minhash::signature(&events, params);
        let bands = minhash::lsh_bands(&sig, params);
        let first_token = flat.first().cloned().unwrap_or_default();
        let last_token = flat.last().cloned().unwrap_or_default();
        Self {
            name,
            length: events.len() as u32,
            token_count: flat.len() as u32,
            first_token,
            last_token,
            minhash: sig,
            lsh_bands: bands,
            events,
            created_at: None,
            updated_at: None,
        }
    }
}

/// A learned pattern.
///
/// `freq`, `emotives_window`, and `metadata` are the mutable roll-up state
/// maintained by the pattern writer; everything else is the
/// immutable body from [`PatternCore`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pattern {
    pub name: String,
    pub kb_id: String,
    pub events: EventSequence,
    pub length: u32,
    pub freq: u64,
    /// Bounded rolling window of per-learn emotive snapshots, oldest first.
    pub emotives_window: Vec<BTreeMap<String, f32>>,
    /// Set-union accumulated metadata, unbounded.
    pub metadata: BTreeMap<String, HashSet<String>>,
    pub minhash: MinHashSignature,
    pub lsh_bands: LshBands,
    pub first_token: String,
    pub last_token: String,
    pub token_count: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Pattern {
    /// Presentation form of this pattern's name (`PTRN|<hex>`).
    pub fn presented_name(&self) -> String {
        hash::present(&self.name)
    }

    /// All distinct symbols occurring anywhere in this pattern's events.
    pub fn symbols(&self) -> HashSet<&str> {
        self.events.iter().flatten().map(|s| s.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flatten_preserves_order() {
        let events = vec![
            vec!["b".to_string(), "a".to_string()],
            vec!["c".to_string()],
        ];
        assert_eq!(flatten(&events), vec!["b", "a", "c"]);
    }

    #[test]
    fn pattern_core_name_matches_hasher() {
        let events = vec![vec!["x".to_string()]];
        let core = PatternCore::derive(events.clone(), MinHashParams::default());
        assert_eq!(core.name, hash::pattern_name(&events));
        assert_eq!(core.token_count, 1);
        assert_eq!(core.first_token, "x");
        assert_eq!(core.last_token, "x");
    }
}
