//! Multi-stage candidate selection and the subsequence matcher it drives.

pub mod matcher;

use std::collections::HashSet;

use crate::kb::KnowledgeBase;
use crate::pattern::{flatten, lsh_bands, signature, Event, MinHashParams};
use crate::Pattern;

pub use matcher::{align, Alignment, MatchBlock};

/// A pattern that survived all three filter stages, with its alignment
/// against the current STM and the derived match/missing/extras sets
/// (Prediction fields).
#[derive(Debug, Clone)]
pub struct MatchedCandidate {
    pub pattern: Pattern,
    pub alignment: Alignment,
    pub first_match_event_index: usize,
    pub last_match_event_index: usize,
    pub matches: HashSet<String>,
    pub missing: HashSet<String>,
    pub extras: HashSet<String>,
}

/// Run the three-stage filter pipeline against the current STM.
///
/// Returns an empty vector (not an error) when the STM has no LSH-candidate
/// overlap at all, matching Stage A's "empty list, not an
/// error".
pub fn run_filter_pipeline(
    kb: &KnowledgeBase,
    kb_id: &str,
    stm: &[Event],
    recall_threshold: f64,
    params: MinHashParams,
) -> crate::Result<Vec<MatchedCandidate>> {
    let stm_flat = flatten(stm);
    if stm_flat.is_empty() {
        return Ok(Vec::new());
    }

    // Stage A: LSH candidate generation.
    let stm_sig = signature(stm, params);
    let stm_bands = lsh_bands(&stm_sig, params);
    let candidates = kb.candidates_by_bands(kb_id, &stm_bands)?;
    if candidates.is_empty() {
        return Ok(Vec::new());
    }

    // Stage B: cheap prefilter via shared-band floor.
    let band_floor = (recall_threshold * params.b as f64).ceil() as usize;
    let mut survivors = Vec::new();
    for name in candidates {
        let Some(_prefilter) = kb.fetch_prefilter(kb_id, &name)? else {
            continue;
        };
        let shared = kb.shared_band_count(kb_id, &name, &stm_bands)?;
        if shared >= band_floor {
            survivors.push(name);
        }
    }
    if survivors.is_empty() {
        return Ok(Vec::new());
    }

    // Stage C: exact subsequence alignment.
    let patterns = kb.fetch_patterns(kb_id, &survivors)?;
    let mut matched = Vec::new();
    for pattern in patterns {
        let pattern_flat = flatten(&pattern.events);
        let alignment = align(&pattern_flat, &stm_flat);
        if alignment.total_matched() == 0 {
            continue;
        }
        let similarity = alignment.similarity();
        if similarity < recall_threshold {
            continue;
        }

        let first_tok = alignment.first_match_token_index().expect("non-zero match");
        let last_tok = alignment.last_match_token_index().expect("non-zero match");
        let first_event = token_to_event_index(&pattern.events, first_tok);
        let last_event = token_to_event_index(&pattern.events, last_tok);

        let stm_symbols: HashSet<&str> = stm_flat.iter().map(|s| s.as_str()).collect();
        let present_symbols: HashSet<&str> = pattern.events[first_event..=last_event]
            .iter()
            .flatten()
            .map(|s| s.as_str())
            .collect();

        let matches: HashSet<String> = present_symbols
            .iter()
            .filter(|s| stm_symbols.contains(**s))
            .map(|s| s.to_string())
            .collect();
        let missing: HashSet<String> = present_symbols
            .iter()
            .filter(|s| !stm_symbols.contains(**s))
            .map(|s| s.to_string())
            .collect();
        let extras: HashSet<String> = stm_symbols
            .iter()
            .filter(|s| !present_symbols.contains(**s))
            .map(|s| s.to_string())
            .collect();

        matched.push(MatchedCandidate {
            pattern,
            alignment,
            first_match_event_index: first_event,
            last_match_event_index: last_event,
            matches,
            missing,
            extras,
        });
    }

    Ok(matched)
}

/// Map a flattened token index back to the event index that contains it.
fn token_to_event_index(events: &[Event], token_index: usize) -> usize {
    let mut offset = 0;
    for (idx, event) in events.iter().enumerate() {
        if token_index < offset + event.len() {
            return idx;
        }
        offset += event.len();
    }
    events.len().saturating_sub(1)
}
