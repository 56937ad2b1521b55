//! Prediction assembly, the metrics engine it leans on, and the ranker
//! that orders the result.

pub mod metrics;
pub mod ranker;

use std::collections::{BTreeMap, HashSet};

use crate::kb::KnowledgeBase;
use crate::pattern::Event;
use crate::search::{run_filter_pipeline, MatchedCandidate};

pub use metrics::{PotentialMode, PredictionMetrics};
pub use ranker::{aggregate_by_future, FutureAggregate, RankConfig, SortKey};

/// One fully assembled prediction: a matched pattern split into its
/// past/present/future segments relative to the current STM, plus every
/// metric and the roll-up state carried by the pattern.
#[derive(Debug, Clone)]
pub struct Prediction {
    pub name: String,
    pub frequency: u64,
    pub matches: HashSet<String>,
    pub missing: HashSet<String>,
    pub extras: HashSet<String>,
    pub past: Vec<Event>,
    pub present: Vec<Event>,
    pub future: Vec<Event>,
    pub emotives: BTreeMap<String, f32>,
    pub metadata: BTreeMap<String, HashSet<String>>,
    pub metrics: PredictionMetrics,
}

impl Prediction {
    fn assemble(candidate: MatchedCandidate, metrics: PredictionMetrics) -> Self {
        let past = candidate.pattern.events[..candidate.first_match_event_index].to_vec();
        let present =
            candidate.pattern.events[candidate.first_match_event_index..=candidate.last_match_event_index].to_vec();
        let future = candidate.pattern.events[(candidate.last_match_event_index + 1)..].to_vec();
        let emotives = metrics::latest_emotives(&candidate);
        Self {
            name: candidate.pattern.presented_name(),
            frequency: candidate.pattern.freq,
            matches: candidate.matches,
            missing: candidate.missing,
            extras: candidate.extras,
            past,
            present,
            future,
            emotives,
            metadata: candidate.pattern.metadata.clone(),
            metrics,
        }
    }
}

/// Run the filter pipeline, compute metrics over the surviving batch, rank
/// the result, and return it, end to end.
pub fn predict(
    kb: &KnowledgeBase,
    kb_id: &str,
    stm: &[Event],
    recall_threshold: f64,
    minhash_params: crate::pattern::MinHashParams,
    potential_mode: PotentialMode,
    rank_config: &RankConfig,
) -> crate::Result<Vec<Prediction>> {
    let candidates = run_filter_pipeline(kb, kb_id, stm, recall_threshold, minhash_params)?;
    if candidates.is_empty() {
        return Ok(Vec::new());
    }

    let computed = metrics::compute_all(kb, kb_id, &candidates, stm, potential_mode)?;
    let mut predictions: Vec<Prediction> = candidates
        .into_iter()
        .zip(computed)
        .map(|(c, m)| Prediction::assemble(c, m))
        .collect();

    ranker::rank(&mut predictions, rank_config);
    Ok(predictions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kb::{KnowledgeBase, SqliteAnnService, SqliteBackend};
    use crate::pattern::{MinHashParams, PatternCore};
    use std::sync::Arc;

    fn kb() -> KnowledgeBase {
        let backend = Arc::new(SqliteBackend::open_in_memory().unwrap());
        let ann = Arc::new(SqliteAnnService::new(backend.clone()));
        KnowledgeBase::new(backend.clone(), backend, ann)
    }

    fn ev(words: &[&str]) -> Event {
        words.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn predict_splits_past_present_future() {
        let kb = kb();
        let params = MinHashParams::default();
        let events = vec![
            ev(&["coffee", "morning"]),
            ev(&["commute", "train"]),
            ev(&["arrive", "work"]),
        ];
        let core = PatternCore::derive(events, params);
        kb.write("demo", &core, &BTreeMap::new(), &BTreeMap::new(), 3).unwrap();

        let stm = vec![ev(&["commute", "train"])];
        let predictions = predict(
            &kb,
            "demo",
            &stm,
            0.1,
            params,
            PotentialMode::Standard,
            &RankConfig::default(),
        )
        .unwrap();

        assert_eq!(predictions.len(), 1);
        let p = &predictions[0];
        assert_eq!(p.past, vec![ev(&["coffee", "morning"])]);
        assert_eq!(p.present, vec![ev(&["commute", "train"])]);
        assert_eq!(p.future, vec![ev(&["arrive", "work"])]);
        assert_eq!(p.frequency, 1);
    }

    #[test]
    fn no_candidates_yields_empty_predictions() {
        let kb = kb();
        let params = MinHashParams::default();
        let stm = vec![ev(&["nothing", "learned"])];
        let predictions = predict(
            &kb,
            "empty",
            &stm,
            0.1,
            params,
            PotentialMode::Standard,
            &RankConfig::default(),
        )
        .unwrap();
        assert!(predictions.is_empty());
    }
}
