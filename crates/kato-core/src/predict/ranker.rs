//! Ranking and future-level aggregation
//!
//! Orders an assembled prediction batch by a configurable metric, with a
//! deterministic tie-break on the pattern name. Future-level aggregation
//! (§4.13) is a separate, opt-in view over the same batch: it groups
//! predictions that agree on an identical future segment and reports each
//! group's combined signal, rather than folding or replacing the ranked
//! per-pattern list.

use std::collections::HashMap;

use crate::pattern::Event;

use super::Prediction;

/// Metric a rank is primarily ordered by. Every ordering is descending
/// (highest-first) except [`SortKey::Fragmentation`], which the spec calls
/// out as ascending (fewer matching blocks ranks first); ties fall through
/// to the pattern name for determinism.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    Potential,
    Similarity,
    Evidence,
    Confidence,
    Snr,
    Frequency,
    /// Ascending: unlike every other key, a *lower* fragmentation ranks
    /// first (a contiguous match beats a fragmented one).
    Fragmentation,
    NormalizedEntropy,
    GlobalNormalizedEntropy,
    ItfdfSimilarity,
    Confluence,
    PredictiveInformation,
    BayesianPosterior,
}

impl SortKey {
    fn value(self, p: &Prediction) -> f64 {
        match self {
            SortKey::Potential => p.metrics.potential,
            SortKey::Similarity => p.metrics.similarity,
            SortKey::Evidence => p.metrics.evidence,
            SortKey::Confidence => p.metrics.confidence,
            SortKey::Snr => p.metrics.snr,
            SortKey::Frequency => p.frequency as f64,
            SortKey::Fragmentation => p.metrics.fragmentation as f64,
            SortKey::NormalizedEntropy => p.metrics.normalized_entropy,
            SortKey::GlobalNormalizedEntropy => p.metrics.global_normalized_entropy,
            SortKey::ItfdfSimilarity => p.metrics.itfdf_similarity,
            SortKey::Confluence => p.metrics.confluence,
            SortKey::PredictiveInformation => p.metrics.predictive_information,
            SortKey::BayesianPosterior => p.metrics.bayesian_posterior,
        }
    }

    /// Whether lower values should rank first. Only `fragmentation` is
    /// ascending per spec; every other key is descending.
    fn ascending(self) -> bool {
        matches!(self, SortKey::Fragmentation)
    }
}

/// Ranking configuration.
#[derive(Debug, Clone)]
pub struct RankConfig {
    pub primary: SortKey,
    /// Cap on the number of predictions returned, applied after sorting.
    pub max_predictions: Option<usize>,
}

impl Default for RankConfig {
    fn default() -> Self {
        Self {
            primary: SortKey::Potential,
            max_predictions: None,
        }
    }
}

/// Sort (and cap) `predictions` in place.
///
/// Tie-break is fixed regardless of `primary`: primary key desc, then
/// `similarity` desc, then `frequency` desc, then `name` asc.
pub fn rank(predictions: &mut Vec<Prediction>, config: &RankConfig) {
    predictions.sort_by(|a, b| {
        let (lo, hi) = if config.primary.ascending() { (a, b) } else { (b, a) };
        let primary = config
            .primary
            .value(lo)
            .partial_cmp(&config.primary.value(hi))
            .unwrap_or(std::cmp::Ordering::Equal);
        if primary != std::cmp::Ordering::Equal {
            return primary;
        }
        let similarity = b
            .metrics
            .similarity
            .partial_cmp(&a.metrics.similarity)
            .unwrap_or(std::cmp::Ordering::Equal);
        if similarity != std::cmp::Ordering::Equal {
            return similarity;
        }
        let frequency = b.frequency.cmp(&a.frequency);
        if frequency != std::cmp::Ordering::Equal {
            return frequency;
        }
        a.name.cmp(&b.name)
    });

    if let Some(max) = config.max_predictions {
        predictions.truncate(max);
    }
}

/// One future-level aggregate group (§4.13): the patterns in `predictions`
/// that agree on an identical future segment, folded into a single summary
/// record rather than appearing as separate ranked near-duplicates.
#[derive(Debug, Clone, PartialEq)]
pub struct FutureAggregate {
    pub future: Vec<Event>,
    /// `Σ potential` across every supporting prediction.
    pub aggregate_potential: f64,
    /// Number of distinct patterns predicting this future.
    pub supporting_patterns: usize,
    /// `Σ similarity · freq` across every supporting prediction.
    pub total_weighted_frequency: f64,
}

/// Group `predictions` by their future segment's canonical serialization and
/// compute each group's `aggregate_potential`, `supporting_patterns`, and
/// `total_weighted_frequency` per §4.13. This is an additional, opt-in view
/// computed over an already-assembled batch; it does not replace or reorder
/// the per-pattern `Prediction` list the caller ranks separately.
///
/// Groups are returned sorted by descending `aggregate_potential`, tying on
/// the canonical future serialization for determinism.
pub fn aggregate_by_future(predictions: &[Prediction]) -> Vec<FutureAggregate> {
    let mut groups: HashMap<String, FutureAggregate> = HashMap::new();
    for p in predictions {
        let key = serde_json::to_string(&p.future).unwrap_or_default();
        let group = groups.entry(key).or_insert_with(|| FutureAggregate {
            future: p.future.clone(),
            aggregate_potential: 0.0,
            supporting_patterns: 0,
            total_weighted_frequency: 0.0,
        });
        group.aggregate_potential += p.metrics.potential;
        group.supporting_patterns += 1;
        group.total_weighted_frequency += p.metrics.similarity * p.frequency as f64;
    }

    let mut out: Vec<FutureAggregate> = groups.into_values().collect();
    out.sort_by(|a, b| {
        b.aggregate_potential
            .partial_cmp(&a.aggregate_potential)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| {
                let a_key = serde_json::to_string(&a.future).unwrap_or_default();
                let b_key = serde_json::to_string(&b.future).unwrap_or_default();
                a_key.cmp(&b_key)
            })
    });
    out
}
