//! Metrics engine
//!
//! All metrics are pure functions of the matched-candidate set handed to
//! [`compute_all`] plus per-kb symbol-frequency lookups; nothing here
//! mutates storage. Metrics that are inherently comparative (`confluence`,
//! `bayesian_posterior`, `global_normalized_entropy`, `predictive_information`)
//! are computed over the batch of candidates being ranked together, matching
//! how `confluence` is itself defined against "the sum of all candidates'
//! potentials" in the same batch.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::kb::KnowledgeBase;
use crate::pattern::{flatten, Event};
use crate::search::MatchedCandidate;

/// `potential`'s combining formula (the Bayesian-aggregation
/// form is the default; the legacy additive form is an accepted
/// configurable alternative).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PotentialMode {
    #[default]
    Standard,
    Legacy,
}

/// All per-prediction metrics (see [`crate::predict::Prediction`]).
#[derive(Debug, Clone, Default)]
pub struct PredictionMetrics {
    pub evidence: f64,
    pub confidence: f64,
    pub snr: f64,
    pub similarity: f64,
    pub fragmentation: u32,
    pub itfdf_similarity: f64,
    pub predictive_information: f64,
    pub potential: f64,
    pub normalized_entropy: f64,
    pub global_normalized_entropy: f64,
    pub confluence: f64,
    pub bayesian_posterior: f64,
}

/// Compute metrics for every candidate in `candidates`, in the same order.
pub fn compute_all(
    kb: &KnowledgeBase,
    kb_id: &str,
    candidates: &[MatchedCandidate],
    stm: &[Event],
    potential_mode: PotentialMode,
) -> crate::Result<Vec<PredictionMetrics>> {
    if candidates.is_empty() {
        return Ok(Vec::new());
    }

    let n_patterns = kb.count(kb_id)?.max(1) as f64;
    let stm_symbols: std::collections::HashSet<String> =
        flatten(stm).into_iter().collect();

    // Per-candidate base metrics that don't need the rest of the batch.
    let mut evidence = Vec::with_capacity(candidates.len());
    let mut confidence = Vec::with_capacity(candidates.len());
    let mut snr = Vec::with_capacity(candidates.len());
    let mut similarity = Vec::with_capacity(candidates.len());
    let mut fragmentation = Vec::with_capacity(candidates.len());
    let mut itfdf = Vec::with_capacity(candidates.len());

    for c in candidates {
        let present_len = c.last_match_event_index - c.first_match_event_index + 1;
        evidence.push(present_len as f64 / c.pattern.length.max(1) as f64);

        let present_symbol_count = c.matches.len() + c.missing.len();
        confidence.push(if present_symbol_count > 0 {
            c.matches.len() as f64 / present_symbol_count as f64
        } else {
            0.0
        });

        let denom = c.matches.len() + c.extras.len();
        snr.push(if denom > 0 {
            c.matches.len() as f64 / denom as f64
        } else {
            0.0
        });

        similarity.push(c.alignment.similarity());
        fragmentation.push(c.alignment.fragmentation());

        itfdf.push(itfdf_similarity(kb, kb_id, c, &stm_symbols, n_patterns)?);
    }

    // Frequencies and similarity-weighted frequency across the batch, used
    // by bayesian_posterior, confluence, and the future-grouped
    // predictive_information.
    let total_freq: f64 = candidates.iter().map(|c| c.pattern.freq as f64).sum();
    let likelihoods = &similarity;
    let total_likelihood_weighted: f64 = candidates
        .iter()
        .zip(likelihoods)
        .map(|(c, &l)| l * (c.pattern.freq as f64 / total_freq.max(1.0)))
        .sum();

    let bayesian_posterior: Vec<f64> = candidates
        .iter()
        .zip(likelihoods)
        .map(|(c, &l)| {
            let prior = c.pattern.freq as f64 / total_freq.max(1.0);
            if total_likelihood_weighted > 0.0 {
                (l * prior) / total_likelihood_weighted
            } else {
                0.0
            }
        })
        .collect();

    let predictive_information = predictive_information_by_future(candidates, &similarity);

    let potential: Vec<f64> = (0..candidates.len())
        .map(|i| match potential_mode {
            PotentialMode::Standard => similarity[i] * predictive_information[i],
            PotentialMode::Legacy => {
                (evidence[i] + confidence[i]) * snr[i]
                    + itfdf[i]
                    + 1.0 / (fragmentation[i] as f64 + 1.0)
            }
        })
        .collect();

    let total_potential: f64 = potential.iter().sum();
    let confluence: Vec<f64> = potential
        .iter()
        .map(|p| if total_potential > 0.0 { p / total_potential } else { 0.0 })
        .collect();

    let normalized_entropy: Vec<f64> = candidates
        .iter()
        .map(|c| emotive_normalized_entropy(c))
        .collect();

    let global_normalized_entropy = frequency_normalized_entropy(candidates);

    Ok((0..candidates.len())
        .map(|i| PredictionMetrics {
            evidence: evidence[i],
            confidence: confidence[i],
            snr: snr[i],
            similarity: similarity[i],
            fragmentation: fragmentation[i],
            itfdf_similarity: itfdf[i],
            predictive_information: predictive_information[i],
            potential: potential[i],
            normalized_entropy: normalized_entropy[i],
            global_normalized_entropy,
            confluence: confluence[i],
            bayesian_posterior: bayesian_posterior[i],
        })
        .collect())
}

fn itfdf_similarity(
    kb: &KnowledgeBase,
    kb_id: &str,
    c: &MatchedCandidate,
    stm_symbols: &std::collections::HashSet<String>,
    n_patterns: f64,
) -> crate::Result<f64> {
    let pattern_symbols = c.pattern.symbols();
    let shared: Vec<&str> = pattern_symbols
        .iter()
        .filter(|s| stm_symbols.contains(**s))
        .copied()
        .collect();

    let mut sum = 0.0;
    for symbol in &shared {
        let freq = kb.symbol_frequency(kb_id, symbol)?.max(1) as f64;
        sum += 1.0 / (1.0 + (1.0 + freq / n_patterns).log2());
    }

    let denom = pattern_symbols.len().max(stm_symbols.len()).max(1) as f64;
    Ok(sum / denom)
}

/// Group candidates by canonical future serialization and compute each
/// group's Shannon self-information under frequency-similarity weighting.
fn predictive_information_by_future(
    candidates: &[MatchedCandidate],
    similarity: &[f64],
) -> Vec<f64> {
    let mut group_weight: HashMap<String, f64> = HashMap::new();
    let mut keys = Vec::with_capacity(candidates.len());
    for (c, &sim) in candidates.iter().zip(similarity) {
        let future = future_slice(c);
        let key = serde_json::to_string(&future).unwrap_or_default();
        let weight = sim * c.pattern.freq as f64;
        *group_weight.entry(key.clone()).or_insert(0.0) += weight;
        keys.push(key);
    }
    let total: f64 = group_weight.values().sum();

    keys.into_iter()
        .map(|key| {
            let w = group_weight.get(&key).copied().unwrap_or(0.0);
            if total > 0.0 && w > 0.0 {
                let p = w / total;
                -(p.log2())
            } else {
                0.0
            }
        })
        .collect()
}

pub(crate) fn future_slice(c: &MatchedCandidate) -> Vec<Vec<String>> {
    c.pattern.events[(c.last_match_event_index + 1)..].to_vec()
}

/// Per-key metadata value-set cardinalities, folded into the entropy inputs
/// as additional weighted buckets alongside emotives/frequency (see
/// SPEC_FULL.md §C for why cardinality, not set membership, is the chosen
/// weight).
fn metadata_cardinality_weights(metadata: &BTreeMap<String, HashSet<String>>) -> Vec<f64> {
    metadata.values().map(|set| set.len() as f64).filter(|&n| n > 0.0).collect()
}

fn emotive_normalized_entropy(c: &MatchedCandidate) -> f64 {
    let mut weights: Vec<f64> = Vec::new();
    if let Some(latest) = c.pattern.emotives_window.last() {
        weights.extend(latest.values().map(|v| v.abs() as f64));
    }
    weights.extend(metadata_cardinality_weights(&c.pattern.metadata));
    shannon_entropy_normalized(weights.into_iter())
}

fn frequency_normalized_entropy(candidates: &[MatchedCandidate]) -> f64 {
    let mut weights: Vec<f64> = candidates.iter().map(|c| c.pattern.freq as f64).collect();
    for c in candidates {
        weights.extend(metadata_cardinality_weights(&c.pattern.metadata));
    }
    shannon_entropy_normalized(weights.into_iter())
}

fn shannon_entropy_normalized(values: impl Iterator<Item = f64> + Clone) -> f64 {
    let total: f64 = values.clone().sum();
    let n = values.clone().count();
    if total <= 0.0 || n <= 1 {
        return 0.0;
    }
    let entropy: f64 = values
        .map(|v| {
            let p = v / total;
            if p > 0.0 {
                -p * p.log2()
            } else {
                0.0
            }
        })
        .sum();
    let max_entropy = (n as f64).log2();
    if max_entropy > 0.0 {
        entropy / max_entropy
    } else {
        0.0
    }
}

/// Present-slice emotive snapshot for a candidate, used when the caller
/// wants the raw (non-entropy) emotives rather than the normalized-entropy
/// summary, e.g. when composing a [`crate::predict::Prediction`].
pub fn latest_emotives(c: &MatchedCandidate) -> BTreeMap<String, f32> {
    c.pattern.emotives_window.last().cloned().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kb::{KnowledgeBase, SqliteAnnService, SqliteBackend};
    use crate::pattern::{MinHashParams, PatternCore};
    use crate::search::run_filter_pipeline;
    use std::sync::Arc;

    fn kb() -> KnowledgeBase {
        let backend = Arc::new(SqliteBackend::open_in_memory().unwrap());
        let ann = Arc::new(SqliteAnnService::new(backend.clone()));
        KnowledgeBase::new(backend.clone(), backend, ann)
    }

    fn ev(words: &[&str]) -> crate::pattern::Event {
        words.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn single_exact_match_metrics_are_correct() {
        let kb = kb();
        let params = MinHashParams::default();
        let events = vec![
            ev(&["coffee", "morning"]),
            ev(&["commute", "train"]),
            ev(&["arrive", "work"]),
        ];
        let core = PatternCore::derive(events, params);
        kb.write("demoA", &core, &BTreeMap::new(), &BTreeMap::new(), 3).unwrap();

        let stm = vec![ev(&["commute", "train"])];
        let candidates = run_filter_pipeline(&kb, "demoA", &stm, 0.1, params).unwrap();
        let metrics = compute_all(&kb, "demoA", &candidates, &stm, PotentialMode::Standard).unwrap();

        assert_eq!(metrics.len(), 1);
        let m = &metrics[0];
        assert!((m.evidence - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(m.confidence, 1.0);
        assert_eq!(m.snr, 1.0);
        assert_eq!(m.fragmentation, 0);
        assert_eq!(m.confluence, 1.0);
        assert_eq!(m.bayesian_posterior, 1.0);
    }

    #[test]
    fn no_candidates_yields_no_metrics() {
        let kb = kb();
        let metrics = compute_all(&kb, "empty", &[], &[], PotentialMode::Standard).unwrap();
        assert!(metrics.is_empty());
    }

    #[test]
    fn metadata_cardinality_is_not_ignored_by_entropy() {
        let mut no_metadata = BTreeMap::new();
        no_metadata.insert("emp".to_string(), HashSet::<String>::new());
        assert!(metadata_cardinality_weights(&no_metadata).is_empty());

        let mut metadata = BTreeMap::new();
        metadata.insert(
            "tags".to_string(),
            HashSet::from(["a".to_string(), "b".to_string(), "c".to_string()]),
        );
        metadata.insert("topic".to_string(), HashSet::from(["x".to_string()]));
        let weights = metadata_cardinality_weights(&metadata);
        assert_eq!(weights.len(), 2);
        let mut sorted = weights.clone();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(sorted, vec![1.0, 3.0]);

        // A prediction distinguished only by metadata is no longer
        // indistinguishable from one with none.
        assert!(shannon_entropy_normalized(weights.into_iter()) > 0.0);
    }
}
