//! Session-bound processor configuration: the exhaustive set of
//! recognized options and the partial-patch type used to update them.

use serde::{Deserialize, Serialize};

use crate::predict::SortKey;
use crate::stm::StmMode;

/// Ranking key accepted by `rank_sort_algo`. Serialized in `snake_case` to
/// match the ranking key vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RankSortAlgo {
    #[default]
    Potential,
    Similarity,
    Evidence,
    Confidence,
    Snr,
    Frequency,
    Fragmentation,
    NormalizedEntropy,
    GlobalNormalizedEntropy,
    ItfdfSimilarity,
    Confluence,
    PredictiveInformation,
    BayesianPosterior,
}

impl RankSortAlgo {
    /// Every `rank_sort_algo` maps onto a ranker `SortKey` one-to-one.
    pub fn to_sort_key(self) -> SortKey {
        match self {
            RankSortAlgo::Potential => SortKey::Potential,
            RankSortAlgo::Similarity => SortKey::Similarity,
            RankSortAlgo::Evidence => SortKey::Evidence,
            RankSortAlgo::Confidence => SortKey::Confidence,
            RankSortAlgo::Snr => SortKey::Snr,
            RankSortAlgo::Frequency => SortKey::Frequency,
            RankSortAlgo::Fragmentation => SortKey::Fragmentation,
            RankSortAlgo::NormalizedEntropy => SortKey::NormalizedEntropy,
            RankSortAlgo::GlobalNormalizedEntropy => SortKey::GlobalNormalizedEntropy,
            RankSortAlgo::ItfdfSimilarity => SortKey::ItfdfSimilarity,
            RankSortAlgo::Confluence => SortKey::Confluence,
            RankSortAlgo::PredictiveInformation => SortKey::PredictiveInformation,
            RankSortAlgo::BayesianPosterior => SortKey::BayesianPosterior,
        }
    }
}

/// The exhaustive set of recognized session configuration options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ProcessorConfig {
    pub recall_threshold: f64,
    pub max_predictions: Option<usize>,
    pub persistence: usize,
    pub max_pattern_length: u32,
    pub stm_mode: StmMode,
    pub rank_sort_algo: RankSortAlgo,
    pub sort_symbols: bool,
    pub use_token_matching: bool,
    pub session_ttl_seconds: u64,
    pub session_auto_extend: bool,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            recall_threshold: 0.1,
            max_predictions: None,
            persistence: 3,
            max_pattern_length: 0,
            stm_mode: StmMode::Clear,
            rank_sort_algo: RankSortAlgo::default(),
            sort_symbols: true,
            use_token_matching: true,
            session_ttl_seconds: 3600,
            session_auto_extend: false,
        }
    }
}

/// Partial patch applied atomically by `update_config`: every field
/// left `None` leaves the corresponding live value untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ProcessorConfigPatch {
    pub recall_threshold: Option<f64>,
    pub max_predictions: Option<Option<usize>>,
    pub persistence: Option<usize>,
    pub max_pattern_length: Option<u32>,
    pub stm_mode: Option<StmMode>,
    pub rank_sort_algo: Option<RankSortAlgo>,
    pub sort_symbols: Option<bool>,
    pub use_token_matching: Option<bool>,
    pub session_ttl_seconds: Option<u64>,
    pub session_auto_extend: Option<bool>,
}

impl ProcessorConfig {
    /// Apply `patch` in place, leaving unset fields untouched.
    pub fn apply_patch(&mut self, patch: ProcessorConfigPatch) {
        if let Some(v) = patch.recall_threshold {
            self.recall_threshold = v;
        }
        if let Some(v) = patch.max_predictions {
            self.max_predictions = v;
        }
        if let Some(v) = patch.persistence {
            self.persistence = v;
        }
        if let Some(v) = patch.max_pattern_length {
            self.max_pattern_length = v;
        }
        if let Some(v) = patch.stm_mode {
            self.stm_mode = v;
        }
        if let Some(v) = patch.rank_sort_algo {
            self.rank_sort_algo = v;
        }
        if let Some(v) = patch.sort_symbols {
            self.sort_symbols = v;
        }
        if let Some(v) = patch.use_token_matching {
            self.use_token_matching = v;
        }
        if let Some(v) = patch.session_ttl_seconds {
            self.session_ttl_seconds = v;
        }
        if let Some(v) = patch.session_auto_extend {
            self.session_auto_extend = v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_only_touches_set_fields() {
        let mut config = ProcessorConfig::default();
        let patch = ProcessorConfigPatch {
            recall_threshold: Some(0.5),
            ..Default::default()
        };
        config.apply_patch(patch);
        assert_eq!(config.recall_threshold, 0.5);
        assert_eq!(config.persistence, 3);
    }

    #[test]
    fn max_predictions_can_be_patched_back_to_unbounded() {
        let mut config = ProcessorConfig {
            max_predictions: Some(5),
            ..Default::default()
        };
        let patch = ProcessorConfigPatch {
            max_predictions: Some(None),
            ..Default::default()
        };
        config.apply_patch(patch);
        assert_eq!(config.max_predictions, None);
    }
}
