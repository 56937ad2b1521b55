//! Session-bound orchestrator: binds the STM buffer,
//! aggregator, pattern knowledge base, and prediction pipeline into the
//! `observe/learn/get_predictions/clear_*` surface a session exposes.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use crate::config::ProcessorConfig;
use crate::kb::KnowledgeBase;
use crate::pattern::{Event, MinHashParams, PatternCore};
use crate::predict::{self, PotentialMode, Prediction, RankConfig};
use crate::stm::{Aggregator, Stm};
use crate::symbol::{normalize_event_with_vectors, symbolize_vector};
use crate::{KatoError, Result};

/// A single boundary-validated observation, modeled as a tagged record
/// rather than a loosely-typed map. At least one of `strings`/`vectors`
/// must be non-empty.
#[derive(Debug, Clone, Default)]
pub struct Observation {
    pub strings: Vec<String>,
    pub vectors: Vec<Vec<f32>>,
    pub emotives: BTreeMap<String, f32>,
    pub metadata: BTreeMap<String, HashSet<String>>,
    pub unique_id: Option<String>,
}

/// Outcome of one `observe` call.
#[derive(Debug, Clone)]
pub struct ObserveOutcome {
    pub stm_length: usize,
    pub auto_learned_pattern: Option<String>,
}

/// Read-only session status snapshot (`get_status`).
#[derive(Debug, Clone)]
pub struct ProcessorStatus {
    pub kb_id: String,
    pub stm_length: usize,
    pub stm_total_symbols: usize,
    pub pattern_count: u64,
}

impl Processor {
    /// Construct a processor bound to `kb_id`, backed by `kb`.
    pub fn new(kb: Arc<KnowledgeBase>, kb_id: String, config: ProcessorConfig, vector_dim: usize) -> Self {
        Self {
            kb,
            kb_id,
            config,
            stm: Stm::new(),
            aggregator: Aggregator::new(),
            minhash_params: MinHashParams::default(),
            vector_dim,
        }
    }

    /// Validate, normalize, symbolize vectors, and append `observation` to
    /// STM and the emotive/metadata accumulators.
    ///
    /// Triggers a learn automatically if `max_pattern_length > 0` and the
    /// STM reaches that length after this observation.
    pub fn observe(&mut self, observation: Observation) -> Result<ObserveOutcome> {
        if observation.strings.is_empty() && observation.vectors.is_empty() {
            return Err(KatoError::InvalidObservation(
                "observation has neither strings nor vectors".to_string(),
            ));
        }

        let mut vector_symbols = Vec::with_capacity(observation.vectors.len());
        for vector in &observation.vectors {
            let symbol = symbolize_vector(vector, self.vector_dim).map_err(|e| {
                KatoError::InvalidObservation(format!("vector symbolization failed: {e}"))
            })?;
            self.kb.ann().upsert(
                &self.kb_id,
                &symbol,
                vector,
                crate::kb::AnnPayload {
                    symbol: symbol.clone(),
                    pattern_name: None,
                    event_index: Some(self.stm.len() as u32),
                },
            )?;
            vector_symbols.push(symbol);
        }

        let event: Event = if self.config.sort_symbols {
            normalize_event_with_vectors(observation.strings, vector_symbols)
        } else {
            let mut merged = observation.strings;
            merged.extend(vector_symbols);
            merged
        };

        self.stm.push(event);
        self.aggregator.observe_emotives(observation.emotives);
        self.aggregator.observe_metadata(observation.metadata);

        let stm_length = self.stm.len();
        tracing::debug!(kb_id = %self.kb_id, stm_length, "observation appended to stm");
        let auto_learned_pattern = if self.stm.should_auto_learn(self.config.max_pattern_length) {
            self.learn()?
        } else {
            None
        };

        Ok(ObserveOutcome {
            stm_length,
            auto_learned_pattern,
        })
    }

    /// Build and write a pattern from the current STM, if it holds at
    /// least 2 strings total; otherwise a no-op that returns `None`
    /// ("insufficient STM returns an empty pattern name, not an error").
    pub fn learn(&mut self) -> Result<Option<String>> {
        if self.stm.total_symbols() < 2 {
            return Ok(None);
        }

        let events = self.stm.as_vec();
        let core = PatternCore::derive(events, self.minhash_params);
        let emotives = self.aggregator.mean_emotives();
        let metadata = self.aggregator.metadata();
        let outcome = self.kb.write(&self.kb_id, &core, &emotives, &metadata, self.config.persistence)?;
        tracing::info!(
            kb_id = %self.kb_id,
            name = %outcome.name,
            freq = outcome.freq,
            was_new = outcome.was_new,
            "learned pattern",
        );

        self.stm.transition(self.config.stm_mode);
        self.aggregator.reset();

        Ok(Some(crate::pattern::present_pattern_name(&outcome.name)))
    }

    /// Run the filter pipeline + metrics + ranker against the current STM.
    /// Returns an empty list (not an error) when the STM holds fewer than 2
    /// strings total.
    pub fn get_predictions(&self) -> Result<Vec<Prediction>> {
        if self.stm.total_symbols() < 2 {
            return Ok(Vec::new());
        }

        let rank_config = RankConfig {
            primary: self.config.rank_sort_algo.to_sort_key(),
            max_predictions: self.config.max_predictions,
        };

        let predictions = predict::predict(
            &self.kb,
            &self.kb_id,
            &self.stm.as_vec(),
            self.config.recall_threshold,
            self.minhash_params,
            PotentialMode::Standard,
            &rank_config,
        )?;
        tracing::debug!(kb_id = %self.kb_id, count = predictions.len(), "assembled predictions");
        Ok(predictions)
    }

    /// Future-level aggregation (§4.13), computed over the same batch
    /// `get_predictions` would return: groups predictions that agree on an
    /// identical future segment and reports each group's combined signal.
    /// An additional, opt-in view — it does not replace `get_predictions`.
    pub fn get_future_aggregates(&self) -> Result<Vec<predict::FutureAggregate>> {
        let predictions = self.get_predictions()?;
        Ok(predict::aggregate_by_future(&predictions))
    }

    /// Empty the STM and reset the accumulators, discarding unlearned state.
    pub fn clear_stm(&mut self) {
        self.stm.clear();
        self.aggregator.reset();
    }

    /// `clear_stm` plus a bulk delete of every pattern under this `kb_id`.
    pub fn clear_all(&mut self) -> Result<()> {
        self.clear_stm();
        self.kb.bulk_delete(&self.kb_id)?;
        Ok(())
    }

    pub fn get_pattern(&self, name: &str) -> Result<crate::pattern::Pattern> {
        self.kb
            .get(&self.kb_id, name)?
            .ok_or_else(|| KatoError::PatternNotFound(name.to_string()))
    }

    /// Atomically patch the live configuration (`update_config`).
    pub fn update_config(&mut self, patch: crate::config::ProcessorConfigPatch) {
        self.config.apply_patch(patch);
    }

    pub fn get_stm(&self) -> Vec<Event> {
        self.stm.as_vec()
    }

    pub fn get_status(&self) -> Result<ProcessorStatus> {
        Ok(ProcessorStatus {
            kb_id: self.kb_id.clone(),
            stm_length: self.stm.len(),
            stm_total_symbols: self.stm.total_symbols(),
            pattern_count: self.kb.count(&self.kb_id)?,
        })
    }

    /// Current effective configuration.
    pub fn get_metrics(&self) -> &ProcessorConfig {
        &self.config
    }

    pub fn kb_id(&self) -> &str {
        &self.kb_id
    }
}

/// Per-session orchestrator. Exclusively owned by one session: no
/// internal synchronization, callers serialize access per session.
pub struct Processor {
    kb: Arc<KnowledgeBase>,
    kb_id: String,
    config: ProcessorConfig,
    stm: Stm,
    aggregator: Aggregator,
    minhash_params: MinHashParams,
    vector_dim: usize,
}
