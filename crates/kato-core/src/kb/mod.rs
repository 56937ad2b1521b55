//! Pattern knowledge base: the unified read/write facade over the
//! columnar + KV collaborators, scoped by `kb_id`.

mod error;
mod migrations;
pub mod sqlite;
mod traits;
mod writer;

pub use error::{Result, StorageError};
pub use sqlite::{SqliteAnnService, SqliteBackend};
pub use traits::{AnnPayload, AnnService, ColumnarStore, KvStore, PrefilterRow};
pub use writer::{PatternWriter, WriteOutcome};

use std::collections::{BTreeMap, HashSet};
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

use lru::LruCache;

use crate::pattern::PatternCore;
use crate::Pattern;

/// Default capacity of the in-process pattern-row cache ("bounded
/// LRU caches for pattern rows keyed by (kb_id, name)").
const DEFAULT_CACHE_CAPACITY: usize = 4096;

/// Facade the filter pipeline and prediction assembler use to reach the
/// columnar + KV + ANN collaborators, strictly scoped by `kb_id`.
pub struct KnowledgeBase {
    columnar: Arc<dyn ColumnarStore>,
    kv: Arc<dyn KvStore>,
    ann: Arc<dyn AnnService>,
    writer: PatternWriter,
    cache: Mutex<LruCache<(String, String), Pattern>>,
}

impl KnowledgeBase {
    pub fn new(columnar: Arc<dyn ColumnarStore>, kv: Arc<dyn KvStore>, ann: Arc<dyn AnnService>) -> Self {
        let capacity = NonZeroUsize::new(DEFAULT_CACHE_CAPACITY).expect("nonzero capacity");
        Self {
            writer: PatternWriter::new(columnar.clone(), kv.clone()),
            columnar,
            kv,
            ann,
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Insert/upsert a pattern, invalidating any cached row for its name.
    pub fn write(
        &self,
        kb_id: &str,
        core: &PatternCore,
        emotives: &BTreeMap<String, f32>,
        metadata: &BTreeMap<String, HashSet<String>>,
        persistence: usize,
    ) -> Result<WriteOutcome> {
        let outcome = self.writer.write(kb_id, core, emotives, metadata, persistence)?;
        self.cache
            .lock()
            .expect("cache mutex poisoned")
            .pop(&(kb_id.to_string(), core.name.clone()));
        Ok(outcome)
    }

    pub fn exists(&self, kb_id: &str, name: &str) -> Result<bool> {
        Ok(self.columnar.fetch_prefilter(kb_id, name)?.is_some())
    }

    pub fn count(&self, kb_id: &str) -> Result<u64> {
        self.columnar.count(kb_id)
    }

    /// Assemble a full [`Pattern`] from the columnar body plus KV roll-up
    /// state. Readers tolerate missing KV metadata as `freq = 1`, empty
    /// emotives/metadata.
    pub fn get(&self, kb_id: &str, name: &str) -> Result<Option<Pattern>> {
        if let Some(hit) = self.cache.lock().expect("cache mutex poisoned").get(&(kb_id.to_string(), name.to_string())) {
            return Ok(Some(hit.clone()));
        }

        let Some(core) = self.columnar.fetch_one(kb_id, name)? else {
            return Ok(None);
        };
        let pattern = self.assemble(kb_id, core)?;
        self.cache
            .lock()
            .expect("cache mutex poisoned")
            .put((kb_id.to_string(), name.to_string()), pattern.clone());
        Ok(Some(pattern))
    }

    fn assemble(&self, kb_id: &str, core: PatternCore) -> Result<Pattern> {
        let freq = self.kv.get_freq(kb_id, &core.name)?.unwrap_or(1);
        let emotives_window = self.kv.get_emotives(kb_id, &core.name)?;
        let metadata = self.kv.get_metadata(kb_id, &core.name)?;
        // A row fetched from the columnar store always carries its real
        // persisted timestamps; `unwrap_or_else` only guards a `PatternCore`
        // that was never actually written (shouldn't reach `assemble`).
        let created_at = core.created_at.unwrap_or_else(chrono::Utc::now);
        let updated_at = core.updated_at.unwrap_or_else(chrono::Utc::now);
        Ok(Pattern {
            name: core.name,
            kb_id: kb_id.to_string(),
            events: core.events,
            length: core.length,
            freq,
            emotives_window,
            metadata,
            minhash: core.minhash,
            lsh_bands: core.lsh_bands,
            first_token: core.first_token,
            last_token: core.last_token,
            token_count: core.token_count,
            created_at,
            updated_at,
        })
    }

    /// Bulk fetch full pattern rows by name.
    pub fn fetch_patterns(&self, kb_id: &str, names: &[String]) -> Result<Vec<Pattern>> {
        names
            .iter()
            .filter_map(|name| self.get(kb_id, name).transpose())
            .collect()
    }

    /// Union of LSH posting lists across the given band hashes (filter pipeline Stage A).
    pub fn candidates_by_bands(&self, kb_id: &str, band_hashes: &[u64]) -> Result<HashSet<String>> {
        self.columnar.candidates_by_bands(kb_id, band_hashes)
    }

    pub fn fetch_prefilter(&self, kb_id: &str, name: &str) -> Result<Option<PrefilterRow>> {
        self.columnar.fetch_prefilter(kb_id, name)
    }

    pub fn shared_band_count(&self, kb_id: &str, name: &str, query_bands: &[u64]) -> Result<usize> {
        self.columnar.shared_band_count(kb_id, name, query_bands)
    }

    /// Occurrences of `symbol` across all patterns in `kb_id` (used by
    /// `itfdf_similarity`).
    pub fn symbol_frequency(&self, kb_id: &str, symbol: &str) -> Result<u64> {
        self.kv.symbol_frequency(kb_id, symbol)
    }

    /// Drop everything under `kb_id` across all three collaborators:
    /// the columnar partition, all `pattern:<kb_id>:` KV keys, and the
    /// `vectors_<kb_id>` ANN collection. Idempotent.
    pub fn bulk_delete(&self, kb_id: &str) -> Result<()> {
        self.columnar.drop_partition(kb_id)?;
        self.kv.delete_pattern_keys(kb_id)?;
        self.ann.drop_collection(kb_id)?;
        let mut cache = self.cache.lock().expect("cache mutex poisoned");
        let stale: Vec<(String, String)> = cache
            .iter()
            .filter(|((k, _), _)| k == kb_id)
            .map(|(key, _)| key.clone())
            .collect();
        for key in &stale {
            cache.pop(key);
        }
        tracing::info!(kb_id, evicted = stale.len(), "bulk deleted knowledge base partition");
        Ok(())
    }

    pub fn ann(&self) -> &Arc<dyn AnnService> {
        &self.ann
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::MinHashParams;

    fn core(events: Vec<Vec<&str>>) -> PatternCore {
        let events: Vec<Vec<String>> = events
            .into_iter()
            .map(|e| e.into_iter().map(String::from).collect())
            .collect();
        PatternCore::derive(events, MinHashParams::default())
    }

    fn kb() -> KnowledgeBase {
        let backend = Arc::new(SqliteBackend::open_in_memory().unwrap());
        let ann = Arc::new(SqliteAnnService::new(backend.clone()));
        KnowledgeBase::new(backend.clone(), backend, ann)
    }

    #[test]
    fn write_then_get_roundtrips() {
        let kb = kb();
        let c = core(vec![vec!["a", "b"]]);
        kb.write("kb1", &c, &BTreeMap::new(), &BTreeMap::new(), 3).unwrap();
        let pattern = kb.get("kb1", &c.name).unwrap().unwrap();
        assert_eq!(pattern.freq, 1);
        assert_eq!(pattern.events, c.events);
    }

    #[test]
    fn bulk_delete_is_idempotent() {
        let kb = kb();
        let c = core(vec![vec!["a"]]);
        kb.write("kb1", &c, &BTreeMap::new(), &BTreeMap::new(), 3).unwrap();
        kb.bulk_delete("kb1").unwrap();
        kb.bulk_delete("kb1").unwrap();
        assert_eq!(kb.count("kb1").unwrap(), 0);
        assert!(kb.get("kb1", &c.name).unwrap().is_none());
    }

    #[test]
    fn cross_kb_isolation() {
        let kb = kb();
        let c = core(vec![vec!["a"]]);
        kb.write("tenant1", &c, &BTreeMap::new(), &BTreeMap::new(), 3).unwrap();
        assert_eq!(kb.count("tenant2").unwrap(), 0);
        assert!(kb.get("tenant2", &c.name).unwrap().is_none());
    }
}
