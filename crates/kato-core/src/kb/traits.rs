//! Collaborator boundary
//!
//! These three traits are the external interface the core depends on:
//! a columnar analytical store (Collaborator A), a KV store (Collaborator
//! B), and an ANN vector service (Collaborator C). Production deployments
//! swap in real implementations of these traits; `kb::sqlite` and
//! `kb::ann` ship a bundled SQLite-backed default sufficient to run the
//! core standalone.

use std::collections::{BTreeMap, HashSet};

use crate::pattern::PatternCore;

use super::error::Result;

/// Collaborator A: columnar analytical store for pattern bodies and LSH
/// postings, partitioned by `kb_id`.
pub trait ColumnarStore: Send + Sync {
    /// Insert `core`'s immutable body under `kb_id` if absent. Returns
    /// `true` if a row was inserted, `false` if `(kb_id, core.name)`
    /// already existed (body left untouched).
    fn insert_if_absent(&self, kb_id: &str, core: &PatternCore) -> Result<bool>;

    /// Bulk fetch full pattern bodies by name.
    fn fetch(&self, kb_id: &str, names: &[String]) -> Result<Vec<PatternCore>>;

    /// Fetch one pattern body.
    fn fetch_one(&self, kb_id: &str, name: &str) -> Result<Option<PatternCore>>;

    /// Cheap prefilter projection: `(length, token_count, first_token, last_token)`.
    fn fetch_prefilter(&self, kb_id: &str, name: &str) -> Result<Option<PrefilterRow>>;

    /// Record LSH postings for a pattern: `(band_index, band_hash) -> name`.
    fn upsert_lsh_postings(&self, kb_id: &str, name: &str, bands: &[u64]) -> Result<()>;

    /// Union of posting lists for the given band hashes (filter pipeline Stage A).
    fn candidates_by_bands(&self, kb_id: &str, band_hashes: &[u64]) -> Result<HashSet<String>>;

    /// Number of shared bands between a candidate's stored bands and the
    /// query's band hashes (used for the Stage B coarse floor).
    fn shared_band_count(&self, kb_id: &str, name: &str, query_bands: &[u64]) -> Result<usize>;

    /// Number of distinct patterns stored under `kb_id`.
    fn count(&self, kb_id: &str) -> Result<u64>;

    /// Drop the entire partition for `kb_id`.
    fn drop_partition(&self, kb_id: &str) -> Result<()>;
}

/// Cheap prefilter projection used by the filter pipeline's Stage B.
#[derive(Debug, Clone)]
pub struct PrefilterRow {
    pub length: u32,
    pub token_count: u32,
    pub first_token: String,
    pub last_token: String,
}

/// Collaborator B: KV store for pattern roll-up state, symbol-frequency
/// counters, and session state.
pub trait KvStore: Send + Sync {
    /// Atomically increment `pattern:<kb_id>:<name>:freq`, initializing at 1
    /// if absent. Returns the new value.
    fn incr_freq(&self, kb_id: &str, name: &str) -> Result<u64>;

    /// Current `freq`, or `None` if the key does not exist (readers tolerate
    /// this as `freq = 1`, so a write crash between steps still recovers).
    fn get_freq(&self, kb_id: &str, name: &str) -> Result<Option<u64>>;

    /// Append `snapshot` to the pattern's rolling emotives window, trimming
    /// to the `persistence` newest entries. No-op if `snapshot` is empty.
    fn append_emotives(
        &self,
        kb_id: &str,
        name: &str,
        snapshot: &BTreeMap<String, f32>,
        persistence: usize,
    ) -> Result<Vec<BTreeMap<String, f32>>>;

    fn get_emotives(&self, kb_id: &str, name: &str) -> Result<Vec<BTreeMap<String, f32>>>;

    /// Set-union `metadata` into the pattern's stored metadata and return
    /// the merged result.
    fn union_metadata(
        &self,
        kb_id: &str,
        name: &str,
        metadata: &BTreeMap<String, HashSet<String>>,
    ) -> Result<BTreeMap<String, HashSet<String>>>;

    fn get_metadata(&self, kb_id: &str, name: &str) -> Result<BTreeMap<String, HashSet<String>>>;

    /// Increment the per-`kb_id` occurrence counter for each symbol (used by
    /// `itfdf_similarity`).
    fn incr_symbol_frequencies(&self, kb_id: &str, symbols: &[&str]) -> Result<()>;

    fn symbol_frequency(&self, kb_id: &str, symbol: &str) -> Result<u64>;

    /// Remove every key with prefix `pattern:<kb_id>:` (part of bulk delete).
    fn delete_pattern_keys(&self, kb_id: &str) -> Result<()>;

    /// Generic session-state blob storage (`session:<id>[:stm|:emotives|:metadata]`).
    fn put_blob(&self, key: &str, value: &[u8], ttl_seconds: Option<u64>) -> Result<()>;
    fn get_blob(&self, key: &str) -> Result<Option<Vec<u8>>>;
    fn delete_blob(&self, key: &str) -> Result<()>;
    /// List keys with the given prefix (used by the session manager's GC sweep).
    fn list_keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>>;
}

/// Payload stored alongside a raw vector in the ANN collection.
#[derive(Debug, Clone, Default)]
pub struct AnnPayload {
    pub symbol: String,
    pub pattern_name: Option<String>,
    pub event_index: Option<u32>,
}

/// Collaborator C: ANN vector service, one collection per `kb_id`.
pub trait AnnService: Send + Sync {
    fn upsert(&self, kb_id: &str, point_id: &str, vector: &[f32], payload: AnnPayload) -> Result<()>;

    /// Top-`k` nearest neighbors by cosine distance.
    fn search(&self, kb_id: &str, query: &[f32], top_k: usize) -> Result<Vec<(String, f32)>>;

    fn drop_collection(&self, kb_id: &str) -> Result<()>;
}
