//! Pattern writer
//!
//! Owns the insert-or-update semantics against the columnar + KV
//! collaborators: first write initializes the immutable body and roll-up
//! state; every subsequent write of the same `(kb_id, name)` increments
//! `freq`, appends an emotive snapshot (trimmed to `persistence`), and
//! set-unions metadata.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use crate::pattern::PatternCore;

use super::error::Result;
use super::traits::{ColumnarStore, KvStore};

/// Writes a pattern's immutable body (if new) and rolls up its mutable
/// accumulator state (always).
pub struct PatternWriter {
    columnar: Arc<dyn ColumnarStore>,
    kv: Arc<dyn KvStore>,
}

/// Outcome of one write.
#[derive(Debug, Clone)]
pub struct WriteOutcome {
    pub name: String,
    pub freq: u64,
    pub was_new: bool,
}

impl PatternWriter {
    pub fn new(columnar: Arc<dyn ColumnarStore>, kv: Arc<dyn KvStore>) -> Self {
        Self { columnar, kv }
    }

    /// Insert/upsert `core` under `kb_id`, rolling up `emotives` (already
    /// zero-filtered and averaged by the aggregator) and
    /// `metadata`.
    pub fn write(
        &self,
        kb_id: &str,
        core: &PatternCore,
        emotives: &BTreeMap<String, f32>,
        metadata: &BTreeMap<String, HashSet<String>>,
        persistence: usize,
    ) -> Result<WriteOutcome> {
        let was_new = self.columnar.insert_if_absent(kb_id, core)?;

        // Order matters: increment freq first so later initializer-inserts
        // against pattern_kv (in append_emotives/union_metadata) find the
        // row already present and leave freq untouched.
        let freq = self.kv.incr_freq(kb_id, &core.name)?;
        self.kv.append_emotives(kb_id, &core.name, emotives, persistence)?;
        self.kv.union_metadata(kb_id, &core.name, metadata)?;

        let symbols: Vec<&str> = core.events.iter().flatten().map(|s| s.as_str()).collect();
        self.kv.incr_symbol_frequencies(kb_id, &symbols)?;

        Ok(WriteOutcome {
            name: core.name.clone(),
            freq,
            was_new,
        })
    }
}
