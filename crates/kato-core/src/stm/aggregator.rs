//! Emotive/metadata aggregation across one learn cycle.

use std::collections::{BTreeMap, HashSet};

/// Accumulates per-observation emotive snapshots and metadata unions
/// between learns. Always resets fully after a learn, regardless of STM
/// mode — only the STM buffer itself has a rolling transition.
#[derive(Debug, Clone, Default)]
pub struct Aggregator {
    emotive_snapshots: Vec<BTreeMap<String, f32>>,
    metadata: BTreeMap<String, HashSet<String>>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one observation's emotives, if non-empty.
    pub fn observe_emotives(&mut self, emotives: BTreeMap<String, f32>) {
        if !emotives.is_empty() {
            self.emotive_snapshots.push(emotives);
        }
    }

    /// Record one observation's metadata, unioning each key's string values.
    pub fn observe_metadata(&mut self, metadata: BTreeMap<String, HashSet<String>>) {
        for (key, values) in metadata {
            self.metadata.entry(key).or_default().extend(values);
        }
    }

    /// Per-key arithmetic mean across snapshots that contain that key,
    /// zero-valued entries dropped ("they carry no signal").
    pub fn mean_emotives(&self) -> BTreeMap<String, f32> {
        let mut sums: BTreeMap<&str, f32> = BTreeMap::new();
        let mut counts: BTreeMap<&str, u32> = BTreeMap::new();
        for snapshot in &self.emotive_snapshots {
            for (k, v) in snapshot {
                *sums.entry(k).or_insert(0.0) += v;
                *counts.entry(k).or_insert(0) += 1;
            }
        }
        sums.into_iter()
            .filter_map(|(k, sum)| {
                let count = counts[k] as f32;
                let mean = sum / count;
                if mean == 0.0 {
                    None
                } else {
                    Some((k.to_string(), mean))
                }
            })
            .collect()
    }

    /// The accumulated metadata set-union.
    pub fn metadata(&self) -> BTreeMap<String, HashSet<String>> {
        self.metadata.clone()
    }

    pub fn reset(&mut self) {
        self.emotive_snapshots.clear();
        self.metadata.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.emotive_snapshots.is_empty() && self.metadata.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bmap(pairs: &[(&str, f32)]) -> BTreeMap<String, f32> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn mean_only_counts_snapshots_containing_key() {
        let mut agg = Aggregator::new();
        agg.observe_emotives(bmap(&[("joy", 1.0)]));
        agg.observe_emotives(bmap(&[("joy", 3.0), ("fear", 2.0)]));
        let means = agg.mean_emotives();
        assert_eq!(means["joy"], 2.0);
        assert_eq!(means["fear"], 2.0);
    }

    #[test]
    fn zero_valued_means_are_dropped() {
        let mut agg = Aggregator::new();
        agg.observe_emotives(bmap(&[("neutral", 0.0)]));
        assert!(agg.mean_emotives().is_empty());
    }

    #[test]
    fn metadata_is_set_union() {
        let mut agg = Aggregator::new();
        let mut m1 = BTreeMap::new();
        m1.insert("tags".to_string(), HashSet::from(["a".to_string()]));
        let mut m2 = BTreeMap::new();
        m2.insert("tags".to_string(), HashSet::from(["a".to_string(), "b".to_string()]));
        agg.observe_metadata(m1);
        agg.observe_metadata(m2);
        assert_eq!(agg.metadata()["tags"], HashSet::from(["a".to_string(), "b".to_string()]));
    }

    #[test]
    fn reset_clears_everything() {
        let mut agg = Aggregator::new();
        agg.observe_emotives(bmap(&[("x", 1.0)]));
        agg.reset();
        assert!(agg.is_empty());
    }
}
