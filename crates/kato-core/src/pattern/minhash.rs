//! MinHash signature and LSH band derivation
//!
//! `k` independent hash functions are realized as a seeded 64-bit hash
//! (`XxHash64` seeded `0..k`), which is the standard cheap construction for
//! MinHash when a true universal-hash family isn't needed. Each function's
//! minimum over the symbol multiset becomes one entry of the signature; the
//! signature is then sliced into `b` bands of `r` rows, and each band's rows
//! are rehashed (seeded by the band index) into one 64-bit band key.

use std::collections::HashSet;
use std::hash::Hasher;
use twox_hash::XxHash64;

/// Number of independent hash functions (signature width).
pub const DEFAULT_K: usize = 128;
/// Number of LSH bands.
pub const DEFAULT_B: usize = 32;
/// Rows per band (`DEFAULT_B * DEFAULT_ROWS_PER_BAND == DEFAULT_K`).
pub const DEFAULT_ROWS_PER_BAND: usize = 4;

/// A MinHash signature: `k` 64-bit minimums, one per hash function.
pub type MinHashSignature = Vec<u64>;

/// LSH band keys derived from a signature, one per band.
pub type LshBands = Vec<u64>;

/// MinHash/LSH parameters, with the recommended defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MinHashParams {
    pub k: usize,
    pub b: usize,
    pub r: usize,
}

impl Default for MinHashParams {
    fn default() -> Self {
        Self {
            k: DEFAULT_K,
            b: DEFAULT_B,
            r: DEFAULT_ROWS_PER_BAND,
        }
    }
}

impl MinHashParams {
    /// Validate that `b * r == k`, as required for the signature to slice
    /// evenly into bands.
    pub fn is_consistent(&self) -> bool {
        self.b.saturating_mul(self.r) == self.k
    }
}

fn hash_symbol(seed: u64, symbol: &str) -> u64 {
    let mut hasher = XxHash64::with_seed(seed);
    hasher.write(symbol.as_bytes());
    hasher.finish()
}

/// Compute the MinHash signature over the multiset of symbols in `events`
/// (order does not matter at this stage; temporal order re-enters at
/// alignment time).
pub fn signature(events: &[Vec<String>], params: MinHashParams) -> MinHashSignature {
    let symbols: HashSet<&str> = events.iter().flatten().map(|s| s.as_str()).collect();
    (0..params.k as u64)
        .map(|seed| {
            symbols
                .iter()
                .map(|s| hash_symbol(seed, s))
                .min()
                .unwrap_or(u64::MAX)
        })
        .collect()
}

/// Slice a signature into `params.b` bands of `params.r` rows and hash each
/// band's rows into one 64-bit band key.
pub fn lsh_bands(sig: &MinHashSignature, params: MinHashParams) -> LshBands {
    debug_assert!(params.is_consistent(), "b * r must equal k");
    sig.chunks(params.r)
        .enumerate()
        .map(|(band_index, rows)| {
            let mut hasher = XxHash64::with_seed(band_index as u64);
            for row in rows {
                hasher.write(&row.to_le_bytes());
            }
            hasher.finish()
        })
        .collect()
}

/// Estimate Jaccard similarity from two signatures (fraction of matching rows).
pub fn estimate_jaccard(a: &MinHashSignature, b: &MinHashSignature) -> f64 {
    if a.is_empty() || b.is_empty() || a.len() != b.len() {
        return 0.0;
    }
    let matches = a.iter().zip(b.iter()).filter(|(x, y)| x == y).count();
    matches as f64 / a.len() as f64
}

/// Number of matching LSH bands between two band-key lists.
pub fn shared_band_count(a: &LshBands, b: &LshBands) -> usize {
    a.iter().zip(b.iter()).filter(|(x, y)| x == y).count()
}
