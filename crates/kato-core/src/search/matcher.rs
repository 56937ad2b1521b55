//! Subsequence alignment
//!
//! Ratcliff-Obershelp / `difflib.SequenceMatcher`-style matching: the
//! longest contiguous matching block is found first, then the algorithm
//! recurses on the unmatched regions to either side. This produces the same
//! "matching blocks" structure difflib exposes, which is what `similarity`'s
//! block list `[(i_p, i_s, k), ...]` and `fragmentation` count are built on.

use std::collections::HashMap;

/// One contiguous matching block: `k` tokens starting at `i_p` in the
/// pattern's flattened token stream and `i_s` in the STM's.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchBlock {
    pub i_p: usize,
    pub i_s: usize,
    pub k: usize,
}

/// Result of aligning a pattern's flattened events against the STM's.
#[derive(Debug, Clone)]
pub struct Alignment {
    pub blocks: Vec<MatchBlock>,
    pub pattern_len: usize,
    pub stm_len: usize,
}

impl Alignment {
    /// `similarity = 2 * matched_tokens / (|pattern| + |stm|)`.
    pub fn similarity(&self) -> f64 {
        let matched: usize = self.blocks.iter().map(|b| b.k).sum();
        let denom = self.pattern_len + self.stm_len;
        if denom == 0 {
            0.0
        } else {
            2.0 * matched as f64 / denom as f64
        }
    }

    /// `fragmentation = (number of blocks) - 1`, floored at 0 for no match.
    pub fn fragmentation(&self) -> u32 {
        if self.blocks.is_empty() {
            0
        } else {
            self.blocks.len() as u32 - 1
        }
    }

    pub fn total_matched(&self) -> usize {
        self.blocks.iter().map(|b| b.k).sum()
    }

    /// First event index in the pattern containing a matched token.
    pub fn first_match_token_index(&self) -> Option<usize> {
        self.blocks.iter().map(|b| b.i_p).min()
    }

    /// Last matched token index (inclusive) in the pattern's flattened stream.
    pub fn last_match_token_index(&self) -> Option<usize> {
        self.blocks.iter().map(|b| b.i_p + b.k - 1).max()
    }
}

/// Align `pattern` (flattened pattern tokens) against `stm` (flattened STM
/// tokens), returning every matching block ordered by `i_p`.
pub fn align(pattern: &[String], stm: &[String]) -> Alignment {
    let mut blocks = Vec::new();
    find_matching_blocks(pattern, stm, 0, pattern.len(), 0, stm.len(), &mut blocks);
    blocks.sort_by_key(|b| b.i_p);
    Alignment {
        blocks,
        pattern_len: pattern.len(),
        stm_len: stm.len(),
    }
}

fn find_matching_blocks(
    a: &[String],
    b: &[String],
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
    out: &mut Vec<MatchBlock>,
) {
    let Some(block) = find_longest_match(a, b, alo, ahi, blo, bhi) else {
        return;
    };

    if block.i_p > alo && block.i_s > blo {
        find_matching_blocks(a, b, alo, block.i_p, blo, block.i_s, out);
    }
    out.push(block);
    if block.i_p + block.k < ahi && block.i_s + block.k < bhi {
        find_matching_blocks(a, b, block.i_p + block.k, ahi, block.i_s + block.k, bhi, out);
    }
}

/// Find the longest contiguous run common to `a[alo..ahi]` and `b[blo..bhi]`,
/// preferring (in order) the earliest start in `a`, then the earliest start
/// in `b`, for determinism when multiple maximal runs tie in length.
fn find_longest_match(
    a: &[String],
    b: &[String],
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
) -> Option<MatchBlock> {
    let mut b_index: HashMap<&str, Vec<usize>> = HashMap::new();
    for (j, tok) in b.iter().enumerate().take(bhi).skip(blo) {
        b_index.entry(tok.as_str()).or_default().push(j);
    }

    let mut best = MatchBlock { i_p: alo, i_s: blo, k: 0 };
    let mut run: HashMap<usize, usize> = HashMap::new();

    for i in alo..ahi {
        let mut new_run: HashMap<usize, usize> = HashMap::new();
        if let Some(js) = b_index.get(a[i].as_str()) {
            for &j in js {
                let k = run.get(&j.wrapping_sub(1)).copied().unwrap_or(0) + 1;
                new_run.insert(j, k);
                if k > best.k {
                    best = MatchBlock { i_p: i + 1 - k, i_s: j + 1 - k, k };
                }
            }
        }
        run = new_run;
    }

    if best.k == 0 {
        None
    } else {
        Some(best)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(s: &[&str]) -> Vec<String> {
        s.iter().map(|x| x.to_string()).collect()
    }

    #[test]
    fn exact_match_is_one_contiguous_block() {
        let a = toks(&["coffee", "morning", "commute", "train", "arrive", "work"]);
        let b = toks(&["commute", "train"]);
        let alignment = align(&a, &b);
        assert_eq!(alignment.blocks.len(), 1);
        assert_eq!(alignment.fragmentation(), 0);
        assert_eq!(alignment.total_matched(), 2);
    }

    #[test]
    fn similarity_matches_formula() {
        let a = toks(&["x", "y"]);
        let b = toks(&["x", "y"]);
        let alignment = align(&a, &b);
        assert_eq!(alignment.similarity(), 1.0);
    }

    #[test]
    fn disjoint_sequences_have_no_blocks() {
        let a = toks(&["a", "b"]);
        let b = toks(&["c", "d"]);
        let alignment = align(&a, &b);
        assert!(alignment.blocks.is_empty());
        assert_eq!(alignment.similarity(), 0.0);
    }

    #[test]
    fn fragmented_match_counts_gaps() {
        let a = toks(&["a", "x", "b", "y", "c"]);
        let b = toks(&["a", "b", "c"]);
        let alignment = align(&a, &b);
        assert_eq!(alignment.fragmentation(), 2);
        assert_eq!(alignment.total_matched(), 3);
    }
}
