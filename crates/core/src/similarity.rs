//! Longest-matching-block string similarity.
//!
//! The score is `2 * M / (len(a) + len(b))`, where `M` counts the characters
//! in the matched blocks. Blocks are found greedily: the longest common
//! contiguous run is taken first, and the search then recurses into the stretch
//! on either side of it. A transposition therefore costs less than it would
//! under an edit distance. Downstream analysis depends on this exact scoring.

use std::collections::{HashMap, HashSet};

/// Second sequences at least this long have their most frequent elements
/// excluded from matching.
const AUTOJUNK_MIN_LEN: usize = 200;

/// A matched block: `a[a_start..a_start + size] == b[b_start..b_start + size]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Block {
    pub a_start: usize,
    pub b_start: usize,
    pub size: usize,
}

pub struct SequenceMatcher {
    a: Vec<char>,
    b: Vec<char>,
    b2j: HashMap<char, Vec<usize>>,
}

impl SequenceMatcher {
    pub fn new(a: &str, b: &str) -> Self {
        let a: Vec<char> = a.chars().collect();
        let b: Vec<char> = b.chars().collect();
        let b2j = index_positions(&b);
        Self { a, b, b2j }
    }

    /// Longest block of `a[alo..ahi]` that also occurs in `b[blo..bhi]`.
    /// Ties go to the block that starts earliest in `a`, then earliest in `b`.
    fn find_longest_match(&self, alo: usize, ahi: usize, blo: usize, bhi: usize) -> Block {
        let mut best = Block {
            a_start: alo,
            b_start: blo,
            size: 0,
        };
        // j2len[j] = length of the match ending at a[i - 1] and b[j]
        let mut j2len: HashMap<usize, usize> = HashMap::new();
        for i in alo..ahi {
            let mut next: HashMap<usize, usize> = HashMap::new();
            if let Some(positions) = self.b2j.get(&self.a[i]) {
                for &j in positions {
                    if j < blo {
                        continue;
                    }
                    if j >= bhi {
                        break;
                    }
                    let k = j
                        .checked_sub(1)
                        .and_then(|prev| j2len.get(&prev))
                        .copied()
                        .unwrap_or(0)
                        + 1;
                    next.insert(j, k);
                    if k > best.size {
                        best = Block {
                            a_start: i + 1 - k,
                            b_start: j + 1 - k,
                            size: k,
                        };
                    }
                }
            }
            j2len = next;
        }

        // Popular elements never enter b2j but may still border the block
        while best.a_start > alo
            && best.b_start > blo
            && self.a[best.a_start - 1] == self.b[best.b_start - 1]
        {
            best.a_start -= 1;
            best.b_start -= 1;
            best.size += 1;
        }
        while best.a_start + best.size < ahi
            && best.b_start + best.size < bhi
            && self.a[best.a_start + best.size] == self.b[best.b_start + best.size]
        {
            best.size += 1;
        }
        best
    }

    /// Matched blocks in ascending order, with adjacent blocks merged
    pub fn matching_blocks(&self) -> Vec<Block> {
        let mut queue = vec![(0, self.a.len(), 0, self.b.len())];
        let mut blocks = Vec::new();
        while let Some((alo, ahi, blo, bhi)) = queue.pop() {
            let m = self.find_longest_match(alo, ahi, blo, bhi);
            if m.size == 0 {
                continue;
            }
            blocks.push(m);
            if alo < m.a_start && blo < m.b_start {
                queue.push((alo, m.a_start, blo, m.b_start));
            }
            if m.a_start + m.size < ahi && m.b_start + m.size < bhi {
                queue.push((m.a_start + m.size, ahi, m.b_start + m.size, bhi));
            }
        }
        blocks.sort();

        let mut merged: Vec<Block> = Vec::with_capacity(blocks.len());
        for block in blocks {
            match merged.last_mut() {
                Some(last)
                    if last.a_start + last.size == block.a_start
                        && last.b_start + last.size == block.b_start =>
                {
                    last.size += block.size;
                }
                _ => merged.push(block),
            }
        }
        merged
    }

    pub fn ratio(&self) -> f64 {
        let total = self.a.len() + self.b.len();
        if total == 0 {
            return 1.0;
        }
        let matches: usize = self.matching_blocks().iter().map(|b| b.size).sum();
        2.0 * matches as f64 / total as f64
    }
}

/// Ratio of matching characters between `a` and `b`, in `[0, 1]`
pub fn similarity_ratio(a: &str, b: &str) -> f64 {
    SequenceMatcher::new(a, b).ratio()
}

fn index_positions(b: &[char]) -> HashMap<char, Vec<usize>> {
    let mut b2j: HashMap<char, Vec<usize>> = HashMap::new();
    for (j, &c) in b.iter().enumerate() {
        b2j.entry(c).or_default().push(j);
    }

    let n = b.len();
    if n >= AUTOJUNK_MIN_LEN {
        let threshold = n / 100 + 1;
        let popular: HashSet<char> = b2j
            .iter()
            .filter(|(_, positions)| positions.len() > threshold)
            .map(|(&c, _)| c)
            .collect();
        b2j.retain(|c, _| !popular.contains(c));
    }
    b2j
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-12,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_ratio_identical() {
        assert_close(similarity_ratio("427", "427"), 1.0);
        assert_close(similarity_ratio("8675309", "8675309"), 1.0);
    }

    #[test]
    fn test_ratio_disjoint() {
        assert_close(similarity_ratio("123", "abc"), 0.0);
        assert_close(similarity_ratio("123", ""), 0.0);
    }

    #[test]
    fn test_ratio_both_empty() {
        assert_close(similarity_ratio("", ""), 1.0);
    }

    #[test]
    fn test_ratio_shifted() {
        assert_close(similarity_ratio("abcd", "bcde"), 0.75);
    }

    #[test]
    fn test_ratio_transposition() {
        // "34" matches first, then "1" or "2" in the left remainder
        assert_close(similarity_ratio("1234", "2134"), 0.75);
    }

    #[test]
    fn test_ratio_missing_digit() {
        assert_close(similarity_ratio("4271", "427"), 6.0 / 7.0);
    }

    #[test]
    fn test_ratio_is_greedy_not_lcs() {
        // The longest block "bcd" is taken first. The leading 'x' in b can then
        // no longer be matched against the trailing 'x' in a.
        assert_close(similarity_ratio("bcdx", "xbcd"), 0.75);
    }

    #[test]
    fn test_matching_blocks_are_merged_and_sorted() {
        let blocks = SequenceMatcher::new("abxcd", "abcd").matching_blocks();
        assert_eq!(
            blocks,
            vec![
                Block { a_start: 0, b_start: 0, size: 2 },
                Block { a_start: 3, b_start: 2, size: 2 },
            ]
        );
    }

    #[test]
    fn test_longest_match_prefers_earliest() {
        let m = SequenceMatcher::new("ab", "abab").find_longest_match(0, 2, 0, 4);
        assert_eq!(m, Block { a_start: 0, b_start: 0, size: 2 });
    }

    #[test]
    fn test_popular_characters_match_by_extension() {
        // every '1' in b is popular; the empty block at the start still
        // extends over the equal run
        let b = "1".repeat(300);
        assert_close(similarity_ratio("111", &b), 6.0 / 303.0);
        let short = "1".repeat(150);
        assert_close(similarity_ratio("111", &short), 6.0 / 153.0);
    }

    #[test]
    fn test_block_extends_over_popular_characters() {
        // '1' is popular in b, so "427" matches first and then grows to
        // cover the whole of a
        let b = format!("42714271{}", "1".repeat(200));
        assert_close(similarity_ratio("42714271", &b), 16.0 / 216.0);
    }
}
