//! # Sequence Matcher
//!
//! Ratcliff/Obershelp "gestalt pattern matching" over Unicode characters.
//!
//! ## How it works:
//! 1. Find the longest contiguous block the two sequences share
//! 2. Recurse on the pieces to the left and to the right of that block
//! 3. Sum the sizes of all blocks found (M)
//! 4. The ratio is `2 * M / (len(a) + len(b))`
//!
//! ## Popular characters:
//! When the second sequence has 200 or more characters, characters that make up
//! more than 1% of it are not used to *start* a match (they can still extend
//! one). This keeps long phrases from degenerating into quadratic work on
//! spaces and vowels, and matches the behaviour of the classic sequence matcher.

use std::collections::HashMap;

/// Length of `b` from which popular characters stop seeding matches.
const POPULAR_THRESHOLD: usize = 200;

/// Similarity ratio in [0.0, 1.0] between two strings, compared character by character.
///
/// Two empty strings are considered identical (ratio 1.0).
pub fn similarity_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }

    let matched = SequenceMatcher::new(&a, &b).matched_len();
    2.0 * matched as f64 / total as f64
}

/// A block of `size` equal characters at `a[a_start..]` and `b[b_start..]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchingBlock {
    pub a_start: usize,
    pub b_start: usize,
    pub size: usize,
}

/// Matcher over two character sequences.
///
/// `b_index` maps every (non-popular) character of `b` to the ascending list of
/// positions where it occurs, so the longest-match search only visits
/// positions that can actually match.
struct SequenceMatcher<'a> {
    a: &'a [char],
    b: &'a [char],
    b_index: HashMap<char, Vec<usize>>,
}

impl<'a> SequenceMatcher<'a> {
    fn new(a: &'a [char], b: &'a [char]) -> Self {
        let mut b_index: HashMap<char, Vec<usize>> = HashMap::new();
        for (position, ch) in b.iter().enumerate() {
            b_index.entry(*ch).or_default().push(position);
        }

        if b.len() >= POPULAR_THRESHOLD {
            let limit = b.len() / 100 + 1;
            b_index.retain(|_, positions| positions.len() <= limit);
        }

        Self { a, b, b_index }
    }

    /// Longest block with `a_lo <= i < a_hi` and `b_lo <= j < b_hi`.
    ///
    /// Ties go to the block that starts earliest in `a`, then earliest in `b`.
    fn find_longest_match(&self, a_lo: usize, a_hi: usize, b_lo: usize, b_hi: usize) -> MatchingBlock {
        let mut best = MatchingBlock { a_start: a_lo, b_start: b_lo, size: 0 };

        // run_lengths[j] = length of the match ending at a[i - 1] and b[j]
        let mut run_lengths: HashMap<usize, usize> = HashMap::new();
        for i in a_lo..a_hi {
            let mut next_runs: HashMap<usize, usize> = HashMap::new();
            if let Some(positions) = self.b_index.get(&self.a[i]) {
                for &j in positions {
                    if j < b_lo {
                        continue;
                    }
                    if j >= b_hi {
                        break;
                    }
                    let run = j
                        .checked_sub(1)
                        .and_then(|prev| run_lengths.get(&prev))
                        .copied()
                        .unwrap_or(0)
                        + 1;
                    next_runs.insert(j, run);
                    if run > best.size {
                        best = MatchingBlock {
                            a_start: i + 1 - run,
                            b_start: j + 1 - run,
                            size: run,
                        };
                    }
                }
            }
            run_lengths = next_runs;
        }

        // Popular characters never seed a block, so grow it over neighbours that match.
        while best.a_start > a_lo
            && best.b_start > b_lo
            && self.a[best.a_start - 1] == self.b[best.b_start - 1]
        {
            best.a_start -= 1;
            best.b_start -= 1;
            best.size += 1;
        }
        while best.a_start + best.size < a_hi
            && best.b_start + best.size < b_hi
            && self.a[best.a_start + best.size] == self.b[best.b_start + best.size]
        {
            best.size += 1;
        }

        best
    }

    /// All matching blocks, ordered by position.
    fn matching_blocks(&self) -> Vec<MatchingBlock> {
        let mut pending = vec![(0, self.a.len(), 0, self.b.len())];
        let mut blocks = Vec::new();

        while let Some((a_lo, a_hi, b_lo, b_hi)) = pending.pop() {
            let block = self.find_longest_match(a_lo, a_hi, b_lo, b_hi);
            if block.size == 0 {
                continue;
            }
            blocks.push(block);

            if a_lo < block.a_start && b_lo < block.b_start {
                pending.push((a_lo, block.a_start, b_lo, block.b_start));
            }
            let a_end = block.a_start + block.size;
            let b_end = block.b_start + block.size;
            if a_end < a_hi && b_end < b_hi {
                pending.push((a_end, a_hi, b_end, b_hi));
            }
        }

        blocks.sort_by_key(|block| (block.a_start, block.b_start));
        blocks
    }

    fn matched_len(&self) -> usize {
        self.matching_blocks().iter().map(|block| block.size).sum()
    }
}

/// Matching blocks between two strings.
#[cfg(test)]
fn matching_blocks(a: &str, b: &str) -> Vec<MatchingBlock> {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    SequenceMatcher::new(&a, &b).matching_blocks()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(left: f64, right: f64) -> bool {
        (left - right).abs() < 1e-9
    }

    #[test]
    fn classic_reference_ratios() {
        // Values produced by the reference sequence matcher for the same inputs.
        assert!(approx(similarity_ratio("abcd", "bcde"), 0.75));
        assert!(approx(similarity_ratio("abcde", "abcde"), 1.0));
        assert!(approx(similarity_ratio("abc", "xyz"), 0.0));
        assert!(approx(similarity_ratio("private", "privacy"), 10.0 / 14.0));
    }

    #[test]
    fn empty_inputs() {
        assert!(approx(similarity_ratio("", ""), 1.0));
        assert!(approx(similarity_ratio("", "abc"), 0.0));
        assert!(approx(similarity_ratio("abc", ""), 0.0));
    }

    #[test]
    fn works_on_characters_not_bytes() {
        // Devanagari: three characters, every one of them multi-byte in UTF-8
        assert!(approx(similarity_ratio("नमस", "नमस"), 1.0));
        assert!(approx(similarity_ratio("café", "cafe"), 0.75));
    }

    #[test]
    fn blocks_are_found_left_and_right_of_the_longest() {
        let blocks = matching_blocks("xabcyde", "abczde");
        assert_eq!(
            blocks,
            vec![
                MatchingBlock { a_start: 1, b_start: 0, size: 3 },
                MatchingBlock { a_start: 5, b_start: 4, size: 2 },
            ]
        );
    }

    #[test]
    fn longest_match_prefers_earliest_block() {
        let blocks = matching_blocks("ab", "abab");
        assert_eq!(blocks, vec![MatchingBlock { a_start: 0, b_start: 0, size: 2 }]);
    }

    #[test]
    fn long_expected_phrase_still_matches_itself() {
        let phrase = "la plume de ma tante est sur la table ".repeat(8);
        assert!(phrase.chars().count() >= POPULAR_THRESHOLD);
        assert!(approx(similarity_ratio(&phrase, &phrase), 1.0));
    }
}
