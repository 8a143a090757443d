// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Edit distance with an early-exit optimization.
//!
//! The key insight: `|len(a) - len(b)|` is a lower bound on edit distance.
//! If two strings differ in length by more than the threshold, skip the O(nm) DP.
//! Against a few thousand dictionary words this rejects most entries before
//! allocating anything.
//!
//! Insertion, deletion and substitution all cost 1. No transpositions: "chiken"
//! vs "chicken" is one insertion, "tea" vs "eat" is two edits, not one.

/// Levenshtein distance in Unicode scalar values if it is at most `max`,
/// `None` otherwise.
///
/// Two-row DP with two exits:
/// 1. If length difference exceeds `max`, bail before the DP
/// 2. If the minimum of a row exceeds `max`, no later row can recover
pub fn bounded_distance(a: &str, b: &str, max: usize) -> Option<usize> {
    // Use character counts, not byte lengths, for Unicode correctness
    let a_len = a.chars().count();
    let b_chars: Vec<char> = b.chars().collect();
    let b_len = b_chars.len();

    if (a_len as isize - b_len as isize).unsigned_abs() > max {
        return None;
    }

    let mut dp: Vec<usize> = (0..=b_len).collect();
    for (i, ac) in a.chars().enumerate() {
        let mut prev = dp[0];
        dp[0] = i + 1;
        let mut min_row = dp[0];

        for (j, bc) in b_chars.iter().enumerate() {
            let temp = dp[j + 1];
            let cost = usize::from(ac != *bc);
            dp[j + 1] = (dp[j + 1] + 1).min(dp[j] + 1).min(prev + cost);
            prev = temp;
            min_row = min_row.min(dp[j + 1]);
        }

        if min_row > max {
            return None;
        }
    }

    (dp[b_len] <= max).then_some(dp[b_len])
}
