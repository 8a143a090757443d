// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Bounded additive personalization.

use std::collections::HashMap;

use super::backend::Hit;
use super::fusion::sort_by_score;

/// Add each hit's boost, clamped to `±bound`, then re-sort.
///
/// Returns how many hits were boosted. Non-finite boosts are ignored.
pub fn apply_boosts(hits: &mut [Hit], boosts: &HashMap<String, f64>, bound: f64) -> usize {
    let bound = bound.abs();
    let mut applied = 0;
    for hit in hits.iter_mut() {
        if let Some(boost) = boosts.get(&hit.id).filter(|b| b.is_finite()) {
            hit.score += boost.clamp(-bound, bound);
            applied += 1;
        }
    }
    if applied > 0 {
        sort_by_score(hits);
    }
    applied
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::hit;

    #[test]
    fn boosts_are_clamped() {
        let mut hits = vec![hit("a", 0.5), hit("b", 0.4)];
        let boosts = HashMap::from([("b".to_string(), 5.0), ("a".to_string(), -5.0)]);
        assert_eq!(apply_boosts(&mut hits, &boosts, 0.3), 2);
        assert_eq!(hits[0].id, "b");
        assert!((hits[0].score - 0.7).abs() < 1e-9);
        assert!((hits[1].score - 0.2).abs() < 1e-9);
    }

    #[test]
    fn nan_boost_is_skipped() {
        let mut hits = vec![hit("a", 0.5)];
        let boosts = HashMap::from([("a".to_string(), f64::NAN)]);
        assert_eq!(apply_boosts(&mut hits, &boosts, 0.3), 0);
        assert_eq!(hits[0].score, 0.5);
    }
}
