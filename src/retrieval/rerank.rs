// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Second-stage reranking.
//!
//! Candidate generation doesn't know or care what runs here. Swap the
//! [`Reranker`] and nothing upstream changes.

use super::backend::Hit;
use super::fusion::sort_by_score;

/// Rescores candidates in place. Implementations must leave `hits` sorted.
pub trait Reranker: Send + Sync {
    fn name(&self) -> &str;

    fn rerank(&self, hits: &mut Vec<Hit>);
}

/// Weights for the default heuristic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RerankWeights {
    pub relevance: f64,
    pub rating: f64,
    pub popularity: f64,
}

impl Default for RerankWeights {
    fn default() -> Self {
        Self {
            relevance: 0.5,
            rating: 0.3,
            popularity: 0.2,
        }
    }
}

/// `0.5 × relevance/max_relevance + 0.3 × rating/5 + 0.2 × ln(1+pop)/ln(1+max_pop)`
///
/// Every factor lands in `[0, 1]`, so the result does too. Popularity is
/// log-scaled: the 10,000-order biryani shouldn't bury everything else.
#[derive(Debug, Clone, Default)]
pub struct PopularityRatingReranker {
    pub weights: RerankWeights,
}

impl Reranker for PopularityRatingReranker {
    fn name(&self) -> &str {
        "popularity_rating"
    }

    fn rerank(&self, hits: &mut Vec<Hit>) {
        if hits.is_empty() {
            return;
        }
        let max_score = hits.iter().map(|h| h.score).fold(0.0_f64, f64::max);
        let max_pop = hits.iter().map(|h| h.item.popularity).max().unwrap_or(0);
        let pop_norm = ((1 + max_pop) as f64).ln();

        for hit in hits.iter_mut() {
            let relevance = if max_score > 0.0 { hit.score / max_score } else { 0.0 };
            let rating = (hit.item.rating / 5.0).clamp(0.0, 1.0);
            let popularity = if pop_norm > 0.0 {
                ((1 + hit.item.popularity) as f64).ln() / pop_norm
            } else {
                0.0
            };
            hit.score = self.weights.relevance * relevance
                + self.weights.rating * rating
                + self.weights.popularity * popularity;
        }
        sort_by_score(hits);
    }
}

/// Leaves first-stage order alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityReranker;

impl Reranker for IdentityReranker {
    fn name(&self) -> &str {
        "identity"
    }

    fn rerank(&self, _hits: &mut Vec<Hit>) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::hit;

    #[test]
    fn rating_and_popularity_can_overtake_relevance() {
        let mut a = hit("a", 1.0);
        a.item.rating = 2.0;
        a.item.popularity = 0;
        let mut b = hit("b", 0.8);
        b.item.rating = 4.8;
        b.item.popularity = 5000;
        let mut hits = vec![a, b];

        PopularityRatingReranker::default().rerank(&mut hits);
        assert_eq!(hits[0].id, "b");
        assert!(hits.iter().all(|h| (0.0..=1.0).contains(&h.score)));
    }

    #[test]
    fn identity_keeps_order() {
        let mut hits = vec![hit("b", 1.0), hit("a", 2.0)];
        IdentityReranker.rerank(&mut hits);
        assert_eq!(hits[0].id, "b");
    }
}
