// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Weighted score fusion for two independent result lists.
//!
//! ```text
//! combined(d) = w_lex × lex(d) + w_vec × vec(d)      (missing side counts as 0)
//! ```
//!
//! Raw scores, no per-list normalization. A document found by both runs gets
//! both contributions; a document found by one keeps its single weighted score.
//! Ties break on document id so the order never depends on hash iteration.

use std::collections::HashMap;

use super::backend::{Hit, HitSource};

/// Fusion weights. Defaults: 0.6 lexical, 0.4 vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusionWeights {
    pub lexical: f64,
    pub vector: f64,
}

impl Default for FusionWeights {
    fn default() -> Self {
        Self {
            lexical: 0.6,
            vector: 0.4,
        }
    }
}

/// Fuse lexical and vector hits into one list, best first.
pub fn fuse(lexical: Vec<Hit>, vector: Vec<Hit>, weights: FusionWeights) -> Vec<Hit> {
    let mut fused: HashMap<String, Hit> = HashMap::with_capacity(lexical.len() + vector.len());

    for mut hit in lexical {
        hit.score *= weights.lexical;
        hit.source = HitSource::Lexical;
        fused.insert(hit.id.clone(), hit);
    }

    for hit in vector {
        let weighted = hit.score * weights.vector;
        match fused.get_mut(&hit.id) {
            Some(existing) => {
                existing.score += weighted;
                existing.source = HitSource::Hybrid;
                for h in hit.highlights {
                    if !existing.highlights.contains(&h) {
                        existing.highlights.push(h);
                    }
                }
            }
            None => {
                let mut hit = hit;
                hit.score = weighted;
                hit.source = HitSource::Vector;
                fused.insert(hit.id.clone(), hit);
            }
        }
    }

    let mut hits: Vec<Hit> = fused.into_values().collect();
    sort_by_score(&mut hits);
    hits
}

/// Score descending, id ascending on exact ties.
pub fn sort_by_score(hits: &mut [Hit]) {
    hits.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    });
}
