// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Keep one store from owning the page.
//!
//! Greedy and order-preserving. Walk the ranked list and take the best
//! remaining hit that doesn't break a cap:
//!
//! - no more than `max_consecutive_per_store` hits in a row from one store
//! - no more than `max_per_store` hits from one store per page
//! - no more than `max_per_category` hits from one category per page
//!
//! Hits that break a cap aren't dropped. They wait, and fill the tail of the
//! page (and later pages) once nothing compliant is left. A store with the only
//! five matching items still gets all five shown.

use std::collections::HashMap;

use super::backend::Hit;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiversityCaps {
    pub max_consecutive_per_store: usize,
    pub max_per_store: usize,
    pub max_per_category: usize,
}

impl Default for DiversityCaps {
    fn default() -> Self {
        Self {
            max_consecutive_per_store: 2,
            max_per_store: 3,
            max_per_category: 5,
        }
    }
}

/// Reorder `hits` page by page under `caps`.
pub fn diversify(hits: Vec<Hit>, page_size: usize, caps: DiversityCaps) -> Vec<Hit> {
    if page_size == 0 || hits.len() <= 1 {
        return hits;
    }

    let mut remaining: Vec<Option<Hit>> = hits.into_iter().map(Some).collect();
    let mut out: Vec<Hit> = Vec::with_capacity(remaining.len());
    let mut left = remaining.len();

    while left > 0 {
        let mut per_store: HashMap<u64, usize> = HashMap::new();
        let mut per_category: HashMap<String, usize> = HashMap::new();
        let page_start = out.len();

        while out.len() - page_start < page_size && left > 0 {
            let run = trailing_run(&out[page_start..]);
            let pick = remaining.iter().position(|slot| {
                slot.as_ref().is_some_and(|hit| {
                    let store = hit.item.store_id;
                    let consecutive = run.filter(|(s, _)| *s == store).map_or(0, |(_, n)| n);
                    consecutive < caps.max_consecutive_per_store
                        && per_store.get(&store).copied().unwrap_or(0) < caps.max_per_store
                        && per_category.get(&hit.item.category).copied().unwrap_or(0)
                            < caps.max_per_category
                })
            });

            // Nothing compliant: take the best waiting hit anyway
            let index = match pick.or_else(|| remaining.iter().position(Option::is_some)) {
                Some(i) => i,
                None => break,
            };
            if let Some(hit) = remaining[index].take() {
                *per_store.entry(hit.item.store_id).or_insert(0) += 1;
                *per_category.entry(hit.item.category.clone()).or_insert(0) += 1;
                out.push(hit);
                left -= 1;
            }
        }
    }
    out
}

/// Store id and length of the run at the end of `page`.
fn trailing_run(page: &[Hit]) -> Option<(u64, usize)> {
    let last = page.last()?.item.store_id;
    let n = page
        .iter()
        .rev()
        .take_while(|h| h.item.store_id == last)
        .count();
    Some((last, n))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::hit_from_store;

    fn stores(hits: &[Hit]) -> Vec<u64> {
        hits.iter().map(|h| h.item.store_id).collect()
    }

    #[test]
    fn breaks_long_runs() {
        let hits = vec![
            hit_from_store("a1", 1, 1.0),
            hit_from_store("a2", 1, 0.9),
            hit_from_store("a3", 1, 0.8),
            hit_from_store("b1", 2, 0.7),
        ];
        let out = diversify(hits, 10, DiversityCaps::default());
        assert_eq!(stores(&out), vec![1, 1, 2, 1]);
    }

    #[test]
    fn caps_per_page_but_keeps_everything() {
        let hits: Vec<Hit> = (0..6)
            .map(|i| hit_from_store(&format!("a{i}"), 1, 1.0 - i as f64 * 0.1))
            .chain(std::iter::once(hit_from_store("b", 2, 0.1)))
            .collect();
        let caps = DiversityCaps {
            max_consecutive_per_store: 10,
            max_per_store: 3,
            max_per_category: 100,
        };
        let out = diversify(hits, 4, caps);
        assert_eq!(out.len(), 7);
        // first page: three from store 1, then store 2 jumps the queue
        assert_eq!(stores(&out[..4]), vec![1, 1, 1, 2]);
    }

    #[test]
    fn single_store_results_survive() {
        let hits: Vec<Hit> = (0..5)
            .map(|i| hit_from_store(&format!("a{i}"), 7, 1.0))
            .collect();
        assert_eq!(diversify(hits, 10, DiversityCaps::default()).len(), 5);
    }
}
