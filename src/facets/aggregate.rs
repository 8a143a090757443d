// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Bucket counts over a set of catalog items.
//!
//! This is the shape an index hands back when asked for aggregations, and
//! also what [`aggregate`] computes locally when it doesn't. The facets
//! engine only ever reads [`Aggregations`]; it doesn't care which side built
//! them.
//!
//! Price buckets are half-open, `[from, to)`, with a final open-ended bucket
//! above the last breakpoint. Rating buckets are cumulative (`≥ 4★` includes
//! every `≥ 5★` item).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::CatalogItem;

/// Default price breakpoints, in rupees.
pub const DEFAULT_PRICE_BREAKPOINTS: [f64; 4] = [100.0, 200.0, 500.0, 1000.0];

/// Rating thresholds, highest first.
pub const RATING_THRESHOLDS: [u8; 4] = [5, 4, 3, 2];

/// Default number of category/store terms kept.
pub const DEFAULT_TOP_N: usize = 10;

/// What to aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationRequest {
    /// Ascending. `[100, 200]` gives `0-100`, `100-200`, `200+`.
    pub price_breakpoints: Vec<f64>,
    /// Category and store terms are cut to this many, by count.
    pub top_n: usize,
}

impl Default for AggregationRequest {
    fn default() -> Self {
        Self {
            price_breakpoints: DEFAULT_PRICE_BREAKPOINTS.to_vec(),
            top_n: DEFAULT_TOP_N,
        }
    }
}

/// One range bucket. `to == None` is open-ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeCount {
    pub key: String,
    pub from: f64,
    pub to: Option<f64>,
    pub count: usize,
}

/// One terms bucket. `key` is what a filter matches on, `label` what a
/// person reads (store id vs store name).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermCount {
    pub key: String,
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoolCount {
    pub yes: usize,
    pub no: usize,
}

impl BoolCount {
    fn add(&mut self, value: bool) {
        if value {
            self.yes += 1;
        } else {
            self.no += 1;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Aggregations {
    pub price: Vec<RangeCount>,
    pub rating: Vec<RangeCount>,
    pub categories: Vec<TermCount>,
    pub stores: Vec<TermCount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub veg: Option<BoolCount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_stock: Option<BoolCount>,
}

/// Key for a price bucket: `100-200`, or `1000+` for the open end.
pub fn price_key(from: f64, to: Option<f64>) -> String {
    match to {
        Some(to) => format!("{from}-{to}"),
        None => format!("{from}+"),
    }
}

/// Count `items` into the buckets `request` describes.
pub fn aggregate<'a, I>(items: I, request: &AggregationRequest) -> Aggregations
where
    I: IntoIterator<Item = &'a CatalogItem>,
{
    let mut bounds: Vec<f64> = request
        .price_breakpoints
        .iter()
        .copied()
        .filter(|b| b.is_finite() && *b > 0.0)
        .collect();
    bounds.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    bounds.dedup();

    let mut price: Vec<RangeCount> = Vec::with_capacity(bounds.len() + 1);
    let mut from = 0.0;
    for &to in &bounds {
        price.push(RangeCount {
            key: price_key(from, Some(to)),
            from,
            to: Some(to),
            count: 0,
        });
        from = to;
    }
    price.push(RangeCount {
        key: price_key(from, None),
        from,
        to: None,
        count: 0,
    });

    let mut rating: Vec<RangeCount> = RATING_THRESHOLDS
        .iter()
        .map(|&t| RangeCount {
            key: t.to_string(),
            from: f64::from(t),
            to: None,
            count: 0,
        })
        .collect();

    // (label, count, first-seen order) keyed by filter key
    let mut categories: HashMap<String, (String, usize, usize)> = HashMap::new();
    let mut stores: HashMap<String, (String, usize, usize)> = HashMap::new();
    let mut veg = BoolCount::default();
    let mut in_stock = BoolCount::default();
    let mut seen = 0usize;

    for item in items {
        if let Some(bucket) = price
            .iter_mut()
            .find(|b| item.price >= b.from && b.to.is_none_or(|to| item.price < to))
        {
            bucket.count += 1;
        }
        for bucket in rating.iter_mut() {
            if item.rating >= bucket.from {
                bucket.count += 1;
            }
        }

        let category = item.category.trim();
        if !category.is_empty() {
            let order = categories.len();
            categories
                .entry(category.to_lowercase())
                .or_insert_with(|| (category.to_string(), 0, order))
                .1 += 1;
        }
        let order = stores.len();
        stores
            .entry(item.store_id.to_string())
            .or_insert_with(|| (item.store_name.clone(), 0, order))
            .1 += 1;

        veg.add(item.veg);
        in_stock.add(item.in_stock);
        seen += 1;
    }

    Aggregations {
        price,
        rating,
        categories: top_terms(categories, request.top_n),
        stores: top_terms(stores, request.top_n),
        veg: (seen > 0).then_some(veg),
        in_stock: (seen > 0).then_some(in_stock),
    }
}

/// Highest count first; first-seen order breaks ties.
fn top_terms(terms: HashMap<String, (String, usize, usize)>, n: usize) -> Vec<TermCount> {
    let mut terms: Vec<(String, (String, usize, usize))> = terms.into_iter().collect();
    terms.sort_by(|a, b| b.1 .1.cmp(&a.1 .1).then(a.1 .2.cmp(&b.1 .2)));
    terms
        .into_iter()
        .take(n)
        .map(|(key, (label, count, _))| TermCount { key, label, count })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_item;

    fn priced(id: &str, price: f64, rating: f64) -> CatalogItem {
        let mut item = sample_item(id);
        item.price = price;
        item.rating = rating;
        item
    }

    #[test]
    fn price_buckets_are_half_open() {
        let items = [priced("a", 99.0, 0.0), priced("b", 100.0, 0.0), priced("c", 1500.0, 0.0)];
        let aggs = aggregate(&items, &AggregationRequest::default());
        let counts: Vec<(&str, usize)> =
            aggs.price.iter().map(|b| (b.key.as_str(), b.count)).collect();
        assert_eq!(
            counts,
            vec![("0-100", 1), ("100-200", 1), ("200-500", 0), ("500-1000", 0), ("1000+", 1)]
        );
    }

    #[test]
    fn rating_buckets_are_cumulative() {
        let items = [priced("a", 1.0, 4.6), priced("b", 1.0, 3.1), priced("c", 1.0, 5.0)];
        let aggs = aggregate(&items, &AggregationRequest::default());
        let counts: Vec<usize> = aggs.rating.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![1, 2, 3, 3]);
    }

    #[test]
    fn terms_are_cut_to_top_n() {
        let mut items = Vec::new();
        for (i, category) in ["Biryani", "biryani", "Pizza", "Dessert"].iter().enumerate() {
            let mut item = sample_item(&i.to_string());
            item.category = category.to_string();
            items.push(item);
        }
        let request = AggregationRequest {
            top_n: 2,
            ..Default::default()
        };
        let aggs = aggregate(&items, &request);
        assert_eq!(aggs.categories.len(), 2);
        assert_eq!(aggs.categories[0].key, "biryani");
        assert_eq!(aggs.categories[0].count, 2);
        assert_eq!(aggs.categories[1].key, "pizza");
    }

    #[test]
    fn empty_input_has_no_boolean_counts() {
        let aggs = aggregate(std::iter::empty(), &AggregationRequest::default());
        assert!(aggs.veg.is_none());
        assert!(aggs.price.iter().all(|b| b.count == 0));
    }
}
