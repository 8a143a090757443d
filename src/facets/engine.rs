// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Aggregations + active filters → the facet list a UI renders.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::aggregate::{aggregate, AggregationRequest, Aggregations, BoolCount, RangeCount};
use super::filter::FacetFilter;
use crate::retrieval::SearchFilters;
use crate::types::{CatalogItem, DomainContext};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacetKind {
    Range,
    Terms,
    Boolean,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacetValue {
    /// Encoded value; `field=value` decodes with
    /// [`parse_facet_filters`](super::parse_facet_filters).
    pub value: String,
    pub label: String,
    pub count: usize,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Facet {
    pub field: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: FacetKind,
    pub values: Vec<FacetValue>,
}

impl Facet {
    /// The decoded filter for each value, in display order.
    pub fn filters(&self) -> Vec<(FacetFilter, &FacetValue)> {
        self.values
            .iter()
            .filter_map(|v| {
                super::facet_value_of(&self.field, &v.value)
                    .ok()
                    .map(|f| (f, v))
            })
            .collect()
    }
}

/// Builds facets. Stateless apart from its bucket configuration, so one
/// instance serves every request.
#[derive(Debug, Clone, Default)]
pub struct FacetsEngine {
    request: AggregationRequest,
}

impl FacetsEngine {
    pub fn new(request: AggregationRequest) -> Self {
        Self { request }
    }

    /// What to ask the index for.
    pub fn aggregation_request(&self) -> &AggregationRequest {
        &self.request
    }

    /// Facets for one response.
    ///
    /// Uses `aggregations` when the index returned them, and counts `results`
    /// otherwise. Zero-count buckets are left out, and so is any facet left
    /// with no values.
    pub fn generate_facets(
        &self,
        results: &[CatalogItem],
        aggregations: Option<&Aggregations>,
        active: &SearchFilters,
        domain: &DomainContext,
    ) -> Vec<Facet> {
        let local;
        let aggs = match aggregations {
            Some(aggs) => aggs,
            None => {
                local = aggregate(results, &self.request);
                &local
            }
        };

        let mut facets = Vec::with_capacity(6);
        facets.push(range_facet("price", "Price", &aggs.price, active, price_label, |b| {
            Some(FacetFilter::Price {
                min: b.from,
                max: b.to,
            })
        }));
        facets.push(range_facet("rating", "Rating", &aggs.rating, active, rating_label, |b| {
            whole_stars(b.from).map(FacetFilter::Rating)
        }));
        facets.push(terms_facet(
            "category",
            "Category",
            aggs.categories
                .iter()
                .map(|t| (FacetFilter::Category(t.key.to_lowercase()), t.label.clone(), t.count)),
            active,
        ));
        facets.push(terms_facet(
            "store",
            "Store",
            aggs.stores.iter().filter_map(|t| {
                let id: u64 = t.key.parse().ok()?;
                let label = if t.label.is_empty() { t.key.clone() } else { t.label.clone() };
                Some((FacetFilter::Store(id), label, t.count))
            }),
            active,
        ));
        if domain.has_dietary_concept() {
            if let Some(veg) = aggs.veg {
                facets.push(bool_facet(
                    "veg",
                    "Dietary",
                    veg,
                    ("Veg", "Non-veg"),
                    FacetFilter::Veg,
                    active,
                ));
            }
        }
        if let Some(stock) = aggs.in_stock {
            facets.push(bool_facet(
                "in_stock",
                "Availability",
                stock,
                ("In stock", "Out of stock"),
                FacetFilter::InStock,
                active,
            ));
        }

        facets.retain(|f| !f.values.is_empty());
        debug!(facets = facets.len(), module = domain.module_id, "generated facets");
        facets
    }
}

fn value_of(
    filter: &FacetFilter,
    label: String,
    count: usize,
    active: &SearchFilters,
) -> FacetValue {
    FacetValue {
        value: filter.value(),
        label,
        count,
        selected: filter.is_active_in(active),
    }
}

fn range_facet(
    field: &str,
    label: &str,
    buckets: &[RangeCount],
    active: &SearchFilters,
    labeller: fn(&RangeCount) -> String,
    to_filter: impl Fn(&RangeCount) -> Option<FacetFilter>,
) -> Facet {
    Facet {
        field: field.to_string(),
        label: label.to_string(),
        kind: FacetKind::Range,
        values: buckets
            .iter()
            .filter(|b| b.count > 0)
            .filter_map(|b| Some(value_of(&to_filter(b)?, labeller(b), b.count, active)))
            .collect(),
    }
}

fn terms_facet(
    field: &str,
    label: &str,
    terms: impl Iterator<Item = (FacetFilter, String, usize)>,
    active: &SearchFilters,
) -> Facet {
    Facet {
        field: field.to_string(),
        label: label.to_string(),
        kind: FacetKind::Terms,
        values: terms
            .filter(|(_, _, count)| *count > 0)
            .map(|(filter, label, count)| value_of(&filter, label, count, active))
            .collect(),
    }
}

fn bool_facet(
    field: &str,
    label: &str,
    counts: BoolCount,
    (yes, no): (&str, &str),
    to_filter: fn(bool) -> FacetFilter,
    active: &SearchFilters,
) -> Facet {
    let values = [(true, yes, counts.yes), (false, no, counts.no)]
        .into_iter()
        .filter(|(_, _, count)| *count > 0)
        .map(|(b, text, count)| value_of(&to_filter(b), text.to_string(), count, active))
        .collect();
    Facet {
        field: field.to_string(),
        label: label.to_string(),
        kind: FacetKind::Boolean,
        values,
    }
}

fn price_label(bucket: &RangeCount) -> String {
    match bucket.to {
        Some(to) if bucket.from <= 0.0 => format!("Under ₹{to}"),
        Some(to) => format!("₹{} - ₹{to}", bucket.from),
        None => format!("Above ₹{}", bucket.from),
    }
}

/// A star rating the `rating=N` filter can express. An index may hand back
/// thresholds like 4.5; those buckets are skipped.
fn whole_stars(from: f64) -> Option<u8> {
    ((0.0..=5.0).contains(&from) && from.fract() == 0.0).then_some(from as u8)
}

fn rating_label(bucket: &RangeCount) -> String {
    format!("{}★ & above", bucket.from)
}
