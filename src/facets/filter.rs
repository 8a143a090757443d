// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Facet value ⇄ filter encoding.
//!
//! A clicked facet value comes back from the UI as `field=value`:
//!
//! | Encoded           | Filter                               |
//! |-------------------|--------------------------------------|
//! | `price=100-200`   | `price_min = 100`, `price_max < 200` |
//! | `price=1000+`     | `price_min = 1000`                   |
//! | `rating=4`        | `min_rating = 4`                     |
//! | `category=pizza`  | `category = "pizza"`                 |
//! | `store=12`        | `store_id = 12`                      |
//! | `veg=1`           | `veg = true`                         |
//! | `in_stock=0`      | `in_stock = false`                   |
//!
//! [`facet_value_of`] and [`FacetFilter::encode`] are inverse, so a value
//! the engine emits decodes to exactly the filter that marks it `selected`.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::aggregate::price_key;
use crate::error::{KhojError, Result};
use crate::retrieval::SearchFilters;

/// One decoded facet selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum FacetFilter {
    Price { min: f64, max: Option<f64> },
    Rating(u8),
    Category(String),
    Store(u64),
    Veg(bool),
    InStock(bool),
}

impl FacetFilter {
    pub fn field(&self) -> &'static str {
        match self {
            FacetFilter::Price { .. } => "price",
            FacetFilter::Rating(_) => "rating",
            FacetFilter::Category(_) => "category",
            FacetFilter::Store(_) => "store",
            FacetFilter::Veg(_) => "veg",
            FacetFilter::InStock(_) => "in_stock",
        }
    }

    /// The value half of the `field=value` encoding.
    pub fn value(&self) -> String {
        match self {
            FacetFilter::Price { min, max } => price_key(*min, *max),
            FacetFilter::Rating(r) => r.to_string(),
            FacetFilter::Category(c) => c.clone(),
            FacetFilter::Store(id) => id.to_string(),
            FacetFilter::Veg(b) | FacetFilter::InStock(b) => flag(*b).to_string(),
        }
    }

    pub fn encode(&self) -> String {
        format!("{}={}", self.field(), self.value())
    }

    /// Narrow `filters` by this selection.
    pub fn apply(&self, filters: &mut SearchFilters) {
        match self {
            FacetFilter::Price { min, max } => {
                filters.price_min = (*min > 0.0).then_some(*min);
                filters.price_max = *max;
                filters.price_max_exclusive = max.is_some();
            }
            FacetFilter::Rating(r) => filters.min_rating = Some(f64::from(*r)),
            FacetFilter::Category(c) => filters.category = Some(c.clone()),
            FacetFilter::Store(id) => filters.store_id = Some(*id),
            FacetFilter::Veg(b) => filters.veg = Some(*b),
            FacetFilter::InStock(b) => filters.in_stock = Some(*b),
        }
    }

    /// Whether `filters` already has exactly this selection.
    pub fn is_active_in(&self, filters: &SearchFilters) -> bool {
        match self {
            FacetFilter::Price { min, max } => {
                filters.price_min.unwrap_or(0.0) == *min
                    && filters.price_max == *max
                    && (max.is_none() || filters.price_max_exclusive)
            }
            FacetFilter::Rating(r) => filters.min_rating == Some(f64::from(*r)),
            FacetFilter::Category(c) => filters
                .category
                .as_deref()
                .is_some_and(|active| active.eq_ignore_ascii_case(c)),
            FacetFilter::Store(id) => filters.store_id == Some(*id),
            FacetFilter::Veg(b) => filters.veg == Some(*b),
            FacetFilter::InStock(b) => filters.in_stock == Some(*b),
        }
    }
}

impl fmt::Display for FacetFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

fn flag(b: bool) -> &'static str {
    if b {
        "1"
    } else {
        "0"
    }
}

/// Decode one facet value of `field`.
pub fn facet_value_of(field: &str, value: &str) -> Result<FacetFilter> {
    let invalid = |reason: &str| KhojError::InvalidFilter {
        field: field.to_string(),
        reason: format!("'{value}' {reason}"),
    };
    let value = value.trim();
    match field.trim() {
        "price" => {
            let (min, max) = match value.strip_suffix('+') {
                Some(min) => (min, None),
                None => {
                    let (min, max) = value
                        .split_once('-')
                        .ok_or_else(|| invalid("is not a price range"))?;
                    (min, Some(max))
                }
            };
            let min: f64 = min.parse().map_err(|_| invalid("has a bad lower bound"))?;
            let max: Option<f64> = max
                .map(str::parse)
                .transpose()
                .map_err(|_| invalid("has a bad upper bound"))?;
            if !min.is_finite() || min < 0.0 || max.is_some_and(|m| !m.is_finite() || m < min) {
                return Err(invalid("is not a valid price range"));
            }
            Ok(FacetFilter::Price { min, max })
        }
        "rating" => match value.parse::<u8>() {
            Ok(r) if r <= 5 => Ok(FacetFilter::Rating(r)),
            _ => Err(invalid("is not a star rating")),
        },
        "category" if !value.is_empty() => Ok(FacetFilter::Category(value.to_lowercase())),
        "store" => value
            .parse()
            .map(FacetFilter::Store)
            .map_err(|_| invalid("is not a store id")),
        "veg" => parse_flag(value).map(FacetFilter::Veg).ok_or_else(|| invalid("is not 0/1")),
        "in_stock" => parse_flag(value)
            .map(FacetFilter::InStock)
            .ok_or_else(|| invalid("is not 0/1")),
        _ => Err(invalid("is not a known facet value")),
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value {
        "1" | "true" => Some(true),
        "0" | "false" => Some(false),
        _ => None,
    }
}

/// Decode `field=value` strings, in order. The first bad one fails the lot.
pub fn parse_facet_filters<S: AsRef<str>>(encoded: &[S]) -> Result<Vec<FacetFilter>> {
    encoded
        .iter()
        .map(|pair| {
            let pair = pair.as_ref();
            let (field, value) = pair.split_once('=').ok_or_else(|| KhojError::InvalidFilter {
                field: "facet".to_string(),
                reason: format!("'{pair}' is not field=value"),
            })?;
            facet_value_of(field, value)
        })
        .collect()
}

/// Fold selections into `base`. Later selections on the same field win.
pub fn apply_facet_filters(base: &SearchFilters, selections: &[FacetFilter]) -> SearchFilters {
    let mut filters = base.clone();
    for selection in selections {
        selection.apply(&mut filters);
    }
    filters
}
