// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Facets: bucket counts alongside results, and the filter each bucket stands for.
//!
//! Three pieces:
//!
//! - [`aggregate`]: count items into price, rating, category, store and
//!   boolean buckets (what an index aggregation returns)
//! - [`FacetsEngine`]: turn those counts plus the caller's active filters into
//!   [`Facet`]s with `selected` flags
//! - [`facet_value_of`] / [`parse_facet_filters`]: decode a clicked value back
//!   into a [`FacetFilter`]
//!
//! Facets are rebuilt for every response. Nothing here caches across filter
//! sets.

mod aggregate;
mod engine;
mod filter;

pub use aggregate::{
    aggregate, price_key, AggregationRequest, Aggregations, BoolCount, RangeCount, TermCount,
    DEFAULT_PRICE_BREAKPOINTS, DEFAULT_TOP_N, RATING_THRESHOLDS,
};
pub use engine::{Facet, FacetKind, FacetValue, FacetsEngine};
pub use filter::{apply_facet_filters, facet_value_of, parse_facet_filters, FacetFilter};
