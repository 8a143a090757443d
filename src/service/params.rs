// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Request parameters, one struct per operation.
//!
//! Field names match the query-string keys a transport layer would decode
//! (`price_min`, `radius_km`, ...), so these deserialize straight from a
//! `serde_urlencoded`/`serde_json` map. Everything except `q` is optional.

use serde::{Deserialize, Serialize};

use crate::error::{KhojError, Result};
use crate::types::{GeoPoint, SortOrder};

/// Search radius when a caller sends coordinates but no `radius_km`.
pub const DEFAULT_RADIUS_KM: f64 = 10.0;

/// `search/hybrid/{module}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HybridSearchParams {
    pub q: String,
    pub veg: Option<bool>,
    pub category_id: Option<u64>,
    pub price_min: Option<f64>,
    pub price_max: Option<f64>,
    pub store_id: Option<u64>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub radius_km: Option<f64>,
    pub size: Option<usize>,
    pub user_id: Option<String>,
    /// Selected facet values, `field=value` encoded.
    pub facets: Vec<String>,
}

impl HybridSearchParams {
    pub fn new(q: &str) -> Self {
        Self {
            q: q.to_string(),
            ..Default::default()
        }
    }
}

/// `search/items`. `zone_id` or `lat`/`lon` is required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemSearchParams {
    pub q: String,
    pub module_id: Option<u64>,
    pub zone_id: Option<u64>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    /// Run the vector branch too. Off means lexical only.
    pub semantic: bool,
    pub veg: Option<bool>,
    pub category_id: Option<u64>,
    pub price_min: Option<f64>,
    pub price_max: Option<f64>,
    pub min_rating: Option<f64>,
    pub in_stock: Option<bool>,
    pub page: Option<usize>,
    pub size: Option<usize>,
    pub sort: SortOrder,
    pub user_id: Option<String>,
    pub facets: Vec<String>,
}

impl Default for ItemSearchParams {
    fn default() -> Self {
        Self {
            q: String::new(),
            module_id: None,
            zone_id: None,
            lat: None,
            lon: None,
            semantic: true,
            veg: None,
            category_id: None,
            price_min: None,
            price_max: None,
            min_rating: None,
            in_stock: None,
            page: None,
            size: None,
            sort: SortOrder::Relevance,
            user_id: None,
            facets: Vec::new(),
        }
    }
}

impl ItemSearchParams {
    pub fn new(q: &str) -> Self {
        Self {
            q: q.to_string(),
            ..Default::default()
        }
    }

    pub fn zone(mut self, zone_id: u64) -> Self {
        self.zone_id = Some(zone_id);
        self
    }

    pub fn user(mut self, user_id: &str) -> Self {
        self.user_id = Some(user_id.to_string());
        self
    }
}

/// `search/conversational`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversationalParams {
    pub q: String,
    pub module_id: Option<u64>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub user_id: Option<String>,
}

impl ConversationalParams {
    pub fn new(q: &str) -> Self {
        Self {
            q: q.to_string(),
            ..Default::default()
        }
    }
}

/// `lat` and `lon` travel together and must be a real coordinate.
pub(crate) fn point(lat: Option<f64>, lon: Option<f64>) -> Result<Option<GeoPoint>> {
    match (lat, lon) {
        (None, None) => Ok(None),
        (Some(lat), Some(lon)) => GeoPoint::new(lat, lon)
            .map(Some)
            .ok_or_else(|| KhojError::InvalidFilter {
                field: "lat".to_string(),
                reason: format!("({lat}, {lon}) is not a coordinate"),
            }),
        (Some(_), None) | (None, Some(_)) => Err(KhojError::InvalidFilter {
            field: if lat.is_some() { "lon" } else { "lat" }.to_string(),
            reason: "lat and lon must be sent together".to_string(),
        }),
    }
}
