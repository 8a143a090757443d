// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Shared vocabulary types: catalog items, sort orders, module context.
//!
//! These travel through every layer, from query understanding (which
//! recommends a sort) to retrieval (which filters and sorts items) to facets
//! (which counts them). Keeping them here avoids the understanding layer
//! depending on retrieval internals.
//!
//! # Invariants
//!
//! - **CatalogItem**: `price ≥ 0`, `0 ≤ rating ≤ 5`. The in-memory index
//!   clamps rather than rejects, since catalog feeds are messy.
//! - **GeoPoint**: `-90 ≤ lat ≤ 90`, `-180 ≤ lon ≤ 180`. Checked by
//!   [`GeoPoint::new`], trusted everywhere else.

use serde::{Deserialize, Serialize};

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    /// Validated constructor. Out-of-range coordinates return `None`.
    pub fn new(lat: f64, lon: f64) -> Option<Self> {
        let valid = (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon);
        valid.then_some(Self { lat, lon })
    }

    /// Great-circle distance in kilometres (haversine, mean Earth radius).
    pub fn distance_km(&self, other: &GeoPoint) -> f64 {
        const EARTH_RADIUS_KM: f64 = 6371.0;
        let (lat1, lat2) = (self.lat.to_radians(), other.lat.to_radians());
        let dlat = lat2 - lat1;
        let dlon = (other.lon - self.lon).to_radians();
        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_KM * a.sqrt().atan2((1.0 - a).sqrt())
    }
}

/// One sellable thing in the catalog, as the index returns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub category_id: u64,
    pub store_id: u64,
    #[serde(default)]
    pub store_name: String,
    pub price: f64,
    #[serde(default)]
    pub rating: f64,
    /// Order count or similar. Only relative size matters.
    #[serde(default)]
    pub popularity: u64,
    #[serde(default)]
    pub veg: bool,
    #[serde(default = "default_in_stock")]
    pub in_stock: bool,
    #[serde(default)]
    pub module_id: u64,
    #[serde(default)]
    pub zone_id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<GeoPoint>,
}

fn default_in_stock() -> bool {
    true
}

/// Result ordering a caller can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Relevance,
    PriceAsc,
    PriceDesc,
    Rating,
    Popularity,
}

impl std::str::FromStr for SortOrder {
    type Err = crate::error::KhojError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "relevance" => Ok(SortOrder::Relevance),
            "price_asc" | "price-asc" => Ok(SortOrder::PriceAsc),
            "price_desc" | "price-desc" => Ok(SortOrder::PriceDesc),
            "rating" => Ok(SortOrder::Rating),
            "popularity" => Ok(SortOrder::Popularity),
            other => Err(crate::error::KhojError::InvalidFilter {
                field: "sort".to_string(),
                reason: format!("unknown sort order '{other}'"),
            }),
        }
    }
}

/// What kind of catalog a module serves. Decides which facets make sense.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleKind {
    #[default]
    Food,
    Grocery,
    Pharmacy,
    Ecommerce,
    Parcel,
}

/// The module a request is scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DomainContext {
    pub module_id: u64,
    pub kind: ModuleKind,
}

impl DomainContext {
    pub fn new(module_id: u64, kind: ModuleKind) -> Self {
        Self { module_id, kind }
    }

    /// Veg/non-veg only means something for food.
    pub fn has_dietary_concept(&self) -> bool {
        self.kind == ModuleKind::Food
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn haversine_pune_to_mumbai() {
        let pune = GeoPoint::new(18.5204, 73.8567).expect("valid");
        let mumbai = GeoPoint::new(19.0760, 72.8777).expect("valid");
        let d = pune.distance_km(&mumbai);
        assert!((115.0..125.0).contains(&d), "got {d}");
    }

    #[test]
    fn rejects_out_of_range_coordinates() {
        assert!(GeoPoint::new(91.0, 0.0).is_none());
        assert!(GeoPoint::new(0.0, -181.0).is_none());
    }

    #[test]
    fn sort_order_parses_both_spellings() {
        assert_eq!("price-asc".parse::<SortOrder>().ok(), Some(SortOrder::PriceAsc));
        assert_eq!("".parse::<SortOrder>().ok(), Some(SortOrder::Relevance));
        assert!("newest".parse::<SortOrder>().is_err());
    }

    #[test]
    fn only_food_has_dietary_facets() {
        assert!(DomainContext::new(1, ModuleKind::Food).has_dietary_concept());
        assert!(!DomainContext::new(2, ModuleKind::Grocery).has_dietary_concept());
    }
}
