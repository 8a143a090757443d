// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Caller-facing filters and their translation to index predicates.

use serde::{Deserialize, Serialize};

use super::backend::{FieldValue, Predicate};
use crate::error::{KhojError, Result};
use crate::types::GeoPoint;

/// A search radius around a point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoFilter {
    pub center: GeoPoint,
    pub radius_km: f64,
}

/// Every filter a search request can carry. `None` means "don't filter".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub veg: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<u64>,
    /// Category by name, matched whole (case-insensitive), the same key the
    /// category facet counts on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_max: Option<f64>,
    /// `price_max` excludes its bound. Price facet buckets are `[from, to)`.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub price_max_exclusive: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_id: Option<u64>,
    /// Store by (partial) name, from "X from Y" style queries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_stock: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geo: Option<GeoFilter>,
}

impl SearchFilters {
    /// True when any *narrowing* filter is set. Scope filters (module, zone)
    /// don't count: every request has those.
    pub fn is_narrowing(&self) -> bool {
        self.veg.is_some()
            || self.category_id.is_some()
            || self.category.is_some()
            || self.price_min.is_some()
            || self.price_max.is_some()
            || self.min_rating.is_some()
            || self.store_id.is_some()
            || self.store_name.is_some()
            || self.in_stock.is_some()
            || self.geo.is_some()
    }

    /// Reject filters that can never match anything.
    pub fn validate(&self) -> Result<()> {
        let invalid = |field: &str, reason: String| KhojError::InvalidFilter {
            field: field.to_string(),
            reason,
        };
        for (field, value) in [("price_min", self.price_min), ("price_max", self.price_max)] {
            if let Some(v) = value {
                if !v.is_finite() || v < 0.0 {
                    return Err(invalid(field, format!("{v} is not a valid price")));
                }
            }
        }
        if let (Some(lo), Some(hi)) = (self.price_min, self.price_max) {
            if lo > hi {
                return Err(invalid("price_min", format!("{lo} is above price_max {hi}")));
            }
            if lo == hi && self.price_max_exclusive {
                return Err(invalid("price_max", format!("[{lo}, {hi}) is empty")));
            }
        }
        if let Some(r) = self.min_rating {
            if !(0.0..=5.0).contains(&r) {
                return Err(invalid("min_rating", format!("{r} is outside 0-5")));
            }
        }
        if let Some(geo) = &self.geo {
            if !(geo.radius_km.is_finite() && geo.radius_km > 0.0) {
                return Err(invalid("radius_km", format!("{} must be positive", geo.radius_km)));
            }
        }
        Ok(())
    }

    /// Index predicates, in a fixed order.
    pub fn to_predicates(&self) -> Vec<Predicate> {
        let mut out = Vec::new();
        let equals = |field: &str, value: FieldValue| Predicate::Equals {
            field: field.to_string(),
            value,
        };

        if let Some(id) = self.module_id {
            out.push(equals("module_id", FieldValue::Int(id)));
        }
        if let Some(id) = self.zone_id {
            out.push(equals("zone_id", FieldValue::Int(id)));
        }
        if let Some(veg) = self.veg {
            out.push(equals("veg", FieldValue::Bool(veg)));
        }
        if let Some(id) = self.category_id {
            out.push(equals("category_id", FieldValue::Int(id)));
        }
        if let Some(name) = &self.category {
            out.push(equals("category", FieldValue::Text(name.to_lowercase())));
        }
        if let Some(id) = self.store_id {
            out.push(equals("store_id", FieldValue::Int(id)));
        }
        if let Some(name) = &self.store_name {
            out.push(Predicate::Contains {
                field: "store_name".to_string(),
                value: name.to_lowercase(),
            });
        }
        if let Some(in_stock) = self.in_stock {
            out.push(equals("in_stock", FieldValue::Bool(in_stock)));
        }
        if self.price_min.is_some() || self.price_max.is_some() {
            out.push(Predicate::Range {
                field: "price".to_string(),
                min: self.price_min,
                max: self.price_max,
                max_exclusive: self.price_max_exclusive && self.price_max.is_some(),
            });
        }
        if let Some(r) = self.min_rating {
            out.push(Predicate::Range {
                field: "rating".to_string(),
                min: Some(r),
                max: None,
                max_exclusive: false,
            });
        }
        if let Some(geo) = self.geo {
            out.push(Predicate::GeoDistance {
                field: "location".to_string(),
                center: geo.center,
                radius_km: geo.radius_km,
            });
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_filters_produce_no_predicates() {
        assert!(SearchFilters::default().to_predicates().is_empty());
        assert!(!SearchFilters::default().is_narrowing());
    }

    #[test]
    fn price_bounds_become_one_range() {
        let f = SearchFilters {
            price_min: Some(100.0),
            price_max: Some(200.0),
            ..Default::default()
        };
        assert_eq!(
            f.to_predicates(),
            vec![Predicate::Range {
                field: "price".into(),
                min: Some(100.0),
                max: Some(200.0),
                max_exclusive: false,
            }]
        );
    }

    #[test]
    fn category_matches_whole_name() {
        let f = SearchFilters {
            category: Some("Rice".into()),
            ..Default::default()
        };
        assert_eq!(
            f.to_predicates(),
            vec![Predicate::Equals {
                field: "category".into(),
                value: FieldValue::Text("rice".into()),
            }]
        );
    }

    #[test]
    fn empty_half_open_price_range_is_rejected() {
        let f = SearchFilters {
            price_min: Some(200.0),
            price_max: Some(200.0),
            price_max_exclusive: true,
            ..Default::default()
        };
        assert!(f.validate().is_err());
        let inclusive = SearchFilters {
            price_max_exclusive: false,
            ..f
        };
        assert!(inclusive.validate().is_ok());
    }

    #[test]
    fn scope_filters_are_not_narrowing() {
        let f = SearchFilters {
            zone_id: Some(3),
            module_id: Some(1),
            ..Default::default()
        };
        assert!(!f.is_narrowing());
        assert_eq!(f.to_predicates().len(), 2);
    }

    #[test]
    fn inverted_price_range_is_rejected() {
        let f = SearchFilters {
            price_min: Some(500.0),
            price_max: Some(100.0),
            ..Default::default()
        };
        assert!(matches!(f.validate(), Err(KhojError::InvalidFilter { .. })));
    }

    #[test]
    fn zero_radius_is_rejected() {
        let f = SearchFilters {
            geo: Some(GeoFilter {
                center: GeoPoint { lat: 18.5, lon: 73.8 },
                radius_km: 0.0,
            }),
            ..Default::default()
        };
        assert!(f.validate().is_err());
    }
}
