// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Process configuration.
//!
//! Resolution, highest priority first:
//!
//! 1. Environment (`KHOJ_INDEX_URL`, `KHOJ_EMBEDDING_URL`, `KHOJ_LEGACY_URL`)
//! 2. The JSON file passed to [`KhojConfig::load`]
//! 3. Compiled defaults (every section is `#[serde(default)]`)
//!
//! A config that fails [`KhojConfig::validate`] is a deployment mistake, not
//! a runtime condition: the binary refuses to start.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{KhojError, Result};
use crate::experiment::Experiment;
use crate::facets::{AggregationRequest, DEFAULT_PRICE_BREAKPOINTS, DEFAULT_TOP_N};
use crate::retrieval::{
    default_fields, DiversityCaps, FusionWeights, RerankWeights, RetrievalSettings,
};

/// Embedding dimensions that have an index field.
pub const SUPPORTED_DIMENSIONS: [usize; 2] = [384, 768];

/// Scheme for the in-process index.
pub const MEMORY_INDEX_URL: &str = "memory://catalog";

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KhojConfig {
    pub backends: BackendConfig,
    pub timeouts: TimeoutConfig,
    pub query: QueryConfig,
    pub hybrid: HybridConfig,
    pub multi_stage: MultiStageConfig,
    pub facets: FacetConfig,
    pub experiments: Vec<Experiment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Required.
    pub index_url: String,
    pub embedding_url: Option<String>,
    /// Used only when the index is unreachable.
    pub legacy_url: Option<String>,
    pub embedding_model: String,
    pub embedding_dimension: usize,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            index_url: String::new(),
            embedding_url: None,
            legacy_url: None,
            embedding_model: "all-MiniLM-L6-v2".to_string(),
            embedding_dimension: 384,
        }
    }
}

/// Per-call budgets, milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    pub index_ms: u64,
    pub embedding_ms: u64,
    pub personalization_ms: u64,
    pub legacy_ms: u64,
    pub zone_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            index_ms: 800,
            embedding_ms: 300,
            personalization_ms: 150,
            legacy_ms: 1500,
            zone_ms: 200,
        }
    }
}

impl TimeoutConfig {
    pub fn index(&self) -> Duration {
        Duration::from_millis(self.index_ms)
    }

    pub fn embedding(&self) -> Duration {
        Duration::from_millis(self.embedding_ms)
    }

    pub fn personalization(&self) -> Duration {
        Duration::from_millis(self.personalization_ms)
    }

    pub fn legacy(&self) -> Duration {
        Duration::from_millis(self.legacy_ms)
    }

    pub fn zone(&self) -> Duration {
        Duration::from_millis(self.zone_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Characters, after trimming.
    pub max_len: usize,
    pub max_suggestions: usize,
    pub default_page_size: usize,
    pub max_page_size: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            max_len: 200,
            max_suggestions: 3,
            default_page_size: 20,
            max_page_size: 100,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HybridConfig {
    pub lexical_weight: f64,
    pub vector_weight: f64,
    pub native_vector_boost: f64,
    pub fuzzy: bool,
}

impl Default for HybridConfig {
    fn default() -> Self {
        Self {
            lexical_weight: 0.6,
            vector_weight: 0.4,
            native_vector_boost: 2.0,
            fuzzy: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MultiStageConfig {
    pub overfetch: usize,
    pub overfetch_filtered: usize,
    pub max_candidates: usize,
    pub personalization_bound: f64,
    pub max_consecutive_per_store: usize,
    pub max_per_store: usize,
    pub max_per_category: usize,
    pub relevance_weight: f64,
    pub rating_weight: f64,
    pub popularity_weight: f64,
}

impl Default for MultiStageConfig {
    fn default() -> Self {
        let caps = DiversityCaps::default();
        let weights = RerankWeights::default();
        Self {
            overfetch: 5,
            overfetch_filtered: 10,
            max_candidates: 500,
            personalization_bound: 0.3,
            max_consecutive_per_store: caps.max_consecutive_per_store,
            max_per_store: caps.max_per_store,
            max_per_category: caps.max_per_category,
            relevance_weight: weights.relevance,
            rating_weight: weights.rating,
            popularity_weight: weights.popularity,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FacetConfig {
    pub price_breakpoints: Vec<f64>,
    pub top_n: usize,
}

impl Default for FacetConfig {
    fn default() -> Self {
        Self {
            price_breakpoints: DEFAULT_PRICE_BREAKPOINTS.to_vec(),
            top_n: DEFAULT_TOP_N,
        }
    }
}

impl KhojConfig {
    /// Defaults wired to the in-process index. What the CLI runs with when no
    /// config file is given.
    pub fn in_memory() -> Self {
        let mut config = Self::default();
        config.backends.index_url = MEMORY_INDEX_URL.to_string();
        config
    }

    /// Read `path`, apply environment overrides, validate.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let mut config = Self::from_json(&text)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Parse without validating.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Overrides from any key → value lookup. Empty values are ignored.
    pub fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(url) = get("KHOJ_INDEX_URL") {
            self.backends.index_url = url;
        }
        if let Some(url) = get("KHOJ_EMBEDDING_URL") {
            self.backends.embedding_url = Some(url);
        }
        if let Some(url) = get("KHOJ_LEGACY_URL") {
            self.backends.legacy_url = Some(url);
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.backends.index_url.trim().is_empty() {
            return Err(KhojError::config(
                "backends.index_url is required (or set KHOJ_INDEX_URL)",
            ));
        }
        if !SUPPORTED_DIMENSIONS.contains(&self.backends.embedding_dimension) {
            return Err(KhojError::config(format!(
                "backends.embedding_dimension {} has no index field (use 384 or 768)",
                self.backends.embedding_dimension
            )));
        }

        let t = &self.timeouts;
        for (name, ms) in [
            ("index_ms", t.index_ms),
            ("embedding_ms", t.embedding_ms),
            ("personalization_ms", t.personalization_ms),
            ("legacy_ms", t.legacy_ms),
            ("zone_ms", t.zone_ms),
        ] {
            if ms == 0 {
                return Err(KhojError::config(format!("timeouts.{name} must be above 0")));
            }
        }

        if self.query.max_len == 0 || self.query.default_page_size == 0 {
            return Err(KhojError::config(
                "query.max_len and query.default_page_size must be above 0",
            ));
        }
        if self.query.default_page_size > self.query.max_page_size {
            return Err(KhojError::config(
                "query.default_page_size is above query.max_page_size",
            ));
        }

        let h = &self.hybrid;
        if h.lexical_weight < 0.0 || h.vector_weight < 0.0 {
            return Err(KhojError::config("hybrid weights must not be negative"));
        }
        if ((h.lexical_weight + h.vector_weight) - 1.0).abs() > 1e-6 {
            return Err(KhojError::config(format!(
                "hybrid.lexical_weight + hybrid.vector_weight = {}, must be 1.0",
                h.lexical_weight + h.vector_weight
            )));
        }
        if !(h.native_vector_boost.is_finite() && h.native_vector_boost > 0.0) {
            return Err(KhojError::config("hybrid.native_vector_boost must be positive"));
        }

        let m = &self.multi_stage;
        if m.overfetch == 0 || m.overfetch_filtered == 0 || m.max_candidates == 0 {
            return Err(KhojError::config("multi_stage over-fetch settings must be above 0"));
        }
        if m.max_consecutive_per_store == 0 || m.max_per_store == 0 || m.max_per_category == 0 {
            return Err(KhojError::config("multi_stage diversity caps must be above 0"));
        }
        if !(m.personalization_bound.is_finite() && m.personalization_bound >= 0.0) {
            return Err(KhojError::config("multi_stage.personalization_bound must be >= 0"));
        }

        if self.facets.price_breakpoints.iter().any(|b| !b.is_finite() || *b <= 0.0) {
            return Err(KhojError::config("facets.price_breakpoints must be positive"));
        }
        if self
            .facets
            .price_breakpoints
            .windows(2)
            .any(|w| w[0] >= w[1])
        {
            return Err(KhojError::config("facets.price_breakpoints must be ascending"));
        }

        for experiment in &self.experiments {
            experiment
                .validate()
                .map_err(|e| KhojError::config(format!("experiments: {e}")))?;
        }
        Ok(())
    }

    pub fn aggregation_request(&self) -> AggregationRequest {
        AggregationRequest {
            price_breakpoints: self.facets.price_breakpoints.clone(),
            top_n: self.facets.top_n,
        }
    }

    pub fn rerank_weights(&self) -> RerankWeights {
        RerankWeights {
            relevance: self.multi_stage.relevance_weight,
            rating: self.multi_stage.rating_weight,
            popularity: self.multi_stage.popularity_weight,
        }
    }

    pub fn retrieval_settings(&self) -> RetrievalSettings {
        let m = &self.multi_stage;
        RetrievalSettings {
            index_timeout: self.timeouts.index(),
            embedding_timeout: self.timeouts.embedding(),
            personalization_timeout: self.timeouts.personalization(),
            fusion: FusionWeights {
                lexical: self.hybrid.lexical_weight,
                vector: self.hybrid.vector_weight,
            },
            native_vector_boost: self.hybrid.native_vector_boost,
            fields: default_fields(),
            fuzzy: self.hybrid.fuzzy,
            overfetch: m.overfetch,
            overfetch_filtered: m.overfetch_filtered,
            max_candidates: m.max_candidates,
            personalization_bound: m.personalization_bound,
            diversity: DiversityCaps {
                max_consecutive_per_store: m.max_consecutive_per_store,
                max_per_store: m.max_per_store,
                max_per_category: m.max_per_category,
            },
            aggregations: Some(self.aggregation_request()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn defaults_need_an_index_url() {
        let err = KhojConfig::default().validate().expect_err("no index url");
        assert!(err.to_string().contains("index_url"));
        assert!(KhojConfig::in_memory().validate().is_ok());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config = KhojConfig::from_json(
            r#"{ "backends": { "index_url": "http://search:9200" }, "timeouts": { "index_ms": 500 } }"#,
        )
        .expect("parses");
        assert_eq!(config.timeouts.index_ms, 500);
        assert_eq!(config.timeouts.embedding_ms, 300);
        assert_eq!(config.hybrid.lexical_weight, 0.6);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn env_overrides_file() {
        let mut config = KhojConfig::in_memory();
        let env = HashMap::from([
            ("KHOJ_INDEX_URL", "http://prod:9200"),
            ("KHOJ_LEGACY_URL", ""),
        ]);
        config.apply_overrides_from(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.backends.index_url, "http://prod:9200");
        assert_eq!(config.backends.legacy_url, None);
    }

    #[test]
    fn weights_must_sum_to_one() {
        let mut config = KhojConfig::in_memory();
        config.hybrid.vector_weight = 0.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn odd_dimension_is_rejected() {
        let mut config = KhojConfig::in_memory();
        config.backends.embedding_dimension = 512;
        assert!(config.validate().is_err());
    }

    #[test]
    fn bad_experiment_is_a_config_error() {
        let config = KhojConfig::from_json(
            r#"{
                "backends": { "index_url": "memory://catalog" },
                "experiments": [{ "name": "x", "variants": [{ "name": "a", "weight": 60 }] }]
            }"#,
        )
        .expect("parses");
        let err = config.validate().expect_err("weights sum to 60");
        assert_eq!(err.kind(), crate::error::ErrorKind::Configuration);
    }

    #[test]
    fn load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, r#"{{ "backends": {{ "index_url": "memory://catalog" }} }}"#).expect("write");
        let config = KhojConfig::load(file.path()).expect("loads");
        assert_eq!(config.query.max_len, 200);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = KhojConfig::load(Path::new("/nonexistent/khoj.json")).expect_err("missing");
        assert!(matches!(err, KhojError::ConfigIo(_)));
    }
}
