// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Test utilities shared across unit and integration tests.
//!
//! This module is always compiled but hidden from documentation.
//! It provides canonical fixtures (a small Pune food catalog) and scripted
//! collaborators whose latency and failures a test controls, so fan-out,
//! timeout and fallback behaviour can be exercised without a network.

#![doc(hidden)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::{Backend, KhojError, Result};
use crate::memory::{HashingEmbedder, MemoryIndex};
use crate::retrieval::{
    AnalyticsEvent, AnalyticsSink, DocumentIndex, EmbeddingProvider, Hit, HitSource, HybridQuery,
    IndexResponse, LegacyRequest, LegacySearch, LexicalQuery, PreferenceStore, VectorQuery,
    ZoneResolver,
};
use crate::types::{CatalogItem, GeoPoint};

// ============================================================================
// FIXTURES
// ============================================================================

/// Create a plain catalog item with the given id.
///
/// Veg, in stock, ₹100, rated 4.0, module 1, zone 3, store 1.
pub fn sample_item(id: &str) -> CatalogItem {
    CatalogItem {
        id: id.to_string(),
        name: format!("Item {id}"),
        description: String::new(),
        category: "General".to_string(),
        category_id: 1,
        store_id: 1,
        store_name: "Test Store".to_string(),
        price: 100.0,
        rating: 4.0,
        popularity: 10,
        veg: true,
        in_stock: true,
        module_id: 1,
        zone_id: 3,
        location: None,
    }
}

/// Create a lexical hit around [`sample_item`].
pub fn hit(id: &str, score: f64) -> Hit {
    Hit {
        id: id.to_string(),
        index: "items".to_string(),
        score,
        source: HitSource::Lexical,
        highlights: Vec::new(),
        item: sample_item(id),
    }
}

/// Create a hit whose item belongs to `store_id`.
pub fn hit_from_store(id: &str, store_id: u64, score: f64) -> Hit {
    let mut h = hit(id, score);
    h.item.store_id = store_id;
    h.item.store_name = format!("Store {store_id}");
    h
}

#[allow(clippy::too_many_arguments)]
fn item(
    id: &str,
    name: &str,
    category: (&str, u64),
    store: (u64, &str),
    price: f64,
    rating: f64,
    popularity: u64,
    veg: bool,
    at: (f64, f64),
) -> CatalogItem {
    CatalogItem {
        id: id.to_string(),
        name: name.to_string(),
        description: format!("{name} from {}", store.1),
        category: category.0.to_string(),
        category_id: category.1,
        store_id: store.0,
        store_name: store.1.to_string(),
        price,
        rating,
        popularity,
        veg,
        in_stock: true,
        module_id: 1,
        zone_id: 3,
        location: GeoPoint::new(at.0, at.1),
    }
}

/// Seventeen dishes from six Pune stores, module 1, zone 3.
///
/// Mixed veg/non-veg, every price band, one item out of stock.
pub fn sample_catalog() -> Vec<CatalogItem> {
    const PARADISE: (u64, &str) = (11, "Paradise Biryani");
    const INAYAT: (u64, &str) = (12, "Inayat Cafe");
    const DOMINOS: (u64, &str) = (13, "Domino's Pizza");
    const SHREE: (u64, &str) = (14, "Shree Sweets");
    const HYDERABAD: (u64, &str) = (15, "Hyderabad House");
    const UDUPI: (u64, &str) = (16, "Udupi Cafe");

    const BIRYANI: (&str, u64) = ("Biryani", 1);
    const NORTH: (&str, u64) = ("North Indian", 2);
    const BREADS: (&str, u64) = ("Breads", 3);
    const PIZZA: (&str, u64) = ("Pizza", 4);
    const SWEETS: (&str, u64) = ("Sweets", 5);
    const SOUTH: (&str, u64) = ("South Indian", 6);
    const BEVERAGES: (&str, u64) = ("Beverages", 7);

    const CAMP: (f64, f64) = (18.5158, 73.8780);
    const FC_ROAD: (f64, f64) = (18.5236, 73.8412);
    const KOTHRUD: (f64, f64) = (18.5074, 73.8077);
    const HINJEWADI: (f64, f64) = (18.5913, 73.7389);

    let mut out = vec![
        item("101", "Chicken Biryani", BIRYANI, PARADISE, 320.0, 4.5, 950, false, CAMP),
        item("102", "Mutton Biryani", BIRYANI, PARADISE, 420.0, 4.4, 610, false, CAMP),
        item("103", "Veg Biryani", BIRYANI, PARADISE, 240.0, 4.0, 300, true, CAMP),
        item("201", "Butter Chicken", NORTH, INAYAT, 360.0, 4.6, 880, false, FC_ROAD),
        item("202", "Paneer Butter Masala", NORTH, INAYAT, 290.0, 4.3, 540, true, FC_ROAD),
        item("203", "Garlic Naan", BREADS, INAYAT, 60.0, 4.2, 700, true, FC_ROAD),
        item("301", "Margherita Pizza", PIZZA, DOMINOS, 199.0, 4.1, 820, true, KOTHRUD),
        item("302", "Chicken Dominator Pizza", PIZZA, DOMINOS, 549.0, 4.0, 450, false, KOTHRUD),
        item("401", "Gulab Jamun", SWEETS, SHREE, 80.0, 4.7, 660, true, KOTHRUD),
        item("402", "Rasgulla", SWEETS, SHREE, 90.0, 4.5, 380, true, KOTHRUD),
        item("403", "Kaju Katli", SWEETS, SHREE, 1200.0, 4.8, 210, true, KOTHRUD),
        item("501", "Chicken Dum Biryani", BIRYANI, HYDERABAD, 380.0, 4.3, 720, false, HINJEWADI),
        item("502", "Egg Biryani", BIRYANI, HYDERABAD, 260.0, 3.9, 260, false, HINJEWADI),
        item("601", "Masala Dosa", SOUTH, UDUPI, 110.0, 4.4, 900, true, FC_ROAD),
        item("602", "Idli Sambar", SOUTH, UDUPI, 70.0, 4.1, 500, true, FC_ROAD),
        item("603", "Filter Coffee", BEVERAGES, UDUPI, 40.0, 4.6, 990, true, FC_ROAD),
        item("604", "Medu Vada", SOUTH, UDUPI, 65.0, 3.8, 150, true, FC_ROAD),
    ];
    if let Some(coffee) = out.iter_mut().find(|i| i.id == "603") {
        coffee.in_stock = false;
    }
    out
}

/// [`sample_catalog`] in a [`MemoryIndex`] with 384-dim vectors.
pub fn sample_index() -> MemoryIndex {
    let index = MemoryIndex::new("items").with_embedder(Arc::new(HashingEmbedder::new(384)));
    index.add_items(sample_catalog());
    index
}

// ============================================================================
// SCRIPTED COLLABORATORS
// ============================================================================

/// How a scripted call behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Behavior {
    #[default]
    Ok,
    /// Immediate upstream error.
    Fail,
    /// Succeed after sleeping.
    Delay(Duration),
    /// Never resolve.
    Hang,
}

impl Behavior {
    async fn perform(self, backend: Backend) -> Result<()> {
        match self {
            Behavior::Ok => Ok(()),
            Behavior::Fail => Err(KhojError::upstream(backend, "scripted failure")),
            Behavior::Delay(d) => {
                tokio::time::sleep(d).await;
                Ok(())
            }
            Behavior::Hang => std::future::pending().await,
        }
    }
}

/// Started/finished counters for one scripted call site.
#[derive(Debug, Default)]
pub struct CallLog {
    started: AtomicUsize,
    finished: AtomicUsize,
}

impl CallLog {
    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    /// Calls that ran to completion; a cancelled or timed-out call never gets here.
    pub fn finished(&self) -> usize {
        self.finished.load(Ordering::SeqCst)
    }

    async fn track<T, F>(&self, behavior: Behavior, backend: Backend, call: F) -> Result<T>
    where
        F: std::future::Future<Output = Result<T>>,
    {
        self.started.fetch_add(1, Ordering::SeqCst);
        behavior.perform(backend).await?;
        let out = call.await;
        self.finished.fetch_add(1, Ordering::SeqCst);
        out
    }
}

/// A [`MemoryIndex`] with per-branch scripted behaviour.
pub struct ScriptedIndex {
    inner: MemoryIndex,
    lexical: Mutex<Behavior>,
    vector: Mutex<Behavior>,
    hybrid: Mutex<Behavior>,
    pub lexical_calls: CallLog,
    pub vector_calls: CallLog,
    pub hybrid_calls: CallLog,
}

impl ScriptedIndex {
    pub fn new(inner: MemoryIndex) -> Self {
        Self {
            inner,
            lexical: Mutex::new(Behavior::Ok),
            vector: Mutex::new(Behavior::Ok),
            hybrid: Mutex::new(Behavior::Ok),
            lexical_calls: CallLog::default(),
            vector_calls: CallLog::default(),
            hybrid_calls: CallLog::default(),
        }
    }

    pub fn lexical(self, behavior: Behavior) -> Self {
        *self.lexical.lock() = behavior;
        self
    }

    pub fn vector(self, behavior: Behavior) -> Self {
        *self.vector.lock() = behavior;
        self
    }

    pub fn hybrid(self, behavior: Behavior) -> Self {
        *self.hybrid.lock() = behavior;
        self
    }

    /// Fail every branch, the way an unreachable cluster would.
    pub fn down(self) -> Self {
        self.lexical(Behavior::Fail)
            .vector(Behavior::Fail)
            .hybrid(Behavior::Fail)
    }
}

#[async_trait]
impl DocumentIndex for ScriptedIndex {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn lexical_search(&self, query: &LexicalQuery) -> Result<IndexResponse> {
        let behavior = *self.lexical.lock();
        self.lexical_calls
            .track(behavior, Backend::LexicalIndex, self.inner.lexical_search(query))
            .await
    }

    async fn vector_search(&self, query: &VectorQuery) -> Result<IndexResponse> {
        let behavior = *self.vector.lock();
        self.vector_calls
            .track(behavior, Backend::VectorIndex, self.inner.vector_search(query))
            .await
    }

    fn supports_native_hybrid(&self) -> bool {
        self.inner.supports_native_hybrid()
    }

    async fn hybrid_search(&self, query: &HybridQuery) -> Result<IndexResponse> {
        let behavior = *self.hybrid.lock();
        self.hybrid_calls
            .track(behavior, Backend::HybridIndex, self.inner.hybrid_search(query))
            .await
    }
}

/// A [`HashingEmbedder`] with scripted behaviour.
#[derive(Debug)]
pub struct ScriptedEmbedder {
    inner: HashingEmbedder,
    behavior: Mutex<Behavior>,
    pub calls: CallLog,
}

impl ScriptedEmbedder {
    pub fn new(dimension: usize, behavior: Behavior) -> Self {
        Self {
            inner: HashingEmbedder::new(dimension),
            behavior: Mutex::new(behavior),
            calls: CallLog::default(),
        }
    }
}

#[async_trait]
impl EmbeddingProvider for ScriptedEmbedder {
    fn model(&self) -> &str {
        self.inner.model()
    }

    fn dimension(&self) -> usize {
        self.inner.dimension()
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let behavior = *self.behavior.lock();
        self.calls
            .track(behavior, Backend::Embedding, self.inner.embed(text))
            .await
    }
}

/// Fixed per-item boosts for every user.
#[derive(Debug, Default)]
pub struct StaticPreferences {
    pub boosts: HashMap<String, f64>,
    pub behavior: Behavior,
    pub calls: CallLog,
}

impl StaticPreferences {
    pub fn new(boosts: &[(&str, f64)]) -> Self {
        Self {
            boosts: boosts.iter().map(|(id, b)| (id.to_string(), *b)).collect(),
            ..Default::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            behavior: Behavior::Fail,
            ..Default::default()
        }
    }
}

#[async_trait]
impl PreferenceStore for StaticPreferences {
    async fn boosts(&self, _user_id: &str, item_ids: &[String]) -> Result<HashMap<String, f64>> {
        let known = async {
            Ok(item_ids
                .iter()
                .filter_map(|id| self.boosts.get(id).map(|b| (id.clone(), *b)))
                .collect())
        };
        self.calls
            .track(self.behavior, Backend::Personalization, known)
            .await
    }
}

/// Legacy search over a fixed item list: any query token in the name matches.
#[derive(Debug, Default)]
pub struct StaticLegacy {
    pub items: Vec<CatalogItem>,
    pub behavior: Behavior,
    pub calls: CallLog,
    pub last_request: Mutex<Option<LegacyRequest>>,
}

impl StaticLegacy {
    pub fn new(items: Vec<CatalogItem>) -> Self {
        Self {
            items,
            ..Default::default()
        }
    }
}

#[async_trait]
impl LegacySearch for StaticLegacy {
    async fn search(&self, request: &LegacyRequest) -> Result<IndexResponse> {
        *self.last_request.lock() = Some(request.clone());
        let tokens: Vec<String> = request
            .query
            .split_whitespace()
            .map(str::to_lowercase)
            .collect();
        let matched: Vec<&CatalogItem> = self
            .items
            .iter()
            .filter(|item| {
                let name = item.name.to_lowercase();
                tokens.iter().any(|t| name.contains(t.as_str()))
                    && request
                        .predicates
                        .iter()
                        .all(|p| crate::memory::matches_predicate(item, p))
            })
            .collect();
        let total = matched.len();
        let skip = request.page.saturating_sub(1) * request.size;
        let hits = matched
            .into_iter()
            .skip(skip)
            .take(request.size)
            .map(|item| Hit {
                id: item.id.clone(),
                index: "legacy".to_string(),
                score: 1.0,
                source: HitSource::Legacy,
                highlights: Vec::new(),
                item: item.clone(),
            })
            .collect();
        let response = async {
            Ok(IndexResponse {
                hits,
                total,
                aggregations: None,
            })
        };
        self.calls.track(self.behavior, Backend::Legacy, response).await
    }
}

/// Every point resolves to the same zone (or none).
#[derive(Debug, Default)]
pub struct StaticZones {
    pub zone: Option<u64>,
    pub behavior: Behavior,
    pub calls: CallLog,
}

impl StaticZones {
    pub fn new(zone: Option<u64>) -> Self {
        Self {
            zone,
            ..Default::default()
        }
    }
}

#[async_trait]
impl ZoneResolver for StaticZones {
    async fn zone_for(&self, _point: GeoPoint) -> Result<Option<u64>> {
        let zone = self.zone;
        self.calls
            .track(self.behavior, Backend::ZoneResolver, async move { Ok(zone) })
            .await
    }
}

/// Keeps every event it is given. Can be told to fail.
#[derive(Debug, Default)]
pub struct RecordingAnalytics {
    events: Mutex<Vec<AnalyticsEvent>>,
    pub behavior: Behavior,
}

impl RecordingAnalytics {
    pub fn failing() -> Self {
        Self {
            behavior: Behavior::Fail,
            ..Default::default()
        }
    }

    pub fn events(&self) -> Vec<AnalyticsEvent> {
        self.events.lock().clone()
    }
}

#[async_trait]
impl AnalyticsSink for RecordingAnalytics {
    async fn record(&self, event: AnalyticsEvent) -> Result<()> {
        self.behavior.perform(Backend::Analytics).await?;
        self.events.lock().push(event);
        Ok(())
    }
}
