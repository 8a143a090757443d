// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Transport-agnostic request surface.
//!
//! | Operation                             | Strategy            | Zone     |
//! |---------------------------------------|---------------------|----------|
//! | [`SearchService::hybrid_search`]      | hybrid, always      | no       |
//! | [`SearchService::search_items`]       | experiment variant  | required |
//! | [`SearchService::understand`]         | none (no retrieval) | no       |
//! | [`SearchService::conversational`]     | experiment variant  | no       |
//! | [`SearchService::record_event`]       | none                | no       |
//!
//! Without a `user_id` there's nothing to bucket, and the strategy is hybrid.

mod params;
mod response;
mod search;

pub use params::{ConversationalParams, HybridSearchParams, ItemSearchParams, DEFAULT_RADIUS_KM};
pub use response::{
    ConversationContext, ConversationalResponse, ResultSource, SearchMeta, SearchResponse,
    StoreSummary,
};
pub use search::{SearchService, SearchServiceBuilder};
