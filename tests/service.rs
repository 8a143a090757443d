//! The search service end to end, over the in-memory index.

mod common;

#[path = "service/items.rs"]
mod items;

#[path = "service/fallback.rs"]
mod fallback;

#[path = "service/experiments.rs"]
mod experiments;
