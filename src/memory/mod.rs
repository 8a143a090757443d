// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! In-process backends: a catalog index and a hashing embedder.
//!
//! They implement the same traits a deployment wires HTTP clients into, so
//! the CLI, the benches and the tests run the real orchestrator without a
//! network.

mod embedder;
mod index;

pub use embedder::{cosine, HashingEmbedder};
pub use index::{
    embedding_text, matches_predicate, MemoryIndex, EXACT_SCORE, FUZZY_D1_SCORE, FUZZY_D2_SCORE,
    PREFIX_SCORE,
};
