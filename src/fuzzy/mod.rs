// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Fuzzy matching: typo tolerance via edit distance.
//!
//! Spell correction turns the distance into a confidence score, the
//! in-memory lexical index turns it into a fuzzy tier. Both go through
//! `bounded_distance` so they can't drift apart on what "one edit" means.

mod levenshtein;

pub use levenshtein::*;
