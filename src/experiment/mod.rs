// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! A/B experiment assignment by consistent hashing.
//!
//! A user's variant is *derived*, never stored:
//!
//! ```text
//! h      = java_hash("{user_id}_{experiment}")     (31-polynomial over UTF-16, i32 wrapping)
//! bucket = |h| mod 100
//! variant = first v where bucket < Σ weights up to v
//! ```
//!
//! Same inputs, same variant, on every process, forever. Changing an
//! experiment's weights does reshuffle users; that's the admin's call.
//!
//! Unknown and inactive experiments answer `"control"`.

mod registry;

pub use registry::{Experiment, ExperimentRegistry, Variant, CONTROL, SEARCH_ALGORITHM};

/// Java's `String.hashCode`: `h = 31·h + unit` over UTF-16 code units, wrapping
/// at 32 bits. Kept bit-for-bit so assignments match other services that
/// bucket the same users.
pub fn string_hash(s: &str) -> i32 {
    s.encode_utf16()
        .fold(0i32, |h, unit| h.wrapping_mul(31).wrapping_add(i32::from(unit)))
}

/// `|hash| mod 100`, computed in i64 so `i32::MIN` doesn't overflow.
pub fn bucket(user_id: &str, experiment: &str) -> u8 {
    let h = i64::from(string_hash(&format!("{user_id}_{experiment}")));
    (h.abs() % 100) as u8
}
