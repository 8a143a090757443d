// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Fuzz target for store/item disambiguation.
//!
//! The parser learns arbitrary store names, then splits arbitrary queries.
//! It must never panic, and what it returns must be consistent with the
//! kind it claims.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use khoj::{QueryIntentParser, TargetKind};

#[derive(Debug, Arbitrary)]
struct Input {
    stores: Vec<String>,
    query: String,
}

fuzz_target!(|input: Input| {
    let parser = QueryIntentParser::new();
    let stores: Vec<&str> = input.stores.iter().take(16).map(String::as_str).collect();
    parser.learn_store_names(&stores);

    let query: String = input.query.chars().take(200).collect();
    let target = parser.parse(&query);

    assert_eq!(target.raw, query);
    match target.kind {
        TargetKind::SpecificItemSpecificStore => {
            assert!(target.item_query.is_some(), "item missing: {target:?}");
            assert!(target.store_query.is_some(), "store missing: {target:?}");
        }
        TargetKind::StoreFirst => {
            assert!(target.item_query.is_none(), "{target:?}");
            assert!(!target.signals.is_empty(), "no signal for {target:?}");
        }
        TargetKind::Generic => assert!(target.store_query.is_none(), "{target:?}"),
    }
});
