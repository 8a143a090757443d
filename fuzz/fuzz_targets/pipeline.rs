// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Fuzz target for the query understanding pipeline.
//!
//! Arbitrary UTF-8 goes through transliteration, spelling, synonyms and
//! intent. Devanagari fragments, lone matras, nuktas without a base, emoji,
//! RTL text: none of it may panic, and the output must stay well formed.

#![no_main]

use libfuzzer_sys::fuzz_target;
use khoj::understanding::TransliterationEngine;
use khoj::QueryUnderstandingPipeline;

/// Longest query the service would accept.
const MAX_CHARS: usize = 200;

fuzz_target!(|data: &[u8]| {
    static PIPELINE: std::sync::OnceLock<QueryUnderstandingPipeline> = std::sync::OnceLock::new();
    let pipeline = PIPELINE.get_or_init(QueryUnderstandingPipeline::default);

    let text = String::from_utf8_lossy(data);
    let query: String = text.chars().take(MAX_CHARS).collect();

    let parsed = pipeline.process(&query);

    // Nothing Devanagari survives transliteration
    assert!(
        !TransliterationEngine::contains_devanagari(&parsed.corrected),
        "Devanagari left in {:?}",
        parsed.corrected
    );

    // Expansion never drops a normalized token
    let expanded: Vec<&str> = parsed.expanded.split_whitespace().collect();
    for token in parsed.normalized.split_whitespace() {
        assert!(expanded.contains(&token), "{token:?} missing from {:?}", parsed.expanded);
    }

    // Applied corrections are single edits
    for c in parsed.corrections.iter().filter(|c| c.applied) {
        assert_eq!(c.distance, 1);
    }

    assert!((0.0..=1.0).contains(&parsed.confidence));
    if let (Some(lo), Some(hi)) = (
        parsed.recommended_filters.price_min,
        parsed.recommended_filters.price_max,
    ) {
        assert!(lo <= hi, "inverted recommended range {lo}..{hi}");
    }
});
