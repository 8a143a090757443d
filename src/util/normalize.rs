// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Text normalization for Latin-script queries.
//!
//! Runs *after* transliteration, so by the time text gets here it is Latin (or
//! some other script we leave alone). Devanagari vowel signs are combining marks
//! too, which is exactly why we only strip the Latin diacritic blocks: eating
//! matras would turn "बिरयानी" into consonant soup if a caller ever skipped
//! the transliterator.

#[cfg(feature = "unicode-normalization")]
use unicode_normalization::UnicodeNormalization;

/// Normalize a string for matching: strip Latin diacritics, lowercase, collapse whitespace.
///
/// - "Café  Coffee Day" → "cafe coffee day"
/// - "  PANEER " → "paneer"
#[cfg(feature = "unicode-normalization")]
pub fn normalize(value: &str) -> String {
    value
        .nfd()
        .filter(|c| !is_latin_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Lightweight normalization without the unicode tables.
/// Just lowercases and collapses whitespace.
#[cfg(not(feature = "unicode-normalization"))]
pub fn normalize(value: &str) -> String {
    value
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(feature = "unicode-normalization")]
fn is_latin_combining_mark(c: char) -> bool {
    matches!(c,
        '\u{0300}'..='\u{036F}' |  // Combining Diacritical Marks
        '\u{1DC0}'..='\u{1DFF}' |  // Combining Diacritical Marks Supplement
        '\u{20D0}'..='\u{20FF}' |  // Combining Diacritical Marks for Symbols
        '\u{FE20}'..='\u{FE2F}'    // Combining Half Marks
    )
}

/// Split normalized text into tokens, trimming punctuation at token edges.
///
/// Inner punctuation survives ("domino's", "7-up"); edge punctuation does not
/// ("pizza?" → "pizza", "(veg)" → "veg"). Tokens that are pure punctuation vanish.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// [`normalize`] then [`tokenize`].
pub fn normalized_tokens(text: &str) -> Vec<String> {
    tokenize(&normalize(text))
}
