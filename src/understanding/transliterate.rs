// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Devanagari → Latin transliteration.
//!
//! Two layers. A lexicon of food words with the spelling people actually type
//! ("चिकन" → "chicken"), checked first. Then a character map that follows
//! the abugida rules: a bare consonant carries an implicit "a", a vowel sign
//! (matra) replaces it, a virama kills it. Nukta forms ("ज़" = "z") are looked
//! up as a pair before falling back to the base consonant.
//!
//! The character map is deliberately naive. It has no schwa deletion, so
//! "चिकन" without the lexicon becomes "chikana". The spell corrector and
//! synonym store downstream absorb most of that noise, and the lexicon
//! covers the words that matter most.
//!
//! Input with no code point in U+0900–U+097F comes back byte-for-byte
//! unchanged. That's what makes transliteration idempotent on Latin text.

use std::collections::HashMap;

use tracing::debug;

use super::vocabulary::FOOD_LEXICON;

const VIRAMA: char = '\u{094D}';
const NUKTA: char = '\u{093C}';

/// Converts Devanagari-script text to a Latin approximation.
#[derive(Debug, Clone)]
pub struct TransliterationEngine {
    lexicon: HashMap<String, String>,
}

impl Default for TransliterationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TransliterationEngine {
    /// Engine seeded with the built-in food lexicon.
    pub fn new() -> Self {
        let lexicon = FOOD_LEXICON
            .iter()
            .map(|(deva, latin)| ((*deva).to_string(), (*latin).to_string()))
            .collect();
        Self { lexicon }
    }

    /// Engine with no lexicon: every word goes through the character map.
    pub fn without_lexicon() -> Self {
        Self {
            lexicon: HashMap::new(),
        }
    }

    /// Add or replace a lexicon entry.
    pub fn add_lexicon_entry(&mut self, devanagari: &str, latin: &str) {
        self.lexicon
            .insert(devanagari.trim().to_string(), latin.trim().to_string());
    }

    /// Does the text contain any Devanagari code point?
    pub fn contains_devanagari(text: &str) -> bool {
        text.chars().any(is_devanagari)
    }

    /// Transliterate `text`. Identity on text without Devanagari.
    ///
    /// Words are split on whitespace and rejoined with single spaces. The
    /// whole phrase is tried against the lexicon before any splitting, so
    /// multi-word entries ("वडा पाव") win over their parts.
    pub fn transliterate(&self, text: &str) -> String {
        if !Self::contains_devanagari(text) {
            return text.to_string();
        }

        let phrase = text.split_whitespace().collect::<Vec<_>>().join(" ");
        if let Some(latin) = self.lexicon.get(&phrase) {
            return latin.clone();
        }

        phrase
            .split(' ')
            .map(|word| self.transliterate_word(word))
            .filter(|word| !word.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn transliterate_word(&self, word: &str) -> String {
        if let Some(latin) = self.lexicon.get(word) {
            return latin.clone();
        }
        if !word.chars().any(is_devanagari) {
            return word.to_string();
        }

        let mut out = String::with_capacity(word.len());
        let mut chars = word.chars().peekable();

        while let Some(c) = chars.next() {
            // Consonant (possibly followed by a combining nukta)
            let base = if chars.peek() == Some(&NUKTA) {
                // Unknown pairs drop the nukta and keep the base letter
                chars.next();
                nukta_consonant(c).or_else(|| consonant(c))
            } else {
                consonant(c).or_else(|| precomposed_nukta(c))
            };

            if let Some(latin) = base {
                out.push_str(latin);
                match chars.peek() {
                    Some(&VIRAMA) => {
                        chars.next();
                    }
                    Some(&next) if vowel_sign(next).is_some() => {}
                    _ => out.push('a'),
                }
                continue;
            }

            if let Some(latin) = vowel_sign(c).or_else(|| independent_vowel(c)).or_else(|| sign(c)) {
                out.push_str(latin);
            } else if c == VIRAMA || c == NUKTA {
                // Stray combining mark with no consonant before it
            } else if let Some(digit) = devanagari_digit(c) {
                out.push(digit);
            } else if is_devanagari(c) {
                debug!(code_point = %format!("U+{:04X}", c as u32), word, "dropping unmapped devanagari code point");
            } else {
                out.push(c);
            }
        }

        out
    }
}

#[inline]
fn is_devanagari(c: char) -> bool {
    ('\u{0900}'..='\u{097F}').contains(&c)
}

fn consonant(c: char) -> Option<&'static str> {
    Some(match c {
        'क' => "k",
        'ख' => "kh",
        'ग' => "g",
        'घ' => "gh",
        'ङ' => "n",
        'च' => "ch",
        'छ' => "chh",
        'ज' => "j",
        'झ' => "jh",
        'ञ' => "n",
        'ट' => "t",
        'ठ' => "th",
        'ड' => "d",
        'ढ' => "dh",
        'ण' => "n",
        'त' => "t",
        'थ' => "th",
        'द' => "d",
        'ध' => "dh",
        'न' => "n",
        'प' => "p",
        'फ' => "ph",
        'ब' => "b",
        'भ' => "bh",
        'म' => "m",
        'य' => "y",
        'र' => "r",
        'ल' => "l",
        'ळ' => "l",
        'व' => "v",
        'श' => "sh",
        'ष' => "sh",
        'स' => "s",
        'ह' => "h",
        _ => return None,
    })
}

/// Consonant + U+093C written as two code points.
fn nukta_consonant(c: char) -> Option<&'static str> {
    Some(match c {
        'क' => "q",
        'ख' => "kh",
        'ग' => "g",
        'ज' => "z",
        'ड' => "r",
        'ढ' => "rh",
        'फ' => "f",
        'य' => "y",
        _ => return None,
    })
}

/// The precomposed nukta letters U+0958–U+095F.
fn precomposed_nukta(c: char) -> Option<&'static str> {
    Some(match c {
        '\u{0958}' => "q",
        '\u{0959}' => "kh",
        '\u{095A}' => "g",
        '\u{095B}' => "z",
        '\u{095C}' => "r",
        '\u{095D}' => "rh",
        '\u{095E}' => "f",
        '\u{095F}' => "y",
        _ => return None,
    })
}

fn vowel_sign(c: char) -> Option<&'static str> {
    Some(match c {
        'ा' => "aa",
        'ि' => "i",
        'ी' => "ee",
        'ु' => "u",
        'ू' => "oo",
        'ृ' => "ri",
        'ॅ' => "e",
        'े' => "e",
        'ै' => "ai",
        'ॉ' => "o",
        'ो' => "o",
        'ौ' => "au",
        _ => return None,
    })
}

fn independent_vowel(c: char) -> Option<&'static str> {
    Some(match c {
        'अ' => "a",
        'आ' => "aa",
        'इ' => "i",
        'ई' => "ee",
        'उ' => "u",
        'ऊ' => "oo",
        'ऋ' => "ri",
        'ए' => "e",
        'ऐ' => "ai",
        'ऑ' => "o",
        'ओ' => "o",
        'औ' => "au",
        _ => return None,
    })
}

fn sign(c: char) -> Option<&'static str> {
    Some(match c {
        'ं' | 'ँ' => "n",
        'ः' => "h",
        '।' | '॥' => "",
        _ => return None,
    })
}

fn devanagari_digit(c: char) -> Option<char> {
    let value = (c as u32).checked_sub('०' as u32)?;
    if value <= 9 {
        char::from_digit(value, 10)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latin_text_is_returned_unchanged() {
        let engine = TransliterationEngine::new();
        assert_eq!(engine.transliterate("Chicken  Biryani "), "Chicken  Biryani ");
        assert_eq!(engine.transliterate(""), "");
    }

    #[test]
    fn lexicon_wins_over_character_map() {
        let engine = TransliterationEngine::new();
        assert_eq!(engine.transliterate("चिकन बिरयानी"), "chicken biryani");
    }

    #[test]
    fn multi_word_lexicon_phrase() {
        let engine = TransliterationEngine::new();
        assert_eq!(engine.transliterate("वडा  पाव"), "vada pav");
    }

    #[test]
    fn bare_consonants_carry_implicit_a() {
        let engine = TransliterationEngine::without_lexicon();
        assert_eq!(engine.transliterate("चिकन"), "chikana");
        assert_eq!(engine.transliterate("कमल"), "kamala");
    }

    #[test]
    fn matra_replaces_implicit_vowel() {
        let engine = TransliterationEngine::without_lexicon();
        assert_eq!(engine.transliterate("से"), "se");
        assert_eq!(engine.transliterate("दूध"), "doodha");
    }

    #[test]
    fn virama_suppresses_implicit_vowel() {
        let engine = TransliterationEngine::without_lexicon();
        // क्या = k + virama + y + aa
        assert_eq!(engine.transliterate("क्या"), "kyaa");
    }

    #[test]
    fn nukta_pair_checked_before_base_consonant() {
        let engine = TransliterationEngine::without_lexicon();
        // ज + ़ = z, precomposed ज़ (U+095B) = z
        assert_eq!(engine.transliterate("ज\u{093C}रा"), "zaraa");
        assert_eq!(engine.transliterate("\u{095B}रा"), "zaraa");
        // Nukta on a consonant with no nukta form keeps the base
        assert_eq!(engine.transliterate("म\u{093C}"), "ma");
    }

    #[test]
    fn unmapped_code_points_are_dropped() {
        let engine = TransliterationEngine::without_lexicon();
        // U+0900 (inverted candrabindu) has no mapping
        assert_eq!(engine.transliterate("क\u{0900}"), "ka");
    }

    #[test]
    fn mixed_script_keeps_latin_words() {
        let engine = TransliterationEngine::new();
        assert_eq!(engine.transliterate("पनीर pizza"), "paneer pizza");
    }

    #[test]
    fn devanagari_digits_become_ascii() {
        let engine = TransliterationEngine::without_lexicon();
        assert_eq!(engine.transliterate("२००"), "200");
    }
}
