// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Query understanding: what did the user actually mean?
//!
//! | Stage           | Type                        | Shared state             |
//! |-----------------|-----------------------------|--------------------------|
//! | Transliteration | [`TransliterationEngine`]   | none (immutable lexicon) |
//! | Spelling        | [`SpellCorrector`]          | [`Dictionary`]           |
//! | Synonyms        | [`SynonymStore`]            | itself                   |
//! | Intent          | [`IntentClassifier`]        | none (rule table)        |
//! | All of the above| [`QueryUnderstandingPipeline`] |                       |
//!
//! The shared stores are constructed explicitly and handed in. Nothing here is
//! a process-wide singleton, so two pipelines in one test never see each
//! other's learning.

pub mod entities;
pub mod intent;
pub mod pipeline;
pub mod spell;
pub mod synonyms;
pub mod transliterate;
pub mod vocabulary;

pub use entities::{Dietary, Entities, Entity, PriceBound, RecommendedFilters, TimeHint};
pub use intent::{Classification, Intent, IntentClassifier, QueryFeatures, Rule, DEFAULT_RULES};
pub use pipeline::{ParsedQuery, QueryUnderstandingPipeline};
pub use spell::{correction_confidence, CorrectedText, Correction, Dictionary, SpellCorrector};
pub use synonyms::SynonymStore;
pub use transliterate::TransliterationEngine;
