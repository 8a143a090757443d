//! The canonical queries: Devanagari, typos, Hinglish synonyms, item-from-store
//! and bare chain names.

use khoj::understanding::{Intent, SynonymStore, TransliterationEngine};
use khoj::{KhojError, QueryIntentParser, QueryUnderstandingPipeline, TargetKind};

use super::common::service;

// ============================================================================
// TRANSLITERATION
// ============================================================================

#[test]
fn devanagari_dish_goes_through_the_lexicon() {
    let engine = TransliterationEngine::new();
    assert_eq!(engine.transliterate("चिकन बिरयानी"), "chicken biryani");

    // Character by character would keep the implicit vowels
    let naive = TransliterationEngine::without_lexicon().transliterate("चिकन बिरयानी");
    assert_ne!(naive, "chicken biryani");
}

#[test]
fn transliteration_happens_before_correction() {
    let parsed = QueryUnderstandingPipeline::default().process("चिकन बिरयानी");
    assert_eq!(parsed.transliterated.as_deref(), Some("chicken biryani"));
    assert_eq!(parsed.corrected, "chicken biryani");
    assert!(parsed.corrections.is_empty(), "lexicon output needs no correction");
}

// ============================================================================
// SPELLING
// ============================================================================

#[test]
fn typos_are_auto_corrected_one_edit_each() {
    let pipeline = QueryUnderstandingPipeline::default();
    let parsed = pipeline.process("chiken biriani");
    assert_eq!(parsed.corrected, "chicken biryani");
    assert_eq!(parsed.corrections.len(), 2);
    for c in &parsed.corrections {
        assert!(c.applied, "{c:?}");
        assert_eq!(c.distance, 1);
        assert!(c.confidence > 0.7);
    }
}

#[test]
fn auto_correct_is_plain_text_in_plain_text_out() {
    let pipeline = QueryUnderstandingPipeline::default();
    assert_eq!(pipeline.speller().auto_correct("chiken biriani"), "chicken biryani");
    assert_eq!(pipeline.speller().auto_correct("masala dosa"), "masala dosa");
}

#[test]
fn pipelines_do_not_share_dictionaries() {
    let a = QueryUnderstandingPipeline::default();
    let b = QueryUnderstandingPipeline::default();
    a.dictionary().add_word("thepla", 500);
    assert!(a.dictionary().contains("thepla"));
    assert!(!b.dictionary().contains("thepla"));
}

// ============================================================================
// SYNONYMS
// ============================================================================

#[test]
fn hinglish_synonyms_normalize_and_keep_originals() {
    let parsed = QueryUnderstandingPipeline::default().process("murgi curry");
    assert_eq!(parsed.normalized, "chicken gravy");

    let expanded: Vec<&str> = parsed.expanded.split_whitespace().collect();
    for token in ["murgi", "curry", "chicken", "gravy"] {
        assert!(expanded.contains(&token), "{token} missing from {expanded:?}");
    }
}

#[test]
fn same_group_normalizes_the_same() {
    let store = SynonymStore::seeded();
    assert_eq!(store.normalize_query("murgi"), store.normalize_query("chicken"));
    assert_eq!(store.normalize_query("curry"), store.normalize_query("gravy"));
}

// ============================================================================
// TARGETING
// ============================================================================

#[test]
fn item_from_named_store() {
    let target = QueryIntentParser::new().parse("butter chicken from Inayat Cafe");
    assert_eq!(target.kind, TargetKind::SpecificItemSpecificStore);
    assert_eq!(target.item_query.as_deref(), Some("butter chicken"));
    assert_eq!(target.store_query.as_deref(), Some("Inayat Cafe"));
}

#[test]
fn bare_chain_acronym_is_a_brand_search() {
    let target = QueryIntentParser::new().parse("KFC");
    assert_eq!(target.kind, TargetKind::StoreFirst);
    assert!(target.is_brand_search);
    assert_eq!(target.raw, "KFC");
}

#[test]
fn target_kind_serializes_snake_case() {
    let target = QueryIntentParser::new().parse("butter chicken from Inayat Cafe");
    let json = serde_json::to_value(&target).expect("serializes");
    assert_eq!(json["kind"], "specific_item_specific_store");
}

// ============================================================================
// THROUGH THE SERVICE
// ============================================================================

#[test]
fn understand_validates_before_processing() {
    let service = service();
    assert!(matches!(service.understand("   "), Err(KhojError::EmptyQuery)));

    let long = "a".repeat(service.config().query.max_len + 1);
    assert!(matches!(
        service.understand(&long),
        Err(KhojError::QueryTooLong { .. })
    ));

    let parsed = service.understand("  sweets ").expect("valid query");
    assert_eq!(parsed.intent, Intent::CategoryBrowse);
    assert_eq!(parsed.original, "sweets");
}
