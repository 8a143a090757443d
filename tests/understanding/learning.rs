//! Vocabulary learned from the catalog, search logs and admin calls.

use khoj::understanding::SynonymStore;
use khoj::{KhojError, QueryUnderstandingPipeline, TargetKind};

use super::common::{sample_catalog, service};

#[test]
fn catalog_words_join_the_dictionary() {
    let pipeline = QueryUnderstandingPipeline::default();
    assert!(!pipeline.dictionary().contains("dominator"));

    let names: Vec<String> = sample_catalog().into_iter().map(|i| i.name).collect();
    pipeline.dictionary().learn_from_product_names(&names);
    assert_eq!(pipeline.dictionary().frequency("dominator"), Some(1));
    // Learning adds, it never resets
    pipeline.dictionary().learn_from_product_names(&names);
    assert_eq!(pipeline.dictionary().frequency("dominator"), Some(2));
}

#[test]
fn rare_catalog_word_is_suggested_until_searches_make_it_common() {
    let pipeline = QueryUnderstandingPipeline::default();
    pipeline
        .dictionary()
        .learn_from_product_names(&["Chicken Dominator Pizza".to_string()]);

    let parsed = pipeline.process("dominater");
    assert_eq!(parsed.corrected, "dominater", "frequency 1 is not enough to auto-apply");
    assert_eq!(parsed.corrections.first().map(|c| c.suggestion.as_str()), Some("dominator"));
    assert!(parsed.suggestions.iter().any(|s| s == "dominator"));

    pipeline
        .dictionary()
        .learn_from_search_logs(&[("dominator pizza".to_string(), 50)]);
    let parsed = pipeline.process("dominater");
    assert_eq!(parsed.corrected, "dominator");
}

#[test]
fn short_words_are_never_learned() {
    let pipeline = QueryUnderstandingPipeline::default();
    assert!(!pipeline.dictionary().add_word("dl", 100));
    assert!(!pipeline.dictionary().contains("dl"));
}

#[test]
fn service_learns_store_names_from_its_catalog() {
    let fresh = khoj::QueryIntentParser::new();
    assert_eq!(fresh.parse("inayat").kind, TargetKind::Generic);

    let service = service();
    let target = service.parser().parse("inayat");
    assert_eq!(target.kind, TargetKind::StoreFirst);
    assert!(target.is_brand_search);
    // "Cafe" is a store keyword, not a name
    assert!(!service.parser().is_brand("cafe"));
}

#[test]
fn synonym_groups_extend_but_never_steal() {
    let store = SynonymStore::seeded();
    store
        .add_synonym_group("chicken", &["kozhi"])
        .expect("new form joins its group");
    assert_eq!(store.normalize_query("kozhi"), "chicken");

    let err = store
        .add_synonym_group("mutton", &["kheema", "murgi"])
        .expect_err("murgi already belongs to chicken");
    assert!(matches!(err, KhojError::SynonymConflict { .. }));
    // Nothing from the rejected call was applied
    assert_eq!(store.canonical_of("kheema"), None);
    assert_eq!(store.normalize_query("murgi"), "chicken");
}
