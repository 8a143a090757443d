//! Entities are a closed union; consumers match on them instead of probing keys.

use khoj::understanding::{Dietary, Entity, Intent, PriceBound};
use khoj::{QueryUnderstandingPipeline, SortOrder};

#[test]
fn dietary_and_budget_become_recommended_filters() {
    let parsed = QueryUnderstandingPipeline::default().process("veg biryani under 300");
    assert_eq!(parsed.entities.dietary(), Some(Dietary::Veg));
    assert_eq!(parsed.entities.budget(), Some(PriceBound::Under(300.0)));

    let filters = &parsed.recommended_filters;
    assert_eq!(filters.veg, Some(true));
    assert_eq!(filters.price_max, Some(300.0));
    assert_eq!(filters.price_min, None);
}

#[test]
fn sort_cues_are_recommended() {
    let parsed = QueryUnderstandingPipeline::default().process("cheapest pizza");
    assert_eq!(parsed.recommended_filters.sort, Some(SortOrder::PriceAsc));
}

#[test]
fn every_kind_is_matched_exhaustively() {
    let parsed =
        QueryUnderstandingPipeline::default().process("pizza hut party combo for 4 people");
    let mut restaurant = None;
    let mut occasion = None;
    let mut quantity = None;
    for entity in parsed.entities.iter() {
        match entity {
            Entity::Restaurant(name) => restaurant = Some(name.clone()),
            Entity::Occasion(o) => occasion = Some(o.clone()),
            Entity::Quantity(n) => quantity = Some(*n),
            Entity::Cuisine(_)
            | Entity::Dietary(_)
            | Entity::Budget(_)
            | Entity::Time(_)
            | Entity::Brand(_)
            | Entity::Location(_)
            | Entity::Category(_)
            | Entity::Unrecognized { .. } => {}
        }
    }
    assert_eq!(restaurant.as_deref(), Some("pizza hut"));
    assert_eq!(occasion.as_deref(), Some("party"));
    assert_eq!(quantity, Some(4));
}

#[test]
fn entities_serialize_as_tagged_values() {
    let parsed = QueryUnderstandingPipeline::default().process("veg biryani under 300");
    let json = serde_json::to_value(&parsed.entities).expect("serializes");
    let list = json.as_array().expect("entities are a list");
    assert!(list
        .iter()
        .any(|e| e["kind"] == "dietary" && e["value"] == "veg"));
    assert!(list.iter().any(|e| e["kind"] == "budget"));
}

#[test]
fn entities_do_not_depend_on_intent() {
    // Store intent wins here, the dietary entity is still extracted
    let parsed = QueryUnderstandingPipeline::default().process("kfc dominos veg");
    assert_eq!(parsed.intent, Intent::StoreSearch);
    assert_eq!(parsed.entities.dietary(), Some(Dietary::Veg));
}
