//! Item search, module hybrid search and the conversational endpoint.

use std::collections::HashSet;
use std::sync::Arc;

use khoj::{
    ConversationalParams, HybridSearchParams, ItemSearchParams, KhojConfig, KhojError,
    SearchService, SearchType, TargetKind,
};

use super::common::{
    ids, index_of, sample_index, sample_item, scripted, service, service_over, StaticZones, ZONE,
};

fn items(q: &str) -> ItemSearchParams {
    ItemSearchParams::new(q).zone(ZONE)
}

#[tokio::test]
async fn lexical_matches_lead_the_page() {
    let response = service().search_items(&items("biryani")).await.expect("served");

    let top: HashSet<&str> = ids(&response.items).into_iter().take(5).collect();
    assert_eq!(top, HashSet::from(["101", "102", "103", "501", "502"]));
    assert_eq!(response.meta.search_type, SearchType::Hybrid);
    assert!(response.meta.variant.is_none(), "no user, no experiment");
    assert!(!response.meta.degraded);
}

#[tokio::test]
async fn dietary_words_become_filters() {
    let response = service()
        .search_items(&items("veg biryani"))
        .await
        .expect("served");

    assert!(!response.is_empty());
    assert!(response.items.iter().all(|h| h.item.veg));
    assert_eq!(response.items[0].id, "103");
}

#[tokio::test]
async fn explicit_filter_beats_the_query() {
    let params = ItemSearchParams {
        veg: Some(false),
        ..items("veg biryani")
    };
    let response = service().search_items(&params).await.expect("served");
    assert!(response.items.iter().all(|h| !h.item.veg));
}

#[tokio::test]
async fn item_from_store_is_narrowed_to_that_store() {
    let svc = service();
    let target = svc.parser().parse("butter chicken from Inayat Cafe");
    assert_eq!(target.kind, TargetKind::SpecificItemSpecificStore);

    let response = svc
        .search_items(&items("butter chicken from Inayat Cafe"))
        .await
        .expect("served");
    assert!(!response.is_empty());
    assert!(response.items.iter().all(|h| h.item.store_id == 12));
    assert_eq!(response.items[0].id, "201");
}

#[tokio::test]
async fn unknown_store_widens_to_every_store() {
    let response = service()
        .search_items(&items("dosa from Sagar Restaurant"))
        .await
        .expect("served");
    assert_eq!(response.items.first().map(|h| h.id.as_str()), Some("601"));
}

#[tokio::test]
async fn facets_describe_the_result_set() {
    let response = service().search_items(&items("biryani")).await.expect("served");

    let fields: Vec<&str> = response.facets.iter().map(|f| f.field.as_str()).collect();
    assert!(fields.contains(&"price"));
    assert!(fields.contains(&"category"));
    assert!(fields.contains(&"veg"));

    let category = response
        .facets
        .iter()
        .find(|f| f.field == "category")
        .expect("category facet");
    assert!(category.values.iter().any(|v| v.value == "biryani"));
    assert!(category.values.iter().all(|v| !v.selected));
}

#[tokio::test]
async fn selected_facet_narrows_and_is_marked() {
    let params = ItemSearchParams {
        facets: vec!["veg=1".to_string()],
        ..items("biryani")
    };
    let response = service().search_items(&params).await.expect("served");

    assert!(response.items.iter().all(|h| h.item.veg));
    let veg = response
        .facets
        .iter()
        .find(|f| f.field == "veg")
        .expect("veg facet");
    let selected: Vec<&str> = veg
        .values
        .iter()
        .filter(|v| v.selected)
        .map(|v| v.value.as_str())
        .collect();
    assert_eq!(selected, vec!["1"]);
}

/// Prices on and between the default breakpoints, two categories where one
/// name contains the other.
fn boundary_catalog() -> Vec<khoj::CatalogItem> {
    [
        ("a", 100.0, "Rice", 4.2, 21, true),
        ("b", 150.0, "Fried Rice", 3.5, 21, true),
        ("c", 200.0, "Fried Rice", 4.8, 22, false),
        ("d", 500.0, "Rice", 4.0, 22, true),
        ("e", 1000.0, "Thali", 2.9, 23, true),
        ("f", 1200.0, "Rice", 5.0, 23, false),
    ]
    .into_iter()
    .map(|(id, price, category, rating, store, in_stock)| {
        let mut item = sample_item(id);
        item.name = "Paneer Tikka".to_string();
        item.price = price;
        item.category = category.to_string();
        item.rating = rating;
        item.store_id = store;
        item.store_name = format!("Store {store}");
        item.in_stock = in_stock;
        item
    })
    .collect()
}

#[tokio::test]
async fn every_facet_count_matches_its_selection() {
    let svc = service_over(Arc::new(index_of(boundary_catalog())));
    let params = ItemSearchParams {
        semantic: false,
        size: Some(50),
        ..items("paneer tikka")
    };
    let unfiltered = svc.search_items(&params).await.expect("served");
    assert_eq!(unfiltered.meta.total, 6);

    let mut checked = 0;
    for facet in &unfiltered.facets {
        for value in &facet.values {
            let encoded = format!("{}={}", facet.field, value.value);
            let selected = svc
                .search_items(&ItemSearchParams {
                    facets: vec![encoded.clone()],
                    ..params.clone()
                })
                .await
                .expect("served");
            assert_eq!(selected.meta.total, value.count, "{encoded}");
            checked += 1;
        }
    }
    assert!(checked >= 10);
}

#[tokio::test]
async fn price_bucket_excludes_its_upper_breakpoint() {
    let svc = service_over(Arc::new(index_of(boundary_catalog())));
    let params = ItemSearchParams {
        semantic: false,
        facets: vec!["price=100-200".to_string()],
        ..items("paneer tikka")
    };
    let response = svc.search_items(&params).await.expect("served");
    let mut found = ids(&response.items);
    found.sort_unstable();
    assert_eq!(found, vec!["a", "b"]);
}

#[tokio::test]
async fn category_selection_matches_the_whole_name() {
    let svc = service_over(Arc::new(index_of(boundary_catalog())));
    let params = ItemSearchParams {
        semantic: false,
        facets: vec!["category=rice".to_string()],
        ..items("paneer tikka")
    };
    let response = svc.search_items(&params).await.expect("served");
    assert_eq!(response.meta.total, 3);
    assert!(response.items.iter().all(|h| h.item.category == "Rice"));
}

#[tokio::test]
async fn malformed_facet_is_rejected() {
    let params = ItemSearchParams {
        facets: vec!["colour=red".to_string()],
        ..items("biryani")
    };
    let err = service().search_items(&params).await.expect_err("unknown field");
    assert!(err.is_client_error());
}

#[tokio::test]
async fn zone_is_required() {
    let err = service()
        .search_items(&ItemSearchParams::new("biryani"))
        .await
        .expect_err("no zone");
    assert!(matches!(err, KhojError::MissingZone));
}

#[tokio::test]
async fn coordinates_resolve_the_zone() {
    let zones = Arc::new(StaticZones::new(Some(ZONE)));
    let svc = SearchService::builder(KhojConfig::in_memory(), Arc::new(sample_index()))
        .zones(zones.clone())
        .build()
        .expect("valid config");

    let params = ItemSearchParams {
        lat: Some(18.52),
        lon: Some(73.85),
        ..ItemSearchParams::new("dosa")
    };
    let response = svc.search_items(&params).await.expect("served");
    assert_eq!(zones.calls.started(), 1);
    assert!(!response.is_empty());
}

#[tokio::test]
async fn unresolvable_coordinates_are_a_missing_zone() {
    let index = Arc::new(scripted());
    let svc = SearchService::builder(KhojConfig::in_memory(), index.clone())
        .zones(Arc::new(StaticZones::new(None)))
        .build()
        .expect("valid config");

    let params = ItemSearchParams {
        lat: Some(0.0),
        lon: Some(0.0),
        ..ItemSearchParams::new("dosa")
    };
    let err = svc.search_items(&params).await.expect_err("open ocean");
    assert!(matches!(err, KhojError::MissingZone));
    assert_eq!(index.lexical_calls.started(), 0);
}

#[tokio::test]
async fn pages_do_not_overlap() {
    let svc = service();
    // Lexical only: deeper pages rank the same prefix
    let page = |n: usize| ItemSearchParams {
        page: Some(n),
        size: Some(4),
        semantic: false,
        ..items("biryani")
    };
    let first = svc.search_items(&page(1)).await.expect("served");
    let second = svc.search_items(&page(2)).await.expect("served");

    assert_eq!(first.items.len(), 4);
    assert_eq!(second.meta.page, 2);
    assert_eq!(first.meta.total, second.meta.total);
    let seen: HashSet<&str> = ids(&first.items).into_iter().collect();
    assert!(ids(&second.items).iter().all(|id| !seen.contains(id)));
}

#[tokio::test]
async fn corrected_spelling_is_reported() {
    let response = service()
        .search_items(&items("chiken biriani"))
        .await
        .expect("served");
    assert_eq!(response.corrected_query.as_deref(), Some("chicken biryani"));
    assert_eq!(response.items[0].id, "101");
}

#[tokio::test]
async fn module_hybrid_search() {
    let params = HybridSearchParams {
        veg: Some(true),
        ..HybridSearchParams::new("pizza")
    };
    let response = service().hybrid_search("1", &params).await.expect("served");

    assert_eq!(response.meta.search_type, SearchType::Hybrid);
    assert!(response.items.iter().all(|h| h.item.veg));
    assert_eq!(response.items[0].id, "301");
}

#[tokio::test]
async fn unknown_module_slug_is_rejected() {
    let err = service()
        .hybrid_search("pets", &HybridSearchParams::new("pizza"))
        .await
        .expect_err("not configured");
    assert!(matches!(err, KhojError::InvalidFilter { .. }));
}

#[tokio::test]
async fn conversational_echoes_what_it_understood() {
    let params = ConversationalParams {
        module_id: Some(1),
        ..ConversationalParams::new("veg biryani under 300")
    };
    let response = service().conversational(&params).await.expect("served");

    assert_eq!(response.context.filters.veg, Some(true));
    assert_eq!(response.context.filters.price_max, Some(300.0));
    assert_eq!(response.results.items[0].id, "103");
    assert!(response.context.message.contains("veg"));
    assert_eq!(response.parsed.original, "veg biryani under 300");
}
