// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! `khoj` binary: query understanding, targeting, experiment assignment and
//! in-memory search from the terminal.

mod cli;

use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use serde::Serialize;

use cli::display::{self, field, row, section_bot, section_mid, section_top};
use cli::{Cli, Commands, SearchArgs};
use khoj::config::MEMORY_INDEX_URL;
use khoj::experiment::SEARCH_ALGORITHM;
use khoj::logging;
use khoj::understanding::Entity;
use khoj::{
    CatalogItem, Experiment, ExperimentRegistry, HashingEmbedder, ItemSearchParams, KhojConfig,
    KhojError, MemoryIndex, ParsedQuery, QueryIntentParser, QueryUnderstandingPipeline, Result,
    SearchResponse, SearchService, SortOrder, StoreItemIntent, Variant,
};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init(cli.log_format.into());

    if let Err(e) = run(cli).await {
        eprintln!("{} {}", display::themed(display::RED, &[display::BOLD], "error:"), e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let json = cli.json;
    let config = match &cli.config {
        Some(path) => KhojConfig::load(path)?,
        None => KhojConfig::in_memory(),
    };

    match cli.command {
        Commands::Understand { query } => {
            let pipeline = QueryUnderstandingPipeline::default()
                .with_max_suggestions(config.query.max_suggestions);
            let parsed = pipeline.process(&query);
            if json {
                print_json(&parsed)?;
            } else {
                show_parsed(&parsed);
            }
        }

        Commands::Parse { query } => {
            let target = QueryIntentParser::new().parse(&query);
            if json {
                print_json(&target)?;
            } else {
                show_target(&target);
            }
        }

        Commands::Variant { experiment, user } => {
            let registry = ExperimentRegistry::from_experiments(&config.experiments)?;
            let variant = registry.get_variant(&experiment, &user);
            if json {
                print_json(&serde_json::json!({
                    "experiment": experiment,
                    "user": user,
                    "variant": variant,
                }))?;
            } else {
                println!("{variant}");
            }
        }

        Commands::Search(args) => {
            let response = search(config, args).await?;
            if json {
                print_json(&response)?;
            } else {
                show_response(&response);
            }
        }
    }

    Ok(())
}

// ============================================================================
// SEARCH
// ============================================================================

async fn search(config: KhojConfig, args: SearchArgs) -> Result<SearchResponse> {
    if !config.backends.index_url.starts_with("memory://") {
        return Err(KhojError::Config {
            reason: format!(
                "search runs against the in-memory index ({MEMORY_INDEX_URL}), config has {}",
                config.backends.index_url
            ),
        });
    }

    let items = read_catalog(&args.catalog)?;
    let zone = args.zone.or_else(|| items.first().map(|i| i.zone_id));

    let embedder = Arc::new(HashingEmbedder::new(config.backends.embedding_dimension));
    let index = MemoryIndex::new("items").with_embedder(Arc::clone(&embedder));
    index.add_items(items.clone());

    let service = SearchService::builder(config, Arc::new(index))
        .embedder(embedder)
        .build()?;
    service.learn_catalog(&items);

    let mut user = args.user;
    if let Some(strategy) = args.strategy {
        service.experiments().add_experiment(Experiment::new(
            SEARCH_ALGORITHM,
            vec![Variant::new(strategy.variant(), 100)],
        ))?;
        user.get_or_insert_with(|| "cli".to_string());
    }

    let mut facets = args.facets;
    if let Some(category) = args.category {
        facets.push(format!("category={}", category.to_lowercase()));
    }

    let params = ItemSearchParams {
        zone_id: zone,
        veg: args.veg.then_some(true),
        price_min: args.price_min,
        price_max: args.price_max,
        page: Some(args.page),
        size: Some(args.size),
        sort: args.sort.parse::<SortOrder>()?,
        user_id: user,
        facets,
        ..ItemSearchParams::new(&args.query)
    };

    service.search_items(&params).await
}

fn read_catalog(path: &Path) -> Result<Vec<CatalogItem>> {
    let text = std::fs::read_to_string(path).map_err(|e| KhojError::Config {
        reason: format!("{}: {e}", path.display()),
    })?;
    serde_json::from_str(&text).map_err(|e| KhojError::Config {
        reason: format!("{}: {e}", path.display()),
    })
}

// ============================================================================
// OUTPUT
// ============================================================================

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn show_parsed(parsed: &ParsedQuery) {
    section_top("QUERY");
    field("original", &parsed.original);
    if let Some(t) = &parsed.transliterated {
        field("transliterated", t);
    }
    field("corrected", &parsed.corrected);
    field("normalized", &parsed.normalized);
    field("expanded", &display::truncate(&parsed.expanded, 54));

    section_mid("INTENT");
    field("intent", &display::intent_label(parsed.intent));
    field("confidence", &display::confidence_bar(parsed.confidence));
    for entity in parsed.entities.iter() {
        field("entity", &describe_entity(entity));
    }

    if !parsed.corrections.is_empty() {
        section_mid("CORRECTIONS");
        for c in &parsed.corrections {
            let mark = if c.applied { "applied" } else { "suggested" };
            row(&format!(
                "{} → {}  d={} {:.2} {}",
                c.original,
                c.suggestion,
                c.distance,
                c.confidence,
                display::themed(display::GRAY, &[], mark)
            ));
        }
    }

    let rec = &parsed.recommended_filters;
    if *rec != Default::default() {
        section_mid("FILTERS");
        if let Some(veg) = rec.veg {
            field("veg", &veg.to_string());
        }
        if let Some(min) = rec.price_min {
            field("price min", &display::price(min));
        }
        if let Some(max) = rec.price_max {
            field("price max", &display::price(max));
        }
        if let Some(category) = &rec.category {
            field("category", category);
        }
        if let Some(brand) = &rec.brand {
            field("brand", brand);
        }
        if let Some(location) = &rec.location {
            field("location", location);
        }
        if let Some(sort) = rec.sort {
            field("sort", &format!("{sort:?}"));
        }
    }

    if !parsed.suggestions.is_empty() {
        section_mid("DID YOU MEAN");
        for s in &parsed.suggestions {
            row(s);
        }
    }
    section_bot();
}

fn describe_entity(entity: &Entity) -> String {
    match serde_json::to_string(entity) {
        Ok(s) => s,
        Err(_) => format!("{entity:?}"),
    }
}

fn show_target(target: &StoreItemIntent) {
    section_top("TARGET");
    field("kind", &format!("{:?}", target.kind));
    if let Some(item) = &target.item_query {
        field("item", item);
    }
    if let Some(store) = &target.store_query {
        field("store", store);
    }
    if let Some(brand) = &target.detected_brand {
        field("brand", brand);
    }
    field("brand search", &target.is_brand_search.to_string());
    if let Some(pattern) = &target.pattern {
        field("pattern", pattern);
    }
    if !target.signals.is_empty() {
        let signals: Vec<String> = target.signals.iter().map(|s| format!("{s:?}")).collect();
        field("signals", &signals.join(", "));
    }
    section_bot();
}

fn show_response(response: &SearchResponse) {
    let meta = &response.meta;
    section_top("RESULTS");
    field(
        "search",
        &format!(
            "{} {} of {} in {}ms",
            display::search_type_badge(meta.search_type, meta.degraded),
            response.items.len(),
            meta.total,
            meta.took_ms
        ),
    );
    if let Some(variant) = &meta.variant {
        field("variant", variant);
    }
    if let Some(corrected) = &response.corrected_query {
        field("searched for", corrected);
    }

    if !response.items.is_empty() {
        section_mid("ITEMS");
        for (i, hit) in response.items.iter().enumerate() {
            let item = &hit.item;
            row(&format!(
                "{:>2}. {} {} {} {} {}",
                meta.page.saturating_sub(1) * meta.size + i + 1,
                display::veg_marker(item.veg),
                display::truncate(&item.name, 24),
                display::themed(display::GRAY, &[], &display::truncate(&item.store_name, 18)),
                display::price(item.price),
                display::score_value(hit.score)
            ));
        }
    }

    if !response.stores.is_empty() {
        section_mid("STORES");
        for store in &response.stores {
            row(&format!("{} ({})", store.store_name, store.items));
        }
    }

    for facet in &response.facets {
        section_mid(&facet.label.to_uppercase());
        let values: Vec<String> = facet
            .values
            .iter()
            .map(|v| {
                let text = format!("{} ({})", v.label, v.count);
                if v.selected {
                    display::themed(display::GREEN, &[display::BOLD], &format!("*{text}"))
                } else {
                    text
                }
            })
            .collect();
        row(&values.join("  "));
    }

    if !response.suggestions.is_empty() {
        section_mid("DID YOU MEAN");
        for s in &response.suggestions {
            row(s);
        }
    }
    section_bot();
}
