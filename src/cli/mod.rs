// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! CLI definitions for the khoj command-line interface.
//!
//! Four subcommands: `understand` and `parse` show what the query layers make
//! of a string, `variant` shows an experiment assignment, and `search` runs
//! the whole service against a JSON catalog held in memory.

pub mod display;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use khoj::logging::LogFormat;

#[derive(Parser)]
#[command(
    name = "khoj",
    about = "Query understanding and retrieval for multilingual commerce search",
    version
)]
pub struct Cli {
    /// JSON config file. Validated at startup; errors are fatal.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log output on stderr (filter with KHOJ_LOG)
    #[arg(long, global = true, value_enum, default_value = "pretty")]
    pub log_format: LogFormatArg,

    /// Print machine-readable JSON instead of boxes
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Pretty => LogFormat::Pretty,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum StrategyArg {
    Hybrid,
    MultiStage,
}

impl StrategyArg {
    /// The `search_algorithm` variant that selects this strategy.
    pub fn variant(self) -> &'static str {
        match self {
            StrategyArg::Hybrid => "hybrid",
            StrategyArg::MultiStage => "multi_stage",
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the understanding pipeline and print the parsed query
    Understand {
        /// Raw query, any script
        query: String,
    },

    /// Classify a query as item, store, or item-from-store
    Parse {
        query: String,
    },

    /// Show which variant of an experiment a user gets
    Variant {
        /// Experiment name, e.g. search_algorithm
        experiment: String,

        user: String,
    },

    /// Search a JSON catalog (an array of items) held in memory
    Search(SearchArgs),
}

#[derive(Args)]
pub struct SearchArgs {
    /// Path to the catalog file
    #[arg(long)]
    pub catalog: PathBuf,

    pub query: String,

    /// Only veg items
    #[arg(long)]
    pub veg: bool,

    /// Category name, applied as a facet selection
    #[arg(long)]
    pub category: Option<String>,

    #[arg(long)]
    pub price_min: Option<f64>,

    #[arg(long)]
    pub price_max: Option<f64>,

    /// Delivery zone. Defaults to the first catalog item's zone.
    #[arg(long)]
    pub zone: Option<u64>,

    /// Force a retrieval strategy instead of the experiment's choice
    #[arg(long, value_enum)]
    pub strategy: Option<StrategyArg>,

    /// User id, for experiment bucketing
    #[arg(long)]
    pub user: Option<String>,

    #[arg(short, long, default_value = "10")]
    pub size: usize,

    #[arg(long, default_value = "1")]
    pub page: usize,

    /// relevance, price_asc, price_desc, rating or popularity
    #[arg(long, default_value = "relevance")]
    pub sort: String,

    /// Extra facet selections, `field=value` (repeatable)
    #[arg(long = "facet")]
    pub facets: Vec<String>,
}
