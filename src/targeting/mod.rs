// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Does the query name an item, a store, or both?
//!
//! Separate from intent classification on purpose: the classifier decides
//! what *kind* of search this is, the parser decides *where* to look. It runs
//! on the raw text because casing ("KFC", "Inayat Cafe") is signal here.

mod gazetteer;
mod parser;

pub use gazetteer::Gazetteer;
pub use parser::{QueryIntentParser, StoreItemIntent, StoreSignal, TargetKind};
