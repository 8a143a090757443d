// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Text helpers shared by understanding, targeting and the in-memory index.

pub mod normalize;
