// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! One error type for the whole crate.
//!
//! Every failure lands in one of four buckets, and callers mostly care which
//! bucket, not which variant. A transport layer maps `Input` to a 4xx, the
//! rest to a 5xx (or a degraded 200, if a fallback answered).
//!
//! | Kind            | Variants                                          | Who handles it       |
//! |-----------------|---------------------------------------------------|----------------------|
//! | `Input`         | `EmptyQuery`, `QueryTooLong`, `MissingZone`, ...  | caller, immediately  |
//! | `Upstream`      | `Upstream`, `Timeout`, `Cancelled`                | declared fallback    |
//! | `Configuration` | `Config`, `ConfigIo`, `ConfigParse`               | process startup      |
//! | `Registry`      | `InvalidExperiment`, `InvalidSynonymGroup`, ...   | admin caller         |

use std::fmt;

use serde::{Deserialize, Serialize};

/// A backend the orchestrator talks to. Used to tag upstream failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    LexicalIndex,
    VectorIndex,
    HybridIndex,
    Embedding,
    Personalization,
    Legacy,
    ZoneResolver,
    Analytics,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Backend::LexicalIndex => "lexical-index",
            Backend::VectorIndex => "vector-index",
            Backend::HybridIndex => "hybrid-index",
            Backend::Embedding => "embedding",
            Backend::Personalization => "personalization",
            Backend::Legacy => "legacy",
            Backend::ZoneResolver => "zone-resolver",
            Backend::Analytics => "analytics",
        };
        f.write_str(name)
    }
}

/// Coarse classification of a [`KhojError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Input,
    Upstream,
    Configuration,
    Registry,
}

#[derive(Debug, thiserror::Error)]
pub enum KhojError {
    #[error("query is empty")]
    EmptyQuery,

    #[error("query is {len} characters long, limit is {max}")]
    QueryTooLong { len: usize, max: usize },

    #[error("zone_id is required (or lat/lon to derive it)")]
    MissingZone,

    #[error("invalid filter '{field}': {reason}")]
    InvalidFilter { field: String, reason: String },

    #[error("{backend} failed: {reason}")]
    Upstream { backend: Backend, reason: String },

    #[error("{backend} timed out after {after_ms}ms")]
    Timeout { backend: Backend, after_ms: u64 },

    #[error("request cancelled")]
    Cancelled,

    #[error("configuration error: {reason}")]
    Config { reason: String },

    #[error("could not read configuration: {0}")]
    ConfigIo(#[from] std::io::Error),

    #[error("could not parse configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),

    #[error("experiment '{name}' rejected: {reason}")]
    InvalidExperiment { name: String, reason: String },

    #[error("synonym group '{canonical}' rejected: {reason}")]
    InvalidSynonymGroup { canonical: String, reason: String },

    #[error("'{form}' already belongs to '{existing}', refusing to move it to '{requested}'")]
    SynonymConflict {
        form: String,
        existing: String,
        requested: String,
    },
}

impl KhojError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            KhojError::EmptyQuery
            | KhojError::QueryTooLong { .. }
            | KhojError::MissingZone
            | KhojError::InvalidFilter { .. } => ErrorKind::Input,
            KhojError::Upstream { .. } | KhojError::Timeout { .. } | KhojError::Cancelled => {
                ErrorKind::Upstream
            }
            KhojError::Config { .. } | KhojError::ConfigIo(_) | KhojError::ConfigParse(_) => {
                ErrorKind::Configuration
            }
            KhojError::InvalidExperiment { .. }
            | KhojError::InvalidSynonymGroup { .. }
            | KhojError::SynonymConflict { .. } => ErrorKind::Registry,
        }
    }

    /// True when the caller sent something we refuse to process (4xx territory).
    pub fn is_client_error(&self) -> bool {
        self.kind() == ErrorKind::Input
    }

    /// The backend an upstream failure came from, if any.
    pub fn backend(&self) -> Option<Backend> {
        match self {
            KhojError::Upstream { backend, .. } | KhojError::Timeout { backend, .. } => {
                Some(*backend)
            }
            _ => None,
        }
    }

    pub(crate) fn upstream(backend: Backend, reason: impl Into<String>) -> Self {
        KhojError::Upstream {
            backend,
            reason: reason.into(),
        }
    }

    pub(crate) fn config(reason: impl Into<String>) -> Self {
        KhojError::Config {
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, KhojError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_errors_are_client_errors() {
        assert!(KhojError::EmptyQuery.is_client_error());
        assert!(KhojError::MissingZone.is_client_error());
        assert!(KhojError::QueryTooLong { len: 300, max: 200 }.is_client_error());
    }

    #[test]
    fn upstream_errors_carry_their_backend() {
        let err = KhojError::Timeout {
            backend: Backend::Embedding,
            after_ms: 250,
        };
        assert_eq!(err.kind(), ErrorKind::Upstream);
        assert_eq!(err.backend(), Some(Backend::Embedding));
        assert_eq!(err.to_string(), "embedding timed out after 250ms");
    }

    #[test]
    fn config_errors_are_not_client_errors() {
        let err = KhojError::config("backends.index_url is required");
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(!err.is_client_error());
    }
}
