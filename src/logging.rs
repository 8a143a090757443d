// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Subscriber setup for the binary. The library only emits events.
//!
//! `KHOJ_LOG` takes the usual `EnvFilter` syntax
//! (`KHOJ_LOG=khoj::retrieval=debug,info`). Default: `info`. Output goes to
//! stderr so `--json` on stdout stays machine-readable.

use std::str::FromStr;
use std::sync::Once;

use tracing_subscriber::EnvFilter;

use crate::error::KhojError;

pub const LOG_ENV: &str = "KHOJ_LOG";

static INIT: Once = Once::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = KhojError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(KhojError::config(format!("unknown log format '{other}'"))),
        }
    }
}

/// Install the global subscriber. Idempotent: later calls are no-ops, and so
/// is a call after something else already installed one.
pub fn init(format: LogFormat) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(std::io::stderr);
        // try_init: a test harness may have installed one first
        let _ = match format {
            LogFormat::Pretty => builder.try_init(),
            LogFormat::Json => builder.json().try_init(),
        };
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_formats() {
        assert_eq!("JSON".parse::<LogFormat>().ok(), Some(LogFormat::Json));
        assert_eq!("pretty".parse::<LogFormat>().ok(), Some(LogFormat::Pretty));
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn init_twice_is_harmless() {
        init(LogFormat::Pretty);
        init(LogFormat::Json);
        tracing::info!("still alive");
    }
}
