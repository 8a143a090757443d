//! Custom cargo commands for khoj.
//!
//! Usage:
//!   cargo xtask check         - fmt, clippy and tests, in that order
//!   cargo xtask test          - Run all tests (default and no-default features)
//!   cargo xtask bench         - Run criterion benchmarks
//!   cargo xtask fuzz [secs]   - Run every fuzz target for a while (needs nightly)

use anyhow::{bail, Context, Result};
use std::env;
use std::path::PathBuf;
use std::process::Command;

/// Targets under `fuzz/fuzz_targets`.
const FUZZ_TARGETS: &[&str] = &["pipeline", "store_parser"];

/// Per-target fuzzing time when none is given.
const DEFAULT_FUZZ_SECS: u64 = 60;

fn main() -> Result<()> {
    let mut args = env::args().skip(1);
    let task = args.next();
    match task.as_deref() {
        Some("check") => check()?,
        Some("test") => test()?,
        Some("bench") => bench()?,
        Some("fuzz") => {
            let secs = match args.next() {
                Some(s) => s
                    .parse()
                    .with_context(|| format!("'{s}' is not a number of seconds"))?,
                None => DEFAULT_FUZZ_SECS,
            };
            fuzz(secs)?
        }
        _ => print_help(),
    }
    Ok(())
}

fn print_help() {
    eprintln!(
        r#"
cargo xtask <COMMAND>

Commands:
  check          cargo fmt --check, clippy -D warnings, then the test suite
  test           Run all Rust tests, with and without default features
  bench          Run criterion benchmarks
  fuzz [secs]    Run each fuzz target for [secs] seconds (default {DEFAULT_FUZZ_SECS})
"#
    );
}

/// Everything CI runs
fn check() -> Result<()> {
    println!("Running checks...\n");

    println!("[1/3] cargo fmt...");
    run_cargo(&["fmt", "--all", "--", "--check"])?;

    println!("[2/3] cargo clippy...");
    run_cargo(&["clippy", "--workspace", "--all-targets", "--quiet", "--", "-D", "warnings"])?;

    println!("[3/3] cargo test...");
    test()?;

    println!("\n✓ All checks passed");
    Ok(())
}

/// Both feature sets: rayon and unicode-normalization change code paths
fn test() -> Result<()> {
    run_cargo(&["test", "--quiet"])?;
    run_cargo(&["test", "--quiet", "--no-default-features"])
}

fn bench() -> Result<()> {
    run_cargo(&["bench", "--bench", "understanding_bench"])
}

fn fuzz(secs: u64) -> Result<()> {
    let max_time = format!("-max_total_time={secs}");
    for target in FUZZ_TARGETS {
        println!("fuzzing {target} for {secs}s...");
        run_cargo(&["+nightly", "fuzz", "run", target, "--", &max_time])?;
    }
    println!("\n✓ No crashes in {} targets", FUZZ_TARGETS.len());
    Ok(())
}

// ============================================================================
// Helper functions
// ============================================================================

fn project_root() -> Result<PathBuf> {
    let manifest_dir = match env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(_) => env::current_dir().context("no working directory")?,
    };

    // xtask is in project_root/xtask, so go up one level
    let root = manifest_dir.parent().unwrap_or(&manifest_dir);
    Ok(root.to_path_buf())
}

fn run_cargo(args: &[&str]) -> Result<()> {
    let root = project_root()?;

    let status = Command::new("cargo")
        .args(args)
        .current_dir(&root)
        .status()
        .with_context(|| format!("Failed to run cargo {:?}", args))?;

    if !status.success() {
        bail!("cargo {:?} failed", args);
    }

    Ok(())
}
