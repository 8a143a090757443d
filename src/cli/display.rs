// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Terminal display utilities for the khoj CLI.
//!
//! Boxes, badges and colour for people reading results in a terminal. OneDark
//! on dark backgrounds, One Light on light ones. `KHOJ_THEME` wins, then
//! `COLORFGBG`, then dark. `NO_COLOR` and non-TTY stdout turn colour off, so
//! piping into `less` or a file stays clean. `--json` bypasses all of this.

use std::sync::OnceLock;

use khoj::retrieval::SearchType;
use khoj::understanding::Intent;

// Width between │ and │ (excluding border chars)
pub const BOX_WIDTH: usize = 72;

// ═══════════════════════════════════════════════════════════════════════════
// THEME DETECTION
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    Dark,
    Light,
}

static THEME: OnceLock<Theme> = OnceLock::new();

fn detect_theme() -> Theme {
    if let Ok(theme) = std::env::var("KHOJ_THEME") {
        match theme.to_lowercase().as_str() {
            "light" | "l" => return Theme::Light,
            "dark" | "d" => return Theme::Dark,
            _ => {}
        }
    }
    // "fg;bg": 7 and up (except 8) is a light background
    if let Ok(colorfgbg) = std::env::var("COLORFGBG") {
        if let Some(Ok(bg)) = colorfgbg.split(';').next_back().map(str::parse::<u8>) {
            if bg >= 7 && bg != 8 {
                return Theme::Light;
            }
        }
    }
    Theme::Dark
}

pub fn theme() -> Theme {
    *THEME.get_or_init(detect_theme)
}

// ═══════════════════════════════════════════════════════════════════════════
// PALETTES
// ═══════════════════════════════════════════════════════════════════════════

fn rgb(r: u8, g: u8, b: u8) -> String {
    format!("\x1b[38;2;{};{};{}m", r, g, b)
}

pub const RESET: &str = "\x1b[0m";
pub const BOLD: &str = "\x1b[1m";

mod onedark {
    pub const RED: (u8, u8, u8) = (224, 108, 117);
    pub const GREEN: (u8, u8, u8) = (152, 195, 121);
    pub const YELLOW: (u8, u8, u8) = (229, 192, 123);
    pub const BLUE: (u8, u8, u8) = (97, 175, 239);
    pub const MAGENTA: (u8, u8, u8) = (198, 120, 221);
    pub const CYAN: (u8, u8, u8) = (86, 182, 194);
    pub const GRAY: (u8, u8, u8) = (92, 99, 112);
}

mod onelight {
    pub const RED: (u8, u8, u8) = (228, 86, 73);
    pub const GREEN: (u8, u8, u8) = (80, 161, 79);
    pub const YELLOW: (u8, u8, u8) = (193, 132, 1);
    pub const BLUE: (u8, u8, u8) = (64, 120, 242);
    pub const MAGENTA: (u8, u8, u8) = (166, 38, 164);
    pub const CYAN: (u8, u8, u8) = (1, 132, 188);
    pub const GRAY: (u8, u8, u8) = (160, 161, 167);
}

macro_rules! theme_color {
    ($name:ident) => {
        #[allow(non_snake_case)]
        pub fn $name() -> String {
            let (r, g, b) = match theme() {
                Theme::Dark => onedark::$name,
                Theme::Light => onelight::$name,
            };
            rgb(r, g, b)
        }
    };
}

theme_color!(RED);
theme_color!(GREEN);
theme_color!(YELLOW);
theme_color!(BLUE);
theme_color!(MAGENTA);
theme_color!(CYAN);
theme_color!(GRAY);

// ═══════════════════════════════════════════════════════════════════════════
// CORE UTILITIES
// ═══════════════════════════════════════════════════════════════════════════

/// Colour only for a terminal, and never under `NO_COLOR`.
pub fn use_colors() -> bool {
    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }
    atty::is(atty::Stream::Stdout)
}

pub fn themed(color_fn: fn() -> String, modifiers: &[&str], text: &str) -> String {
    if use_colors() {
        format!("{}{}{}{}", modifiers.join(""), color_fn(), text, RESET)
    } else {
        text.to_string()
    }
}

/// Visible length, ignoring ANSI escapes.
pub fn visible_len(s: &str) -> usize {
    let mut in_escape = false;
    let mut len = 0;
    for c in s.chars() {
        if c == '\x1b' {
            in_escape = true;
        } else if in_escape && c == 'm' {
            in_escape = false;
        } else if !in_escape {
            len += 1;
        }
    }
    len
}

/// Cut to `max` visible characters, with an ellipsis.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{kept}…")
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// BOX DRAWING
// ═══════════════════════════════════════════════════════════════════════════

fn border(s: &str) -> String {
    themed(GRAY, &[], s)
}

/// │ content          │
pub fn row(content: &str) {
    let pad = BOX_WIDTH.saturating_sub(visible_len(content) + 1);
    println!("{} {}{}{}", border("│"), content, " ".repeat(pad), border("│"));
}

/// `key` dimmed and padded, then `value`.
pub fn field(key: &str, value: &str) {
    row(&format!("{} {}", themed(GRAY, &[], &format!("{key:<14}")), value));
}

/// ┌─ LABEL ──────────┐
pub fn section_top(label: &str) {
    let label_part = format!("─ {} ", themed(CYAN, &[BOLD], label));
    let remaining = BOX_WIDTH.saturating_sub(visible_len(&label_part));
    println!("{}{}{}", border("┌"), label_part, border(&format!("{}┐", "─".repeat(remaining))));
}

/// ├─ LABEL ──────────┤
pub fn section_mid(label: &str) {
    let label_part = format!("─ {} ", themed(CYAN, &[BOLD], label));
    let remaining = BOX_WIDTH.saturating_sub(visible_len(&label_part));
    println!("{}{}{}", border("├"), label_part, border(&format!("{}┤", "─".repeat(remaining))));
}

/// └──────────────────┘
pub fn section_bot() {
    println!("{}", border(&format!("└{}┘", "─".repeat(BOX_WIDTH))));
}

// ═══════════════════════════════════════════════════════════════════════════
// SEMANTIC FORMATTERS
// ═══════════════════════════════════════════════════════════════════════════

pub fn intent_label(intent: Intent) -> String {
    let text = format!("{intent:?}");
    let color = match intent {
        Intent::StoreSearch | Intent::BrandSearch => MAGENTA,
        Intent::DietaryFilter | Intent::PriceSearch => GREEN,
        Intent::LocationSearch => BLUE,
        Intent::CategoryBrowse | Intent::GeneralBrowse => CYAN,
        Intent::ItemSearch => YELLOW,
    };
    themed(color, &[BOLD], &text)
}

/// Green for a normal answer, yellow when degraded, red for legacy.
pub fn search_type_badge(search_type: SearchType, degraded: bool) -> String {
    let text = format!("[{}]", search_type);
    let color = match (search_type, degraded) {
        (SearchType::Legacy, _) => RED,
        (_, true) => YELLOW,
        _ => GREEN,
    };
    themed(color, &[BOLD], &text)
}

/// Confidence as a ten-cell bar plus the number.
pub fn confidence_bar(confidence: f64) -> String {
    let filled = (confidence.clamp(0.0, 1.0) * 10.0).round() as usize;
    let bar = format!("{}{}", "█".repeat(filled), "░".repeat(10 - filled));
    let color = if confidence >= 0.7 {
        GREEN
    } else if confidence >= 0.4 {
        YELLOW
    } else {
        RED
    };
    format!("{} {:.2}", themed(color, &[], &bar), confidence)
}

pub fn score_value(score: f64) -> String {
    let text = format!("{:>6.3}", score);
    let color = if score >= 1.0 {
        GREEN
    } else if score >= 0.3 {
        YELLOW
    } else {
        GRAY
    };
    themed(color, &[], &text)
}

pub fn veg_marker(veg: bool) -> String {
    if veg {
        themed(GREEN, &[], "●")
    } else {
        themed(RED, &[], "▲")
    }
}

pub fn price(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("₹{:.0}", value)
    } else {
        format!("₹{:.2}", value)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visible_len_skips_escapes() {
        assert_eq!(visible_len("hello"), 5);
        assert_eq!(visible_len("\x1b[32mhello\x1b[0m"), 5);
        assert_eq!(visible_len(""), 0);
    }

    #[test]
    fn rgb_format() {
        assert_eq!(rgb(255, 128, 64), "\x1b[38;2;255;128;64m");
    }

    #[test]
    fn truncate_counts_chars_not_bytes() {
        assert_eq!(truncate("चिकन बिरयानी", 4), "चिक…");
        assert_eq!(truncate("dosa", 10), "dosa");
    }

    #[test]
    fn prices_drop_zero_paise() {
        assert_eq!(price(120.0), "₹120");
        assert_eq!(price(99.5), "₹99.50");
    }
}
