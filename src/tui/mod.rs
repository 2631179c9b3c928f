//! TUI module for planctl
//!
//! Provides a terminal user interface for:
//! - The signed-in user and the current scenario at a glance
//! - Exploring and editing the plan-node tree of a scenario
//! - Activating, rolling over and managing scenarios and services

mod app;
mod dialog;
mod tasks;
mod views;
mod widgets;

pub use app::{run_tui, TuiOptions};

use chrono::{DateTime, Utc};

/// Format a timestamp as a short date (e.g. "Apr 1, 2025")
pub fn format_date(value: &DateTime<Utc>) -> String {
    value.format("%b %-d, %Y").to_string()
}

/// Ellipsize text to fit within max_chars
pub fn ellipsize(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        value.to_string()
    } else if max_chars == 0 {
        String::new()
    } else {
        let take = max_chars.saturating_sub(1);
        let mut result = value.chars().take(take).collect::<String>();
        result.push('…');
        result
    }
}

/// Sanitize text by removing newlines for single-line display
pub fn sanitize_text(value: &str) -> String {
    value.replace('\n', " ").replace('\r', " ")
}

/// Simple word-wrap for text
pub fn wrap_text(text: &str, max_width: usize) -> Vec<String> {
    let mut lines = Vec::new();

    for paragraph in text.lines() {
        let mut current_line = String::new();
        for word in paragraph.split_whitespace() {
            if current_line.is_empty() {
                current_line = word.to_string();
            } else if current_line.chars().count() + 1 + word.chars().count() <= max_width {
                current_line.push(' ');
                current_line.push_str(word);
            } else {
                lines.push(current_line);
                current_line = word.to_string();
            }
        }
        if !current_line.is_empty() {
            lines.push(current_line);
        }
    }

    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}
