//! Text helpers for user requests and tool arguments.

use once_cell::sync::Lazy;
use regex::Regex;

/// Requests shorter than this (after tag stripping) are dropped.
pub const MIN_USER_TEXT_CHARS: usize = 5;
/// Cleaned requests longer than this keep only their head and tail.
pub const MAX_USER_TEXT_CHARS: usize = 500;
/// Characters kept from each end of an over-long request.
pub const ELIDED_EDGE_CHARS: usize = 200;

pub const CODE_PLACEHOLDER: &str = "[code]";
pub const ELISION_MARKER: &str = " ... ";

static INJECTED_TAG_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<[^>]+>.*?</[^>]+>").expect("valid tag regex"));

static CODE_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```.*?```").expect("valid fence regex"));

static HORIZONTAL_RULE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(?:[-*_=]\s*){3,}$").expect("valid rule regex"));

static BLANK_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n(?:[ \t]*\n){3,}").expect("valid blank-run regex"));

static SPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r" {2,}").expect("valid space regex"));

/// Clean a user request.
///
/// Returns `None` when nothing actionable is left.
pub fn clean_user_text(raw: &str) -> Option<String> {
    let stripped = INJECTED_TAG_BLOCK.replace_all(raw, "");
    let stripped = stripped.trim();
    if stripped.chars().count() < MIN_USER_TEXT_CHARS {
        return None;
    }

    let text = CODE_FENCE.replace_all(stripped, CODE_PLACEHOLDER);
    let text = text
        .lines()
        .filter(|line| !is_pasted_layout_line(line))
        .collect::<Vec<_>>()
        .join("\n");
    let text = BLANK_RUN.replace_all(&text, "\n\n");
    let text = SPACE_RUN.replace_all(&text, " ");
    let text = text.trim();

    if text.is_empty() {
        return None;
    }

    Some(elide_middle(text))
}

/// Box-drawing rows, markdown table rows and horizontal rules.
fn is_pasted_layout_line(line: &str) -> bool {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return false;
    }
    if trimmed.chars().next().is_some_and(is_box_drawing) {
        return true;
    }
    if trimmed.len() > 1 && trimmed.starts_with('|') && trimmed.ends_with('|') {
        return true;
    }
    HORIZONTAL_RULE.is_match(trimmed)
}

fn is_box_drawing(c: char) -> bool {
    ('\u{2500}'..='\u{257F}').contains(&c)
}

/// Keep the head and tail of an over-long request.
fn elide_middle(text: &str) -> String {
    let total = text.chars().count();
    if total <= MAX_USER_TEXT_CHARS {
        return text.to_string();
    }
    let head: String = text.chars().take(ELIDED_EDGE_CHARS).collect();
    let tail: String = text.chars().skip(total - ELIDED_EDGE_CHARS).collect();
    format!("{head}{ELISION_MARKER}{tail}")
}

/// Flatten to one line and cap at `max_chars`, ending with `...` when cut.
pub fn truncate(text: &str, max_chars: usize) -> String {
    let text = text.trim().replace('\n', " ");
    if text.chars().count() <= max_chars {
        return text;
    }
    let kept: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{kept}...")
}

/// Shorten a file path for display.
///
/// Everything up to and including a `Projects` segment is dropped; otherwise
/// only the last `max_depth` segments are kept.
pub fn shorten_path(path: &str, max_depth: usize) -> String {
    if path.is_empty() {
        return String::new();
    }
    let parts: Vec<&str> = path.split('/').collect();
    let kept = match parts.iter().position(|p| *p == "Projects") {
        Some(idx) => &parts[idx + 1..],
        None if parts.len() > max_depth => &parts[parts.len() - max_depth..],
        None => &parts[..],
    };
    kept.join("/")
}
