//! Text normalisation and section headings.
//!
//! Extracted page text is tidied with three deterministic passes before it is
//! chunked:
//!
//! 1. form feeds become paragraph breaks;
//! 2. runs of three or more newlines collapse to `max_newlines`;
//! 3. trailing whitespace is stripped from every line.

use once_cell::sync::Lazy;
use regex::Regex;

static RE_NEWLINE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

/// Normalise raw extracted text.
pub fn format_text(text: &str, max_newlines: usize) -> String {
    let s = text.replace('\u{000C}', "\n\n");
    let s = collapse_newlines(&s, max_newlines);
    trim_trailing_whitespace(&s)
}

fn collapse_newlines(input: &str, max_newlines: usize) -> String {
    let replacement = "\n".repeat(max_newlines);
    RE_NEWLINE_RUN
        .replace_all(input, replacement.as_str())
        .into_owned()
}

fn trim_trailing_whitespace(input: &str) -> String {
    input
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Prefix `text` with a Markdown heading `"<#×level> <id> <title>"` and a
/// blank line.
pub fn add_section_header(text: &str, section_id: &str, title: &str, level: usize) -> String {
    format!("{} {} {}\n\n{}", "#".repeat(level), section_id, title, text)
}
