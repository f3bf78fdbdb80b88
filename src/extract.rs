//! Conversions from raw page text to field values
//!
//! Every function here is total: text that does not have the expected shape
//! produces an empty string instead of an error, since a missing field is
//! recorded as an empty cell.
//!
//! # Examples
//!
//! ```ignore
//! use filmow_export::extract;
//!
//! assert_eq!(extract::rating_from_style(Some("width: 80.0%;")), "4.0");
//! assert_eq!(extract::leading_digits(" 118 minutos"), "118");
//! assert_eq!(extract::strip_disambiguation("John Smith (II)"), "John Smith");
//! ```

use std::sync::LazyLock;

use regex::Regex;

static PERCENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9]+)(?:\.[0-9]+)?%;?\s*$").expect("valid regex"));
static LEADING_DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\W*([0-9]+)").expect("valid regex"));
static TRAILING_YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9]{4})$").expect("valid regex"));
static NON_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\W").expect("valid regex"));
static ROMAN_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r" \([IVXL]+\)").expect("valid regex"));

/// Rescale a rating bar width to the 0-5 star scale
///
/// Only the integer part of the percentage is used. The result has one
/// decimal; `None` (unrated) gives an empty string.
pub fn rating_from_style(style: Option<&str>) -> String {
    let Some(style) = style else {
        return String::new();
    };
    let Some(percent) = PERCENT
        .captures(style)
        .and_then(|caps| caps[1].parse::<u32>().ok())
    else {
        return String::new();
    };
    format!("{:.1}", (f64::from(percent) / 100.0) * 5.0)
}

/// Leading run of digits, skipping any non-word prefix
pub fn leading_digits(text: &str) -> String {
    LEADING_DIGITS
        .captures(text.trim())
        .map(|caps| caps[1].to_string())
        .unwrap_or_default()
}

/// Four digit year at the end of a date, ignoring punctuation and spaces
pub fn trailing_year(text: &str) -> String {
    let compact = NON_WORD.replace_all(text, "");
    TRAILING_YEAR
        .captures(&compact)
        .map(|caps| caps[1].to_string())
        .unwrap_or_default()
}

/// Drop homonym markers such as ` (II)` from a person's name
pub fn strip_disambiguation(name: &str) -> String {
    ROMAN_SUFFIX.replace_all(name, "").trim().to_string()
}

/// Last four characters of a trimmed date cell
pub fn last_four(text: &str) -> String {
    let trimmed = text.trim();
    let count = trimmed.chars().count();
    trimmed.chars().skip(count.saturating_sub(4)).collect()
}
