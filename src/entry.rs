//! Entries discovered on list pages and the rows produced from them

use std::{collections::HashSet, fmt, hash::Hash};

/// Kind of title, inferred from breadcrumbs or taken from a library section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TitleType {
    Film,
    Short,
    Series,
}

impl TitleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TitleType::Film => "film",
            TitleType::Short => "short",
            TitleType::Series => "series",
        }
    }
}

impl fmt::Display for TitleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An entry found while scanning a list: `(url, rating, type hint)`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Entry {
    /// Absolute URL of the title page
    pub url: String,
    /// Rating on a 0-5 scale with one decimal, empty when unrated
    pub rating: String,
    /// Type known before the page is read, if any
    pub title_type: Option<TitleType>,
}

impl Entry {
    pub fn new(
        url: impl Into<String>,
        rating: impl Into<String>,
        title_type: Option<TitleType>,
    ) -> Self {
        Self {
            url: url.into(),
            rating: rating.into(),
            title_type,
        }
    }

    /// An entry with neither rating nor type hint
    pub fn bare(url: impl Into<String>) -> Self {
        Self::new(url, "", None)
    }
}

/// One output record
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Row {
    pub title: String,
    pub year: String,
    pub directors: String,
    pub rating: String,
    pub runtime: String,
    pub review: String,
    pub title_type: String,
    pub url: String,
}

impl Row {
    /// Column names, in output order
    pub const HEADERS: [&'static str; 8] = [
        "Title",
        "Year",
        "Directors",
        "Rating",
        "Runtime",
        "Review",
        "Title Type",
        "URL",
    ];

    /// Fields in the same order as [`Row::HEADERS`]
    pub fn fields(&self) -> [&str; 8] {
        [
            &self.title,
            &self.year,
            &self.directors,
            &self.rating,
            &self.runtime,
            &self.review,
            &self.title_type,
            &self.url,
        ]
    }
}

/// Remove repeated items, keeping the first occurrence of each
pub fn deduplicate<T>(items: impl IntoIterator<Item = T>) -> Vec<T>
where
    T: Eq + Hash + Clone,
{
    deduplicate_by(items, |item| item.clone())
}

/// Remove items whose key was already seen, keeping first-seen order
pub fn deduplicate_by<T, K, F>(items: impl IntoIterator<Item = T>, key: F) -> Vec<T>
where
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(key(item)))
        .collect()
}

/// Whether `url` points at a single season of a series
///
/// Season pages end in `...-temporada-<n>/`; they are sub-entries of a show
/// that is already listed on its own.
pub fn is_season_url(url: &str) -> bool {
    let mut chars = url.chars();
    if chars.next_back().is_none() {
        return false;
    }
    let trimmed = chars.as_str();
    let name = trimmed.rsplit('/').next().unwrap_or(trimmed);
    let parts: Vec<&str> = name.split('-').collect();
    parts.len() >= 2 && parts[parts.len() - 2] == "temporada"
}

/// Fit `url` into `width` characters for the progress line
pub fn truncated_url(url: &str, width: usize) -> String {
    let len = url.chars().count();
    if len < width {
        format!("{:>width$}", url.trim())
    } else {
        let keep = width.saturating_sub(3);
        let tail: String = url.chars().skip(len - keep).collect();
        format!("...{tail}")
    }
}
