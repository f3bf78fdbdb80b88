//! Year lookup strategy

use crate::{backend::parse_page, parser::PageParser, prefetch::Prefetcher, site::Site};

/// How the Year column is filled when the entry page has no premiere date
///
/// Chosen once from configuration and handed to the collector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YearResolver {
    /// Use the entry page only; a missing year stays empty
    PrimaryOnly,
    /// Fall back to the entry's release-dates page
    WithDatesPage,
}

impl YearResolver {
    pub fn from_flag(dates_fallback: bool) -> Self {
        if dates_fallback {
            YearResolver::WithDatesPage
        } else {
            YearResolver::PrimaryOnly
        }
    }

    /// Whether release-date pages should be prefetched
    pub fn uses_dates_pages(&self) -> bool {
        matches!(self, YearResolver::WithDatesPage)
    }

    /// Final year for `entry_url`, given the year read from its own page
    pub async fn resolve(
        &self,
        primary: String,
        entry_url: &str,
        site: &Site,
        prefetcher: &Prefetcher,
        parser: &dyn PageParser,
    ) -> String {
        if !primary.is_empty() || !self.uses_dates_pages() {
            return primary;
        }
        let Some(dates_url) = site.dates_page_url(entry_url) else {
            return String::new();
        };
        let body = prefetcher.lookup(&dates_url).await;
        if body.is_empty() {
            return String::new();
        }
        parser.dates_page_year(&parse_page(&body))
    }
}
