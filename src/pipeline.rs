//! Entry discovery and row extraction
//!
//! A [`Collector`] turns listings into [`Entry`] lists and entries into
//! [`Row`]s, reading every page through the shared [`Prefetcher`]:
//!
//! 1. **Counting pages**: the first page of a listing is fetched directly to
//!    learn how many pages it has. If it is unreachable the listing yields no
//!    entries and the run moves on.
//! 2. **Prefetching pages**: every page of the listing is dispatched.
//! 3. **Scanning**: pages are read in order until one is empty, has no
//!    entries, or repeats the previous page's last entry.
//! 4. **Prefetching entries**: entry pages (and release-date pages, when the
//!    year fallback is on) are dispatched by the caller via
//!    [`Collector::prefetch_entries`].
//! 5. **Extracting**: [`Collector::collect`] builds one row per entry.
//!
//! Page bodies are parsed synchronously and dropped before the next await.

use std::sync::Arc;

use scraper::Html;

use crate::{
    backend::parse_page,
    config::{CollectionKind, TitleFilter},
    entry::{Entry, Row, TitleType, deduplicate, deduplicate_by, is_season_url},
    observer::ObserverRegistry,
    parser::{PageParser, infer_title_type},
    prefetch::Prefetcher,
    site::{Site, page_url},
    year::YearResolver,
};

/// Upper bound on pages scanned in one listing
pub const MAX_PAGES: usize = 9_999;

/// How the page count of a listing is read from its first page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingKind {
    /// A section of a user's library, paginated with `?pagina=` links
    Library,
    /// A user made list, paginated by entry count
    UserList,
}

/// Position of a category inside the whole run, for progress reporting
#[derive(Debug, Clone, Copy, Default)]
pub struct Progress {
    /// Entries of earlier categories
    pub start: usize,
    /// Entries across every category
    pub total: usize,
}

/// Counters for one call to [`Collector::collect`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectStats {
    pub rows: usize,
    pub skipped: usize,
    pub fetch_failures: usize,
    pub missing_titles: usize,
}

/// Rows produced for one category
#[derive(Debug, Clone, Default)]
pub struct Collected {
    pub rows: Vec<Row>,
    pub stats: CollectStats,
}

#[derive(Debug, Default)]
struct EntryFields {
    title: String,
    year: String,
    directors: String,
    runtime: String,
    breadcrumb: Option<String>,
}

/// Apply season handling to a single-list collection
///
/// Season pages are retagged as series when series are wanted and dropped
/// otherwise.
pub fn apply_season_rules(entries: Vec<Entry>, filter: TitleFilter) -> Vec<Entry> {
    if filter.includes_series() {
        entries
            .into_iter()
            .map(|mut entry| {
                if is_season_url(&entry.url) {
                    entry.title_type = Some(TitleType::Series);
                }
                entry
            })
            .collect()
    } else {
        entries
            .into_iter()
            .filter(|entry| !is_season_url(&entry.url))
            .collect()
    }
}

/// Drives discovery and extraction for one run
#[derive(Clone)]
pub struct Collector {
    site: Site,
    prefetcher: Prefetcher,
    parser: Arc<dyn PageParser>,
    years: YearResolver,
    observers: ObserverRegistry,
    workers: usize,
    dates_workers: usize,
}

impl Collector {
    pub fn new(
        site: Site,
        prefetcher: Prefetcher,
        parser: Arc<dyn PageParser>,
        years: YearResolver,
    ) -> Self {
        Self {
            site,
            prefetcher,
            parser,
            years,
            observers: ObserverRegistry::new(),
            workers: crate::config::DEFAULT_WORKERS,
            dates_workers: 1,
        }
    }

    /// Worker counts for entry pages and for release-date pages
    pub fn with_workers(mut self, workers: usize, dates_workers: usize) -> Self {
        self.workers = workers.max(1);
        self.dates_workers = dates_workers.max(1);
        self
    }

    pub fn with_observers(mut self, observers: ObserverRegistry) -> Self {
        self.observers = observers;
        self
    }

    /// Entries of every requested collection of a user, section by section
    ///
    /// Collections keep the order of `collections`; each one concatenates
    /// the entries of every section allowed by `filter`.
    pub async fn library_entries(
        &self,
        user_url: &str,
        collections: &[CollectionKind],
        filter: TitleFilter,
    ) -> Vec<(CollectionKind, Vec<Entry>)> {
        let mut gathered: Vec<(CollectionKind, Vec<Entry>)> =
            collections.iter().map(|kind| (*kind, Vec::new())).collect();

        for section in filter.sections() {
            for (kind, entries) in gathered.iter_mut() {
                let url = self.site.collection_url(user_url, *section, *kind);
                let found = self
                    .listing_entries(&url, ListingKind::Library, Some(section.title_type()))
                    .await;
                entries.extend(found);
            }
        }
        gathered
    }

    /// Entries of a user made list, with season handling applied
    pub async fn list_entries(&self, list_url: &str, filter: TitleFilter) -> Vec<Entry> {
        let entries = self
            .listing_entries(list_url, ListingKind::UserList, None)
            .await;
        apply_season_rules(entries, filter)
    }

    /// Entries read from a line-per-URL list; lines off the site are ignored
    pub fn file_entries(&self, contents: &str, filter: TitleFilter) -> Vec<Entry> {
        let entries = deduplicate(
            contents
                .lines()
                .map(str::trim)
                .filter(|line| self.site.accepts(line))
                .map(Entry::bare),
        );
        apply_season_rules(entries, filter)
    }

    /// Scan every page of a listing
    pub async fn listing_entries(
        &self,
        listing_url: &str,
        kind: ListingKind,
        hint: Option<TitleType>,
    ) -> Vec<Entry> {
        self.observers.notify_listing_started(listing_url);

        let policy = self.prefetcher.policy();
        let first = match self
            .prefetcher
            .fetcher()
            .get(listing_url, policy.probe_timeout)
            .await
        {
            Ok(body) => body,
            Err(err) => {
                tracing::debug!(url = listing_url, error = %err, "listing root failed");
                self.observers.notify_listing_unreachable(listing_url);
                return Vec::new();
            }
        };

        let total_pages = {
            let page = parse_page(&first);
            match kind {
                ListingKind::Library => self.parser.library_page_count(&page),
                ListingKind::UserList => self.parser.list_page_count(&page),
            }
        };
        if total_pages > 1 {
            let pages: Vec<String> = (1..=total_pages)
                .map(|page| page_url(listing_url, page))
                .collect();
            self.prefetcher
                .dispatch(&pages, total_pages.min(self.workers));
        }

        let mut found: Vec<(String, String)> = Vec::new();
        for page in 1..=MAX_PAGES {
            let body = self.prefetcher.lookup(&page_url(listing_url, page)).await;
            if body.is_empty() {
                break;
            }
            let (links, ratings) = self.scan_page(&parse_page(&body));
            if links.is_empty() || found.last().map(|(href, _)| href) == links.last() {
                break;
            }
            // one rating bar per entry, however many anchors it has
            let mut ratings = ratings.into_iter();
            found.extend(
                deduplicate(links)
                    .into_iter()
                    .map(|href| (href, ratings.next().unwrap_or_default())),
            );
        }

        let entries = found
            .into_iter()
            .map(|(href, rating)| Entry::new(self.site.absolutize(&href), rating, hint));
        deduplicate_by(entries, |entry| entry.url.clone())
    }

    fn scan_page(&self, page: &Html) -> (Vec<String>, Vec<String>) {
        (self.parser.entry_links(page), self.parser.ratings(page))
    }

    /// Dispatch entry pages, and release-date pages when the year fallback is on
    pub fn prefetch_entries(&self, urls: &[String]) {
        let urls = deduplicate(urls.iter().cloned());
        self.prefetcher.dispatch(&urls, self.workers);

        if self.years.uses_dates_pages() {
            let dates = deduplicate(urls.iter().filter_map(|url| self.site.dates_page_url(url)));
            self.prefetcher.dispatch(&dates, self.dates_workers);
        }
    }

    /// Build one row per entry that passes `filter`
    pub async fn collect(
        &self,
        entries: &[Entry],
        filter: TitleFilter,
        progress: Progress,
    ) -> Collected {
        let mut collected = Collected::default();

        for (index, entry) in entries.iter().enumerate() {
            if entry.title_type.is_some() && !filter.allows(entry.title_type) {
                collected.stats.skipped += 1;
                continue;
            }

            let body = self.prefetcher.lookup(&entry.url).await;
            if body.is_empty() {
                self.observers.notify_fetch_failed(&entry.url);
                collected.stats.fetch_failures += 1;
                continue;
            }
            self.observers
                .notify_entry(progress.start + index + 1, progress.total, &entry.url);

            let fields = self.read_entry_page(&parse_page(&body));
            let title_type = entry
                .title_type
                .or_else(|| infer_title_type(fields.breadcrumb.as_deref(), &fields.runtime));
            if !filter.allows(title_type) {
                collected.stats.skipped += 1;
                continue;
            }

            if fields.title.is_empty() {
                self.observers.notify_missing_title(&entry.url);
                collected.stats.missing_titles += 1;
            }

            let year = self
                .years
                .resolve(
                    fields.year,
                    &entry.url,
                    &self.site,
                    &self.prefetcher,
                    self.parser.as_ref(),
                )
                .await;

            collected.rows.push(Row {
                title: fields.title,
                year,
                directors: fields.directors,
                rating: entry.rating.clone(),
                runtime: fields.runtime,
                review: String::new(),
                title_type: title_type.map(|kind| kind.as_str()).unwrap_or_default().to_string(),
                url: entry.url.clone(),
            });
        }

        collected.stats.rows = collected.rows.len();
        self.observers.notify_category_finished(progress.total);
        collected
    }

    fn read_entry_page(&self, page: &Html) -> EntryFields {
        EntryFields {
            title: self.parser.title(page),
            year: self.parser.year(page),
            directors: self.parser.directors(page),
            runtime: self.parser.runtime(page),
            breadcrumb: self.parser.breadcrumb(page),
        }
    }
}
