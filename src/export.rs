//! Export runs
//!
//! An [`Exporter`] ties the pieces together for one target: it probes the
//! target, gathers the entries of each category, prefetches every entry page
//! once, then extracts and writes one table per non-empty category.
//!
//! Categories are processed in a fixed order: `list`, `watched`,
//! `watchlist`, `favorites`.
//!
//! # Example
//!
//! ```ignore
//! use filmow_export::{ExportConfig, Exporter, HttpFetcher};
//! use std::sync::Arc;
//!
//! let config = ExportConfig::builder().output_dir("out").build()?;
//! let exporter = Exporter::new(config, Arc::new(HttpFetcher::new()?))?;
//! let target = exporter.resolve("some-user")?;
//! let summary = exporter.run(&target).await?;
//! ```

use std::{
    path::PathBuf,
    sync::Arc,
    time::{Duration, Instant},
};

use tracing::info;

use crate::{
    config::{CollectionKind, ExportConfig},
    entry::Entry,
    error::{ExportError, TargetError},
    fetch::{FetchPolicy, Fetcher},
    observer::{CollectObserver, ObserverRegistry},
    parser::{FilmowParser, PageParser},
    pipeline::{CollectStats, Collector, Progress},
    prefetch::Prefetcher,
    site::Site,
    target::{Target, parse_target, probe, read_list_file},
    writer::TableWriter,
    year::YearResolver,
};

/// Category name of single-list exports
pub const LIST_CATEGORY: &str = "list";

/// One written table
#[derive(Debug, Clone)]
pub struct TableReport {
    pub category: &'static str,
    pub path: PathBuf,
    pub stats: CollectStats,
}

/// Outcome of a successful run
#[derive(Debug, Clone)]
pub struct ExportSummary {
    /// Tables in the order they were written
    pub tables: Vec<TableReport>,
    /// Entries discovered across every category
    pub entries: usize,
    pub elapsed: Duration,
}

impl ExportSummary {
    /// Rows written across every table
    pub fn rows(&self) -> usize {
        self.tables.iter().map(|table| table.stats.rows).sum()
    }
}

/// Runs exports with one configuration
pub struct Exporter {
    config: ExportConfig,
    site: Site,
    fetcher: Arc<dyn Fetcher>,
    parser: Arc<dyn PageParser>,
    policy: FetchPolicy,
    observers: ObserverRegistry,
}

impl Exporter {
    pub fn new(config: ExportConfig, fetcher: Arc<dyn Fetcher>) -> Result<Self, ExportError> {
        config.validate()?;
        let site = Site::new(config.base_url())?;
        Ok(Self {
            config,
            site,
            fetcher,
            parser: Arc::new(FilmowParser::new()),
            policy: FetchPolicy::default(),
            observers: ObserverRegistry::new(),
        })
    }

    /// Replace the timeouts and retry bounds
    pub fn with_policy(mut self, policy: FetchPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_parser(mut self, parser: Arc<dyn PageParser>) -> Self {
        self.parser = parser;
        self
    }

    pub fn register_observer(&mut self, observer: Arc<dyn CollectObserver>) {
        self.observers.register(observer);
    }

    /// Classify a target given on the command line
    pub fn resolve(&self, input: &str) -> Result<Target, TargetError> {
        parse_target(input, &self.site)
    }

    /// Export `target`, writing one table per non-empty category
    pub async fn run(&self, target: &Target) -> Result<ExportSummary, ExportError> {
        let started = Instant::now();

        if let Some(url) = target.remote_url() {
            probe(self.fetcher.as_ref(), url, self.policy.probe_timeout).await?;
        }

        let collector = Collector::new(
            self.site.clone(),
            Prefetcher::new(Arc::clone(&self.fetcher), self.policy.clone()),
            Arc::clone(&self.parser),
            YearResolver::from_flag(self.config.dates_fallback()),
        )
        .with_workers(self.config.workers(), self.config.dates_workers())
        .with_observers(self.observers.clone());

        let filter = self.config.title_filter();
        let categories: Vec<(&'static str, Vec<Entry>)> = match target {
            Target::ListFile { path, .. } => {
                let contents = read_list_file(path)?;
                vec![(LIST_CATEGORY, collector.file_entries(&contents, filter))]
            }
            Target::List { url, .. } => {
                vec![(LIST_CATEGORY, collector.list_entries(url, filter).await)]
            }
            Target::User { url, .. } => {
                let kinds: Vec<CollectionKind> = CollectionKind::ALL
                    .into_iter()
                    .filter(|kind| self.config.collections().contains(kind))
                    .collect();
                collector
                    .library_entries(url, &kinds, filter)
                    .await
                    .into_iter()
                    .map(|(kind, entries)| (kind.category(), entries))
                    .collect()
            }
        };

        let urls: Vec<String> = categories
            .iter()
            .flat_map(|(_, entries)| entries.iter().map(|entry| entry.url.clone()))
            .collect();
        let total = urls.len();
        collector.prefetch_entries(&urls);

        let writer = TableWriter::new(self.config.output_dir(), target.name(), filter);
        let mut tables = Vec::new();
        let mut start = 0;
        for (category, entries) in categories {
            if entries.is_empty() {
                continue;
            }
            let collected = collector
                .collect(&entries, filter, Progress { start, total })
                .await;
            start += entries.len();

            let path = writer.write(category, &collected.rows)?;
            self.observers.notify_table_written(&path, collected.rows.len());
            tables.push(TableReport {
                category,
                path,
                stats: collected.stats,
            });
        }

        let summary = ExportSummary {
            tables,
            entries: total,
            elapsed: started.elapsed(),
        };
        info!(
            name = target.name(),
            tables = summary.tables.len(),
            rows = summary.rows(),
            elapsed_ms = summary.elapsed.as_millis() as u64,
            "export finished"
        );
        Ok(summary)
    }
}
