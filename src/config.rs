//! Run configuration and the two independent filtering axes
//!
//! - [`CollectionKind`] picks which of a user's collections are read
//!   (watched, watchlist, favorites).
//! - [`TitleFilter`] picks which kinds of titles are kept (series, feature
//!   films, shorts).
//!
//! A configuration is only obtained through [`ExportConfigBuilder::build`],
//! which validates it before any network activity happens.

use std::{
    fmt,
    path::{Path, PathBuf},
};

use crate::{entry::TitleType, error::ConfigError};

pub const DEFAULT_WORKERS: usize = 15;
pub const MAX_WORKERS: usize = 99;
pub const DEFAULT_BASE_URL: &str = "https://filmow.com/";

/// Share of the worker count used for release-date pages
const DATES_WORKER_SHARE: f64 = 0.15;

/// One of a user's collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKind {
    Watched,
    Watchlist,
    Favorites,
}

impl CollectionKind {
    pub const ALL: [CollectionKind; 3] = [
        CollectionKind::Watched,
        CollectionKind::Watchlist,
        CollectionKind::Favorites,
    ];

    /// Path segment of the collection under a library section
    pub fn path_segment(&self) -> &'static str {
        match self {
            CollectionKind::Watched => "ja-vi",
            CollectionKind::Watchlist => "quero-ver",
            CollectionKind::Favorites => "favoritos",
        }
    }

    /// Category name used in output file names
    pub fn category(&self) -> &'static str {
        match self {
            CollectionKind::Watched => "watched",
            CollectionKind::Watchlist => "watchlist",
            CollectionKind::Favorites => "favorites",
        }
    }
}

/// A section of a user's library
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Films,
    Shorts,
    Series,
    Tv,
}

impl Section {
    pub fn path_segment(&self) -> &'static str {
        match self {
            Section::Films => "filmes",
            Section::Shorts => "curtas",
            Section::Series => "series",
            Section::Tv => "tv",
        }
    }

    /// Type given to every entry listed in this section
    pub fn title_type(&self) -> TitleType {
        match self {
            Section::Films => TitleType::Film,
            Section::Shorts => TitleType::Short,
            Section::Series | Section::Tv => TitleType::Series,
        }
    }
}

/// Which kinds of titles are collected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TitleFilter {
    #[default]
    All,
    /// Series and TV programs
    Series,
    /// Feature-length films only
    Features,
    /// Short films only
    Shorts,
    /// Feature-length and short films
    Films,
}

impl TitleFilter {
    /// Library sections to scan
    pub fn sections(&self) -> &'static [Section] {
        match self {
            TitleFilter::All => &[Section::Films, Section::Shorts, Section::Series, Section::Tv],
            TitleFilter::Series => &[Section::Series, Section::Tv],
            TitleFilter::Features => &[Section::Films],
            TitleFilter::Shorts => &[Section::Shorts],
            TitleFilter::Films => &[Section::Films, Section::Shorts],
        }
    }

    /// Whether a title of `kind` is kept; unknown kinds always are
    pub fn allows(&self, kind: Option<TitleType>) -> bool {
        let Some(kind) = kind else {
            return true;
        };
        match self {
            TitleFilter::All => true,
            TitleFilter::Series => kind == TitleType::Series,
            TitleFilter::Features => kind == TitleType::Film,
            TitleFilter::Shorts => kind == TitleType::Short,
            TitleFilter::Films => matches!(kind, TitleType::Film | TitleType::Short),
        }
    }

    pub fn includes_series(&self) -> bool {
        self.allows(Some(TitleType::Series))
    }

    /// Suffix appended to output file names, `None` when nothing is filtered
    pub fn file_suffix(&self) -> Option<&'static str> {
        match self {
            TitleFilter::All => None,
            TitleFilter::Series => Some("series"),
            TitleFilter::Features => Some("features"),
            TitleFilter::Shorts => Some("shorts"),
            TitleFilter::Films => Some("films"),
        }
    }
}

impl fmt::Display for TitleFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_suffix().unwrap_or("all"))
    }
}

/// Validated configuration for an export run
#[derive(Debug, Clone)]
pub struct ExportConfig {
    pub(crate) workers: usize,
    pub(crate) output_dir: PathBuf,
    pub(crate) collections: Vec<CollectionKind>,
    pub(crate) title_filter: TitleFilter,
    pub(crate) dates_fallback: bool,
    pub(crate) base_url: String,
}

impl ExportConfig {
    pub fn builder() -> ExportConfigBuilder {
        ExportConfigBuilder::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 || self.workers > MAX_WORKERS {
            return Err(ConfigError::InvalidWorkerCount(self.workers));
        }
        if !self.output_dir.is_dir() {
            return Err(ConfigError::InvalidOutputDir(self.output_dir.clone()));
        }
        let base = reqwest::Url::parse(&self.base_url)
            .map_err(|_| ConfigError::InvalidBaseUrl(self.base_url.clone()))?;
        if base.cannot_be_a_base() || base.host_str().is_none() {
            return Err(ConfigError::InvalidBaseUrl(self.base_url.clone()));
        }
        Ok(())
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Workers used for release-date pages: `1 + round(workers * 0.15)`
    pub fn dates_workers(&self) -> usize {
        1 + (self.workers as f64 * DATES_WORKER_SHARE).round_ties_even() as usize
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn collections(&self) -> &[CollectionKind] {
        &self.collections
    }

    pub fn title_filter(&self) -> TitleFilter {
        self.title_filter
    }

    pub fn dates_fallback(&self) -> bool {
        self.dates_fallback
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// Builder for [`ExportConfig`]
#[derive(Debug, Clone)]
pub struct ExportConfigBuilder {
    config: ExportConfig,
}

impl Default for ExportConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ExportConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: ExportConfig {
                workers: DEFAULT_WORKERS,
                output_dir: PathBuf::from("."),
                collections: CollectionKind::ALL.to_vec(),
                title_filter: TitleFilter::All,
                dates_fallback: true,
                base_url: DEFAULT_BASE_URL.to_string(),
            },
        }
    }

    /// Number of concurrent prefetch workers (default: 15)
    pub fn workers(mut self, workers: usize) -> Self {
        self.config.workers = workers;
        self
    }

    /// Directory receiving the CSV files (default: current directory)
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    /// Restrict a user export to one collection
    pub fn only(mut self, collection: CollectionKind) -> Self {
        self.config.collections = vec![collection];
        self
    }

    pub fn collections(mut self, collections: impl IntoIterator<Item = CollectionKind>) -> Self {
        self.config.collections = collections.into_iter().collect();
        self
    }

    pub fn title_filter(mut self, filter: TitleFilter) -> Self {
        self.config.title_filter = filter;
        self
    }

    /// Look up missing years on release-date pages (default: on)
    pub fn dates_fallback(mut self, enabled: bool) -> Self {
        self.config.dates_fallback = enabled;
        self
    }

    /// Root of the site, with a trailing slash
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        let mut url = url.into();
        if !url.ends_with('/') {
            url.push('/');
        }
        self.config.base_url = url;
        self
    }

    pub fn build(self) -> Result<ExportConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
