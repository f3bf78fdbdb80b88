// Core modules
mod backend;
pub mod cli;
pub mod config;
pub mod entry;
mod error;
pub mod export;
pub mod extract;
pub mod fetch;
mod observer;
pub mod parser;
pub mod pipeline;
pub mod prefetch;
pub mod site;
pub mod target;
pub mod writer;
mod year;

// Public exports
pub use backend::{ElementRef, parse_page};
pub use config::{
    CollectionKind, DEFAULT_WORKERS, ExportConfig, ExportConfigBuilder, MAX_WORKERS, Section,
    TitleFilter,
};
pub use entry::{Entry, Row, TitleType, deduplicate, is_season_url};
pub use error::{BoxError, ConfigError, ExportError, FetchError, TargetError};
pub use export::{ExportSummary, Exporter, TableReport};
pub use fetch::{Cooldown, FetchPolicy, Fetcher, HttpFetcher};
pub use observer::{CollectObserver, ObserverRegistry, ProgressLine};
pub use parser::{FilmowParser, PageParser, infer_title_type};
pub use pipeline::{CollectStats, Collected, Collector, Progress};
pub use prefetch::{PrefetchCache, Prefetcher, WorkerGuard, shard};
pub use site::Site;
pub use target::{Target, parse_target};
pub use writer::{TableWriter, output_file_name};
pub use year::YearResolver;
