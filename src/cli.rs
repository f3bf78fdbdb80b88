use std::path::PathBuf;

use clap::{ArgAction, ArgGroup, Parser};

use crate::{
    config::{CollectionKind, DEFAULT_BASE_URL, DEFAULT_WORKERS, ExportConfig, TitleFilter},
    error::ConfigError,
};

/// Export a Filmow library or list to CSV files.
#[derive(Debug, Parser)]
#[command(
    name = "filmow-export",
    version,
    about = "Export a Filmow library or list to CSV files",
    override_usage = "filmow-export [OPTIONS] [OUTPUT_DIR] <USER|USER_URL|LIST_URL|FILE>"
)]
#[command(group(ArgGroup::new("titles").multiple(false)))]
#[command(group(ArgGroup::new("collection").multiple(false)))]
pub struct Cli {
    /// Optional output directory followed by the target.
    #[arg(value_name = "[OUTPUT_DIR] TARGET", num_args = 1..=2, required = true)]
    pub positionals: Vec<String>,

    /// Only series (TV programs included).
    #[arg(short = 'S', group = "titles")]
    pub series: bool,
    /// Only feature-length films.
    #[arg(short = 'l', group = "titles")]
    pub features: bool,
    /// Only short films.
    #[arg(short = 's', group = "titles")]
    pub shorts: bool,
    /// Feature-length and short films.
    #[arg(short = 'f', group = "titles")]
    pub films: bool,

    /// Only the watchlist.
    #[arg(short = 'w', group = "collection")]
    pub watchlist: bool,
    /// Only watched entries.
    #[arg(short = 'W', group = "collection")]
    pub watched: bool,
    /// Only favorites.
    #[arg(short = 'F', group = "collection")]
    pub favorites: bool,

    /// Don't look up missing years on release-date pages.
    #[arg(short = 'y')]
    pub no_dates_fallback: bool,

    /// Number of prefetch workers (1-99).
    #[arg(short = 't', value_name = "N", default_value_t = DEFAULT_WORKERS)]
    pub workers: usize,

    /// Increase logging verbosity (-v, -vv, -vvv).
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,

    /// Site root.
    #[arg(long, hide = true, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    /// The target, always the last positional argument
    pub fn target(&self) -> &str {
        self.positionals.last().map(String::as_str).unwrap_or_default()
    }

    pub fn output_dir(&self) -> Option<PathBuf> {
        match self.positionals.as_slice() {
            [dir, _] => Some(PathBuf::from(dir)),
            _ => None,
        }
    }

    pub fn title_filter(&self) -> TitleFilter {
        if self.series {
            TitleFilter::Series
        } else if self.features {
            TitleFilter::Features
        } else if self.shorts {
            TitleFilter::Shorts
        } else if self.films {
            TitleFilter::Films
        } else {
            TitleFilter::All
        }
    }

    /// The single collection requested, if any
    pub fn collection(&self) -> Option<CollectionKind> {
        if self.watchlist {
            Some(CollectionKind::Watchlist)
        } else if self.watched {
            Some(CollectionKind::Watched)
        } else if self.favorites {
            Some(CollectionKind::Favorites)
        } else {
            None
        }
    }

    /// Build and validate the run configuration
    pub fn to_config(&self) -> Result<ExportConfig, ConfigError> {
        let mut builder = ExportConfig::builder()
            .workers(self.workers)
            .title_filter(self.title_filter())
            .dates_fallback(!self.no_dates_fallback)
            .base_url(self.base_url.clone());
        if let Some(dir) = self.output_dir() {
            builder = builder.output_dir(dir);
        }
        if let Some(kind) = self.collection() {
            builder = builder.only(kind);
        }
        builder.build()
    }
}
