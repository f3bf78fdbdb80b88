//! Error types for fetching, configuration, target resolution and export
//!
//! Fetch failures never escape the prefetch layer: they are absorbed into an
//! empty page body. The remaining errors are fatal to the run and each one
//! maps to a distinct process exit code.
//!
//! # Examples
//!
//! ```ignore
//! use filmow_export::{ExportError, TargetError};
//!
//! match exporter.run(&target).await {
//!     Ok(summary) => println!("{} tables written", summary.tables.len()),
//!     Err(err) => {
//!         eprintln!("{err}");
//!         std::process::exit(err.exit_code());
//!     }
//! }
//! ```

use std::path::PathBuf;

/// Boxed transport error, so fetchers other than reqwest can report failures
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors produced by a single HTTP attempt
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The request never produced a response (connect error, timeout, reset)
    #[error("request to '{url}' failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: BoxError,
    },

    /// The server answered with a non-success status
    ///
    /// Status failures are final and are not retried.
    #[error("'{url}' answered with status {status}")]
    Status { url: String, status: u16 },

    /// The response body could not be read
    #[error("failed to read body of '{url}': {source}")]
    Body {
        url: String,
        #[source]
        source: BoxError,
    },
}

impl FetchError {
    pub fn transport(url: impl Into<String>, source: impl Into<BoxError>) -> Self {
        FetchError::Transport {
            url: url.into(),
            source: source.into(),
        }
    }

    /// Whether another attempt may succeed
    pub fn is_transient(&self) -> bool {
        !matches!(self, FetchError::Status { .. })
    }
}

/// Errors that can occur while validating the export configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Worker count must be between 1 and 99
    #[error("Invalid number of threads: {0}")]
    InvalidWorkerCount(usize),

    /// Output directory must exist
    #[error("Invalid output directory: {}", .0.display())]
    InvalidOutputDir(PathBuf),

    /// Site root could not be parsed as an absolute URL
    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(String),
}

/// Errors raised while resolving the user supplied target
#[derive(Debug, thiserror::Error)]
pub enum TargetError {
    /// Input is neither a file, a username, a list id nor a site URL
    #[error("Invalid username or URL: {0}")]
    Invalid(String),

    /// Existence probe failed at the transport level
    #[error("Couldn't reach {url}")]
    Unreachable {
        url: String,
        #[source]
        source: FetchError,
    },

    /// Existence probe answered outside 200..=203
    #[error("Got a {status} response from {url}")]
    UnexpectedStatus { url: String, status: u16 },

    /// Local list file could not be read
    #[error("Couldn't read '{}'", path.display())]
    UnreadableFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Top level error of an export run
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Target(#[from] TargetError),

    /// Building the HTTP client failed
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// A CSV table could not be written
    #[error("failed to write '{}': {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// Flushing a CSV table to disk failed
    #[error("failed to write '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ExportError {
    /// Process exit code for this failure class
    pub fn exit_code(&self) -> i32 {
        match self {
            ExportError::Config(ConfigError::InvalidOutputDir(_)) => 1,
            ExportError::Config(ConfigError::InvalidWorkerCount(_)) => 2,
            ExportError::Config(ConfigError::InvalidBaseUrl(_)) => 2,
            ExportError::Target(_) => 3,
            ExportError::Client(_) => 4,
            ExportError::Csv { .. } | ExportError::Io { .. } => 4,
        }
    }
}
