//! Progress and warning reporting for collection runs
//!
//! The collector reports what it is doing through [`CollectObserver`]; the
//! binary registers a [`ProgressLine`] that keeps a single overwriting status
//! line on stdout and emits warnings through `tracing`.
//!
//! # Example
//!
//! ```ignore
//! use filmow_export::CollectObserver;
//!
//! struct CountFailures(std::sync::atomic::AtomicUsize);
//!
//! impl CollectObserver for CountFailures {
//!     fn on_fetch_failed(&self, _url: &str) {
//!         self.0.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
//!     }
//! }
//! ```

use std::{
    io::{self, IsTerminal, Write},
    path::Path,
    sync::Arc,
};

use tracing::{info, warn};

use crate::entry::truncated_url;

const LINE_WIDTH: usize = 80;
const URL_WIDTH: usize = 55;

/// Receives collection events; every method defaults to doing nothing
pub trait CollectObserver: Send + Sync {
    /// A listing is about to be scanned
    fn on_listing_started(&self, _url: &str) {}

    /// The first page of a listing could not be fetched
    fn on_listing_unreachable(&self, _url: &str) {}

    /// Entry `position` of `total` is being read
    fn on_entry(&self, _position: usize, _total: usize, _url: &str) {}

    /// An entry page could not be fetched
    fn on_fetch_failed(&self, _url: &str) {}

    /// An entry page has no recognisable title
    fn on_missing_title(&self, _url: &str) {}

    /// A category finished reading
    fn on_category_finished(&self, _total: usize) {}

    /// A table was written to disk
    fn on_table_written(&self, _path: &Path, _rows: usize) {}
}

/// Fans events out to every registered observer
#[derive(Clone, Default)]
pub struct ObserverRegistry {
    observers: Vec<Arc<dyn CollectObserver>>,
}

impl ObserverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, observer: Arc<dyn CollectObserver>) {
        self.observers.push(observer);
    }

    pub fn notify_listing_started(&self, url: &str) {
        for observer in &self.observers {
            observer.on_listing_started(url);
        }
    }

    pub fn notify_listing_unreachable(&self, url: &str) {
        for observer in &self.observers {
            observer.on_listing_unreachable(url);
        }
    }

    pub fn notify_entry(&self, position: usize, total: usize, url: &str) {
        for observer in &self.observers {
            observer.on_entry(position, total, url);
        }
    }

    pub fn notify_fetch_failed(&self, url: &str) {
        for observer in &self.observers {
            observer.on_fetch_failed(url);
        }
    }

    pub fn notify_missing_title(&self, url: &str) {
        for observer in &self.observers {
            observer.on_missing_title(url);
        }
    }

    pub fn notify_category_finished(&self, total: usize) {
        for observer in &self.observers {
            observer.on_category_finished(total);
        }
    }

    pub fn notify_table_written(&self, path: &Path, rows: usize) {
        for observer in &self.observers {
            observer.on_table_written(path, rows);
        }
    }
}

/// Terminal reporter: one overwriting status line plus logged warnings
#[derive(Debug)]
pub struct ProgressLine {
    styled: bool,
}

impl ProgressLine {
    pub fn new() -> Self {
        Self {
            styled: io::stdout().is_terminal(),
        }
    }

    fn redraw(&self, text: &str) {
        let mut out = io::stdout().lock();
        let _ = write!(out, "\r{text}");
        let _ = out.flush();
    }

    /// Blank the status line so a warning starts on a clean line
    fn clear(&self) {
        self.redraw(&format!("{:LINE_WIDTH$}\r", ""));
    }

    fn finish_line(&self, text: &str) {
        let mut out = io::stdout().lock();
        let _ = writeln!(out, "\r{text:LINE_WIDTH$}");
        let _ = out.flush();
    }
}

impl Default for ProgressLine {
    fn default() -> Self {
        Self::new()
    }
}

impl CollectObserver for ProgressLine {
    fn on_listing_started(&self, url: &str) {
        info!(url, "collecting entries");
    }

    fn on_listing_unreachable(&self, url: &str) {
        self.clear();
        warn!(url, "couldn't reach listing");
    }

    fn on_entry(&self, position: usize, total: usize, url: &str) {
        let counter = format!("{position}/{total}");
        let url = truncated_url(url, URL_WIDTH);
        if self.styled {
            self.redraw(&format!("Reading entry {counter:<11}\x1b[2m{url}\x1b[0m"));
        } else {
            self.redraw(&format!("Reading entry {counter:<11}{url}"));
        }
    }

    fn on_fetch_failed(&self, url: &str) {
        self.clear();
        warn!(url, "couldn't access entry");
    }

    fn on_missing_title(&self, url: &str) {
        self.clear();
        warn!(url, "couldn't fetch title");
    }

    fn on_category_finished(&self, total: usize) {
        self.finish_line(&format!("Finished reading {total} entries"));
    }

    fn on_table_written(&self, path: &Path, rows: usize) {
        info!(path = %path.display(), rows, "table saved");
    }
}
