//! URL layout of the site

use std::sync::LazyLock;

use regex::Regex;
use reqwest::Url;

use crate::{
    config::{CollectionKind, Section},
    error::ConfigError,
};

static ENTRY_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"t([0-9]+)/$").expect("valid regex"));

/// Builds and recognises the site's URLs from its root
#[derive(Debug, Clone)]
pub struct Site {
    base: String,
    host: String,
}

impl Site {
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        let parsed =
            Url::parse(base_url).map_err(|_| ConfigError::InvalidBaseUrl(base_url.to_string()))?;
        let host = parsed
            .host_str()
            .map(bare_host)
            .ok_or_else(|| ConfigError::InvalidBaseUrl(base_url.to_string()))?
            .to_string();

        let mut base = parsed.to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        Ok(Self { base, host })
    }

    /// Site root, always ending in `/`
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Host without any `www.` prefix
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn user_url(&self, user: &str) -> String {
        format!("{}usuario/{}/", self.base, user)
    }

    pub fn list_url(&self, slug: &str) -> String {
        format!("{}listas/{}/", self.base, slug)
    }

    /// First page of one collection in one library section
    pub fn collection_url(&self, user_url: &str, section: Section, kind: CollectionKind) -> String {
        format!(
            "{}{}/{}/",
            user_url,
            section.path_segment(),
            kind.path_segment()
        )
    }

    /// Release-dates page of an entry, when its URL carries a numeric id
    pub fn dates_page_url(&self, entry_url: &str) -> Option<String> {
        ENTRY_ID
            .captures(entry_url)
            .map(|caps| format!("{}estreias-do-filme/{}/", self.base, &caps[1]))
    }

    /// Turn a site-relative link into an absolute URL
    pub fn absolutize(&self, href: &str) -> String {
        match href.strip_prefix('/') {
            Some(path) => format!("{}{}", self.base, path),
            None => href.to_string(),
        }
    }

    /// Whether `url` is an http(s) URL on this site
    pub fn accepts(&self, url: &str) -> bool {
        let Ok(parsed) = Url::parse(url.trim()) else {
            return false;
        };
        matches!(parsed.scheme(), "http" | "https")
            && parsed.host_str().map(bare_host) == Some(self.host.as_str())
    }
}

/// `n`-th page of a paginated listing
pub fn page_url(listing_url: &str, page: usize) -> String {
    format!("{listing_url}?pagina={page}")
}

fn bare_host(host: &str) -> &str {
    host.strip_prefix("www.").unwrap_or(host)
}
