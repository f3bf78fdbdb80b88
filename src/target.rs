//! Resolution of the user supplied export target

use std::{
    fs,
    path::{Path, PathBuf},
    sync::LazyLock,
    time::Duration,
};

use regex::Regex;
use reqwest::Url;

use crate::{
    error::{FetchError, TargetError},
    fetch::Fetcher,
    site::Site,
};

static LIST_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^listas/([^/\s]+)/?$").expect("valid regex"));
static USER_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^usuario/([^/\s]+)(/.*)?$").expect("valid regex"));
static LIST_SLUG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_-]+-l[0-9]+$").expect("valid regex"));
static USER_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_-]+$").expect("valid regex"));

/// What an export run reads from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Local file with one entry URL per line
    ListFile { path: PathBuf, name: String },
    /// A user's library
    User { url: String, name: String },
    /// A user made list
    List { url: String, name: String },
}

impl Target {
    /// Name used in output file names
    pub fn name(&self) -> &str {
        match self {
            Target::ListFile { name, .. } | Target::User { name, .. } | Target::List { name, .. } => {
                name
            }
        }
    }

    /// URL probed before the run, `None` for local files
    pub fn remote_url(&self) -> Option<&str> {
        match self {
            Target::ListFile { .. } => None,
            Target::User { url, .. } | Target::List { url, .. } => Some(url),
        }
    }
}

/// Classify `input` as a local file, a user or a list
///
/// Usernames and list ids given without a URL are lowercased.
pub fn parse_target(input: &str, site: &Site) -> Result<Target, TargetError> {
    let input = input.trim();

    let path = Path::new(input);
    if path.is_file() {
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        return Ok(Target::ListFile {
            path: path.to_path_buf(),
            name,
        });
    }

    if let Some(site_path) = path_on_site(input, site) {
        if let Some(caps) = LIST_PATH.captures(&site_path) {
            let slug = &caps[1];
            return Ok(Target::List {
                url: site.list_url(slug),
                name: slug.to_string(),
            });
        }
        if let Some(caps) = USER_PATH.captures(&site_path) {
            let user = &caps[1];
            return Ok(Target::User {
                url: site.user_url(user),
                name: user.to_string(),
            });
        }
        return Err(TargetError::Invalid(input.to_string()));
    }

    if LIST_SLUG.is_match(input) {
        let slug = input.to_lowercase();
        return Ok(Target::List {
            url: site.list_url(&slug),
            name: slug,
        });
    }
    if USER_NAME.is_match(input) {
        let user = input.to_lowercase();
        return Ok(Target::User {
            url: site.user_url(&user),
            name: user,
        });
    }

    Err(TargetError::Invalid(input.to_string()))
}

/// Path of `input` below the site root, when `input` is a URL on the site
///
/// The scheme may be omitted.
fn path_on_site(input: &str, site: &Site) -> Option<String> {
    let candidate = if input.contains("://") {
        input.to_string()
    } else if input.contains('/') {
        format!("https://{input}")
    } else {
        return None;
    };

    let url = Url::parse(&candidate).ok()?;
    if !site.accepts(url.as_str()) {
        return None;
    }
    Some(url.path().trim_start_matches('/').to_string())
}

/// Check that a remote target exists
///
/// Redirects are followed; a final status outside `200..=203` is rejected.
pub async fn probe(fetcher: &dyn Fetcher, url: &str, timeout: Duration) -> Result<(), TargetError> {
    match fetcher.head(url, timeout).await {
        Ok(status) if (200..=203).contains(&status) => Ok(()),
        Ok(status) | Err(FetchError::Status { status, .. }) => Err(TargetError::UnexpectedStatus {
            url: url.to_string(),
            status,
        }),
        Err(source) => Err(TargetError::Unreachable {
            url: url.to_string(),
            source,
        }),
    }
}

/// Contents of a local list file
pub fn read_list_file(path: &Path) -> Result<String, TargetError> {
    fs::read_to_string(path).map_err(|source| TargetError::UnreadableFile {
        path: path.to_path_buf(),
        source,
    })
}
