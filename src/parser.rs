//! Page field extraction
//!
//! The pipeline only depends on [`PageParser`]; [`FilmowParser`] holds the
//! selector rules for the site's current markup. Every method takes an
//! already parsed page and returns plain values, with empty strings for
//! anything that is missing.

use scraper::Html;

use crate::{
    backend::ElementRef,
    entry::{TitleType, deduplicate},
    extract,
};

/// Titles shorter than this many minutes are classified as shorts
pub const SHORT_RUNTIME_LIMIT: u32 = 45;

/// Field extraction for entry pages, list pages and release-date pages
pub trait PageParser: Send + Sync {
    /// Original title of an entry
    fn title(&self, page: &Html) -> String;

    /// World premiere year shown on the entry page itself
    fn year(&self, page: &Html) -> String;

    /// Directors, deduplicated and joined with `", "`
    fn directors(&self, page: &Html) -> String;

    /// Runtime in minutes, digits only
    fn runtime(&self, page: &Html) -> String;

    /// Active breadcrumb item, lowercase
    fn breadcrumb(&self, page: &Html) -> Option<String>;

    /// Links to entries on a list or library page, as found in the markup
    fn entry_links(&self, page: &Html) -> Vec<String>;

    /// User ratings on a library page, one per rated slot, in page order
    fn ratings(&self, page: &Html) -> Vec<String>;

    /// Number of pages of a user's library section
    fn library_page_count(&self, page: &Html) -> usize;

    /// Number of pages of a user made list
    fn list_page_count(&self, page: &Html) -> usize;

    /// World premiere year listed on a release-dates page
    fn dates_page_year(&self, page: &Html) -> String;
}

/// Classify an entry from its breadcrumb and runtime
pub fn infer_title_type(breadcrumb: Option<&str>, runtime: &str) -> Option<TitleType> {
    match breadcrumb? {
        "séries" | "tv" => Some(TitleType::Series),
        "filmes" => match runtime.parse::<u32>() {
            Ok(minutes) if minutes < SHORT_RUNTIME_LIMIT => Some(TitleType::Short),
            _ => Some(TitleType::Film),
        },
        _ => None,
    }
}

/// Selector rules for filmow.com
#[derive(Debug, Clone, Copy, Default)]
pub struct FilmowParser;

impl FilmowParser {
    const OTHER_TITLES_COUNTRY: &'static str = "Estados Unidos da América";
    const WORLD_PREMIERE_LABEL: &'static str = "Estreia Mundial";
    const WORLD_PREMIERE_ROW: &'static str = "Mundial";
    const DIRECTED_BY: &'static str = "dirigido por:";

    pub fn new() -> Self {
        Self
    }

    fn entry_count(page: &Html) -> usize {
        let root = page.root_element();
        let Some(stats) = root.find("div.list_stats") else {
            return 0;
        };
        let paragraphs = stats.find_all("p");
        let Some(counts) = paragraphs.get(1) else {
            return 0;
        };
        counts
            .find("span:not([class])")
            .and_then(|span| span.text_content().parse().ok())
            .unwrap_or(0)
    }
}

impl PageParser for FilmowParser {
    fn title(&self, page: &Html) -> String {
        let root = page.root_element();
        if let Some(original) = root.find("h2.movie-original-title") {
            return original.text_content();
        }
        let Some(others) = root.find("div.movie-other-titles") else {
            return String::new();
        };
        others
            .find_all("li")
            .into_iter()
            .find(|item| {
                item.find("em")
                    .is_some_and(|country| country.text_content() == Self::OTHER_TITLES_COUNTRY)
            })
            .and_then(|item| item.find("strong"))
            .map(|strong| strong.text_content())
            .unwrap_or_default()
    }

    fn year(&self, page: &Html) -> String {
        let root = page.root_element();
        let Some(release) = root.find("div.item.release_date") else {
            return String::new();
        };
        if !release.text_content().starts_with(Self::WORLD_PREMIERE_LABEL) {
            return String::new();
        }
        release
            .find("div")
            .map(|date| extract::trailing_year(&date.raw_text()))
            .unwrap_or_default()
    }

    fn directors(&self, page: &Html) -> String {
        let root = page.root_element();
        let Some(block) = root.find("div.directors") else {
            return String::new();
        };
        let mut names: Vec<String> = block
            .find_all("strong")
            .iter()
            .map(|strong| strong.raw_text())
            .collect();
        if names
            .first()
            .is_some_and(|label| label.trim().to_lowercase() == Self::DIRECTED_BY)
        {
            names.remove(0);
        }
        deduplicate(names)
            .iter()
            .map(|name| extract::strip_disambiguation(name))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn runtime(&self, page: &Html) -> String {
        page.root_element()
            .find("span.running_time")
            .map(|span| extract::leading_digits(&span.raw_text()))
            .unwrap_or_default()
    }

    fn breadcrumb(&self, page: &Html) -> Option<String> {
        page.root_element()
            .find_all("li.active")
            .iter()
            .map(|item| item.text_content())
            .find(|text| !text.contains('\n'))
            .map(|text| text.to_lowercase())
    }

    fn entry_links(&self, page: &Html) -> Vec<String> {
        page.root_element()
            .find_all("a[data-movie-pk]")
            .iter()
            .filter(|anchor| anchor.attribute("data-movie-pk").is_some_and(|pk| !pk.is_empty()))
            .filter_map(|anchor| anchor.attribute("href").map(str::to_string))
            .collect()
    }

    fn ratings(&self, page: &Html) -> Vec<String> {
        page.root_element()
            .find_all("div.user-rating")
            .iter()
            .map(|rating| {
                let style = rating
                    .find("div.average")
                    .and_then(|average| average.attribute("style").map(str::to_string));
                extract::rating_from_style(style.as_deref())
            })
            .collect()
    }

    fn library_page_count(&self, page: &Html) -> usize {
        page.root_element()
            .find_all(r#"a[href*="?pagina="]"#)
            .iter()
            .filter_map(|anchor| anchor.attribute("href"))
            .filter_map(|href| href.rsplit('=').next())
            .filter_map(|number| number.trim().parse::<usize>().ok())
            .max()
            .unwrap_or(1)
    }

    fn list_page_count(&self, page: &Html) -> usize {
        let per_page = self.entry_links(page).len();
        if per_page == 0 {
            return 1;
        }
        Self::entry_count(page).div_ceil(per_page)
    }

    fn dates_page_year(&self, page: &Html) -> String {
        page.root_element()
            .find_all("tr")
            .iter()
            .map(|row| row.find_all("td"))
            .filter(|cells| cells.len() >= 3)
            .find(|cells| cells[0].raw_text() == Self::WORLD_PREMIERE_ROW)
            .map(|cells| extract::last_four(&cells[1].raw_text()))
            .unwrap_or_default()
    }
}
