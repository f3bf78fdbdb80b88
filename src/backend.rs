//! Thin query layer over `scraper` used by the page parser

use scraper::{Html, Selector};

/// An HTML node that can be queried with CSS selectors
///
/// Queries only look below the node: a block is never its own match, so
/// `block.find("div")` on a `div` returns the first nested `div`. Invalid
/// selectors behave like selectors that match nothing, so a typo in a rule
/// degrades to an empty field rather than a failed run.
pub trait ElementRef: Sized {
    /// First descendant matching `selector`
    fn find(&self, selector: &str) -> Option<Self>;

    /// All descendants matching `selector`, in document order
    fn find_all(&self, selector: &str) -> Vec<Self>;

    /// Concatenated text of this node and its descendants, trimmed
    fn text_content(&self) -> String {
        self.raw_text().trim().to_string()
    }

    /// Untrimmed concatenated text
    fn raw_text(&self) -> String;

    /// Value of an attribute
    fn attribute(&self, name: &str) -> Option<&str>;
}

impl<'a> ElementRef for scraper::ElementRef<'a> {
    fn find(&self, selector: &str) -> Option<Self> {
        let selector = Selector::parse(selector).ok()?;
        self.select(&selector).find(|found| found.id() != self.id())
    }

    fn find_all(&self, selector: &str) -> Vec<Self> {
        match Selector::parse(selector) {
            Ok(selector) => self
                .select(&selector)
                .filter(|found| found.id() != self.id())
                .collect(),
            Err(_) => Vec::new(),
        }
    }

    fn raw_text(&self) -> String {
        self.text().collect()
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        self.value().attr(name)
    }
}

/// Parse a full page
pub fn parse_page(body: &str) -> Html {
    Html::parse_document(body)
}
