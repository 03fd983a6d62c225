use regex::Regex;
use rust_decimal::Decimal;
use scraper::{Html, Selector};
use std::collections::HashMap;
use std::str::FromStr;

use crate::error::ExtractionError;

mod books_to_scrape;
mod opencart_demo;

pub use books_to_scrape::BooksToScrape;
pub use opencart_demo::OpencartDemo;

/// What a single successful extraction yields.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub title: String,
    pub price: Decimal,
}

/// One site's markup assumptions: a fixed query path for the title, one for
/// the price, and a currency-stripping numeric parse.
pub trait SiteExtractor: Send + Sync {
    fn site_key(&self) -> &str;
    fn extract(&self, doc: &Html) -> Result<Extraction, ExtractionError>;
}

/// Dispatch table from site key to extractor, built once at startup.
pub struct ExtractorRegistry {
    extractors: HashMap<String, Box<dyn SiteExtractor>>,
}

impl ExtractorRegistry {
    pub fn new() -> Self {
        Self {
            extractors: HashMap::new(),
        }
    }

    /// Registry with every built-in site. Adding a site means adding one
    /// extractor impl and one `register` call here.
    pub fn with_default_sites() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(BooksToScrape::new()));
        registry.register(Box::new(OpencartDemo::new()));
        registry
    }

    pub fn register(&mut self, extractor: Box<dyn SiteExtractor>) {
        self.extractors
            .insert(extractor.site_key().to_string(), extractor);
    }

    pub fn get(&self, site: &str) -> Option<&dyn SiteExtractor> {
        self.extractors.get(site).map(|e| e.as_ref())
    }

    pub fn site_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.extractors.keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn price_pattern() -> Regex {
    Regex::new(r"(\d{1,3}(?:,\d{3})+(?:\.\d+)?|\d+(?:\.\d+)?)").unwrap()
}

/// First matching element's text, trimmed. Absent and empty elements are
/// distinct failures so skip logs say exactly what broke.
pub(crate) fn first_text(doc: &Html, selector: &str) -> Result<String, ExtractionError> {
    let parsed = Selector::parse(selector).map_err(|_| ExtractionError::ElementNotFound {
        selector: selector.to_string(),
    })?;
    let element = doc
        .select(&parsed)
        .next()
        .ok_or_else(|| ExtractionError::ElementNotFound {
            selector: selector.to_string(),
        })?;
    let text = element.text().collect::<Vec<_>>().join(" ").trim().to_string();
    if text.is_empty() {
        return Err(ExtractionError::EmptyElement {
            selector: selector.to_string(),
        });
    }
    Ok(text)
}

/// Strip the currency symbol and thousands separators, parse the remainder
/// as a decimal.
pub(crate) fn parse_price(pattern: &Regex, raw: &str) -> Result<Decimal, ExtractionError> {
    let captures = pattern
        .captures(raw)
        .ok_or_else(|| ExtractionError::PriceParse {
            text: raw.to_string(),
        })?;
    let digits = captures
        .get(1)
        .map(|m| m.as_str().replace(',', ""))
        .unwrap_or_default();
    Decimal::from_str(&digits).map_err(|_| ExtractionError::PriceParse {
        text: raw.to_string(),
    })
}
