use regex::Regex;
use scraper::Html;

use super::{first_text, parse_price, price_pattern, Extraction, SiteExtractor};
use crate::error::ExtractionError;

// books.toscrape.com product page: title in the product_main block, price
// rendered like "£51.77".
const TITLE_SELECTOR: &str = "div.product_main h1";
const PRICE_SELECTOR: &str = ".price_color";

pub struct BooksToScrape {
    price_re: Regex,
}

impl BooksToScrape {
    pub fn new() -> Self {
        Self {
            price_re: price_pattern(),
        }
    }
}

impl Default for BooksToScrape {
    fn default() -> Self {
        Self::new()
    }
}

impl SiteExtractor for BooksToScrape {
    fn site_key(&self) -> &str {
        "books_to_scrape"
    }

    fn extract(&self, doc: &Html) -> Result<Extraction, ExtractionError> {
        let title = first_text(doc, TITLE_SELECTOR)?;
        let raw_price = first_text(doc, PRICE_SELECTOR)?;
        let price = parse_price(&self.price_re, &raw_price)?;
        Ok(Extraction { title, price })
    }
}
