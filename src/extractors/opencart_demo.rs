use regex::Regex;
use scraper::Html;

use super::{first_text, parse_price, price_pattern, Extraction, SiteExtractor};
use crate::error::ExtractionError;

// OpenCart demo store: the first h2 in the unstyled list is the current
// price, rendered like "$122.00". Older prices follow it, so only the first
// match counts.
const TITLE_SELECTOR: &str = "div#content h1";
const PRICE_SELECTOR: &str = "ul.list-unstyled h2";

pub struct OpencartDemo {
    price_re: Regex,
}

impl OpencartDemo {
    pub fn new() -> Self {
        Self {
            price_re: price_pattern(),
        }
    }
}

impl Default for OpencartDemo {
    fn default() -> Self {
        Self::new()
    }
}

impl SiteExtractor for OpencartDemo {
    fn site_key(&self) -> &str {
        "opencart_demo"
    }

    fn extract(&self, doc: &Html) -> Result<Extraction, ExtractionError> {
        let title = first_text(doc, TITLE_SELECTOR)?;
        let raw_price = first_text(doc, PRICE_SELECTOR)?;
        let price = parse_price(&self.price_re, &raw_price)?;
        Ok(Extraction { title, price })
    }
}
