use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::TrackerError;

/// One product to track, loaded from the catalog file.
///
/// `site` selects the extractor; a key with no registered extractor means
/// the product is skipped, not that the run fails.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    pub name: String,
    pub url: String,
    pub target_price: Decimal,
    pub site: String,
}

/// Load the ordered product catalog. A missing or malformed file is fatal.
pub fn load_catalog(path: &Path) -> Result<Vec<Product>, TrackerError> {
    let raw = fs::read_to_string(path).map_err(|e| {
        TrackerError::Catalog(format!("cannot read catalog {}: {}", path.display(), e))
    })?;
    let products: Vec<Product> = serde_json::from_str(&raw).map_err(|e| {
        TrackerError::Catalog(format!("malformed catalog {}: {}", path.display(), e))
    })?;
    Ok(products)
}
