use thiserror::Error;

/// Failure of a single extraction attempt against a loaded page.
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("element not found: {selector}")]
    ElementNotFound { selector: String },

    #[error("element is empty: {selector}")]
    EmptyElement { selector: String },

    #[error("price not parseable: {text:?}")]
    PriceParse { text: String },

    #[error("page content unavailable: {0}")]
    Content(String),
}

#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("catalog error: {0}")]
    Catalog(String),

    #[error("browser session error: {0}")]
    Session(String),

    #[error("navigation failed for {url}: {message}")]
    NavigationTimeout { url: String, message: String },

    #[error("extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("ledger write failed: {0}")]
    Persistence(#[from] csv::Error),

    #[error("snapshot capture failed: {0}")]
    Snapshot(String),

    #[error("notification failed: {0}")]
    Notification(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
