use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use crate::error::TrackerError;

pub const LEDGER_HEADER: [&str; 7] = [
    "timestamp_iso",
    "product_name",
    "page_title",
    "url",
    "price",
    "target_price",
    "screenshot_path",
];

/// One timestamped price record, created exactly once per successful
/// extraction and never updated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub observed_at: DateTime<Utc>,
    pub product_name: String,
    pub page_title: String,
    pub url: String,
    pub price: Decimal,
    pub target_price: Decimal,
    pub snapshot_path: PathBuf,
}

impl Observation {
    pub fn timestamp_iso(&self) -> String {
        self.observed_at.to_rfc3339_opts(SecondsFormat::Secs, true)
    }

    pub fn at_or_below_target(&self) -> bool {
        self.price <= self.target_price
    }
}

/// A ledger row as persisted: prices pinned to two decimal places.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LedgerRow {
    pub timestamp_iso: String,
    pub product_name: String,
    pub page_title: String,
    pub url: String,
    pub price: String,
    pub target_price: String,
    pub screenshot_path: String,
}

impl From<&Observation> for LedgerRow {
    fn from(observation: &Observation) -> Self {
        Self {
            timestamp_iso: observation.timestamp_iso(),
            product_name: observation.product_name.clone(),
            page_title: observation.page_title.clone(),
            url: observation.url.clone(),
            price: format!("{:.2}", observation.price),
            target_price: format!("{:.2}", observation.target_price),
            screenshot_path: observation.snapshot_path.to_string_lossy().into_owned(),
        }
    }
}

/// Append-only CSV history of observations. Rows are never updated or
/// deleted, and the file is never truncated or rewritten.
///
/// Concurrent runs against the same ledger path are unsupported: there is no
/// file locking, by design.
pub struct Ledger {
    path: PathBuf,
}

impl Ledger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the directory tree and the header row iff absent. Idempotent,
    /// safe to call every run.
    pub fn ensure_initialized(&self) -> Result<(), TrackerError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        if !self.path.exists() {
            let file = File::create(&self.path)?;
            {
                let mut writer = csv::Writer::from_writer(&file);
                writer.write_record(LEDGER_HEADER)?;
                writer.flush()?;
            }
            file.sync_all()?;
        }
        Ok(())
    }

    /// Append one row in fixed column order and flush durably before
    /// returning. Open-append semantics: a failed append cannot corrupt
    /// previously written rows.
    pub fn append(&self, observation: &Observation) -> Result<(), TrackerError> {
        let file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(csv::Error::from)?;
        {
            let mut writer = csv::WriterBuilder::new()
                .has_headers(false)
                .from_writer(&file);
            writer.serialize(LedgerRow::from(observation))?;
            writer.flush()?;
        }
        file.sync_all()?;
        Ok(())
    }

    /// The most recent `n` rows, oldest first. An uninitialized ledger reads
    /// as empty.
    pub fn tail(&self, n: usize) -> Result<Vec<LedgerRow>, TrackerError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let mut reader = csv::Reader::from_path(&self.path)?;
        let rows = reader
            .deserialize()
            .collect::<Result<Vec<LedgerRow>, _>>()?;
        let skip = rows.len().saturating_sub(n);
        Ok(rows.into_iter().skip(skip).collect())
    }
}
