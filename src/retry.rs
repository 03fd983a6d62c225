use scraper::Html;
use std::time::Duration;
use tokio_retry::strategy::FixedInterval;
use tokio_retry::Retry;
use tracing::debug;

use crate::error::TrackerError;
use crate::extractors::{Extraction, SiteExtractor};
use crate::session::PageSession;

/// Bounded fixed-interval retry. No backoff, no jitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(attempts: u32, delay_ms: u64) -> Self {
        Self {
            attempts,
            delay: Duration::from_millis(delay_ms),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(2, 1_000)
    }
}

/// Run the extractor against the already-loaded page, re-reading the DOM on
/// each attempt. Navigation state is never reset here; this tolerates flaky
/// selector resolution, not flaky navigation. The last error propagates
/// unchanged.
pub async fn extract_with_retry(
    session: &dyn PageSession,
    extractor: &dyn SiteExtractor,
    policy: RetryPolicy,
) -> Result<Extraction, TrackerError> {
    let retries = policy.attempts.saturating_sub(1) as usize;
    let strategy = FixedInterval::new(policy.delay).take(retries);

    Retry::spawn(strategy, move || async move {
        let html = session.content().await?;
        let doc = Html::parse_document(&html);
        let result = extractor.extract(&doc).map_err(TrackerError::from);
        if let Err(e) = &result {
            debug!(site = %extractor.site_key(), error = %e, "extraction attempt failed");
        }
        result
    })
    .await
}
