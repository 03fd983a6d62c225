use chrono::Utc;
use tracing::{error, info, warn};

use crate::catalog::Product;
use crate::error::TrackerError;
use crate::extractors::{ExtractorRegistry, SiteExtractor};
use crate::ledger::{Ledger, Observation};
use crate::notify::WebhookNotifier;
use crate::retry::{extract_with_retry, RetryPolicy};
use crate::session::PageSession;
use crate::snapshot::SnapshotStore;

/// Outcome counts for one run. The run itself always completes; these make
/// skips and failures visible without turning them into a run failure.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub attempted: usize,
    pub recorded: usize,
    pub skipped_unregistered: usize,
    pub failed: usize,
    pub alerts_sent: usize,
}

/// Sequential per-product pipeline over one shared browser session:
/// navigate, extract with retry, snapshot, persist, notify.
pub struct TrackerRun<'a> {
    pub registry: &'a ExtractorRegistry,
    pub ledger: &'a Ledger,
    pub snapshots: &'a SnapshotStore,
    pub notifier: &'a WebhookNotifier,
    pub retry: RetryPolicy,
}

impl TrackerRun<'_> {
    /// Attempt every product in catalog order. A product's failure is caught
    /// here and logged; the loop always moves on to the next product.
    pub async fn run(&self, session: &dyn PageSession, products: &[Product]) -> RunSummary {
        let mut summary = RunSummary::default();

        for product in products {
            summary.attempted += 1;

            let Some(extractor) = self.registry.get(&product.site) else {
                warn!(
                    product = %product.name,
                    site = %product.site,
                    "no extractor registered for site, skipping"
                );
                summary.skipped_unregistered += 1;
                continue;
            };

            match self.process(session, product, extractor).await {
                Ok(alerted) => {
                    summary.recorded += 1;
                    if alerted {
                        summary.alerts_sent += 1;
                    }
                }
                Err(e) => {
                    error!(
                        product = %product.name,
                        url = %product.url,
                        error = %e,
                        "product check failed, continuing with next"
                    );
                    summary.failed += 1;
                }
            }
        }

        summary
    }

    async fn process(
        &self,
        session: &dyn PageSession,
        product: &Product,
        extractor: &dyn SiteExtractor,
    ) -> Result<bool, TrackerError> {
        info!(product = %product.name, url = %product.url, "visiting");
        session.visit(&product.url).await?;

        let extraction = extract_with_retry(session, extractor, self.retry).await?;
        let observed_at = Utc::now();

        let png = session.screenshot().await?;
        let snapshot_path = self
            .snapshots
            .store(observed_at.timestamp(), &product.site, &png)?;

        let observation = Observation {
            observed_at,
            product_name: product.name.clone(),
            page_title: extraction.title,
            url: product.url.clone(),
            price: extraction.price,
            target_price: product.target_price,
            snapshot_path,
        };
        self.ledger.append(&observation)?;
        info!(
            product = %observation.product_name,
            price = %format!("{:.2}", observation.price),
            target = %format!("{:.2}", observation.target_price),
            "recorded observation"
        );

        let alerted = self.notifier.notify_if_needed(&observation).await;
        Ok(alerted)
    }
}
