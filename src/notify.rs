use reqwest::Client;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::error::TrackerError;
use crate::ledger::Observation;

/// Threshold-gated webhook alerts. The endpoint is fixed at construction;
/// `None` means alerts are disabled and every check is a silent no-op.
pub struct WebhookNotifier {
    client: Client,
    endpoint: Option<Url>,
    request_timeout: Duration,
}

impl WebhookNotifier {
    pub fn new(endpoint: Option<Url>, request_timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            endpoint,
            request_timeout,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.endpoint.is_some()
    }

    fn message(observation: &Observation) -> String {
        format!(
            "Price alert: {} is {:.2} (target {:.2})\n{}",
            observation.product_name, observation.price, observation.target_price, observation.url
        )
    }

    /// Dispatch an alert iff the observed price is at or below target and an
    /// endpoint is configured. Returns whether an alert was delivered.
    /// Delivery failures are logged as warnings and never escalate.
    pub async fn notify_if_needed(&self, observation: &Observation) -> bool {
        let Some(endpoint) = &self.endpoint else {
            return false;
        };
        if !observation.at_or_below_target() {
            return false;
        }

        match self.dispatch(endpoint, observation).await {
            Ok(()) => {
                debug!(product = %observation.product_name, "alert dispatched");
                true
            }
            Err(e) => {
                warn!(
                    product = %observation.product_name,
                    error = %e,
                    "alert webhook delivery failed"
                );
                false
            }
        }
    }

    async fn dispatch(
        &self,
        endpoint: &Url,
        observation: &Observation,
    ) -> Result<(), TrackerError> {
        let payload = json!({ "text": Self::message(observation) });
        self.client
            .post(endpoint.clone())
            .timeout(self.request_timeout)
            .json(&payload)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use std::path::PathBuf;
    use std::str::FromStr;
    use wiremock::matchers::{body_partial_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn observation(price: &str, target: &str) -> Observation {
        Observation {
            observed_at: Utc::now(),
            product_name: "A Light in the Attic".to_string(),
            page_title: "A Light in the Attic | Books".to_string(),
            url: "https://books.toscrape.com/catalogue/a-light-in-the-attic_1000/index.html"
                .to_string(),
            price: Decimal::from_str(price).unwrap(),
            target_price: Decimal::from_str(target).unwrap(),
            snapshot_path: PathBuf::from("data/snapshots/1714559400_books_to_scrape.png"),
        }
    }

    fn notifier_for(server: &MockServer) -> WebhookNotifier {
        WebhookNotifier::new(
            Some(Url::parse(&server.uri()).unwrap()),
            Duration::from_secs(10),
        )
    }

    #[tokio::test]
    async fn test_alert_sent_when_price_below_target() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({
                "text": "Price alert: A Light in the Attic is 45.00 (target 50.00)\nhttps://books.toscrape.com/catalogue/a-light-in-the-attic_1000/index.html"
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let notifier = notifier_for(&server);
        assert!(notifier.notify_if_needed(&observation("45.00", "50.00")).await);
    }

    #[tokio::test]
    async fn test_alert_sent_when_price_equals_target() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let notifier = notifier_for(&server);
        assert!(notifier.notify_if_needed(&observation("50.00", "50.00")).await);
    }

    #[tokio::test]
    async fn test_no_alert_when_price_above_target() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let notifier = notifier_for(&server);
        assert!(!notifier.notify_if_needed(&observation("55.00", "50.00")).await);
    }

    #[tokio::test]
    async fn test_unconfigured_endpoint_is_silent_noop() {
        let notifier = WebhookNotifier::new(None, Duration::from_secs(10));
        assert!(!notifier.is_enabled());
        assert!(!notifier.notify_if_needed(&observation("45.00", "50.00")).await);
    }

    #[tokio::test]
    async fn test_delivery_failure_is_swallowed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let notifier = notifier_for(&server);
        // non-2xx is a warning, not an error
        assert!(!notifier.notify_if_needed(&observation("45.00", "50.00")).await);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_swallowed() {
        let notifier = WebhookNotifier::new(
            Some(Url::parse("http://127.0.0.1:1/hook").unwrap()),
            Duration::from_millis(200),
        );
        assert!(!notifier.notify_if_needed(&observation("45.00", "50.00")).await);
    }

    #[test]
    fn test_message_formats_two_decimals() {
        let message = WebhookNotifier::message(&observation("45.5", "50"));
        assert!(message.contains("is 45.50 (target 50.00)"));
    }
}
