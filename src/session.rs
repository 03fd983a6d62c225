use async_trait::async_trait;
use headless_chrome::protocol::cdp::Page::CaptureScreenshotFormatOption;
use headless_chrome::{Browser, Tab};
#[cfg(test)]
use mockall::automock;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::config::BrowserConfig;
use crate::error::{ExtractionError, TrackerError};

const PROVISION_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection details for a provisioned browser, decoded once at the
/// provisioning boundary. Downstream code never inspects the raw response.
#[derive(Debug, Clone, Deserialize)]
pub struct BrowserEndpoint {
    cdp_ws_url: String,
}

impl BrowserEndpoint {
    pub fn new(ws_url: impl Into<String>) -> Self {
        Self {
            cdp_ws_url: ws_url.into(),
        }
    }

    pub fn ws_url(&self) -> &str {
        &self.cdp_ws_url
    }
}

/// External capability that hands out fresh browser instances.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn create_session(&self) -> Result<BrowserEndpoint, TrackerError>;
}

/// Provisioning client: POST to the service, read back the remote-debugging
/// endpoint.
pub struct RemoteSessionProvider {
    client: reqwest::Client,
    create_url: Url,
}

impl RemoteSessionProvider {
    pub fn new(create_url: Url) -> Self {
        Self {
            client: reqwest::Client::new(),
            create_url,
        }
    }
}

#[async_trait]
impl SessionProvider for RemoteSessionProvider {
    async fn create_session(&self) -> Result<BrowserEndpoint, TrackerError> {
        let response = self
            .client
            .post(self.create_url.clone())
            .json(&serde_json::json!({}))
            .timeout(PROVISION_TIMEOUT)
            .send()
            .await
            .map_err(|e| TrackerError::Session(format!("provisioning request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(TrackerError::Session(format!(
                "provisioning service returned {}",
                response.status()
            )));
        }

        let endpoint: BrowserEndpoint = response
            .json()
            .await
            .map_err(|e| TrackerError::Session(format!("malformed provisioning response: {}", e)))?;
        debug!(ws_url = %endpoint.ws_url(), "browser session provisioned");
        Ok(endpoint)
    }
}

/// The one loaded page the whole run operates on.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait PageSession: Send + Sync {
    /// Navigate and wait until the page has settled.
    async fn visit(&self, url: &str) -> Result<(), TrackerError>;
    /// Current DOM content of the loaded page.
    async fn content(&self) -> Result<String, TrackerError>;
    /// Full-page PNG capture of the loaded page.
    async fn screenshot(&self) -> Result<Vec<u8>, TrackerError>;
}

/// CDP-backed session: one browser connection, one tab, reused for every
/// product in the run. The connection is released when this is dropped.
pub struct CdpSession {
    _browser: Browser,
    tab: Arc<Tab>,
    settle_timeout: Duration,
}

impl CdpSession {
    pub fn connect(endpoint: &BrowserEndpoint, config: &BrowserConfig) -> Result<Self, TrackerError> {
        let browser = Browser::connect(endpoint.ws_url().to_string())
            .map_err(|e| TrackerError::Session(format!("CDP connect failed: {}", e)))?;
        let tab = browser
            .new_tab()
            .map_err(|e| TrackerError::Session(format!("failed to open tab: {}", e)))?;
        tab.set_user_agent(&config.user_agent, None, None)
            .map_err(|e| TrackerError::Session(format!("failed to set user agent: {}", e)))?;
        tab.set_default_timeout(Duration::from_millis(config.nav_timeout_ms));

        Ok(Self {
            _browser: browser,
            tab,
            settle_timeout: Duration::from_millis(config.settle_timeout_ms),
        })
    }
}

#[async_trait]
impl PageSession for CdpSession {
    async fn visit(&self, url: &str) -> Result<(), TrackerError> {
        self.tab
            .navigate_to(url)
            .map_err(|e| TrackerError::NavigationTimeout {
                url: url.to_string(),
                message: e.to_string(),
            })?;
        self.tab
            .wait_until_navigated()
            .map_err(|e| TrackerError::NavigationTimeout {
                url: url.to_string(),
                message: e.to_string(),
            })?;
        // Closest CDP equivalent of a network-settled wait: the body must be
        // attached within the settle window.
        self.tab
            .wait_for_element_with_custom_timeout("body", self.settle_timeout)
            .map_err(|e| TrackerError::NavigationTimeout {
                url: url.to_string(),
                message: e.to_string(),
            })?;
        Ok(())
    }

    async fn content(&self) -> Result<String, TrackerError> {
        self.tab
            .get_content()
            .map_err(|e| ExtractionError::Content(e.to_string()).into())
    }

    async fn screenshot(&self) -> Result<Vec<u8>, TrackerError> {
        self.tab
            .capture_screenshot(CaptureScreenshotFormatOption::Png, None, None, true)
            .map_err(|e| TrackerError::Snapshot(e.to_string()))
    }
}
