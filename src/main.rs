use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

use pricewatch::catalog::load_catalog;
use pricewatch::config::AppConfig;
use pricewatch::extractors::ExtractorRegistry;
use pricewatch::ledger::Ledger;
use pricewatch::notify::WebhookNotifier;
use pricewatch::retry::RetryPolicy;
use pricewatch::runner::TrackerRun;
use pricewatch::session::{CdpSession, RemoteSessionProvider, SessionProvider};
use pricewatch::snapshot::SnapshotStore;

#[derive(Parser, Debug)]
#[command(name = "pricewatch", version, about = "Track product prices and alert on drops")]
struct Cli {
    /// Path to the product catalog JSON file
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Directory holding the ledger and snapshots
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Number of recent ledger rows to print after the run
    #[arg(long)]
    review_rows: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("pricewatch=info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = AppConfig::from_env()?;
    if let Some(catalog) = cli.catalog {
        config.catalog_path = catalog;
    }
    if let Some(data_dir) = cli.data_dir {
        config.storage.data_dir = data_dir;
    }
    if let Some(rows) = cli.review_rows {
        config.review.rows = rows;
    }

    let products = load_catalog(&config.catalog_path)?;
    info!(products = products.len(), catalog = %config.catalog_path.display(), "catalog loaded");

    let ledger = Ledger::new(config.ledger_path());
    ledger.ensure_initialized()?;
    let snapshots = SnapshotStore::new(config.snapshot_dir());
    snapshots.ensure_initialized()?;

    let registry = ExtractorRegistry::with_default_sites();

    let webhook = config
        .alerts
        .webhook_url
        .as_deref()
        .map(Url::parse)
        .transpose()?;
    let notifier = WebhookNotifier::new(
        webhook,
        Duration::from_secs(config.alerts.request_timeout_secs),
    );
    if !notifier.is_enabled() {
        info!("no alert webhook configured, notifications disabled");
    }

    // One browser session and one tab for the whole run.
    let provider = RemoteSessionProvider::new(Url::parse(&config.browser.session_url)?);
    let endpoint = provider.create_session().await?;
    let session = CdpSession::connect(&endpoint, &config.browser)?;

    let run = TrackerRun {
        registry: &registry,
        ledger: &ledger,
        snapshots: &snapshots,
        notifier: &notifier,
        retry: RetryPolicy::new(config.retry.attempts, config.retry.delay_ms),
    };
    let summary = run.run(&session, &products).await;
    drop(session);

    info!(
        attempted = summary.attempted,
        recorded = summary.recorded,
        skipped = summary.skipped_unregistered,
        failed = summary.failed,
        alerts = summary.alerts_sent,
        "run complete"
    );
    if summary.failed > 0 || summary.skipped_unregistered > 0 {
        warn!(
            skipped = summary.skipped_unregistered,
            failed = summary.failed,
            "some products were not recorded this run"
        );
    }

    print_recent(&ledger, config.review.rows)?;
    Ok(())
}

/// Human review surface: the most recent ledger rows as fixed-width text.
fn print_recent(ledger: &Ledger, rows: usize) -> Result<()> {
    if rows == 0 {
        return Ok(());
    }
    let recent = ledger.tail(rows)?;
    if recent.is_empty() {
        println!("(ledger is empty)");
        return Ok(());
    }

    println!(
        "{:<20}  {:<28}  {:>10}  {:>10}  {}",
        "timestamp", "product", "price", "target", "url"
    );
    for row in recent {
        println!(
            "{:<20}  {:<28}  {:>10}  {:>10}  {}",
            row.timestamp_iso, row.product_name, row.price, row.target_price, row.url
        );
    }
    Ok(())
}
