use anyhow::Context;
use std::sync::Arc;
use today_history::{HistoryCoordinator, TodayHistoryConfig, TodayHistoryFetcher};
use tracing::{error, info};

/// Run a single refresh against the configured API and print both sensors.
/// Useful to check an API key before starting the service.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    info!("Testing today-in-history fetch");

    let config = TodayHistoryConfig::load().context("Failed to load configuration")?;
    let fetcher = TodayHistoryFetcher::new(&config.api)?;
    let mut coordinator =
        HistoryCoordinator::new(Arc::new(fetcher), config.display.scroll_interval_secs);
    let feed = coordinator.feed();

    match coordinator.refresh().await {
        Ok(count) => {
            info!("✅ Successfully fetched {} entries after filtering", count);
        }
        Err(e) => {
            error!("❌ Fetch failed: {}", e);
            return Err(e.into());
        }
    }

    coordinator.rotate();

    println!("{}", serde_json::to_string_pretty(&feed.daily())?);
    println!("{}", serde_json::to_string_pretty(&feed.scroll())?);

    Ok(())
}
