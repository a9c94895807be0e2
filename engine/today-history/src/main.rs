use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;
use today_history::{
    HistoryCoordinator, HistoryScheduler, RefreshEvent, RetryPolicy, SensorFeed, TodayHistoryConfig,
    TodayHistoryFetcher,
};
use tokio::sync::{mpsc, watch};
use tokio::time::timeout;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

const SHUTDOWN_TIMEOUT_SECS: u64 = 20;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting today-in-history feed");

    // Load configuration
    let config = TodayHistoryConfig::load().context("Failed to load configuration")?;
    info!("Loaded configuration: {:?}", config);

    let fetcher = TodayHistoryFetcher::new(&config.api).context("Failed to create API client")?;
    let coordinator =
        HistoryCoordinator::new(Arc::new(fetcher), config.display.scroll_interval_secs);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (events_tx, events_rx) = mpsc::unbounded_channel();

    let scheduler = HistoryScheduler::new(
        coordinator,
        RetryPolicy::default(),
        config.scroll_interval(),
        shutdown_rx,
    )
    .with_events(events_tx);

    let presenter = tokio::spawn(present(scheduler.feed(), events_rx));
    let mut scheduler_handle = tokio::spawn(scheduler.run());

    tokio::select! {
        _ = wait_for_shutdown_signal() => {}
        result = &mut scheduler_handle => {
            presenter.abort();
            return match result {
                Ok(_) => Err(anyhow::anyhow!("Scheduler stopped unexpectedly")),
                Err(e) => Err(anyhow::anyhow!("Scheduler task failed: {}", e)),
            };
        }
    }

    info!("Starting graceful shutdown...");
    let _ = shutdown_tx.send(true);

    match timeout(Duration::from_secs(SHUTDOWN_TIMEOUT_SECS), scheduler_handle).await {
        Ok(Ok(coordinator)) => {
            info!("Scheduler stopped gracefully (last data: {})", coordinator.current_date());
        }
        Ok(Err(e)) => {
            error!("Scheduler task failed: {}", e);
        }
        Err(_) => {
            warn!("Scheduler did not stop within timeout, forcing shutdown");
        }
    }

    presenter.abort();
    info!("Graceful shutdown complete");
    Ok(())
}

/// Resolve on Ctrl+C, or SIGTERM on Unix
async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    result = tokio::signal::ctrl_c() => {
                        if let Err(e) = result {
                            error!("Failed to listen for Ctrl+C signal: {}", e);
                        }
                        info!("Ctrl+C signal received");
                    }
                    _ = sigterm.recv() => info!("SIGTERM signal received"),
                }
                return;
            }
            Err(e) => error!("Failed to register SIGTERM handler: {}", e),
        }
    }

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl+C signal: {}", e);
    }
    info!("Ctrl+C signal received");
}

/// Presentation layer: log sensor changes and refresh outcomes
async fn present(mut feed: SensorFeed, mut events: mpsc::UnboundedReceiver<RefreshEvent>) {
    loop {
        tokio::select! {
            changed = feed.daily.changed() => {
                if changed.is_err() {
                    break;
                }
                let daily = feed.daily.borrow_and_update().clone();
                let pick = daily.today_item.as_ref().map(|item| item.title.as_str()).unwrap_or("-");
                info!(
                    "Daily sensor: {} ({} entries, updated {}), pick of the day: {}",
                    daily.title, daily.total_count, daily.state, pick
                );
                if let Ok(json) = serde_json::to_string(&daily) {
                    debug!("Daily sensor attributes: {}", json);
                }
            }

            changed = feed.scroll.changed() => {
                if changed.is_err() {
                    break;
                }
                let scroll = feed.scroll.borrow_and_update().clone();
                info!(
                    "Scroll sensor [{}] {}/{}: {}-{}-{} {} | {}",
                    scroll.state,
                    scroll.scroll_index,
                    scroll.total_items,
                    scroll.year,
                    scroll.month,
                    scroll.day,
                    scroll.title,
                    scroll.content
                );
            }

            Some(event) = events.recv() => match event {
                RefreshEvent::Refreshed { count, attempts, timestamp } => {
                    info!("Refresh succeeded at {} with {} entries after {} attempt(s)", timestamp, count, attempts);
                }
                RefreshEvent::RefreshFailed { attempts, error, timestamp } => {
                    warn!("Refresh gave up at {} after {} attempts ({}); showing previous data", timestamp, attempts, error);
                }
                RefreshEvent::Cancelled { attempts } => {
                    info!("Refresh cancelled during attempt {}", attempts);
                }
            },
        }
    }
}
