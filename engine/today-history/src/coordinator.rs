//! Owner of the cached refresh result and rotation state

use crate::error::Result;
use crate::fetcher::HistoryApi;
use crate::filter::filter_records;
use crate::models::RefreshResult;
use crate::rotator::Rotator;
use crate::selector::{build_result, DATE_FORMAT};
use crate::sensors::{DailySnapshot, ScrollSnapshot, SensorFeed, SensorPublisher};
use chrono::{Local, NaiveDate};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use tracing::{debug, info};

/// Single writer for the feed state.
///
/// Refreshes and rotation ticks both go through `&mut self`, so the scheduler
/// task that owns the coordinator is the only place state changes. Readers
/// use the `SensorFeed` returned by [`HistoryCoordinator::feed`].
pub struct HistoryCoordinator {
    api: Arc<dyn HistoryApi>,
    rng: StdRng,
    latest: Option<RefreshResult>,
    rotator: Rotator,
    scroll_interval_secs: u64,
    sensors: SensorPublisher,
}

impl HistoryCoordinator {
    /// Create a coordinator with an entropy-seeded pick source
    pub fn new(api: Arc<dyn HistoryApi>, scroll_interval_secs: u64) -> Self {
        Self::with_rng(api, scroll_interval_secs, StdRng::from_entropy())
    }

    /// Create a coordinator with an explicit pick source
    pub fn with_rng(api: Arc<dyn HistoryApi>, scroll_interval_secs: u64, rng: StdRng) -> Self {
        let initial = ScrollSnapshot::initial(today_string(), scroll_interval_secs);
        let (sensors, _) = SensorPublisher::channel(initial);

        Self {
            api,
            rng,
            latest: None,
            rotator: Rotator::default(),
            scroll_interval_secs,
            sensors,
        }
    }

    /// Subscribe to the sensors
    pub fn feed(&self) -> SensorFeed {
        self.sensors.subscribe()
    }

    /// Last successful refresh, if any
    pub fn latest(&self) -> Option<&RefreshResult> {
        self.latest.as_ref()
    }

    pub fn rotator(&self) -> &Rotator {
        &self.rotator
    }

    /// Run one fetch/filter/select cycle for today's local date
    pub async fn refresh(&mut self) -> Result<usize> {
        self.refresh_for(Local::now().date_naive()).await
    }

    /// Run one fetch/filter/select cycle for `date`.
    ///
    /// On error nothing is touched: the previous result, the rotation list
    /// and the cursor stay as they were.
    pub async fn refresh_for(&mut self, date: NaiveDate) -> Result<usize> {
        let raw = self.api.fetch_day(date).await?;
        let fetched_at = Local::now();

        let records = filter_records(&raw);
        let result = build_result(records, date, fetched_at, &mut self.rng);
        let count = result.total_count;

        self.rotator.reset(result.history_list.clone());
        self.sensors.publish_daily(DailySnapshot::from(&result));

        // The scroll sensor keeps showing its last entry until the next tick,
        // but its date and list size follow the new data right away.
        let current_date = result.current_date.clone();
        self.sensors.update_scroll(|scroll| {
            scroll.state = current_date;
            scroll.total_items = count;
        });

        info!(
            "Published {} history entries for {} ({} raw, update_time {})",
            count,
            result.current_date,
            raw.len(),
            result.update_time
        );
        self.latest = Some(result);
        Ok(count)
    }

    /// Advance the scroll view by one entry and publish it
    pub fn rotate(&mut self) -> ScrollSnapshot {
        let item = self.rotator.advance();
        let snapshot = ScrollSnapshot::from_tick(
            item,
            self.rotator.cursor(),
            self.rotator.len(),
            self.current_date(),
            self.scroll_interval_secs,
        );

        debug!("Scroll tick: index {} of {}: {}", snapshot.scroll_index, snapshot.total_items, snapshot.title);
        self.sensors.publish_scroll(snapshot.clone());
        snapshot
    }

    /// Date of the cached data, or today if nothing has been fetched yet
    pub fn current_date(&self) -> String {
        match &self.latest {
            Some(result) => result.current_date.clone(),
            None => today_string(),
        }
    }
}

fn today_string() -> String {
    Local::now().date_naive().format(DATE_FORMAT).to_string()
}
