//! Read models handed to the presentation layer
//!
//! The coordinator holds the only senders; everything else gets a
//! `SensorFeed` of `watch` receivers and sees immutable snapshots.

use crate::models::{serialize_optional_record, HistoryRecord, RefreshResult};
use serde::Serialize;
use tokio::sync::watch;

/// Daily sensor: the last successful refresh
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DailySnapshot {
    /// Sensor state, the refresh's `update_time` (empty before the first success)
    pub state: String,
    pub update_time: String,
    pub title: String,
    #[serde(serialize_with = "serialize_optional_record")]
    pub today_item: Option<HistoryRecord>,
    pub history_list: Vec<HistoryRecord>,
    pub total_count: usize,
}

impl From<&RefreshResult> for DailySnapshot {
    fn from(result: &RefreshResult) -> Self {
        Self {
            state: result.update_time.clone(),
            update_time: result.update_time.clone(),
            title: result.title.clone(),
            today_item: result.today_item.clone(),
            history_list: result.history_list.clone(),
            total_count: result.total_count,
        }
    }
}

/// Scroll sensor: the entry shown by the latest rotation tick
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScrollSnapshot {
    /// Sensor state, the calendar date of the cached data
    pub state: String,
    pub title: String,
    pub year: String,
    pub month: String,
    pub day: String,
    pub content: String,
    /// Cursor after the tick, i.e. the index shown next
    pub scroll_index: usize,
    pub total_items: usize,
    pub scroll_interval: u64,
}

impl ScrollSnapshot {
    /// Snapshot before any tick: empty fields, index 0
    pub fn initial(current_date: String, scroll_interval: u64) -> Self {
        Self { state: current_date, scroll_interval, ..Default::default() }
    }

    pub fn from_tick(
        item: HistoryRecord,
        scroll_index: usize,
        total_items: usize,
        current_date: String,
        scroll_interval: u64,
    ) -> Self {
        Self {
            state: current_date,
            title: item.title,
            year: item.year,
            month: item.month,
            day: item.day,
            content: item.content,
            scroll_index,
            total_items,
            scroll_interval,
        }
    }
}

/// Read-only handle on both sensors
#[derive(Debug, Clone)]
pub struct SensorFeed {
    pub daily: watch::Receiver<DailySnapshot>,
    pub scroll: watch::Receiver<ScrollSnapshot>,
}

impl SensorFeed {
    pub fn daily(&self) -> DailySnapshot {
        self.daily.borrow().clone()
    }

    pub fn scroll(&self) -> ScrollSnapshot {
        self.scroll.borrow().clone()
    }
}

/// Write side of the sensors, owned by the coordinator
#[derive(Debug)]
pub(crate) struct SensorPublisher {
    daily: watch::Sender<DailySnapshot>,
    scroll: watch::Sender<ScrollSnapshot>,
}

impl SensorPublisher {
    pub(crate) fn channel(initial_scroll: ScrollSnapshot) -> (Self, SensorFeed) {
        let (daily_tx, daily_rx) = watch::channel(DailySnapshot::default());
        let (scroll_tx, scroll_rx) = watch::channel(initial_scroll);

        (
            Self { daily: daily_tx, scroll: scroll_tx },
            SensorFeed { daily: daily_rx, scroll: scroll_rx },
        )
    }

    pub(crate) fn publish_daily(&self, snapshot: DailySnapshot) {
        // Fine if nobody is listening.
        self.daily.send_replace(snapshot);
    }

    pub(crate) fn publish_scroll(&self, snapshot: ScrollSnapshot) {
        self.scroll.send_replace(snapshot);
    }

    pub(crate) fn update_scroll<F>(&self, modify: F)
    where
        F: FnOnce(&mut ScrollSnapshot),
    {
        self.scroll.send_modify(modify);
    }

    pub(crate) fn subscribe(&self) -> SensorFeed {
        SensorFeed { daily: self.daily.subscribe(), scroll: self.scroll.subscribe() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_scroll_snapshot() {
        let snapshot = ScrollSnapshot::initial("2024-10-01".to_string(), 30);
        assert_eq!(snapshot.state, "2024-10-01");
        assert_eq!(snapshot.scroll_index, 0);
        assert_eq!(snapshot.total_items, 0);
        assert!(snapshot.title.is_empty() && snapshot.content.is_empty());
        assert_eq!(snapshot.scroll_interval, 30);
    }

    #[test]
    fn test_daily_snapshot_attributes() {
        let result = RefreshResult {
            title: "t".to_string(),
            today_item: None,
            history_list: vec![HistoryRecord::default()],
            update_time: "2024-10-01 00:01:00".to_string(),
            current_date: "2024-10-01".to_string(),
            total_count: 1,
        };

        let snapshot = DailySnapshot::from(&result);
        assert_eq!(snapshot.state, "2024-10-01 00:01:00");

        let value = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(value["today_item"], serde_json::json!({}));
        assert_eq!(value["total_count"], 1);
        assert!(value.get("current_date").is_none());
    }

    #[test]
    fn test_publish_reaches_subscribers() {
        let (publisher, feed) = SensorPublisher::channel(ScrollSnapshot::default());
        let late = publisher.subscribe();

        let snapshot = ScrollSnapshot::from_tick(HistoryRecord::placeholder(), 0, 0, "d".to_string(), 5);
        publisher.publish_scroll(snapshot.clone());

        assert_eq!(feed.scroll(), snapshot);
        assert_eq!(late.scroll(), snapshot);
        assert_eq!(feed.daily(), DailySnapshot::default());
    }
}
