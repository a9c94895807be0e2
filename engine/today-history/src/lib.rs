//! Today-in-History Feed
//!
//! Polls an "on this day in history" API once per day, drops entries that mention
//! deaths or births, and keeps two read models up to date: a daily snapshot with a
//! random pick of the day, and a scroll view that cycles through the filtered list.

pub mod config;
pub mod coordinator;
pub mod error;
pub mod fetcher;
pub mod filter;
pub mod models;
pub mod retry;
pub mod rotator;
pub mod scheduler;
pub mod selector;
pub mod sensors;


pub use crate::config::TodayHistoryConfig;
pub use coordinator::HistoryCoordinator;
pub use error::{HistoryError, Result};
pub use fetcher::{HistoryApi, TodayHistoryFetcher};
pub use models::*;
pub use retry::{RefreshPhase, RetryDecision, RetryMachine, RetryPolicy};
pub use rotator::Rotator;
pub use scheduler::HistoryScheduler;
pub use sensors::{DailySnapshot, ScrollSnapshot, SensorFeed};

/// Title carried by every refresh result
pub const FEED_TITLE: &str = "历史上的今天";

/// Default upstream endpoint
pub const DEFAULT_API_URL: &str = "https://api.tanshuapi.com/api/today_in_history/v1/index";

/// Upper bound on a single API request
pub const REQUEST_TIMEOUT_SECS: u64 = 15;

/// Default rotation interval for the scroll view
pub const DEFAULT_SCROLL_INTERVAL_SECS: u64 = 30;

/// Accepted rotation interval range (inclusive)
pub const MIN_SCROLL_INTERVAL_SECS: u64 = 5;
pub const MAX_SCROLL_INTERVAL_SECS: u64 = 300;

/// Daily refresh trigger, local time
pub const REFRESH_HOUR: u32 = 0;
pub const REFRESH_MINUTE: u32 = 1;

/// Retries after the first failed attempt of a scheduled refresh
pub const DEFAULT_MAX_RETRIES: u32 = 2;

/// Fixed wait between refresh attempts
pub const DEFAULT_RETRY_DELAY_SECS: u64 = 600;
