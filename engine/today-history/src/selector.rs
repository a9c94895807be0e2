//! Builds the daily refresh result from a filtered list

use crate::models::{HistoryRecord, RefreshResult};
use crate::FEED_TITLE;
use chrono::{DateTime, Local, NaiveDate};
use rand::seq::SliceRandom;
use rand::Rng;

pub const UPDATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Draw the pick of the day uniformly from `records`
pub fn pick_today<R: Rng + ?Sized>(records: &[HistoryRecord], rng: &mut R) -> Option<HistoryRecord> {
    records.choose(rng).cloned()
}

/// Assemble a `RefreshResult`.
///
/// `fetched_at` is the moment the fetch succeeded and `query_date` the day
/// that was requested; neither is taken from the clock here.
pub fn build_result<R: Rng + ?Sized>(
    records: Vec<HistoryRecord>,
    query_date: NaiveDate,
    fetched_at: DateTime<Local>,
    rng: &mut R,
) -> RefreshResult {
    let today_item = pick_today(&records, rng);

    RefreshResult {
        title: FEED_TITLE.to_string(),
        today_item,
        total_count: records.len(),
        history_list: records,
        update_time: fetched_at.format(UPDATE_TIME_FORMAT).to_string(),
        current_date: query_date.format(DATE_FORMAT).to_string(),
    }
}
