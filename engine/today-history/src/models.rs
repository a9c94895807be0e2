use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize, Serializer};

/// One entry of the feed after filtering
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub title: String,
    pub year: String,
    pub month: String,
    pub day: String,
    pub content: String,
}

impl HistoryRecord {
    /// Record shown by the scroll view while no data is cached
    pub fn placeholder() -> Self {
        Self {
            title: "no data".to_string(),
            content: "waiting for update".to_string(),
            ..Default::default()
        }
    }
}

/// Outcome of one successful refresh cycle
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefreshResult {
    pub title: String,

    /// Pick of the day; serialized as `{}` when the filtered list was empty
    #[serde(serialize_with = "serialize_optional_record")]
    pub today_item: Option<HistoryRecord>,

    pub history_list: Vec<HistoryRecord>,

    /// Wall-clock time at which the fetch succeeded (`%Y-%m-%d %H:%M:%S`)
    pub update_time: String,

    /// Calendar date used to build the query (`%Y-%m-%d`)
    pub current_date: String,

    pub total_count: usize,
}

pub(crate) fn serialize_optional_record<S>(
    record: &Option<HistoryRecord>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    use serde::ser::SerializeMap;

    match record {
        Some(record) => record.serialize(serializer),
        None => serializer.serialize_map(Some(0))?.end(),
    }
}

/// Events emitted by the refresh scheduler
#[derive(Debug, Clone, Serialize)]
pub enum RefreshEvent {
    /// New data published
    Refreshed {
        count: usize,
        attempts: u32,
        timestamp: DateTime<Local>,
    },

    /// Every attempt of a trigger failed; previous data kept
    RefreshFailed {
        attempts: u32,
        error: String,
        timestamp: DateTime<Local>,
    },

    /// Shutdown arrived while a trigger was in flight
    Cancelled {
        attempts: u32,
    },
}
