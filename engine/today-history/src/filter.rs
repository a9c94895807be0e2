//! Keyword filter applied to raw API records

use crate::models::HistoryRecord;
use serde_json::Value;
use tracing::debug;

/// Entries whose content contains any of these are dropped.
///
/// Matching is a literal, case-sensitive substring test, so a keyword also
/// matches inside longer words.
pub const FORBIDDEN_KEYWORDS: [&str; 12] = [
    "去世", "逝世", "诞辰", "病故", "病逝", "死亡", "出生", "身亡", "自杀", "长逝", "长辞", "葬",
];

/// Whether `content` mentions a forbidden keyword
pub fn is_forbidden(content: &str) -> bool {
    FORBIDDEN_KEYWORDS.iter().any(|keyword| content.contains(keyword))
}

/// Drop forbidden entries and project the rest onto `HistoryRecord`, keeping input order
pub fn filter_records(raw: &[Value]) -> Vec<HistoryRecord> {
    let mut filtered = Vec::with_capacity(raw.len());
    let mut dropped = 0usize;

    for item in raw {
        if !item.is_object() {
            debug!("Skipping non-object entry in history list: {}", item);
            dropped += 1;
            continue;
        }

        let content = field_as_string(item, "content");
        if is_forbidden(&content) {
            dropped += 1;
            continue;
        }

        filtered.push(HistoryRecord {
            title: field_as_string(item, "title"),
            year: field_as_string(item, "year"),
            month: field_as_string(item, "month"),
            day: field_as_string(item, "day"),
            content,
        });
    }

    debug!("Filtered history list: kept {}, dropped {}", filtered.len(), dropped);
    filtered
}

/// Read a field as text; missing and null become ""
fn field_as_string(item: &Value, field: &str) -> String {
    match item.get(field) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
