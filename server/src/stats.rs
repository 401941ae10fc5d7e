//! Completed/planned counts and percentages from a terms aggregation.

use std::collections::BTreeMap;

use tracing::warn;

use crate::backend::{Aggregation, Bucket, Query, SearchBackend, SearchRequest};
use crate::model::{TodoStats, TodoStatus};

pub const STATUS_AGGREGATION: &str = "status_count";
pub const STATUS_KEYWORD_FIELD: &str = "status.keyword";

/// Terms aggregation over the status keyword, keyed by `STATUS_AGGREGATION`.
pub fn status_aggregation() -> BTreeMap<String, Aggregation> {
    BTreeMap::from([(
        STATUS_AGGREGATION.to_string(),
        Aggregation::Terms {
            field: STATUS_KEYWORD_FIELD.to_string(),
            size: 10,
        },
    )])
}

impl TodoStats {
    /// Fold status buckets into counts; keys other than the two statuses are
    /// ignored, so `completed + planned == total` always holds.
    pub fn from_buckets(buckets: &[Bucket]) -> Self {
        let mut completed = 0;
        let mut planned = 0;
        for bucket in buckets {
            if bucket.key == TodoStatus::Completed.as_str() {
                completed = bucket.doc_count;
            } else if bucket.key == TodoStatus::Planned.as_str() {
                planned = bucket.doc_count;
            }
        }
        let total = completed + planned;
        Self {
            total,
            completed,
            planned,
            completed_percentage: percentage(completed, total),
            planned_percentage: percentage(planned, total),
        }
    }
}

/// `count / total` as a percentage rounded to one decimal; 0 when `total` is 0.
pub fn percentage(count: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (count as f64 / total as f64 * 100.0 * 10.0).round() / 10.0
}

/// Stats over the whole index. Never fails: an absent index or any backend
/// error yields zeroed stats.
pub async fn calculate_stats<B: SearchBackend>(backend: &B, index: &str) -> TodoStats {
    match backend.index_exists(index).await {
        Ok(true) => {}
        Ok(false) => return TodoStats::default(),
        Err(e) => {
            warn!(error = %e, index, "stats: index check failed");
            return TodoStats::default();
        }
    }

    let request = SearchRequest {
        query: Query::MatchAll {},
        sort: Vec::new(),
        from: 0,
        size: 0,
        aggs: status_aggregation(),
    };
    match backend.search(index, &request).await {
        Ok(response) => response
            .aggregations
            .get(STATUS_AGGREGATION)
            .map(|buckets| TodoStats::from_buckets(buckets))
            .unwrap_or_default(),
        Err(e) => {
            warn!(error = %e, index, "stats: aggregation failed");
            TodoStats::default()
        }
    }
}
