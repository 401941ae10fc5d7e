//! Human-readable ages for todo timestamps.

use chrono::{DateTime, Datelike, Utc};

/// Describe how long before `now` the RFC 3339 timestamp `created_at` lies,
/// e.g. "5 minutes ago". Input that does not parse is returned as-is.
pub fn relative_time(created_at: &str, now: DateTime<Utc>) -> String {
    let Ok(created) = DateTime::parse_from_rfc3339(created_at) else {
        return created_at.to_string();
    };
    let created = created.with_timezone(&Utc);
    let elapsed = now.signed_duration_since(created);

    if elapsed.num_seconds() < 60 {
        return "a few seconds ago".to_string();
    }
    if elapsed.num_minutes() < 60 {
        return ago(elapsed.num_minutes(), "minute");
    }
    if elapsed.num_hours() < 24 {
        return ago(elapsed.num_hours(), "hour");
    }

    let months = whole_months(created, now);
    if months < 1 {
        ago(elapsed.num_days(), "day")
    } else if months < 12 {
        ago(months, "month")
    } else {
        ago(months / 12, "year")
    }
}

pub fn relative_time_now(created_at: &str) -> String {
    relative_time(created_at, Utc::now())
}

/// Completed calendar months from `from` to `to`.
fn whole_months(from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
    let mut months = i64::from(to.year() - from.year()) * 12
        + i64::from(to.month()) - i64::from(from.month());
    if (to.day(), to.time()) < (from.day(), from.time()) {
        months -= 1;
    }
    months
}

fn ago(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("1 {unit} ago")
    } else {
        format!("{n} {unit}s ago")
    }
}
