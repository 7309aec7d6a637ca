use chrono::{DateTime, Utc};

/// Label used when an item has no usable publish date.
pub const RECENTLY: &str = "Recently";

const MINUTE: i64 = 60;
const HOUR: i64 = 60 * MINUTE;
const DAY: i64 = 24 * HOUR;
const WEEK: i64 = 7 * DAY;

/// Formats the time elapsed between `published` and `now` as a bucketed label
/// such as "3 hours ago". Future dates are reported as "Just now".
pub fn time_ago(now: DateTime<Utc>, published: DateTime<Utc>) -> String {
    let seconds = (now - published).num_seconds();

    if seconds < MINUTE {
        "Just now".to_string()
    } else if seconds < HOUR {
        ago(seconds / MINUTE, "minute")
    } else if seconds < DAY {
        ago(seconds / HOUR, "hour")
    } else if seconds < WEEK {
        ago(seconds / DAY, "day")
    } else {
        ago(seconds / WEEK, "week")
    }
}

fn ago(count: i64, unit: &str) -> String {
    let suffix = if count == 1 { "" } else { "s" };
    format!("{} {}{} ago", count, unit, suffix)
}
