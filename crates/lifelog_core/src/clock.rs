//! Wall-clock helpers shared by models, repositories and view-models.
//!
//! All timestamps are Unix epoch milliseconds. Day boundaries are UTC.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

pub const MILLIS_PER_DAY: i64 = 86_400_000;

/// Current time in epoch milliseconds.
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Current UTC calendar day.
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Half-open `[start, end)` epoch-ms range covering one UTC day.
pub fn day_range_ms(day: NaiveDate) -> (i64, i64) {
    let start = day.and_time(NaiveTime::MIN).and_utc().timestamp_millis();
    (start, start + MILLIS_PER_DAY)
}

/// UTC calendar day that contains `epoch_ms`.
pub fn day_of(epoch_ms: i64) -> Option<NaiveDate> {
    DateTime::<Utc>::from_timestamp_millis(epoch_ms).map(|value| value.date_naive())
}

#[cfg(test)]
mod tests {
    use super::{day_of, day_range_ms, MILLIS_PER_DAY};
    use chrono::NaiveDate;

    #[test]
    fn day_range_is_half_open_and_one_day_long() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let (start, end) = day_range_ms(day);
        assert_eq!(end - start, MILLIS_PER_DAY);
        assert_eq!(day_of(start), Some(day));
        assert_eq!(day_of(end - 1), Some(day));
        assert_ne!(day_of(end), Some(day));
    }
}
