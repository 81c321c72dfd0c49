//! proptest strategies for status histories and issue dates.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use proptest::prelude::*;

use print_fulfillment::PrintRequestStatus;

pub fn status_strategy() -> impl Strategy<Value = PrintRequestStatus> {
    proptest::sample::select(PrintRequestStatus::ALL.to_vec())
}

/// Status appends with second offsets from a fixed origin; offsets repeat
/// often enough to exercise ties.
pub fn appends_strategy() -> impl Strategy<Value = Vec<(PrintRequestStatus, i64)>> {
    prop::collection::vec((status_strategy(), 0i64..20), 1..30)
}

pub fn origin() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 2, 12, 0, 0).unwrap()
}

pub fn at(offset_seconds: i64) -> DateTime<Utc> {
    origin() + Duration::seconds(offset_seconds)
}

/// Any date from 2020 through 2035
pub fn issue_date_strategy() -> impl Strategy<Value = NaiveDate> {
    (0i64..(16 * 365)).prop_map(|days| {
        NaiveDate::from_ymd_opt(2020, 1, 1).unwrap() + Duration::days(days)
    })
}

pub fn holidays_strategy() -> impl Strategy<Value = Vec<NaiveDate>> {
    prop::collection::vec(issue_date_strategy(), 0..40)
}
