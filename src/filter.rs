use chrono::{NaiveDate, NaiveDateTime};
use log::warn;

use crate::error::{Error, Result};
use crate::models::{Recorded, TIMESTAMP_FORMAT};

pub fn parse_timestamp(raw: &str) -> Result<NaiveDate> {
    NaiveDateTime::parse_from_str(raw.trim(), TIMESTAMP_FORMAT)
        .map(|dt| dt.date())
        .map_err(|_| Error::MalformedTimestamp(raw.to_string()))
}

// Inclusive bounds, input order preserved. A malformed timestamp skips the
// row; one bad row must not abort the whole report.
pub fn filter_by_date<R: Recorded + Clone>(records: &[R], start: NaiveDate, end: NaiveDate) -> Vec<R> {
    records
        .iter()
        .filter(|record| match parse_timestamp(record.recorded_at()) {
            Ok(date) => start <= date && date <= end,
            Err(_) => {
                warn!(
                    "skipping record with malformed timestamp {:?}",
                    record.recorded_at()
                );
                false
            }
        })
        .cloned()
        .collect()
}
