use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("malformed timestamp {0:?}")]
    MalformedTimestamp(String),

    #[error("start date {start} is after end date {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("no record {id} in the {sheet} table")]
    UnknownRecord { sheet: &'static str, id: Uuid },

    #[error("pdf rendering failed: {0}")]
    Render(String),
}

pub type Result<T> = std::result::Result<T, Error>;
