//! Conversions between domain values and `SQLite` column values.

use std::str::FromStr;

use campushub_domain::statistics::Bucket;
use campushub_domain::time::Timestamp;

/// Wrap any parse failure into a sqlx decode error.
pub(crate) fn decode_err<E>(err: E) -> sqlx::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    sqlx::Error::Decode(Box::new(err))
}

pub(crate) fn parse<T>(value: &str) -> Result<T, sqlx::Error>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    T::from_str(value).map_err(decode_err)
}

pub(crate) fn parse_opt<T>(value: Option<String>) -> Result<Option<T>, sqlx::Error>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value.as_deref().map(parse).transpose()
}

pub(crate) fn parse_timestamp(value: &str) -> Result<Timestamp, sqlx::Error> {
    chrono::DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.to_utc())
        .map_err(decode_err)
}

pub(crate) fn parse_timestamp_opt(value: Option<String>) -> Result<Option<Timestamp>, sqlx::Error> {
    value.as_deref().map(parse_timestamp).transpose()
}

/// Stored counters are never negative.
pub(crate) fn to_u64(value: i64) -> Result<u64, sqlx::Error> {
    u64::try_from(value).map_err(decode_err)
}

pub(crate) fn to_u32(value: i64) -> Result<u32, sqlx::Error> {
    u32::try_from(value).map_err(decode_err)
}

pub(crate) fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// Turn `(key, count)` rows into buckets following the order of `all`.
pub(crate) fn histogram<K>(all: &[K], rows: Vec<(String, i64)>) -> Result<Vec<Bucket<K>>, sqlx::Error>
where
    K: FromStr + Copy + PartialEq,
    K::Err: std::error::Error + Send + Sync + 'static,
{
    let mut parsed = Vec::with_capacity(rows.len());
    for (key, count) in rows {
        parsed.push((parse::<K>(&key)?, to_u64(count)?));
    }
    Ok(all
        .iter()
        .filter_map(|key| {
            parsed
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, count)| Bucket::new(*key, *count))
        })
        .filter(|bucket| bucket.count > 0)
        .collect())
}
