//! Row decoding and error translation shared by the repositories.

use std::fmt::Display;

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::{Error, Result};

/// Current time at the precision timestamps are stored with.
pub(crate) fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Encode a timestamp for storage.
///
/// Fixed-width UTC so that text ordering equals time ordering.
pub(crate) fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Decode a required timestamp column.
pub(crate) fn get_timestamp(row: &SqliteRow, column: &'static str) -> Result<DateTime<Utc>> {
    let raw: String = row.try_get(column)?;
    parse_timestamp(column, &raw)
}

/// Decode a nullable timestamp column.
pub(crate) fn get_optional_timestamp(
    row: &SqliteRow,
    column: &'static str,
) -> Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.try_get(column)?;
    raw.map(|value| parse_timestamp(column, &value)).transpose()
}

fn parse_timestamp(column: &'static str, value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|_| Error::CorruptRow {
            column,
            value: value.to_string(),
        })
}

/// Turn a missing row into [`Error::NotFound`].
pub(crate) fn found<T>(row: Option<T>, entity: &'static str, key: impl Display) -> Result<T> {
    row.ok_or_else(|| Error::not_found(entity, key))
}

/// Unwrap the id of an entity that must already be stored.
pub(crate) fn require_id<I>(id: Option<I>, entity: &'static str) -> Result<I> {
    id.ok_or_else(|| Error::validation(format!("{entity} has not been saved yet")))
}

/// Classify a failed INSERT or UPDATE.
///
/// `key` names the value the caller tried to write, for the conflict message.
pub(crate) fn write_error(err: sqlx::Error, entity: &'static str, key: impl Display) -> Error {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return Error::conflict(entity, key);
        }
        if db_err.is_foreign_key_violation() {
            return Error::MissingParent { entity };
        }
        if db_err.is_check_violation() {
            return Error::validation(format!("{entity} violates a constraint: {key}"));
        }
    }
    Error::Database(err)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_roundtrip_at_stored_precision() {
        let at = now();
        assert_eq!(parse_timestamp("created_at", &timestamp(at)).unwrap(), at);
    }

    #[test]
    fn test_timestamp_text_orders_chronologically() {
        let earlier = timestamp(DateTime::from_timestamp(1_000, 0).unwrap());
        let later = timestamp(DateTime::from_timestamp(1_000, 500_000).unwrap());
        assert!(earlier < later);
    }

    #[test]
    fn test_corrupt_timestamp() {
        let err = parse_timestamp("created_at", "yesterday").unwrap_err();
        assert!(matches!(err, Error::CorruptRow { column: "created_at", .. }));
    }
}
