use quiz_core::model::{PrincipalId, QuizResult};
use sqlx::Row;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn position_to_i64(position: usize) -> Result<i64, StorageError> {
    i64::try_from(position).map_err(|_| StorageError::Serialization("position overflow".into()))
}

pub(crate) fn principal_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<PrincipalId, StorageError> {
    let raw: String = row.try_get("principal_id").map_err(ser)?;
    PrincipalId::new(raw).map_err(ser)
}

pub(crate) fn map_result_row(row: &sqlx::sqlite::SqliteRow) -> Result<QuizResult, StorageError> {
    let score = u32_from_i64("score", row.try_get::<i64, _>("score").map_err(ser)?)?;
    let total = u32_from_i64("total", row.try_get::<i64, _>("total").map_err(ser)?)?;
    let percentage_raw: i64 = row.try_get("percentage").map_err(ser)?;
    let percentage = u8::try_from(percentage_raw).map_err(|_| {
        StorageError::Serialization(format!("invalid percentage: {percentage_raw}"))
    })?;
    let taken_at = row.try_get("taken_at").map_err(ser)?;

    QuizResult::from_persisted(score, total, percentage, taken_at).map_err(ser)
}
