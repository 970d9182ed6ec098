use heapless::String as HeaplessString;
use internship_core_api::{PrincipalKind, PrincipalRef};
use internship_core_db::error::{StoreError, StoreResult};
use serde::de::DeserializeOwned;
use sqlx::{postgres::PgRow, Row};
use std::str::FromStr;

/// A trait for converting a database row into a model.
pub trait TryFromRow<R>: Sized {
    /// Performs the conversion.
    fn try_from_row(row: &R) -> StoreResult<Self>;
}

/// Retrieves a required `HeaplessString` from a row.
pub fn get_heapless_string<const N: usize>(
    row: &PgRow,
    col_name: &str,
) -> StoreResult<HeaplessString<N>> {
    let s: String = row.try_get(col_name)?;
    HeaplessString::from_str(s.trim_end()).map_err(|_| {
        StoreError::Decode(format!(
            "Value for column '{col_name}' is too long (max {N} chars)"
        ))
    })
}

/// Retrieves a principal reference stored as a (kind, id) column pair. Both
/// columns are null together.
pub fn get_optional_principal(
    row: &PgRow,
    kind_col: &str,
    id_col: &str,
) -> StoreResult<Option<PrincipalRef>> {
    let kind: Option<PrincipalKind> = row.try_get(kind_col)?;
    let id: Option<i64> = row.try_get(id_col)?;
    match (kind, id) {
        (Some(kind), Some(id)) => Ok(Some(PrincipalRef::new(kind, id))),
        (None, None) => Ok(None),
        _ => Err(StoreError::Decode(format!(
            "Columns '{kind_col}' and '{id_col}' must be set together"
        ))),
    }
}

pub fn get_principal(row: &PgRow, kind_col: &str, id_col: &str) -> StoreResult<PrincipalRef> {
    get_optional_principal(row, kind_col, id_col)?
        .ok_or_else(|| StoreError::Decode(format!("Column '{kind_col}' is null")))
}

/// Retrieves a JSONB column as a typed value.
pub fn get_json<T: DeserializeOwned>(row: &PgRow, col_name: &str) -> StoreResult<T> {
    let value: serde_json::Value = row.try_get(col_name)?;
    serde_json::from_value(value)
        .map_err(|e| StoreError::Decode(format!("Column '{col_name}': {e}")))
}

pub fn to_json<T: serde::Serialize>(value: &T) -> StoreResult<serde_json::Value> {
    serde_json::to_value(value).map_err(|e| StoreError::Internal(e.to_string()))
}
