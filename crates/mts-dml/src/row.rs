//! Row mapping traits

use crate::error::{MtsError, MtsResult};
use tokio_postgres::Row;

/// Trait for converting a database row into a Rust struct.
///
/// # Example
///
/// ```ignore
/// use mts_dml::{FromRow, MtsResult, RowExt};
/// use tokio_postgres::Row;
///
/// struct User {
///     id: i64,
///     last_name: String,
/// }
///
/// impl FromRow for User {
///     fn from_row(row: &Row) -> MtsResult<Self> {
///         Ok(Self {
///             id: row.try_get_column("id")?,
///             last_name: row.try_get_column("last_name")?,
///         })
///     }
/// }
/// ```
pub trait FromRow: Sized {
    /// Convert a database row into Self
    fn from_row(row: &Row) -> MtsResult<Self>;
}

/// Extension trait for Row to provide typed access
pub trait RowExt {
    /// Try to get a column value, returning MtsError::Decode on failure
    fn try_get_column<T>(&self, column: &str) -> MtsResult<T>
    where
        T: for<'a> tokio_postgres::types::FromSql<'a>;
}

impl RowExt for Row {
    fn try_get_column<T>(&self, column: &str) -> MtsResult<T>
    where
        T: for<'a> tokio_postgres::types::FromSql<'a>,
    {
        self.try_get(column)
            .map_err(|e| MtsError::decode(column, e.to_string()))
    }
}
