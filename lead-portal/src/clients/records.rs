//! Records store: generic table access on the hosted backend.

use super::error::ClientError;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Table-level access to the hosted records API.
///
/// Rows travel as JSON; callers deserialize them into their own record types
/// with [`decode_rows`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecordsStore: Send + Sync {
    /// Insert one row.
    ///
    /// # Errors
    ///
    /// Returns error if the store refuses the row or cannot be reached.
    async fn insert(&self, table: &str, record: Value) -> Result<(), ClientError>;

    /// Fetch every row of `table` ordered by `sort_field`.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    async fn query(
        &self,
        table: &str,
        sort_field: &str,
        ascending: bool,
    ) -> Result<Vec<Value>, ClientError>;

    /// Delete the row with the given id.
    ///
    /// # Errors
    ///
    /// Returns error if the store refuses the delete or cannot be reached.
    async fn delete(&self, table: &str, id: &str) -> Result<(), ClientError>;
}

/// Deserialize raw rows into a typed record, rejecting the whole batch if any
/// row does not match the schema.
///
/// # Errors
///
/// Returns [`ClientError::Decode`] naming the first offending row.
pub fn decode_rows<T: DeserializeOwned>(rows: Vec<Value>) -> Result<Vec<T>, ClientError> {
    rows.into_iter()
        .enumerate()
        .map(|(index, row)| {
            serde_json::from_value(row)
                .map_err(|e| ClientError::Decode(format!("row {index}: {e}")))
        })
        .collect()
}
