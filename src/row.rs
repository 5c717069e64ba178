use std::collections::HashMap;
use std::sync::Arc;

use crate::value::Value;

/// Summary of a non-query execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunResult {
    /// Rows affected by the most recent execution.
    pub changes: u64,
    /// Rowid generated by the most recent insert; meaningful only for
    /// inserts into rowid tables.
    pub last_insert_rowid: i64,
}

/// One row of a query result.
///
/// Column names are in declaration order and shared across every row of a
/// result set, together with a name-to-index cache for lookups by name.
#[derive(Debug, Clone)]
pub struct Row {
    column_names: Arc<Vec<String>>,
    values: Vec<Value>,
    column_index_cache: Arc<HashMap<String, usize>>,
}

impl Row {
    pub(crate) fn from_parts(
        column_names: Arc<Vec<String>>,
        column_index_cache: Arc<HashMap<String, usize>>,
        values: Vec<Value>,
    ) -> Self {
        Self {
            column_names,
            values,
            column_index_cache,
        }
    }

    /// Column names in declaration order.
    #[must_use]
    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    /// Get the index of a column by name.
    #[must_use]
    pub fn column_index(&self, column_name: &str) -> Option<usize> {
        self.column_index_cache.get(column_name).copied()
    }

    /// Get a value by column name.
    ///
    /// When a query yields duplicate column names (`select a, a from t`), the
    /// name maps to its last occurrence; positional access via
    /// [`Row::get_by_index`] sees every column.
    #[must_use]
    pub fn get(&self, column_name: &str) -> Option<&Value> {
        self.column_index(column_name).and_then(|i| self.values.get(i))
    }

    /// Get a value by column position.
    #[must_use]
    pub fn get_by_index(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Values of this row in column order.
    #[must_use]
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Consume the row, keeping the values in column order.
    #[must_use]
    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}
