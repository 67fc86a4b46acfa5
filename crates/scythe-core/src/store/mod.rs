//! Row storage for deletion scopes.

mod codec;
mod filter;
mod sled_store;

pub use filter::{Filter, FilterEvaluator, ScopeQuery};
pub use sled_store::{SledStore, StoreConfig};

use crate::error::Error;
use crate::value::{Row, Value};

/// Relational access needed by the deletion engine.
///
/// The engine only ever reads rows inside a scope, projects a column out
/// of them, and deletes them. Anything that can answer those three
/// questions can back a deletion plan.
pub trait RowStore {
    /// Rows of `table` matching `filter`.
    fn select_rows(&self, table: &str, filter: &Filter) -> Result<Vec<Row>, Error>;

    /// The named column of each matching row, skipping rows without it.
    fn select_values(&self, table: &str, column: &str, filter: &Filter)
        -> Result<Vec<Value>, Error>;

    /// Delete all matching rows, returning how many were removed.
    fn delete_all(&self, table: &str, filter: &Filter) -> Result<u64, Error>;

    /// Number of rows matching `filter`.
    fn count(&self, table: &str, filter: &Filter) -> Result<u64, Error> {
        Ok(self.select_rows(table, filter)?.len() as u64)
    }
}
