use crate::error::Error;
use crate::store::{Filter, RowStore, ScopeQuery};
use crate::value::{Row, Value};

/// The concrete rows one deletion node covers during a run.
///
/// A scope is a table plus a filter; it reads nothing until asked. Child
/// scopes embed their parent's projection as a subquery, so a deep tree
/// stays a description of row sets rather than a pile of id lists.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionScope {
    table: String,
    primary_key: String,
    filter: Filter,
}

impl ExecutionScope {
    pub(crate) fn new(
        table: impl Into<String>,
        primary_key: impl Into<String>,
        filter: Filter,
    ) -> Self {
        Self {
            table: table.into(),
            primary_key: primary_key.into(),
            filter,
        }
    }

    /// Table the scope reads from.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Primary key column of the table.
    pub fn primary_key(&self) -> &str {
        &self.primary_key
    }

    /// Filter selecting the scope's rows.
    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    /// The scope as a subquery projecting `column`.
    pub(crate) fn project(&self, column: &str) -> ScopeQuery {
        ScopeQuery {
            table: self.table.clone(),
            projection: column.to_string(),
            filter: self.filter.clone(),
        }
    }

    /// Materialize the scope's rows.
    pub fn rows(&self, store: &dyn RowStore) -> Result<Vec<Row>, Error> {
        store.select_rows(&self.table, &self.filter)
    }

    /// Materialize the scope's primary key values.
    pub fn ids(&self, store: &dyn RowStore) -> Result<Vec<Value>, Error> {
        store.select_values(&self.table, &self.primary_key, &self.filter)
    }

    /// Count the scope's rows.
    pub fn count(&self, store: &dyn RowStore) -> Result<u64, Error> {
        store.count(&self.table, &self.filter)
    }
}

/// Scope view handed to hooks and custom handlers.
///
/// Reads are lazy; a hook that never looks at the rows costs nothing.
pub struct HookScope<'a> {
    scope: &'a ExecutionScope,
    store: &'a dyn RowStore,
}

impl<'a> HookScope<'a> {
    pub(crate) fn new(scope: &'a ExecutionScope, store: &'a dyn RowStore) -> Self {
        Self { scope, store }
    }

    /// Table the scope reads from.
    pub fn table(&self) -> &str {
        self.scope.table()
    }

    /// Primary key column of the table.
    pub fn primary_key(&self) -> &str {
        self.scope.primary_key()
    }

    /// Filter selecting the scope's rows.
    pub fn filter(&self) -> &Filter {
        self.scope.filter()
    }

    /// Materialize the scope's rows.
    pub fn rows(&self) -> Result<Vec<Row>, Error> {
        self.scope.rows(self.store)
    }

    /// Materialize the scope's primary key values.
    pub fn ids(&self) -> Result<Vec<Value>, Error> {
        self.scope.ids(self.store)
    }

    /// Count the scope's rows.
    pub fn count(&self) -> Result<u64, Error> {
        self.scope.count(self.store)
    }

    /// Delete every row in scope, returning how many were removed.
    pub fn delete(&self) -> Result<u64, Error> {
        self.store.delete_all(self.scope.table(), self.scope.filter())
    }

    /// The store backing the run, for handlers that touch other tables.
    pub fn store(&self) -> &dyn RowStore {
        self.store
    }
}
