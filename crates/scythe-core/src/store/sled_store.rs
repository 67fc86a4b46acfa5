//! Sled-backed row store.
//!
//! Each table lives in its own sled tree keyed by the encoded primary key.
//! Scope subqueries are resolved here, immediately before a scan, so the
//! rest of the crate can pass filters around without touching storage.

use std::path::PathBuf;

use sled::Db;
use tracing::debug;

use super::codec::{decode_field, decode_row, encode_key, encode_row};
use super::filter::{Filter, FilterEvaluator};
use super::RowStore;
use crate::error::Error;
use crate::value::{Row, Value};

/// Default on-disk cache capacity in bytes.
const DEFAULT_CACHE_CAPACITY: u64 = 64 * 1024 * 1024;

/// Configuration for a [`SledStore`].
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Filesystem path for the database.
    pub path: PathBuf,
    /// Sled page cache capacity in bytes.
    pub cache_capacity: u64,
    /// Keep data in memory only and remove files on drop.
    pub temporary: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./scythe_data"),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            temporary: false,
        }
    }
}

impl StoreConfig {
    /// Configuration rooted at the given path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    /// In-memory configuration for tests and scratch work.
    pub fn temporary() -> Self {
        Self {
            temporary: true,
            ..Default::default()
        }
    }

    /// Set the sled page cache capacity in bytes.
    pub fn with_cache_capacity(mut self, bytes: u64) -> Self {
        self.cache_capacity = bytes;
        self
    }

    pub(crate) fn to_sled_config(&self) -> sled::Config {
        sled::Config::new()
            .path(&self.path)
            .cache_capacity(self.cache_capacity)
            .temporary(self.temporary)
            .use_compression(true)
    }
}

/// Row storage on top of sled, one tree per table.
pub struct SledStore {
    db: Db,
}

impl SledStore {
    /// Open or create a store from the given configuration.
    pub fn open(config: StoreConfig) -> Result<Self, Error> {
        let db = config.to_sled_config().open()?;
        Ok(Self { db })
    }

    /// The underlying sled database, shared with the catalog store.
    pub fn db(&self) -> &Db {
        &self.db
    }

    /// Insert or replace a row under its primary key value.
    pub fn insert(&self, table: &str, key: &Value, row: &Row) -> Result<(), Error> {
        let tree = self.table_tree(table)?;
        tree.insert(encode_key(key)?, encode_row(row)?)?;
        Ok(())
    }

    /// Flush dirty buffers to disk.
    pub fn flush(&self) -> Result<(), Error> {
        self.db.flush()?;
        Ok(())
    }

    fn table_tree(&self, table: &str) -> Result<sled::Tree, Error> {
        Ok(self.db.open_tree(format!("table:{}", table))?)
    }

    /// Replace scope subqueries with materialized value sets.
    fn resolve(&self, filter: &Filter) -> Result<Filter, Error> {
        match filter {
            Filter::InScope { field, scope } => {
                let values =
                    self.select_values(&scope.table, &scope.projection, &scope.filter)?;
                Ok(Filter::In {
                    field: field.clone(),
                    values,
                })
            }
            Filter::And(filters) => {
                let resolved = filters
                    .iter()
                    .map(|f| self.resolve(f))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Filter::And(resolved))
            }
            other => Ok(other.clone()),
        }
    }
}

impl RowStore for SledStore {
    fn select_rows(&self, table: &str, filter: &Filter) -> Result<Vec<Row>, Error> {
        let filter = self.resolve(filter)?;
        let tree = self.table_tree(table)?;
        let mut rows = Vec::new();
        for item in tree.iter() {
            let (_, value) = item?;
            let row = decode_row(&value)?;
            if FilterEvaluator::evaluate(&filter, &row)? {
                rows.push(row);
            }
        }
        Ok(rows)
    }

    fn select_values(&self, table: &str, column: &str, filter: &Filter) -> Result<Vec<Value>, Error> {
        let filter = self.resolve(filter)?;
        let tree = self.table_tree(table)?;
        let mut values = Vec::new();
        for item in tree.iter() {
            let (_, value) = item?;
            let row = decode_row(&value)?;
            if FilterEvaluator::evaluate(&filter, &row)? {
                if let Some(projected) = decode_field(&value, column)? {
                    values.push(projected);
                }
            }
        }
        Ok(values)
    }

    fn delete_all(&self, table: &str, filter: &Filter) -> Result<u64, Error> {
        let filter = self.resolve(filter)?;
        let tree = self.table_tree(table)?;
        let mut keys = Vec::new();
        for item in tree.iter() {
            let (key, value) = item?;
            let row = decode_row(&value)?;
            if FilterEvaluator::evaluate(&filter, &row)? {
                keys.push(key);
            }
        }
        let mut removed = 0u64;
        for key in keys {
            if tree.remove(key)?.is_some() {
                removed += 1;
            }
        }
        debug!(table = %table, rows = removed, "deleted rows");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ScopeQuery;

    fn test_store() -> SledStore {
        SledStore::open(StoreConfig::temporary()).unwrap()
    }

    fn seed_users_and_posts(store: &SledStore) {
        for (id, name) in [(1i64, "alice"), (2, "bob"), (3, "carol")] {
            let row = Row::new().with("id", id).with("name", name);
            store.insert("users", &Value::Int64(id), &row).unwrap();
        }
        for (id, user_id) in [(10i64, 1i64), (11, 1), (12, 2)] {
            let row = Row::new().with("id", id).with("user_id", user_id);
            store.insert("posts", &Value::Int64(id), &row).unwrap();
        }
    }

    #[test]
    fn test_insert_and_select() {
        let store = test_store();
        seed_users_and_posts(&store);

        let all = store.select_rows("users", &Filter::All).unwrap();
        assert_eq!(all.len(), 3);

        let alice = store
            .select_rows("users", &Filter::eq("name", "alice"))
            .unwrap();
        assert_eq!(alice.len(), 1);
        assert_eq!(alice[0].get("id"), Some(&Value::Int64(1)));
    }

    #[test]
    fn test_select_values_projects_column() {
        let store = test_store();
        seed_users_and_posts(&store);

        let mut ids = store
            .select_values("posts", "id", &Filter::eq("user_id", 1i64))
            .unwrap();
        ids.sort_by_key(|v| v.as_i64());
        assert_eq!(ids, vec![Value::Int64(10), Value::Int64(11)]);
    }

    #[test]
    fn test_delete_all_with_subquery() {
        let store = test_store();
        seed_users_and_posts(&store);

        // Delete posts whose author is alice, without listing her id.
        let filter = Filter::in_scope(
            "user_id",
            ScopeQuery {
                table: "users".into(),
                projection: "id".into(),
                filter: Filter::eq("name", "alice"),
            },
        );
        let removed = store.delete_all("posts", &filter).unwrap();
        assert_eq!(removed, 2);

        let left = store.select_rows("posts", &Filter::All).unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].get("user_id"), Some(&Value::Int64(2)));
    }

    #[test]
    fn test_nested_subquery_resolution() {
        let store = test_store();
        seed_users_and_posts(&store);
        for (id, post_id) in [(100i64, 10i64), (101, 12)] {
            let row = Row::new().with("id", id).with("post_id", post_id);
            store.insert("comments", &Value::Int64(id), &row).unwrap();
        }

        let filter = Filter::in_scope(
            "post_id",
            ScopeQuery {
                table: "posts".into(),
                projection: "id".into(),
                filter: Filter::in_scope(
                    "user_id",
                    ScopeQuery {
                        table: "users".into(),
                        projection: "id".into(),
                        filter: Filter::eq("name", "alice"),
                    },
                ),
            },
        );
        let removed = store.delete_all("comments", &filter).unwrap();
        assert_eq!(removed, 1);
    }

    #[test]
    fn test_count_default_impl() {
        let store = test_store();
        seed_users_and_posts(&store);
        assert_eq!(store.count("posts", &Filter::eq("user_id", 1i64)).unwrap(), 2);
    }

    #[test]
    fn test_persistence_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig::new(dir.path());
        {
            let store = SledStore::open(config.clone()).unwrap();
            let row = Row::new().with("id", 1i64);
            store.insert("users", &Value::Int64(1), &row).unwrap();
            store.flush().unwrap();
        }
        let store = SledStore::open(config).unwrap();
        assert_eq!(store.select_rows("users", &Filter::All).unwrap().len(), 1);
    }
}
