use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use sled::{Db, Tree};
use tracing::debug;

use super::schema::SchemaCatalog;
use crate::error::Error;

const SCHEMA_TREE: &str = "catalog:schemas";
const META_TREE: &str = "catalog:meta";
const CURRENT_VERSION_KEY: &[u8] = b"current_version";

/// Versioned catalog persistence on top of sled.
///
/// Every applied catalog gets the next version number; the current one is
/// cached behind an `Arc` so callers building relationship graphs never
/// re-read it from disk.
pub struct CatalogStore {
    schema_tree: Tree,
    meta_tree: Tree,
    current_version: AtomicU64,
    current: RwLock<Option<Arc<SchemaCatalog>>>,
}

impl CatalogStore {
    /// Open the catalog trees inside an existing database.
    pub fn open(db: &Db) -> Result<Self, Error> {
        let schema_tree = db.open_tree(SCHEMA_TREE)?;
        let meta_tree = db.open_tree(META_TREE)?;

        let version = match meta_tree.get(CURRENT_VERSION_KEY)? {
            Some(bytes) => u64::from_be_bytes(bytes.as_ref().try_into().map_err(|_| {
                Error::InvalidData("Invalid catalog version encoding".to_string())
            })?),
            None => 0,
        };

        let current = match version {
            0 => None,
            v => match schema_tree.get(v.to_be_bytes())? {
                Some(bytes) => Some(Arc::new(SchemaCatalog::from_bytes(&bytes)?)),
                None => None,
            },
        };

        Ok(Self {
            schema_tree,
            meta_tree,
            current_version: AtomicU64::new(version),
            current: RwLock::new(current),
        })
    }

    /// The current catalog version, `0` when none has been applied.
    pub fn current_version(&self) -> u64 {
        self.current_version.load(Ordering::Acquire)
    }

    /// The current catalog, if one has been applied.
    pub fn current(&self) -> Option<Arc<SchemaCatalog>> {
        self.current.read().clone()
    }

    /// Load a specific catalog version.
    pub fn at_version(&self, version: u64) -> Result<Option<SchemaCatalog>, Error> {
        match self.schema_tree.get(version.to_be_bytes())? {
            Some(bytes) => Ok(Some(SchemaCatalog::from_bytes(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Persist a catalog as the next version and make it current.
    pub fn apply(&self, catalog: SchemaCatalog) -> Result<u64, Error> {
        let version = self.current_version.load(Ordering::Acquire) + 1;
        let bytes = catalog.to_bytes()?;
        self.schema_tree.insert(version.to_be_bytes(), bytes)?;
        self.meta_tree
            .insert(CURRENT_VERSION_KEY, &version.to_be_bytes())?;
        *self.current.write() = Some(Arc::new(catalog));
        self.current_version.store(version, Ordering::Release);
        debug!(version = version, "applied schema catalog");
        Ok(version)
    }

    /// Flush catalog trees to disk.
    pub fn flush(&self) -> Result<(), Error> {
        self.schema_tree.flush()?;
        self.meta_tree.flush()?;
        Ok(())
    }
}
