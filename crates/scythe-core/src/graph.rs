//! Relationship graph over a schema catalog.
//!
//! The graph resolves each entity's declared relationships and infers the
//! reverse of every direct relationship pointing at it. Inferred reverse
//! relationships are what let a deletion plan name `child: "comments"`
//! against an entity that never declared a `comments` collection; the
//! referencing entity's table supplies the name and the foreign key.
//!
//! Resolution is pure catalog work. All lookups that can fail do so here,
//! before any row is read, so a bad plan never starts deleting.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use crate::catalog::{DeclaredKind, EntityDef, RelationshipDef, SchemaCatalog};
use crate::error::Error;

/// How a resolved relationship came to be.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RelationshipKind {
    /// Declared on the entity; the entity holds the foreign key.
    Direct,
    /// Declared on the entity; the target holds the foreign key.
    Collection,
    /// Inferred from a direct relationship declared on another entity.
    InferredReverse,
}

impl std::fmt::Display for RelationshipKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RelationshipKind::Direct => write!(f, "direct"),
            RelationshipKind::Collection => write!(f, "collection"),
            RelationshipKind::InferredReverse => write!(f, "inferred"),
        }
    }
}

/// A fully resolved relationship, ready to orient a deletion scope.
#[derive(Debug, Clone, PartialEq)]
pub struct Relationship {
    /// Name the relationship answers to in plans. Inferred reverse
    /// relationships are named after the referencing entity's table.
    pub name: String,
    /// Declared or inferred origin.
    pub kind: RelationshipKind,
    /// Target entity name.
    pub target: String,
    /// Target entity's backing table.
    pub target_table: String,
    /// Foreign key column. On the owner for direct relationships, on the
    /// target for collections and inferred reverses.
    pub foreign_key: String,
    /// Key column the foreign key refers to.
    pub local_key: String,
}

/// A direct relationship some other entity declared at this one.
struct IncomingRef {
    source: String,
    source_table: String,
    foreign_key: String,
}

/// Resolved relationship sets for every entity of one catalog version.
///
/// Construction walks the catalog once to index incoming references;
/// per-entity resolution is lazy and cached.
pub struct RelationshipGraph {
    catalog: Arc<SchemaCatalog>,
    incoming: HashMap<String, Vec<IncomingRef>>,
    cache: DashMap<String, Arc<Vec<Relationship>>>,
}

impl RelationshipGraph {
    /// Build a graph over the given catalog.
    pub fn new(catalog: Arc<SchemaCatalog>) -> Self {
        let mut incoming: HashMap<String, Vec<IncomingRef>> = HashMap::new();
        for entity in catalog.entities() {
            for rel in catalog.own_relationships(&entity.name) {
                if rel.kind != DeclaredKind::Direct || rel.is_through() || rel.polymorphic {
                    continue;
                }
                let Some(foreign_key) = rel.foreign_key.clone() else {
                    continue;
                };
                incoming
                    .entry(rel.target.clone())
                    .or_default()
                    .push(IncomingRef {
                        source: entity.name.clone(),
                        source_table: entity.table.clone(),
                        foreign_key,
                    });
            }
        }
        Self {
            catalog,
            incoming,
            cache: DashMap::new(),
        }
    }

    /// The catalog this graph resolves against.
    pub fn catalog(&self) -> &SchemaCatalog {
        &self.catalog
    }

    /// The full relationship set of an entity: declared relationships in
    /// declaration order, then inferred reverses in catalog order.
    pub fn relationships(&self, entity: &str) -> Result<Arc<Vec<Relationship>>, Error> {
        if let Some(cached) = self.cache.get(entity) {
            return Ok(Arc::clone(&cached));
        }
        let resolved = Arc::new(self.resolve_entity(entity)?);
        self.cache
            .insert(entity.to_string(), Arc::clone(&resolved));
        Ok(resolved)
    }

    /// Resolve one relationship by the name a plan would use.
    ///
    /// Own declarations match by name first; the merged set is then
    /// scanned by target table, which is also how inferred reverses are
    /// named. Through relationships are rejected rather than silently
    /// flattened.
    pub fn find(&self, entity: &str, name: &str) -> Result<Relationship, Error> {
        let def = self.catalog.entity(entity).ok_or_else(|| Error::EntityNotFound {
            name: entity.to_string(),
        })?;

        if let Some(rel) = self
            .catalog
            .own_relationships(entity)
            .into_iter()
            .find(|r| r.name == name)
        {
            if rel.is_through() {
                return Err(Error::ThroughNotSupported {
                    entity: entity.to_string(),
                    name: name.to_string(),
                });
            }
            if !rel.polymorphic {
                return self.resolve_declared(def, rel);
            }
            // Polymorphic declarations cannot orient a scope; the name may
            // still resolve through inference below.
        }

        if let Some(rel) = self
            .relationships(entity)?
            .iter()
            .find(|r| r.target_table == name)
        {
            return Ok(rel.clone());
        }

        Err(Error::AssociationNotDefined {
            entity: entity.to_string(),
            name: name.to_string(),
        })
    }

    /// Look up an entity by name, falling back to its table name.
    pub fn entity_or_table(&self, name: &str) -> Result<&EntityDef, Error> {
        self.catalog
            .entity(name)
            .or_else(|| self.catalog.entity_by_table(name))
            .ok_or_else(|| Error::EntityNotFound {
                name: name.to_string(),
            })
    }

    fn resolve_entity(&self, name: &str) -> Result<Vec<Relationship>, Error> {
        let entity = self.catalog.entity(name).ok_or_else(|| Error::EntityNotFound {
            name: name.to_string(),
        })?;
        let own_defs = self.catalog.own_relationships(name);

        let mut out = Vec::new();
        for def in &own_defs {
            if def.is_through() || def.polymorphic {
                continue;
            }
            out.push(self.resolve_declared(entity, def)?);
        }
        let declared = out.len();

        if let Some(refs) = self.incoming.get(name) {
            for incoming in refs {
                // An entity that itself relates to the source already told
                // us how the two connect; no reverse is inferred for it.
                if own_defs.iter().any(|r| r.target == incoming.source) {
                    continue;
                }
                // Declared and hidden names shadow inferred ones.
                if own_defs.iter().any(|r| r.name == incoming.source_table) {
                    continue;
                }
                if let Some(existing) = out[declared..]
                    .iter()
                    .find(|r| r.name == incoming.source_table)
                {
                    if existing.foreign_key == incoming.foreign_key {
                        continue;
                    }
                    return Err(Error::AmbiguousReverse {
                        entity: name.to_string(),
                        source_entity: incoming.source.clone(),
                    });
                }
                out.push(Relationship {
                    name: incoming.source_table.clone(),
                    kind: RelationshipKind::InferredReverse,
                    target: incoming.source.clone(),
                    target_table: incoming.source_table.clone(),
                    foreign_key: incoming.foreign_key.clone(),
                    local_key: entity.primary_key.clone(),
                });
            }
        }

        debug!(entity = name, count = out.len(), "resolved relationship set");
        Ok(out)
    }

    fn resolve_declared(
        &self,
        owner: &EntityDef,
        def: &RelationshipDef,
    ) -> Result<Relationship, Error> {
        let target = self.catalog.entity(&def.target).ok_or_else(|| Error::EntityNotFound {
            name: def.target.clone(),
        })?;
        let foreign_key = def.foreign_key.clone().ok_or_else(|| {
            Error::InvalidData(format!(
                "relationship `{}` on `{}` has no foreign key",
                def.name, owner.name
            ))
        })?;
        let (kind, local_key) = match def.kind {
            DeclaredKind::Direct => (
                RelationshipKind::Direct,
                def.local_key
                    .clone()
                    .unwrap_or_else(|| target.primary_key.clone()),
            ),
            DeclaredKind::Collection => (
                RelationshipKind::Collection,
                def.local_key
                    .clone()
                    .unwrap_or_else(|| owner.primary_key.clone()),
            ),
        };
        Ok(Relationship {
            name: def.name.clone(),
            kind,
            target: target.name.clone(),
            target_table: target.table.clone(),
            foreign_key,
            local_key,
        })
    }
}
