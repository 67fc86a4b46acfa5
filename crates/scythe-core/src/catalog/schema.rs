use rkyv::{Archive, Deserialize, Serialize};
use serde::{Deserialize as SerdeDeserialize, Serialize as SerdeSerialize};

use super::entity::EntityDef;
use super::relation::RelationshipDef;
use crate::error::Error;

/// The full set of entity definitions for one schema version.
///
/// Entities keep their declaration order so reverse-relationship
/// inference walks them the same way on every run.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Default,
    Archive,
    Serialize,
    Deserialize,
    SerdeSerialize,
    SerdeDeserialize,
)]
pub struct SchemaCatalog {
    /// Entities in declaration order.
    pub entities: Vec<EntityDef>,
    /// Relationships attached to entities outside their declarations,
    /// keyed by entity name.
    #[serde(default)]
    pub hidden: Vec<(String, RelationshipDef)>,
}

impl SchemaCatalog {
    /// An empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entity definition.
    pub fn with_entity(mut self, entity: EntityDef) -> Self {
        self.entities.push(entity);
        self
    }

    /// Attach a relationship to an entity without touching its declaration.
    ///
    /// Hidden relationships take part in cascade resolution exactly like
    /// declared ones, including shadowing inferred reverse relationships.
    pub fn add_hidden_relationship(
        &mut self,
        entity: &str,
        rel: RelationshipDef,
    ) -> Result<(), Error> {
        if self.entity(entity).is_none() {
            return Err(Error::EntityNotFound {
                name: entity.to_string(),
            });
        }
        self.hidden.push((entity.to_string(), rel));
        Ok(())
    }

    /// Look up an entity by name.
    pub fn entity(&self, name: &str) -> Option<&EntityDef> {
        self.entities.iter().find(|e| e.name == name)
    }

    /// Look up an entity by its backing table.
    pub fn entity_by_table(&self, table: &str) -> Option<&EntityDef> {
        self.entities.iter().find(|e| e.table == table)
    }

    /// All entities in declaration order.
    pub fn entities(&self) -> &[EntityDef] {
        &self.entities
    }

    /// Declared plus hidden relationships of one entity.
    ///
    /// Hidden relationships whose name collides with a declared one are
    /// dropped; the declaration wins.
    pub fn own_relationships(&self, entity: &str) -> Vec<&RelationshipDef> {
        let Some(def) = self.entity(entity) else {
            return Vec::new();
        };
        let mut out: Vec<&RelationshipDef> = def.relationships.iter().collect();
        for (owner, rel) in &self.hidden {
            if owner == entity && def.relationship(&rel.name).is_none() {
                out.push(rel);
            }
        }
        out
    }

    /// Serialize the catalog to bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        rkyv::to_bytes::<rkyv::rancor::Error>(self)
            .map(|v| v.to_vec())
            .map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Deserialize a catalog from bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        rkyv::from_bytes::<Self, rkyv::rancor::Error>(bytes)
            .map_err(|e| Error::Deserialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blog_catalog() -> SchemaCatalog {
        SchemaCatalog::new()
            .with_entity(
                EntityDef::new("user", "users")
                    .with_relationship(RelationshipDef::has_many("posts", "post", "user_id")),
            )
            .with_entity(
                EntityDef::new("post", "posts")
                    .with_relationship(RelationshipDef::belongs_to("author", "user", "user_id")),
            )
    }

    #[test]
    fn test_lookup_by_name_and_table() {
        let catalog = blog_catalog();
        assert!(catalog.entity("user").is_some());
        assert!(catalog.entity("users").is_none());
        assert_eq!(catalog.entity_by_table("users").unwrap().name, "user");
    }

    #[test]
    fn test_hidden_relationship_requires_entity() {
        let mut catalog = blog_catalog();
        let err = catalog
            .add_hidden_relationship(
                "tag",
                RelationshipDef::has_many("posts", "post", "tag_id"),
            )
            .unwrap_err();
        assert!(matches!(err, Error::EntityNotFound { .. }));
    }

    #[test]
    fn test_own_relationships_include_hidden() {
        let mut catalog = blog_catalog();
        catalog
            .add_hidden_relationship(
                "user",
                RelationshipDef::has_many("drafts", "post", "editor_id"),
            )
            .unwrap();

        let rels = catalog.own_relationships("user");
        assert_eq!(rels.len(), 2);
        assert_eq!(rels[1].name, "drafts");
    }

    #[test]
    fn test_declared_name_shadows_hidden() {
        let mut catalog = blog_catalog();
        catalog
            .add_hidden_relationship(
                "user",
                RelationshipDef::has_many("posts", "post", "editor_id"),
            )
            .unwrap();

        let rels = catalog.own_relationships("user");
        assert_eq!(rels.len(), 1);
        assert_eq!(rels[0].foreign_key.as_deref(), Some("user_id"));
    }

    #[test]
    fn test_bytes_roundtrip() {
        let mut catalog = blog_catalog();
        catalog
            .add_hidden_relationship(
                "user",
                RelationshipDef::has_many("drafts", "post", "editor_id"),
            )
            .unwrap();

        let bytes = catalog.to_bytes().unwrap();
        let decoded = SchemaCatalog::from_bytes(&bytes).unwrap();
        assert_eq!(catalog, decoded);
    }

    #[test]
    fn test_parse_from_json() {
        let json = r#"{
            "entities": [
                {
                    "name": "user",
                    "table": "users",
                    "relationships": [
                        {"name": "posts", "kind": "collection", "target": "post", "foreign_key": "user_id"}
                    ]
                },
                {"name": "post", "table": "posts", "primary_key": "post_id"}
            ]
        }"#;
        let catalog: SchemaCatalog = serde_json::from_str(json).unwrap();
        assert_eq!(catalog.entities().len(), 2);
        assert_eq!(catalog.entity("post").unwrap().primary_key, "post_id");
        assert_eq!(catalog.own_relationships("user").len(), 1);
    }
}
