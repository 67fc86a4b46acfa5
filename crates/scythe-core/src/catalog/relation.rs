use rkyv::{Archive, Deserialize, Serialize};
use serde::{Deserialize as SerdeDeserialize, Serialize as SerdeSerialize};

/// How a declared relationship points at its target.
#[derive(
    Debug, Clone, Copy, PartialEq, Archive, Serialize, Deserialize, SerdeSerialize, SerdeDeserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum DeclaredKind {
    /// The owning entity holds the foreign key.
    Direct,
    /// The target entity holds the foreign key back to the owner.
    Collection,
}

/// A relationship declared on one entity.
#[derive(
    Debug, Clone, PartialEq, Archive, Serialize, Deserialize, SerdeSerialize, SerdeDeserialize,
)]
pub struct RelationshipDef {
    /// Name used to address the relationship in deletion plans.
    pub name: String,
    /// Orientation of the foreign key.
    pub kind: DeclaredKind,
    /// Name of the target entity.
    pub target: String,
    /// Foreign key column. `None` for through or polymorphic declarations.
    #[serde(default)]
    pub foreign_key: Option<String>,
    /// Key column the foreign key refers to. Defaults to a primary key.
    #[serde(default)]
    pub local_key: Option<String>,
    /// Intermediate entity when the relationship is indirect.
    #[serde(default)]
    pub through: Option<String>,
    /// Whether the foreign key can point at more than one entity.
    #[serde(default)]
    pub polymorphic: bool,
}

impl RelationshipDef {
    /// A direct relationship: the owner's `foreign_key` points at the target.
    pub fn belongs_to(
        name: impl Into<String>,
        target: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: DeclaredKind::Direct,
            target: target.into(),
            foreign_key: Some(foreign_key.into()),
            local_key: None,
            through: None,
            polymorphic: false,
        }
    }

    /// A collection: the target's `foreign_key` points back at the owner.
    pub fn has_many(
        name: impl Into<String>,
        target: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: DeclaredKind::Collection,
            target: target.into(),
            foreign_key: Some(foreign_key.into()),
            local_key: None,
            through: None,
            polymorphic: false,
        }
    }

    /// A collection reached through an intermediate entity.
    pub fn has_many_through(
        name: impl Into<String>,
        target: impl Into<String>,
        through: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: DeclaredKind::Collection,
            target: target.into(),
            foreign_key: None,
            local_key: None,
            through: Some(through.into()),
            polymorphic: false,
        }
    }

    /// Override the key column the foreign key refers to.
    pub fn with_local_key(mut self, column: impl Into<String>) -> Self {
        self.local_key = Some(column.into());
        self
    }

    /// Mark the relationship as polymorphic.
    pub fn polymorphic(mut self) -> Self {
        self.polymorphic = true;
        self
    }

    /// Whether the relationship runs through an intermediate entity.
    pub fn is_through(&self) -> bool {
        self.through.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_belongs_to_shape() {
        let rel = RelationshipDef::belongs_to("author", "users", "user_id");
        assert_eq!(rel.kind, DeclaredKind::Direct);
        assert_eq!(rel.target, "users");
        assert_eq!(rel.foreign_key.as_deref(), Some("user_id"));
        assert!(!rel.is_through());
    }

    #[test]
    fn test_has_many_through_has_no_foreign_key() {
        let rel = RelationshipDef::has_many_through("commenters", "users", "comments");
        assert_eq!(rel.foreign_key, None);
        assert_eq!(rel.through.as_deref(), Some("comments"));
        assert!(rel.is_through());
    }

    #[test]
    fn test_local_key_override() {
        let rel = RelationshipDef::has_many("posts", "posts", "author_ref")
            .with_local_key("external_id");
        assert_eq!(rel.local_key.as_deref(), Some("external_id"));
    }
}
