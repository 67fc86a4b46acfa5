//! Schema catalog: entities, declared relationships, and their
//! versioned persistence.

mod entity;
mod relation;
mod schema;
mod store;

pub use entity::EntityDef;
pub use relation::{DeclaredKind, RelationshipDef};
pub use schema::SchemaCatalog;
pub use store::CatalogStore;
