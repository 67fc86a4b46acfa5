use std::sync::Arc;

use scythe_core::catalog::{CatalogStore, EntityDef, RelationshipDef, SchemaCatalog};
use scythe_core::graph::{RelationshipGraph, RelationshipKind};
use scythe_core::store::{SledStore, StoreConfig};

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
        .with_entity(
            EntityDef::new("avatar", "avatars")
                .with_relationship(RelationshipDef::belongs_to("owner", "user", "user_id")),
        )
}

#[test]
fn test_catalog_survives_reopen_and_resolves() {
    let dir = tempfile::tempdir().unwrap();
    {
        let store = SledStore::open(StoreConfig::new(dir.path())).unwrap();
        let catalogs = CatalogStore::open(store.db()).unwrap();
        catalogs.apply(blog_catalog()).unwrap();
        catalogs.flush().unwrap();
    }

    let store = SledStore::open(StoreConfig::new(dir.path())).unwrap();
    let catalogs = CatalogStore::open(store.db()).unwrap();
    assert_eq!(catalogs.current_version(), 1);

    let graph = RelationshipGraph::new(catalogs.current().unwrap());
    let avatars = graph.find("user", "avatars").unwrap();
    assert_eq!(avatars.kind, RelationshipKind::InferredReverse);
    assert_eq!(avatars.foreign_key, "user_id");
}

#[test]
fn test_graph_over_historical_version() {
    let dir = tempfile::tempdir().unwrap();
    let store = SledStore::open(StoreConfig::new(dir.path())).unwrap();
    let catalogs = CatalogStore::open(store.db()).unwrap();

    catalogs
        .apply(SchemaCatalog::new().with_entity(EntityDef::new("user", "users")))
        .unwrap();
    catalogs.apply(blog_catalog()).unwrap();

    let v1 = catalogs.at_version(1).unwrap().unwrap();
    let graph = RelationshipGraph::new(Arc::new(v1));
    assert!(graph.relationships("user").unwrap().is_empty());
    assert!(graph.find("user", "avatars").is_err());

    let graph = RelationshipGraph::new(catalogs.current().unwrap());
    assert!(graph.find("user", "avatars").is_ok());
}

#[test]
fn test_hidden_relationships_survive_persistence() {
    let dir = tempfile::tempdir().unwrap();
    {
        let store = SledStore::open(StoreConfig::new(dir.path())).unwrap();
        let catalogs = CatalogStore::open(store.db()).unwrap();

        let mut catalog = blog_catalog();
        catalog
            .add_hidden_relationship(
                "user",
                RelationshipDef::has_many("drafts", "post", "editor_id"),
            )
            .unwrap();
        catalogs.apply(catalog).unwrap();
        catalogs.flush().unwrap();
    }

    let store = SledStore::open(StoreConfig::new(dir.path())).unwrap();
    let catalogs = CatalogStore::open(store.db()).unwrap();
    let graph = RelationshipGraph::new(catalogs.current().unwrap());

    let drafts = graph.find("user", "drafts").unwrap();
    assert_eq!(drafts.kind, RelationshipKind::Collection);
    assert_eq!(drafts.foreign_key, "editor_id");
}
