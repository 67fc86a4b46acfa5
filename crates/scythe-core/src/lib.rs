//! Scythe Core - relationship graph and cascading deletion engine.
//!
//! Scythe resolves the relationships of a schema catalog, including the
//! inferred reverse of every foreign key pointing at an entity, and runs
//! deletion plans over them depth-first so children are gone before their
//! parents.
//!
//! The pieces compose in one direction: a [`catalog::SchemaCatalog`]
//! feeds a [`graph::RelationshipGraph`], a [`plan::PlanNode`] resolves
//! against the graph into an [`engine::DeletionPlan`], and the plan
//! executes against anything implementing [`store::RowStore`].

pub mod catalog;
pub mod engine;
pub mod error;
pub mod graph;
pub mod plan;
pub mod store;
pub mod value;

pub use catalog::{CatalogStore, DeclaredKind, EntityDef, RelationshipDef, SchemaCatalog};
pub use engine::{DeletionPlan, ExecutionScope, HookScope};
pub use error::Error;
pub use graph::{Relationship, RelationshipGraph, RelationshipKind};
pub use plan::{
    plan, ChildSpec, DeletionNode, Handler, PlanBuilder, PlanConfig, PlanNode, ScopeSpec,
};
pub use store::{Filter, RowStore, ScopeQuery, SledStore, StoreConfig};
pub use value::{Row, Value};
