//! Deletion plans: what to cascade into and what to do with each scope.
//!
//! A plan is a tree of handlers and child specs, built either through the
//! [`plan`] builder DSL or parsed from JSON via [`PlanConfig`]. Plans are
//! resolved against a [`RelationshipGraph`](crate::graph::RelationshipGraph)
//! into deletion trees by [`DeletionPlan::build`](crate::engine::DeletionPlan::build).

mod builder;
mod config;
mod dsl;
mod node;

pub use builder::{DeletionNode, ScopeSpec};
pub use config::{ChildConfig, ConfigHandler, PlanConfig};
pub use dsl::{plan, PlanBuilder};
pub use node::{AfterHook, BeforeHook, ChildSpec, CustomHandler, Handler, PlanBranch, PlanNode};

pub(crate) use builder::build_tree;
