//! Builder DSL for deletion plans.
//!
//! ```
//! use scythe_core::plan::{plan, ChildSpec, PlanNode};
//!
//! let tree = plan()
//!     .delete("avatars")
//!     .child(
//!         "posts",
//!         plan()
//!             .delete(ChildSpec::new("comments").where_not("pinned", true))
//!             .build(),
//!     )
//!     .build();
//! # let _: PlanNode = tree;
//! ```

use std::sync::Arc;

use super::node::{ChildSpec, Handler, PlanBranch, PlanNode};
use crate::engine::HookScope;
use crate::error::Error;
use crate::value::Row;

/// Start a plan branch.
pub fn plan() -> PlanBuilder {
    PlanBuilder::new()
}

/// Builds one branch of a deletion plan.
#[derive(Debug, Clone, Default)]
pub struct PlanBuilder {
    branch: PlanBranch,
}

impl PlanBuilder {
    /// An empty branch: delete handler, no hooks, no children.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a child whose rows are deleted.
    pub fn delete(self, spec: impl Into<ChildSpec>) -> Self {
        self.child(spec, PlanNode::delete())
    }

    /// Add a child whose rows are kept.
    pub fn skip(self, spec: impl Into<ChildSpec>) -> Self {
        self.child(spec, PlanNode::skip())
    }

    /// Add a child handled by a custom function.
    pub fn custom<F>(self, spec: impl Into<ChildSpec>, f: F) -> Self
    where
        F: Fn(&HookScope<'_>) -> Result<(), Error> + Send + Sync + 'static,
    {
        self.child(spec, PlanNode::custom(f))
    }

    /// Add a child with an explicit subplan.
    pub fn child(mut self, spec: impl Into<ChildSpec>, node: PlanNode) -> Self {
        self.branch.children.push((spec.into(), node));
        self
    }

    /// Set the handler for this branch's own rows.
    pub fn handler(mut self, handler: Handler) -> Self {
        self.branch.handler = Some(handler);
        self
    }

    /// Run `f` before this branch's subtree. `Ok(false)` skips all of it.
    pub fn before<F>(mut self, f: F) -> Self
    where
        F: Fn(&HookScope<'_>) -> Result<bool, Error> + Send + Sync + 'static,
    {
        self.branch.before = Some(Arc::new(f));
        self
    }

    /// Run `f` after this branch's handler with the rows it covered.
    pub fn after<F>(mut self, f: F) -> Self
    where
        F: Fn(&[Row]) -> Result<(), Error> + Send + Sync + 'static,
    {
        self.branch.after = Some(Arc::new(f));
        self
    }

    /// Finish the branch.
    pub fn build(self) -> PlanNode {
        PlanNode::Branch(self.branch)
    }
}
