//! Deletion plan resolution and execution.

mod exec;
mod scope;

pub use scope::{ExecutionScope, HookScope};

use tracing::{debug, instrument};

use crate::error::Error;
use crate::graph::RelationshipGraph;
use crate::plan::{build_tree, DeletionNode, PlanNode};
use crate::store::{Filter, RowStore};
use crate::value::Value;
use exec::Executor;

/// A plan resolved against a relationship graph, ready to run.
///
/// Building is pure catalog work; the same plan can execute any number of
/// times against any store.
#[derive(Debug)]
pub struct DeletionPlan {
    root: DeletionNode,
}

impl DeletionPlan {
    /// Resolve `plan` rooted at the entity or table called `root`.
    ///
    /// Every relationship and entity lookup happens here; execution never
    /// fails on resolution.
    pub fn build(
        graph: &RelationshipGraph,
        root: &str,
        plan: &PlanNode,
    ) -> Result<Self, Error> {
        Ok(Self {
            root: build_tree(graph, root, plan)?,
        })
    }

    /// The resolved tree.
    pub fn root(&self) -> &DeletionNode {
        &self.root
    }

    /// Run the plan against the root rows with the given primary key
    /// values.
    ///
    /// Children are processed before their parents. Not transactional:
    /// rows deleted before an error stay deleted.
    #[instrument(skip(self, store, targets), fields(table = %self.root.scope().table))]
    pub fn execute(&self, store: &dyn RowStore, targets: &[Value]) -> Result<(), Error> {
        let scope = ExecutionScope::new(
            self.root.scope().table.clone(),
            self.root.scope().primary_key.clone(),
            Filter::in_values(self.root.scope().primary_key.clone(), targets.to_vec()),
        );
        Executor::new(store).run(&self.root, scope)?;
        debug!(targets = targets.len(), "deletion plan finished");
        Ok(())
    }
}
