use tracing::debug;

use super::scope::{ExecutionScope, HookScope};
use crate::error::Error;
use crate::plan::{DeletionNode, Handler};
use crate::store::{Filter, RowStore};

/// Depth-first walk of a deletion tree.
///
/// Children run before their parent's handler so foreign key constraints
/// hold at every point of the run.
pub(crate) struct Executor<'a> {
    store: &'a dyn RowStore,
}

impl<'a> Executor<'a> {
    pub(crate) fn new(store: &'a dyn RowStore) -> Self {
        Self { store }
    }

    pub(crate) fn run(&self, node: &DeletionNode, scope: ExecutionScope) -> Result<(), Error> {
        // The after hook sees rows as they were before the handler, and
        // children may delete rows this scope filters on, so the snapshot
        // is taken first.
        let snapshot = match &node.after {
            Some(_) => Some(scope.rows(self.store)?),
            None => None,
        };

        if let Some(before) = &node.before {
            let proceed = before(&HookScope::new(&scope, self.store))?;
            if !proceed {
                debug!(table = %scope.table(), "before hook vetoed subtree");
                return Ok(());
            }
        }

        for child in &node.children {
            let child_scope = self.child_scope(&scope, child);
            self.run(child, child_scope)?;
        }

        match &node.handler {
            Handler::Delete => {
                let removed = self.store.delete_all(scope.table(), scope.filter())?;
                debug!(table = %scope.table(), rows = removed, "deleted scope");
            }
            Handler::Skip => {}
            Handler::Custom(handler) => {
                handler(&HookScope::new(&scope, self.store))?;
            }
        }

        if let Some(after) = &node.after {
            after(snapshot.as_deref().unwrap_or_default())?;
        }

        Ok(())
    }

    fn child_scope(&self, parent: &ExecutionScope, child: &DeletionNode) -> ExecutionScope {
        let spec = child.scope();
        let mut terms = Vec::with_capacity(1 + spec.where_eq.len() + spec.where_not.len());
        if let Some(reference_column) = &spec.reference_column {
            terms.push(Filter::in_scope(
                reference_column.clone(),
                parent.project(&spec.parent_reference_column),
            ));
        }
        for (column, value) in &spec.where_eq {
            terms.push(Filter::eq(column.clone(), value.clone()));
        }
        for (column, value) in &spec.where_not {
            terms.push(Filter::ne(column.clone(), value.clone()));
        }
        ExecutionScope::new(
            spec.table.clone(),
            spec.primary_key.clone(),
            Filter::and(terms),
        )
    }
}
