use std::sync::Arc;

use crate::engine::HookScope;
use crate::error::Error;
use crate::value::{Row, Value};

/// Handler invoked in place of row deletion.
pub type CustomHandler = Arc<dyn Fn(&HookScope<'_>) -> Result<(), Error> + Send + Sync>;

/// Hook run before a node's subtree. Returning `Ok(false)` skips the
/// whole subtree: children, handler, and after hook.
pub type BeforeHook = Arc<dyn Fn(&HookScope<'_>) -> Result<bool, Error> + Send + Sync>;

/// Hook run after a node's handler, with the rows as they were before
/// the handler touched them.
pub type AfterHook = Arc<dyn Fn(&[Row]) -> Result<(), Error> + Send + Sync>;

/// What to do with the rows a node covers.
#[derive(Clone, Default)]
pub enum Handler {
    /// Delete the rows.
    #[default]
    Delete,
    /// Leave the rows alone. Children still run.
    Skip,
    /// Hand the scope to a caller-supplied function.
    Custom(CustomHandler),
}

impl std::fmt::Debug for Handler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Handler::Delete => write!(f, "Delete"),
            Handler::Skip => write!(f, "Skip"),
            Handler::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

/// One node of a deletion plan, before it is resolved against a graph.
#[derive(Debug, Clone)]
pub enum PlanNode {
    /// A leaf: apply the handler, no children.
    Handler(Handler),
    /// A branch with children and optional hooks.
    Branch(PlanBranch),
}

impl Default for PlanNode {
    fn default() -> Self {
        PlanNode::Handler(Handler::Delete)
    }
}

impl PlanNode {
    /// A leaf that deletes its rows.
    pub fn delete() -> Self {
        PlanNode::Handler(Handler::Delete)
    }

    /// A leaf that keeps its rows.
    pub fn skip() -> Self {
        PlanNode::Handler(Handler::Skip)
    }

    /// A leaf with a custom handler.
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&HookScope<'_>) -> Result<(), Error> + Send + Sync + 'static,
    {
        PlanNode::Handler(Handler::Custom(Arc::new(f)))
    }
}

/// The body of a branch node.
#[derive(Clone, Default)]
pub struct PlanBranch {
    /// Handler for the node's own rows. Defaults to delete.
    pub handler: Option<Handler>,
    /// Hook run before the subtree.
    pub before: Option<BeforeHook>,
    /// Hook run after the handler.
    pub after: Option<AfterHook>,
    /// Child specs and their subplans, in plan order.
    pub children: Vec<(ChildSpec, PlanNode)>,
}

impl std::fmt::Debug for PlanBranch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlanBranch")
            .field("handler", &self.handler)
            .field("before", &self.before.is_some())
            .field("after", &self.after.is_some())
            .field("children", &self.children)
            .finish()
    }
}

/// How a branch addresses one child scope.
///
/// The name is resolved against the parent's relationship set unless an
/// explicit `foreign_key` is given, in which case it names a table
/// directly.
#[derive(Debug, Clone, PartialEq)]
pub struct ChildSpec {
    /// Relationship name, or a table name when `foreign_key` is set.
    pub name: String,
    /// Foreign key on the child table, bypassing relationship lookup.
    pub foreign_key: Option<String>,
    /// Parent-side column the foreign key refers to, when it is not the
    /// parent's primary key.
    pub primary_key: Option<String>,
    /// Equality conditions narrowing the child scope.
    pub where_eq: Vec<(String, Value)>,
    /// Exclusion conditions narrowing the child scope.
    pub where_not: Vec<(String, Value)>,
}

impl ChildSpec {
    /// A child addressed by relationship name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            foreign_key: None,
            primary_key: None,
            where_eq: Vec::new(),
            where_not: Vec::new(),
        }
    }

    /// Address a table directly through the given foreign key.
    pub fn with_foreign_key(mut self, column: impl Into<String>) -> Self {
        self.foreign_key = Some(column.into());
        self
    }

    /// Override the parent-side column the foreign key refers to.
    pub fn with_primary_key(mut self, column: impl Into<String>) -> Self {
        self.primary_key = Some(column.into());
        self
    }

    /// Keep only child rows where `column` equals `value`.
    pub fn where_eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.where_eq.push((column.into(), value.into()));
        self
    }

    /// Drop child rows where `column` equals `value`.
    pub fn where_not(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.where_not.push((column.into(), value.into()));
        self
    }
}

impl From<&str> for ChildSpec {
    fn from(name: &str) -> Self {
        ChildSpec::new(name)
    }
}

impl From<String> for ChildSpec {
    fn from(name: String) -> Self {
        ChildSpec::new(name)
    }
}
