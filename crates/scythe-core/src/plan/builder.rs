//! Resolution of plan trees against a relationship graph.
//!
//! Building a tree performs every catalog and relationship lookup the
//! plan will ever need. Whatever survives this pass can execute without
//! hitting a resolution error.

use super::node::{AfterHook, BeforeHook, ChildSpec, Handler, PlanNode};
use crate::error::Error;
use crate::graph::{RelationshipGraph, RelationshipKind};
use crate::value::Value;

/// How one node's rows relate to its parent's rows.
#[derive(Debug, Clone, PartialEq)]
pub struct ScopeSpec {
    /// Entity the scope covers.
    pub entity: String,
    /// Backing table.
    pub table: String,
    /// Primary key column of the table.
    pub primary_key: String,
    /// Column projected from the parent scope.
    pub parent_reference_column: String,
    /// Column on this table matched against the parent projection.
    /// `None` on the root, which is keyed by caller-supplied values
    /// instead.
    pub reference_column: Option<String>,
    /// Equality conditions narrowing the scope.
    pub where_eq: Vec<(String, Value)>,
    /// Exclusion conditions narrowing the scope.
    pub where_not: Vec<(String, Value)>,
}

/// A resolved node of a deletion tree.
pub struct DeletionNode {
    pub(crate) scope: ScopeSpec,
    pub(crate) handler: Handler,
    pub(crate) before: Option<BeforeHook>,
    pub(crate) after: Option<AfterHook>,
    pub(crate) children: Vec<DeletionNode>,
}

impl DeletionNode {
    /// The scope this node covers.
    pub fn scope(&self) -> &ScopeSpec {
        &self.scope
    }

    /// Child nodes in plan order.
    pub fn children(&self) -> &[DeletionNode] {
        &self.children
    }
}

impl std::fmt::Debug for DeletionNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeletionNode")
            .field("scope", &self.scope)
            .field("handler", &self.handler)
            .field("before", &self.before.is_some())
            .field("after", &self.after.is_some())
            .field("children", &self.children)
            .finish()
    }
}

/// Resolve a plan rooted at `root` (an entity or table name).
pub(crate) fn build_tree(
    graph: &RelationshipGraph,
    root: &str,
    plan: &PlanNode,
) -> Result<DeletionNode, Error> {
    let entity = graph.entity_or_table(root)?;
    let scope = ScopeSpec {
        entity: entity.name.clone(),
        table: entity.table.clone(),
        primary_key: entity.primary_key.clone(),
        parent_reference_column: entity.primary_key.clone(),
        reference_column: None,
        where_eq: Vec::new(),
        where_not: Vec::new(),
    };
    build_node(graph, scope, plan)
}

fn build_node(
    graph: &RelationshipGraph,
    scope: ScopeSpec,
    plan: &PlanNode,
) -> Result<DeletionNode, Error> {
    match plan {
        PlanNode::Handler(handler) => Ok(DeletionNode {
            scope,
            handler: handler.clone(),
            before: None,
            after: None,
            children: Vec::new(),
        }),
        PlanNode::Branch(branch) => {
            let mut children = Vec::with_capacity(branch.children.len());
            for (spec, subplan) in &branch.children {
                let child = child_scope(graph, &scope, spec)?;
                children.push(build_node(graph, child, subplan)?);
            }
            Ok(DeletionNode {
                scope,
                handler: branch.handler.clone().unwrap_or_default(),
                before: branch.before.clone(),
                after: branch.after.clone(),
                children,
            })
        }
    }
}

fn child_scope(
    graph: &RelationshipGraph,
    parent: &ScopeSpec,
    spec: &ChildSpec,
) -> Result<ScopeSpec, Error> {
    let resolved = if let Some(foreign_key) = &spec.foreign_key {
        // Explicit mappings name the child table directly.
        let entity = graph
            .catalog()
            .entity_by_table(&spec.name)
            .ok_or_else(|| Error::EntityNotFound {
                name: spec.name.clone(),
            })?;
        ScopeSpec {
            entity: entity.name.clone(),
            table: entity.table.clone(),
            primary_key: entity.primary_key.clone(),
            parent_reference_column: spec
                .primary_key
                .clone()
                .unwrap_or_else(|| parent.primary_key.clone()),
            reference_column: Some(foreign_key.clone()),
            where_eq: spec.where_eq.clone(),
            where_not: spec.where_not.clone(),
        }
    } else {
        let rel = graph.find(&parent.entity, &spec.name)?;
        let target = graph
            .catalog()
            .entity(&rel.target)
            .ok_or_else(|| Error::EntityNotFound {
                name: rel.target.clone(),
            })?;
        let (parent_reference_column, reference_column) = match rel.kind {
            // The parent holds the foreign key; child rows are matched on
            // the key column it refers to.
            RelationshipKind::Direct => (rel.foreign_key.clone(), rel.local_key.clone()),
            // The child holds the foreign key pointing back at the parent.
            RelationshipKind::Collection | RelationshipKind::InferredReverse => (
                spec.primary_key.clone().unwrap_or_else(|| rel.local_key.clone()),
                rel.foreign_key.clone(),
            ),
        };
        ScopeSpec {
            entity: rel.target.clone(),
            table: rel.target_table.clone(),
            primary_key: target.primary_key.clone(),
            parent_reference_column,
            reference_column: Some(reference_column),
            where_eq: spec.where_eq.clone(),
            where_not: spec.where_not.clone(),
        }
    };
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::catalog::{EntityDef, RelationshipDef, SchemaCatalog};
    use crate::plan::plan;

    fn test_graph() -> RelationshipGraph {
        RelationshipGraph::new(Arc::new(
            SchemaCatalog::new()
                .with_entity(
                    EntityDef::new("user", "users")
                        .with_relationship(RelationshipDef::has_many("posts", "post", "user_id"))
                        .with_relationship(RelationshipDef::belongs_to(
                            "parent",
                            "user",
                            "parent_user_id",
                        )),
                )
                .with_entity(
                    EntityDef::new("post", "posts").with_relationship(
                        RelationshipDef::belongs_to("author", "user", "user_id"),
                    ),
                )
                .with_entity(
                    EntityDef::new("comment", "comments").with_relationship(
                        RelationshipDef::belongs_to("post", "post", "post_id"),
                    ),
                ),
        ))
    }

    #[test]
    fn test_root_scope_is_keyed_by_primary_key() {
        let graph = test_graph();
        let tree = build_tree(&graph, "user", &plan().build()).unwrap();

        assert_eq!(tree.scope.entity, "user");
        assert_eq!(tree.scope.table, "users");
        assert_eq!(tree.scope.parent_reference_column, "id");
        assert_eq!(tree.scope.reference_column, None);
    }

    #[test]
    fn test_root_accepts_table_name() {
        let graph = test_graph();
        let tree = build_tree(&graph, "users", &plan().build()).unwrap();
        assert_eq!(tree.scope.entity, "user");
    }

    #[test]
    fn test_collection_child_orientation() {
        let graph = test_graph();
        let tree = build_tree(&graph, "user", &plan().delete("posts").build()).unwrap();

        let child = &tree.children[0].scope;
        assert_eq!(child.table, "posts");
        assert_eq!(child.parent_reference_column, "id");
        assert_eq!(child.reference_column.as_deref(), Some("user_id"));
    }

    #[test]
    fn test_direct_child_orientation() {
        let graph = test_graph();
        let tree = build_tree(&graph, "comment", &plan().delete("post").build()).unwrap();

        let child = &tree.children[0].scope;
        assert_eq!(child.table, "posts");
        assert_eq!(child.parent_reference_column, "post_id");
        assert_eq!(child.reference_column.as_deref(), Some("id"));
    }

    #[test]
    fn test_inferred_child_orientation() {
        let graph = test_graph();
        let tree = build_tree(&graph, "post", &plan().delete("comments").build()).unwrap();

        let child = &tree.children[0].scope;
        assert_eq!(child.table, "comments");
        assert_eq!(child.parent_reference_column, "id");
        assert_eq!(child.reference_column.as_deref(), Some("post_id"));
    }

    #[test]
    fn test_explicit_foreign_key_child() {
        let graph = test_graph();
        let spec = ChildSpec::new("users").with_foreign_key("parent_user_id");
        let tree = build_tree(&graph, "user", &plan().delete(spec).build()).unwrap();

        let child = &tree.children[0].scope;
        assert_eq!(child.table, "users");
        assert_eq!(child.parent_reference_column, "id");
        assert_eq!(child.reference_column.as_deref(), Some("parent_user_id"));
    }

    #[test]
    fn test_primary_key_override() {
        let graph = test_graph();
        let spec = ChildSpec::new("users")
            .with_foreign_key("parent_user_id")
            .with_primary_key("external_id");
        let tree = build_tree(&graph, "user", &plan().delete(spec).build()).unwrap();

        assert_eq!(tree.children[0].scope.parent_reference_column, "external_id");
    }

    #[test]
    fn test_conditions_propagate() {
        let graph = test_graph();
        let spec = ChildSpec::new("posts")
            .where_eq("state", "draft")
            .where_not("pinned", true);
        let tree = build_tree(&graph, "user", &plan().delete(spec).build()).unwrap();

        let child = &tree.children[0].scope;
        assert_eq!(child.where_eq, vec![("state".to_string(), Value::from("draft"))]);
        assert_eq!(child.where_not, vec![("pinned".to_string(), Value::from(true))]);
    }

    #[test]
    fn test_nested_resolution() {
        let graph = test_graph();
        let tree = build_tree(
            &graph,
            "user",
            &plan()
                .child("posts", plan().delete("comments").build())
                .build(),
        )
        .unwrap();

        let comments = &tree.children[0].children[0].scope;
        assert_eq!(comments.table, "comments");
        assert_eq!(comments.parent_reference_column, "id");
        assert_eq!(comments.reference_column.as_deref(), Some("post_id"));
    }

    #[test]
    fn test_branch_handler_defaults_to_delete() {
        let graph = test_graph();
        let tree = build_tree(&graph, "user", &plan().build()).unwrap();
        assert!(matches!(tree.handler, Handler::Delete));
    }

    #[test]
    fn test_resolution_errors_surface_at_build() {
        let graph = test_graph();

        assert!(matches!(
            build_tree(&graph, "user", &plan().delete("unicorns").build()).unwrap_err(),
            Error::AssociationNotDefined { .. }
        ));
        assert!(matches!(
            build_tree(&graph, "unicorn", &plan().build()).unwrap_err(),
            Error::EntityNotFound { .. }
        ));

        // Explicit mappings take a table name, not an entity name.
        let spec = ChildSpec::new("post").with_foreign_key("user_id");
        assert!(matches!(
            build_tree(&graph, "user", &plan().delete(spec).build()).unwrap_err(),
            Error::EntityNotFound { .. }
        ));
    }
}
