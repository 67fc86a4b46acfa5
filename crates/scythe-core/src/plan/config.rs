//! Deletion plans loaded from JSON.
//!
//! The config form carries no hooks or custom handlers; those exist only
//! in the builder DSL. Everything else maps one-to-one onto [`PlanNode`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::node::{ChildSpec, Handler, PlanBranch, PlanNode};
use crate::error::Error;
use crate::value::Value;

/// One branch of a plan in config form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlanConfig {
    /// Handler for the branch's own rows.
    #[serde(default)]
    pub handler: ConfigHandler,
    /// Child scopes in plan order.
    #[serde(default)]
    pub children: Vec<ChildConfig>,
}

/// Handler names accepted in config form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigHandler {
    /// Delete the rows.
    #[default]
    Delete,
    /// Leave the rows alone.
    Skip,
}

impl From<ConfigHandler> for Handler {
    fn from(handler: ConfigHandler) -> Self {
        match handler {
            ConfigHandler::Delete => Handler::Delete,
            ConfigHandler::Skip => Handler::Skip,
        }
    }
}

/// One child scope in config form.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChildConfig {
    /// Relationship name, or a table name when `foreign_key` is set.
    pub name: String,
    /// Foreign key on the child table, bypassing relationship lookup.
    #[serde(default)]
    pub foreign_key: Option<String>,
    /// Parent-side column the foreign key refers to.
    #[serde(default)]
    pub primary_key: Option<String>,
    /// Equality conditions narrowing the child scope.
    #[serde(default, rename = "where")]
    pub where_eq: BTreeMap<String, serde_json::Value>,
    /// Exclusion conditions narrowing the child scope.
    #[serde(default)]
    pub where_not: BTreeMap<String, serde_json::Value>,
    /// Subplan for this child. Rows are deleted when absent.
    #[serde(default)]
    pub plan: Option<PlanConfig>,
}

impl PlanConfig {
    /// Parse a plan from a JSON document.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        serde_json::from_str(json).map_err(|e| Error::Deserialization(e.to_string()))
    }

    /// Convert the config into a plan tree.
    pub fn into_plan(self) -> Result<PlanNode, Error> {
        let mut branch = PlanBranch {
            handler: Some(self.handler.into()),
            ..Default::default()
        };
        for child in self.children {
            let mut spec = ChildSpec::new(child.name);
            if let Some(fk) = child.foreign_key {
                spec = spec.with_foreign_key(fk);
            }
            if let Some(pk) = child.primary_key {
                spec = spec.with_primary_key(pk);
            }
            for (column, value) in &child.where_eq {
                spec = spec.where_eq(column.as_str(), Value::from_json(value)?);
            }
            for (column, value) in &child.where_not {
                spec = spec.where_not(column.as_str(), Value::from_json(value)?);
            }
            let node = match child.plan {
                Some(plan) => plan.into_plan()?,
                None => PlanNode::delete(),
            };
            branch.children.push((spec, node));
        }
        Ok(PlanNode::Branch(branch))
    }
}
