//! Structured filters over table rows.
//!
//! Filters describe which rows a scope covers without touching the store.
//! The subquery form, [`Filter::InScope`], is what keeps nested deletion
//! scopes composable: a child scope embeds its parent's projection instead
//! of a list of ids read out of the database.

use crate::error::Error;
use crate::value::{Row, Value};

/// A store-agnostic predicate over the rows of one table.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Matches every row.
    All,
    /// Field equals the value.
    Eq {
        /// Field name.
        field: String,
        /// Value to match.
        value: Value,
    },
    /// Field differs from the value.
    Ne {
        /// Field name.
        field: String,
        /// Value to exclude.
        value: Value,
    },
    /// Field is one of the values.
    In {
        /// Field name.
        field: String,
        /// Values to match.
        values: Vec<Value>,
    },
    /// Field is contained in the projection of another scope.
    InScope {
        /// Field name.
        field: String,
        /// The projected subquery.
        scope: Box<ScopeQuery>,
    },
    /// Every inner filter matches.
    And(Vec<Filter>),
}

/// A projected query over one table, usable as a subquery.
#[derive(Debug, Clone, PartialEq)]
pub struct ScopeQuery {
    /// Table to read.
    pub table: String,
    /// Column to project.
    pub projection: String,
    /// Rows to project from.
    pub filter: Filter,
}

impl Filter {
    /// Field equals the value.
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Field differs from the value.
    pub fn ne(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Ne {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Field is one of the values.
    pub fn in_values(field: impl Into<String>, values: Vec<Value>) -> Self {
        Filter::In {
            field: field.into(),
            values,
        }
    }

    /// Field is in the projection of another scope.
    pub fn in_scope(field: impl Into<String>, scope: ScopeQuery) -> Self {
        Filter::InScope {
            field: field.into(),
            scope: Box::new(scope),
        }
    }

    /// Conjoin filters, collapsing trivial cases.
    pub fn and(mut terms: Vec<Filter>) -> Self {
        terms.retain(|t| !matches!(t, Filter::All));
        match terms.len() {
            0 => Filter::All,
            1 => terms.remove(0),
            _ => Filter::And(terms),
        }
    }
}

/// Evaluates filters against decoded rows.
///
/// Scope subqueries must be resolved into plain `In` sets by the store
/// before evaluation; see [`SledStore`](super::SledStore).
pub struct FilterEvaluator;

impl FilterEvaluator {
    /// Evaluate a filter against a row.
    ///
    /// Returns `true` if the row matches the filter, `false` otherwise.
    pub fn evaluate(filter: &Filter, row: &Row) -> Result<bool, Error> {
        match filter {
            Filter::All => Ok(true),
            Filter::Eq { field, value } => {
                Ok(row.get(field).is_some_and(|fv| values_equal(fv, value)))
            }
            Filter::Ne { field, value } => {
                // A missing field differs from any value.
                Ok(!row.get(field).is_some_and(|fv| values_equal(fv, value)))
            }
            Filter::In { field, values } => Ok(row
                .get(field)
                .is_some_and(|fv| values.iter().any(|v| values_equal(fv, v)))),
            Filter::InScope { .. } => Err(Error::InvalidData(
                "scope subquery must be resolved before row evaluation".into(),
            )),
            Filter::And(filters) => {
                for f in filters {
                    if !Self::evaluate(f, row)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
        }
    }
}

/// Check if two values are equal, coercing across integer widths.
pub(crate) fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Int32(a), Value::Int32(b)) => a == b,
        (Value::Int64(a), Value::Int64(b)) => a == b,
        (Value::Int32(a), Value::Int64(b)) => (*a as i64) == *b,
        (Value::Int64(a), Value::Int32(b)) => *a == (*b as i64),
        (Value::Float64(a), Value::Float64(b)) => a == b,
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Bytes(a), Value::Bytes(b)) => a == b,
        (Value::Uuid(a), Value::Uuid(b)) => a == b,
        (Value::Timestamp(a), Value::Timestamp(b)) => a == b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> Row {
        Row::new()
            .with("id", 7i64)
            .with("status", "active")
            .with("pinned", true)
    }

    #[test]
    fn test_all_matches_everything() {
        assert!(FilterEvaluator::evaluate(&Filter::All, &row()).unwrap());
        assert!(FilterEvaluator::evaluate(&Filter::All, &Row::new()).unwrap());
    }

    #[test]
    fn test_eq_filter() {
        let filter = Filter::eq("status", "active");
        assert!(FilterEvaluator::evaluate(&filter, &row()).unwrap());

        let filter = Filter::eq("status", "archived");
        assert!(!FilterEvaluator::evaluate(&filter, &row()).unwrap());
    }

    #[test]
    fn test_ne_filter() {
        let filter = Filter::ne("status", "archived");
        assert!(FilterEvaluator::evaluate(&filter, &row()).unwrap());

        let filter = Filter::ne("status", "active");
        assert!(!FilterEvaluator::evaluate(&filter, &row()).unwrap());

        // Missing fields differ from any value.
        let filter = Filter::ne("missing", "x");
        assert!(FilterEvaluator::evaluate(&filter, &row()).unwrap());
    }

    #[test]
    fn test_in_filter() {
        let filter = Filter::in_values("id", vec![Value::Int64(3), Value::Int64(7)]);
        assert!(FilterEvaluator::evaluate(&filter, &row()).unwrap());

        let filter = Filter::in_values("id", vec![Value::Int64(3)]);
        assert!(!FilterEvaluator::evaluate(&filter, &row()).unwrap());

        let filter = Filter::in_values("id", vec![]);
        assert!(!FilterEvaluator::evaluate(&filter, &row()).unwrap());
    }

    #[test]
    fn test_and_filter() {
        let filter = Filter::And(vec![
            Filter::eq("status", "active"),
            Filter::eq("pinned", true),
        ]);
        assert!(FilterEvaluator::evaluate(&filter, &row()).unwrap());

        let filter = Filter::And(vec![
            Filter::eq("status", "active"),
            Filter::eq("pinned", false),
        ]);
        assert!(!FilterEvaluator::evaluate(&filter, &row()).unwrap());

        // Empty conjunction is true.
        assert!(FilterEvaluator::evaluate(&Filter::And(vec![]), &row()).unwrap());
    }

    #[test]
    fn test_and_collapses() {
        assert_eq!(Filter::and(vec![]), Filter::All);
        assert_eq!(Filter::and(vec![Filter::All]), Filter::All);
        assert_eq!(
            Filter::and(vec![Filter::All, Filter::eq("a", 1i64)]),
            Filter::eq("a", 1i64)
        );
        assert!(matches!(
            Filter::and(vec![Filter::eq("a", 1i64), Filter::ne("b", 2i64)]),
            Filter::And(_)
        ));
    }

    #[test]
    fn test_missing_field_never_equal() {
        let filter = Filter::eq("missing", 1i64);
        assert!(!FilterEvaluator::evaluate(&filter, &row()).unwrap());
    }

    #[test]
    fn test_integer_coercion() {
        let row = Row::new().with("n", Value::Int64(100));
        let filter = Filter::eq("n", Value::Int32(100));
        assert!(FilterEvaluator::evaluate(&filter, &row).unwrap());

        let filter = Filter::in_values("n", vec![Value::Int32(100)]);
        assert!(FilterEvaluator::evaluate(&filter, &row).unwrap());
    }

    #[test]
    fn test_unresolved_scope_rejected() {
        let filter = Filter::in_scope(
            "user_id",
            ScopeQuery {
                table: "users".into(),
                projection: "id".into(),
                filter: Filter::All,
            },
        );
        assert!(FilterEvaluator::evaluate(&filter, &row()).is_err());
    }
}
