//! Set-based write descriptions.
//!
//! # Invariants
//! - A mutation has at least one assignment and touches each field once.
//! - Generated fields (primary key, audit timestamps) are never assigned.
//! - `Add` only applies to integer fields.

use crate::model::value::FieldValue;
use crate::query::filter::coerce;
use crate::query::{QueryError, QueryResult};
use crate::schema::{FieldKind, TableSchema};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Assignment {
    /// `field = value`
    Set { field: String, value: FieldValue },
    /// `field = field + delta`
    Add { field: String, delta: i64 },
}

impl Assignment {
    pub fn field(&self) -> &str {
        match self {
            Self::Set { field, .. } | Self::Add { field, .. } => field.as_str(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ResolvedAssignment {
    Set {
        column: &'static str,
        value: FieldValue,
    },
    Add {
        column: &'static str,
        delta: i64,
    },
}

/// Ordered assignments applied by one `UPDATE`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mutation {
    assignments: Vec<Assignment>,
}

impl Mutation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.assignments.push(Assignment::Set {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    pub fn add(mut self, field: impl Into<String>, delta: i64) -> Self {
        self.assignments.push(Assignment::Add {
            field: field.into(),
            delta,
        });
        self
    }

    pub fn assignments(&self) -> &[Assignment] {
        &self.assignments
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    pub fn validate(&self, schema: &TableSchema) -> QueryResult<()> {
        self.resolve(schema).map(|_| ())
    }

    pub(crate) fn resolve(&self, schema: &TableSchema) -> QueryResult<Vec<ResolvedAssignment>> {
        if self.assignments.is_empty() {
            return Err(QueryError::InvalidMutation(
                "mutation has no assignments".to_string(),
            ));
        }

        let mut seen = BTreeSet::new();
        let mut resolved = Vec::with_capacity(self.assignments.len());
        for assignment in &self.assignments {
            let field = schema.field(assignment.field())?;
            if !field.is_writable() {
                return Err(QueryError::InvalidMutation(format!(
                    "field `{}` is generated by the store",
                    field.name
                )));
            }
            if !seen.insert(field.name) {
                return Err(QueryError::InvalidMutation(format!(
                    "field `{}` is assigned more than once",
                    field.name
                )));
            }

            resolved.push(match assignment {
                Assignment::Set { value, .. } => ResolvedAssignment::Set {
                    column: field.column,
                    value: coerce(field, value.clone(), true)?,
                },
                Assignment::Add { delta, .. } => {
                    if field.kind != FieldKind::Integer {
                        return Err(QueryError::InvalidMutation(format!(
                            "cannot add to {} field `{}`",
                            field.kind, field.name
                        )));
                    }
                    ResolvedAssignment::Add {
                        column: field.column,
                        delta: *delta,
                    }
                }
            });
        }
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::{Mutation, ResolvedAssignment};
    use crate::model::value::FieldValue;
    use crate::query::QueryError;
    use crate::schema::MEMBERS;

    #[test]
    fn resolves_set_and_add() {
        let resolved = Mutation::new()
            .add("age", 1)
            .set("team_id", 2)
            .resolve(&MEMBERS)
            .unwrap();
        assert_eq!(
            resolved,
            vec![
                ResolvedAssignment::Add {
                    column: "age",
                    delta: 1
                },
                ResolvedAssignment::Set {
                    column: "team_id",
                    value: FieldValue::Reference(2)
                },
            ]
        );
    }

    #[test]
    fn rejects_empty_generated_duplicate_and_non_integer_add() {
        for mutation in [
            Mutation::new(),
            Mutation::new().set("id", 5),
            Mutation::new().set("updated_at", 5),
            Mutation::new().add("age", 1).add("age", 2),
            Mutation::new().add("username", 1),
        ] {
            assert!(matches!(
                mutation.validate(&MEMBERS),
                Err(QueryError::InvalidMutation(_))
            ));
        }
    }

    #[test]
    fn set_checks_value_type() {
        assert!(matches!(
            Mutation::new().set("age", "old").validate(&MEMBERS),
            Err(QueryError::TypeMismatch { .. })
        ));
    }
}
