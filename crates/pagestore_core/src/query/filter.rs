//! Conjunctive record filters.
//!
//! # Invariants
//! - An empty `FilterSpec` matches every record.
//! - All predicates are AND-ed; there is no disjunction.
//! - Membership in an empty set matches nothing.

use crate::model::value::FieldValue;
use crate::query::{QueryError, QueryResult};
use crate::schema::{FieldDef, TableSchema};

/// Comparison applied to one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Comparator {
    /// Equality; `Eq(FieldValue::Null)` matches null values.
    Eq(FieldValue),
    Gt(FieldValue),
    Ge(FieldValue),
    Lt(FieldValue),
    Le(FieldValue),
    In(Vec<FieldValue>),
}

/// One field-comparator-value term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    pub field: String,
    pub comparator: Comparator,
}

/// Predicate with its field resolved and its values coerced to the field kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ResolvedPredicate {
    pub column: &'static str,
    pub comparator: Comparator,
}

/// Declarative predicate set for record selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSpec {
    predicates: Vec<Predicate>,
}

impl FilterSpec {
    /// Filter matching every record.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn eq(self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.and(field, Comparator::Eq(value.into()))
    }

    pub fn gt(self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.and(field, Comparator::Gt(value.into()))
    }

    pub fn ge(self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.and(field, Comparator::Ge(value.into()))
    }

    pub fn lt(self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.and(field, Comparator::Lt(value.into()))
    }

    pub fn le(self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.and(field, Comparator::Le(value.into()))
    }

    pub fn in_set<V, I>(self, field: impl Into<String>, values: I) -> Self
    where
        V: Into<FieldValue>,
        I: IntoIterator<Item = V>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.and(field, Comparator::In(values))
    }

    /// Appends one predicate.
    pub fn and(mut self, field: impl Into<String>, comparator: Comparator) -> Self {
        self.predicates.push(Predicate {
            field: field.into(),
            comparator,
        });
        self
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Checks field names and value types without building SQL.
    pub fn validate(&self, schema: &TableSchema) -> QueryResult<()> {
        self.resolve(schema).map(|_| ())
    }

    pub(crate) fn resolve(&self, schema: &TableSchema) -> QueryResult<Vec<ResolvedPredicate>> {
        self.predicates
            .iter()
            .map(|predicate| {
                let field = schema.field(&predicate.field)?;
                let comparator = match &predicate.comparator {
                    Comparator::Eq(value) => Comparator::Eq(coerce(field, value.clone(), true)?),
                    Comparator::Gt(value) => Comparator::Gt(coerce(field, value.clone(), false)?),
                    Comparator::Ge(value) => Comparator::Ge(coerce(field, value.clone(), false)?),
                    Comparator::Lt(value) => Comparator::Lt(coerce(field, value.clone(), false)?),
                    Comparator::Le(value) => Comparator::Le(coerce(field, value.clone(), false)?),
                    Comparator::In(values) => Comparator::In(
                        values
                            .iter()
                            .map(|value| coerce(field, value.clone(), false))
                            .collect::<QueryResult<Vec<_>>>()?,
                    ),
                };
                Ok(ResolvedPredicate {
                    column: field.column,
                    comparator,
                })
            })
            .collect()
    }
}

pub(crate) fn coerce(field: &FieldDef, value: FieldValue, allow_null: bool) -> QueryResult<FieldValue> {
    if value.is_null() && !allow_null {
        return Err(type_mismatch(field));
    }
    value.coerce_to(field.kind).ok_or_else(|| type_mismatch(field))
}

fn type_mismatch(field: &FieldDef) -> QueryError {
    QueryError::TypeMismatch {
        field: field.name.to_string(),
        expected: field.kind,
    }
}
