//! Record ordering.
//!
//! # Invariants
//! - An empty `SortSpec` orders by primary key ascending.
//! - The primary key is appended as the last tie-break unless it is already a
//!   sort term, so orderings are total and repeatable.

use crate::query::QueryResult;
use crate::schema::TableSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    /// Parses `asc` / `desc`, case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "asc" => Some(Self::Asc),
            "desc" => Some(Self::Desc),
            _ => None,
        }
    }

    pub(crate) fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub field: String,
    pub direction: Direction,
}

/// Ordered sequence of sort keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortSpec {
    keys: Vec<SortKey>,
}

impl SortSpec {
    /// No explicit ordering; results come back by primary key.
    pub fn unsorted() -> Self {
        Self::default()
    }

    pub fn by(field: impl Into<String>, direction: Direction) -> Self {
        Self::default().then(field, direction)
    }

    pub fn asc(field: impl Into<String>) -> Self {
        Self::by(field, Direction::Asc)
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self::by(field, Direction::Desc)
    }

    /// Adds a lower-priority key used to break ties of earlier keys.
    pub fn then(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.keys.push(SortKey {
            field: field.into(),
            direction,
        });
        self
    }

    pub fn keys(&self) -> &[SortKey] {
        &self.keys
    }

    pub fn is_unsorted(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn validate(&self, schema: &TableSchema) -> QueryResult<()> {
        self.resolve(schema).map(|_| ())
    }

    /// Column/direction pairs including the primary-key tie-break.
    pub(crate) fn resolve(
        &self,
        schema: &TableSchema,
    ) -> QueryResult<Vec<(&'static str, Direction)>> {
        let mut resolved = self
            .keys
            .iter()
            .map(|key| Ok((schema.field(&key.field)?.column, key.direction)))
            .collect::<QueryResult<Vec<_>>>()?;

        let primary_key = schema.primary_key_column();
        if !resolved.iter().any(|(column, _)| *column == primary_key) {
            resolved.push((primary_key, Direction::Asc));
        }
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::{Direction, SortSpec};
    use crate::query::QueryError;
    use crate::schema::MEMBERS;

    #[test]
    fn empty_sort_falls_back_to_primary_key() {
        let resolved = SortSpec::unsorted().resolve(&MEMBERS).unwrap();
        assert_eq!(resolved, vec![("member_id", Direction::Asc)]);
    }

    #[test]
    fn primary_key_tie_break_is_appended_once() {
        let resolved = SortSpec::desc("age")
            .then("username", Direction::Asc)
            .resolve(&MEMBERS)
            .unwrap();
        assert_eq!(
            resolved,
            vec![
                ("age", Direction::Desc),
                ("username", Direction::Asc),
                ("member_id", Direction::Asc),
            ]
        );

        let explicit = SortSpec::desc("id").resolve(&MEMBERS).unwrap();
        assert_eq!(explicit, vec![("member_id", Direction::Desc)]);
    }

    #[test]
    fn unknown_sort_field_is_rejected() {
        assert!(matches!(
            SortSpec::asc("nickname").validate(&MEMBERS),
            Err(QueryError::UnknownField { .. })
        ));
    }

    #[test]
    fn direction_parse_is_case_insensitive() {
        assert_eq!(Direction::parse("DESC"), Some(Direction::Desc));
        assert_eq!(Direction::parse(" asc "), Some(Direction::Asc));
        assert_eq!(Direction::parse("up"), None);
    }
}
