//! Member use-case service.
//!
//! # Responsibility
//! - Convert external paging parameters (`page`, `size`, `sort`) into a
//!   `PageWindow` and `SortSpec`.
//! - Serve member pages as outward-facing `MemberDto` payloads.
//!
//! # Invariants
//! - A missing page means page 0; a missing size means the configured default.
//! - Requested sizes above the configured maximum are clamped, never rejected.
//! - Sort terms read `field` or `field,direction`; direction defaults to `asc`.

use crate::config::StoreConfig;
use crate::model::member::{Member, MemberDto, NewMember};
use crate::query::{CountMode, Direction, PagePayload, PageWindow, QueryError, SortSpec};
use crate::repo::{MemberRepository, RepoError};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for member use-cases.
#[derive(Debug)]
pub enum MemberServiceError {
    /// A `sort` parameter is not `field` or `field,asc|desc`.
    InvalidSortParameter(String),
    /// Persistence or query failure.
    Repo(RepoError),
}

impl Display for MemberServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidSortParameter(value) => write!(f, "invalid sort parameter: `{value}`"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for MemberServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::InvalidSortParameter(_) => None,
        }
    }
}

impl From<RepoError> for MemberServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<QueryError> for MemberServiceError {
    fn from(value: QueryError) -> Self {
        Self::Repo(RepoError::from(value))
    }
}

pub type MemberServiceResult<T> = Result<T, MemberServiceError>;

/// Page size defaults applied to external requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagingDefaults {
    pub default_size: u32,
    pub max_size: u32,
}

impl Default for PagingDefaults {
    fn default() -> Self {
        Self::from_config(&StoreConfig::default())
    }
}

impl PagingDefaults {
    pub fn from_config(config: &StoreConfig) -> Self {
        let config = config.clone().normalized();
        Self {
            default_size: config.default_page_size,
            max_size: config.max_page_size,
        }
    }
}

/// External page request, as received from a caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageParams {
    pub page: Option<i64>,
    pub size: Option<i64>,
    /// `field` or `field,direction` terms, highest priority first.
    pub sort: Vec<String>,
    pub mode: CountMode,
}

impl Default for PageParams {
    fn default() -> Self {
        Self {
            page: None,
            size: None,
            sort: Vec::new(),
            mode: CountMode::WithTotal,
        }
    }
}

impl PageParams {
    /// Resolves the request window.
    ///
    /// # Errors
    /// - `QueryError::InvalidPageRequest` for a negative page or a
    ///   non-positive size.
    pub fn window(&self, defaults: PagingDefaults) -> Result<PageWindow, QueryError> {
        let size = self
            .size
            .unwrap_or(i64::from(defaults.default_size))
            .min(i64::from(defaults.max_size));
        PageWindow::of_page(self.page.unwrap_or(0), size)
    }

    pub fn sort_spec(&self) -> MemberServiceResult<SortSpec> {
        parse_sort(&self.sort)
    }
}

/// Parses `field[,direction]` terms into a sort spec.
pub fn parse_sort(terms: &[String]) -> MemberServiceResult<SortSpec> {
    let mut spec = SortSpec::unsorted();
    for term in terms {
        let invalid = || MemberServiceError::InvalidSortParameter(term.clone());
        let mut parts = term.split(',').map(str::trim);
        let field = parts.next().filter(|field| !field.is_empty()).ok_or_else(invalid)?;
        let direction = match parts.next() {
            None => Direction::Asc,
            Some(value) => Direction::parse(value).ok_or_else(invalid)?,
        };
        if parts.next().is_some() {
            return Err(invalid());
        }
        spec = spec.then(field, direction);
    }
    Ok(spec)
}

/// Use-case service wrapper for member paging and seeding.
pub struct MemberService<R: MemberRepository> {
    repo: R,
    paging: PagingDefaults,
}

impl<R: MemberRepository> MemberService<R> {
    pub fn new(repo: R, paging: PagingDefaults) -> Self {
        Self { repo, paging }
    }

    pub fn repo(&mut self) -> &mut R {
        &mut self.repo
    }

    /// Lists one page of members with their team names.
    ///
    /// # Errors
    /// - `InvalidSortParameter` for malformed sort terms.
    /// - `Repo` for invalid windows, unknown sort fields and store failures.
    pub fn list_members(
        &mut self,
        params: &PageParams,
    ) -> MemberServiceResult<PagePayload<MemberDto>> {
        let sort = params.sort_spec()?;
        let window = params.window(self.paging)?;
        let page = self.repo.find_page_with_team(window, &sort, params.mode)?;
        Ok(page.map(|joined| MemberDto::from(&joined)).into_payload())
    }

    /// Inserts `count` members named `user{i}` with age `i`.
    pub fn seed_members(&mut self, count: u32) -> MemberServiceResult<Vec<Member>> {
        let members = (0..count)
            .map(|i| self.repo.save(&NewMember::new(format!("user{i}"), i64::from(i))))
            .collect::<Result<Vec<_>, _>>()?;
        info!(
            "event=seed_members module=service status=ok count={}",
            members.len()
        );
        Ok(members)
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_sort, MemberServiceError, PageParams, PagingDefaults};
    use crate::query::{Direction, QueryError, SortKey};

    const DEFAULTS: PagingDefaults = PagingDefaults {
        default_size: 20,
        max_size: 100,
    };

    #[test]
    fn missing_page_and_size_use_defaults() {
        let window = PageParams::default().window(DEFAULTS).unwrap();
        assert_eq!(window.page_number(), 0);
        assert_eq!(window.page_size(), 20);
    }

    #[test]
    fn oversized_page_is_clamped() {
        let params = PageParams {
            page: Some(2),
            size: Some(5_000),
            ..PageParams::default()
        };
        let window = params.window(DEFAULTS).unwrap();
        assert_eq!(window.page_size(), 100);
        assert_eq!(window.offset(), 200);
    }

    #[test]
    fn negative_page_is_an_invalid_page_request() {
        let params = PageParams {
            page: Some(-1),
            ..PageParams::default()
        };
        assert!(matches!(
            params.window(DEFAULTS),
            Err(QueryError::InvalidPageRequest(_))
        ));
    }

    #[test]
    fn sort_terms_parse_with_default_direction() {
        let spec = parse_sort(&["username,desc".to_string(), "age".to_string()]).unwrap();
        assert_eq!(
            spec.keys(),
            &[
                SortKey {
                    field: "username".to_string(),
                    direction: Direction::Desc
                },
                SortKey {
                    field: "age".to_string(),
                    direction: Direction::Asc
                },
            ]
        );
    }

    #[test]
    fn malformed_sort_terms_are_rejected() {
        for term in [",desc", "age,sideways", "age,asc,extra", ""] {
            assert!(matches!(
                parse_sort(&[term.to_string()]),
                Err(MemberServiceError::InvalidSortParameter(_))
            ));
        }
    }
}
