//! Member repository.
//!
//! # Invariants
//! - Derived lookups are plain filter/sort specs; list results are ordered by
//!   id unless a sort is passed in.
//! - `find_all_with_team` and `find_page_with_team` issue at most one extra
//!   team query per call.

use super::team_repo::load_teams;
use super::{RepoError, RepoResult};
use crate::executor::{Loaded, QueryExecutor};
use crate::model::member::{
    validate_username, Member, MemberDto, MemberId, MemberWithTeam, NewMember,
};
use crate::model::record::Record;
use crate::model::team::TeamId;
use crate::model::value::FieldValue;
use crate::query::{CountMode, FilterSpec, Mutation, PageResult, PageWindow, SortSpec};
use crate::schema::MEMBERS;
use crate::store::RecordStore;

/// Repository interface for member use-cases.
pub trait MemberRepository {
    /// Validates and inserts a member; returns it with id and audit stamps.
    fn save(&mut self, member: &NewMember) -> RepoResult<Member>;
    /// Cache-first lookup; a copy loaded before a bulk update comes back
    /// flagged stale.
    fn find_by_id(&mut self, id: MemberId) -> RepoResult<Option<Loaded<Member>>>;
    /// Reloads one member from the store.
    fn refresh(&mut self, id: MemberId) -> RepoResult<Member>;
    fn find_all(&mut self, sort: &SortSpec) -> RepoResult<Vec<Member>>;
    fn count(&self) -> RepoResult<u64>;
    fn delete(&mut self, id: MemberId) -> RepoResult<()>;
    fn change_username(&mut self, id: MemberId, username: &str) -> RepoResult<Member>;
    /// Moves a member to `team_id`, or out of any team with `None`.
    fn change_team(&mut self, id: MemberId, team_id: Option<TeamId>) -> RepoResult<Member>;
    fn find_by_username(&mut self, username: &str) -> RepoResult<Vec<Member>>;
    fn find_by_username_and_age_greater_than(
        &mut self,
        username: &str,
        age: i64,
    ) -> RepoResult<Vec<Member>>;
    /// Members matching both `username` and exactly `age`.
    fn find_user(&mut self, username: &str, age: i64) -> RepoResult<Vec<Member>>;
    /// Members whose username is one of `names`; empty `names` matches none.
    fn find_by_names(&mut self, names: &[&str]) -> RepoResult<Vec<Member>>;
    /// Single-result lookup.
    ///
    /// # Errors
    /// - `RepoError::NonUniqueResult` when several members share `username`.
    fn find_one_by_username(&mut self, username: &str) -> RepoResult<Option<Member>>;
    /// Usernames of every member, ordered by id.
    fn find_username_list(&mut self) -> RepoResult<Vec<String>>;
    fn find_by_age(
        &mut self,
        age: i64,
        window: PageWindow,
        sort: &SortSpec,
        mode: CountMode,
    ) -> RepoResult<PageResult<Member>>;
    /// Adds one to the age of every member aged `min_age` or older; returns
    /// the affected count.
    fn bulk_age_plus(&mut self, min_age: i64) -> RepoResult<usize>;
    fn find_all_with_team(&mut self) -> RepoResult<Vec<MemberWithTeam>>;
    fn find_with_team_by_username(
        &mut self,
        username: &str,
    ) -> RepoResult<Vec<MemberWithTeam>>;
    /// One page of members with their teams.
    fn find_page_with_team(
        &mut self,
        window: PageWindow,
        sort: &SortSpec,
        mode: CountMode,
    ) -> RepoResult<PageResult<MemberWithTeam>>;
    /// Projections of members that belong to a team; team-less members are
    /// skipped.
    fn find_member_dtos(&mut self) -> RepoResult<Vec<MemberDto>>;
}

/// Member repository borrowing a query executor.
pub struct ExecutorMemberRepository<'e, S> {
    executor: &'e mut QueryExecutor<S>,
}

impl<'e, S: RecordStore> ExecutorMemberRepository<'e, S> {
    pub fn new(executor: &'e mut QueryExecutor<S>) -> Self {
        Self { executor }
    }

    fn find_where(&mut self, filter: &FilterSpec, sort: &SortSpec) -> RepoResult<Vec<Member>> {
        to_members(self.executor.fetch_all(&MEMBERS, filter, sort)?)
    }

    fn attach_teams(&mut self, members: Vec<Member>) -> RepoResult<Vec<MemberWithTeam>> {
        let teams = load_teams(
            self.executor,
            members.iter().filter_map(|member| member.team_id),
        )?;
        Ok(members
            .into_iter()
            .map(|member| {
                let team = member
                    .team_id
                    .and_then(|team_id| teams.get(&team_id).cloned());
                MemberWithTeam { member, team }
            })
            .collect())
    }
}

impl<S: RecordStore> MemberRepository for ExecutorMemberRepository<'_, S> {
    fn save(&mut self, member: &NewMember) -> RepoResult<Member> {
        member.validate()?;
        let record = self.executor.insert(&MEMBERS, &member.to_values())?;
        Ok(Member::try_from(record)?)
    }

    fn find_by_id(&mut self, id: MemberId) -> RepoResult<Option<Loaded<Member>>> {
        self.executor
            .find_by_id(&MEMBERS, id)?
            .map(|loaded| loaded.try_map(Member::try_from))
            .transpose()
            .map_err(RepoError::from)
    }

    fn refresh(&mut self, id: MemberId) -> RepoResult<Member> {
        Ok(Member::try_from(self.executor.refresh(&MEMBERS, id)?)?)
    }

    fn find_all(&mut self, sort: &SortSpec) -> RepoResult<Vec<Member>> {
        self.find_where(&FilterSpec::all(), sort)
    }

    fn count(&self) -> RepoResult<u64> {
        Ok(self.executor.count(&MEMBERS, &FilterSpec::all())?)
    }

    fn delete(&mut self, id: MemberId) -> RepoResult<()> {
        Ok(self.executor.delete_by_id(&MEMBERS, id)?)
    }

    fn change_username(&mut self, id: MemberId, username: &str) -> RepoResult<Member> {
        validate_username(username)?;
        let record =
            self.executor
                .update_by_id(&MEMBERS, id, &Mutation::new().set("username", username))?;
        Ok(Member::try_from(record)?)
    }

    fn change_team(&mut self, id: MemberId, team_id: Option<TeamId>) -> RepoResult<Member> {
        let team = team_id.map_or(FieldValue::Null, FieldValue::Reference);
        let record = self
            .executor
            .update_by_id(&MEMBERS, id, &Mutation::new().set("team_id", team))?;
        Ok(Member::try_from(record)?)
    }

    fn find_by_username(&mut self, username: &str) -> RepoResult<Vec<Member>> {
        self.find_where(
            &FilterSpec::all().eq("username", username),
            &SortSpec::unsorted(),
        )
    }

    fn find_by_username_and_age_greater_than(
        &mut self,
        username: &str,
        age: i64,
    ) -> RepoResult<Vec<Member>> {
        self.find_where(
            &FilterSpec::all().eq("username", username).gt("age", age),
            &SortSpec::unsorted(),
        )
    }

    fn find_user(&mut self, username: &str, age: i64) -> RepoResult<Vec<Member>> {
        self.find_where(
            &FilterSpec::all().eq("username", username).eq("age", age),
            &SortSpec::unsorted(),
        )
    }

    fn find_by_names(&mut self, names: &[&str]) -> RepoResult<Vec<Member>> {
        self.find_where(
            &FilterSpec::all().in_set("username", names.iter().copied()),
            &SortSpec::unsorted(),
        )
    }

    fn find_one_by_username(&mut self, username: &str) -> RepoResult<Option<Member>> {
        let window = PageWindow::from_offset(0, 1)?;
        let mut page = self.executor.fetch_page(
            &MEMBERS,
            &FilterSpec::all().eq("username", username),
            &SortSpec::unsorted(),
            window,
            CountMode::SliceOnly,
        )?;
        if page.has_next {
            return Err(RepoError::NonUniqueResult {
                table: MEMBERS.table,
                field: "username",
            });
        }
        page.content
            .pop()
            .map(|record| Member::try_from(record).map_err(RepoError::from))
            .transpose()
    }

    fn find_username_list(&mut self) -> RepoResult<Vec<String>> {
        Ok(self
            .find_all(&SortSpec::unsorted())?
            .into_iter()
            .map(|member| member.username)
            .collect())
    }

    fn find_by_age(
        &mut self,
        age: i64,
        window: PageWindow,
        sort: &SortSpec,
        mode: CountMode,
    ) -> RepoResult<PageResult<Member>> {
        let page = self.executor.fetch_page(
            &MEMBERS,
            &FilterSpec::all().eq("age", age),
            sort,
            window,
            mode,
        )?;
        Ok(page.try_map(Member::try_from)?)
    }

    fn bulk_age_plus(&mut self, min_age: i64) -> RepoResult<usize> {
        Ok(self.executor.bulk_update(
            &MEMBERS,
            &FilterSpec::all().ge("age", min_age),
            &Mutation::new().add("age", 1),
        )?)
    }

    fn find_all_with_team(&mut self) -> RepoResult<Vec<MemberWithTeam>> {
        let members = self.find_all(&SortSpec::unsorted())?;
        self.attach_teams(members)
    }

    fn find_with_team_by_username(
        &mut self,
        username: &str,
    ) -> RepoResult<Vec<MemberWithTeam>> {
        let members = self.find_by_username(username)?;
        self.attach_teams(members)
    }

    fn find_page_with_team(
        &mut self,
        window: PageWindow,
        sort: &SortSpec,
        mode: CountMode,
    ) -> RepoResult<PageResult<MemberWithTeam>> {
        let page = self
            .executor
            .fetch_page(&MEMBERS, &FilterSpec::all(), sort, window, mode)?
            .try_map(Member::try_from)?;
        let PageResult {
            content,
            window,
            total_elements,
            has_next,
        } = page;
        Ok(PageResult {
            content: self.attach_teams(content)?,
            window,
            total_elements,
            has_next,
        })
    }

    fn find_member_dtos(&mut self) -> RepoResult<Vec<MemberDto>> {
        Ok(self
            .find_all_with_team()?
            .iter()
            .filter(|joined| joined.team.is_some())
            .map(MemberDto::from)
            .collect())
    }
}

fn to_members(records: Vec<Record>) -> RepoResult<Vec<Member>> {
    records
        .into_iter()
        .map(|record| Member::try_from(record).map_err(RepoError::from))
        .collect()
}
