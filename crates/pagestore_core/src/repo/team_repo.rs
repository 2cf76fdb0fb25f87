//! Team repository.

use super::{RepoError, RepoResult};
use crate::executor::{Loaded, QueryExecutor};
use crate::model::team::{validate_team_name, Team, TeamId};
use crate::model::value::FieldValue;
use crate::query::{FilterSpec, SortSpec};
use crate::schema::TEAMS;
use crate::store::RecordStore;
use std::collections::{BTreeSet, HashMap};

/// Repository interface for team use-cases.
pub trait TeamRepository {
    /// Inserts a team and returns it with its assigned id.
    fn save(&mut self, name: &str) -> RepoResult<Team>;
    fn find_by_id(&mut self, id: TeamId) -> RepoResult<Option<Loaded<Team>>>;
    /// All teams ordered by id.
    fn find_all(&mut self) -> RepoResult<Vec<Team>>;
    /// Teams whose id is in `ids`, ordered by id; unknown ids are skipped.
    fn find_by_ids(&mut self, ids: &[TeamId]) -> RepoResult<Vec<Team>>;
    fn count(&self) -> RepoResult<u64>;
    fn delete(&mut self, id: TeamId) -> RepoResult<()>;
}

/// Team repository borrowing a query executor.
pub struct ExecutorTeamRepository<'e, S> {
    executor: &'e mut QueryExecutor<S>,
}

impl<'e, S: RecordStore> ExecutorTeamRepository<'e, S> {
    pub fn new(executor: &'e mut QueryExecutor<S>) -> Self {
        Self { executor }
    }
}

impl<S: RecordStore> TeamRepository for ExecutorTeamRepository<'_, S> {
    fn save(&mut self, name: &str) -> RepoResult<Team> {
        validate_team_name(name)?;
        let record = self
            .executor
            .insert(&TEAMS, &[("name", FieldValue::from(name))])?;
        Ok(Team::try_from(record)?)
    }

    fn find_by_id(&mut self, id: TeamId) -> RepoResult<Option<Loaded<Team>>> {
        self.executor
            .find_by_id(&TEAMS, id)?
            .map(|loaded| loaded.try_map(Team::try_from))
            .transpose()
            .map_err(RepoError::from)
    }

    fn find_all(&mut self) -> RepoResult<Vec<Team>> {
        self.executor
            .fetch_all(&TEAMS, &FilterSpec::all(), &SortSpec::unsorted())?
            .into_iter()
            .map(|record| Team::try_from(record).map_err(RepoError::from))
            .collect()
    }

    fn find_by_ids(&mut self, ids: &[TeamId]) -> RepoResult<Vec<Team>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.executor
            .fetch_all(
                &TEAMS,
                &FilterSpec::all().in_set("id", ids.iter().copied()),
                &SortSpec::unsorted(),
            )?
            .into_iter()
            .map(|record| Team::try_from(record).map_err(RepoError::from))
            .collect()
    }

    fn count(&self) -> RepoResult<u64> {
        Ok(self.executor.count(&TEAMS, &FilterSpec::all())?)
    }

    fn delete(&mut self, id: TeamId) -> RepoResult<()> {
        Ok(self.executor.delete_by_id(&TEAMS, id)?)
    }
}

/// Loads the distinct teams referenced by `ids` with one `IN` query.
pub(crate) fn load_teams<S: RecordStore>(
    executor: &mut QueryExecutor<S>,
    ids: impl IntoIterator<Item = TeamId>,
) -> RepoResult<HashMap<TeamId, Team>> {
    let ids = ids.into_iter().collect::<BTreeSet<_>>();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let records = executor.fetch_all(
        &TEAMS,
        &FilterSpec::all().in_set("id", ids),
        &SortSpec::unsorted(),
    )?;
    records
        .into_iter()
        .map(|record| {
            let team = Team::try_from(record)?;
            Ok((team.id, team))
        })
        .collect()
}
