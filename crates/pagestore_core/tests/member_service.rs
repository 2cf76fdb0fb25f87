use pagestore_core::{
    ConnectionPool, CountMode, ExecutorMemberRepository, ExecutorTeamRepository, MemberRepository,
    MemberService, MemberServiceError, NewMember, PageParams, PagingDefaults, PoolOptions,
    QueryError, QueryExecutor, RepoError, SqliteRecordStore, StoreConfig, TeamRepository,
};
use serde_json::json;
use std::sync::Arc;

fn executor() -> QueryExecutor<SqliteRecordStore> {
    let pool = ConnectionPool::in_memory(PoolOptions::default()).unwrap();
    QueryExecutor::new(SqliteRecordStore::try_new(Arc::new(pool)).unwrap())
}

fn params(page: Option<i64>, size: Option<i64>, sort: &[&str]) -> PageParams {
    PageParams {
        page,
        size,
        sort: sort.iter().map(|term| term.to_string()).collect(),
        mode: CountMode::WithTotal,
    }
}

#[test]
fn list_members_serializes_page_payload() {
    let mut executor = executor();
    let team = ExecutorTeamRepository::new(&mut executor)
        .save("teamA")
        .unwrap();

    let mut service = MemberService::new(
        ExecutorMemberRepository::new(&mut executor),
        PagingDefaults::default(),
    );
    service.seed_members(5).unwrap();
    service
        .repo()
        .change_team(1, Some(team.id))
        .unwrap();

    let payload = service
        .list_members(&params(Some(0), Some(2), &["age,asc"]))
        .unwrap();
    let json = serde_json::to_value(&payload).unwrap();
    assert_eq!(
        json,
        json!({
            "content": [
                {"id": 1, "username": "user0", "teamName": "teamA"},
                {"id": 2, "username": "user1", "teamName": null},
            ],
            "totalElements": 5,
            "totalPages": 3,
            "number": 0,
            "first": true,
            "last": false,
        })
    );
}

#[test]
fn slice_mode_payload_has_no_totals() {
    let mut executor = executor();
    let mut service = MemberService::new(
        ExecutorMemberRepository::new(&mut executor),
        PagingDefaults::default(),
    );
    service.seed_members(3).unwrap();

    let mut request = params(Some(1), Some(2), &["username,desc"]);
    request.mode = CountMode::SliceOnly;
    let json = serde_json::to_value(service.list_members(&request).unwrap()).unwrap();
    assert_eq!(json["hasNext"], false);
    assert_eq!(json["content"][0]["username"], "user0");
    assert!(json.get("totalElements").is_none());
}

#[test]
fn defaults_and_clamping_come_from_config() {
    let mut executor = executor();
    let config = StoreConfig {
        default_page_size: 2,
        max_page_size: 3,
        ..StoreConfig::default()
    };
    let mut service = MemberService::new(
        ExecutorMemberRepository::new(&mut executor),
        PagingDefaults::from_config(&config),
    );
    service.seed_members(7).unwrap();

    let json = serde_json::to_value(service.list_members(&params(None, None, &[])).unwrap())
        .unwrap();
    assert_eq!(json["content"].as_array().map(Vec::len), Some(2));
    assert_eq!(json["totalPages"], 4);

    let json =
        serde_json::to_value(service.list_members(&params(None, Some(500), &[])).unwrap())
            .unwrap();
    assert_eq!(json["content"].as_array().map(Vec::len), Some(3));
    assert_eq!(json["totalPages"], 3);
}

#[test]
fn bad_requests_map_to_typed_errors() {
    let mut executor = executor();
    let mut service = MemberService::new(
        ExecutorMemberRepository::new(&mut executor),
        PagingDefaults::default(),
    );

    assert!(matches!(
        service.list_members(&params(None, None, &["age,upwards"])),
        Err(MemberServiceError::InvalidSortParameter(_))
    ));
    assert!(matches!(
        service.list_members(&params(None, None, &["nickname"])),
        Err(MemberServiceError::Repo(RepoError::Query(
            QueryError::UnknownField { .. }
        )))
    ));
    assert!(matches!(
        service.list_members(&params(Some(-1), None, &[])),
        Err(MemberServiceError::Repo(RepoError::Query(
            QueryError::InvalidPageRequest(_)
        )))
    ));
    assert!(matches!(
        service.list_members(&params(None, Some(0), &[])),
        Err(MemberServiceError::Repo(RepoError::Query(
            QueryError::InvalidPageRequest(_)
        )))
    ));
}

#[test]
fn seed_members_creates_sequential_users() {
    let mut executor = executor();
    let mut service = MemberService::new(
        ExecutorMemberRepository::new(&mut executor),
        PagingDefaults::default(),
    );
    let seeded = service.seed_members(3).unwrap();
    assert_eq!(
        seeded
            .iter()
            .map(|member| (member.username.as_str(), member.age))
            .collect::<Vec<_>>(),
        [("user0", 0), ("user1", 1), ("user2", 2)]
    );
    assert_eq!(service.repo().count().unwrap(), 3);
    assert!(service
        .repo()
        .save(&NewMember::new("user3", 3))
        .is_ok());
}
