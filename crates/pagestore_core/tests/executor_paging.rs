use pagestore_core::{
    ConnectionPool, CountMode, Direction, FieldValue, FilterSpec, PageWindow, PoolOptions,
    QueryError, QueryExecutor, Record, SortSpec, SqliteRecordStore, MEMBERS,
};
use std::sync::Arc;

fn executor() -> QueryExecutor<SqliteRecordStore> {
    let pool = ConnectionPool::in_memory(PoolOptions::default()).unwrap();
    QueryExecutor::new(SqliteRecordStore::try_new(Arc::new(pool)).unwrap())
}

fn insert_member(executor: &mut QueryExecutor<SqliteRecordStore>, username: &str, age: i64) -> Record {
    executor
        .insert(
            &MEMBERS,
            &[
                ("username", FieldValue::from(username)),
                ("age", FieldValue::from(age)),
            ],
        )
        .unwrap()
}

fn usernames(records: &[Record]) -> Vec<String> {
    records
        .iter()
        .map(|record| record.text("username").unwrap().unwrap().to_string())
        .collect()
}

#[test]
fn first_page_of_five_sorted_descending() {
    let mut executor = executor();
    for i in 1..=5 {
        insert_member(&mut executor, &format!("member{i}"), 10);
    }
    insert_member(&mut executor, "other", 20);

    let page = executor
        .fetch_page(
            &MEMBERS,
            &FilterSpec::all().eq("age", 10),
            &SortSpec::desc("username"),
            PageWindow::of_page(0, 3).unwrap(),
            CountMode::WithTotal,
        )
        .unwrap();

    assert_eq!(usernames(&page.content), ["member5", "member4", "member3"]);
    assert_eq!(page.total_elements, Some(5));
    assert_eq!(page.total_pages(), Some(2));
    assert_eq!(page.number(), 0);
    assert!(page.is_first());
    assert!(page.has_next);
    assert!(!page.has_previous());
}

#[test]
fn content_length_matches_remaining_rows_for_every_window() {
    let mut executor = executor();
    let total = 7_u64;
    for i in 0..total {
        insert_member(&mut executor, &format!("user{i}"), 30);
    }

    for limit in 1..=4_i64 {
        for offset in 0..=9_i64 {
            let window = PageWindow::from_offset(offset, limit).unwrap();
            let page = executor
                .fetch_page(
                    &MEMBERS,
                    &FilterSpec::all(),
                    &SortSpec::unsorted(),
                    window,
                    CountMode::WithTotal,
                )
                .unwrap();
            let remaining = total.saturating_sub(offset as u64);
            assert_eq!(page.len() as u64, remaining.min(limit as u64));
            assert_eq!(page.total_elements, Some(total));

            let slice = executor
                .fetch_page(
                    &MEMBERS,
                    &FilterSpec::all(),
                    &SortSpec::unsorted(),
                    window,
                    CountMode::SliceOnly,
                )
                .unwrap();
            assert_eq!(slice.content, page.content);
            assert_eq!(slice.has_next, ((offset + limit) as u64) < total);
            assert_eq!(slice.total_elements, None);
        }
    }
}

#[test]
fn page_beyond_the_end_is_empty_with_metadata() {
    let mut executor = executor();
    for i in 0..4 {
        insert_member(&mut executor, &format!("user{i}"), i);
    }

    let page = executor
        .fetch_page(
            &MEMBERS,
            &FilterSpec::all(),
            &SortSpec::unsorted(),
            PageWindow::of_page(10, 3).unwrap(),
            CountMode::WithTotal,
        )
        .unwrap();
    assert!(page.is_empty());
    assert_eq!(page.total_elements, Some(4));
    assert_eq!(page.total_pages(), Some(2));
    assert!(page.is_last());
    assert_eq!(page.number(), 10);
}

#[test]
fn empty_table_reports_zero_pages() {
    let mut executor = executor();
    let page = executor
        .fetch_page(
            &MEMBERS,
            &FilterSpec::all(),
            &SortSpec::unsorted(),
            PageWindow::of_page(0, 5).unwrap(),
            CountMode::WithTotal,
        )
        .unwrap();
    assert_eq!(page.total_elements, Some(0));
    assert_eq!(page.total_pages(), Some(0));
    assert!(page.is_first());
    assert!(page.is_last());
}

#[test]
fn ties_break_by_primary_key_and_repeat_exactly() {
    let mut executor = executor();
    let mut expected_ids = Vec::new();
    for name in ["c", "a", "b", "d"] {
        expected_ids.push(insert_member(&mut executor, name, 10).id);
    }
    insert_member(&mut executor, "young", 5);

    let sort = SortSpec::by("age", Direction::Desc);
    let first = executor
        .fetch_all(&MEMBERS, &FilterSpec::all(), &sort)
        .unwrap();
    let second = executor
        .fetch_all(&MEMBERS, &FilterSpec::all(), &sort)
        .unwrap();

    let ids = first.iter().map(|record| record.id).collect::<Vec<_>>();
    assert_eq!(&ids[..4], expected_ids.as_slice());
    assert_eq!(usernames(&first[4..]), ["young"]);
    assert_eq!(first, second);

    let paged = (0..3)
        .flat_map(|page| {
            executor
                .fetch_page(
                    &MEMBERS,
                    &FilterSpec::all(),
                    &sort,
                    PageWindow::of_page(page, 2).unwrap(),
                    CountMode::SliceOnly,
                )
                .unwrap()
                .content
        })
        .collect::<Vec<_>>();
    assert_eq!(paged, first);
}

#[test]
fn filters_combine_with_and_and_membership() {
    let mut executor = executor();
    for (name, age) in [("a", 10), ("b", 20), ("c", 30), ("d", 40)] {
        insert_member(&mut executor, name, age);
    }

    let records = executor
        .fetch_all(
            &MEMBERS,
            &FilterSpec::all()
                .gt("age", 10)
                .le("age", 40)
                .in_set("username", ["b", "d", "zz"]),
            &SortSpec::asc("username"),
        )
        .unwrap();
    assert_eq!(usernames(&records), ["b", "d"]);

    let none = executor
        .fetch_all(
            &MEMBERS,
            &FilterSpec::all().in_set("username", Vec::<&str>::new()),
            &SortSpec::unsorted(),
        )
        .unwrap();
    assert!(none.is_empty());
    assert_eq!(
        executor
            .count(&MEMBERS, &FilterSpec::all().lt("age", 30))
            .unwrap(),
        2
    );
}

#[test]
fn unknown_fields_and_bad_windows_are_rejected() {
    let mut executor = executor();
    let err = executor
        .fetch_page(
            &MEMBERS,
            &FilterSpec::all().eq("nickname", "x"),
            &SortSpec::unsorted(),
            PageWindow::of_page(0, 3).unwrap(),
            CountMode::WithTotal,
        )
        .unwrap_err();
    assert!(matches!(err, QueryError::UnknownField { table: "members", .. }));

    assert!(matches!(
        PageWindow::from_offset(0, 0),
        Err(QueryError::InvalidPageRequest(_))
    ));
    assert!(matches!(
        PageWindow::of_page(-1, 3),
        Err(QueryError::InvalidPageRequest(_))
    ));
}

#[test]
fn paging_through_a_table_keeps_the_cache_within_capacity() {
    let pool = ConnectionPool::in_memory(PoolOptions::default()).unwrap();
    let store = SqliteRecordStore::try_new(Arc::new(pool)).unwrap();
    let mut executor = QueryExecutor::with_cache_capacity(store, 8);
    let ids = (0..30)
        .map(|i| insert_member(&mut executor, &format!("member{i}"), i).id)
        .collect::<Vec<_>>();
    assert!(executor.cached_records() <= 8);

    for page in 0..6 {
        executor
            .fetch_page(
                &MEMBERS,
                &FilterSpec::all(),
                &SortSpec::by("id", Direction::Asc),
                PageWindow::of_page(page, 5).unwrap(),
                CountMode::SliceOnly,
            )
            .unwrap();
        assert!(executor.cached_records() <= 8);
    }

    // Evicted rows are reloaded from the store.
    let first = executor.find_by_id(&MEMBERS, ids[0]).unwrap().unwrap();
    assert!(!first.is_stale());
    assert_eq!(first.value.text("username").unwrap(), Some("member0"));

    executor.clear_cache();
    assert_eq!(executor.cached_records(), 0);
}
