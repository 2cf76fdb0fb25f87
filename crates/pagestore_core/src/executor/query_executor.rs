//! `QueryExecutor` implementation.

use super::cache::{Freshness, Loaded, RecordCache};
use crate::model::record::{Record, RecordId};
use crate::model::value::FieldValue;
use crate::query::{
    CountMode, FilterSpec, Mutation, PageResult, PageWindow, QueryError, QueryResult, SortSpec,
};
use crate::schema::TableSchema;
use crate::store::RecordStore;
use log::{debug, error, info, warn};
use std::time::Instant;

/// Executes queries against `S` and caches the records it has loaded.
///
/// One executor is meant to serve one unit of work; it is not shared
/// between threads.
///
/// Every record a fetch returns is cached, so a long-lived executor grows
/// until it reaches its cache capacity (`DEFAULT_CACHE_CAPACITY` for `new`).
/// Callers that keep one executor across requests should call
/// `clear_cache` between them.
pub struct QueryExecutor<S> {
    store: S,
    cache: RecordCache,
}

impl<S: RecordStore> QueryExecutor<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            cache: RecordCache::default(),
        }
    }

    /// Executor whose cache holds at most `capacity` records (minimum 1).
    /// A full cache drops stale entries first, then flushes.
    pub fn with_cache_capacity(store: S, capacity: usize) -> Self {
        Self {
            store,
            cache: RecordCache::with_capacity(capacity),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Fetches one window of matching records.
    ///
    /// `WithTotal` counts first and then selects the window; `SliceOnly`
    /// selects `limit + 1` rows and reports only whether more exist.
    ///
    /// # Errors
    /// - `UnknownField` / `TypeMismatch` before any SQL runs.
    /// - `StoreUnavailable` when no connection can be borrowed.
    pub fn fetch_page(
        &mut self,
        schema: &TableSchema,
        filter: &FilterSpec,
        sort: &SortSpec,
        window: PageWindow,
        mode: CountMode,
    ) -> QueryResult<PageResult<Record>> {
        let started_at = Instant::now();
        filter.validate(schema)?;
        sort.validate(schema)?;

        let result = self.fetch_page_unchecked(schema, filter, sort, window, mode);
        match &result {
            Ok(page) => debug!(
                "event=fetch_page module=executor status=ok table={} offset={} limit={} mode={} rows={} total={} duration_ms={}",
                schema.table,
                window.offset(),
                window.limit(),
                mode_label(mode),
                page.len(),
                page.total_elements
                    .map_or_else(|| "-".to_string(), |total| total.to_string()),
                started_at.elapsed().as_millis()
            ),
            Err(err) => log_failure("fetch_page", schema, started_at, err),
        }
        result
    }

    fn fetch_page_unchecked(
        &mut self,
        schema: &TableSchema,
        filter: &FilterSpec,
        sort: &SortSpec,
        window: PageWindow,
        mode: CountMode,
    ) -> QueryResult<PageResult<Record>> {
        let bounds = window.bounds(mode);
        match mode {
            CountMode::WithTotal => {
                let counted = self.store.count(schema, filter)?;
                let rows = self.store.select(schema, filter, sort, Some(bounds))?;
                self.remember(schema, &rows);
                Ok(PageResult::with_total(rows, window, counted))
            }
            CountMode::SliceOnly => {
                let rows = self.store.select(schema, filter, sort, Some(bounds))?;
                let page = PageResult::from_overfetch(rows, window);
                self.remember(schema, &page.content);
                Ok(page)
            }
        }
    }

    /// Fetches every matching record in order. Unbounded; prefer
    /// `fetch_page` for tables that can grow.
    pub fn fetch_all(
        &mut self,
        schema: &TableSchema,
        filter: &FilterSpec,
        sort: &SortSpec,
    ) -> QueryResult<Vec<Record>> {
        let started_at = Instant::now();
        filter.validate(schema)?;
        sort.validate(schema)?;

        match self.store.select(schema, filter, sort, None) {
            Ok(rows) => {
                self.remember(schema, &rows);
                debug!(
                    "event=fetch_all module=executor status=ok table={} rows={} duration_ms={}",
                    schema.table,
                    rows.len(),
                    started_at.elapsed().as_millis()
                );
                Ok(rows)
            }
            Err(err) => {
                log_failure("fetch_all", schema, started_at, &err);
                Err(err)
            }
        }
    }

    pub fn count(&self, schema: &TableSchema, filter: &FilterSpec) -> QueryResult<u64> {
        filter.validate(schema)?;
        self.store.count(schema, filter)
    }

    /// Applies `mutation` to every record matching `filter` in one statement
    /// and returns the affected row count.
    ///
    /// Cached records of the table are marked stale, whether or not they
    /// matched; they keep their old values until refreshed.
    pub fn bulk_update(
        &mut self,
        schema: &TableSchema,
        filter: &FilterSpec,
        mutation: &Mutation,
    ) -> QueryResult<usize> {
        let started_at = Instant::now();
        filter.validate(schema)?;
        mutation.validate(schema)?;

        match self.store.update_where(schema, filter, mutation) {
            Ok(affected) => {
                let invalidated = self.cache.mark_table_stale(schema.table);
                info!(
                    "event=bulk_update module=executor status=ok table={} affected={} invalidated={} duration_ms={}",
                    schema.table,
                    affected,
                    invalidated,
                    started_at.elapsed().as_millis()
                );
                Ok(affected)
            }
            Err(err) => {
                log_failure("bulk_update", schema, started_at, &err);
                Err(err)
            }
        }
    }

    /// Reads one record, cache first.
    ///
    /// A stale cached copy is returned as-is with `Freshness::Stale`; call
    /// [`QueryExecutor::refresh`] to reload it.
    pub fn find_by_id(
        &mut self,
        schema: &TableSchema,
        id: RecordId,
    ) -> QueryResult<Option<Loaded<Record>>> {
        if let Some(cached) = self.cache.get(schema.table, id) {
            if cached.is_stale() {
                warn!(
                    "event=stale_read module=executor status=stale table={} id={}",
                    schema.table, id
                );
            }
            return Ok(Some(cached));
        }

        match self.load(schema, id)? {
            Some(record) => {
                self.cache.put_fresh(schema.table, record.clone());
                Ok(Some(Loaded {
                    value: record,
                    freshness: Freshness::Fresh,
                }))
            }
            None => Ok(None),
        }
    }

    /// Reloads one record from the store and replaces its cache entry.
    ///
    /// # Errors
    /// - `QueryError::NotFound` when the row no longer exists; its cache
    ///   entry is dropped.
    pub fn refresh(&mut self, schema: &TableSchema, id: RecordId) -> QueryResult<Record> {
        match self.load(schema, id)? {
            Some(record) => {
                self.cache.put_fresh(schema.table, record.clone());
                debug!(
                    "event=refresh module=executor status=ok table={} id={}",
                    schema.table, id
                );
                Ok(record)
            }
            None => {
                self.cache.remove(schema.table, id);
                Err(QueryError::NotFound {
                    table: schema.table,
                    id,
                })
            }
        }
    }

    /// Inserts one record and returns it as stored, audit columns included.
    pub fn insert(
        &mut self,
        schema: &TableSchema,
        values: &[(&str, FieldValue)],
    ) -> QueryResult<Record> {
        let id = self.store.insert(schema, values)?;
        debug!(
            "event=insert module=executor status=ok table={} id={}",
            schema.table, id
        );
        self.refresh(schema, id)
    }

    /// Applies `mutation` to one record and returns its reloaded state.
    ///
    /// # Errors
    /// - `QueryError::NotFound` when no row has `id`.
    pub fn update_by_id(
        &mut self,
        schema: &TableSchema,
        id: RecordId,
        mutation: &Mutation,
    ) -> QueryResult<Record> {
        let filter = by_id(schema, id);
        mutation.validate(schema)?;
        let affected = self.store.update_where(schema, &filter, mutation)?;
        if affected == 0 {
            self.cache.remove(schema.table, id);
            return Err(QueryError::NotFound {
                table: schema.table,
                id,
            });
        }
        self.refresh(schema, id)
    }

    /// # Errors
    /// - `QueryError::NotFound` when no row has `id`.
    pub fn delete_by_id(&mut self, schema: &TableSchema, id: RecordId) -> QueryResult<()> {
        let deleted = self.store.delete_where(schema, &by_id(schema, id))?;
        self.cache.remove(schema.table, id);
        if deleted == 0 {
            return Err(QueryError::NotFound {
                table: schema.table,
                id,
            });
        }
        info!(
            "event=delete module=executor status=ok table={} id={}",
            schema.table, id
        );
        Ok(())
    }

    /// Whether the cached copy of a record is known to be stale. Uncached
    /// records are not stale.
    pub fn is_stale(&self, schema: &TableSchema, id: RecordId) -> bool {
        self.cache.freshness(schema.table, id) == Some(Freshness::Stale)
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Number of records currently cached.
    pub fn cached_records(&self) -> usize {
        self.cache.len()
    }

    fn load(&self, schema: &TableSchema, id: RecordId) -> QueryResult<Option<Record>> {
        let mut rows = self
            .store
            .select(schema, &by_id(schema, id), &SortSpec::unsorted(), None)?;
        Ok(rows.pop())
    }

    fn remember(&mut self, schema: &TableSchema, rows: &[Record]) {
        for record in rows {
            self.cache.put_fresh(schema.table, record.clone());
        }
    }
}

fn by_id(schema: &TableSchema, id: RecordId) -> FilterSpec {
    FilterSpec::all().eq(schema.primary_key, id)
}

fn mode_label(mode: CountMode) -> &'static str {
    match mode {
        CountMode::WithTotal => "with_total",
        CountMode::SliceOnly => "slice_only",
    }
}

fn log_failure(event: &str, schema: &TableSchema, started_at: Instant, err: &QueryError) {
    let error_code = match err {
        QueryError::StoreUnavailable(_) => "store_unavailable",
        _ => "query_failed",
    };
    error!(
        "event={} module=executor status=error table={} duration_ms={} error_code={} error={}",
        event,
        schema.table,
        started_at.elapsed().as_millis(),
        error_code,
        err
    );
}

#[cfg(test)]
mod tests {
    use super::QueryExecutor;
    use crate::model::record::{Record, RecordId};
    use crate::model::value::FieldValue;
    use crate::query::{
        CountMode, FilterSpec, Mutation, PageWindow, QueryError, QueryResult, RowBounds, SortSpec,
    };
    use crate::schema::{TableSchema, MEMBERS};
    use crate::store::RecordStore;
    use std::cell::Cell;

    /// Store that only counts calls; every read returns nothing.
    #[derive(Default)]
    struct CountingStore {
        calls: Cell<usize>,
    }

    impl CountingStore {
        fn hit(&self) {
            self.calls.set(self.calls.get() + 1);
        }
    }

    impl RecordStore for CountingStore {
        fn select(
            &self,
            _: &TableSchema,
            _: &FilterSpec,
            _: &SortSpec,
            _: Option<RowBounds>,
        ) -> QueryResult<Vec<Record>> {
            self.hit();
            Ok(Vec::new())
        }

        fn count(&self, _: &TableSchema, _: &FilterSpec) -> QueryResult<u64> {
            self.hit();
            Ok(0)
        }

        fn update_where(&self, _: &TableSchema, _: &FilterSpec, _: &Mutation) -> QueryResult<usize> {
            self.hit();
            Ok(0)
        }

        fn insert(&self, _: &TableSchema, _: &[(&str, FieldValue)]) -> QueryResult<RecordId> {
            self.hit();
            Ok(1)
        }

        fn delete_where(&self, _: &TableSchema, _: &FilterSpec) -> QueryResult<usize> {
            self.hit();
            Ok(0)
        }
    }

    #[test]
    fn invalid_specs_fail_before_reaching_the_store() {
        let mut executor = QueryExecutor::new(CountingStore::default());
        let window = PageWindow::of_page(0, 10).unwrap();

        let err = executor
            .fetch_page(
                &MEMBERS,
                &FilterSpec::all(),
                &SortSpec::asc("nickname"),
                window,
                CountMode::WithTotal,
            )
            .unwrap_err();
        assert!(matches!(err, QueryError::UnknownField { .. }));

        let err = executor
            .bulk_update(&MEMBERS, &FilterSpec::all(), &Mutation::new())
            .unwrap_err();
        assert!(matches!(err, QueryError::InvalidMutation(_)));

        assert_eq!(executor.store().calls.get(), 0);
    }

    #[test]
    fn missing_record_is_none_and_refresh_is_not_found() {
        let mut executor = QueryExecutor::new(CountingStore::default());
        assert!(executor.find_by_id(&MEMBERS, 7).unwrap().is_none());
        assert!(matches!(
            executor.refresh(&MEMBERS, 7),
            Err(QueryError::NotFound {
                table: "members",
                id: 7
            })
        ));
        assert!(matches!(
            executor.update_by_id(&MEMBERS, 7, &Mutation::new().add("age", 1)),
            Err(QueryError::NotFound { .. })
        ));
        assert!(!executor.is_stale(&MEMBERS, 7));
    }
}
