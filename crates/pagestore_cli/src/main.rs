//! `pagestore` command-line entry point.
//!
//! # Responsibility
//! - Open (and optionally seed) a member store from flags or a JSON config.
//! - Print one member page payload as JSON on stdout.
//!
//! # Invariants
//! - Logs go to stderr so stdout only carries the payload.
//! - Any failure exits non-zero with the error on stderr.

mod args;

use args::Cli;
use clap::Parser;
use log::info;
use pagestore_core::{
    default_log_level, init_stderr_logging, ConnectionPool, CountMode, ExecutorMemberRepository,
    MemberService, PageParams, PagingDefaults, QueryExecutor, SqliteRecordStore, StoreConfig,
};
use std::error::Error;
use std::sync::Arc;

fn main() {
    if let Err(err) = run(Cli::parse()) {
        eprintln!("pagestore: {err}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let mut config = match cli.config.as_ref() {
        Some(path) => StoreConfig::from_json_file(path)?,
        None => StoreConfig::default(),
    };
    if cli.db.is_some() {
        config.database_path = cli.db.clone();
    }
    let config = config.normalized();

    let level = cli
        .log_level
        .as_deref()
        .or(config.log_level.as_deref())
        .unwrap_or(default_log_level());
    init_stderr_logging(level)?;

    let pool = Arc::new(ConnectionPool::from_config(&config)?);
    let store = SqliteRecordStore::try_new(pool)?;
    let mut executor = QueryExecutor::with_cache_capacity(store, config.cache_capacity);
    let mut service = MemberService::new(
        ExecutorMemberRepository::new(&mut executor),
        PagingDefaults::from_config(&config),
    );

    if cli.seed > 0 {
        let seeded = service.seed_members(cli.seed)?;
        info!("event=cli_seed module=cli status=ok count={}", seeded.len());
    }

    let params = PageParams {
        page: cli.page,
        size: cli.size,
        sort: cli.sort,
        mode: if cli.slice {
            CountMode::SliceOnly
        } else {
            CountMode::WithTotal
        },
    };
    let payload = service.list_members(&params)?;
    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}
