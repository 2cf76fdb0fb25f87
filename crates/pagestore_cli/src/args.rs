//! Command-line arguments.

use clap::Parser;
use std::path::PathBuf;

/// Seed a member store and print one page of members as JSON.
#[derive(Parser, Debug)]
#[command(name = "pagestore")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// SQLite database file; an in-memory store is used when omitted
    #[arg(long)]
    pub db: Option<PathBuf>,

    /// JSON store configuration; `--db` overrides its database path
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Number of `user{i}` members to insert before listing
    #[arg(long, default_value_t = 0)]
    pub seed: u32,

    /// Zero-based page number
    #[arg(long)]
    pub page: Option<i64>,

    /// Page size; defaults to the configured default page size
    #[arg(long)]
    pub size: Option<i64>,

    /// Sort term `field[,asc|desc]`; repeat for tie-breaks
    #[arg(long)]
    pub sort: Vec<String>,

    /// Skip the total count and report only whether a next page exists
    #[arg(long)]
    pub slice: bool,

    /// Log level written to stderr
    #[arg(long)]
    pub log_level: Option<String>,
}
