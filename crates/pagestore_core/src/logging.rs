//! Process-wide logging bootstrap.
//!
//! # Responsibility
//! - Start the `flexi_logger` backend exactly once per process, writing either
//!   rolling files (embedding hosts) or stderr (the CLI).
//! - Capture panics as sanitized log events.
//!
//! # Invariants
//! - Init is idempotent for an identical target and level.
//! - Switching target or level after init is rejected, never applied.
//! - Initialization never panics.

use flexi_logger::{Cleanup, Criterion, FileSpec, Logger, LoggerHandle, Naming, WriteMode};
use log::{error, info};
use once_cell::sync::OnceCell;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const LOG_FILE_BASENAME: &str = "pagestore";
const MAX_LOG_FILE_SIZE_BYTES: u64 = 10 * 1024 * 1024;
const MAX_LOG_FILES: usize = 5;
const MAX_PANIC_PAYLOAD_CHARS: usize = 160;

static LOGGING_STATE: OnceCell<LoggingState> = OnceCell::new();
static PANIC_HOOK_INSTALLED: OnceCell<()> = OnceCell::new();

/// Where log lines go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    /// Rolling `pagestore*.log` files in an absolute directory.
    Directory(PathBuf),
    Stderr,
}

impl Display for LogTarget {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Directory(dir) => write!(f, "{}", dir.display()),
            Self::Stderr => write!(f, "stderr"),
        }
    }
}

struct LoggingState {
    level: &'static str,
    target: LogTarget,
    _logger: LoggerHandle,
}

/// Initializes rolling file logs in `log_dir`.
///
/// # Errors
/// - Unsupported `level`.
/// - Empty or relative `log_dir`, or one that cannot be created.
/// - Logging already active with another level or target.
pub fn init_logging(level: &str, log_dir: &str) -> Result<(), String> {
    let target = LogTarget::Directory(normalize_log_dir(log_dir)?);
    init_with_target(level, target)
}

/// Initializes logging to stderr; used by command-line tools.
///
/// # Errors
/// - Unsupported `level`.
/// - Logging already active with another level or target.
pub fn init_stderr_logging(level: &str) -> Result<(), String> {
    init_with_target(level, LogTarget::Stderr)
}

fn init_with_target(level: &str, target: LogTarget) -> Result<(), String> {
    let normalized_level = normalize_level(level)?;

    let state = LOGGING_STATE.get_or_try_init(|| start_logger(normalized_level, &target))?;

    if state.target != target {
        return Err(format!(
            "logging already initialized at `{}`; refusing to switch to `{}`",
            state.target, target
        ));
    }
    if state.level != normalized_level {
        return Err(format!(
            "logging already initialized with level `{}`; refusing to switch to `{}`",
            state.level, normalized_level
        ));
    }
    Ok(())
}

fn start_logger(level: &'static str, target: &LogTarget) -> Result<LoggingState, String> {
    let logger = Logger::try_with_str(level)
        .map_err(|err| format!("invalid log level `{level}`: {err}"))?;

    let logger = match target {
        LogTarget::Directory(dir) => {
            std::fs::create_dir_all(dir).map_err(|err| {
                format!("failed to create log directory `{}`: {err}", dir.display())
            })?;
            logger
                .log_to_file(
                    FileSpec::default()
                        .directory(dir.as_path())
                        .basename(LOG_FILE_BASENAME),
                )
                .rotate(
                    Criterion::Size(MAX_LOG_FILE_SIZE_BYTES),
                    Naming::Numbers,
                    Cleanup::KeepLogFiles(MAX_LOG_FILES),
                )
                .write_mode(WriteMode::BufferAndFlush)
                .append()
                .format_for_files(flexi_logger::detailed_format)
                .start()
        }
        LogTarget::Stderr => logger
            .log_to_stderr()
            .format_for_stderr(flexi_logger::default_format)
            .start(),
    }
    .map_err(|err| format!("failed to start logger: {err}"))?;

    install_panic_hook_once();

    info!(
        "event=core_init module=core status=ok platform={} version={} level={} target={}",
        std::env::consts::OS,
        env!("CARGO_PKG_VERSION"),
        level,
        target
    );

    Ok(LoggingState {
        level,
        target: target.clone(),
        _logger: logger,
    })
}

/// Active `(level, target)`, or `None` before init.
pub fn logging_status() -> Option<(&'static str, LogTarget)> {
    LOGGING_STATE
        .get()
        .map(|state| (state.level, state.target.clone()))
}

/// `debug` for debug builds, `info` otherwise.
pub fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    }
}

fn normalize_level(level: &str) -> Result<&'static str, String> {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok("trace"),
        "debug" => Ok("debug"),
        "info" => Ok("info"),
        "warn" | "warning" => Ok("warn"),
        "error" => Ok("error"),
        other => Err(format!(
            "unsupported log level `{other}`; expected trace|debug|info|warn|error"
        )),
    }
}

fn normalize_log_dir(log_dir: &str) -> Result<PathBuf, String> {
    let trimmed = log_dir.trim();
    if trimmed.is_empty() {
        return Err("log_dir cannot be empty".to_string());
    }
    let path = Path::new(trimmed);
    if !path.is_absolute() {
        return Err(format!("log_dir must be an absolute path, got `{trimmed}`"));
    }
    Ok(path.to_path_buf())
}

fn install_panic_hook_once() {
    if PANIC_HOOK_INSTALLED.get().is_some() {
        return;
    }

    let previous_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let location = panic_info
            .location()
            .map(|loc| format!("{}:{}", loc.file(), loc.line()))
            .unwrap_or_else(|| "unknown".to_string());
        let payload = panic_payload_summary(panic_info);
        error!(
            "event=panic_captured module=core status=error location={} payload={}",
            location, payload
        );
        previous_hook(panic_info);
    }));

    let _ = PANIC_HOOK_INSTALLED.set(());
}

fn panic_payload_summary(info: &std::panic::PanicHookInfo<'_>) -> String {
    let payload = if let Some(message) = info.payload().downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = info.payload().downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    };

    // Payloads may carry record values; keep them on one short line.
    sanitize_message(&payload, MAX_PANIC_PAYLOAD_CHARS)
}

fn sanitize_message(value: &str, max_chars: usize) -> String {
    let normalized = value.replace(['\n', '\r'], " ");
    let mut truncated = normalized.chars().take(max_chars).collect::<String>();
    if normalized.chars().count() > max_chars {
        truncated.push_str("...");
    }
    truncated
}
