//! Process-wide `tracing` setup for the server and integration tests.
//!
//! [`init_logging`] installs one subscriber: an [`EnvFilter`] built from
//! `RUST_LOG` or the configured filter, a daily-rotated file named
//! `<app>.<YYYY-MM-DD>.log`, and optionally a stderr mirror in the same
//! encoding. Only the first call installs anything; later calls return the
//! path chosen by the first.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::Context;
use chrono::Utc;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();
static LOG_PATH: OnceLock<PathBuf> = OnceLock::new();

const LOG_DIR_ENV: &str = "QUILL_LOG_DIR";
const LOG_SUFFIX: &str = "log";

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    /// Lenient parse used by the config layer; anything but `json` is text.
    pub fn from_name(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Text
        }
    }

    fn layer<W>(self, writer: W, ansi: bool) -> BoxedLayer
    where
        W: for<'w> fmt::MakeWriter<'w> + Send + Sync + 'static,
    {
        match self {
            LogFormat::Text => fmt::layer().with_writer(writer).with_ansi(ansi).boxed(),
            LogFormat::Json => fmt::layer().json().with_writer(writer).boxed(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Prefix of the log file name and the default data directory.
    pub app_name: &'static str,
    /// Explicit directory; otherwise `QUILL_LOG_DIR`, then `~/.local/share/<app_name>`.
    pub log_dir: Option<PathBuf>,
    pub emit_stderr: bool,
    pub format: LogFormat,
    /// Filter directives used when `RUST_LOG` is unset or empty.
    pub default_filter: String,
    /// Rotated files kept on disk; `None` keeps them all.
    pub max_files: Option<usize>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            app_name: "quill",
            log_dir: None,
            emit_stderr: false,
            format: LogFormat::Text,
            default_filter: "info".to_string(),
            max_files: None,
        }
    }
}

/// Install the global subscriber and return today's log file path.
pub fn init_logging(config: LogConfig) -> anyhow::Result<PathBuf> {
    if let Some(path) = LOG_PATH.get() {
        return Ok(path.clone());
    }

    let filter = build_filter(&config.default_filter)?;
    let dir = resolve_log_dir(config.app_name, config.log_dir.as_deref());
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create log directory: {}", dir.display()))?;

    let mut rolling = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(config.app_name)
        .filename_suffix(LOG_SUFFIX);
    if let Some(n) = config.max_files {
        rolling = rolling.max_log_files(n.max(1));
    }
    let appender = rolling
        .build(&dir)
        .with_context(|| format!("failed to open log file in {}", dir.display()))?;
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let _ = LOG_GUARD.set(guard);

    let mut layers = vec![config.format.layer(writer, false)];
    if config.emit_stderr {
        layers.push(config.format.layer(std::io::stderr, true));
    }
    tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init()
        .map_err(|e| anyhow::anyhow!("tracing setup failed: {e}"))?;

    let path = dir.join(log_file_name(config.app_name, &Utc::now().format("%Y-%m-%d").to_string()));
    let _ = LOG_PATH.set(path.clone());
    Ok(path)
}

/// `RUST_LOG` wins when set; either source must parse.
fn build_filter(default: &str) -> anyhow::Result<EnvFilter> {
    match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(directives) if !directives.trim().is_empty() => EnvFilter::try_new(&directives)
            .with_context(|| format!("invalid {} `{directives}`", EnvFilter::DEFAULT_ENV)),
        _ => EnvFilter::try_new(default)
            .with_context(|| format!("invalid logging filter `{default}`")),
    }
}

fn log_file_name(app_name: &str, date: &str) -> String {
    format!("{app_name}.{date}.{LOG_SUFFIX}")
}

fn resolve_log_dir(app_name: &str, explicit: Option<&Path>) -> PathBuf {
    let home = std::env::var_os("HOME").map(PathBuf::from);
    let chosen = explicit
        .map(Path::to_path_buf)
        .or_else(|| std::env::var_os(LOG_DIR_ENV).map(PathBuf::from));

    match (chosen, home) {
        (Some(dir), Some(home)) => match dir.strip_prefix("~") {
            Ok(rest) => home.join(rest),
            Err(_) => dir,
        },
        (Some(dir), None) => dir,
        (None, Some(home)) => home.join(".local").join("share").join(app_name),
        (None, None) => PathBuf::from(".").join(app_name),
    }
}
