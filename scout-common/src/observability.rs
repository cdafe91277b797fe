//! Process-wide `tracing` setup shared by the `scout` binary and the
//! integration tests.
//!
//! Events always go to a daily rolling file; a copy can be sent to stderr.
//! [`init_logging`] is idempotent: the first call wins and later calls only
//! get the resolved file path back.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::Context;
use chrono::Local;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt};
use tracing_subscriber::{EnvFilter, Layer, Registry};

const LOG_DIR_ENV: &str = "SCOUT_LOG_DIR";

static FILE_GUARD: OnceLock<WorkerGuard> = OnceLock::new();
static ACTIVE_LOG: OnceLock<PathBuf> = OnceLock::new();

type SinkLayer = Box<dyn Layer<Registry> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format: {other}")),
        }
    }
}

/// Where and how [`init_logging`] writes.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Prefix of the log file name and last component of the default directory.
    pub app_name: &'static str,
    /// Overrides `SCOUT_LOG_DIR` and `~/.local/share/<app_name>`.
    pub log_dir: Option<PathBuf>,
    pub emit_stderr: bool,
    pub format: LogFormat,
    /// Directive used when `RUST_LOG` is not set.
    pub default_filter: &'static str,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            app_name: "scout",
            log_dir: None,
            emit_stderr: true,
            format: LogFormat::Text,
            default_filter: "info",
        }
    }
}

impl LogConfig {
    fn directory(&self) -> PathBuf {
        let configured = self
            .log_dir
            .clone()
            .or_else(|| std::env::var_os(LOG_DIR_ENV).map(PathBuf::from));
        match configured {
            Some(dir) => with_home(&dir),
            None => home_dir()
                .map(|home| home.join(".local/share").join(self.app_name))
                .unwrap_or_else(|| PathBuf::from(self.app_name)),
        }
    }

    fn file_prefix(&self) -> String {
        format!("{}.log", self.app_name)
    }
}

fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from)
}

fn with_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}

fn sink<W>(format: LogFormat, writer: W, ansi: bool) -> SinkLayer
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    match format {
        LogFormat::Text => fmt::layer()
            .with_writer(writer)
            .with_ansi(ansi)
            .with_target(!ansi)
            .boxed(),
        LogFormat::Json => fmt::layer().json().with_writer(writer).boxed(),
    }
}

/// Install the global subscriber and return today's log file.
///
/// `RUST_LOG` takes precedence over [`LogConfig::default_filter`].
pub fn init_logging(config: LogConfig) -> anyhow::Result<PathBuf> {
    if let Some(active) = ACTIVE_LOG.get() {
        return Ok(active.clone());
    }

    let dir = config.directory();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("cannot create log directory {}", dir.display()))?;

    let prefix = config.file_prefix();
    let (file_writer, guard) = tracing_appender::non_blocking(rolling::daily(&dir, &prefix));

    let mut sinks: Vec<SinkLayer> = vec![sink(config.format, file_writer, false)];
    if config.emit_stderr {
        sinks.push(sink(config.format, std::io::stderr, true));
    }
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.default_filter));

    tracing_subscriber::registry()
        .with(sinks)
        .with(filter)
        .try_init()
        .context("tracing subscriber already installed")?;

    let _ = FILE_GUARD.set(guard);
    let active = dir.join(format!("{prefix}.{}", Local::now().format("%Y-%m-%d")));
    let _ = ACTIVE_LOG.set(active.clone());
    Ok(active)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_dir_wins() {
        let config = LogConfig {
            log_dir: Some(PathBuf::from("/tmp/scout-logs")),
            ..LogConfig::default()
        };
        assert_eq!(config.directory(), PathBuf::from("/tmp/scout-logs"));
        assert_eq!(config.file_prefix(), "scout.log");
    }

    #[test]
    fn tilde_expands_to_home() {
        if let Some(home) = home_dir() {
            assert_eq!(with_home(Path::new("~/logs")), home.join("logs"));
        }
        assert_eq!(with_home(Path::new("/var/log")), PathBuf::from("/var/log"));
    }

    #[test]
    fn parses_log_format_case_insensitively() {
        assert_eq!("JSON".parse::<LogFormat>(), Ok(LogFormat::Json));
        assert_eq!(" text ".parse::<LogFormat>(), Ok(LogFormat::Text));
        assert!("yaml".parse::<LogFormat>().is_err());
    }
}
