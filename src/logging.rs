//! Process-wide tracing setup: console plus an append-only log file.
//!
//! The filter comes from `RUST_LOG` when set and defaults to `info`. File records never carry
//! ANSI escapes. Library code only emits events; the binary installs the subscriber once.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use once_cell::sync::OnceCell;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

pub const LOG_FILE_NAME: &str = "git_push.log";

static INIT: OnceCell<()> = OnceCell::new();

/// Keeps the file writer flushing; hold it until the process exits.
pub struct LoggingGuard {
    _file: Option<WorkerGuard>,
    path: Option<PathBuf>,
}

impl LoggingGuard {
    /// Log file in use, if the file sink could be opened.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

/// Log file location for the config file at `config_path`.
pub fn log_path_for(config_path: &Path) -> PathBuf {
    config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from(LOG_FILE_NAME), |p| p.join(LOG_FILE_NAME))
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

fn file_appender(path: &Path) -> Option<RollingFileAppender> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let name = path.file_name()?.to_string_lossy().into_owned();
    match RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(name)
        .build(dir)
    {
        Ok(a) => Some(a),
        Err(e) => {
            eprintln!("auto-git-push: cannot open log file {}: {e}", path.display());
            None
        }
    }
}

/// Append one record to the log file directly, bypassing the non-blocking writer. Used for
/// records that must be on disk before the process aborts.
pub fn append_sync(path: &Path, level: &str, message: &str) -> io::Result<()> {
    let mut f = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(
        f,
        "{} {level:>5} {message}",
        chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S%.6fZ")
    )?;
    f.flush()
}

/// Install the global subscriber. Returns None when one is already installed.
pub fn logging_init(log_path: &Path) -> Option<LoggingGuard> {
    if INIT.get().is_some() {
        return None;
    }

    let console = fmt::layer()
        .compact()
        .with_target(false)
        .with_ansi(crate::color::color_enabled_stdout());

    let (file_layer, guard) = match file_appender(log_path) {
        Some(appender) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let path = guard.as_ref().map(|_| log_path.to_path_buf());
    if tracing_subscriber::registry()
        .with(env_filter())
        .with(console)
        .with(file_layer)
        .try_init()
        .is_err()
    {
        eprintln!("auto-git-push: logging init skipped (global subscriber already set)");
        return None;
    }
    let _ = INIT.set(());

    Some(LoggingGuard { _file: guard, path })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_file_sits_next_to_config() {
        assert_eq!(
            log_path_for(Path::new("/srv/push/git_config.toml")),
            PathBuf::from("/srv/push/git_push.log")
        );
        assert_eq!(log_path_for(Path::new("git_config.toml")), PathBuf::from("git_push.log"));
    }

    #[test]
    fn test_file_appender_opens_in_existing_dir() {
        let td = tempfile::tempdir().expect("tmpdir");
        assert!(file_appender(&td.path().join(LOG_FILE_NAME)).is_some());
    }

    #[test]
    fn test_append_sync_adds_lines_without_truncating() {
        let td = tempfile::tempdir().expect("tmpdir");
        let path = td.path().join(LOG_FILE_NAME);
        std::fs::write(&path, "earlier record\n").expect("seed log");
        append_sync(&path, "ERROR", "panic: boom").expect("first");
        append_sync(&path, "ERROR", "panic: again").expect("second");

        let text = std::fs::read_to_string(&path).expect("read log");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "earlier record");
        assert!(lines[1].ends_with("ERROR panic: boom"), "{}", lines[1]);
        assert!(lines[2].ends_with("ERROR panic: again"), "{}", lines[2]);
    }
}
