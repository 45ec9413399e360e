//! Error mapping guide:
//! - Map io::ErrorKind::NotFound to exit code 127; all others to 1.
//! - Library modules return the typed errors below; the binary wraps them in anyhow for context.
//! - User-visible strings come from Display; never print Debug output to the operator.
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Map an io::Error to a process exit code:
/// - 127 for NotFound (command not found)
/// - 1 for all other errors
pub fn exit_code_for_io_error(e: &io::Error) -> u8 {
    if e.kind() == io::ErrorKind::NotFound {
        127
    } else {
        1
    }
}

/// Exit code for an error surfaced at the top level, looking through anyhow context layers.
pub fn exit_code_for_error(e: &anyhow::Error) -> u8 {
    for cause in e.chain() {
        if let Some(ioe) = cause.downcast_ref::<io::Error>() {
            return exit_code_for_io_error(ioe);
        }
        if let Some(EnvironmentError::GitMissing) = cause.downcast_ref::<EnvironmentError>() {
            return 127;
        }
    }
    1
}

/// Reading or writing the persisted configuration failed.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to parse config file '{path}': {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("failed to write config file '{path}': {source}")]
    Write { path: PathBuf, source: io::Error },
}

/// A configuration value was rejected at the point of entry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid interval '{0}': expected a positive number of minutes")]
    Interval(String),

    #[error("invalid time '{0}': expected HH:MM")]
    TimeOfDay(String),

    #[error("invalid proxy address '{0}': {1}")]
    ProxyUrl(String, String),

    #[error("{0} must not be empty")]
    Empty(&'static str),
}

/// Pre-flight environment problems.
#[derive(Debug, Error)]
pub enum EnvironmentError {
    #[error("git is not installed or not on PATH")]
    GitMissing,

    #[error("git version check failed: {0}")]
    GitVersion(String),

    #[error("work directory does not exist: {0}")]
    WorkDirMissing(PathBuf),

    #[error("not a git repository: {0}")]
    NotARepository(PathBuf),

    #[error("cannot reach the remote host; check the network or proxy settings")]
    Unreachable,

    #[error("failed to set git {key}: {detail}")]
    Identity { key: &'static str, detail: String },
}

/// Autostart registration failures.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("cannot determine the home directory")]
    NoHome,

    #[error("failed to write autostart entry '{path}': {source}")]
    Write { path: PathBuf, source: io::Error },

    #[error("failed to remove autostart entry '{path}': {source}")]
    Remove { path: PathBuf, source: io::Error },

    #[error("task scheduler rejected the request: {0}")]
    Scheduler(String),

    #[error("cannot determine the path of the running executable: {0}")]
    CurrentExe(io::Error),
}
