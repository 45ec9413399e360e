#![allow(clippy::module_name_repetitions)]
//! Persistent configuration: four TOML tables (`[Proxy]`, `[Git]`, `[Schedule]`, `[Startup]`).
//!
//! Loading always yields a complete record: a missing file is created with defaults and a
//! file missing keys is filled in and written back. Values entered by the operator go through
//! the `set_*` methods, which validate before assigning so a rejected value never replaces
//! the stored one.

use std::path::{Path, PathBuf};

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::errors::{ConfigError, ValidationError};

/// File name used when no `--config` path is given, relative to the launch directory.
pub const DEFAULT_CONFIG_FILE: &str = "git_config.toml";

pub const DEFAULT_PROXY_ADDR: &str = "http://127.0.0.1:7890";
pub const DEFAULT_BRANCH: &str = "master";
pub const DEFAULT_INTERVAL_MINUTES: u32 = 60;
pub const DEFAULT_START_TIME: &str = "09:00";
pub const DEFAULT_END_TIME: &str = "18:00";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxySettings {
    pub enable_proxy: bool,
    pub http_proxy: String,
    pub https_proxy: String,
    pub disable_ssl_verify: bool,
}

impl Default for ProxySettings {
    fn default() -> Self {
        Self {
            enable_proxy: false,
            http_proxy: DEFAULT_PROXY_ADDR.to_string(),
            https_proxy: DEFAULT_PROXY_ADDR.to_string(),
            disable_ssl_verify: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositorySettings {
    pub remote_url: String,
    pub branch: String,
    pub work_dir: PathBuf,
}

impl Default for RepositorySettings {
    fn default() -> Self {
        Self {
            remote_url: String::new(),
            branch: DEFAULT_BRANCH.to_string(),
            work_dir: launch_dir(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleSettings {
    pub enable: bool,
    pub interval_minutes: u32,
    pub start_time: String,
    pub end_time: String,
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self {
            enable: false,
            interval_minutes: DEFAULT_INTERVAL_MINUTES,
            start_time: DEFAULT_START_TIME.to_string(),
            end_time: DEFAULT_END_TIME.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StartupSettings {
    pub enable: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    #[serde(rename = "Proxy")]
    pub proxy: ProxySettings,
    #[serde(rename = "Git")]
    pub git: RepositorySettings,
    #[serde(rename = "Schedule")]
    pub schedule: ScheduleSettings,
    #[serde(rename = "Startup")]
    pub startup: StartupSettings,
}

impl Configuration {
    pub fn set_interval(&mut self, input: &str) -> Result<(), ValidationError> {
        self.schedule.interval_minutes = parse_interval(input)?;
        Ok(())
    }

    /// Both ends are validated before either is stored.
    pub fn set_window(&mut self, start: &str, end: &str) -> Result<(), ValidationError> {
        let start = parse_time_of_day(start)?;
        let end = parse_time_of_day(end)?;
        self.schedule.start_time = start;
        self.schedule.end_time = end;
        Ok(())
    }

    pub fn set_proxy_addresses(&mut self, http: &str, https: &str) -> Result<(), ValidationError> {
        let http = parse_proxy_url(http)?;
        let https = parse_proxy_url(https)?;
        self.proxy.http_proxy = http;
        self.proxy.https_proxy = https;
        Ok(())
    }

    pub fn set_branch(&mut self, input: &str) -> Result<(), ValidationError> {
        let b = input.trim();
        if b.is_empty() {
            return Err(ValidationError::Empty("branch"));
        }
        self.git.branch = b.to_string();
        Ok(())
    }

    pub fn set_remote_url(&mut self, input: &str) -> Result<(), ValidationError> {
        let u = input.trim();
        if u.is_empty() {
            return Err(ValidationError::Empty("remote URL"));
        }
        self.git.remote_url = u.to_string();
        Ok(())
    }
}

/// Positive whole number of minutes.
pub fn parse_interval(input: &str) -> Result<u32, ValidationError> {
    let t = input.trim();
    if t.is_empty() || !t.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::Interval(t.to_string()));
    }
    match t.parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ValidationError::Interval(t.to_string())),
    }
}

/// Accepts `H:MM` or `HH:MM` and returns the zero-padded `HH:MM` form.
pub fn parse_time_of_day(input: &str) -> Result<String, ValidationError> {
    let t = input.trim();
    NaiveTime::parse_from_str(t, "%H:%M")
        .map(|tm| tm.format("%H:%M").to_string())
        .map_err(|_| ValidationError::TimeOfDay(t.to_string()))
}

pub fn parse_proxy_url(input: &str) -> Result<String, ValidationError> {
    let t = input.trim();
    if t.is_empty() {
        return Err(ValidationError::Empty("proxy address"));
    }
    url::Url::parse(t)
        .map(|_| t.to_string())
        .map_err(|e| ValidationError::ProxyUrl(t.to_string(), e.to_string()))
}

fn launch_dir() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

/// Reads and writes the configuration file at a fixed path.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the configuration, creating or repairing the file as needed.
    pub fn load(&self) -> Result<Configuration, ConfigError> {
        if !self.path.exists() {
            let cfg = Configuration::default();
            self.save(&cfg)?;
            tracing::info!(path = %self.path.display(), "created default config file");
            return Ok(cfg);
        }

        let text = std::fs::read_to_string(&self.path).map_err(|source| ConfigError::Read {
            path: self.path.clone(),
            source,
        })?;
        let parse_err = |source| ConfigError::Parse {
            path: self.path.clone(),
            source,
        };
        let raw: toml::Table = text.parse().map_err(parse_err)?;
        let cfg: Configuration = toml::from_str(&text).map_err(parse_err)?;

        let missing = missing_keys(&raw, &cfg)?;
        if !missing.is_empty() {
            tracing::info!(
                path = %self.path.display(),
                keys = %missing.join(", "),
                "filled missing config keys with defaults"
            );
            self.save(&cfg)?;
        }
        Ok(cfg)
    }

    /// Serialize the full record, replacing the file.
    pub fn save(&self, cfg: &Configuration) -> Result<(), ConfigError> {
        let text = toml::to_string_pretty(cfg)?;
        crate::util::fs::write_atomic(&self.path, &text).map_err(|source| ConfigError::Write {
            path: self.path.clone(),
            source,
        })?;
        tracing::debug!(path = %self.path.display(), "config saved");
        Ok(())
    }
}

/// `Section.key` names present in the full schema but absent from `raw`.
fn missing_keys(raw: &toml::Table, cfg: &Configuration) -> Result<Vec<String>, ConfigError> {
    let full: toml::Table = toml::to_string(cfg)?
        .parse()
        .map_err(|e: toml::de::Error| ConfigError::Serialize(serde::ser::Error::custom(e)))?;
    let mut missing = Vec::new();
    for (section, value) in &full {
        let keys = match value.as_table() {
            Some(t) => t,
            None => continue,
        };
        let present = raw.get(section).and_then(|v| v.as_table());
        for key in keys.keys() {
            if !present.is_some_and(|t| t.contains_key(key)) {
                missing.push(format!("{section}.{key}"));
            }
        }
    }
    Ok(missing)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &Path) -> ConfigStore {
        ConfigStore::new(dir.join(DEFAULT_CONFIG_FILE))
    }

    #[test]
    fn test_load_creates_default_file_when_absent() {
        let td = tempfile::tempdir().expect("tmpdir");
        let store = store_in(td.path());
        let cfg = store.load().expect("load");
        assert!(store.path().exists());
        assert_eq!(cfg.git.branch, "master");
        assert_eq!(cfg.schedule.interval_minutes, 60);
        assert_eq!(cfg.schedule.start_time, "09:00");
        assert_eq!(cfg.schedule.end_time, "18:00");
        assert!(!cfg.proxy.enable_proxy);
        assert_eq!(cfg.proxy.http_proxy, "http://127.0.0.1:7890");

        let text = std::fs::read_to_string(store.path()).expect("read");
        for section in ["[Proxy]", "[Git]", "[Schedule]", "[Startup]"] {
            assert!(text.contains(section), "missing {section} in:\n{text}");
        }
        assert!(text.contains("enable_proxy = false"));
    }

    #[test]
    fn test_partial_file_is_repaired_and_keeps_present_values() {
        let td = tempfile::tempdir().expect("tmpdir");
        let store = store_in(td.path());
        std::fs::write(
            store.path(),
            "[Git]\nbranch = \"main\"\nremote_url = \"git@example.com:me/notes.git\"\n\n[Schedule]\ninterval_minutes = 15\n",
        )
        .expect("seed");

        let cfg = store.load().expect("load");
        assert_eq!(cfg.git.branch, "main");
        assert_eq!(cfg.git.remote_url, "git@example.com:me/notes.git");
        assert_eq!(cfg.schedule.interval_minutes, 15);
        assert_eq!(cfg.schedule.start_time, "09:00");

        let raw: toml::Table = std::fs::read_to_string(store.path())
            .expect("read")
            .parse()
            .expect("parse");
        let full = missing_keys(&raw, &cfg).expect("diff");
        assert!(full.is_empty(), "still missing: {full:?}");
        assert_eq!(raw["Git"]["branch"].as_str(), Some("main"));
        assert_eq!(raw["Startup"]["enable"].as_bool(), Some(false));
    }

    #[test]
    fn test_complete_file_is_not_rewritten() {
        let td = tempfile::tempdir().expect("tmpdir");
        let store = store_in(td.path());
        let mut cfg = Configuration::default();
        cfg.git.work_dir = td.path().to_path_buf();
        store.save(&cfg).expect("save");
        let mut text = std::fs::read_to_string(store.path()).expect("read");
        text.push_str("\n# operator note\n");
        std::fs::write(store.path(), &text).expect("annotate");

        let loaded = store.load().expect("load");
        assert_eq!(loaded, cfg);
        let after = std::fs::read_to_string(store.path()).expect("reread");
        assert!(after.contains("# operator note"));
    }

    #[test]
    fn test_booleans_round_trip_as_true_false() {
        let td = tempfile::tempdir().expect("tmpdir");
        let store = store_in(td.path());
        let mut cfg = Configuration::default();
        cfg.proxy.disable_ssl_verify = true;
        cfg.schedule.enable = true;
        store.save(&cfg).expect("save");
        let text = std::fs::read_to_string(store.path()).expect("read");
        assert!(text.contains("disable_ssl_verify = true"));
        assert!(text.contains("enable_proxy = false"));
        assert_eq!(store.load().expect("load"), cfg);
    }

    #[test]
    fn test_malformed_file_is_a_parse_error() {
        let td = tempfile::tempdir().expect("tmpdir");
        let store = store_in(td.path());
        std::fs::write(store.path(), "[Schedule\ninterval_minutes = ").expect("seed");
        assert!(matches!(store.load(), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_interval_validation() {
        assert_eq!(parse_interval("30"), Ok(30));
        assert_eq!(parse_interval(" 5 "), Ok(5));
        for bad in ["0", "-5", "abc", "", "1.5"] {
            assert!(parse_interval(bad).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn test_rejected_values_leave_config_untouched() {
        let mut cfg = Configuration::default();
        assert!(cfg.set_interval("0").is_err());
        assert_eq!(cfg.schedule.interval_minutes, 60);

        assert!(cfg.set_window("08:00", "25:99").is_err());
        assert_eq!(cfg.schedule.start_time, "09:00");
        assert_eq!(cfg.schedule.end_time, "18:00");

        assert!(cfg.set_proxy_addresses("http://127.0.0.1:8080", "not a url").is_err());
        assert_eq!(cfg.proxy.http_proxy, DEFAULT_PROXY_ADDR);

        assert!(cfg.set_branch("   ").is_err());
        assert_eq!(cfg.git.branch, "master");
    }

    #[test]
    fn test_window_is_normalized_to_zero_padded_form() {
        let mut cfg = Configuration::default();
        cfg.set_window("8:30", "17:05").expect("valid window");
        assert_eq!(cfg.schedule.start_time, "08:30");
        assert_eq!(cfg.schedule.end_time, "17:05");
    }
}
