#![allow(clippy::module_name_repetitions)]
//! Proxy handling: git's global proxy settings, the effective environment handed to every
//! git invocation, and the reachability probe.
//!
//! The process environment is never modified; callers thread a `ProxyEnv` through `Git`.

use std::time::Duration;

use crate::config::Configuration;
use crate::git::Git;
use crate::util::ExecRequest;

/// Fixed endpoint used to decide whether the remote host is reachable.
pub const PROBE_URL: &str = "https://api.github.com";
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

const PROXY_VARS: [&str; 2] = ["HTTP_PROXY", "HTTPS_PROXY"];

/// `git config --unset` exit code for a key that is not set.
const GIT_CONFIG_KEY_NOT_SET: i32 = 5;

/// Environment overlay for child processes: variables to set and variables to remove.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProxyEnv {
    set: Vec<(String, String)>,
    remove: Vec<String>,
}

impl ProxyEnv {
    pub fn with_var(mut self, key: &str, value: &str) -> Self {
        self.remove.retain(|k| k != key);
        self.set.retain(|(k, _)| k != key);
        self.set.push((key.to_string(), value.to_string()));
        self
    }

    pub fn without_var(mut self, key: &str) -> Self {
        self.set.retain(|(k, _)| k != key);
        if !self.remove.iter().any(|k| k == key) {
            self.remove.push(key.to_string());
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.set
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn removes(&self, key: &str) -> bool {
        self.remove.iter().any(|k| k == key)
    }

    pub fn apply_to(&self, mut req: ExecRequest) -> ExecRequest {
        for key in &self.remove {
            req = req.env_remove(key);
        }
        for (key, value) in &self.set {
            req = req.env(key, value);
        }
        req
    }
}

/// Environment implied by the proxy settings, without touching git's global config.
pub fn environment(cfg: &Configuration) -> ProxyEnv {
    let p = &cfg.proxy;
    if p.enable_proxy {
        ProxyEnv::default()
            .with_var("HTTP_PROXY", &p.http_proxy)
            .with_var("HTTPS_PROXY", &p.https_proxy)
    } else {
        PROXY_VARS
            .iter()
            .fold(ProxyEnv::default(), |env, key| env.without_var(key))
    }
}

pub struct ProxyManager<'g, 'r> {
    git: &'g Git<'r>,
}

impl<'g, 'r> ProxyManager<'g, 'r> {
    pub fn new(git: &'g Git<'r>) -> Self {
        Self { git }
    }

    /// Write or clear git's global `http.proxy`/`https.proxy` and return the matching
    /// environment for subsequent commands.
    pub fn apply(&self, cfg: &Configuration) -> ProxyEnv {
        let p = &cfg.proxy;
        if p.enable_proxy {
            for (key, value) in [("http.proxy", &p.http_proxy), ("https.proxy", &p.https_proxy)] {
                let res = self.git.run(None, &["config", "--global", key, value.as_str()]);
                if !res.success() {
                    tracing::warn!(key, stderr = %res.stderr.trim(), "failed to set git proxy");
                }
            }
            tracing::info!(http = %p.http_proxy, https = %p.https_proxy, "proxy enabled");
        } else {
            for key in ["http.proxy", "https.proxy"] {
                let res = self.git.run(None, &["config", "--global", "--unset", key]);
                if !res.success() && res.code != GIT_CONFIG_KEY_NOT_SET {
                    tracing::warn!(key, stderr = %res.stderr.trim(), "failed to clear git proxy");
                }
            }
            tracing::info!("proxy settings cleared");
        }
        environment(cfg)
    }
}

/// Reachability check against `PROBE_URL`.
pub fn probe(cfg: &Configuration) -> bool {
    probe_target(cfg, PROBE_URL)
}

/// GET `url` with a 5 second timeout, through the configured proxies when enabled and
/// without certificate checks when SSL verification is disabled. True only for HTTP 200.
pub fn probe_target(cfg: &Configuration, url: &str) -> bool {
    let client = match build_probe_client(cfg) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "cannot build HTTP client for connectivity check");
            return false;
        }
    };
    match client.get(url).send() {
        Ok(resp) if resp.status() == reqwest::StatusCode::OK => {
            tracing::info!(url, "remote host reachable");
            true
        }
        Ok(resp) => {
            tracing::error!(url, status = resp.status().as_u16(), "remote host answered with an error");
            false
        }
        Err(e) => {
            tracing::error!(url, error = %e, "cannot reach remote host");
            tracing::info!("check the network connection or configure a proxy");
            false
        }
    }
}

fn build_probe_client(cfg: &Configuration) -> reqwest::Result<reqwest::blocking::Client> {
    let p = &cfg.proxy;
    let mut builder = reqwest::blocking::Client::builder()
        .timeout(PROBE_TIMEOUT)
        .connect_timeout(PROBE_TIMEOUT)
        .user_agent(concat!("auto-git-push/", env!("CARGO_PKG_VERSION")));
    if p.enable_proxy {
        builder = builder
            .proxy(reqwest::Proxy::http(&p.http_proxy)?)
            .proxy(reqwest::Proxy::https(&p.https_proxy)?);
    } else {
        builder = builder.no_proxy();
    }
    if p.disable_ssl_verify {
        builder = builder.danger_accept_invalid_certs(true);
    }
    builder.build()
}
