//! Interactive foreground menu.
//!
//! Every action reloads the configuration, and only the configuration actions write it back.
//! Errors inside an action are reported and the menu keeps running.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::config::{ConfigStore, Configuration};
use crate::doctor;
use crate::git::inspect::{self, RepoInspector};
use crate::git::setup::{self, RemoteSync};
use crate::git::Git;
use crate::push;
use crate::startup::Autostart;
use crate::ui::prompt::Prompt;
use crate::util::CommandRunner;

pub const MENU_ITEMS: [&str; 9] = [
    "Run auto push",
    "Configure work directory",
    "Proxy settings",
    "Git settings",
    "View configuration",
    "Schedule settings",
    "Startup settings",
    "Manual push",
    "Exit",
];

fn on_off(flag: bool) -> &'static str {
    if flag {
        "enabled"
    } else {
        "disabled"
    }
}

/// Human-readable summary of `cfg`; identity values come from git's global config.
pub fn describe(cfg: &Configuration, user_name: Option<&str>, user_email: Option<&str>) -> Vec<String> {
    let unset = "(not set)";
    let or_unset = |s: &str| if s.is_empty() { unset.to_string() } else { s.to_string() };
    vec![
        "[Work directory]".to_string(),
        format!("  path: {}", cfg.git.work_dir.display()),
        "[Proxy]".to_string(),
        format!("  proxy: {}", on_off(cfg.proxy.enable_proxy)),
        format!("  SSL verification: {}", on_off(!cfg.proxy.disable_ssl_verify)),
        format!("  HTTP proxy: {}", cfg.proxy.http_proxy),
        format!("  HTTPS proxy: {}", cfg.proxy.https_proxy),
        "[Git]".to_string(),
        format!("  remote: {}", or_unset(&cfg.git.remote_url)),
        format!("  branch: {}", cfg.git.branch),
        format!("  user.name: {}", user_name.unwrap_or(unset)),
        format!("  user.email: {}", user_email.unwrap_or(unset)),
        "[Schedule]".to_string(),
        format!("  schedule: {}", on_off(cfg.schedule.enable)),
        format!("  interval: {} minutes", cfg.schedule.interval_minutes),
        format!("  window: {} - {}", cfg.schedule.start_time, cfg.schedule.end_time),
        "[Startup]".to_string(),
        format!("  autostart: {}", on_off(cfg.startup.enable)),
    ]
}

/// Relative input is resolved against the launch directory.
fn absolute_dir(input: &str) -> PathBuf {
    let p = PathBuf::from(input);
    if p.is_absolute() {
        return p;
    }
    std::env::current_dir().map(|d| d.join(&p)).unwrap_or(p)
}

pub struct Menu<'a> {
    store: &'a ConfigStore,
    runner: &'a dyn CommandRunner,
    autostart: &'a dyn Autostart,
    prompt: &'a mut dyn Prompt,
    use_color: bool,
}

impl<'a> Menu<'a> {
    pub fn new(
        store: &'a ConfigStore,
        runner: &'a dyn CommandRunner,
        autostart: &'a dyn Autostart,
        prompt: &'a mut dyn Prompt,
    ) -> Self {
        Self {
            store,
            runner,
            autostart,
            prompt,
            use_color: false,
        }
    }

    pub fn with_color(mut self, enabled: bool) -> Self {
        self.use_color = enabled;
        self
    }

    /// Loop until Exit is chosen or input ends.
    pub fn run(&mut self) -> Result<()> {
        loop {
            self.print_menu();
            let choice = self.prompt.ask("Select an option [1-9]: ");
            if self.prompt.closed() {
                return Ok(());
            }
            let outcome = match choice.as_str() {
                "1" => self.run_auto_push(),
                "2" => self.configure_work_dir(),
                "3" => self.configure_proxy(),
                "4" => self.configure_git(),
                "5" => self.view_config(),
                "6" => self.configure_schedule(),
                "7" => self.configure_startup(),
                "8" => self.manual_push(),
                "9" => {
                    self.prompt.say("Goodbye.");
                    return Ok(());
                }
                _ => {
                    self.prompt.say("Invalid choice, please try again.");
                    continue;
                }
            };
            if let Err(e) = outcome {
                tracing::error!("{e:#}");
                self.prompt.say(&format!("error: {e:#}"));
            }
            self.prompt.pause();
            if self.prompt.closed() {
                return Ok(());
            }
        }
    }

    fn print_menu(&mut self) {
        let title = crate::color::heading(self.use_color, "=== Git Auto Push ===");
        self.prompt.say("");
        self.prompt.say(&title);
        for (i, item) in MENU_ITEMS.iter().enumerate() {
            self.prompt.say(&format!("{}. {item}", i + 1));
        }
    }

    fn section(&mut self, name: &str) {
        let line = crate::color::heading(self.use_color, &format!("=== {name} ==="));
        self.prompt.say("");
        self.prompt.say(&line);
    }

    fn load(&self) -> Result<Configuration> {
        self.store.load().context("cannot load configuration")
    }

    fn save(&self, cfg: &Configuration) -> Result<()> {
        self.store.save(cfg).context("cannot save configuration")
    }

    fn run_auto_push(&mut self) -> Result<()> {
        self.section("Run auto push");
        let cfg = self.load()?;
        match doctor::run_auto_push(&cfg, self.runner, &mut *self.prompt, false) {
            Ok(true) => self.prompt.say("Auto push finished."),
            Ok(false) => self.prompt.say("Auto push failed; see the log for details."),
            Err(e) => {
                tracing::error!("auto push aborted: {e}");
                self.prompt.say(&format!("Auto push aborted: {e}"));
            }
        }
        Ok(())
    }

    fn configure_work_dir(&mut self) -> Result<()> {
        self.section("Work directory");
        let mut cfg = self.load()?;
        self.prompt
            .say(&format!("Current work directory: {}", cfg.git.work_dir.display()));
        let input = self.prompt.ask("New work directory (Enter to keep): ");
        if input.is_empty() {
            return Ok(());
        }
        let dir = absolute_dir(&input);
        if !dir.exists() {
            self.prompt.say("Directory does not exist.");
            if !self.prompt.confirm("Create it?") {
                return Ok(());
            }
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("cannot create directory {}", dir.display()))?;
            self.prompt.say("Directory created.");
        }
        cfg.git.work_dir = dir.clone();
        self.save(&cfg)?;
        tracing::info!(path = %dir.display(), "work directory updated");
        self.prompt.say("Work directory updated.");

        let git = Git::new(self.runner);
        match setup::ensure_repository(&git, &dir, &mut cfg) {
            Err(e) => self.prompt.say(&format!("git init failed: {e}")),
            Ok(RemoteSync::Adopted(url)) => {
                self.save(&cfg)?;
                self.prompt
                    .say(&format!("Remote URL taken from the repository: {url}"));
            }
            Ok(RemoteSync::Added(url)) => self.prompt.say(&format!("Remote origin set to {url}")),
            Ok(RemoteSync::AddFailed(e)) => self.prompt.say(&format!("Failed to add remote: {e}")),
            Ok(RemoteSync::Unchanged) => {
                let has_origin = RepoInspector::new(&git).remote_url(&dir).is_some();
                if cfg.git.remote_url.is_empty() && !has_origin {
                    self.add_remote(&git, &dir, &mut cfg)?;
                }
            }
        }
        Ok(())
    }

    /// Ask for a remote URL, persist it and wire it up as `origin`.
    fn add_remote(&mut self, git: &Git<'_>, dir: &Path, cfg: &mut Configuration) -> Result<()> {
        let url = self.prompt.ask("Remote repository URL (Enter to skip): ");
        if url.is_empty() {
            return Ok(());
        }
        if let Err(e) = cfg.set_remote_url(&url) {
            self.prompt.say(&e.to_string());
            return Ok(());
        }
        self.save(cfg)?;
        match setup::sync_remote(git, dir, cfg) {
            RemoteSync::Added(url) => self.prompt.say(&format!("Remote origin set to {url}")),
            RemoteSync::AddFailed(e) => self.prompt.say(&format!("Failed to add remote: {e}")),
            _ => {}
        }
        Ok(())
    }

    fn configure_proxy(&mut self) -> Result<()> {
        self.section("Proxy settings");
        let mut cfg = self.load()?;
        let p = &cfg.proxy;
        let lines = [
            format!("Proxy: {}", on_off(p.enable_proxy)),
            format!("SSL verification: {}", on_off(!p.disable_ssl_verify)),
            format!("HTTP proxy: {}", p.http_proxy),
            format!("HTTPS proxy: {}", p.https_proxy),
            String::new(),
            "1. Enable/disable proxy".to_string(),
            "2. Change proxy addresses".to_string(),
            "3. Enable/disable SSL verification".to_string(),
            "4. Back".to_string(),
        ];
        for l in &lines {
            self.prompt.say(l);
        }
        match self.prompt.ask("Select an option [1-4]: ").as_str() {
            "1" => {
                cfg.proxy.enable_proxy = !cfg.proxy.enable_proxy;
                self.save(&cfg)?;
                self.prompt
                    .say(&format!("Proxy {}.", on_off(cfg.proxy.enable_proxy)));
            }
            "2" => {
                let http = self.prompt.ask("HTTP proxy (e.g. http://127.0.0.1:7890): ");
                let https = self.prompt.ask("HTTPS proxy (e.g. http://127.0.0.1:7890): ");
                match cfg.set_proxy_addresses(&http, &https) {
                    Ok(()) => {
                        self.save(&cfg)?;
                        self.prompt.say("Proxy addresses updated.");
                    }
                    Err(e) => self.prompt.say(&e.to_string()),
                }
            }
            "3" => {
                cfg.proxy.disable_ssl_verify = !cfg.proxy.disable_ssl_verify;
                self.save(&cfg)?;
                self.prompt.say(&format!(
                    "SSL verification {}.",
                    on_off(!cfg.proxy.disable_ssl_verify)
                ));
            }
            _ => {}
        }
        Ok(())
    }

    fn configure_git(&mut self) -> Result<()> {
        self.section("Git settings");
        let mut cfg = self.load()?;
        for l in [
            format!("Remote: {}", cfg.git.remote_url),
            format!("Branch: {}", cfg.git.branch),
            String::new(),
            "1. Change remote URL".to_string(),
            "2. Change branch".to_string(),
            "3. Set git user name and email".to_string(),
            "4. Back".to_string(),
        ] {
            self.prompt.say(&l);
        }
        match self.prompt.ask("Select an option [1-4]: ").as_str() {
            "1" => {
                let url = self.prompt.ask("New remote URL: ");
                match cfg.set_remote_url(&url) {
                    Ok(()) => {
                        self.save(&cfg)?;
                        self.prompt.say("Remote URL updated.");
                    }
                    Err(e) => self.prompt.say(&e.to_string()),
                }
            }
            "2" => {
                let branch = self.prompt.ask("New branch name: ");
                match cfg.set_branch(&branch) {
                    Ok(()) => {
                        self.save(&cfg)?;
                        self.prompt.say("Branch updated.");
                    }
                    Err(e) => self.prompt.say(&e.to_string()),
                }
            }
            "3" => {
                let name = self.prompt.ask("git user.name: ");
                let email = self.prompt.ask("git user.email: ");
                if name.is_empty() || email.is_empty() {
                    self.prompt.say("Both name and email are required; nothing changed.");
                    return Ok(());
                }
                let git = Git::new(self.runner);
                for (key, value) in [("user.name", &name), ("user.email", &email)] {
                    if let Err(e) = setup::global_config_set(&git, key, value) {
                        self.prompt.say(&format!("Failed to set {key}: {e}"));
                        return Ok(());
                    }
                }
                tracing::info!(name = %name, email = %email, "git identity updated");
                self.prompt.say("Git identity updated.");
            }
            _ => {}
        }
        Ok(())
    }

    fn view_config(&mut self) -> Result<()> {
        self.section("Current configuration");
        let cfg = self.load()?;
        let git = Git::new(self.runner);
        let name = setup::global_config_get(&git, "user.name");
        let email = setup::global_config_get(&git, "user.email");
        for line in describe(&cfg, name.as_deref(), email.as_deref()) {
            self.prompt.say(&line);
        }
        Ok(())
    }

    fn configure_schedule(&mut self) -> Result<()> {
        self.section("Schedule settings");
        let mut cfg = self.load()?;
        for l in [
            format!("Schedule: {}", on_off(cfg.schedule.enable)),
            format!("Interval: {} minutes", cfg.schedule.interval_minutes),
            format!("Window: {} - {}", cfg.schedule.start_time, cfg.schedule.end_time),
            String::new(),
            "1. Enable/disable schedule".to_string(),
            "2. Change interval".to_string(),
            "3. Change time window".to_string(),
            "4. Back".to_string(),
        ] {
            self.prompt.say(&l);
        }
        match self.prompt.ask("Select an option [1-4]: ").as_str() {
            "1" => {
                cfg.schedule.enable = !cfg.schedule.enable;
                self.save(&cfg)?;
                self.prompt
                    .say(&format!("Schedule {}.", on_off(cfg.schedule.enable)));
            }
            "2" => {
                let input = self.prompt.ask("Interval in minutes: ");
                match cfg.set_interval(&input) {
                    Ok(()) => {
                        self.save(&cfg)?;
                        self.prompt.say(
                            "Interval updated; a running background scheduler picks it up on restart.",
                        );
                    }
                    Err(e) => self.prompt.say(&e.to_string()),
                }
            }
            "3" => {
                let start = self.prompt.ask("Start time (HH:MM): ");
                let end = self.prompt.ask("End time (HH:MM): ");
                match cfg.set_window(&start, &end) {
                    Ok(()) => {
                        self.save(&cfg)?;
                        self.prompt.say("Time window updated.");
                    }
                    Err(e) => self.prompt.say(&e.to_string()),
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn configure_startup(&mut self) -> Result<()> {
        self.section("Startup settings");
        let mut cfg = self.load()?;
        self.prompt
            .say(&format!("Autostart: {}", on_off(cfg.startup.enable)));
        self.prompt.say("1. Enable/disable autostart");
        self.prompt.say("2. Back");
        if self.prompt.ask("Select an option [1-2]: ") != "1" {
            return Ok(());
        }
        let enable = !cfg.startup.enable;
        let res = if enable {
            self.autostart.enable(self.store.path())
        } else {
            self.autostart.disable()
        };
        match res {
            Ok(()) => {
                cfg.startup.enable = enable;
                self.save(&cfg)?;
                tracing::info!(enabled = enable, "autostart updated");
                self.prompt.say(&format!("Autostart {}.", on_off(enable)));
            }
            Err(e) => {
                tracing::error!("autostart change failed: {e}");
                self.prompt.say(&format!("Autostart change failed: {e}"));
            }
        }
        Ok(())
    }

    fn manual_push(&mut self) -> Result<()> {
        self.section("Manual push");
        let cfg = self.load()?;
        let work_dir = cfg.git.work_dir.as_path();
        if !work_dir.exists() {
            self.prompt
                .say(&format!("Work directory does not exist: {}", work_dir.display()));
            return Ok(());
        }
        if !inspect::exists(work_dir) {
            self.prompt.say("Work directory is not a git repository.");
            return Ok(());
        }
        for l in [
            format!("Work directory: {}", work_dir.display()),
            format!("Branch: {}", cfg.git.branch),
            String::new(),
            "1. Normal push (add and commit first)".to_string(),
            "2. Force push (push -f only)".to_string(),
            "3. Back".to_string(),
        ] {
            self.prompt.say(&l);
        }
        let force = match self.prompt.ask("Select an option [1-3]: ").as_str() {
            "1" => false,
            "2" => {
                if !self
                    .prompt
                    .confirm("Force push may overwrite remote changes. Continue?")
                {
                    return Ok(());
                }
                true
            }
            _ => return Ok(()),
        };
        if push::push_configured(&cfg, self.runner, force) {
            self.prompt.say("Push finished.");
        } else {
            self.prompt.say("Push failed; see the log for details.");
        }
        Ok(())
    }
}
