#![allow(clippy::module_name_repetitions)]
//! Recurring timer registry and the time-windowed push task.
//!
//! Granularity is minutes: the loop wakes once per `POLL_INTERVAL`, runs whatever is due
//! serially on the calling thread, and sleeps again. A job is never run concurrently with
//! itself or with another job.

use std::time::Duration;

use chrono::{Local, NaiveDateTime, NaiveTime, Timelike};

use crate::config::{ConfigStore, Configuration};
use crate::errors::ValidationError;
use crate::push;
use crate::util::CommandRunner;

pub const POLL_INTERVAL: Duration = Duration::from_secs(60);

type Task<'a> = Box<dyn FnMut(NaiveDateTime) + 'a>;

struct Job<'a> {
    interval: chrono::Duration,
    next_run: NaiveDateTime,
    task: Task<'a>,
}

/// Registry of recurring jobs, driven by an external clock.
#[derive(Default)]
pub struct Scheduler<'a> {
    jobs: Vec<Job<'a>>,
}

impl<'a> Scheduler<'a> {
    pub fn new() -> Self {
        Self { jobs: Vec::new() }
    }

    /// Register `task` to run every `minutes`, first due one interval after `now`.
    pub fn every(&mut self, minutes: u32, now: NaiveDateTime, task: impl FnMut(NaiveDateTime) + 'a) {
        let interval = chrono::Duration::minutes(i64::from(minutes.max(1)));
        self.jobs.push(Job {
            interval,
            next_run: now + interval,
            task: Box::new(task),
        });
    }

    /// Run every job due at `now`; each is rescheduled one interval after `now`.
    /// Returns the number of jobs run.
    pub fn run_pending(&mut self, now: NaiveDateTime) -> usize {
        let mut ran = 0;
        for job in self.jobs.iter_mut().filter(|j| now >= j.next_run) {
            (job.task)(now);
            job.next_run = now + job.interval;
            ran += 1;
        }
        ran
    }

    pub fn next_run(&self) -> Option<NaiveDateTime> {
        self.jobs.iter().map(|j| j.next_run).min()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Poll forever against the local wall clock. Returns only if the registry is empty.
    pub fn run_forever(&mut self, poll: Duration) {
        if self.is_empty() {
            return;
        }
        loop {
            self.run_pending(Local::now().naive_local());
            if let Some(next) = self.next_run() {
                tracing::debug!(next = %next.format("%Y-%m-%d %H:%M"), "scheduler idle");
            }
            std::thread::sleep(poll);
        }
    }
}

/// Daily `[start, end]` window at minute resolution, both ends inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    start: NaiveTime,
    end: NaiveTime,
}

impl Window {
    pub fn parse(start: &str, end: &str) -> Result<Self, ValidationError> {
        let parse = |s: &str| {
            NaiveTime::parse_from_str(s.trim(), "%H:%M")
                .map_err(|_| ValidationError::TimeOfDay(s.trim().to_string()))
        };
        Ok(Self {
            start: parse(start)?,
            end: parse(end)?,
        })
    }

    /// A window whose start is after its end wraps past midnight (`22:00`-`06:00`).
    pub fn contains(&self, now: NaiveTime) -> bool {
        let now = truncate_to_minute(now);
        if self.start <= self.end {
            self.start <= now && now <= self.end
        } else {
            now >= self.start || now <= self.end
        }
    }
}

fn truncate_to_minute(t: NaiveTime) -> NaiveTime {
    NaiveTime::from_hms_opt(t.hour(), t.minute(), 0).unwrap_or(t)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Disabled,
    OutsideWindow,
    InvalidWindow,
    WorkDirMissing,
    NotARepository,
    Pushed(bool),
}

/// One scheduled run: push via `push` only when scheduling is enabled, `now` is inside the
/// window and the work directory is a repository. Outside the window the tick is skipped,
/// not deferred.
pub fn scheduled_tick(cfg: &Configuration, now: NaiveTime, push: impl FnOnce() -> bool) -> TickOutcome {
    let sched = &cfg.schedule;
    if !sched.enable {
        tracing::debug!("scheduling disabled; skipping tick");
        return TickOutcome::Disabled;
    }
    let window = match Window::parse(&sched.start_time, &sched.end_time) {
        Ok(w) => w,
        Err(e) => {
            tracing::error!(error = %e, "invalid schedule window; skipping tick");
            return TickOutcome::InvalidWindow;
        }
    };
    if !window.contains(now) {
        tracing::debug!(
            now = %now.format("%H:%M"),
            start = %sched.start_time,
            end = %sched.end_time,
            "outside schedule window"
        );
        return TickOutcome::OutsideWindow;
    }
    let work_dir = &cfg.git.work_dir;
    if !work_dir.exists() {
        tracing::error!(path = %work_dir.display(), "work directory does not exist");
        return TickOutcome::WorkDirMissing;
    }
    if !crate::git::inspect::exists(work_dir) {
        tracing::error!(path = %work_dir.display(), "work directory is not a git repository");
        return TickOutcome::NotARepository;
    }
    tracing::info!("scheduled push starting");
    let ok = push();
    if ok {
        tracing::info!("scheduled push finished");
    } else {
        tracing::warn!("scheduled push failed; next attempt at the next tick");
    }
    TickOutcome::Pushed(ok)
}

/// Registry for background mode, built from `cfg` as loaded at startup. None when scheduling
/// is disabled. Each tick reloads the configuration from `store` before deciding anything.
pub fn background_jobs<'a>(
    store: &'a ConfigStore,
    cfg: &Configuration,
    runner: &'a dyn CommandRunner,
    now: NaiveDateTime,
) -> Result<Option<Scheduler<'a>>, ValidationError> {
    if !cfg.schedule.enable {
        return Ok(None);
    }
    let minutes = cfg.schedule.interval_minutes;
    if minutes == 0 {
        return Err(ValidationError::Interval(minutes.to_string()));
    }
    Window::parse(&cfg.schedule.start_time, &cfg.schedule.end_time)?;

    let mut scheduler = Scheduler::new();
    scheduler.every(minutes, now, move |at| match store.load() {
        Ok(cfg) => {
            scheduled_tick(&cfg, at.time(), || push::push_configured(&cfg, runner, false));
        }
        Err(e) => tracing::error!(error = %e, "cannot reload configuration; skipping tick"),
    });
    tracing::info!(
        interval_minutes = minutes,
        start = %cfg.schedule.start_time,
        end = %cfg.schedule.end_time,
        "background scheduler armed"
    );
    Ok(Some(scheduler))
}
