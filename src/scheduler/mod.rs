//! Interval job scheduling with single-flight execution and bounded retries.
//!
//! One scheduler instance is constructed by the process entry point and owns
//! every background job. Each job gets a timer task; executions are spawned
//! off the timer so a slow run never delays the tick, and a per-job running
//! flag turns overlapping ticks into logged skips instead of concurrent runs.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::future::BoxFuture;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);
const SHUTDOWN_POLL: Duration = Duration::from_millis(100);

#[derive(Error, Debug)]
pub enum JobError {
    #[error("{0}")]
    Failed(String),
}

#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error("job '{0}' is already registered")]
    DuplicateJob(String),
    #[error("job '{0}' is not registered")]
    JobNotFound(String),
}

pub type JobFn = Arc<dyn Fn() -> BoxFuture<'static, Result<(), JobError>> + Send + Sync>;

/// Static configuration for one registered job.
#[derive(Debug, Clone)]
pub struct JobSpec {
    pub id: String,
    pub interval: Duration,
    pub run_on_start: bool,
    pub max_retries: u32,
    pub retry_delay: Duration,
    pub enabled: bool,
}

impl JobSpec {
    pub fn new(id: impl Into<String>, interval: Duration) -> Self {
        Self {
            id: id.into(),
            interval,
            run_on_start: false,
            max_retries: 3,
            retry_delay: Duration::from_secs(5),
            enabled: true,
        }
    }

    pub fn run_on_start(mut self) -> Self {
        self.run_on_start = true;
        self
    }

    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }
}

/// Point-in-time view of one job, for diagnostics.
#[derive(Debug, Clone)]
pub struct JobStatus {
    pub id: String,
    pub enabled: bool,
    pub running: bool,
    pub runs: u64,
    pub failures: u64,
    pub skips: u64,
    pub last_error: Option<String>,
}

struct JobState {
    spec: JobSpec,
    job: JobFn,
    enabled: AtomicBool,
    running: AtomicBool,
    runs: AtomicU64,
    failures: AtomicU64,
    skips: AtomicU64,
    last_error: Mutex<Option<String>>,
}

impl JobState {
    fn status(&self) -> JobStatus {
        JobStatus {
            id: self.spec.id.clone(),
            enabled: self.enabled.load(Ordering::SeqCst),
            running: self.running.load(Ordering::SeqCst),
            runs: self.runs.load(Ordering::SeqCst),
            failures: self.failures.load(Ordering::SeqCst),
            skips: self.skips.load(Ordering::SeqCst),
            last_error: self.last_error.lock().unwrap().clone(),
        }
    }
}

pub struct JobScheduler {
    jobs: Mutex<HashMap<String, Arc<JobState>>>,
    in_flight: Arc<AtomicUsize>,
    shutdown_tx: watch::Sender<bool>,
    timers: Mutex<Vec<JoinHandle<()>>>,
}

impl Default for JobScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl JobScheduler {
    pub fn new() -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            jobs: Mutex::new(HashMap::new()),
            in_flight: Arc::new(AtomicUsize::new(0)),
            shutdown_tx,
            timers: Mutex::new(Vec::new()),
        }
    }

    /// Registers a job. Must happen before `start`; later registrations get
    /// no timer.
    pub fn register<F, Fut>(&self, spec: JobSpec, job: F) -> Result<(), SchedulerError>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<(), JobError>> + Send + 'static,
    {
        let mut jobs = self.jobs.lock().unwrap();
        if jobs.contains_key(&spec.id) {
            return Err(SchedulerError::DuplicateJob(spec.id));
        }
        let enabled = spec.enabled;
        let state = Arc::new(JobState {
            job: Arc::new(move || -> BoxFuture<'static, Result<(), JobError>> {
                Box::pin(job())
            }),
            enabled: AtomicBool::new(enabled),
            running: AtomicBool::new(false),
            runs: AtomicU64::new(0),
            failures: AtomicU64::new(0),
            skips: AtomicU64::new(0),
            last_error: Mutex::new(None),
            spec,
        });
        jobs.insert(state.spec.id.clone(), state);
        Ok(())
    }

    /// Spawns one timer task per registered job.
    pub fn start(&self) {
        let jobs = self.jobs.lock().unwrap();
        let mut timers = self.timers.lock().unwrap();
        for state in jobs.values() {
            let state = Arc::clone(state);
            let in_flight = Arc::clone(&self.in_flight);
            let mut shutdown_rx = self.shutdown_tx.subscribe();
            info!(job = %state.spec.id, interval = ?state.spec.interval, "Job scheduled.");
            timers.push(tokio::spawn(async move {
                let mut ticker = tokio::time::interval(state.spec.interval);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                if !state.spec.run_on_start {
                    // The first interval tick completes immediately; consume
                    // it when the job should wait a full period.
                    ticker.tick().await;
                }
                loop {
                    tokio::select! {
                        _ = ticker.tick() => {
                            Self::spawn_execution(&state, &in_flight, false);
                        }
                        _ = shutdown_rx.changed() => break,
                    }
                }
            }));
        }
    }

    /// Runs a job now, outside its schedule. Bypasses the enabled flag but
    /// not the single-flight guard.
    pub fn trigger(&self, id: &str) -> Result<(), SchedulerError> {
        let jobs = self.jobs.lock().unwrap();
        let state = jobs
            .get(id)
            .ok_or_else(|| SchedulerError::JobNotFound(id.to_string()))?;
        Self::spawn_execution(state, &self.in_flight, true);
        Ok(())
    }

    pub fn enable(&self, id: &str) -> Result<(), SchedulerError> {
        self.set_enabled(id, true)
    }

    pub fn disable(&self, id: &str) -> Result<(), SchedulerError> {
        self.set_enabled(id, false)
    }

    pub fn status(&self, id: &str) -> Option<JobStatus> {
        self.jobs.lock().unwrap().get(id).map(|s| s.status())
    }

    pub fn statuses(&self) -> Vec<JobStatus> {
        self.jobs.lock().unwrap().values().map(|s| s.status()).collect()
    }

    /// Stops the timers. Executions already in flight keep running.
    pub fn stop(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// Stops the timers and waits for in-flight executions to drain, up to a
    /// 30-second deadline.
    pub async fn shutdown(&self) {
        self.stop();
        let deadline = tokio::time::Instant::now() + SHUTDOWN_TIMEOUT;
        while self.in_flight.load(Ordering::SeqCst) > 0 {
            if tokio::time::Instant::now() >= deadline {
                warn!(
                    remaining = self.in_flight.load(Ordering::SeqCst),
                    "Shutdown deadline reached with jobs still in flight."
                );
                return;
            }
            tokio::time::sleep(SHUTDOWN_POLL).await;
        }
        info!("All scheduled jobs drained.");
    }

    fn set_enabled(&self, id: &str, enabled: bool) -> Result<(), SchedulerError> {
        let jobs = self.jobs.lock().unwrap();
        let state = jobs
            .get(id)
            .ok_or_else(|| SchedulerError::JobNotFound(id.to_string()))?;
        state.enabled.store(enabled, Ordering::SeqCst);
        info!(job = %id, enabled, "Job toggled.");
        Ok(())
    }

    fn spawn_execution(state: &Arc<JobState>, in_flight: &Arc<AtomicUsize>, force: bool) {
        if !force && !state.enabled.load(Ordering::SeqCst) {
            return;
        }
        if state
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            state.skips.fetch_add(1, Ordering::SeqCst);
            warn!(job = %state.spec.id, "Previous run still in flight; skipping tick.");
            return;
        }

        in_flight.fetch_add(1, Ordering::SeqCst);
        let state = Arc::clone(state);
        let in_flight = Arc::clone(in_flight);
        tokio::spawn(async move {
            Self::run_with_retries(&state).await;
            state.running.store(false, Ordering::SeqCst);
            in_flight.fetch_sub(1, Ordering::SeqCst);
        });
    }

    /// One scheduled execution: the initial attempt plus up to `max_retries`
    /// fixed-delay retries.
    async fn run_with_retries(state: &JobState) {
        state.runs.fetch_add(1, Ordering::SeqCst);
        let mut last_error = None;
        for attempt in 0..=state.spec.max_retries {
            match (state.job)().await {
                Ok(()) => {
                    *state.last_error.lock().unwrap() = None;
                    return;
                }
                Err(e) => {
                    warn!(
                        job = %state.spec.id,
                        attempt = attempt + 1,
                        error = %e,
                        "Job attempt failed."
                    );
                    last_error = Some(e.to_string());
                    if attempt < state.spec.max_retries {
                        tokio::time::sleep(state.spec.retry_delay).await;
                    }
                }
            }
        }

        state.failures.fetch_add(1, Ordering::SeqCst);
        *state.last_error.lock().unwrap() = last_error.clone();
        error!(
            job = %state.spec.id,
            attempts = state.spec.max_retries + 1,
            "Job gave up until the next interval."
        );
    }
}
