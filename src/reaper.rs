//! Periodic session sweeper
//!
//! Runs [`SessionCache::sweep`] on a fixed schedule from process start until
//! shutdown. A failing or panicking sweep is logged and the schedule keeps
//! going. Ticks are serialized: the next tick is not taken until the current
//! sweep has finished, and late ticks are delayed rather than bunched.

use crate::cache::{SessionCache, SweepReport};
use crate::error::{WebSessionError, WebSessionResult};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, error, info};

/// Delay between `start` and the first sweep
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_millis(1000);

/// Reaper lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaperState {
    Stopped,
    Scheduled,
}

struct Schedule {
    shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// Background task sweeping a session cache on an interval
///
/// Dropping a scheduled reaper tears the schedule down as `stop` would,
/// without waiting for it.
pub struct Reaper {
    cache: Arc<dyn SessionCache>,
    interval: Duration,
    initial_delay: Duration,
    schedule: Option<Schedule>,
}

impl Reaper {
    /// Create a stopped reaper sweeping `cache` every `interval`
    pub fn new(cache: Arc<dyn SessionCache>, interval: Duration) -> Self {
        Self {
            cache,
            interval,
            initial_delay: DEFAULT_INITIAL_DELAY,
            schedule: None,
        }
    }

    /// Override the delay before the first sweep
    pub fn with_initial_delay(mut self, initial_delay: Duration) -> Self {
        self.initial_delay = initial_delay;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn state(&self) -> ReaperState {
        match &self.schedule {
            Some(schedule) if !schedule.handle.is_finished() => ReaperState::Scheduled,
            _ => ReaperState::Stopped,
        }
    }

    /// Schedule sweeps on the current tokio runtime
    pub fn start(&mut self) -> WebSessionResult<()> {
        if self.state() == ReaperState::Scheduled {
            return Err(WebSessionError::ReaperAlreadyRunning);
        }
        if self.interval.is_zero() {
            return Err(WebSessionError::User(
                "Cleanup interval must be greater than zero".to_string(),
            ));
        }

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(run_schedule(
            Arc::clone(&self.cache),
            self.interval,
            self.initial_delay,
            shutdown_rx,
        ));

        info!(
            interval_secs = self.interval.as_secs(),
            initial_delay_ms = self.initial_delay.as_millis() as u64,
            "Session reaper scheduled"
        );
        self.schedule = Some(Schedule {
            shutdown_tx,
            handle,
        });
        Ok(())
    }

    /// Cancel pending and in-flight sweeps and wait for the task to exit
    pub async fn stop(&mut self) {
        let Some(schedule) = self.schedule.take() else {
            return;
        };

        let _ = schedule.shutdown_tx.send(true);
        if let Err(e) = schedule.handle.await {
            error!("Session reaper exited abnormally: {}", e);
        }
        info!("Session reaper stopped");
    }
}

async fn run_schedule(
    cache: Arc<dyn SessionCache>,
    interval: Duration,
    initial_delay: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut ticker = time::interval_at(Instant::now() + initial_delay, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = shutdown_rx.changed() => break,
        }

        // Spawned so a panicking sweep is caught by the JoinHandle
        let task_cache = Arc::clone(&cache);
        let mut sweep = tokio::spawn(async move { task_cache.sweep().await });

        tokio::select! {
            result = &mut sweep => log_sweep(result),
            _ = shutdown_rx.changed() => {
                sweep.abort();
                debug!("Cancelled in-flight session sweep");
                break;
            }
        }
    }
}

fn log_sweep(result: Result<SweepReport, tokio::task::JoinError>) {
    match result {
        Ok(report) if report.removed > 0 => info!(
            scanned = report.scanned,
            removed = report.removed,
            "Cleaned up expired web sessions"
        ),
        Ok(report) => debug!(scanned = report.scanned, "No expired web sessions"),
        Err(e) => error!("Session sweep failed: {}", e),
    }
}

/// Run a single sweep outside the schedule, containing any panic
pub async fn sweep_once(cache: Arc<dyn SessionCache>) -> Option<SweepReport> {
    match tokio::spawn(async move { cache.sweep().await }).await {
        Ok(report) => Some(report),
        Err(e) => {
            error!("Session sweep failed: {}", e);
            None
        }
    }
}
