//! Periodic sampling scheduler

use crate::db::{MetricSample, MetricsStore};
use crate::error::{SamplingError, StoreError};
use crate::protocol::Response;
use crate::sampler::{HostCounters, MetricsSampler};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

pub const DEFAULT_PERIOD: Duration = Duration::from_secs(300);

/// One unit of scheduled work.
#[async_trait::async_trait]
pub trait TickJob: Send + Sync + 'static {
    async fn run(&self) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Stopped,
    Running,
}

struct Running {
    shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// Runs a [`TickJob`] immediately on start and then once per period.
///
/// Ticks execute inside a single task, so they never overlap; a tick that
/// outlasts the period pushes the next one back instead of doubling up.
pub struct Scheduler {
    job: Arc<dyn TickJob>,
    period: Duration,
    running: Option<Running>,
}

impl Scheduler {
    pub fn new(job: Arc<dyn TickJob>, period: Duration) -> Self {
        Self {
            job,
            period,
            running: None,
        }
    }

    pub fn state(&self) -> SchedulerState {
        match &self.running {
            Some(r) if !r.handle.is_finished() => SchedulerState::Running,
            _ => SchedulerState::Stopped,
        }
    }

    pub fn start(&mut self) {
        if self.state() == SchedulerState::Running {
            debug!("Scheduler already running");
            return;
        }
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let job = Arc::clone(&self.job);
        let period = self.period;

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;
                    _ = shutdown_rx.changed() => break,
                    _ = interval.tick() => {
                        if let Err(e) = job.run().await {
                            error!("Scheduled tick failed: {:#}", e);
                        }
                    }
                }
            }
            debug!("Scheduler task exited");
        });

        info!("Scheduler started, period {:?}", period);
        self.running = Some(Running { shutdown_tx, handle });
    }

    /// Stops the recurring task and waits for it to exit. An in-flight tick
    /// is allowed to finish; no tick fires after this returns.
    pub async fn stop(&mut self) {
        if let Some(running) = self.running.take() {
            let _ = running.shutdown_tx.send(true);
            if let Err(e) = running.handle.await {
                warn!("Scheduler task ended abnormally: {}", e);
            }
            info!("Scheduler stopped");
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        if let Some(running) = self.running.take() {
            running.handle.abort();
        }
    }
}

/// Production tick: sample the host, persist, prune, broadcast.
pub struct SampleAndStore<C: HostCounters + 'static> {
    sampler: Arc<Mutex<MetricsSampler<C>>>,
    store: Arc<MetricsStore>,
    retention: Option<Duration>,
    broadcast_tx: Option<broadcast::Sender<String>>,
}

impl<C: HostCounters + 'static> SampleAndStore<C> {
    pub fn new(sampler: Arc<Mutex<MetricsSampler<C>>>, store: Arc<MetricsStore>) -> Self {
        Self {
            sampler,
            store,
            retention: None,
            broadcast_tx: None,
        }
    }

    pub fn with_retention(mut self, retention: Option<Duration>) -> Self {
        self.retention = retention;
        self
    }

    pub fn with_broadcast(mut self, tx: broadcast::Sender<String>) -> Self {
        self.broadcast_tx = Some(tx);
        self
    }

    async fn take_sample(&self) -> Result<MetricSample, SamplingError> {
        let sampler = Arc::clone(&self.sampler);
        tokio::task::spawn_blocking(move || {
            let mut sampler = sampler.lock().unwrap_or_else(|p| p.into_inner());
            sampler.sample()
        })
        .await
        .map_err(|e| SamplingError::Join(e.to_string()))?
    }

    fn persist(&self, sample: &MetricSample) -> Result<(), StoreError> {
        self.store.insert(sample)?;
        if let Some(retention) = self.retention {
            let cutoff = sample.timestamp - retention.as_secs() as i64;
            let removed = self.store.prune_before(cutoff)?;
            if removed > 0 {
                debug!("Pruned {} samples older than {}", removed, cutoff);
            }
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl<C: HostCounters + 'static> TickJob for SampleAndStore<C> {
    async fn run(&self) -> anyhow::Result<()> {
        let sample = self.take_sample().await?;
        self.persist(&sample)?;
        debug!(
            "Stored sample at {}: cpu {:.1}% mem {:.1}% disk {:.1}%",
            sample.timestamp, sample.cpu_percent, sample.memory_percent, sample.disk_percent
        );

        if let Some(tx) = &self.broadcast_tx {
            let msg = Response::Sample { data: sample };
            if let Ok(json) = serde_json::to_string(&msg) {
                let _ = tx.send(json);
            }
        }
        Ok(())
    }
}
