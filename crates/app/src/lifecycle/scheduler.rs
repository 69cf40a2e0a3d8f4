//! Scheduler / trigger controller.
//!
//! Every run, whether fired by the periodic timer or by a manual trigger,
//! goes through one guard: a `watch` channel holding the [`RunState`],
//! mutated with `send_if_modified` as an atomic check-and-set. At most one run
//! executes at a time; a completed run is followed by a cooldown.
//!
//! ```text
//! Idle ──trigger──▶ Running ──ok──▶ CoolingDown ──elapsed──▶ Idle
//!                      └──storage error / timeout / cancel──▶ Idle
//! ```
//!
//! The timeout and shutdown cancellation are cooperative: the run checks them
//! between assets and never drops a write in flight.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::{AbortHandle, JoinHandle};
use tokio::time::{Instant, MissedTickBehavior};

use assetcycle_domain::asset::{Asset, AssetStatus};
use assetcycle_domain::error::AssetCycleError;
use assetcycle_domain::id::{AssetId, RunId};
use assetcycle_domain::lifecycle::{
    LifecycleConfig, LifecycleRun, RunCounts, RunFailure, RunPhases, RunStatus, TriggerType,
    evaluate_dead_stock_candidates, evaluate_disposal_candidates,
};
use assetcycle_domain::time::now;

use super::executor::{
    DEFAULT_CHUNK_SIZE, Halt, StopSignal, TransitionContext, TransitionExecutor, TransitionKind,
    TransitionOutcome,
};
use crate::ports::{AssetFilter, AssetStore, AuditLog, ConfigRepository, RunRepository};
use crate::services::config_service::LifecycleConfigService;

pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(60);
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10 * 60);
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);
pub const DEFAULT_ACTOR: &str = "system";

/// Tunables of the trigger controller.
#[derive(Debug, Clone)]
pub struct SchedulerSettings {
    /// Quiet period after a completed run.
    pub cooldown: Duration,
    /// Ceiling on a single run, checked between assets.
    pub timeout: Duration,
    /// `performed_by` for runs without an explicit `triggered_by`.
    pub actor: String,
    pub chunk_size: usize,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            cooldown: DEFAULT_COOLDOWN,
            timeout: DEFAULT_TIMEOUT,
            actor: DEFAULT_ACTOR.to_string(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

/// Where the trigger controller currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running { run_id: RunId, since: Instant },
    CoolingDown { until: Instant },
}

impl RunState {
    /// Id of the run holding the lock, if any.
    #[must_use]
    pub fn run_id(self) -> Option<RunId> {
        match self {
            Self::Running { run_id, .. } => Some(run_id),
            Self::Idle | Self::CoolingDown { .. } => None,
        }
    }
}

/// Exclusive right to execute one run. Releases the lock when dropped.
struct RunLease {
    state: Arc<watch::Sender<RunState>>,
    run_id: RunId,
    since: Instant,
    cooldown: Duration,
    completed: bool,
}

impl RunLease {
    fn release(mut self, completed: bool) {
        self.completed = completed;
    }
}

impl Drop for RunLease {
    fn drop(&mut self) {
        let next = if self.completed && !self.cooldown.is_zero() {
            RunState::CoolingDown {
                until: Instant::now() + self.cooldown,
            }
        } else {
            RunState::Idle
        };
        // A force-released stale lock may already belong to a newer run.
        self.state.send_if_modified(|state| match *state {
            RunState::Running { run_id, .. } if run_id == self.run_id => {
                *state = next;
                true
            }
            _ => false,
        });
    }
}

/// Transitions committed so far, across both phases.
#[derive(Default)]
struct RunProgress {
    dead_stock: TransitionOutcome,
    disposal: TransitionOutcome,
}

impl RunProgress {
    /// Copy counts and skips onto `run`, returning the moved assets that
    /// have no audit entry.
    fn record_into(self, run: &mut LifecycleRun) -> Vec<AssetId> {
        run.counts = RunCounts {
            dead_stock_moved: self.dead_stock.count,
            disposal_moved: self.disposal.count,
        };
        run.skipped = self
            .dead_stock
            .skipped
            .into_iter()
            .chain(self.disposal.skipped)
            .collect();
        self.dead_stock
            .unaudited
            .into_iter()
            .chain(self.disposal.unaudited)
            .collect()
    }
}

/// Runs lifecycle cycles on demand and on a timer, one at a time.
pub struct LifecycleScheduler<AS, AL, CR, RR> {
    assets: Arc<AS>,
    executor: Arc<TransitionExecutor<Arc<AS>, Arc<AL>>>,
    config: Arc<LifecycleConfigService<CR>>,
    runs: Arc<RR>,
    state: Arc<watch::Sender<RunState>>,
    /// Task of the run holding the lock, used to tell a live owner from a
    /// dead one.
    in_flight: Arc<Mutex<Option<(RunId, AbortHandle)>>>,
    closing: Arc<AtomicBool>,
    /// Raised by shutdown once the grace period is over.
    cancelled: Arc<AtomicBool>,
    settings: Arc<SchedulerSettings>,
}

impl<AS, AL, CR, RR> Clone for LifecycleScheduler<AS, AL, CR, RR> {
    fn clone(&self) -> Self {
        Self {
            assets: Arc::clone(&self.assets),
            executor: Arc::clone(&self.executor),
            config: Arc::clone(&self.config),
            runs: Arc::clone(&self.runs),
            state: Arc::clone(&self.state),
            in_flight: Arc::clone(&self.in_flight),
            closing: Arc::clone(&self.closing),
            cancelled: Arc::clone(&self.cancelled),
            settings: Arc::clone(&self.settings),
        }
    }
}

impl<AS, AL, CR, RR> LifecycleScheduler<AS, AL, CR, RR>
where
    AS: AssetStore + Send + Sync + 'static,
    AL: AuditLog + Send + Sync + 'static,
    CR: ConfigRepository + Send + Sync + 'static,
    RR: RunRepository + Send + Sync + 'static,
{
    pub fn new(
        assets: Arc<AS>,
        audit: Arc<AL>,
        runs: Arc<RR>,
        config: Arc<LifecycleConfigService<CR>>,
        settings: SchedulerSettings,
    ) -> Self {
        let executor = TransitionExecutor::new(Arc::clone(&assets), audit)
            .with_chunk_size(settings.chunk_size);
        let (state, _) = watch::channel(RunState::Idle);
        Self {
            assets,
            executor: Arc::new(executor),
            config,
            runs,
            state: Arc::new(state),
            in_flight: Arc::new(Mutex::new(None)),
            closing: Arc::new(AtomicBool::new(false)),
            cancelled: Arc::new(AtomicBool::new(false)),
            settings: Arc::new(settings),
        }
    }

    /// Snapshot of the current run state.
    #[must_use]
    pub fn state(&self) -> RunState {
        *self.state.borrow()
    }

    /// Id of the run currently executing, if any.
    #[must_use]
    pub fn current_run(&self) -> Option<RunId> {
        self.state().run_id()
    }

    /// Watch run state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<RunState> {
        self.state.subscribe()
    }

    /// Manually run the dead-stock phase followed by the disposal phase.
    ///
    /// # Errors
    ///
    /// See [`Self::trigger`].
    pub async fn run_full_cycle(
        &self,
        triggered_by: Option<String>,
    ) -> Result<LifecycleRun, AssetCycleError> {
        self.trigger(TriggerType::Manual, triggered_by, RunPhases::Full)
            .await
    }

    /// Manually run only the dead-stock phase.
    ///
    /// # Errors
    ///
    /// See [`Self::trigger`].
    pub async fn run_dead_stock(
        &self,
        triggered_by: Option<String>,
    ) -> Result<LifecycleRun, AssetCycleError> {
        self.trigger(TriggerType::Manual, triggered_by, RunPhases::DeadStock)
            .await
    }

    /// Manually run only the disposal phase.
    ///
    /// # Errors
    ///
    /// See [`Self::trigger`].
    pub async fn run_disposal(
        &self,
        triggered_by: Option<String>,
    ) -> Result<LifecycleRun, AssetCycleError> {
        self.trigger(TriggerType::Manual, triggered_by, RunPhases::Disposal)
            .await
    }

    /// Timer entry point. Skipped silently while another run is in progress,
    /// during cooldown or after shutdown.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the run record could not be created.
    pub async fn tick(&self) -> Result<Option<LifecycleRun>, AssetCycleError> {
        match self.trigger(TriggerType::Scheduled, None, RunPhases::Full).await {
            Ok(run) => Ok(Some(run)),
            Err(
                err @ (AssetCycleError::AlreadyRunning { .. }
                | AssetCycleError::CoolingDown { .. }
                | AssetCycleError::ShuttingDown),
            ) => {
                tracing::debug!(reason = %err, "scheduled lifecycle run skipped");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// Acquire the run lock and execute `phases` on a dedicated task.
    ///
    /// A run that fails part-way is still returned as `Ok`, with
    /// [`RunStatus::Failed`] and the counts committed before the failure.
    ///
    /// # Errors
    ///
    /// Returns [`AssetCycleError::AlreadyRunning`] while another run holds the
    /// lock, [`AssetCycleError::CoolingDown`] right after a completed run,
    /// [`AssetCycleError::ShuttingDown`] once [`Self::shutdown`] was called, or
    /// a storage error if the run record could not be created.
    pub async fn trigger(
        &self,
        trigger_type: TriggerType,
        triggered_by: Option<String>,
        phases: RunPhases,
    ) -> Result<LifecycleRun, AssetCycleError> {
        let run = LifecycleRun::start(trigger_type, triggered_by, phases, now());
        let run_id = run.id;
        let lease = self.acquire(run_id)?;
        tracing::info!(%run_id, %trigger_type, %phases, "lifecycle run started");

        // Detached from the caller so a dropped request never abandons a run.
        let fallback = run.clone();
        let this = self.clone();
        let handle = tokio::spawn(async move { this.execute(run, lease).await });
        *self.lock_in_flight() = Some((run_id, handle.abort_handle()));

        let joined = handle.await;
        {
            let mut in_flight = self.lock_in_flight();
            if in_flight.as_ref().is_some_and(|(id, _)| *id == run_id) {
                *in_flight = None;
            }
        }

        match joined {
            Ok(result) => result,
            Err(err) if err.is_cancelled() => Err(AssetCycleError::ShuttingDown),
            Err(err) => {
                tracing::error!(%run_id, error = %err, "lifecycle run task crashed");
                let mut run = fallback;
                run.fail(RunFailure::Crashed(err.to_string()), now());
                if let Err(err) = self.runs.update(run.clone()).await {
                    tracing::error!(%run_id, error = %err, "failed to record crashed run");
                }
                Ok(run)
            }
        }
    }

    /// Spawn the periodic task. The first tick fires after one `interval`.
    pub fn spawn_periodic(&self, interval: Duration) -> JoinHandle<()> {
        let interval = interval.max(Duration::from_secs(1));
        let this = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                if this.closing.load(Ordering::SeqCst) {
                    break;
                }
                match this.tick().await {
                    Ok(Some(run)) => {
                        tracing::info!(run_id = %run.id, status = %run.status, "scheduled lifecycle run finished");
                    }
                    Ok(None) => {}
                    Err(err) => tracing::error!(error = %err, "scheduled lifecycle run failed to start"),
                }
            }
            tracing::debug!("periodic lifecycle task stopped");
        })
    }

    /// Mark runs left `Running` by a previous process as `Abandoned`.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the run repository.
    #[tracing::instrument(skip(self))]
    pub async fn recover(&self) -> Result<u64, AssetCycleError> {
        let abandoned = self.runs.abandon_running(now()).await?;
        if abandoned > 0 {
            tracing::warn!(abandoned, "marked dangling lifecycle runs as abandoned");
        }
        Ok(abandoned)
    }

    /// Stop accepting triggers and wait up to `grace` for the in-flight run.
    ///
    /// A run still going after `grace` is asked to stop before its next asset
    /// and records itself as [`RunStatus::Abandoned`]. The write in progress
    /// always completes together with its audit entry. A run that does not
    /// reach the next asset within a second `grace` is left to
    /// [`Self::recover`] on the next start.
    #[tracing::instrument(skip(self))]
    pub async fn shutdown(&self, grace: Duration) {
        self.closing.store(true, Ordering::SeqCst);
        if self.wait_until_idle(grace).await {
            tracing::info!("lifecycle scheduler stopped");
            return;
        }

        let run_id = self.current_run();
        tracing::warn!(?run_id, "lifecycle run did not finish within the grace period, cancelling");
        self.cancelled.store(true, Ordering::SeqCst);
        if self.wait_until_idle(grace).await {
            tracing::info!("lifecycle scheduler stopped");
            return;
        }
        tracing::error!(?run_id, "lifecycle run still writing after cancellation, leaving it to startup recovery");
    }

    async fn wait_until_idle(&self, grace: Duration) -> bool {
        let mut rx = self.state.subscribe();
        tokio::time::timeout(grace, rx.wait_for(|s| s.run_id().is_none()))
            .await
            .is_ok()
    }

    fn lock_in_flight(&self) -> MutexGuard<'_, Option<(RunId, AbortHandle)>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run whose task is still alive, if any.
    fn live_run(&self) -> Option<RunId> {
        self.lock_in_flight()
            .as_ref()
            .filter(|(_, handle)| !handle.is_finished())
            .map(|(run_id, _)| *run_id)
    }

    fn acquire(&self, run_id: RunId) -> Result<RunLease, AssetCycleError> {
        if self.closing.load(Ordering::SeqCst) {
            return Err(AssetCycleError::ShuttingDown);
        }

        let at = Instant::now();
        let ceiling = self.settings.timeout;
        let live = self.live_run();
        let mut rejection = None;
        // A lock past its timeout is only taken over when its task is gone.
        self.state.send_if_modified(|state| match *state {
            RunState::Running { run_id: current, since }
                if live == Some(current) || at.duration_since(since) <= ceiling =>
            {
                rejection = Some(AssetCycleError::AlreadyRunning { run_id: current });
                false
            }
            RunState::CoolingDown { until } if until > at => {
                rejection = Some(AssetCycleError::CoolingDown {
                    retry_after_secs: ceil_secs(until - at),
                });
                false
            }
            previous => {
                if let RunState::Running { run_id: stale, .. } = previous {
                    tracing::warn!(%stale, "force-releasing stale run lock");
                }
                *state = RunState::Running { run_id, since: at };
                true
            }
        });

        match rejection {
            Some(err) => Err(err),
            None => Ok(RunLease {
                state: Arc::clone(&self.state),
                run_id,
                since: at,
                cooldown: self.settings.cooldown,
                completed: false,
            }),
        }
    }

    #[tracing::instrument(skip_all, fields(run_id = %run.id))]
    async fn execute(
        &self,
        run: LifecycleRun,
        lease: RunLease,
    ) -> Result<LifecycleRun, AssetCycleError> {
        let limit = self.settings.timeout;
        let stop = StopSignal::new(lease.since + limit, Arc::clone(&self.cancelled));
        let mut run = self.runs.create(run).await?;
        let config = self.config.get().await;

        let mut progress = RunProgress::default();
        let result = self.run_phases(&run, &config, &stop, &mut progress).await;
        let unaudited = progress.record_into(&mut run);

        let finished_at = now();
        match result {
            Ok(()) => run.complete(finished_at),
            Err(Halt::Storage(err)) => {
                tracing::error!(error = %err, unaudited = unaudited.len(), "lifecycle run aborted by storage failure");
                run.fail(
                    RunFailure::Storage {
                        message: describe(&err),
                        unaudited,
                    },
                    finished_at,
                );
            }
            Err(Halt::DeadlineReached) => {
                tracing::error!(limit_secs = limit.as_secs(), "lifecycle run exceeded its timeout");
                run.fail(
                    RunFailure::TimeoutExceeded {
                        limit_secs: limit.as_secs(),
                    },
                    finished_at,
                );
            }
            Err(Halt::Cancelled) => {
                tracing::warn!("lifecycle run cancelled by shutdown");
                run.abandon(finished_at);
            }
        }

        if let Err(err) = self.runs.update(run.clone()).await {
            tracing::error!(error = %err, "failed to record lifecycle run summary");
        }
        lease.release(run.status == RunStatus::Completed);

        tracing::info!(
            status = %run.status,
            dead_stock_moved = run.counts.dead_stock_moved,
            disposal_moved = run.counts.disposal_moved,
            skipped = run.skipped.len(),
            "lifecycle run finished"
        );
        if run.status == RunStatus::Abandoned {
            return Err(AssetCycleError::ShuttingDown);
        }
        Ok(run)
    }

    async fn run_phases(
        &self,
        run: &LifecycleRun,
        config: &LifecycleConfig,
        stop: &StopSignal,
        progress: &mut RunProgress,
    ) -> Result<(), Halt> {
        stop.check()?;
        let now = run.started_at;
        let phases = run.phases;

        // Both snapshots are taken before any write, so an asset moved to
        // dead stock below is never seen by the disposal phase of this run.
        let active = if phases.includes_dead_stock() {
            self.snapshot(AssetStatus::Active, stop).await?
        } else {
            Vec::new()
        };
        let dead_stock = if phases.includes_disposal() {
            self.snapshot(AssetStatus::DeadStock, stop).await?
        } else {
            Vec::new()
        };

        let ctx = TransitionContext {
            actor: run
                .triggered_by
                .clone()
                .unwrap_or_else(|| self.settings.actor.clone()),
            now,
            run_id: Some(run.id),
        };

        if phases.includes_dead_stock() {
            let candidates = evaluate_dead_stock_candidates(&active, config, now);
            tracing::info!(candidates = candidates.len(), "dead-stock phase");
            self.executor
                .apply(
                    TransitionKind::DeadStock,
                    &candidates,
                    &ctx,
                    stop,
                    &mut progress.dead_stock,
                )
                .await?;
        }

        if phases.includes_disposal() {
            let candidates = evaluate_disposal_candidates(&dead_stock, config, now);
            tracing::info!(candidates = candidates.len(), "disposal phase");
            self.executor
                .apply(
                    TransitionKind::Disposal,
                    &candidates,
                    &ctx,
                    stop,
                    &mut progress.disposal,
                )
                .await?;
        }

        Ok(())
    }

    /// Read-only, so it may be cut short at the deadline.
    async fn snapshot(&self, status: AssetStatus, stop: &StopSignal) -> Result<Vec<Asset>, Halt> {
        let query = self.assets.query_assets(AssetFilter::with_status(status));
        let assets = match stop.deadline() {
            Some(deadline) => tokio::time::timeout_at(deadline, query)
                .await
                .map_err(|_| Halt::DeadlineReached)??,
            None => query.await?,
        };
        Ok(assets)
    }
}

fn ceil_secs(remaining: Duration) -> u64 {
    remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0)
}

/// Error message including its whole source chain.
fn describe(err: &(dyn std::error::Error + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
