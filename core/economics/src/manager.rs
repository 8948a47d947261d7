// o2ul/core/economics/src/manager.rs

//! UltraStable manager: owns the update scheduler and everything a cycle
//! needs (decision source, engine, notifier, last-applied timestamp).

use crate::engine::SupplyAdjustmentEngine;
use crate::events::{EventNotifier, Subscription, ValueUpdate, DEFAULT_EVENT_CAPACITY};
use crate::history::JournalError;
use crate::keys::StateKey;
use crate::metrics::{UPDATE_CYCLES_TOTAL, UPDATE_CYCLE_SECONDS};
use crate::seigniorage::{
    AdjustmentDecision, AdjustmentError, AppliedAdjustment, ApplyOutcome, HistoryRecord,
};
use crate::source::{DecisionSource, SourceError};
use crate::token::{units, StableTokenConfig};
use chrono::{DateTime, Utc};
use o2ul_execution::{Address, Ledger, LedgerError, StateProvider, Word};
use parking_lot::{Mutex, MutexGuard, RwLock};
use primitive_types::U256;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone)]
pub struct UltraStableConfig {
    /// Scheduler tick period
    pub update_interval: Duration,
    /// Bound on the `query_oracle` call that opens every scheduled tick
    pub oracle_timeout: Duration,
    /// Counterparty of adjustments; falls back to the persisted treasury address
    pub treasury: Option<Address>,
    pub event_capacity: usize,
}

impl Default for UltraStableConfig {
    fn default() -> Self {
        Self {
            update_interval: Duration::from_secs(60),
            oracle_timeout: Duration::from_secs(30),
            treasury: None,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SchedulerState {
    Idle = 0,
    Checking = 1,
    Stopped = 2,
}

impl SchedulerState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => SchedulerState::Idle,
            1 => SchedulerState::Checking,
            _ => SchedulerState::Stopped,
        }
    }
}

/// What one update cycle did
#[derive(Debug, Clone)]
pub struct UpdateReport {
    pub decision: AdjustmentDecision,
    pub outcome: ApplyOutcome,
    /// Unix seconds of the cycle
    pub timestamp: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum UpdateError {
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("decision source error: {0}")]
    Source(#[from] SourceError),

    #[error("decision source did not answer within {0:?}")]
    SourceTimeout(Duration),

    #[error("adjustment failed: {0}")]
    Adjustment(#[from] AdjustmentError),

    #[error("history journal error: {0}")]
    Journal(#[from] JournalError),

    #[error("no treasury account configured")]
    MissingTreasury,

    #[error("corrupt UltraStable state: {0}")]
    CorruptState(String),

    #[error("UltraStable manager has been stopped")]
    Stopped,
}

struct Worker {
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

/// Holds the cycle lock; the scheduler reports `Checking` while it lives
struct CycleGuard<'a> {
    state: &'a AtomicU8,
    _lock: MutexGuard<'a, ()>,
}

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        // Runs before the lock field is released
        let _ = self.state.compare_exchange(
            SchedulerState::Checking as u8,
            SchedulerState::Idle as u8,
            Ordering::SeqCst,
            Ordering::SeqCst,
        );
    }
}

pub struct UltraStableManager {
    config: UltraStableConfig,
    state_provider: Arc<dyn StateProvider>,
    source: Arc<dyn DecisionSource>,
    engine: SupplyAdjustmentEngine,
    notifier: Arc<EventNotifier>,
    /// One adjustment cycle at a time
    cycle_lock: Mutex<()>,
    /// Source timestamp consumed by the last cycle
    last_applied: RwLock<Option<DateTime<Utc>>>,
    state: AtomicU8,
    worker: Mutex<Option<Worker>>,
}

impl UltraStableManager {
    pub fn new(
        config: UltraStableConfig,
        state_provider: Arc<dyn StateProvider>,
        source: Arc<dyn DecisionSource>,
    ) -> Self {
        let notifier = Arc::new(EventNotifier::new(config.event_capacity));
        let engine = SupplyAdjustmentEngine::new(source.clone(), notifier.clone());
        Self {
            config,
            state_provider,
            source,
            engine,
            notifier,
            cycle_lock: Mutex::new(()),
            last_applied: RwLock::new(None),
            state: AtomicU8::new(SchedulerState::Idle as u8),
            worker: Mutex::new(None),
        }
    }

    /// Start the decision source and the periodic update task
    pub async fn start(self: &Arc<Self>) -> Result<(), UpdateError> {
        if self.scheduler_state() == SchedulerState::Stopped {
            return Err(UpdateError::Stopped);
        }
        if self.worker.lock().is_some() {
            warn!("UltraStable manager already running");
            return Ok(());
        }

        self.source.start().await?;

        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();
        let manager = Arc::clone(self);
        let period = self.config.update_interval;

        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(e) = manager.refresh_source().await {
                            warn!(error = %e, "Oracle refresh failed, checking held data");
                        }
                        manager.check_for_updates();
                    }
                    _ = &mut shutdown_rx => {
                        info!("UltraStable scheduler shutdown requested");
                        break;
                    }
                }
            }
        });

        *self.worker.lock() = Some(Worker {
            shutdown: shutdown_tx,
            handle,
        });
        info!(interval = ?period, "UltraStable manager started");
        Ok(())
    }

    /// Stop the scheduler. A cycle already running finishes first; every
    /// subscription is closed afterwards.
    pub async fn stop(&self) {
        self.state
            .store(SchedulerState::Stopped as u8, Ordering::SeqCst);

        let worker = self.worker.lock().take();
        if let Some(worker) = worker {
            let _ = worker.shutdown.send(());
            if let Err(e) = worker.handle.await {
                error!(error = %e, "UltraStable scheduler task failed");
            }
        }

        self.notifier.close();
        self.source.stop().await;
        info!("UltraStable manager stopped");
    }

    pub fn scheduler_state(&self) -> SchedulerState {
        SchedulerState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Run a cycle if the source holds data newer than the last one applied.
    /// Failures are logged, never returned.
    pub fn check_for_updates(&self) -> Option<UpdateReport> {
        if self.scheduler_state() == SchedulerState::Stopped {
            return None;
        }
        let _cycle = self.begin_cycle();
        // Stop may have landed while waiting for the lock
        if self.scheduler_state() == SchedulerState::Stopped {
            return None;
        }

        let latest = self.source.last_update_time();
        let is_newer = match (latest, *self.last_applied.read()) {
            (Some(latest), Some(applied)) => latest > applied,
            (Some(_), None) => true,
            (None, _) => false,
        };
        if !is_newer {
            debug!("No new market data");
            return None;
        }

        match self.timed_cycle() {
            Ok(report) => Some(report),
            Err(e) => {
                error!(error = %e, "UltraStable update cycle failed");
                None
            }
        }
    }

    /// One full decide-then-apply cycle against a single ledger snapshot
    pub fn process_update(&self) -> Result<UpdateReport, UpdateError> {
        let _cycle = self.begin_cycle();
        self.timed_cycle()
    }

    /// Ask the source for fresh data, bounded by the configured oracle timeout
    pub async fn refresh_source(&self) -> Result<(), UpdateError> {
        self.query_source(self.config.oracle_timeout).await
    }

    async fn query_source(&self, timeout: Duration) -> Result<(), UpdateError> {
        tokio::time::timeout(timeout, self.source.query_oracle())
            .await
            .map_err(|_| UpdateError::SourceTimeout(timeout))??;
        Ok(())
    }

    fn begin_cycle(&self) -> CycleGuard<'_> {
        let lock = self.cycle_lock.lock();
        let _ = self.state.compare_exchange(
            SchedulerState::Idle as u8,
            SchedulerState::Checking as u8,
            Ordering::SeqCst,
            Ordering::SeqCst,
        );
        CycleGuard {
            state: &self.state,
            _lock: lock,
        }
    }

    /// Caller holds the cycle lock
    fn timed_cycle(&self) -> Result<UpdateReport, UpdateError> {
        let timer = UPDATE_CYCLE_SECONDS.start_timer();

        let result = self.run_cycle();

        timer.observe_duration();
        let status = match &result {
            Ok(report) => report.outcome.label(),
            Err(_) => "failed",
        };
        UPDATE_CYCLES_TOTAL.with_label_values(&[status]).inc();
        result
    }

    fn run_cycle(&self) -> Result<UpdateReport, UpdateError> {
        let observed = self.source.last_update_time();
        let state = self.state_provider.latest_state()?;
        let ledger: &dyn Ledger = state.as_ref();

        let current_supply = StateKey::CurrentSupply.read_u256(ledger)?;
        let mut price = StateKey::ValueTokenPrice.read_u256(ledger)?;
        if price.is_zero() {
            price = units(1);
        }
        let volatility = StateKey::MarketVolatility
            .read(ledger)?
            .to_u64()
            .map_err(|e| UpdateError::CorruptState(format!("market volatility: {e}")))?
            .min(100) as u8;

        let decision = self
            .source
            .compute_decision(current_supply, price, volatility)?;

        // The decision is consumed whatever happens next; a failed apply is
        // not retried against the same data.
        if observed.is_some() {
            *self.last_applied.write() = observed;
        }

        let now = Utc::now().timestamp().max(0) as u64;
        let target_value = self.source.target_value();
        let current_value = self.source.current_value();
        StateKey::TargetValue.write(ledger, Word::from_u256(target_value))?;
        StateKey::CurrentValue.write(ledger, Word::from_u256(current_value))?;
        StateKey::LastUpdateTime.write(ledger, Word::from_u64(now))?;

        self.notifier.publish_update(ValueUpdate {
            decision: decision.clone(),
            target_value,
            current_value,
            timestamp: now,
        });

        let treasury = if decision.is_none() {
            Address::zero()
        } else {
            self.resolve_treasury(ledger)?
        };
        let outcome = self.engine.apply(&decision, treasury, ledger)?;

        debug!(
            kind = %decision.kind,
            deviation_bps = decision.deviation_bps,
            outcome = outcome.label(),
            "UltraStable update processed"
        );
        Ok(UpdateReport {
            decision,
            outcome,
            timestamp: now,
        })
    }

    fn resolve_treasury(&self, ledger: &dyn Ledger) -> Result<Address, UpdateError> {
        if let Some(treasury) = self.config.treasury {
            return Ok(treasury);
        }
        let stored = StateKey::TreasuryAddress
            .read(ledger)?
            .to_address()
            .map_err(|e| UpdateError::CorruptState(format!("treasury address: {e}")))?;
        if stored.is_zero() {
            return Err(UpdateError::MissingTreasury);
        }
        Ok(stored)
    }

    /// Apply an externally supplied decision, serialized with the scheduler
    pub fn apply_adjustment(
        &self,
        decision: &AdjustmentDecision,
        treasury: Address,
    ) -> Result<ApplyOutcome, UpdateError> {
        let _cycle = self.cycle_lock.lock();
        let state = self.state_provider.latest_state()?;
        Ok(self.engine.apply(decision, treasury, state.as_ref())?)
    }

    /// Query the oracle now and run a cycle. Errors reach the caller.
    pub async fn force_update(&self, timeout: Duration) -> Result<UpdateReport, UpdateError> {
        if self.scheduler_state() == SchedulerState::Stopped {
            return Err(UpdateError::Stopped);
        }

        self.query_source(timeout).await?;
        self.process_update()
    }

    /// Up to `max_entries` most recent adjustments, oldest first
    pub fn get_history(&self, max_entries: usize) -> Result<Vec<HistoryRecord>, UpdateError> {
        let state = self.state_provider.latest_state()?;
        Ok(self.engine.journal().query(state.as_ref(), max_entries)?)
    }

    pub fn get_current_value(&self) -> U256 {
        self.source.current_value()
    }

    pub fn get_target_value(&self) -> U256 {
        self.source.target_value()
    }

    pub fn get_volatility_reduction(&self) -> f64 {
        self.source.volatility_reduction()
    }

    pub fn stable_config(&self) -> StableTokenConfig {
        self.source.stable_config()
    }

    /// Record a new market observation for the stable token
    pub fn update_market_value(&self, value: U256) -> Result<(), UpdateError> {
        self.source.set_current_value(value);
        let state = self.state_provider.latest_state()?;
        StateKey::CurrentValue.write(state.as_ref(), Word::from_u256(value))?;
        debug!(%value, "Market value updated");
        Ok(())
    }

    pub fn subscribe_updates(&self) -> Subscription<ValueUpdate> {
        self.notifier.subscribe_updates()
    }

    pub fn subscribe_adjustments(&self) -> Subscription<AppliedAdjustment> {
        self.notifier.subscribe_adjustments()
    }
}
