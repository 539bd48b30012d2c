//! Periodic simulation driver with a Stopped/Running state machine.
//!
//! Ticks run on a tokio task, one at a time, the first one a full period after
//! `start`. A tick that overruns its period makes the interval skip the missed
//! slots instead of bursting.

use crate::core::components::registry::EvaluatorRegistry;
use crate::core::components::signal::SignalHandle;
use crate::core::errors::SimulationError;
use crate::core::execution::circuit::panic_message;
use crate::core::execution::config::SimulationConfig;
use crate::core::execution::simulation_engine::{SimulationEngine, TickReport};
use crate::core::page::Page;
use crate::core::types::BlockId;
use log::{error, info, warn};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use uuid::Uuid;

/// Receives results from the ticking task; implementations hand them over
/// to the host's own thread.
pub trait TickObserver: Send + Sync {
    fn on_tick(&self, report: &TickReport);

    /// The run died; the driver is already stopped when this is called
    fn on_fault(&self, _error: &SimulationError) {}
}

impl<F> TickObserver for F
where
    F: Fn(&TickReport) + Send + Sync,
{
    fn on_tick(&self, report: &TickReport) {
        self(report)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Stopped,
    Running,
}

struct ActiveRun {
    run_id: Uuid,
    signals: BTreeMap<BlockId, SignalHandle>,
    running: Arc<AtomicBool>,
    stop_tx: watch::Sender<bool>,
    handle: JoinHandle<Result<(), SimulationError>>,
}

pub struct SimulationDriver {
    registry: Arc<EvaluatorRegistry>,
    config: SimulationConfig,
    observer: Arc<dyn TickObserver>,
    active: Option<ActiveRun>,
}

impl SimulationDriver {
    pub fn new(
        registry: Arc<EvaluatorRegistry>,
        config: SimulationConfig,
        observer: Arc<dyn TickObserver>,
    ) -> Self {
        Self {
            registry,
            config,
            observer,
            active: None,
        }
    }

    pub fn state(&self) -> DriverState {
        match &self.active {
            Some(run) if run.running.load(Ordering::Acquire) => DriverState::Running,
            _ => DriverState::Stopped,
        }
    }

    pub fn is_running(&self) -> bool {
        self.state() == DriverState::Running
    }

    /// Id of the current or last unreaped run
    pub fn run_id(&self) -> Option<Uuid> {
        self.active.as_ref().map(|run| run.run_id)
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Build graph and evaluators for `page` and begin ticking.
    ///
    /// Must be called from within a tokio runtime. Nothing is spawned when the
    /// page cannot be wired, and the driver stays stopped.
    pub fn start(&mut self, page: &Page) -> Result<Uuid, SimulationError> {
        if self.is_running() {
            return Err(SimulationError::AlreadyRunning);
        }
        if self.config.resolution.is_zero() {
            return Err(SimulationError::InvalidResolution);
        }
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| SimulationError::NoRuntime)?;

        if let Some(stale) = self.active.take() {
            // Faulted run already reported through the observer.
            stale.handle.abort();
        }

        let engine = SimulationEngine::new(page, &self.registry, &self.config)?;
        let run_id = engine.run_id();
        let signals = engine.circuit().signals().clone();
        let running = Arc::new(AtomicBool::new(true));
        let (stop_tx, stop_rx) = watch::channel(false);

        let handle = runtime.spawn(run_ticks(
            engine,
            self.config.clone(),
            stop_rx,
            Arc::clone(&self.observer),
            Arc::clone(&running),
        ));

        info!("Simulation {} started", run_id);
        self.active = Some(ActiveRun {
            run_id,
            signals,
            running,
            stop_tx,
            handle,
        });
        Ok(run_id)
    }

    /// Halt ticking and discard the run.
    ///
    /// No tick starts after this is called; a tick already in progress is
    /// awaited. Returns the fault that ended the run, if any, including a
    /// panic that escaped the tick task (e.g. from the observer).
    pub async fn stop(&mut self) -> Result<(), SimulationError> {
        let Some(run) = self.active.take() else {
            return Ok(());
        };

        run.running.store(false, Ordering::Release);
        // The task may already be gone after a fault.
        let _ = run.stop_tx.send(true);

        let result = match run.handle.await {
            Ok(result) => result,
            Err(join_error) if join_error.is_panic() => {
                let reason = panic_message(join_error.into_panic().as_ref());
                error!("Simulation {} task ended abnormally: {}", run.run_id, reason);
                Err(SimulationError::TaskFailed(reason))
            }
            // Cancelled by the runtime shutting down.
            Err(join_error) => {
                warn!("Simulation {} task cancelled: {}", run.run_id, join_error);
                Ok(())
            }
        };
        info!("Simulation {} stopped", run.run_id);
        result
    }

    /// `stop` followed by `start`
    pub async fn restart(&mut self, page: &Page) -> Result<Uuid, SimulationError> {
        if let Err(err) = self.stop().await {
            warn!("Previous run ended with: {}", err);
        }
        self.start(page)
    }

    /// Set a SIGNAL source of the running simulation; read at the next tick
    pub fn set_signal(&self, block: &BlockId, value: bool) -> Result<(), SimulationError> {
        let handle = self
            .active
            .as_ref()
            .and_then(|run| run.signals.get(block))
            .ok_or_else(|| SimulationError::UnknownSignal(block.clone()))?;
        handle.set(value);
        Ok(())
    }

    /// Signal source blocks of the current run
    pub fn signals(&self) -> Vec<BlockId> {
        self.active
            .as_ref()
            .map(|run| run.signals.keys().cloned().collect())
            .unwrap_or_default()
    }
}

impl Drop for SimulationDriver {
    fn drop(&mut self) {
        if let Some(run) = self.active.take() {
            let _ = run.stop_tx.send(true);
        }
    }
}

/// Clears the running flag however the tick task ends
struct RunningGuard(Arc<AtomicBool>);

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

async fn run_ticks(
    mut engine: SimulationEngine,
    config: SimulationConfig,
    mut stop_rx: watch::Receiver<bool>,
    observer: Arc<dyn TickObserver>,
    running: Arc<AtomicBool>,
) -> Result<(), SimulationError> {
    let _guard = RunningGuard(Arc::clone(&running));
    let mut interval = time::interval_at(Instant::now() + config.resolution, config.resolution);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            changed = stop_rx.changed() => {
                if changed.is_err() || *stop_rx.borrow() {
                    break;
                }
                continue;
            }
            _ = interval.tick() => {}
        }

        if *stop_rx.borrow() {
            break;
        }

        match engine.step() {
            Ok(report) => observer.on_tick(&report),
            Err(err) => {
                error!("Simulation {} stopped by fault: {}", engine.run_id(), err);
                running.store(false, Ordering::Release);
                observer.on_fault(&err);
                return Err(err);
            }
        }
    }

    Ok(())
}
