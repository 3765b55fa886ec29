//! Public timer engine handle
//!
//! [`TimerEngine`] is a cheap, cloneable handle to one engine task. Operations
//! are forwarded to the task and acknowledged once applied; state reads come
//! from the latest snapshot the task published, so they never wait.
//!
//! ```no_run
//! # async fn demo() -> anyhow::Result<()> {
//! use cycle_timer::{config::TimerOptions, engine::TimerEngine};
//!
//! let engine = TimerEngine::new(TimerOptions::default())?;
//! let _sub = engine.subscribe(|event| async move {
//!     println!("{:?} {} {:?}", event.kind, event.phase, event.remaining);
//!     anyhow::Ok(())
//! });
//! engine.start().await?;
//! engine.pause().await?;
//! engine.resume().await?;
//! engine.cancel().await?;
//! # Ok(())
//! # }
//! ```

use std::{future::Future, sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, oneshot, watch};
use tracing::debug;

use crate::{
    config::TimerOptions,
    error::{ConfigError, EngineError},
    notify::{NotificationEvent, NotificationHub, Subscription},
    state::{CyclePlan, Phase, TimerSnapshot, TimerState, TimerStatus},
    tasks::engine_loop::{Command, EngineLoop, Request},
    waiter::{Clock, TokioClock},
};

/// Pending commands buffered per engine
const COMMAND_BUFFER: usize = 64;

/// Handle to a running work/break timer
#[derive(Clone)]
pub struct TimerEngine {
    requests: mpsc::Sender<Request>,
    snapshot_rx: watch::Receiver<TimerSnapshot>,
    hub: NotificationHub,
    clock: Arc<dyn Clock>,
}

impl TimerEngine {
    /// Create an engine on the tokio clock. Must be called inside a tokio
    /// runtime; the engine task is spawned immediately.
    pub fn new(options: TimerOptions) -> Result<Self, ConfigError> {
        Self::with_clock(options, Arc::new(TokioClock))
    }

    /// Create an engine driven by a custom [`Clock`]
    pub fn with_clock(options: TimerOptions, clock: Arc<dyn Clock>) -> Result<Self, ConfigError> {
        let plan = options.cycle_plan()?;
        let tick_period = options.validated_tick_interval()?;
        Ok(Self::spawn(plan, tick_period, clock))
    }

    /// Create an engine for an arbitrary phase sequence
    pub fn from_plan(
        plan: CyclePlan,
        tick_interval: Option<Duration>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ConfigError> {
        if tick_interval.is_some_and(|period| period.is_zero()) {
            return Err(ConfigError::ZeroTickInterval);
        }
        Ok(Self::spawn(plan, tick_interval, clock))
    }

    fn spawn(plan: CyclePlan, tick_period: Option<Duration>, clock: Arc<dyn Clock>) -> Self {
        let hub = NotificationHub::new();
        let (requests, request_rx) = mpsc::channel(COMMAND_BUFFER);
        let (snapshot_tx, snapshot_rx) = watch::channel(TimerSnapshot {
            state: TimerState::new(plan.current().phase, clock.now()),
            cycle_count: plan.cycle_count(),
        });

        let engine_loop = EngineLoop::new(
            plan,
            Arc::clone(&clock),
            hub.clone(),
            snapshot_tx,
            tick_period,
        );
        tokio::spawn(engine_loop.run(request_rx));

        Self {
            requests,
            snapshot_rx,
            hub,
            clock,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start (or restart) the current phase with its full duration
    pub async fn start(&self) -> Result<(), EngineError> {
        self.send(Command::Start).await
    }

    /// Freeze the countdown. No-op unless Running.
    pub async fn pause(&self) -> Result<(), EngineError> {
        self.send(Command::Pause).await
    }

    /// Continue a paused countdown from where it stopped. No-op unless Paused.
    pub async fn resume(&self) -> Result<(), EngineError> {
        self.send(Command::Resume).await
    }

    /// Complete the current phase now and start the next one
    pub async fn skip(&self) -> Result<(), EngineError> {
        self.send(Command::Skip).await
    }

    /// Stop the timer. Safe to call repeatedly or concurrently; only the
    /// call that actually stops the timer publishes `Cancelled`.
    pub async fn cancel(&self) -> Result<(), EngineError> {
        self.send(Command::Cancel).await
    }

    /// Stop the timer and rewind the cycle to its first phase
    pub async fn reset(&self) -> Result<(), EngineError> {
        self.send(Command::Reset).await
    }

    async fn send(&self, command: Command) -> Result<(), EngineError> {
        let (ack, acked) = oneshot::channel();
        self.requests
            .send(Request { command, ack })
            .await
            .map_err(|_| EngineError::Closed)?;
        acked.await.map_err(|_| EngineError::Closed)?;
        debug!("{:?} acknowledged", command);
        Ok(())
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// Latest published state
    pub fn snapshot(&self) -> TimerSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    /// Receiver notified every time the engine state changes
    pub fn changes(&self) -> watch::Receiver<TimerSnapshot> {
        self.snapshot_rx.clone()
    }

    pub fn status(&self) -> TimerStatus {
        self.snapshot_rx.borrow().state.status
    }

    pub fn is_running(&self) -> bool {
        self.status() == TimerStatus::Running
    }

    pub fn current_phase(&self) -> Phase {
        self.snapshot_rx.borrow().state.phase
    }

    /// Time left in the current phase right now
    pub fn remaining_time(&self) -> Duration {
        self.snapshot_rx.borrow().remaining_at(self.clock.now())
    }

    /// Projected end of the phase while Running, else when it stopped or paused
    pub fn stop_at_utc(&self) -> Option<DateTime<Utc>> {
        self.snapshot_rx.borrow().stop_at_utc(self.clock.now())
    }

    /// Number of phases completed since construction or the last reset
    pub fn cycle_count(&self) -> u64 {
        self.snapshot_rx.borrow().cycle_count
    }

    // ── Subscriptions ────────────────────────────────────────────────

    pub fn subscribe<F, Fut>(&self, handler: F) -> Subscription
    where
        F: Fn(NotificationEvent) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.hub.subscribe(handler)
    }

    pub fn unsubscribe(&self, subscription: &Subscription) -> bool {
        self.hub.unsubscribe(subscription)
    }

    /// The hub events are published on, for collaborators that relay them
    pub fn hub(&self) -> &NotificationHub {
        &self.hub
    }
}

impl std::fmt::Debug for TimerEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerEngine")
            .field("snapshot", &*self.snapshot_rx.borrow())
            .finish()
    }
}
