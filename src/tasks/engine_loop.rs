//! Timer engine background task
//!
//! One task per engine owns the [`TimerState`], the [`CyclePlan`] cursor and
//! the single in-flight wait. Commands, wait completions and ticks are all
//! handled on this task, one at a time, which serializes every mutation.

use std::{future::Future, pin::Pin, sync::Arc, time::Duration};

use tokio::{
    sync::{mpsc, oneshot, watch},
    time::{interval_at, Interval, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::{
    error::WaiterError,
    notify::{EventKind, NotificationEvent, NotificationHub},
    state::{CyclePlan, TimerSnapshot, TimerState, TimerStatus},
    waiter::{Clock, MonotonicWaiter, WaitOutcome},
};

/// Operations accepted by the engine task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Pause,
    Resume,
    Skip,
    Cancel,
    Reset,
}

/// A command plus the channel used to acknowledge it
#[derive(Debug)]
pub struct Request {
    pub command: Command,
    pub ack: oneshot::Sender<()>,
}

type WaitFuture = Pin<Box<dyn Future<Output = Result<WaitOutcome, WaiterError>> + Send>>;

/// The one wait allowed to be in flight
struct ActiveWait {
    cancel: CancellationToken,
    future: WaitFuture,
}

/// State owned by the engine task
pub struct EngineLoop {
    plan: CyclePlan,
    state: TimerState,
    clock: Arc<dyn Clock>,
    hub: NotificationHub,
    snapshot_tx: watch::Sender<TimerSnapshot>,
    tick_period: Option<Duration>,
    wait: Option<ActiveWait>,
    ticker: Option<Interval>,
}

impl EngineLoop {
    pub fn new(
        plan: CyclePlan,
        clock: Arc<dyn Clock>,
        hub: NotificationHub,
        snapshot_tx: watch::Sender<TimerSnapshot>,
        tick_period: Option<Duration>,
    ) -> Self {
        let state = TimerState::new(plan.current().phase, clock.now());
        Self {
            plan,
            state,
            clock,
            hub,
            snapshot_tx,
            tick_period,
            wait: None,
            ticker: None,
        }
    }

    /// Snapshot of the current state
    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            state: self.state.clone(),
            cycle_count: self.plan.cycle_count(),
        }
    }

    /// Run until every engine handle has been dropped
    pub async fn run(mut self, mut requests: mpsc::Receiver<Request>) {
        debug!("Timer engine task started");
        self.refresh_snapshot();

        loop {
            tokio::select! {
                request = requests.recv() => match request {
                    Some(Request { command, ack }) => {
                        self.handle(command).await;
                        self.refresh_snapshot();
                        // The caller may have given up waiting; nothing to do then.
                        let _ = ack.send(());
                    }
                    None => break,
                },

                outcome = next_outcome(&mut self.wait) => {
                    self.wait = None;
                    self.on_wait_finished(outcome).await;
                    self.refresh_snapshot();
                }

                _ = next_tick(&mut self.ticker) => {
                    self.publish(EventKind::Tick, self.remaining_now());
                }
            }
        }

        self.dispose().await;
    }

    async fn handle(&mut self, command: Command) {
        debug!("Handling {:?} while {:?}", command, self.state.status);
        match command {
            Command::Start => self.start_phase().await,
            Command::Pause => self.pause().await,
            Command::Resume => self.resume().await,
            Command::Skip => self.skip().await,
            Command::Cancel => self.cancel().await,
            Command::Reset => self.reset().await,
        }
    }

    /// (Re)start the phase the plan currently points at
    async fn start_phase(&mut self) {
        self.abort_wait().await;

        let spec = self.plan.current();
        let now = self.clock.now();
        self.state = self.state.with_phase_reset(spec.phase, spec.duration, now);
        self.state.status = TimerStatus::Running;
        self.state.halted_at_utc = None;

        info!("Starting {} phase for {:?}", spec.phase, spec.duration);
        self.publish(EventKind::Started, spec.duration);
        self.arm(spec.duration);
    }

    async fn pause(&mut self) {
        if !self.state.is_running() {
            debug!("Pause ignored, timer is {:?}", self.state.status);
            return;
        }

        let now = self.clock.now();
        let remaining = self.state.compute_remaining_now(now);
        self.abort_wait().await;

        self.state.remaining = remaining;
        self.state.status = TimerStatus::Paused;
        self.state.last_transition_at = now;
        self.state.halted_at_utc = Some(chrono::Utc::now());

        info!("Paused {} phase with {:?} remaining", self.state.phase, remaining);
        self.publish(EventKind::Paused, remaining);
    }

    async fn resume(&mut self) {
        if !self.state.is_paused() {
            debug!("Resume ignored, timer is {:?}", self.state.status);
            return;
        }

        if self.state.remaining.is_zero() {
            debug!("Nothing left to resume, completing phase");
            self.on_elapse().await;
            return;
        }

        self.state.status = TimerStatus::Running;
        self.state.last_transition_at = self.clock.now();
        self.state.halted_at_utc = None;
        let remaining = self.state.remaining;
        self.arm(remaining);

        info!("Resumed {} phase with {:?} remaining", self.state.phase, remaining);
        self.publish(EventKind::Resumed, remaining);
    }

    async fn skip(&mut self) {
        if self.state.is_stopped() {
            debug!("Skip ignored, timer is stopped");
            return;
        }

        self.abort_wait().await;
        self.state.remaining = Duration::ZERO;
        info!("Skipping rest of {} phase", self.state.phase);
        self.on_elapse().await;
    }

    async fn cancel(&mut self) {
        if self.state.is_stopped() {
            debug!("Cancel ignored, timer is already stopped");
            return;
        }

        let now = self.clock.now();
        let remaining = self.state.compute_remaining_now(now);
        self.abort_wait().await;
        self.halt(now);

        info!("Cancelled {} phase with {:?} remaining", self.state.phase, remaining);
        self.publish(EventKind::Cancelled, remaining);
    }

    async fn reset(&mut self) {
        self.cancel().await;
        self.plan.reset();
        let halted_at = self.state.halted_at_utc;
        self.state = TimerState::new(self.plan.current().phase, self.clock.now());
        self.state.halted_at_utc = halted_at;
        info!("Cycle reset to {} phase", self.state.phase);
    }

    /// Phase completion, from a natural elapse, a skip or an empty resume
    async fn on_elapse(&mut self) {
        let finished = self.state.phase;
        self.state.remaining = Duration::ZERO;
        self.ticker = None;

        info!("{} phase completed", finished);
        self.publish(EventKind::PhaseCompleted, Duration::ZERO);
        self.plan.next();
        self.start_phase().await;
    }

    async fn on_wait_finished(&mut self, outcome: Result<WaitOutcome, WaiterError>) {
        match outcome {
            Ok(WaitOutcome::Elapsed) if self.state.is_running() => self.on_elapse().await,
            Ok(outcome) => {
                debug!("Discarding {:?} wait outcome while {:?}", outcome, self.state.status);
            }
            Err(e) => {
                let now = self.clock.now();
                let remaining = self.state.compute_remaining_now(now);
                self.halt(now);

                error!("Timer fault during {} phase: {}", self.state.phase, e);
                self.hub.publish(NotificationEvent::fault(
                    self.state.phase,
                    remaining,
                    self.plan.cycle_count(),
                    e.to_string(),
                ));
            }
        }
    }

    /// Move to Stopped with nothing left on the clock
    fn halt(&mut self, now: tokio::time::Instant) {
        self.state.status = TimerStatus::Stopped;
        self.state.remaining = Duration::ZERO;
        self.state.last_transition_at = now;
        self.state.halted_at_utc = Some(chrono::Utc::now());
        self.ticker = None;
    }

    /// Arm a fresh waiter for `duration`. Any previous wait must be gone.
    fn arm(&mut self, duration: Duration) {
        debug_assert!(self.wait.is_none(), "a wait is already in flight");

        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let mut waiter = MonotonicWaiter::new(Arc::clone(&self.clock), duration);
        let future: WaitFuture = Box::pin(async move { waiter.wait(&token).await });
        self.wait = Some(ActiveWait { cancel, future });

        // First tick is one period after the engine clock's now; spacing
        // after that is kept by the tokio timer.
        let now = self.clock.now();
        self.ticker = self.tick_period.map(|period| {
            let mut ticker = interval_at(now + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker
        });
    }

    /// Cancel the in-flight wait and wait for it to finish
    async fn abort_wait(&mut self) {
        self.ticker = None;
        if let Some(active) = self.wait.take() {
            active.cancel.cancel();
            match active.future.await {
                Ok(outcome) => debug!("Previous wait ended as {:?}", outcome),
                Err(e) => debug!("Previous wait ended with {}", e),
            }
        }
    }

    async fn dispose(&mut self) {
        debug!("All engine handles dropped, stopping timer task");
        self.abort_wait().await;
        if !self.state.is_stopped() {
            let now = self.clock.now();
            self.halt(now);
        }
        self.refresh_snapshot();
    }

    fn remaining_now(&self) -> Duration {
        self.state.compute_remaining_now(self.clock.now())
    }

    fn publish(&self, kind: EventKind, remaining: Duration) {
        self.hub.publish(NotificationEvent::new(
            kind,
            self.state.phase,
            remaining,
            self.plan.cycle_count(),
        ));
    }

    fn refresh_snapshot(&self) {
        self.snapshot_tx.send_replace(self.snapshot());
    }
}

/// Resolve when the in-flight wait finishes; pending forever if there is none
async fn next_outcome(wait: &mut Option<ActiveWait>) -> Result<WaitOutcome, WaiterError> {
    match wait {
        Some(active) => (&mut active.future).await,
        None => std::future::pending().await,
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}
