use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::task::{Context, Poll};
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::Stream;
use tokio::sync::mpsc;
use tokio::time::{interval, sleep, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::presentation::{check_failed_info, status_info, timeout_info, StatusInfo};
use super::traits::{QuoteService, SwapError, SwapResult};
use crate::constants::{DEFAULT_MAX_ATTEMPTS, DEFAULT_POLL_INTERVAL_MS, DEFAULT_TRACKING_TIMEOUT_MS};
use crate::types::{ExecutionDetails, SwapStatus};

/// Polling cadence and budgets for one tracking session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackingOptions {
    pub poll_interval: Duration,
    pub max_attempts: u32,
    pub timeout: Duration,
}

impl Default for TrackingOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            timeout: Duration::from_millis(DEFAULT_TRACKING_TIMEOUT_MS),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutReason {
    AttemptsExhausted,
    WallClock,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StatusEvent {
    /// The service answered with a status
    Status {
        status: SwapStatus,
        status_info: StatusInfo,
        execution: ExecutionDetails,
    },
    /// Attempt budget or wall-clock timeout ran out
    Timeout { reason: TimeoutReason },
    /// The status query failed; fatal errors end the session
    Error { error: SwapError },
}

/// One emission of a tracking session
#[derive(Debug, Clone, PartialEq)]
pub struct StatusUpdate {
    pub deposit_address: String,
    pub event: StatusEvent,
    pub attempts: u32,
    pub timestamp: DateTime<Utc>,
}

impl StatusUpdate {
    pub fn label(&self) -> &str {
        match &self.event {
            StatusEvent::Status { status, .. } => status.as_str(),
            StatusEvent::Timeout { .. } => "timeout",
            StatusEvent::Error { .. } => "error",
        }
    }

    pub fn status(&self) -> Option<&SwapStatus> {
        match &self.event {
            StatusEvent::Status { status, .. } => Some(status),
            _ => None,
        }
    }

    pub fn status_info(&self) -> StatusInfo {
        match &self.event {
            StatusEvent::Status { status_info, .. } => *status_info,
            StatusEvent::Timeout { .. } => timeout_info(),
            StatusEvent::Error { .. } => check_failed_info(),
        }
    }

    /// complete, failed, refunded or timeout
    pub fn is_terminal(&self) -> bool {
        match &self.event {
            StatusEvent::Status { status, .. } => status.is_terminal(),
            StatusEvent::Timeout { .. } => true,
            StatusEvent::Error { .. } => false,
        }
    }

    /// True for the last update a session can deliver: a terminal status or
    /// an error that stopped polling.
    pub fn ends_session(&self) -> bool {
        match &self.event {
            StatusEvent::Error { error } => error.is_fatal_for_tracking(),
            _ => self.is_terminal(),
        }
    }
}

type ActiveSessions = Arc<DashMap<String, u64>>;

struct SessionShared {
    id: u64,
    deposit_address: String,
    started_at: DateTime<Utc>,
    attempts: AtomicU32,
    /// `None` once the session has stopped; taking it is the stop transition
    sender: Mutex<Option<mpsc::UnboundedSender<StatusUpdate>>>,
    cancel: CancellationToken,
    halted_by_caller: AtomicBool,
    active: ActiveSessions,
}

impl SessionShared {
    fn sender(&self) -> MutexGuard<'_, Option<mpsc::UnboundedSender<StatusUpdate>>> {
        self.sender.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn is_active(&self) -> bool {
        !self.cancel.is_cancelled()
    }

    fn release(&self) {
        self.cancel.cancel();
        self.active.remove_if(&self.deposit_address, |_, id| *id == self.id);
    }

    fn update(&self, event: StatusEvent) -> StatusUpdate {
        StatusUpdate {
            deposit_address: self.deposit_address.clone(),
            event,
            attempts: self.attempts.load(Ordering::SeqCst),
            timestamp: Utc::now(),
        }
    }

    /// Deliver a non-terminal update. Returns false if the session is over.
    fn emit(&self, update: StatusUpdate) -> bool {
        let mut sender = self.sender();
        let delivered = match sender.as_ref() {
            Some(tx) => tx.send(update).is_ok(),
            None => return false,
        };
        if !delivered {
            // Nobody is listening any more
            sender.take();
            self.release();
            debug!("🔌 Status stream for {} dropped, stopping", self.deposit_address);
        }
        delivered
    }

    /// Stop the session and deliver its last update under the same lock.
    fn finish(&self, update: StatusUpdate) {
        let mut sender = self.sender();
        if let Some(tx) = sender.take() {
            self.release();
            info!(
                "🏁 Tracking {} finished with '{}' after {} attempts",
                self.deposit_address, update.label(), update.attempts
            );
            let _ = tx.send(update);
        }
    }

    /// Idempotent external stop.
    fn stop(&self) {
        let mut sender = self.sender();
        if sender.take().is_some() {
            self.halted_by_caller.store(true, Ordering::SeqCst);
            self.release();
            info!("🛑 Tracking {} stopped by caller", self.deposit_address);
        }
    }
}

/// Caller-side handle of a tracking session
#[derive(Clone)]
pub struct TrackingHandle {
    shared: Arc<SessionShared>,
}

impl std::fmt::Debug for TrackingHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackingHandle")
            .field("deposit_address", &self.shared.deposit_address)
            .field("attempts", &self.attempts())
            .field("active", &self.is_active())
            .finish()
    }
}

impl TrackingHandle {
    /// Safe to call at any time and any number of times, including while
    /// consuming the status stream.
    pub fn stop(&self) {
        self.shared.stop();
    }

    pub fn attempts(&self) -> u32 {
        self.shared.attempts.load(Ordering::SeqCst)
    }

    pub fn is_active(&self) -> bool {
        self.shared.is_active()
    }

    pub fn deposit_address(&self) -> &str {
        &self.shared.deposit_address
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.shared.started_at
    }
}

/// Ordered status updates of one session. Ends after the session stops.
pub struct StatusStream {
    rx: mpsc::UnboundedReceiver<StatusUpdate>,
    shared: Arc<SessionShared>,
}

impl std::fmt::Debug for StatusStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusStream")
            .field("deposit_address", &self.shared.deposit_address)
            .field("halted", &self.shared.halted_by_caller.load(Ordering::SeqCst))
            .finish()
    }
}

impl StatusStream {
    pub async fn recv(&mut self) -> Option<StatusUpdate> {
        futures::future::poll_fn(|cx| Pin::new(&mut *self).poll_next(cx)).await
    }
}

impl Stream for StatusStream {
    type Item = StatusUpdate;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        // Updates queued before an explicit stop are discarded
        if self.shared.halted_by_caller.load(Ordering::SeqCst) {
            return Poll::Ready(None);
        }
        self.rx.poll_recv(cx)
    }
}

/// Polls execution status for deposit addresses.
///
/// At most one session per deposit address is allowed at a time; a second
/// `start_tracking` for the same address is rejected until the first stops.
#[derive(Debug)]
pub struct SwapStatusTracker {
    service: Arc<dyn QuoteService>,
    active: ActiveSessions,
    next_session: AtomicU64,
}

impl SwapStatusTracker {
    pub fn new(service: Arc<dyn QuoteService>) -> Self {
        Self {
            service,
            active: Arc::new(DashMap::new()),
            next_session: AtomicU64::new(1),
        }
    }

    pub fn is_tracking(&self, deposit_address: &str) -> bool {
        self.active.contains_key(deposit_address)
    }

    pub fn active_sessions(&self) -> Vec<String> {
        self.active.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Start polling `deposit_address`. The first poll fires immediately.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start_tracking(
        &self,
        deposit_address: &str,
        options: TrackingOptions,
    ) -> SwapResult<(TrackingHandle, StatusStream)> {
        let id = self.next_session.fetch_add(1, Ordering::SeqCst);

        match self.active.entry(deposit_address.to_string()) {
            Entry::Occupied(_) => {
                warn!("⚠️ {} is already being tracked", deposit_address);
                return Err(SwapError::AlreadyTracking(deposit_address.to_string()));
            }
            Entry::Vacant(slot) => {
                slot.insert(id);
            }
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let shared = Arc::new(SessionShared {
            id,
            deposit_address: deposit_address.to_string(),
            started_at: Utc::now(),
            attempts: AtomicU32::new(0),
            sender: Mutex::new(Some(tx)),
            cancel: CancellationToken::new(),
            halted_by_caller: AtomicBool::new(false),
            active: Arc::clone(&self.active),
        });

        info!(
            "🔍 Tracking {} (every {:?}, max {} attempts, timeout {:?})",
            deposit_address, options.poll_interval, options.max_attempts, options.timeout
        );

        tokio::spawn(run_session(Arc::clone(&shared), Arc::clone(&self.service), options));

        Ok((
            TrackingHandle { shared: Arc::clone(&shared) },
            StatusStream { rx, shared },
        ))
    }
}

async fn run_session(shared: Arc<SessionShared>, service: Arc<dyn QuoteService>, options: TrackingOptions) {
    let mut ticker = interval(options.poll_interval.max(Duration::from_millis(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let deadline = sleep(options.timeout);
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            biased;
            _ = shared.cancel.cancelled() => break,
            _ = &mut deadline => {
                warn!("⏰ Tracking {} hit the {:?} timeout", shared.deposit_address, options.timeout);
                shared.finish(shared.update(StatusEvent::Timeout { reason: TimeoutReason::WallClock }));
                break;
            }
            _ = ticker.tick() => {}
        }

        // A tick that was already due when stop() ran must not poll
        if !shared.is_active() {
            break;
        }

        if shared.attempts.load(Ordering::SeqCst) >= options.max_attempts {
            warn!("⏰ Tracking {} used all {} attempts", shared.deposit_address, options.max_attempts);
            shared.finish(shared.update(StatusEvent::Timeout { reason: TimeoutReason::AttemptsExhausted }));
            break;
        }

        let attempt = shared.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        debug!("📡 Polling {} (attempt {}/{})", shared.deposit_address, attempt, options.max_attempts);

        let result = tokio::select! {
            biased;
            _ = shared.cancel.cancelled() => break,
            _ = &mut deadline => {
                warn!("⏰ Tracking {} hit the {:?} timeout", shared.deposit_address, options.timeout);
                shared.finish(shared.update(StatusEvent::Timeout { reason: TimeoutReason::WallClock }));
                break;
            }
            result = service.get_execution_status(&shared.deposit_address) => result,
        };

        match result {
            Ok(execution) => {
                let status = execution.status.clone();
                let update = shared.update(StatusEvent::Status {
                    status_info: status_info(&status),
                    status: status.clone(),
                    execution,
                });

                if status.is_terminal() {
                    shared.finish(update);
                    break;
                }
                if !shared.emit(update) {
                    break;
                }
            }
            Err(error) => {
                let fatal = error.is_fatal_for_tracking();
                warn!("⚠️ Status check for {} failed (attempt {}): {}", shared.deposit_address, attempt, error);

                let update = shared.update(StatusEvent::Error { error });
                if fatal {
                    shared.finish(update);
                    break;
                }
                if !shared.emit(update) {
                    break;
                }
            }
        }
    }

    debug!("Tracking task for {} exited", shared.deposit_address);
}
