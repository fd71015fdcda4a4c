// Session management module
//
// This module provides the SessionManager which owns the single active-session
// slot, launches sessions on the tokio runtime and emits session events for the
// presentation layer.

use crate::metrics::EngineMetrics;
use crate::models::{
    ClickRequest, EngineSettings, RequestError, SessionId, SessionReport, SessionStatus,
};
use crate::services::{Backends, CancelSource, ClickSession};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::{broadcast, watch};

/// Events emitted over the manager's broadcast channel
///
/// Lets the presentation layer reset its "running" indicator without polling.
#[derive(Clone, Debug, PartialEq)]
pub enum SessionEvent {
    /// A session was installed and its loop launched
    Started { id: SessionId, request: ClickRequest },

    /// A session reached `Completed`; sent exactly once per session
    Completed(SessionReport),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StartError {
    #[error("A clicking session is already running; stop it first")]
    AlreadyRunning,

    #[error("Invalid click request: {0}")]
    InvalidRequest(#[from] RequestError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StopError {
    #[error("No clicking session is running")]
    NotRunning,
}

/// The occupant of the manager's slot
#[derive(Debug)]
struct ActiveSession {
    id: SessionId,
    cancel: CancelSource,
}

struct Inner {
    /// At most one session; check and install happen under this one lock
    slot: Mutex<Option<ActiveSession>>,
    next_id: AtomicU64,
    backends: Backends,
    double_click_gap: Duration,
    events_tx: broadcast::Sender<SessionEvent>,
    metrics: Arc<EngineMetrics>,
    runtime: Handle,
}

impl Inner {
    /// Empty the slot if it still holds session `id`.
    fn release(&self, id: SessionId) {
        let mut slot = self.slot.lock();
        if slot.as_ref().is_some_and(|active| active.id == id) {
            *slot = None;
            tracing::debug!("Session {} released the active slot", id);
        }
    }
}

/// Registry enforcing "at most one active clicking session".
///
/// This is the engine's boundary towards the presentation layer:
/// - [`start()`](Self::start) validates a request, installs a session and
///   launches its loop on the runtime, returning immediately
/// - [`stop()`](Self::stop) flips the active session's cancellation signal
/// - [`subscribe()`](Self::subscribe) delivers [`SessionEvent`]s
///
/// The slot stays occupied until the session loop has fully quiesced, so a
/// new session can never overlap the last click of the previous one.
/// Cloning is cheap and shares the slot. When the last clone is dropped the
/// running session is cancelled.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<Inner>,
}

impl SessionManager {
    /// Create a manager that runs sessions on `runtime`.
    pub fn new(backends: Backends, settings: &EngineSettings, runtime: Handle) -> Self {
        let (events_tx, _) = broadcast::channel(settings.event_buffer.max(1));
        Self {
            inner: Arc::new(Inner {
                slot: Mutex::new(None),
                next_id: AtomicU64::new(1),
                backends,
                double_click_gap: settings.double_click_gap(),
                events_tx,
                metrics: Arc::new(EngineMetrics::new()),
                runtime,
            }),
        }
    }

    /// Start a new session.
    ///
    /// # Errors
    /// - [`StartError::AlreadyRunning`] if a session occupies the slot; the
    ///   running session is left untouched
    /// - [`StartError::InvalidRequest`] if the interval is zero or the repeat
    ///   count is zero; no session is created
    pub fn start(&self, request: ClickRequest) -> Result<SessionHandle, StartError> {
        let inner = &self.inner;
        let mut slot = inner.slot.lock();

        if let Some(active) = slot.as_ref() {
            tracing::warn!("Start rejected: session {} is still active", active.id);
            inner.metrics.record_start_rejected();
            return Err(StartError::AlreadyRunning);
        }

        if let Err(e) = request.validate() {
            tracing::warn!("Start rejected: {}", e);
            inner.metrics.record_start_rejected();
            return Err(e.into());
        }

        let id = inner.next_id.fetch_add(1, Ordering::Relaxed);
        let cancel = CancelSource::new();
        let (session, status_rx) = ClickSession::new(
            id,
            request.clone(),
            inner.backends.clone(),
            inner.double_click_gap,
            cancel.token(),
            Arc::clone(&inner.metrics),
        );
        *slot = Some(ActiveSession { id, cancel });
        drop(slot);

        inner.metrics.record_session_started();
        self.broadcast(SessionEvent::Started {
            id,
            request: request.clone(),
        });

        let (report_tx, report_rx) = watch::channel(None);
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        let events_tx = inner.events_tx.clone();
        let metrics = Arc::clone(&inner.metrics);

        inner.runtime.spawn(async move {
            let report = session.run().await;

            // Free the slot before announcing completion so listeners can restart
            if let Some(inner) = weak.upgrade() {
                inner.release(report.id);
            }

            metrics.record_session_completed(&report);
            report_tx.send_replace(Some(report.clone()));
            if events_tx.send(SessionEvent::Completed(report)).is_err() {
                metrics.record_broadcast_error();
            }
        });

        tracing::info!("Session {} launched", id);

        Ok(SessionHandle {
            id,
            request,
            status_rx,
            report_rx,
        })
    }

    /// Signal the active session to stop.
    ///
    /// Does not wait for the session to quiesce; use
    /// [`SessionHandle::wait`] or [`subscribe`](Self::subscribe) for that.
    ///
    /// # Errors
    /// [`StopError::NotRunning`] if no session is active or the active one has
    /// already been asked to stop.
    pub fn stop(&self) -> Result<(), StopError> {
        let slot = self.inner.slot.lock();
        match slot.as_ref() {
            Some(active) if active.cancel.cancel() => {
                tracing::info!("Stop requested for session {}", active.id);
                Ok(())
            }
            Some(active) => {
                tracing::debug!("Session {} is already stopping", active.id);
                Err(StopError::NotRunning)
            }
            None => {
                tracing::debug!("Stop requested with no active session");
                Err(StopError::NotRunning)
            }
        }
    }

    /// Whether a session currently occupies the slot (including one that is stopping)
    pub fn is_running(&self) -> bool {
        self.inner.slot.lock().is_some()
    }

    pub fn active_id(&self) -> Option<SessionId> {
        self.inner.slot.lock().as_ref().map(|active| active.id)
    }

    /// Subscribe to session events.
    ///
    /// Only events sent after subscribing are received.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events_tx.subscribe()
    }

    pub fn metrics(&self) -> Arc<EngineMetrics> {
        Arc::clone(&self.inner.metrics)
    }

    fn broadcast(&self, event: SessionEvent) {
        // No subscribers is fine; count it for diagnostics
        if self.inner.events_tx.send(event).is_err() {
            self.inner.metrics.record_broadcast_error();
        }
    }
}

/// Caller's view of one launched session
#[derive(Debug, Clone)]
pub struct SessionHandle {
    id: SessionId,
    request: ClickRequest,
    status_rx: watch::Receiver<SessionStatus>,
    report_rx: watch::Receiver<Option<SessionReport>>,
}

impl SessionHandle {
    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn request(&self) -> &ClickRequest {
        &self.request
    }

    /// Latest state and fire count published by the session loop
    pub fn status(&self) -> SessionStatus {
        *self.status_rx.borrow()
    }

    /// True once the session has completed and released the manager's slot
    pub fn is_finished(&self) -> bool {
        self.report_rx.borrow().is_some()
    }

    pub fn report(&self) -> Option<SessionReport> {
        self.report_rx.borrow().clone()
    }

    /// Wait for the session to complete.
    ///
    /// Returns `None` only if the session task was torn down without
    /// reporting, e.g. because its runtime shut down.
    pub async fn wait(&self) -> Option<SessionReport> {
        let mut rx = self.report_rx.clone();
        let report = match rx.wait_for(Option::is_some).await {
            Ok(report) => report.clone(),
            Err(_) => None,
        };
        report.or_else(|| rx.borrow().clone())
    }
}
