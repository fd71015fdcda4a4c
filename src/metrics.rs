// Engine metrics
//
// Lightweight counters shared by the session manager and its sessions

use crate::models::{SessionOutcome, SessionReport};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Engine-wide counters.
///
/// Uses atomic operations so sessions running on worker threads can record
/// without locks. Logged on shutdown for diagnostics.
#[derive(Debug)]
pub struct EngineMetrics {
    pub sessions_started: AtomicU64,
    pub sessions_finished: AtomicU64,
    pub sessions_stopped: AtomicU64,
    pub sessions_failed: AtomicU64,

    /// `start` calls rejected for any reason
    pub start_rejections: AtomicU64,

    /// Completed fires; a double-click counts once
    pub fires: AtomicU64,

    /// Individual backend click calls
    pub backend_clicks: AtomicU64,

    /// Total time spent in completed sessions, in milliseconds
    pub session_time_ms: AtomicU64,

    /// Session events that found no subscriber
    pub event_broadcast_errors: AtomicU64,

    start_time: Instant,
}

impl EngineMetrics {
    pub fn new() -> Self {
        Self {
            sessions_started: AtomicU64::new(0),
            sessions_finished: AtomicU64::new(0),
            sessions_stopped: AtomicU64::new(0),
            sessions_failed: AtomicU64::new(0),
            start_rejections: AtomicU64::new(0),
            fires: AtomicU64::new(0),
            backend_clicks: AtomicU64::new(0),
            session_time_ms: AtomicU64::new(0),
            event_broadcast_errors: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_session_started(&self) {
        self.sessions_started.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a completed session by outcome
    pub fn record_session_completed(&self, report: &SessionReport) {
        let counter = match report.outcome {
            SessionOutcome::Finished => &self.sessions_finished,
            SessionOutcome::Stopped => &self.sessions_stopped,
            SessionOutcome::Failed(_) => &self.sessions_failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        self.session_time_ms
            .fetch_add(report.elapsed.as_millis() as u64, Ordering::Relaxed);
    }

    pub fn record_start_rejected(&self) {
        self.start_rejections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fire(&self) {
        self.fires.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_backend_click(&self) {
        self.backend_clicks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_broadcast_error(&self) {
        self.event_broadcast_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn completed_sessions(&self) -> u64 {
        self.sessions_finished.load(Ordering::Relaxed)
            + self.sessions_stopped.load(Ordering::Relaxed)
            + self.sessions_failed.load(Ordering::Relaxed)
    }

    /// Average fires per completed session
    pub fn avg_fires_per_session(&self) -> f64 {
        let sessions = self.completed_sessions();
        if sessions > 0 {
            self.fires.load(Ordering::Relaxed) as f64 / sessions as f64
        } else {
            0.0
        }
    }

    pub fn log_summary(&self) {
        tracing::info!("=== Engine Metrics Summary ===");
        tracing::info!("Uptime: {:.2}s", self.uptime().as_secs_f64());
        tracing::info!(
            "Sessions: {} started, {} finished, {} stopped, {} failed, {} rejected starts",
            self.sessions_started.load(Ordering::Relaxed),
            self.sessions_finished.load(Ordering::Relaxed),
            self.sessions_stopped.load(Ordering::Relaxed),
            self.sessions_failed.load(Ordering::Relaxed),
            self.start_rejections.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Fires: {} ({} backend clicks, avg {:.1} per session), time clicking: {:.2}s",
            self.fires.load(Ordering::Relaxed),
            self.backend_clicks.load(Ordering::Relaxed),
            self.avg_fires_per_session(),
            self.session_time_ms.load(Ordering::Relaxed) as f64 / 1000.0
        );
        tracing::info!(
            "Undelivered session events: {}",
            self.event_broadcast_errors.load(Ordering::Relaxed)
        );
    }
}

impl Default for EngineMetrics {
    fn default() -> Self {
        Self::new()
    }
}
