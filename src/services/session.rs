use crate::metrics::EngineMetrics;
use crate::models::{
    ClickRequest, Point, SessionId, SessionOutcome, SessionReport, SessionState, SessionStatus,
};
use crate::services::backend::{ClickBackend, CursorBackend, InjectionError};
use crate::services::scheduler::{CancelToken, IntervalScheduler, Tick};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;

/// The pair of injected capabilities a session drives
#[derive(Clone)]
pub struct Backends {
    pub click: Arc<dyn ClickBackend>,
    pub cursor: Arc<dyn CursorBackend>,
}

impl Backends {
    pub fn new(click: Arc<dyn ClickBackend>, cursor: Arc<dyn CursorBackend>) -> Self {
        Self { click, cursor }
    }

    /// Use one object for both capabilities.
    pub fn shared<B>(backend: Arc<B>) -> Self
    where
        B: ClickBackend + CursorBackend + 'static,
    {
        Self {
            click: backend.clone(),
            cursor: backend,
        }
    }
}

/// One run of the click engine, from start to `Completed`.
///
/// The session owns its request and counters; the only thing shared with the
/// outside is the cancellation token (read-only here) and the status channel
/// (write-only here). Each loop iteration:
///
/// 1. Checks for cancellation
/// 2. Fires: one backend click, or two separated by the double-click gap
/// 3. Stops if the repeat bound is reached
/// 4. Waits one interval, racing cancellation
///
/// Backend calls run on the blocking pool and are always awaited to
/// completion, so a stop never interrupts a click halfway.
pub struct ClickSession {
    id: SessionId,
    request: ClickRequest,
    backends: Backends,
    double_click_gap: Duration,
    scheduler: IntervalScheduler,
    metrics: Arc<EngineMetrics>,
    status_tx: watch::Sender<SessionStatus>,
    state: SessionState,
    fired_count: u64,
}

impl ClickSession {
    pub fn new(
        id: SessionId,
        request: ClickRequest,
        backends: Backends,
        double_click_gap: Duration,
        cancel: CancelToken,
        metrics: Arc<EngineMetrics>,
    ) -> (Self, watch::Receiver<SessionStatus>) {
        let (status_tx, status_rx) = watch::channel(SessionStatus::default());
        let scheduler = IntervalScheduler::new(request.interval(), cancel);

        let session = Self {
            id,
            request,
            backends,
            double_click_gap,
            scheduler,
            metrics,
            status_tx,
            state: SessionState::Idle,
            fired_count: 0,
        };

        (session, status_rx)
    }

    /// Drive the session until it completes and return its report.
    pub async fn run(mut self) -> SessionReport {
        let started = Instant::now();
        tracing::info!("Session {} starting: {}", self.id, self.request);

        if self.scheduler.is_cancelled() {
            tracing::info!("Session {} cancelled before the first fire", self.id);
            return self.finish(SessionOutcome::Stopped, started);
        }

        if let Some(target) = self.request.position {
            self.transition(SessionState::Positioning);
            tracing::debug!("Session {} moving cursor to {}", self.id, target);

            if let Err(e) = self.move_cursor(target).await {
                tracing::error!("Session {} failed to position cursor: {}", self.id, e);
                return self.finish(SessionOutcome::Failed(e), started);
            }
        }

        self.transition(SessionState::Running);

        loop {
            if self.scheduler.is_cancelled() {
                return self.stop(started);
            }

            match self.fire().await {
                Ok(at) => {
                    self.fired_count += 1;
                    self.metrics.record_fire();
                    self.publish();
                    tracing::debug!(
                        "Session {} fire #{} at {}",
                        self.id,
                        self.fired_count,
                        at
                    );
                }
                Err(e) => {
                    tracing::error!(
                        "Session {} click failed after {} fire(s): {}",
                        self.id,
                        self.fired_count,
                        e
                    );
                    return self.finish(SessionOutcome::Failed(e), started);
                }
            }

            if self.request.is_exhausted(self.fired_count) {
                return self.finish(SessionOutcome::Finished, started);
            }

            match self.scheduler.wait_next().await {
                Tick::Elapsed => {}
                Tick::Cancelled => return self.stop(started),
            }
        }
    }

    async fn move_cursor(&self, target: Point) -> Result<(), InjectionError> {
        let cursor = Arc::clone(&self.backends.cursor);
        tokio::task::spawn_blocking(move || cursor.move_to(target))
            .await
            .unwrap_or_else(|e| Err(InjectionError::BackendPanicked(format!("cursor move: {}", e))))
    }

    /// Perform one fire and return where it clicked.
    async fn fire(&self) -> Result<Point, InjectionError> {
        let click = Arc::clone(&self.backends.click);
        let cursor = Arc::clone(&self.backends.cursor);
        let target = self.request.position;
        let button = self.request.button;
        let clicks = self.request.click_type.clicks_per_fire();
        let gap = self.double_click_gap;
        let metrics = Arc::clone(&self.metrics);

        tokio::task::spawn_blocking(move || {
            let at = target.unwrap_or_else(|| cursor.current_position());
            for n in 0..clicks {
                if n > 0 && !gap.is_zero() {
                    std::thread::sleep(gap);
                }
                click.click(button, at)?;
                metrics.record_backend_click();
            }
            Ok(at)
        })
        .await
        .unwrap_or_else(|e| Err(InjectionError::BackendPanicked(format!("click: {}", e))))
    }

    fn stop(&mut self, started: Instant) -> SessionReport {
        self.transition(SessionState::Stopping);
        tracing::info!(
            "Session {} stopping after {} fire(s)",
            self.id,
            self.fired_count
        );
        self.finish(SessionOutcome::Stopped, started)
    }

    fn finish(&mut self, outcome: SessionOutcome, started: Instant) -> SessionReport {
        self.transition(SessionState::Completed);

        let report = SessionReport {
            id: self.id,
            fired_count: self.fired_count,
            outcome,
            elapsed: started.elapsed(),
        };

        tracing::info!("{}", report.summary());
        report
    }

    fn transition(&mut self, next: SessionState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "invalid session transition {} -> {}",
            self.state,
            next
        );
        tracing::trace!("Session {} {} -> {}", self.id, self.state, next);
        self.state = next;
        self.publish();
    }

    fn publish(&self) {
        self.status_tx.send_replace(SessionStatus {
            state: self.state,
            fired_count: self.fired_count,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ClickType, MouseButton};
    use crate::services::backend::{MockClickBackend, MockCursorBackend};
    use crate::services::scheduler::CancelSource;
    use mockall::Sequence;
    use mockall::predicate::eq;

    fn request(position: Option<Point>, repeat: Option<u64>, click_type: ClickType) -> ClickRequest {
        ClickRequest::new(position, 1, repeat, MouseButton::Left, click_type).unwrap()
    }

    fn session(
        req: ClickRequest,
        click: MockClickBackend,
        cursor: MockCursorBackend,
        source: &CancelSource,
    ) -> (ClickSession, watch::Receiver<SessionStatus>) {
        ClickSession::new(
            7,
            req,
            Backends::new(Arc::new(click), Arc::new(cursor)),
            Duration::ZERO,
            source.token(),
            Arc::new(EngineMetrics::new()),
        )
    }

    #[tokio::test]
    async fn test_bounded_session_fires_exactly_n() {
        let mut click = MockClickBackend::new();
        click.expect_click().times(4).returning(|_, _| Ok(()));
        let mut cursor = MockCursorBackend::new();
        cursor
            .expect_current_position()
            .times(4)
            .return_const(Point::new(1, 1));

        let source = CancelSource::new();
        let (session, status) =
            session(request(None, Some(4), ClickType::Single), click, cursor, &source);

        let report = session.run().await;
        assert_eq!(report.id, 7);
        assert_eq!(report.fired_count, 4);
        assert_eq!(report.outcome, SessionOutcome::Finished);
        assert_eq!(
            *status.borrow(),
            SessionStatus {
                state: SessionState::Completed,
                fired_count: 4
            }
        );
    }

    #[tokio::test]
    async fn test_double_click_counts_as_one_fire() {
        let mut click = MockClickBackend::new();
        click
            .expect_click()
            .with(eq(MouseButton::Left), eq(Point::new(9, 9)))
            .times(6)
            .returning(|_, _| Ok(()));
        let mut cursor = MockCursorBackend::new();
        cursor.expect_move_to().times(1).returning(|_| Ok(()));

        let source = CancelSource::new();
        let (session, _status) = session(
            request(Some(Point::new(9, 9)), Some(3), ClickType::Double),
            click,
            cursor,
            &source,
        );

        let report = session.run().await;
        assert_eq!(report.fired_count, 3);
    }

    #[tokio::test]
    async fn test_position_moves_cursor_once_before_first_click() {
        let mut seq = Sequence::new();
        let mut cursor = MockCursorBackend::new();
        let mut click = MockClickBackend::new();

        cursor
            .expect_move_to()
            .with(eq(Point::new(40, 50)))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        click
            .expect_click()
            .times(2)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        cursor.expect_current_position().never();

        let source = CancelSource::new();
        let (session, _status) = session(
            request(Some(Point::new(40, 50)), Some(2), ClickType::Single),
            click,
            cursor,
            &source,
        );

        assert_eq!(session.run().await.fired_count, 2);
    }

    #[tokio::test]
    async fn test_click_failure_completes_without_retry() {
        let mut click = MockClickBackend::new();
        let mut calls = 0;
        click.expect_click().times(2).returning(move |_, _| {
            calls += 1;
            if calls == 2 {
                Err(InjectionError::PermissionDenied("revoked".to_string()))
            } else {
                Ok(())
            }
        });
        let mut cursor = MockCursorBackend::new();
        cursor
            .expect_current_position()
            .return_const(Point::new(0, 0));

        let source = CancelSource::new();
        let (session, status) = session(request(None, None, ClickType::Single), click, cursor, &source);

        let report = session.run().await;
        assert_eq!(report.fired_count, 1);
        assert_eq!(
            report.outcome,
            SessionOutcome::Failed(InjectionError::PermissionDenied("revoked".to_string()))
        );
        assert_eq!(status.borrow().state, SessionState::Completed);
    }

    #[tokio::test]
    async fn test_double_click_second_half_failure_is_not_counted() {
        let mut click = MockClickBackend::new();
        let mut calls = 0;
        click.expect_click().times(2).returning(move |_, _| {
            calls += 1;
            if calls == 2 {
                Err(InjectionError::PermissionDenied("revoked".to_string()))
            } else {
                Ok(())
            }
        });
        let mut cursor = MockCursorBackend::new();
        cursor
            .expect_current_position()
            .times(1)
            .return_const(Point::new(3, 3));

        let metrics = Arc::new(EngineMetrics::new());
        let source = CancelSource::new();
        let (session, _status) = ClickSession::new(
            7,
            request(None, Some(3), ClickType::Double),
            Backends::new(Arc::new(click), Arc::new(cursor)),
            Duration::ZERO,
            source.token(),
            Arc::clone(&metrics),
        );

        let report = session.run().await;
        assert_eq!(report.fired_count, 0);
        assert!(matches!(
            report.outcome,
            SessionOutcome::Failed(InjectionError::PermissionDenied(_))
        ));
        // Only the click the backend accepted is recorded
        assert_eq!(
            metrics
                .backend_clicks
                .load(std::sync::atomic::Ordering::Relaxed),
            1
        );
        assert_eq!(metrics.fires.load(std::sync::atomic::Ordering::Relaxed), 0);
    }

    #[tokio::test]
    async fn test_move_failure_skips_clicks() {
        let mut click = MockClickBackend::new();
        click.expect_click().never();
        let mut cursor = MockCursorBackend::new();
        cursor
            .expect_move_to()
            .times(1)
            .returning(|_| Err(InjectionError::Unavailable("no display".to_string())));

        let source = CancelSource::new();
        let (session, _status) = session(
            request(Some(Point::new(1, 2)), Some(5), ClickType::Single),
            click,
            cursor,
            &source,
        );

        let report = session.run().await;
        assert_eq!(report.fired_count, 0);
        assert!(!report.is_success());
    }

    #[tokio::test]
    async fn test_cancelled_before_start_never_touches_backends() {
        let mut click = MockClickBackend::new();
        click.expect_click().never();
        let mut cursor = MockCursorBackend::new();
        cursor.expect_move_to().never();
        cursor.expect_current_position().never();

        let source = CancelSource::new();
        source.cancel();
        let (session, _status) = session(
            request(Some(Point::new(1, 2)), None, ClickType::Single),
            click,
            cursor,
            &source,
        );

        let report = session.run().await;
        assert_eq!(report.outcome, SessionOutcome::Stopped);
        assert_eq!(report.fired_count, 0);
    }

    struct PanickingBackend;

    impl ClickBackend for PanickingBackend {
        fn click(&self, _button: MouseButton, _position: Point) -> Result<(), InjectionError> {
            panic!("driver crashed")
        }
    }

    #[tokio::test]
    async fn test_panicking_backend_is_reported() {
        let mut cursor = MockCursorBackend::new();
        cursor
            .expect_current_position()
            .return_const(Point::new(0, 0));

        let source = CancelSource::new();
        let (session, _status) = ClickSession::new(
            1,
            request(None, None, ClickType::Single),
            Backends::new(Arc::new(PanickingBackend), Arc::new(cursor)),
            Duration::ZERO,
            source.token(),
            Arc::new(EngineMetrics::new()),
        );

        let report = session.run().await;
        assert_eq!(report.fired_count, 0);
        assert!(matches!(
            report.outcome,
            SessionOutcome::Failed(InjectionError::BackendPanicked(_))
        ));
    }
}
