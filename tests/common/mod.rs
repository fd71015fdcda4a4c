//! Shared test backend for integration tests

#![allow(dead_code)]

use autoclick::models::{EngineSettings, MouseButton, Point};
use autoclick::{Backends, ClickBackend, CursorBackend, InjectionError, SessionManager};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tokio::runtime::Handle;

/// One backend invocation, in call order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    Click(MouseButton, Point),
    MoveTo(Point),
    CurrentPosition,
}

/// Records every call and optionally fails or slows down clicks.
pub struct RecordingBackend {
    calls: Mutex<Vec<(Call, Instant)>>,
    cursor: Mutex<Point>,
    click_delay: Duration,
    fail_on_click: Option<usize>,
    fail_move: bool,
    clicks: AtomicUsize,
    in_flight: AtomicBool,
    overlapped: AtomicBool,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            cursor: Mutex::new(Point::new(500, 400)),
            click_delay: Duration::ZERO,
            fail_on_click: None,
            fail_move: false,
            clicks: AtomicUsize::new(0),
            in_flight: AtomicBool::new(false),
            overlapped: AtomicBool::new(false),
        }
    }

    /// Each click blocks for `delay`
    pub fn with_click_delay(mut self, delay: Duration) -> Self {
        self.click_delay = delay;
        self
    }

    /// The nth click (1-based) returns a permission error
    pub fn failing_on_click(mut self, n: usize) -> Self {
        self.fail_on_click = Some(n);
        self
    }

    pub fn failing_moves(mut self) -> Self {
        self.fail_move = true;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().iter().map(|(call, _)| *call).collect()
    }

    pub fn click_times(&self) -> Vec<Instant> {
        self.calls
            .lock()
            .iter()
            .filter(|(call, _)| matches!(call, Call::Click(..)))
            .map(|(_, at)| *at)
            .collect()
    }

    pub fn click_count(&self) -> usize {
        self.clicks.load(Ordering::SeqCst)
    }

    pub fn move_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, Call::MoveTo(_)))
            .count()
    }

    /// Whether two calls were ever in flight at the same time
    pub fn saw_overlap(&self) -> bool {
        self.overlapped.load(Ordering::SeqCst)
    }

    pub fn set_cursor(&self, position: Point) {
        *self.cursor.lock() = position;
    }

    fn record(&self, call: Call) {
        self.calls.lock().push((call, Instant::now()));
    }

    fn enter(&self) {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            self.overlapped.store(true, Ordering::SeqCst);
        }
    }

    fn leave(&self) {
        self.in_flight.store(false, Ordering::SeqCst);
    }
}

impl ClickBackend for RecordingBackend {
    fn click(&self, button: MouseButton, position: Point) -> Result<(), InjectionError> {
        self.enter();
        let n = self.clicks.fetch_add(1, Ordering::SeqCst) + 1;
        self.record(Call::Click(button, position));
        if !self.click_delay.is_zero() {
            std::thread::sleep(self.click_delay);
        }
        self.leave();

        if self.fail_on_click == Some(n) {
            return Err(InjectionError::PermissionDenied(
                "input injection revoked".to_string(),
            ));
        }
        Ok(())
    }
}

impl CursorBackend for RecordingBackend {
    fn move_to(&self, position: Point) -> Result<(), InjectionError> {
        self.enter();
        self.record(Call::MoveTo(position));
        self.leave();

        if self.fail_move {
            return Err(InjectionError::Unavailable("no display".to_string()));
        }
        *self.cursor.lock() = position;
        Ok(())
    }

    fn current_position(&self) -> Point {
        self.record(Call::CurrentPosition);
        *self.cursor.lock()
    }
}

/// Manager on the current runtime with a 1ms double-click gap
pub fn manager_with(backend: Arc<RecordingBackend>) -> SessionManager {
    let settings = EngineSettings {
        double_click_gap_ms: 1,
        ..EngineSettings::default()
    };
    SessionManager::new(Backends::shared(backend), &settings, Handle::current())
}
