use crate::models::{MouseButton, Point};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

/// Failure reported by the platform while injecting input
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InjectionError {
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Input injection unavailable: {0}")]
    Unavailable(String),

    #[error("Platform error: {0}")]
    Platform(String),

    #[error("Backend panicked during {0}")]
    BackendPanicked(String),
}

/// Performs one press-and-release of a mouse button.
///
/// Implementations block until the click is fully applied. The engine never
/// calls a backend concurrently with itself, and a double-click is issued as
/// two calls by the engine.
#[cfg_attr(test, mockall::automock)]
pub trait ClickBackend: Send + Sync {
    fn click(&self, button: MouseButton, position: Point) -> Result<(), InjectionError>;
}

/// Moves and reads the pointer.
#[cfg_attr(test, mockall::automock)]
pub trait CursorBackend: Send + Sync {
    fn move_to(&self, position: Point) -> Result<(), InjectionError>;

    fn current_position(&self) -> Point;
}

/// Backend that injects nothing and logs what it would have done.
///
/// Keeps a virtual cursor so `current_position` reflects earlier `move_to`
/// calls.
#[derive(Debug, Default)]
pub struct DryRunBackend {
    cursor: Mutex<Point>,
    clicks: AtomicU64,
}

impl DryRunBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(position: Point) -> Self {
        Self {
            cursor: Mutex::new(position),
            clicks: AtomicU64::new(0),
        }
    }

    /// Total clicks received so far
    pub fn clicks(&self) -> u64 {
        self.clicks.load(Ordering::Relaxed)
    }
}

impl ClickBackend for DryRunBackend {
    fn click(&self, button: MouseButton, position: Point) -> Result<(), InjectionError> {
        let n = self.clicks.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::debug!("[dry-run] click #{} {} at {}", n, button, position);
        Ok(())
    }
}

impl CursorBackend for DryRunBackend {
    fn move_to(&self, position: Point) -> Result<(), InjectionError> {
        tracing::debug!("[dry-run] move cursor to {}", position);
        *self.cursor.lock() = position;
        Ok(())
    }

    fn current_position(&self) -> Point {
        *self.cursor.lock()
    }
}
