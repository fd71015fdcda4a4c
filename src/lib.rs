// AutoClick - Precise, cancellable automatic mouse clicker
//
// This is the library crate containing the click engine and its data structures.
// The binary crate (main.rs) provides the console entry point.

pub mod config;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod services;
pub mod state;
pub mod ui;

// Re-export commonly used types for convenience
pub use config::SettingsLoader;
pub use metrics::EngineMetrics;
pub use models::{ClickRequest, ClickType, EngineSettings, MouseButton, Point, SessionReport};
pub use services::{Backends, ClickBackend, CursorBackend, InjectionError};
pub use state::{SessionEvent, SessionHandle, SessionManager, StartError, StopError};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
