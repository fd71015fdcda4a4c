//! Data models for the AutoClick engine.
//!
//! - [`ClickRequest`]: Parameters of one clicking session (interval, repeat policy,
//!   button, click type, optional target position)
//! - [`SessionState`] / [`SessionStatus`]: Lifecycle of a running session
//! - [`SessionReport`] / [`SessionOutcome`]: What a completed session reports back
//! - [`EngineSettings`]: Environment-specific timing and application settings
//!
//! # Architecture Note
//!
//! Requests are plain data: the presentation layer fills one in and the
//! [`SessionManager`](crate::state::SessionManager) validates it on `start`.
//! Nothing in here knows how clicks are injected.

pub mod request;
pub mod session;
pub mod settings;

pub use request::{
    ClickRequest, ClickType, MouseButton, Point, RequestError, total_interval_millis,
};
pub use session::{SessionId, SessionOutcome, SessionReport, SessionState, SessionStatus};
pub use settings::EngineSettings;
