//! Services module - The click execution engine.
//!
//! Everything here is independent of the presentation layer: it takes a
//! validated [`ClickRequest`](crate::models::ClickRequest) and a pair of injected
//! capabilities and turns them into a timed, cancellable stream of clicks.
//!
//! # Components
//!
//! - [`ClickBackend`] / [`CursorBackend`]: Capabilities supplied by the
//!   environment. The engine only needs "click button B at P", "move to P" and
//!   "where is the cursor".
//! - [`IntervalScheduler`]: Waits one interval at a time, measured from the end
//!   of the previous fire, and returns early when cancellation arrives.
//! - [`ClickSession`]: The state machine for one run
//!   (`Idle → Positioning → Running → Stopping → Completed`).
//! - [`DryRunBackend`]: Logs instead of injecting; always available.
//! - `NativeBackend` (feature `native`): Real input injection through `enigo`.
//!
//! # Concurrency
//!
//! A session runs as one tokio task. Backend calls are blocking and go to the
//! blocking pool, but the session awaits each one before doing anything else,
//! so there is never more than one call in flight per session. The only
//! suspension point while idle is [`IntervalScheduler::wait_next`].

pub mod backend;
#[cfg(feature = "native")]
pub mod native;
pub mod scheduler;
pub mod session;

pub use backend::{ClickBackend, CursorBackend, DryRunBackend, InjectionError};
#[cfg(feature = "native")]
pub use native::{NativeBackend, PointerDevice};
pub use scheduler::{CancelSource, CancelToken, IntervalScheduler, Tick};
pub use session::{Backends, ClickSession};
