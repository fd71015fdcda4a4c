use std::time::Duration;
use tokio::sync::watch;

/// Sending half of a session's cancellation signal.
///
/// Dropping the source also cancels every token, so a session cannot outlive
/// whoever started it.
#[derive(Debug)]
pub struct CancelSource {
    tx: watch::Sender<bool>,
}

impl CancelSource {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    pub fn token(&self) -> CancelToken {
        CancelToken {
            rx: self.tx.subscribe(),
        }
    }

    /// Request cancellation. Returns `false` if it had already been requested.
    pub fn cancel(&self) -> bool {
        self.tx.send_if_modified(|cancelled| {
            if *cancelled {
                false
            } else {
                *cancelled = true;
                true
            }
        })
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }
}

impl Default for CancelSource {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving half of the cancellation signal, observed by the session loop
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow() || self.rx.has_changed().is_err()
    }

    /// Resolves once cancellation is requested or the source is dropped.
    pub async fn cancelled(&mut self) {
        // An Err means the source is gone, which counts as cancellation
        let _ = self.rx.wait_for(|cancelled| *cancelled).await;
    }
}

/// Result of one interval wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// The full interval elapsed; the next fire is due
    Elapsed,
    /// Cancellation arrived before or during the wait
    Cancelled,
}

/// Produces fire times spaced `interval` apart, measured from the end of the
/// previous fire.
///
/// The timer is re-armed on every [`wait_next`](Self::wait_next) call, so a
/// slow backend stretches the cadence instead of queueing clicks. The wait
/// races the cancellation token and returns as soon as either side resolves.
#[derive(Debug)]
pub struct IntervalScheduler {
    interval: Duration,
    cancel: CancelToken,
    waits: u64,
}

impl IntervalScheduler {
    pub fn new(interval: Duration, cancel: CancelToken) -> Self {
        Self {
            interval,
            cancel,
            waits: 0,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Number of waits that ran to completion
    pub fn completed_waits(&self) -> u64 {
        self.waits
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub async fn wait_next(&mut self) -> Tick {
        if self.cancel.is_cancelled() {
            return Tick::Cancelled;
        }

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Tick::Cancelled,
            _ = tokio::time::sleep(self.interval) => {
                self.waits += 1;
                Tick::Elapsed
            }
        }
    }
}
