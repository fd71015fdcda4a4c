// Console Controller - Bridges terminal input with the session manager
//
// This module contains the ConsoleController which coordinates between:
// - stdin (a reader thread turning lines into ConsoleCommands)
// - SessionManager (start/stop, session events)
// - Ctrl-C (stop and exit)
//
// The Enter key is the console stand-in for the global toggle hotkey.

use crate::models::{ClickRequest, SessionReport};
use crate::state::{SessionEvent, SessionHandle, SessionManager, StartError, StopError};
use anyhow::{Result, anyhow};
use std::io::BufRead;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc;

/// How long shutdown waits for the last click to finish
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// A line typed at the console prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleCommand {
    Toggle,
    Start,
    Stop,
    Status,
    Quit,
}

impl ConsoleCommand {
    pub fn parse(line: &str) -> Option<Self> {
        match line.trim().to_ascii_lowercase().as_str() {
            "" | "t" | "toggle" => Some(ConsoleCommand::Toggle),
            "s" | "start" => Some(ConsoleCommand::Start),
            "x" | "stop" => Some(ConsoleCommand::Stop),
            "?" | "status" => Some(ConsoleCommand::Status),
            "q" | "quit" | "exit" => Some(ConsoleCommand::Quit),
            _ => None,
        }
    }
}

/// Drives one configured request from the terminal.
///
/// The controller owns the request built from the form and replays it on
/// every start, so toggling behaves like pressing Start/Stop in the form.
pub struct ConsoleController {
    manager: SessionManager,
    request: ClickRequest,
    toggle_key: String,
    current: Option<SessionHandle>,
}

impl ConsoleController {
    pub fn new(manager: SessionManager, request: ClickRequest, toggle_key: impl Into<String>) -> Self {
        Self {
            manager,
            request,
            toggle_key: toggle_key.into(),
            current: None,
        }
    }

    pub fn current(&self) -> Option<&SessionHandle> {
        self.current.as_ref()
    }

    pub fn start(&mut self) -> Result<&SessionHandle, StartError> {
        let handle = self.manager.start(self.request.clone())?;
        Ok(self.current.insert(handle))
    }

    pub fn stop(&mut self) -> Result<(), StopError> {
        self.manager.stop()
    }

    /// Stop if a session is active, otherwise start one.
    ///
    /// The decision comes from `stop()` itself, so a session that completes
    /// just before the key press still leads to a fresh start.
    pub fn toggle(&mut self) -> Result<()> {
        match self.stop() {
            Ok(()) => Ok(()),
            // Slot still held means cancellation is already pending
            Err(StopError::NotRunning) if self.manager.is_running() => {
                tracing::debug!("Toggle ignored: session is already stopping");
                Ok(())
            }
            Err(StopError::NotRunning) => self.start().map(|_| ()).map_err(|e| anyhow!(e)),
        }
    }

    /// Apply one console command. Returns `false` when the controller should exit.
    pub fn apply(&mut self, command: ConsoleCommand) -> bool {
        let result = match command {
            ConsoleCommand::Toggle => self.toggle(),
            ConsoleCommand::Start => self.start().map(|_| ()).map_err(|e| anyhow!(e)),
            ConsoleCommand::Stop => self.stop().map_err(|e| anyhow!(e)),
            ConsoleCommand::Status => {
                self.print_status();
                Ok(())
            }
            ConsoleCommand::Quit => return false,
        };

        if let Err(e) = result {
            println!("  {}", e);
        }
        true
    }

    /// Run until the user quits, stdin closes with nothing running, or Ctrl-C.
    ///
    /// # Returns
    /// The report of the last session started by this controller, if any
    pub async fn run(mut self) -> Result<Option<SessionReport>> {
        let mut events = self.manager.subscribe();
        let mut commands = spawn_stdin_reader();

        println!("AutoClick: {}", self.request);
        println!(
            "Press Enter to toggle (stand-in for {}), '?' for status, 'q' to quit.",
            self.toggle_key
        );

        // A request the form produced but the engine rejects is fatal here
        if let Err(e) = self.start() {
            return Err(anyhow!(e));
        }

        let mut stdin_open = true;
        loop {
            tokio::select! {
                command = commands.recv(), if stdin_open => match command {
                    Some(command) => {
                        if !self.apply(command) {
                            break;
                        }
                    }
                    None => {
                        tracing::debug!("stdin closed");
                        stdin_open = false;
                        if !self.manager.is_running() {
                            break;
                        }
                    }
                },
                event = events.recv() => match event {
                    Ok(SessionEvent::Started { id, request }) => {
                        println!("▶ Session {} running: {}", id, request);
                    }
                    Ok(SessionEvent::Completed(report)) => {
                        println!("■ {}", report.summary());
                        if let Some(e) = report.error() {
                            println!("  Clicking stopped because input injection failed: {}", e);
                        }
                        if !stdin_open {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!("Console lagged behind session events - {} skipped", skipped);
                    }
                    Err(RecvError::Closed) => break,
                },
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Ctrl-C received");
                    break;
                }
            }
        }

        self.shutdown().await
    }

    /// Stop whatever is running and wait for the last session to report.
    pub async fn shutdown(&mut self) -> Result<Option<SessionReport>> {
        if self.manager.stop().is_ok() {
            tracing::info!("Stopping active session before exit");
        }

        let Some(handle) = self.current.take() else {
            return Ok(None);
        };

        match tokio::time::timeout(SHUTDOWN_TIMEOUT, handle.wait()).await {
            Ok(report) => Ok(report),
            Err(_) => {
                tracing::warn!(
                    "Session {} did not finish within {:?}",
                    handle.id(),
                    SHUTDOWN_TIMEOUT
                );
                Ok(handle.report())
            }
        }
    }

    fn print_status(&self) {
        match &self.current {
            Some(handle) => {
                let status = handle.status();
                println!(
                    "  Session {}: {} ({} fire(s))",
                    handle.id(),
                    status.state,
                    status.fired_count
                );
            }
            None => println!("  No session started yet"),
        }
    }
}

/// Read stdin lines on a plain thread and forward parsed commands.
///
/// The channel closes when stdin reaches EOF.
fn spawn_stdin_reader() -> mpsc::Receiver<ConsoleCommand> {
    let (tx, rx) = mpsc::channel(16);

    std::thread::spawn(move || {
        tracing::debug!("stdin reader thread started");
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            match ConsoleCommand::parse(&line) {
                Some(command) => {
                    if tx.blocking_send(command).is_err() {
                        break;
                    }
                }
                None => println!("  Unknown command '{}': Enter, s, x, ?, q", line.trim()),
            }
        }
        tracing::debug!("stdin reader thread finished");
    });

    rx
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ClickType, EngineSettings, MouseButton, SessionOutcome};
    use crate::services::{Backends, DryRunBackend};
    use std::sync::Arc;
    use tokio::runtime::Handle;

    fn controller(repeat: Option<u64>, interval_millis: u64) -> ConsoleController {
        let backend = Arc::new(DryRunBackend::new());
        let manager = SessionManager::new(
            Backends::shared(backend),
            &EngineSettings::default(),
            Handle::current(),
        );
        let request = ClickRequest::new(
            None,
            interval_millis,
            repeat,
            MouseButton::Left,
            ClickType::Single,
        )
        .unwrap();
        ConsoleController::new(manager, request, "F6")
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(ConsoleCommand::parse(""), Some(ConsoleCommand::Toggle));
        assert_eq!(ConsoleCommand::parse("  \n"), Some(ConsoleCommand::Toggle));
        assert_eq!(ConsoleCommand::parse("START"), Some(ConsoleCommand::Start));
        assert_eq!(ConsoleCommand::parse("x"), Some(ConsoleCommand::Stop));
        assert_eq!(ConsoleCommand::parse("?"), Some(ConsoleCommand::Status));
        assert_eq!(ConsoleCommand::parse("q"), Some(ConsoleCommand::Quit));
        assert_eq!(ConsoleCommand::parse("jump"), None);
    }

    #[tokio::test]
    async fn test_toggle_starts_then_stops() {
        let mut controller = controller(None, 5_000);

        controller.toggle().unwrap();
        let handle = controller.current().cloned().unwrap();
        assert!(controller.manager.is_running());

        controller.toggle().unwrap();
        let report = handle.wait().await.unwrap();
        assert_eq!(report.outcome, SessionOutcome::Stopped);
    }

    #[tokio::test]
    async fn test_toggle_after_natural_completion_starts_again() {
        let mut controller = controller(Some(1), 1);

        controller.toggle().unwrap();
        let first = controller.current().cloned().unwrap();
        first.wait().await.unwrap();
        assert!(!controller.manager.is_running());

        // The finished session must not swallow the key press
        controller.toggle().unwrap();
        let second = controller.current().cloned().unwrap();
        assert!(second.id() > first.id());
        assert_eq!(second.wait().await.unwrap().outcome, SessionOutcome::Finished);
    }

    #[tokio::test]
    async fn test_toggle_while_stopping_does_not_restart() {
        let mut controller = controller(None, 5_000);
        controller.start().unwrap();
        let handle = controller.current().cloned().unwrap();

        controller.manager.stop().unwrap();
        controller.toggle().unwrap();
        assert_eq!(controller.current().unwrap().id(), handle.id());

        handle.wait().await.unwrap();
        assert!(!controller.manager.is_running());
    }

    #[tokio::test]
    async fn test_apply_quit_returns_false() {
        let mut controller = controller(Some(1), 1);
        assert!(!controller.apply(ConsoleCommand::Quit));
        assert!(controller.apply(ConsoleCommand::Status));
    }

    #[tokio::test]
    async fn test_start_twice_is_rejected() {
        let mut controller = controller(None, 5_000);
        controller.start().unwrap();
        assert_eq!(controller.start().unwrap_err(), StartError::AlreadyRunning);

        let report = controller.shutdown().await.unwrap().unwrap();
        assert_eq!(report.outcome, SessionOutcome::Stopped);
    }

    #[tokio::test]
    async fn test_shutdown_without_session() {
        let mut controller = controller(Some(1), 1);
        assert_eq!(controller.shutdown().await.unwrap(), None);
    }
}
