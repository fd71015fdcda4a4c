use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Engine and application settings loaded from `autoclick.yaml` and `AUTOCLICK_*` variables.
///
/// The double-click gap and button hold time depend on the desktop environment,
/// so they are configurable rather than fixed by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Pause between the two clicks of a double-click fire
    pub double_click_gap_ms: u64,

    /// How long the native backend holds a button down per click
    pub button_hold_ms: u64,

    /// Capacity of the session event broadcast channel
    pub event_buffer: usize,

    pub log_dir: String,
    pub debug_mode: bool,
    pub console_log: bool,

    /// Write the log file as JSON lines instead of text
    pub json_logs: bool,

    /// Label shown for the start/stop toggle
    pub toggle_key: String,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            double_click_gap_ms: default_double_click_gap_ms(),
            button_hold_ms: default_button_hold_ms(),
            event_buffer: 64,
            log_dir: "logs".to_string(),
            debug_mode: false,
            console_log: true,
            json_logs: false,
            toggle_key: "F6".to_string(),
        }
    }
}

impl EngineSettings {
    pub fn double_click_gap(&self) -> Duration {
        Duration::from_millis(self.double_click_gap_ms)
    }

    pub fn button_hold(&self) -> Duration {
        Duration::from_millis(self.button_hold_ms)
    }
}

fn default_double_click_gap_ms() -> u64 {
    50
}

fn default_button_hold_ms() -> u64 {
    30
}
