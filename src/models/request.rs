use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Absolute screen coordinate in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Parses `X,Y` as typed on the command line.
impl FromStr for Point {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (x, y) = s
            .split_once(',')
            .ok_or_else(|| format!("expected X,Y but got '{}'", s))?;
        let x = x
            .trim()
            .parse()
            .map_err(|e| format!("invalid X coordinate '{}': {}", x.trim(), e))?;
        let y = y
            .trim()
            .parse()
            .map_err(|e| format!("invalid Y coordinate '{}': {}", y.trim(), e))?;
        Ok(Self { x, y })
    }
}

/// Mouse button targeted by a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    #[default]
    Left,
    Right,
    Middle,
}

impl fmt::Display for MouseButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MouseButton::Left => f.write_str("left"),
            MouseButton::Right => f.write_str("right"),
            MouseButton::Middle => f.write_str("middle"),
        }
    }
}

impl FromStr for MouseButton {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" => Ok(MouseButton::Left),
            "right" => Ok(MouseButton::Right),
            "middle" => Ok(MouseButton::Middle),
            other => Err(format!("unknown mouse button '{}' (left, right, middle)", other)),
        }
    }
}

/// What one fire does: a single click or a pair counted as one unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClickType {
    #[default]
    Single,
    Double,
}

impl ClickType {
    /// Number of backend clicks issued per fire.
    pub fn clicks_per_fire(self) -> u64 {
        match self {
            ClickType::Single => 1,
            ClickType::Double => 2,
        }
    }
}

impl fmt::Display for ClickType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClickType::Single => f.write_str("single"),
            ClickType::Double => f.write_str("double"),
        }
    }
}

impl FromStr for ClickType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "single" => Ok(ClickType::Single),
            "double" => Ok(ClickType::Double),
            other => Err(format!("unknown click type '{}' (single, double)", other)),
        }
    }
}

/// Reasons a request is rejected before any session exists
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    #[error("Click interval must be greater than zero")]
    ZeroInterval,

    #[error("Repeat count must be at least 1 (omit it to repeat until stopped)")]
    ZeroRepeat,

    #[error("Click interval overflows a 64-bit millisecond count")]
    IntervalOverflow,
}

/// Parameters of one clicking session.
///
/// The presentation layer resolves its radio-button pairs into the two
/// optional fields before handing the request over:
/// - `position: None` clicks wherever the cursor currently is
/// - `repeat: None` keeps clicking until the session is stopped
///
/// A request is checked with [`validate`](Self::validate) when it is started;
/// [`ClickRequest::new`] runs the same check at construction time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClickRequest {
    pub position: Option<Point>,
    pub interval_millis: u64,
    pub repeat: Option<u64>,
    #[serde(default)]
    pub button: MouseButton,
    #[serde(default)]
    pub click_type: ClickType,
}

impl ClickRequest {
    /// Build a request, failing if it violates the interval or repeat invariants.
    pub fn new(
        position: Option<Point>,
        interval_millis: u64,
        repeat: Option<u64>,
        button: MouseButton,
        click_type: ClickType,
    ) -> Result<Self, RequestError> {
        let request = Self {
            position,
            interval_millis,
            repeat,
            button,
            click_type,
        };
        request.validate()?;
        Ok(request)
    }

    pub fn validate(&self) -> Result<(), RequestError> {
        if self.interval_millis == 0 {
            return Err(RequestError::ZeroInterval);
        }
        if self.repeat == Some(0) {
            return Err(RequestError::ZeroRepeat);
        }
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_millis)
    }

    /// True when the session stops on its own after `repeat` fires.
    pub fn is_bounded(&self) -> bool {
        self.repeat.is_some()
    }

    /// Whether `fired` fires satisfy the repeat bound.
    pub fn is_exhausted(&self, fired: u64) -> bool {
        matches!(self.repeat, Some(n) if fired >= n)
    }
}

impl fmt::Display for ClickRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} click every {}ms",
            self.button, self.click_type, self.interval_millis
        )?;
        match self.repeat {
            Some(n) => write!(f, ", {} time(s)", n)?,
            None => f.write_str(", until stopped")?,
        }
        match self.position {
            Some(p) => write!(f, ", at {}", p),
            None => f.write_str(", at current location"),
        }
    }
}

/// Sum an hours/minutes/seconds/milliseconds split into one millisecond count.
pub fn total_interval_millis(
    hours: u64,
    minutes: u64,
    seconds: u64,
    millis: u64,
) -> Result<u64, RequestError> {
    hours
        .checked_mul(3_600_000)
        .and_then(|total| total.checked_add(minutes.checked_mul(60_000)?))
        .and_then(|total| total.checked_add(seconds.checked_mul(1_000)?))
        .and_then(|total| total.checked_add(millis))
        .ok_or(RequestError::IntervalOverflow)
}
