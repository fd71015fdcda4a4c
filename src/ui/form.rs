// Click form - the fields the user fills in before pressing Start
//
// The form keeps the presentation shape (interval split into four fields,
// "repeat N times" vs "repeat until stopped", "current location" vs "pick
// location") and collapses it into a ClickRequest at the boundary.

use crate::models::{ClickRequest, ClickType, MouseButton, Point, RequestError, total_interval_millis};
use clap::Args;

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct ClickForm {
    /// Click interval: hours
    #[arg(long, default_value_t = 0)]
    pub hours: u64,

    /// Click interval: minutes
    #[arg(long, default_value_t = 0)]
    pub minutes: u64,

    /// Click interval: seconds
    #[arg(long, default_value_t = 0)]
    pub seconds: u64,

    /// Click interval: milliseconds
    #[arg(long, default_value_t = 100)]
    pub millis: u64,

    /// Repeat this many times (omit to repeat until stopped)
    #[arg(long, value_name = "N")]
    pub repeat: Option<u64>,

    /// Mouse button: left, right or middle
    #[arg(long, default_value = "left")]
    pub button: MouseButton,

    /// Click type: single or double
    #[arg(long = "click-type", default_value = "single")]
    pub click_type: ClickType,

    /// Click at this position (omit to click at the current location)
    #[arg(long, value_name = "X,Y", allow_hyphen_values = true)]
    pub at: Option<Point>,
}

impl Default for ClickForm {
    fn default() -> Self {
        Self {
            hours: 0,
            minutes: 0,
            seconds: 0,
            millis: 100,
            repeat: None,
            button: MouseButton::Left,
            click_type: ClickType::Single,
            at: None,
        }
    }
}

impl ClickForm {
    pub fn interval_millis(&self) -> Result<u64, RequestError> {
        total_interval_millis(self.hours, self.minutes, self.seconds, self.millis)
    }

    /// Build the request handed to the session manager.
    ///
    /// Only the interval sum can fail here; zero intervals and zero repeat
    /// counts are passed through and rejected by `start`.
    pub fn to_request(&self) -> Result<ClickRequest, RequestError> {
        Ok(ClickRequest {
            position: self.at,
            interval_millis: self.interval_millis()?,
            repeat: self.repeat,
            button: self.button,
            click_type: self.click_type,
        })
    }
}
