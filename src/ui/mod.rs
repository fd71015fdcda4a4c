// UI module - console presentation layer
//
// This module contains:
// - ClickForm: The form fields (interval split, repeat policy, button, click type, position)
// - ConsoleController: Wires terminal input and session events to the SessionManager

pub mod controller;
pub mod form;

pub use controller::{ConsoleCommand, ConsoleController};
pub use form::ClickForm;
