// Native input injection through enigo.
//
// enigo 0.1 does not report failures, so every call here succeeds once the
// handle exists. The handle is shared by both capabilities behind one mutex.

use crate::models::{MouseButton, Point};
use crate::services::backend::{ClickBackend, CursorBackend, InjectionError};
use enigo::MouseControllable;
use parking_lot::Mutex;
use std::time::Duration;

/// The pointer primitives the native backend is built from
pub trait PointerDevice: Send {
    fn move_to(&mut self, x: i32, y: i32);
    fn press(&mut self, button: MouseButton);
    fn release(&mut self, button: MouseButton);
    fn location(&self) -> (i32, i32);
}

impl PointerDevice for enigo::Enigo {
    fn move_to(&mut self, x: i32, y: i32) {
        self.mouse_move_to(x, y);
    }

    fn press(&mut self, button: MouseButton) {
        self.mouse_down(map_button(button));
    }

    fn release(&mut self, button: MouseButton) {
        self.mouse_up(map_button(button));
    }

    fn location(&self) -> (i32, i32) {
        self.mouse_location()
    }
}

fn map_button(button: MouseButton) -> enigo::MouseButton {
    match button {
        MouseButton::Left => enigo::MouseButton::Left,
        MouseButton::Right => enigo::MouseButton::Right,
        MouseButton::Middle => enigo::MouseButton::Middle,
    }
}

pub struct NativeBackend<D = enigo::Enigo> {
    device: Mutex<D>,
    hold: Duration,
}

impl NativeBackend {
    /// Create a backend that holds each button down for `hold` before releasing.
    pub fn new(hold: Duration) -> Self {
        Self::with_device(enigo::Enigo::new(), hold)
    }
}

impl<D: PointerDevice> NativeBackend<D> {
    pub fn with_device(device: D, hold: Duration) -> Self {
        Self {
            device: Mutex::new(device),
            hold,
        }
    }
}

impl<D: PointerDevice> ClickBackend for NativeBackend<D> {
    /// Move to `position`, press, hold, release.
    ///
    /// The move happens under the same lock as the press so the click lands
    /// on `position` even if the user moved the mouse since the last fire.
    fn click(&self, button: MouseButton, position: Point) -> Result<(), InjectionError> {
        let mut device = self.device.lock();
        device.move_to(position.x, position.y);
        device.press(button);
        if !self.hold.is_zero() {
            std::thread::sleep(self.hold);
        }
        device.release(button);
        tracing::trace!("Native {} click at {}", button, position);
        Ok(())
    }
}

impl<D: PointerDevice> CursorBackend for NativeBackend<D> {
    fn move_to(&self, position: Point) -> Result<(), InjectionError> {
        self.device.lock().move_to(position.x, position.y);
        Ok(())
    }

    fn current_position(&self) -> Point {
        let (x, y) = self.device.lock().location();
        Point::new(x, y)
    }
}
