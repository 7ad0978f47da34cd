//! Event kinds and handler signatures.
//!
//! The bridge keeps at most one handler per [`EventKind`]. Handlers run
//! synchronously inside `detect_devices()` / `process_events()`, on the calling
//! thread, and their return value is only inspected for errors.
//!
//! ## Argument conventions
//! - **Button ids / axis ids:** device-local indices, matching
//!   [`Gamepad::button_state`](crate::gamepad::Gamepad::button_state) and
//!   [`Gamepad::axis_state`](crate::gamepad::Gamepad::axis_state).
//! - **Timestamps:** seconds as `f64`, measured by the backend (monotonic per backend).
//! - **Axis values:** the new value followed by the value it replaced.
//!
//! The remove handler receives `None` when the removed device was never handed
//! out (or the cache was cleared since).

use crate::error::HandlerError;
use crate::gamepad::Gamepad;
use std::fmt;

/// Return type of every handler.
pub type HandlerResult = Result<(), HandlerError>;

/// `(device)`
pub type AttachHandler = Box<dyn Fn(&Gamepad) -> HandlerResult>;

/// `(device or None)`
pub type RemoveHandler = Box<dyn Fn(Option<&Gamepad>) -> HandlerResult>;

/// `(device, button_id, timestamp)`
pub type ButtonHandler = Box<dyn Fn(&Gamepad, u32, f64) -> HandlerResult>;

/// `(device, axis_id, value, previous_value, timestamp)`
pub type AxisHandler = Box<dyn Fn(&Gamepad, u32, f32, f32, f64) -> HandlerResult>;

/// The five event kinds a backend can deliver.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A device was connected (or found by enumeration).
    Attach,
    /// A device was disconnected.
    Remove,
    ButtonDown,
    ButtonUp,
    /// An axis changed value.
    AxisMove,
}

impl EventKind {
    pub const ALL: [EventKind; 5] = [
        EventKind::Attach,
        EventKind::Remove,
        EventKind::ButtonDown,
        EventKind::ButtonUp,
        EventKind::AxisMove,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Attach => "attach",
            EventKind::Remove => "remove",
            EventKind::ButtonDown => "button-down",
            EventKind::ButtonUp => "button-up",
            EventKind::AxisMove => "axis-move",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
