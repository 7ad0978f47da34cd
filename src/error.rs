//! Error types.
//!
//! Errors are raised at the point of the offending call and propagate to the
//! immediate caller. Nothing in this crate retries.
//!
//! - [`Error::DeviceUnavailable`]: a [`Gamepad`](crate::gamepad::Gamepad) was used after
//!   its device was removed (or its backend allocation is gone).
//! - [`Error::IndexOutOfRange`]: an axis/button index outside `0..count`.
//! - [`Error::Backend`]: opaque backend failure, forwarded unchanged.
//! - [`Error::Handler`]: a registered handler returned an error during dispatch.

use crate::event::EventKind;
use std::fmt;

/// Boxed error returned by user handlers.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Crate-wide result alias.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Which channel table an index was checked against.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Channel {
    Axis,
    Button,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Axis => f.write_str("axis"),
            Channel::Button => f.write_str("button"),
        }
    }
}

/// Failures reported by a [`Backend`](crate::backends::Backend).
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// `detect_devices` / `process_events` called before `init`.
    #[error("backend is not initialized")]
    NotInitialized,

    /// The platform input layer could not be brought up.
    #[error("failed to initialize backend: {0}")]
    Init(String),

    /// Input was addressed to a device the backend does not know.
    #[error("unknown device id {0}")]
    UnknownDevice(u32),
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Accessor called on a removed device.
    #[error("cannot access removed device {device_id}")]
    DeviceUnavailable { device_id: u32 },

    #[error("{channel} index {index} is out of range (count {count})")]
    IndexOutOfRange {
        channel: Channel,
        index: i64,
        count: usize,
    },

    #[error(transparent)]
    Backend(#[from] BackendError),

    /// A registered handler failed. Cache updates made before the call stand.
    #[error("{kind} handler failed: {source}")]
    Handler {
        kind: EventKind,
        #[source]
        source: HandlerError,
    },

    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_value() {
        let err = Error::IndexOutOfRange {
            channel: Channel::Axis,
            index: -1,
            count: 4,
        };
        assert_eq!(err.to_string(), "axis index -1 is out of range (count 4)");

        let err = Error::DeviceUnavailable { device_id: 7 };
        assert_eq!(err.to_string(), "cannot access removed device 7");
    }

    #[test]
    fn handler_error_keeps_its_source() {
        use std::error::Error as _;

        let err = Error::Handler {
            kind: EventKind::ButtonDown,
            source: "boom".into(),
        };
        assert_eq!(err.to_string(), "button-down handler failed: boom");
        assert_eq!(err.source().map(|s| s.to_string()).as_deref(), Some("boom"));
    }
}
