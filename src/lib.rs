//! gamepad-bridge: identity-caching event bridge for poll-based gamepad backends.
//!
//! A [`Backend`] enumerates controllers, polls them, and reports attach / remove /
//! button / axis events through raw callbacks. This crate sits between that
//! backend and host code:
//!
//! - every physical device is represented by exactly one live [`Gamepad`] at a time
//!   ([`DeviceCache`]);
//! - wrappers never own backend memory and fail with [`Error::DeviceUnavailable`]
//!   once their device is removed;
//! - each event kind has at most one handler, registered and cleared through
//!   [`Manager`];
//! - the [`Manager`] forwards `init` / `shutdown` / `detect_devices` /
//!   `process_events` to the backend.
//!
//! Backends: [`VirtualBackend`] (always available) and `backends::gilrs::GilrsBackend`
//! (feature `gilrs`).

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod backends;
pub mod cache;
pub mod config;
pub mod device;
pub mod error;
pub mod event;
pub mod eventbus;
pub mod gamepad;
pub mod manager;
pub mod snapshot;

pub use backends::virtual_input::{VirtualBackend, VirtualDeviceSpec};
pub use backends::Backend;
pub use cache::DeviceCache;
pub use config::Settings;
pub use device::{DeviceRef, NativeDevice};
pub use error::{BackendError, Channel, Error, HandlerError, Result};
pub use event::*;
pub use eventbus::{EventBridge, HandlerRegistry};
pub use gamepad::Gamepad;
pub use manager::Manager;
pub use snapshot::{DeviceSnapshot, Snapshot};
