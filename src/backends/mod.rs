//! Input backends for `gamepad-bridge`.
//!
//! A [`Backend`] is the native side of the bridge: it enumerates devices, polls
//! its platform source, owns the [`NativeDevice`](crate::device::NativeDevice)
//! records, and calls back into the bridge when something happens.
//!
//! # Contract
//! - Callbacks fire synchronously from inside `detect_devices()` /
//!   `process_events()`, on the calling thread.
//! - Each registration point takes `Some(callback)` to enable delivery or `None`
//!   to stop it. A backend never calls a callback that was unset.
//! - The remove callback runs while the backend still holds its [`DeviceRef`];
//!   the backend drops the record afterwards.
//! - If a callback returns `Err`, the backend stops the current poll and returns
//!   that error unchanged. Work not yet performed stays pending for the next call.
//!
//! # Feature flags
//! - **`gilrs`**: enables [`gilrs::GilrsBackend`] over the `gilrs` crate.
//!
//! [`virtual_input::VirtualBackend`] is always available.

use crate::device::DeviceRef;
use crate::error::{BackendError, Result};

#[cfg(feature = "gilrs")]
#[cfg_attr(docsrs, doc(cfg(feature = "gilrs")))]
pub mod gilrs;
pub mod virtual_input;

/// `(device)`: attach and remove.
pub type DeviceCallback = Box<dyn FnMut(&DeviceRef) -> Result<()>>;

/// `(device, button_id, timestamp)`
pub type ButtonCallback = Box<dyn FnMut(&DeviceRef, u32, f64) -> Result<()>>;

/// `(device, axis_id, value, previous_value, timestamp)`
pub type AxisCallback = Box<dyn FnMut(&DeviceRef, u32, f32, f32, f64) -> Result<()>>;

/// The native gamepad layer the bridge drives.
pub trait Backend {
    /// Bring the platform source up. Calling it again is harmless.
    fn init(&mut self) -> std::result::Result<(), BackendError>;

    /// Tear the platform source down and release every device record.
    fn shutdown(&mut self);

    /// Number of devices currently enumerated.
    fn num_devices(&self) -> usize;

    /// Device at enumeration position `index` (not id), if any.
    fn device_at_index(&self, index: usize) -> Option<DeviceRef>;

    /// Rescan for connected/disconnected devices; fires attach/remove.
    fn detect_devices(&mut self) -> Result<()>;

    /// Poll input; fires button/axis callbacks and removal of vanished devices.
    fn process_events(&mut self) -> Result<()>;

    fn set_device_attach_func(&mut self, callback: Option<DeviceCallback>);
    fn set_device_remove_func(&mut self, callback: Option<DeviceCallback>);
    fn set_button_down_func(&mut self, callback: Option<ButtonCallback>);
    fn set_button_up_func(&mut self, callback: Option<ButtonCallback>);
    fn set_axis_move_func(&mut self, callback: Option<AxisCallback>);
}

/// Callback slots shared by the bundled backends.
#[derive(Default)]
pub(crate) struct Callbacks {
    pub attach: Option<DeviceCallback>,
    pub remove: Option<DeviceCallback>,
    pub button_down: Option<ButtonCallback>,
    pub button_up: Option<ButtonCallback>,
    pub axis_move: Option<AxisCallback>,
}

impl Callbacks {
    pub fn attach(&mut self, device: &DeviceRef) -> Result<()> {
        match self.attach.as_mut() {
            Some(cb) => cb(device),
            None => Ok(()),
        }
    }

    pub fn remove(&mut self, device: &DeviceRef) -> Result<()> {
        match self.remove.as_mut() {
            Some(cb) => cb(device),
            None => Ok(()),
        }
    }

    pub fn button(&mut self, device: &DeviceRef, button: u32, pressed: bool, at: f64) -> Result<()> {
        let slot = if pressed {
            self.button_down.as_mut()
        } else {
            self.button_up.as_mut()
        };
        match slot {
            Some(cb) => cb(device, button, at),
            None => Ok(()),
        }
    }

    pub fn axis(&mut self, device: &DeviceRef, axis: u32, value: f32, last: f32, at: f64) -> Result<()> {
        match self.axis_move.as_mut() {
            Some(cb) => cb(device, axis, value, last, at),
            None => Ok(()),
        }
    }
}
