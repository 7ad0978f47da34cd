//! In-process virtual backend.
//!
//! [`VirtualBackend`] behaves like a hardware backend but takes its devices and
//! input from the host: plug a device in, queue button/axis changes, and the
//! backend replays them through the usual callbacks on the next poll. Useful for
//! tests, demos, and headless hosts that synthesize input.
//!
//! # Timing
//! - `plug` takes effect on the next `detect_devices()` (attach fires then).
//! - `unplug` takes effect on the next `detect_devices()` or `process_events()`.
//! - Queued input is applied, in order, by `process_events()`. Timestamps are
//!   seconds since `init()`.
//!
//! Button edges that do not change the button's state, and channels past the end
//! of a device's tables, are dropped with a warning.
//!
//! # Fixtures
//! ```
//! use gamepad_bridge::VirtualBackend;
//!
//! let backend = VirtualBackend::from_toml_str(r#"
//!     [[device]]
//!     description = "Virtual Pad"
//!     vendor_id = 0x045e
//!     product_id = 0x028e
//!     num_axes = 6
//!     num_buttons = 10
//! "#).expect("fixture");
//! assert_eq!(backend.pending_devices(), 1);
//! ```

use super::{AxisCallback, Backend, ButtonCallback, Callbacks, DeviceCallback};
use crate::device::{DeviceRef, NativeDevice};
use crate::error::{BackendError, Result};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Description of a device to plug into a [`VirtualBackend`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VirtualDeviceSpec {
    pub description: String,
    #[serde(default)]
    pub vendor_id: u16,
    #[serde(default)]
    pub product_id: u16,
    pub num_axes: usize,
    pub num_buttons: usize,
}

impl VirtualDeviceSpec {
    pub fn new(description: impl Into<String>, num_axes: usize, num_buttons: usize) -> Self {
        Self {
            description: description.into(),
            vendor_id: 0,
            product_id: 0,
            num_axes,
            num_buttons,
        }
    }

    pub fn with_ids(mut self, vendor_id: u16, product_id: u16) -> Self {
        self.vendor_id = vendor_id;
        self.product_id = product_id;
        self
    }
}

#[derive(Deserialize)]
struct Fixture {
    #[serde(default, rename = "device")]
    devices: Vec<VirtualDeviceSpec>,
}

#[derive(Clone, Copy, Debug)]
enum Input {
    Button { device_id: u32, button: u32, pressed: bool },
    Axis { device_id: u32, axis: u32, value: f32 },
}

impl Input {
    fn device_id(&self) -> u32 {
        match *self {
            Input::Button { device_id, .. } | Input::Axis { device_id, .. } => device_id,
        }
    }
}

pub struct VirtualBackend {
    started: Option<Instant>,
    next_id: u32,
    devices: Vec<DeviceRef>,
    plugged: Vec<DeviceRef>,
    unplugged: Vec<u32>,
    queue: VecDeque<Input>,
    callbacks: Callbacks,
}

impl Default for VirtualBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl VirtualBackend {
    pub fn new() -> Self {
        Self {
            started: None,
            next_id: 0,
            devices: Vec::new(),
            plugged: Vec::new(),
            unplugged: Vec::new(),
            queue: VecDeque::new(),
            callbacks: Callbacks::default(),
        }
    }

    /// Build a backend with every `[[device]]` of a TOML fixture plugged in.
    pub fn from_toml_str(fixture: &str) -> Result<Self> {
        let fixture: Fixture = toml::from_str(fixture)?;
        let mut backend = Self::new();
        for spec in fixture.devices {
            backend.plug(spec);
        }
        Ok(backend)
    }

    /// Stage a new device. Returns the id it will be reported under.
    pub fn plug(&mut self, spec: VirtualDeviceSpec) -> u32 {
        let device_id = self.next_id;
        self.next_id += 1;
        debug!(device_id, description = %spec.description, "virtual device plugged");
        self.plugged.push(Rc::new(NativeDevice::new(
            device_id,
            spec.description,
            spec.vendor_id,
            spec.product_id,
            spec.num_axes,
            spec.num_buttons,
        )));
        device_id
    }

    /// Stage removal of a device.
    pub fn unplug(&mut self, device_id: u32) -> std::result::Result<(), BackendError> {
        if let Some(pos) = self.plugged.iter().position(|d| d.device_id() == device_id) {
            // Never attached: vanish silently.
            self.plugged.remove(pos);
            return Ok(());
        }
        if !self.devices.iter().any(|d| d.device_id() == device_id) {
            return Err(BackendError::UnknownDevice(device_id));
        }
        if !self.unplugged.contains(&device_id) {
            self.unplugged.push(device_id);
        }
        Ok(())
    }

    pub fn press_button(&mut self, device_id: u32, button: u32) {
        self.queue.push_back(Input::Button { device_id, button, pressed: true });
    }

    pub fn release_button(&mut self, device_id: u32, button: u32) {
        self.queue.push_back(Input::Button { device_id, button, pressed: false });
    }

    pub fn move_axis(&mut self, device_id: u32, axis: u32, value: f32) {
        self.queue.push_back(Input::Axis { device_id, axis, value });
    }

    /// Devices staged by `plug` that have not been detected yet.
    pub fn pending_devices(&self) -> usize {
        self.plugged.len()
    }

    /// Input events not yet delivered.
    pub fn pending_input(&self) -> usize {
        self.queue.len()
    }

    fn ensure_init(&self) -> std::result::Result<Instant, BackendError> {
        self.started.ok_or(BackendError::NotInitialized)
    }

    fn apply_removals(&mut self) -> Result<()> {
        while let Some(&device_id) = self.unplugged.first() {
            let Some(pos) = self.devices.iter().position(|d| d.device_id() == device_id) else {
                self.unplugged.remove(0);
                continue;
            };
            // Callback first; the record is dropped only after it returns.
            let device = Rc::clone(&self.devices[pos]);
            self.unplugged.remove(0);
            self.devices.remove(pos);
            self.queue.retain(|input| input.device_id() != device_id);
            debug!(device_id, "virtual device removed");
            self.callbacks.remove(&device)?;
        }
        Ok(())
    }

    fn apply_attaches(&mut self) -> Result<()> {
        while !self.plugged.is_empty() {
            let device = self.plugged.remove(0);
            self.devices.push(Rc::clone(&device));
            debug!(device_id = device.device_id(), "virtual device attached");
            self.callbacks.attach(&device)?;
        }
        Ok(())
    }

    fn find(&self, device_id: u32) -> Option<DeviceRef> {
        self.devices.iter().find(|d| d.device_id() == device_id).cloned()
    }
}

impl Backend for VirtualBackend {
    fn init(&mut self) -> std::result::Result<(), BackendError> {
        if self.started.is_none() {
            info!("virtual backend initialized");
            self.started = Some(Instant::now());
        }
        Ok(())
    }

    fn shutdown(&mut self) {
        info!(devices = self.devices.len(), "virtual backend shut down");
        self.started = None;
        self.devices.clear();
        self.unplugged.clear();
        self.queue.clear();
    }

    fn num_devices(&self) -> usize {
        self.devices.len()
    }

    fn device_at_index(&self, index: usize) -> Option<DeviceRef> {
        self.devices.get(index).cloned()
    }

    fn detect_devices(&mut self) -> Result<()> {
        self.ensure_init()?;
        self.apply_removals()?;
        self.apply_attaches()
    }

    fn process_events(&mut self) -> Result<()> {
        let started = self.ensure_init()?;
        self.apply_removals()?;

        while let Some(input) = self.queue.pop_front() {
            let Some(device) = self.find(input.device_id()) else {
                warn!(device_id = input.device_id(), "input for unknown virtual device dropped");
                continue;
            };
            let at = started.elapsed().as_secs_f64();

            match input {
                Input::Button { button, pressed, .. } => match device.set_button(button as usize, pressed) {
                    Some(previous) if previous != pressed => {
                        self.callbacks.button(&device, button, pressed, at)?;
                    }
                    Some(_) => {}
                    None => warn!(device_id = device.device_id(), button, "button out of range"),
                },
                Input::Axis { axis, value, .. } => match device.set_axis(axis as usize, value) {
                    Some(previous) => self.callbacks.axis(&device, axis, value, previous, at)?,
                    None => warn!(device_id = device.device_id(), axis, "axis out of range"),
                },
            }
        }
        Ok(())
    }

    fn set_device_attach_func(&mut self, callback: Option<DeviceCallback>) {
        self.callbacks.attach = callback;
    }

    fn set_device_remove_func(&mut self, callback: Option<DeviceCallback>) {
        self.callbacks.remove = callback;
    }

    fn set_button_down_func(&mut self, callback: Option<ButtonCallback>) {
        self.callbacks.button_down = callback;
    }

    fn set_button_up_func(&mut self, callback: Option<ButtonCallback>) {
        self.callbacks.button_up = callback;
    }

    fn set_axis_move_func(&mut self, callback: Option<AxisCallback>) {
        self.callbacks.axis_move = callback;
    }
}
