//! Lifecycle controller.
//!
//! [`Manager`] is the host-facing façade: it owns a [`Backend`], the shared
//! [`EventBridge`] (cache + handlers), and the bridge [`Settings`]. Lifecycle calls
//! are forwarded to the backend; handler registration is recorded on the bridge
//! and mirrored onto the backend as trampolines.
//!
//! # Threading
//! `Manager`, [`Gamepad`] and the bridge are `!Send`. Everything runs on the thread
//! that owns the manager, and every callback fires synchronously inside
//! [`Manager::detect_devices`] or [`Manager::process_events`]. Device state tables
//! only change during those calls.
//!
//! # Example
//! ```
//! use gamepad_bridge::{Gamepad, Manager, VirtualBackend, VirtualDeviceSpec};
//!
//! let mut backend = VirtualBackend::new();
//! let pad_id = backend.plug(VirtualDeviceSpec::new("Virtual Pad", 4, 8));
//!
//! let mut mgr = Manager::new(backend);
//! mgr.set_button_down_func(Some(Box::new(|pad: &Gamepad, button: u32, at: f64| {
//!     println!("{} pressed {button} at {at:.3}s", pad.description()?);
//!     Ok(())
//! })));
//! mgr.init()?;
//! mgr.detect_devices()?;
//!
//! mgr.backend_mut().press_button(pad_id, 3);
//! mgr.process_events()?;
//!
//! let pad = mgr.device_at_index(0).expect("plugged");
//! assert!(pad.button_state(3)?);
//! # Ok::<(), gamepad_bridge::Error>(())
//! ```

use crate::backends::Backend;
use crate::config::Settings;
use crate::device::DeviceRef;
use crate::error::Result;
use crate::event::{AttachHandler, AxisHandler, ButtonHandler, EventKind, RemoveHandler};
use crate::eventbus::EventBridge;
use crate::gamepad::Gamepad;
use crate::snapshot::Snapshot;
use std::rc::Rc;
use tracing::{debug, info, warn};

pub struct Manager<B: Backend> {
    backend: B,
    bridge: Rc<EventBridge>,
    settings: Settings,
}

impl<B: Backend> Manager<B> {
    pub fn new(backend: B) -> Self {
        Self::with_settings(backend, Settings::default())
    }

    pub fn with_settings(backend: B, settings: Settings) -> Self {
        Self {
            backend,
            bridge: Rc::new(EventBridge::new()),
            settings,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Direct access to the backend, e.g. to feed a [`VirtualBackend`](crate::VirtualBackend).
    ///
    /// Changing callback registration through this reference bypasses the bridge.
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn init(&mut self) -> Result<()> {
        info!("initializing gamepad backend");
        self.backend.init()?;
        Ok(())
    }

    /// Shut the backend down.
    ///
    /// The device cache is kept unless [`Settings::release_on_shutdown`] is set, in
    /// which case every cached wrapper is invalidated and evicted first.
    pub fn shutdown(&mut self) {
        if self.settings.release_on_shutdown {
            self.bridge.release_all();
        }
        info!("shutting down gamepad backend");
        self.backend.shutdown();
    }

    pub fn num_devices(&self) -> usize {
        self.backend.num_devices()
    }

    /// Alias of [`Manager::num_devices`].
    pub fn count(&self) -> usize {
        self.num_devices()
    }

    /// Rescan for devices. Fires attach/remove handlers.
    pub fn detect_devices(&mut self) -> Result<()> {
        self.backend.detect_devices()
    }

    /// Poll the backend. This is where button, axis and remove handlers fire.
    pub fn process_events(&mut self) -> Result<()> {
        self.backend.process_events()
    }

    /// Alias of [`Manager::process_events`].
    pub fn poll_events(&mut self) -> Result<()> {
        self.process_events()
    }

    /// Wrapper for the device at enumeration position `index`.
    ///
    /// Repeated calls return the same wrapper until the device is removed.
    /// Negative or past-the-end positions yield `None`.
    pub fn device_at_index(&self, index: i64) -> Option<Gamepad> {
        let handle = usize::try_from(index)
            .ok()
            .and_then(|index| self.backend.device_at_index(index));
        self.bridge.cache_mut().resolve(handle.as_ref())
    }

    /// Forget every cached wrapper.
    ///
    /// Recovery primitive for when the cache and the backend disagree. Wrappers
    /// already handed out are not invalidated; later lookups build new ones.
    pub fn clear_device_cache(&mut self) {
        warn!("clearing gamepad device cache");
        self.bridge.cache_mut().clear_all();
    }

    /// Cached wrappers, in no particular order.
    pub fn cached_devices(&self) -> Vec<Gamepad> {
        self.bridge.cache().iter().map(|(_, pad)| pad.clone()).collect()
    }

    /// Serializable state of every cached, readable device.
    pub fn snapshot(&self) -> Snapshot {
        let cache = self.bridge.cache();
        Snapshot(
            cache
                .iter()
                .filter_map(|(id, pad)| pad.snapshot().ok().map(|snap| (id, snap)))
                .collect(),
        )
    }

    pub fn is_registered(&self, kind: EventKind) -> bool {
        self.bridge.is_registered(kind)
    }

    /// `Some(handler)` registers, `None` clears and stops delivery.
    pub fn set_device_attach_func(&mut self, handler: Option<AttachHandler>) {
        if self.bridge.set_attach_handler(handler) {
            let bridge = Rc::clone(&self.bridge);
            self.backend
                .set_device_attach_func(Some(Box::new(move |device: &DeviceRef| bridge.on_attach(device))));
        } else {
            self.backend.set_device_attach_func(None);
        }
        debug!(registered = self.is_registered(EventKind::Attach), "attach handler updated");
    }

    /// The handler receives `None` when the removed device was never looked up.
    pub fn set_device_remove_func(&mut self, handler: Option<RemoveHandler>) {
        if self.bridge.set_remove_handler(handler) {
            let bridge = Rc::clone(&self.bridge);
            self.backend
                .set_device_remove_func(Some(Box::new(move |device: &DeviceRef| bridge.on_remove(device))));
        } else {
            self.backend.set_device_remove_func(None);
        }
        debug!(registered = self.is_registered(EventKind::Remove), "remove handler updated");
    }

    pub fn set_button_down_func(&mut self, handler: Option<ButtonHandler>) {
        if self.bridge.set_button_down_handler(handler) {
            let bridge = Rc::clone(&self.bridge);
            self.backend.set_button_down_func(Some(Box::new(move |device: &DeviceRef, button: u32, at: f64| {
                bridge.on_button_down(device, button, at)
            })));
        } else {
            self.backend.set_button_down_func(None);
        }
        debug!(registered = self.is_registered(EventKind::ButtonDown), "button-down handler updated");
    }

    pub fn set_button_up_func(&mut self, handler: Option<ButtonHandler>) {
        if self.bridge.set_button_up_handler(handler) {
            let bridge = Rc::clone(&self.bridge);
            self.backend.set_button_up_func(Some(Box::new(move |device: &DeviceRef, button: u32, at: f64| {
                bridge.on_button_up(device, button, at)
            })));
        } else {
            self.backend.set_button_up_func(None);
        }
        debug!(registered = self.is_registered(EventKind::ButtonUp), "button-up handler updated");
    }

    pub fn set_axis_move_func(&mut self, handler: Option<AxisHandler>) {
        if self.bridge.set_axis_move_handler(handler) {
            let bridge = Rc::clone(&self.bridge);
            self.backend.set_axis_move_func(Some(Box::new(move |device: &DeviceRef, axis: u32, value: f32, last: f32, at: f64| {
                bridge.on_axis_move(device, axis, value, last, at)
            })));
        } else {
            self.backend.set_axis_move_func(None);
        }
        debug!(registered = self.is_registered(EventKind::AxisMove), "axis-move handler updated");
    }

    /// Clear the handler for `kind`; same as passing `None` to its setter.
    pub fn clear_handler(&mut self, kind: EventKind) {
        match kind {
            EventKind::Attach => self.set_device_attach_func(None),
            EventKind::Remove => self.set_device_remove_func(None),
            EventKind::ButtonDown => self.set_button_down_func(None),
            EventKind::ButtonUp => self.set_button_up_func(None),
            EventKind::AxisMove => self.set_axis_move_func(None),
        }
    }
}
