//! Event dispatch bridge.
//!
//! [`EventBridge`] sits between a [`Backend`](crate::backends::Backend)'s raw
//! callbacks and the host's handlers. It owns the [`DeviceCache`] and the
//! [`HandlerRegistry`], and exposes one trampoline per event kind that:
//!
//! 1. resolves (or, on remove, evicts) the [`Gamepad`] for the reported device,
//! 2. releases its own borrows,
//! 3. calls the registered handler with the rebuilt arguments.
//!
//! Each kind is an independent two-state machine: `Unregistered` until a handler
//! is set, `Registered(handler)` until it is cleared.
//!
//! ## Remove ordering
//! The remove trampoline evicts first, runs the handler while the wrapper is still
//! live (so the handler can inspect the device one last time), and only then marks
//! the wrapper destroyed. The wrapper is destroyed even when the handler fails.

use crate::cache::DeviceCache;
use crate::device::DeviceRef;
use crate::error::{Error, HandlerError, Result};
use crate::event::{AttachHandler, AxisHandler, ButtonHandler, EventKind, HandlerResult, RemoveHandler};
use crate::gamepad::Gamepad;
use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;
use tracing::{debug, trace};

/// One optional handler per event kind.
///
/// Handlers are stored behind `Rc` so the bridge can clone one out and drop the
/// registry borrow before calling it.
#[derive(Default)]
pub struct HandlerRegistry {
    attach: Option<Rc<dyn Fn(&Gamepad) -> HandlerResult>>,
    remove: Option<Rc<dyn Fn(Option<&Gamepad>) -> HandlerResult>>,
    button_down: Option<Rc<dyn Fn(&Gamepad, u32, f64) -> HandlerResult>>,
    button_up: Option<Rc<dyn Fn(&Gamepad, u32, f64) -> HandlerResult>>,
    axis_move: Option<Rc<dyn Fn(&Gamepad, u32, f32, f32, f64) -> HandlerResult>>,
}

impl HandlerRegistry {
    pub fn is_registered(&self, kind: EventKind) -> bool {
        match kind {
            EventKind::Attach => self.attach.is_some(),
            EventKind::Remove => self.remove.is_some(),
            EventKind::ButtonDown => self.button_down.is_some(),
            EventKind::ButtonUp => self.button_up.is_some(),
            EventKind::AxisMove => self.axis_move.is_some(),
        }
    }
}

/// Cache + handler registry + trampolines. Shared with backend callbacks through `Rc`.
#[derive(Default)]
pub struct EventBridge {
    cache: RefCell<DeviceCache>,
    handlers: RefCell<HandlerRegistry>,
}

fn handler_failed(kind: EventKind) -> impl FnOnce(HandlerError) -> Error {
    move |source| Error::Handler { kind, source }
}

impl EventBridge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cache(&self) -> Ref<'_, DeviceCache> {
        self.cache.borrow()
    }

    pub fn cache_mut(&self) -> RefMut<'_, DeviceCache> {
        self.cache.borrow_mut()
    }

    pub fn is_registered(&self, kind: EventKind) -> bool {
        self.handlers.borrow().is_registered(kind)
    }

    /// Returns `true` when a handler is now registered for the kind.
    pub fn set_attach_handler(&self, handler: Option<AttachHandler>) -> bool {
        let mut handlers = self.handlers.borrow_mut();
        handlers.attach = handler.map(Rc::from);
        handlers.attach.is_some()
    }

    pub fn set_remove_handler(&self, handler: Option<RemoveHandler>) -> bool {
        let mut handlers = self.handlers.borrow_mut();
        handlers.remove = handler.map(Rc::from);
        handlers.remove.is_some()
    }

    pub fn set_button_down_handler(&self, handler: Option<ButtonHandler>) -> bool {
        let mut handlers = self.handlers.borrow_mut();
        handlers.button_down = handler.map(Rc::from);
        handlers.button_down.is_some()
    }

    pub fn set_button_up_handler(&self, handler: Option<ButtonHandler>) -> bool {
        let mut handlers = self.handlers.borrow_mut();
        handlers.button_up = handler.map(Rc::from);
        handlers.button_up.is_some()
    }

    pub fn set_axis_move_handler(&self, handler: Option<AxisHandler>) -> bool {
        let mut handlers = self.handlers.borrow_mut();
        handlers.axis_move = handler.map(Rc::from);
        handlers.axis_move.is_some()
    }

    /// Wrapper for `device`, created and cached on first sight.
    pub fn resolve(&self, device: &DeviceRef) -> Gamepad {
        let mut cache = self.cache.borrow_mut();
        match cache.resolve(Some(device)) {
            Some(pad) => pad,
            // `resolve` only declines absent handles.
            None => Gamepad::new(device),
        }
    }

    pub fn on_attach(&self, device: &DeviceRef) -> Result<()> {
        let Some(handler) = self.handlers.borrow().attach.clone() else {
            return Ok(());
        };
        let pad = self.resolve(device);
        debug!(device_id = pad.id(), "dispatching attach");
        handler(&pad).map_err(handler_failed(EventKind::Attach))
    }

    pub fn on_remove(&self, device: &DeviceRef) -> Result<()> {
        let evicted = self.cache.borrow_mut().evict(device.device_id());
        let handler = self.handlers.borrow().remove.clone();
        debug!(
            device_id = device.device_id(),
            cached = evicted.is_some(),
            "dispatching remove"
        );

        let result = match handler {
            Some(handler) => handler(evicted.as_ref()),
            None => Ok(()),
        };
        if let Some(pad) = &evicted {
            pad.mark_destroyed();
        }
        result.map_err(handler_failed(EventKind::Remove))
    }

    pub fn on_button_down(&self, device: &DeviceRef, button: u32, at: f64) -> Result<()> {
        let Some(handler) = self.handlers.borrow().button_down.clone() else {
            return Ok(());
        };
        let pad = self.resolve(device);
        trace!(device_id = pad.id(), button, at, "dispatching button-down");
        handler(&pad, button, at).map_err(handler_failed(EventKind::ButtonDown))
    }

    pub fn on_button_up(&self, device: &DeviceRef, button: u32, at: f64) -> Result<()> {
        let Some(handler) = self.handlers.borrow().button_up.clone() else {
            return Ok(());
        };
        let pad = self.resolve(device);
        trace!(device_id = pad.id(), button, at, "dispatching button-up");
        handler(&pad, button, at).map_err(handler_failed(EventKind::ButtonUp))
    }

    pub fn on_axis_move(&self, device: &DeviceRef, axis: u32, value: f32, last: f32, at: f64) -> Result<()> {
        let Some(handler) = self.handlers.borrow().axis_move.clone() else {
            return Ok(());
        };
        let pad = self.resolve(device);
        trace!(device_id = pad.id(), axis, value, last, at, "dispatching axis-move");
        handler(&pad, axis, value, last, at).map_err(handler_failed(EventKind::AxisMove))
    }

    /// Invalidate and evict every cached wrapper. Used when the host asks for a
    /// full release on shutdown.
    pub fn release_all(&self) {
        let released: Vec<Gamepad> = self.cache.borrow_mut().drain().collect();
        debug!(count = released.len(), "releasing cached devices");
        for pad in released {
            pad.mark_destroyed();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::NativeDevice;
    use std::cell::{Cell, RefCell};

    fn device(id: u32) -> DeviceRef {
        Rc::new(NativeDevice::new(id, "Pad", 0, 0, 4, 4))
    }

    #[test]
    fn unregistered_dispatch_is_a_no_op() {
        let bridge = EventBridge::new();
        let dev = device(1);
        bridge.on_attach(&dev).unwrap();
        bridge.on_button_down(&dev, 0, 0.0).unwrap();
        bridge.on_axis_move(&dev, 0, 0.5, 0.0, 0.0).unwrap();
        assert!(bridge.cache().is_empty());
    }

    #[test]
    fn attach_resolves_then_calls_handler() {
        let bridge = EventBridge::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        bridge.set_attach_handler(Some(Box::new(move |pad: &Gamepad| {
            sink.borrow_mut().push(pad.clone());
            Ok(())
        })));

        let dev = device(3);
        bridge.on_attach(&dev).unwrap();
        bridge.on_attach(&dev).unwrap();

        let seen = seen.borrow();
        assert_eq!(seen.len(), 2);
        assert!(Gamepad::ptr_eq(&seen[0], &seen[1]));
        assert!(Gamepad::ptr_eq(&seen[0], bridge.cache().get(3).unwrap()));
    }

    #[test]
    fn remove_handler_sees_live_device_then_it_is_destroyed() {
        let bridge = EventBridge::new();
        let dev = device(7);
        let pad = bridge.resolve(&dev);

        let readable = Rc::new(Cell::new(false));
        let flag = Rc::clone(&readable);
        bridge.set_remove_handler(Some(Box::new(move |pad: Option<&Gamepad>| {
            flag.set(pad.map(|p| p.axis_state(0).is_ok()).unwrap_or(false));
            Ok(())
        })));

        bridge.on_remove(&dev).unwrap();
        assert!(readable.get());
        assert!(pad.is_destroyed());
        assert!(matches!(pad.axis_state(0), Err(Error::DeviceUnavailable { device_id: 7 })));
        assert!(bridge.cache().get(7).is_none());
    }

    #[test]
    fn remove_of_uncached_device_passes_none() {
        let bridge = EventBridge::new();
        let got_none = Rc::new(Cell::new(false));
        let flag = Rc::clone(&got_none);
        bridge.set_remove_handler(Some(Box::new(move |pad: Option<&Gamepad>| {
            flag.set(pad.is_none());
            Ok(())
        })));

        bridge.on_remove(&device(9)).unwrap();
        assert!(got_none.get());
    }

    #[test]
    fn failing_remove_handler_still_destroys() {
        let bridge = EventBridge::new();
        let dev = device(2);
        let pad = bridge.resolve(&dev);
        bridge.set_remove_handler(Some(Box::new(|_: Option<&Gamepad>| Err("handler blew up".into()))));

        let err = bridge.on_remove(&dev).unwrap_err();
        assert!(matches!(err, Error::Handler { kind: EventKind::Remove, .. }));
        assert!(pad.is_destroyed());
        assert!(bridge.cache().is_empty());
    }

    #[test]
    fn handler_error_keeps_cache_entry() {
        let bridge = EventBridge::new();
        bridge.set_button_down_handler(Some(Box::new(|_: &Gamepad, _: u32, _: f64| {
            Err("nope".into())
        })));

        let err = bridge.on_button_down(&device(4), 1, 0.25).unwrap_err();
        assert!(matches!(err, Error::Handler { kind: EventKind::ButtonDown, .. }));
        assert!(bridge.cache().get(4).is_some());
    }

    #[test]
    fn clearing_a_handler_stops_dispatch() {
        let bridge = EventBridge::new();
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let registered = bridge.set_button_up_handler(Some(Box::new(move |_: &Gamepad, _: u32, _: f64| {
            counter.set(counter.get() + 1);
            Ok(())
        })));
        assert!(registered);

        let dev = device(1);
        bridge.on_button_up(&dev, 0, 0.0).unwrap();
        assert!(!bridge.set_button_up_handler(None));
        bridge.on_button_up(&dev, 0, 0.0).unwrap();

        assert_eq!(calls.get(), 1);
        assert!(!bridge.is_registered(EventKind::ButtonUp));
    }

    #[test]
    fn axis_handler_gets_value_and_previous() {
        let bridge = EventBridge::new();
        let got = Rc::new(Cell::new((0u32, 0.0f32, 0.0f32, 0.0f64)));
        let sink = Rc::clone(&got);
        bridge.set_axis_move_handler(Some(Box::new(
            move |_: &Gamepad, axis: u32, value: f32, last: f32, at: f64| {
                sink.set((axis, value, last, at));
                Ok(())
            },
        )));

        bridge.on_axis_move(&device(1), 2, 0.5, -0.5, 1.5).unwrap();
        assert_eq!(got.get(), (2, 0.5, -0.5, 1.5));
    }

    #[test]
    fn release_all_destroys_everything_cached() {
        let bridge = EventBridge::new();
        let (a, b) = (device(1), device(2));
        let pa = bridge.resolve(&a);
        let pb = bridge.resolve(&b);

        bridge.release_all();
        assert!(pa.is_destroyed() && pb.is_destroyed());
        assert!(bridge.cache().is_empty());
    }
}
