//! Hardware backend over [`gilrs`].
//!
//! Exposes every gamepad `gilrs` knows about (evdev on Linux, XInput/WGI on
//! Windows, IOKit on macOS) as a [`NativeDevice`] with a fixed layout in gilrs'
//! unified naming, so channel indices mean the same thing on every controller.
//!
//! ## Axes (8)
//! `0` LeftStickX, `1` LeftStickY, `2` LeftZ, `3` RightStickX, `4` RightStickY,
//! `5` RightZ, `6` DPadX, `7` DPadY. Values in `[-1.0, 1.0]` as reported by gilrs.
//!
//! ## Buttons (19)
//! `0` South, `1` East, `2` North, `3` West, `4` C, `5` Z, `6` LeftTrigger,
//! `7` LeftTrigger2, `8` RightTrigger, `9` RightTrigger2, `10` Select, `11` Start,
//! `12` Mode, `13` LeftThumb, `14` RightThumb, `15` DPadUp, `16` DPadDown,
//! `17` DPadLeft, `18` DPadRight.
//!
//! Device ids are gilrs' [`GamepadId`]s. gilrs reuses an id when the same pad
//! reconnects, which matches the bridge's "stable id per connected session" model:
//! the old wrapper is destroyed on disconnect and a fresh one is created on reconnect.
//! Without a remove handler the old wrapper is never destroyed, but it goes stale
//! with its record and the cache replaces it on the next lookup.
//! Gamepads whose gilrs id does not fit a `u32` are logged and not exposed.

use super::{AxisCallback, Backend, ButtonCallback, Callbacks, DeviceCallback};
use crate::device::{DeviceRef, NativeDevice};
use crate::error::{BackendError, Result};
use ::gilrs::{Axis, Button, Event, EventType, GamepadId, Gilrs};
use std::rc::Rc;
use std::time::Instant;
use tracing::{debug, info, trace, warn};

const AXES: [Axis; 8] = [
    Axis::LeftStickX,
    Axis::LeftStickY,
    Axis::LeftZ,
    Axis::RightStickX,
    Axis::RightStickY,
    Axis::RightZ,
    Axis::DPadX,
    Axis::DPadY,
];

const BUTTONS: [Button; 19] = [
    Button::South,
    Button::East,
    Button::North,
    Button::West,
    Button::C,
    Button::Z,
    Button::LeftTrigger,
    Button::LeftTrigger2,
    Button::RightTrigger,
    Button::RightTrigger2,
    Button::Select,
    Button::Start,
    Button::Mode,
    Button::LeftThumb,
    Button::RightThumb,
    Button::DPadUp,
    Button::DPadDown,
    Button::DPadLeft,
    Button::DPadRight,
];

fn axis_index(axis: Axis) -> Option<u32> {
    AXES.iter().position(|&a| a == axis).map(|i| i as u32)
}

fn button_index(button: Button) -> Option<u32> {
    BUTTONS.iter().position(|&b| b == button).map(|i| i as u32)
}

fn device_id(id: GamepadId) -> Option<u32> {
    narrow_id(usize::from(id))
}

fn narrow_id(raw: usize) -> Option<u32> {
    u32::try_from(raw).ok()
}

#[derive(Default)]
pub struct GilrsBackend {
    gilrs: Option<Gilrs>,
    started: Option<Instant>,
    devices: Vec<(GamepadId, DeviceRef)>,
    callbacks: Callbacks,
}

impl GilrsBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, id: GamepadId) -> Option<usize> {
        self.devices.iter().position(|(known, _)| *known == id)
    }

    fn find(&self, id: GamepadId) -> Option<DeviceRef> {
        self.position(id).map(|pos| Rc::clone(&self.devices[pos].1))
    }

    fn attach(&mut self, id: GamepadId) -> Result<()> {
        if self.position(id).is_some() {
            return Ok(());
        }
        let Some(gilrs) = self.gilrs.as_ref() else {
            return Err(BackendError::NotInitialized.into());
        };
        let Some(pad) = gilrs.connected_gamepad(id) else {
            return Ok(());
        };
        let Some(device_id) = device_id(id) else {
            warn!(gamepad = ?id, name = pad.name(), "gamepad id does not fit a device id; ignoring it");
            return Ok(());
        };
        let device = Rc::new(NativeDevice::new(
            device_id,
            pad.name(),
            pad.vendor_id().unwrap_or(0),
            pad.product_id().unwrap_or(0),
            AXES.len(),
            BUTTONS.len(),
        ));
        info!(device_id = device.device_id(), name = pad.name(), "gamepad attached");
        self.devices.push((id, Rc::clone(&device)));
        self.callbacks.attach(&device)
    }

    fn remove(&mut self, id: GamepadId) -> Result<()> {
        let Some(pos) = self.position(id) else {
            return Ok(());
        };
        let (_, device) = self.devices.remove(pos);
        info!(device_id = device.device_id(), "gamepad removed");
        self.callbacks.remove(&device)
    }

    fn button_event(&mut self, id: GamepadId, button: Button, pressed: bool, at: f64) -> Result<()> {
        let (Some(device), Some(index)) = (self.find(id), button_index(button)) else {
            trace!(?button, "unmapped button ignored");
            return Ok(());
        };
        // gilrs can repeat an edge after a reconnect; only report real changes.
        match device.set_button(index as usize, pressed) {
            Some(previous) if previous != pressed => self.callbacks.button(&device, index, pressed, at),
            _ => Ok(()),
        }
    }

    fn elapsed(&self) -> f64 {
        self.started.map(|t| t.elapsed().as_secs_f64()).unwrap_or(0.0)
    }
}

impl Backend for GilrsBackend {
    fn init(&mut self) -> std::result::Result<(), BackendError> {
        if self.gilrs.is_some() {
            return Ok(());
        }
        let gilrs = match Gilrs::new() {
            Ok(gilrs) => gilrs,
            Err(::gilrs::Error::NotImplemented(dummy)) => {
                warn!("gilrs has no support for this platform; no gamepads will be reported");
                dummy
            }
            Err(e) => return Err(BackendError::Init(e.to_string())),
        };
        info!("gilrs backend initialized");
        self.gilrs = Some(gilrs);
        self.started = Some(Instant::now());
        Ok(())
    }

    fn shutdown(&mut self) {
        info!(devices = self.devices.len(), "gilrs backend shut down");
        self.devices.clear();
        self.gilrs = None;
        self.started = None;
    }

    fn num_devices(&self) -> usize {
        self.devices.len()
    }

    fn device_at_index(&self, index: usize) -> Option<DeviceRef> {
        self.devices.get(index).map(|(_, device)| Rc::clone(device))
    }

    fn detect_devices(&mut self) -> Result<()> {
        let Some(gilrs) = self.gilrs.as_ref() else {
            return Err(BackendError::NotInitialized.into());
        };
        let connected: Vec<GamepadId> = gilrs.gamepads().map(|(id, _)| id).collect();

        let gone: Vec<GamepadId> = self
            .devices
            .iter()
            .map(|(id, _)| *id)
            .filter(|id| !connected.contains(id))
            .collect();
        for id in gone {
            self.remove(id)?;
        }
        for id in connected {
            self.attach(id)?;
        }
        Ok(())
    }

    fn process_events(&mut self) -> Result<()> {
        loop {
            let Some(gilrs) = self.gilrs.as_mut() else {
                return Err(BackendError::NotInitialized.into());
            };
            let Some(Event { id, event, .. }) = gilrs.next_event() else {
                return Ok(());
            };
            let at = self.elapsed();

            match event {
                EventType::Connected => self.attach(id)?,
                EventType::Disconnected => self.remove(id)?,
                EventType::ButtonPressed(button, _) => self.button_event(id, button, true, at)?,
                EventType::ButtonReleased(button, _) => self.button_event(id, button, false, at)?,
                EventType::AxisChanged(axis, value, _) => {
                    let (Some(device), Some(index)) = (self.find(id), axis_index(axis)) else {
                        trace!(?axis, "unmapped axis ignored");
                        continue;
                    };
                    if let Some(last) = device.set_axis(index as usize, value) {
                        self.callbacks.axis(&device, index, value, last, at)?;
                    }
                }
                other => debug!(?other, "gilrs event ignored"),
            }
        }
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_indices_are_stable() {
        assert_eq!(axis_index(Axis::LeftStickX), Some(0));
        assert_eq!(axis_index(Axis::DPadY), Some(7));
        assert_eq!(button_index(Button::South), Some(0));
        assert_eq!(button_index(Button::DPadRight), Some(18));
        assert_eq!(button_index(Button::Unknown), None);
    }

    #[test]
    fn oversized_gamepad_ids_are_rejected() {
        assert_eq!(narrow_id(5), Some(5));
        assert_eq!(narrow_id(u32::MAX as usize), Some(u32::MAX));
        #[cfg(target_pointer_width = "64")]
        assert_eq!(narrow_id(u32::MAX as usize + 1), None);
    }

    #[test]
    fn polling_before_init_fails() {
        let mut backend = GilrsBackend::new();
        assert!(backend.process_events().is_err());
        assert!(backend.detect_devices().is_err());
    }
}
