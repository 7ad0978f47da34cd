//! Backend-owned device records.
//!
//! A [`NativeDevice`] describes one physical controller as seen by a
//! [`Backend`](crate::backends::Backend): its id, a description, USB vendor/product
//! ids, and live axis/button state tables. Backends create these, keep the only
//! strong reference, and update the state tables in place while polling.
//!
//! Everything on the host side ([`Gamepad`](crate::gamepad::Gamepad), the
//! [`DeviceCache`](crate::cache::DeviceCache)) holds a `Weak` back-reference and never
//! frees a record. Once a backend drops its [`DeviceRef`], every wrapper that still
//! points at it reports [`Error::DeviceUnavailable`](crate::Error::DeviceUnavailable).

use std::cell::Cell;
use std::rc::Rc;

/// Shared handle to a backend-owned device record.
pub type DeviceRef = Rc<NativeDevice>;

/// One physical controller.
///
/// Axis values are typically normalized to `[-1.0, 1.0]`; buttons are plain
/// pressed/released booleans. The channel counts are fixed for the lifetime of the record.
#[derive(Debug)]
pub struct NativeDevice {
    device_id: u32,
    description: String,
    vendor_id: u16,
    product_id: u16,
    axis_states: Box<[Cell<f32>]>,
    button_states: Box<[Cell<bool>]>,
}

impl NativeDevice {
    /// Build a record with all axes at `0.0` and all buttons released.
    pub fn new(
        device_id: u32,
        description: impl Into<String>,
        vendor_id: u16,
        product_id: u16,
        num_axes: usize,
        num_buttons: usize,
    ) -> Self {
        Self {
            device_id,
            description: description.into(),
            vendor_id,
            product_id,
            axis_states: (0..num_axes).map(|_| Cell::new(0.0)).collect(),
            button_states: (0..num_buttons).map(|_| Cell::new(false)).collect(),
        }
    }

    pub fn device_id(&self) -> u32 {
        self.device_id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn vendor_id(&self) -> u16 {
        self.vendor_id
    }

    pub fn product_id(&self) -> u16 {
        self.product_id
    }

    pub fn num_axes(&self) -> usize {
        self.axis_states.len()
    }

    pub fn num_buttons(&self) -> usize {
        self.button_states.len()
    }

    /// Current value of `axis`, or `None` past the end of the table.
    #[inline]
    pub fn axis(&self, axis: usize) -> Option<f32> {
        self.axis_states.get(axis).map(Cell::get)
    }

    /// Current state of `button`, or `None` past the end of the table.
    #[inline]
    pub fn button(&self, button: usize) -> Option<bool> {
        self.button_states.get(button).map(Cell::get)
    }

    /// Copy of the axis table.
    pub fn axis_states(&self) -> Vec<f32> {
        self.axis_states.iter().map(Cell::get).collect()
    }

    /// Copy of the button table.
    pub fn button_states(&self) -> Vec<bool> {
        self.button_states.iter().map(Cell::get).collect()
    }

    /// Backend-side write. Returns the previous value, or `None` if `axis` is out of range.
    pub fn set_axis(&self, axis: usize, value: f32) -> Option<f32> {
        self.axis_states.get(axis).map(|cell| cell.replace(value))
    }

    /// Backend-side write. Returns the previous state, or `None` if `button` is out of range.
    pub fn set_button(&self, button: usize, pressed: bool) -> Option<bool> {
        self.button_states.get(button).map(|cell| cell.replace(pressed))
    }
}
