//! Owned snapshots of device state.
//!
//! [`DeviceSnapshot`] is a serializable copy of everything a
//! [`Gamepad`](crate::gamepad::Gamepad) exposes, taken at one point in time.
//! [`Snapshot`] collects one per cached, live device and is produced by
//! [`Manager::snapshot`](crate::manager::Manager::snapshot).
//!
//! # Semantics
//! - Keys are device ids.
//! - A snapshot is immutable and does not poll. To refresh, call
//!   `process_events()` and take a new one.
//! - Unlike a `Gamepad`, a snapshot can be sent to other threads and persisted.
//!
//! # Example
//! ```no_run
//! use gamepad_bridge::{Manager, VirtualBackend};
//!
//! let mut mgr = Manager::new(VirtualBackend::new());
//! mgr.init().expect("init");
//! for (id, dev) in mgr.snapshot().iter() {
//!     println!("{id}: {} axes={:?}", dev.description, dev.axes);
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// State of one device at one point in time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeviceSnapshot {
    pub device_id: u32,
    pub description: String,
    pub vendor_id: u16,
    pub product_id: u16,
    pub axes: Vec<f32>,
    pub buttons: Vec<bool>,
}

impl DeviceSnapshot {
    /// Value of `axis`, `0.0` if the device has no such axis.
    pub fn axis(&self, axis: usize) -> f32 {
        self.axes.get(axis).copied().unwrap_or(0.0)
    }

    /// State of `button`, `false` if the device has no such button.
    pub fn button(&self, button: usize) -> bool {
        self.buttons.get(button).copied().unwrap_or(false)
    }
}

/// Snapshot of every cached device (`device_id → DeviceSnapshot`), ordered by id.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot(pub BTreeMap<u32, DeviceSnapshot>);

impl Snapshot {
    #[inline]
    pub fn get(&self, device_id: u32) -> Option<&DeviceSnapshot> {
        self.0.get(&device_id)
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&u32, &DeviceSnapshot)> {
        self.0.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consume the snapshot and return the inner map.
    #[inline]
    pub fn into_inner(self) -> BTreeMap<u32, DeviceSnapshot> {
        self.0
    }
}
