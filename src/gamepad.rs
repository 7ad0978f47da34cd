//! Host-facing device wrapper.
//!
//! A [`Gamepad`] is what handlers and callers hold. It is a tagged, non-owning
//! handle: `{ weak reference to the backend record, destroyed flag }`. The raw
//! record is never exposed; every accessor goes through the liveness check.
//!
//! # Liveness
//! - `destroyed` flips `false → true` exactly once, while the remove event for
//!   the device is being dispatched, after the remove handler has returned.
//! - After that every accessor fails with [`Error::DeviceUnavailable`].
//! - If the backend has already dropped the record (for example the wrapper was
//!   orphaned by [`DeviceCache::clear_all`](crate::cache::DeviceCache::clear_all)),
//!   accessors fail the same way instead of reading stale data.
//!
//! # Identity
//! Clones share state: destroying one destroys all. Use [`Gamepad::ptr_eq`] to
//! check whether two handles are the same wrapper.

use crate::device::{DeviceRef, NativeDevice};
use crate::error::{Channel, Error, Result};
use crate::snapshot::DeviceSnapshot;
use std::cell::Cell;
use std::fmt;
use std::rc::{Rc, Weak};

struct Inner {
    id: u32,
    handle: Weak<NativeDevice>,
    destroyed: Cell<bool>,
}

/// Wrapper over one backend device.
///
/// Not `Send`: all access happens on the thread that drives the backend.
#[derive(Clone)]
pub struct Gamepad {
    inner: Rc<Inner>,
}

impl Gamepad {
    /// Bind a fresh, live wrapper to `handle`.
    pub(crate) fn new(handle: &DeviceRef) -> Self {
        Self {
            inner: Rc::new(Inner {
                id: handle.device_id(),
                handle: Rc::downgrade(handle),
                destroyed: Cell::new(false),
            }),
        }
    }

    /// `true` if both handles refer to the same wrapper instance.
    pub fn ptr_eq(a: &Gamepad, b: &Gamepad) -> bool {
        Rc::ptr_eq(&a.inner, &b.inner)
    }

    /// Id this wrapper was created for. Never fails; intended for logging and keys.
    pub fn id(&self) -> u32 {
        self.inner.id
    }

    /// Was the device detached or removed?
    pub fn is_destroyed(&self) -> bool {
        self.inner.destroyed.get()
    }

    /// Whether the backend still holds the record this wrapper was built for.
    pub(crate) fn is_attached(&self) -> bool {
        self.inner.handle.strong_count() > 0
    }

    pub(crate) fn mark_destroyed(&self) {
        self.inner.destroyed.set(true);
    }

    fn native(&self) -> Result<DeviceRef> {
        let unavailable = Error::DeviceUnavailable {
            device_id: self.inner.id,
        };
        if self.is_destroyed() {
            return Err(unavailable);
        }
        self.inner.handle.upgrade().ok_or(unavailable)
    }

    pub fn device_id(&self) -> Result<u32> {
        Ok(self.native()?.device_id())
    }

    pub fn description(&self) -> Result<String> {
        Ok(self.native()?.description().to_owned())
    }

    pub fn vendor_id(&self) -> Result<u16> {
        Ok(self.native()?.vendor_id())
    }

    pub fn product_id(&self) -> Result<u16> {
        Ok(self.native()?.product_id())
    }

    pub fn num_axes(&self) -> Result<usize> {
        Ok(self.native()?.num_axes())
    }

    pub fn num_buttons(&self) -> Result<usize> {
        Ok(self.native()?.num_buttons())
    }

    /// Snapshot of every axis as of the last `process_events`.
    pub fn axis_states(&self) -> Result<Vec<f32>> {
        Ok(self.native()?.axis_states())
    }

    /// Snapshot of every button as of the last `process_events`.
    pub fn button_states(&self) -> Result<Vec<bool>> {
        Ok(self.native()?.button_states())
    }

    /// Value of a single axis.
    ///
    /// Fails with [`Error::IndexOutOfRange`] when `index < 0` or `index >= num_axes`.
    pub fn axis_state(&self, index: i64) -> Result<f32> {
        let native = self.native()?;
        let slot = checked_index(Channel::Axis, index, native.num_axes())?;
        native.axis(slot).ok_or(Error::IndexOutOfRange {
            channel: Channel::Axis,
            index,
            count: native.num_axes(),
        })
    }

    /// State of a single button.
    ///
    /// Fails with [`Error::IndexOutOfRange`] when `index < 0` or `index >= num_buttons`.
    pub fn button_state(&self, index: i64) -> Result<bool> {
        let native = self.native()?;
        let slot = checked_index(Channel::Button, index, native.num_buttons())?;
        native.button(slot).ok_or(Error::IndexOutOfRange {
            channel: Channel::Button,
            index,
            count: native.num_buttons(),
        })
    }

    /// Owned, serializable copy of everything the accessors expose.
    pub fn snapshot(&self) -> Result<DeviceSnapshot> {
        let native = self.native()?;
        Ok(DeviceSnapshot {
            device_id: native.device_id(),
            description: native.description().to_owned(),
            vendor_id: native.vendor_id(),
            product_id: native.product_id(),
            axes: native.axis_states(),
            buttons: native.button_states(),
        })
    }
}

fn checked_index(channel: Channel, index: i64, count: usize) -> Result<usize> {
    usize::try_from(index)
        .ok()
        .filter(|&slot| slot < count)
        .ok_or(Error::IndexOutOfRange {
            channel,
            index,
            count,
        })
}

impl fmt::Debug for Gamepad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gamepad")
            .field("id", &self.inner.id)
            .field("destroyed", &self.inner.destroyed.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pad_with(axes: usize, buttons: usize) -> (DeviceRef, Gamepad) {
        let dev = Rc::new(NativeDevice::new(7, "Test Pad", 0x054c, 0x05c4, axes, buttons));
        let pad = Gamepad::new(&dev);
        (dev, pad)
    }

    #[test]
    fn accessors_read_through_to_the_record() {
        let (dev, pad) = pad_with(4, 3);
        dev.set_axis(2, 0.75);
        dev.set_button(1, true);

        assert_eq!(pad.device_id().unwrap(), 7);
        assert_eq!(pad.description().unwrap(), "Test Pad");
        assert_eq!(pad.vendor_id().unwrap(), 0x054c);
        assert_eq!(pad.product_id().unwrap(), 0x05c4);
        assert_eq!(pad.num_axes().unwrap(), 4);
        assert_eq!(pad.num_buttons().unwrap(), 3);
        assert_eq!(pad.axis_states().unwrap(), vec![0.0, 0.0, 0.75, 0.0]);
        assert_eq!(pad.button_states().unwrap(), vec![false, true, false]);
    }

    #[test]
    fn state_lists_are_snapshots_not_views() {
        let (dev, pad) = pad_with(2, 1);
        let before = pad.axis_states().unwrap();
        dev.set_axis(0, 1.0);
        assert_eq!(before, vec![0.0, 0.0]);
        assert_eq!(pad.axis_states().unwrap(), vec![1.0, 0.0]);
    }

    #[test]
    fn axis_index_bounds() {
        let (dev, pad) = pad_with(4, 0);
        dev.set_axis(3, -0.5);

        assert!(matches!(
            pad.axis_state(-1),
            Err(Error::IndexOutOfRange { channel: Channel::Axis, index: -1, count: 4 })
        ));
        assert_eq!(pad.axis_state(3).unwrap(), -0.5);
        assert!(matches!(
            pad.axis_state(4),
            Err(Error::IndexOutOfRange { index: 4, .. })
        ));
    }

    #[test]
    fn button_index_bounds() {
        let (dev, pad) = pad_with(0, 2);
        dev.set_button(0, true);

        assert!(pad.button_state(0).unwrap());
        assert!(!pad.button_state(1).unwrap());
        assert!(matches!(
            pad.button_state(2),
            Err(Error::IndexOutOfRange { channel: Channel::Button, .. })
        ));
        assert!(matches!(
            pad.button_state(i64::MIN),
            Err(Error::IndexOutOfRange { .. })
        ));
    }

    #[test]
    fn destroyed_wrapper_refuses_every_accessor() {
        let (_dev, pad) = pad_with(4, 4);
        let alias = pad.clone();
        pad.mark_destroyed();

        assert!(alias.is_destroyed());
        assert_eq!(alias.id(), 7);
        assert!(matches!(alias.device_id(), Err(Error::DeviceUnavailable { device_id: 7 })));
        assert!(matches!(alias.description(), Err(Error::DeviceUnavailable { .. })));
        assert!(matches!(alias.axis_states(), Err(Error::DeviceUnavailable { .. })));
        // Liveness is checked before bounds.
        assert!(matches!(alias.axis_state(99), Err(Error::DeviceUnavailable { .. })));
        assert!(matches!(alias.button_state(0), Err(Error::DeviceUnavailable { .. })));
    }

    #[test]
    fn dropped_record_is_unavailable_even_if_not_destroyed() {
        let (dev, pad) = pad_with(1, 1);
        drop(dev);
        assert!(!pad.is_destroyed());
        assert!(matches!(pad.num_axes(), Err(Error::DeviceUnavailable { device_id: 7 })));
    }

    #[test]
    fn clones_share_identity() {
        let (dev, pad) = pad_with(1, 1);
        let other = Gamepad::new(&dev);
        assert!(Gamepad::ptr_eq(&pad, &pad.clone()));
        assert!(!Gamepad::ptr_eq(&pad, &other));
    }
}
