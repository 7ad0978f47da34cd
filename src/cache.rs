//! Device identity cache.
//!
//! Maps a backend device id to the single [`Gamepad`] wrapper handed out for it.
//! While an entry is present, every lookup for that id returns the same wrapper,
//! so handlers can compare devices by identity and keep per-device state keyed on them.
//!
//! Entries leave the cache through:
//! - [`DeviceCache::evict`], done by the dispatch bridge when a remove event arrives;
//! - [`DeviceCache::clear_all`], a recovery primitive for desynchronized state;
//! - [`DeviceCache::resolve`], which drops entries whose backend record is gone.
//!
//! Neither frees the backend's [`NativeDevice`](crate::device::NativeDevice). Eviction
//! and destruction are logical operations only.

use crate::device::DeviceRef;
use crate::gamepad::Gamepad;
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Default)]
pub struct DeviceCache {
    devices: HashMap<u32, Gamepad>,
}

impl DeviceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the wrapper for `handle`'s device, creating and caching it on first sight.
    ///
    /// A `None` handle (the backend had no device at the requested position)
    /// yields `None` and caches nothing. An already-cached live wrapper is returned
    /// as-is and is never rebound to a different record.
    ///
    /// An entry whose record the backend has already dropped (its remove event was
    /// never dispatched, e.g. no remove handler was registered) is stale: it is
    /// replaced by a fresh wrapper, and stale entries for other ids are pruned.
    pub fn resolve(&mut self, handle: Option<&DeviceRef>) -> Option<Gamepad> {
        let handle = handle?;
        let id = handle.device_id();

        if let Some(pad) = self.devices.get(&id) {
            if !pad.is_destroyed() && pad.is_attached() {
                return Some(pad.clone());
            }
            debug!(device_id = id, "replacing stale cache entry");
        }

        self.prune_detached();
        let pad = Gamepad::new(handle);
        debug!(device_id = id, "cached new device wrapper");
        self.devices.insert(id, pad.clone());
        Some(pad)
    }

    fn prune_detached(&mut self) {
        let before = self.devices.len();
        self.devices.retain(|_, pad| pad.is_attached());
        let pruned = before - self.devices.len();
        if pruned > 0 {
            debug!(pruned, "pruned wrappers of dropped devices");
        }
    }

    /// Remove and return the entry for `device_id`. Absent ids are a no-op.
    pub fn evict(&mut self, device_id: u32) -> Option<Gamepad> {
        let evicted = self.devices.remove(&device_id);
        if evicted.is_some() {
            debug!(device_id, "evicted device wrapper");
        }
        evicted
    }

    /// Drop every entry.
    ///
    /// Wrappers already handed out are left as they are: they stay readable for as
    /// long as the backend keeps their record, and report
    /// [`Error::DeviceUnavailable`](crate::Error::DeviceUnavailable) once it is gone.
    /// The next lookup for any id produces a new wrapper.
    pub fn clear_all(&mut self) {
        debug!(entries = self.devices.len(), "clearing device cache");
        self.devices.clear();
    }

    /// Remove and yield every entry.
    pub fn drain(&mut self) -> impl Iterator<Item = Gamepad> + '_ {
        self.devices.drain().map(|(_, pad)| pad)
    }

    pub fn get(&self, device_id: u32) -> Option<&Gamepad> {
        self.devices.get(&device_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &Gamepad)> {
        self.devices.iter().map(|(&id, pad)| (id, pad))
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::NativeDevice;
    use std::rc::Rc;

    fn device(id: u32) -> DeviceRef {
        Rc::new(NativeDevice::new(id, format!("Pad {id}"), 0, 0, 2, 2))
    }

    #[test]
    fn resolve_is_idempotent_per_id() {
        let mut cache = DeviceCache::new();
        let dev = device(1);
        let a = cache.resolve(Some(&dev)).unwrap();
        let b = cache.resolve(Some(&dev)).unwrap();
        assert!(Gamepad::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn absent_handle_caches_nothing() {
        let mut cache = DeviceCache::new();
        assert!(cache.resolve(None).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn cached_wrapper_is_not_rebound() {
        let mut cache = DeviceCache::new();
        let first = device(4);
        let impostor = Rc::new(NativeDevice::new(4, "Other", 9, 9, 0, 0));

        let a = cache.resolve(Some(&first)).unwrap();
        let b = cache.resolve(Some(&impostor)).unwrap();
        assert!(Gamepad::ptr_eq(&a, &b));
        assert_eq!(b.description().unwrap(), "Pad 4");
    }

    #[test]
    fn evict_missing_id_is_a_no_op() {
        let mut cache = DeviceCache::new();
        assert!(cache.evict(42).is_none());
    }

    #[test]
    fn evict_then_resolve_builds_a_new_wrapper() {
        let mut cache = DeviceCache::new();
        let dev = device(2);
        let a = cache.resolve(Some(&dev)).unwrap();
        let evicted = cache.evict(2).unwrap();
        assert!(Gamepad::ptr_eq(&a, &evicted));

        let b = cache.resolve(Some(&dev)).unwrap();
        assert!(!Gamepad::ptr_eq(&a, &b));
    }

    #[test]
    fn clear_all_orphans_but_does_not_destroy() {
        let mut cache = DeviceCache::new();
        let dev = device(3);
        let a = cache.resolve(Some(&dev)).unwrap();
        cache.clear_all();

        assert!(cache.is_empty());
        assert!(!a.is_destroyed());
        assert_eq!(a.device_id().unwrap(), 3);

        let b = cache.resolve(Some(&dev)).unwrap();
        assert!(!Gamepad::ptr_eq(&a, &b));
    }

    #[test]
    fn destroyed_entry_is_replaced() {
        let mut cache = DeviceCache::new();
        let dev = device(5);
        let a = cache.resolve(Some(&dev)).unwrap();
        a.mark_destroyed();

        let b = cache.resolve(Some(&dev)).unwrap();
        assert!(!Gamepad::ptr_eq(&a, &b));
        assert!(!b.is_destroyed());
    }

    #[test]
    fn reused_id_after_dropped_record_gets_a_live_wrapper() {
        let mut cache = DeviceCache::new();
        let old = device(3);
        let stale = cache.resolve(Some(&old)).unwrap();
        drop(old);

        let new = Rc::new(NativeDevice::new(3, "Pad 3 again", 0, 0, 2, 2));
        let fresh = cache.resolve(Some(&new)).unwrap();
        assert!(!Gamepad::ptr_eq(&stale, &fresh));
        assert_eq!(fresh.description().unwrap(), "Pad 3 again");
        assert!(Gamepad::ptr_eq(cache.get(3).unwrap(), &fresh));
    }

    #[test]
    fn wrappers_of_dropped_records_are_pruned() {
        let mut cache = DeviceCache::new();
        let gone = device(1);
        cache.resolve(Some(&gone)).unwrap();
        drop(gone);

        let kept = device(2);
        cache.resolve(Some(&kept)).unwrap();
        assert_eq!(cache.len(), 1);
        assert!(cache.get(1).is_none());
    }
}
