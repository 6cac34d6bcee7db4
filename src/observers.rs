//! Callback registration.
//!
//! [`LiveSlot`] holds the single live-update registrant for a sensor and
//! [`ObserverList`] any number of extra observers. Both deliver values
//! synchronously on the publishing thread.
//!
//! Registrations are guarded by a reentrant lock that is held for the whole
//! delivery. Releasing a registration from another thread therefore waits
//! for an in-flight delivery to finish, and once the release returns the
//! callback is never invoked again. Releasing from inside the callback is
//! allowed.

use parking_lot::ReentrantMutex;
use std::cell::RefCell;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tracing::debug;

use crate::error::{Error, Result};
use crate::sensor::SensorKind;

static NEXT_CALLBACK_ID: AtomicU64 = AtomicU64::new(1);

fn next_callback_id() -> u64 {
    NEXT_CALLBACK_ID.fetch_add(1, Ordering::Relaxed)
}

/// Handle for a registered callback.
///
/// The callback is unregistered when this handle is dropped or
/// [`unregister`](Self::unregister) is called.
pub struct CallbackHandle {
    id: u64,
    unregister_fn: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl CallbackHandle {
    pub(crate) fn new(id: u64, unregister_fn: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            id,
            unregister_fn: Some(Box::new(unregister_fn)),
        }
    }

    /// Unregister this callback.
    pub fn unregister(mut self) {
        if let Some(f) = self.unregister_fn.take() {
            f();
        }
    }

    /// Get the callback ID.
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl Drop for CallbackHandle {
    fn drop(&mut self) {
        if let Some(f) = self.unregister_fn.take() {
            f();
        }
    }
}

impl std::fmt::Debug for CallbackHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackHandle")
            .field("id", &self.id)
            .field("registered", &self.unregister_fn.is_some())
            .finish()
    }
}

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

type SlotCell<T> = ReentrantMutex<RefCell<Option<(u64, Callback<T>)>>>;

/// Single-owner live-update registration for one sensor.
pub struct LiveSlot<T> {
    sensor: SensorKind,
    inner: Arc<SlotCell<T>>,
}

impl<T: 'static> LiveSlot<T> {
    /// Create an empty slot.
    pub fn new(sensor: SensorKind) -> Self {
        Self {
            sensor,
            inner: Arc::new(ReentrantMutex::new(RefCell::new(None))),
        }
    }

    /// Claim the slot.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LiveSlotOccupied`] if another registrant holds it.
    pub fn claim<F>(&self, callback: F) -> Result<CallbackHandle>
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let guard = self.inner.lock();
        let mut slot = guard.borrow_mut();
        if let Some((owner, _)) = slot.as_ref() {
            return Err(Error::LiveSlotOccupied {
                sensor: self.sensor,
                owner: *owner,
            });
        }
        let id = next_callback_id();
        *slot = Some((id, Arc::new(callback)));
        debug!("Live updates for {} claimed by #{}", self.sensor, id);
        Ok(self.handle(id))
    }

    /// Claim the slot, revoking the current owner if there is one.
    ///
    /// The revoked owner's handle becomes inert: dropping it later leaves
    /// the new owner in place.
    pub fn take_over<F>(&self, callback: F) -> CallbackHandle
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let guard = self.inner.lock();
        let id = next_callback_id();
        let previous = guard.borrow_mut().replace((id, Arc::new(callback)));
        if let Some((previous, _)) = previous {
            debug!(
                "Live updates for {} taken over by #{} from #{}",
                self.sensor, id, previous
            );
        }
        self.handle(id)
    }

    /// Id of the current owner.
    pub fn owner(&self) -> Option<u64> {
        let guard = self.inner.lock();
        let owner = guard.borrow().as_ref().map(|(id, _)| *id);
        owner
    }

    /// Check if the slot has an owner.
    pub fn is_claimed(&self) -> bool {
        self.owner().is_some()
    }

    /// Deliver a value to the owner, if any.
    ///
    /// Returns whether a callback was invoked.
    pub fn deliver(&self, value: &T) -> bool {
        let guard = self.inner.lock();
        let callback = guard.borrow().as_ref().map(|(_, cb)| cb.clone());
        match callback {
            Some(callback) => {
                callback(value);
                true
            }
            None => false,
        }
    }

    fn handle(&self, id: u64) -> CallbackHandle {
        let weak: Weak<SlotCell<T>> = Arc::downgrade(&self.inner);
        let sensor = self.sensor;
        CallbackHandle::new(id, move || {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            let guard = inner.lock();
            let released = {
                let mut slot = guard.borrow_mut();
                match slot.as_ref() {
                    Some((owner, _)) if *owner == id => slot.take(),
                    _ => None,
                }
            };
            if released.is_some() {
                debug!("Live updates for {} released by #{}", sensor, id);
            }
            drop(released);
        })
    }
}

type ObserverCell<T> = ReentrantMutex<RefCell<Vec<(u64, Callback<T>)>>>;

/// Any number of synchronous observers.
pub struct ObserverList<T> {
    inner: Arc<ObserverCell<T>>,
}

impl<T: 'static> ObserverList<T> {
    /// Create an empty list.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ReentrantMutex::new(RefCell::new(Vec::new()))),
        }
    }

    /// Register an observer.
    pub fn observe<F>(&self, callback: F) -> CallbackHandle
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = next_callback_id();
        {
            let guard = self.inner.lock();
            guard.borrow_mut().push((id, Arc::new(callback)));
        }

        let weak: Weak<ObserverCell<T>> = Arc::downgrade(&self.inner);
        CallbackHandle::new(id, move || {
            if let Some(inner) = weak.upgrade() {
                let guard = inner.lock();
                let removed: Vec<_> = {
                    let mut observers = guard.borrow_mut();
                    let (gone, kept) = observers.drain(..).partition(|(oid, _)| *oid == id);
                    *observers = kept;
                    gone
                };
                drop(removed);
            }
        })
    }

    /// Number of registered observers.
    pub fn len(&self) -> usize {
        let guard = self.inner.lock();
        let len = guard.borrow().len();
        len
    }

    /// Check if there are no observers.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deliver a value to every observer.
    ///
    /// An observer removed by an earlier observer during the same delivery
    /// is skipped.
    pub fn notify(&self, value: &T) {
        let guard = self.inner.lock();
        let snapshot: Vec<_> = guard.borrow().clone();
        for (id, callback) in snapshot {
            let still_registered = guard.borrow().iter().any(|(oid, _)| *oid == id);
            if still_registered {
                callback(value);
            }
        }
    }
}

impl<T: 'static> Default for ObserverList<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_claim_and_deliver() {
        let slot = LiveSlot::new(SensorKind::BarometricPressure);
        let received = Arc::new(Mutex::new(Vec::new()));

        assert!(!slot.deliver(&1.0f32));

        let sink = received.clone();
        let handle = slot.claim(move |v: &f32| sink.lock().push(*v));
        assert!(handle.is_ok());
        assert!(slot.is_claimed());

        assert!(slot.deliver(&1010.0));
        assert_eq!(*received.lock(), vec![1010.0]);

        drop(handle);
        assert!(!slot.is_claimed());
        assert!(!slot.deliver(&1020.0));
        assert_eq!(*received.lock(), vec![1010.0]);
    }

    #[test]
    fn test_second_claim_rejected() {
        let slot = LiveSlot::new(SensorKind::BarometricPressure);
        let first = slot.claim(|_: &f32| {});
        let owner = first.as_ref().map(|h| h.id()).unwrap_or(0);

        match slot.claim(|_: &f32| {}) {
            Err(Error::LiveSlotOccupied { sensor, owner: o }) => {
                assert_eq!(sensor, SensorKind::BarometricPressure);
                assert_eq!(o, owner);
            }
            other => panic!("expected LiveSlotOccupied, got {:?}", other.map(|h| h.id())),
        }
        assert_eq!(slot.owner(), Some(owner));
    }

    #[test]
    fn test_take_over_and_stale_release() {
        let slot = LiveSlot::new(SensorKind::Light);
        let a_count = Arc::new(AtomicUsize::new(0));
        let b_count = Arc::new(AtomicUsize::new(0));

        let a = a_count.clone();
        let handle_a = slot.claim(move |_: &f32| {
            a.fetch_add(1, Ordering::SeqCst);
        });
        let b = b_count.clone();
        let handle_b = slot.take_over(move |_: &f32| {
            b.fetch_add(1, Ordering::SeqCst);
        });

        slot.deliver(&1.0);
        // A's late release must not clear B
        drop(handle_a);
        slot.deliver(&2.0);

        assert_eq!(a_count.load(Ordering::SeqCst), 0);
        assert_eq!(b_count.load(Ordering::SeqCst), 2);
        assert_eq!(slot.owner(), Some(handle_b.id()));
    }

    #[test]
    fn test_release_inside_callback() {
        let slot = Arc::new(LiveSlot::new(SensorKind::Sound));
        let holder: Arc<Mutex<Option<CallbackHandle>>> = Arc::new(Mutex::new(None));
        let calls = Arc::new(AtomicUsize::new(0));

        let h = holder.clone();
        let c = calls.clone();
        let handle = slot.claim(move |_: &f32| {
            c.fetch_add(1, Ordering::SeqCst);
            let handle = h.lock().take();
            drop(handle);
        });
        *holder.lock() = handle.ok();

        slot.deliver(&-40.0);
        slot.deliver(&-41.0);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!slot.is_claimed());
    }

    #[test]
    fn test_release_after_slot_dropped() {
        let slot = LiveSlot::new(SensorKind::Humidity);
        let handle = slot.claim(|_: &f32| {});
        drop(slot);
        drop(handle);
    }

    #[test]
    fn test_observers() {
        let list = ObserverList::new();
        let total = Arc::new(AtomicUsize::new(0));

        let t1 = total.clone();
        let h1 = list.observe(move |v: &usize| {
            t1.fetch_add(*v, Ordering::SeqCst);
        });
        let t2 = total.clone();
        let h2 = list.observe(move |v: &usize| {
            t2.fetch_add(*v * 10, Ordering::SeqCst);
        });
        assert_eq!(list.len(), 2);

        list.notify(&1);
        assert_eq!(total.load(Ordering::SeqCst), 11);

        h1.unregister();
        list.notify(&1);
        assert_eq!(total.load(Ordering::SeqCst), 21);

        drop(h2);
        assert!(list.is_empty());
    }

    #[test]
    fn test_observer_removed_during_delivery_is_skipped() {
        let list = ObserverList::new();
        let second_handle: Arc<Mutex<Option<CallbackHandle>>> = Arc::new(Mutex::new(None));
        let second_calls = Arc::new(AtomicUsize::new(0));

        let h = second_handle.clone();
        let _first = list.observe(move |_: &u8| {
            let handle = h.lock().take();
            drop(handle);
        });
        let c = second_calls.clone();
        *second_handle.lock() = Some(list.observe(move |_: &u8| {
            c.fetch_add(1, Ordering::SeqCst);
        }));

        list.notify(&0);
        assert_eq!(second_calls.load(Ordering::SeqCst), 0);
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_release_waits_for_delivery() {
        use std::time::Duration;

        let slot = Arc::new(LiveSlot::new(SensorKind::BarometricPressure));
        let in_callback = Arc::new(std::sync::Barrier::new(2));
        let finished = Arc::new(AtomicUsize::new(0));

        let barrier = in_callback.clone();
        let done = finished.clone();
        let handle = slot.claim(move |_: &f32| {
            barrier.wait();
            std::thread::sleep(Duration::from_millis(50));
            done.store(1, Ordering::SeqCst);
        });

        let publisher = {
            let slot = slot.clone();
            std::thread::spawn(move || {
                slot.deliver(&1000.0);
            })
        };

        in_callback.wait();
        drop(handle);
        // Release returned only after the in-flight callback completed
        assert_eq!(finished.load(Ordering::SeqCst), 1);
        let _ = publisher.join();
    }
}
