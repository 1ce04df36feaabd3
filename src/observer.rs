//! Change notifications for observable collections.
//!
//! Observers are held weakly: a collection never keeps its observers alive,
//! which lets an aggregate observe collections it owns without forming a
//! reference cycle. Dead observers are pruned lazily.

use std::sync::{Arc, RwLock, Weak};

use crate::error::RelResult;

/// What happened to an element of an observed collection.
#[derive(Debug)]
pub enum SetEvent<'a, T> {
    Added(&'a T),
    Removed(&'a T),
}

impl<'a, T> SetEvent<'a, T> {
    /// The element the event is about.
    pub fn element(&self) -> &'a T {
        match *self {
            SetEvent::Added(element) | SetEvent::Removed(element) => element,
        }
    }
}

impl<T> Clone for SetEvent<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for SetEvent<'_, T> {}

/// Receives notifications from an observable collection of `T`.
pub trait SetObserver<T>: Send + Sync {
    /// Called before `element` is inserted; an error vetoes the insertion and
    /// leaves the collection unchanged.
    fn validate(&self, _element: &T) -> RelResult<()> {
        Ok(())
    }

    /// Called after the collection changed, with no internal lock held.
    fn on_event(&self, event: SetEvent<'_, T>);
}

/// Registration-ordered list of weakly held observers.
pub struct ObserverList<O: ?Sized> {
    entries: RwLock<Vec<Weak<O>>>,
}

impl<O: ?Sized> ObserverList<O> {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }

    /// Register `observer`. Returns `false` if it was already registered.
    pub fn add(&self, observer: Weak<O>) -> bool {
        let mut entries = self.entries.write().expect("observer lock poisoned");
        if entries.iter().any(|existing| Weak::ptr_eq(existing, &observer)) {
            return false;
        }
        entries.push(observer);
        true
    }

    /// Unregister `observer`. Returns whether it was registered.
    pub fn remove(&self, observer: &Weak<O>) -> bool {
        let mut entries = self.entries.write().expect("observer lock poisoned");
        let before = entries.len();
        entries.retain(|existing| !Weak::ptr_eq(existing, observer));
        entries.len() != before
    }

    /// Live observers in registration order. Dropped observers are pruned.
    pub fn snapshot(&self) -> Vec<Arc<O>> {
        let mut entries = self.entries.write().expect("observer lock poisoned");
        entries.retain(|w| w.strong_count() > 0);
        entries.iter().filter_map(Weak::upgrade).collect()
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .expect("observer lock poisoned")
            .iter()
            .filter(|w| w.strong_count() > 0)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<O: ?Sized> Default for ObserverList<O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O: ?Sized> std::fmt::Debug for ObserverList<O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObserverList")
            .field("observers", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Ping: Send + Sync {
        fn ping(&self) -> u32;
    }

    struct Fixed(u32);

    impl Ping for Fixed {
        fn ping(&self) -> u32 {
            self.0
        }
    }

    #[test]
    fn keeps_registration_order_and_dedupes() {
        let list: ObserverList<dyn Ping> = ObserverList::new();
        let a: Arc<dyn Ping> = Arc::new(Fixed(1));
        let b: Arc<dyn Ping> = Arc::new(Fixed(2));

        assert!(list.add(Arc::downgrade(&b)));
        assert!(list.add(Arc::downgrade(&a)));
        assert!(!list.add(Arc::downgrade(&b)));

        let order: Vec<u32> = list.snapshot().iter().map(|o| o.ping()).collect();
        assert_eq!(order, vec![2, 1]);
    }

    #[test]
    fn dropped_observers_are_pruned() {
        let list: ObserverList<dyn Ping> = ObserverList::new();
        let keep: Arc<dyn Ping> = Arc::new(Fixed(1));
        {
            let temp: Arc<dyn Ping> = Arc::new(Fixed(2));
            list.add(Arc::downgrade(&temp));
        }
        list.add(Arc::downgrade(&keep));
        assert_eq!(list.len(), 1);
        assert_eq!(list.snapshot().len(), 1);
    }

    #[test]
    fn remove_unregisters() {
        let list: ObserverList<dyn Ping> = ObserverList::new();
        let a: Arc<dyn Ping> = Arc::new(Fixed(1));
        let weak = Arc::downgrade(&a);
        list.add(weak.clone());
        assert!(list.remove(&weak));
        assert!(!list.remove(&weak));
        assert!(list.is_empty());
    }

    #[test]
    fn event_exposes_element() {
        let value = 5;
        assert_eq!(*SetEvent::Added(&value).element(), 5);
        assert_eq!(*SetEvent::Removed(&value).element(), 5);
    }
}
