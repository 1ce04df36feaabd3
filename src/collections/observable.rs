//! Hash-backed observable set with deterministic iteration.

use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;
use std::sync::{RwLock, Weak};

use crate::error::RelResult;
use crate::observer::{ObserverList, SetEvent, SetObserver};

/// A set that reports changes to its observers.
///
/// Iteration is sorted by each element's [`Display`](fmt::Display) form, so it
/// is reproducible across calls and across runs regardless of hashing.
pub struct ObservableSet<T: 'static> {
    elements: RwLock<HashSet<T>>,
    observers: ObserverList<dyn SetObserver<T>>,
}

impl<T> ObservableSet<T>
where
    T: Eq + Hash + Clone + fmt::Display + 'static,
{
    pub fn new() -> Self {
        Self {
            elements: RwLock::new(HashSet::new()),
            observers: ObserverList::new(),
        }
    }

    /// Insert `element`.
    ///
    /// Fails, leaving the set untouched, if an observer vetoes the
    /// insertion; observers are asked even when an equal element is already
    /// present. Otherwise returns `Ok(false)` without notifying anyone if the
    /// element was present.
    pub fn add(&self, element: T) -> RelResult<bool> {
        let observers = self.observers.snapshot();
        for observer in &observers {
            observer.validate(&element)?;
        }
        if self.contains(&element) {
            return Ok(false);
        }
        let inserted = self
            .elements
            .write()
            .expect("set lock poisoned")
            .insert(element.clone());
        if inserted {
            for observer in &observers {
                observer.on_event(SetEvent::Added(&element));
            }
        }
        Ok(inserted)
    }

    /// Insert every element, stopping at the first vetoed one.
    ///
    /// Returns how many elements were newly inserted.
    pub fn add_all(&self, elements: impl IntoIterator<Item = T>) -> RelResult<usize> {
        let mut added = 0;
        for element in elements {
            if self.add(element)? {
                added += 1;
            }
        }
        Ok(added)
    }

    /// Remove `element`. Returns whether it was present.
    pub fn discard(&self, element: &T) -> bool {
        let removed = self
            .elements
            .write()
            .expect("set lock poisoned")
            .remove(element);
        if removed {
            for observer in self.observers.snapshot() {
                observer.on_event(SetEvent::Removed(element));
            }
        }
        removed
    }

    pub fn contains(&self, element: &T) -> bool {
        self.elements
            .read()
            .expect("set lock poisoned")
            .contains(element)
    }

    pub fn len(&self) -> usize {
        self.elements.read().expect("set lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A sorted snapshot of the elements.
    pub fn to_vec(&self) -> Vec<T> {
        let mut elements: Vec<T> = self
            .elements
            .read()
            .expect("set lock poisoned")
            .iter()
            .cloned()
            .collect();
        elements.sort_by_cached_key(|e| e.to_string());
        elements
    }

    /// Iterate over a sorted snapshot; later mutations do not affect it.
    pub fn iter(&self) -> std::vec::IntoIter<T> {
        self.to_vec().into_iter()
    }

    /// Register an observer. Returns `false` if it was already registered.
    pub fn add_observer(&self, observer: Weak<dyn SetObserver<T>>) -> bool {
        self.observers.add(observer)
    }

    pub fn remove_observer(&self, observer: &Weak<dyn SetObserver<T>>) -> bool {
        self.observers.remove(observer)
    }
}

impl<T> Default for ObservableSet<T>
where
    T: Eq + Hash + Clone + fmt::Display + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FromIterator<T> for ObservableSet<T>
where
    T: Eq + Hash + Clone + fmt::Display + 'static,
{
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            elements: RwLock::new(iter.into_iter().collect()),
            observers: ObserverList::new(),
        }
    }
}

impl<T> PartialEq for ObservableSet<T>
where
    T: Eq + Hash + Clone + fmt::Display + 'static,
{
    fn eq(&self, other: &Self) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }
        let mine = self.elements.read().expect("set lock poisoned");
        let theirs = other.elements.read().expect("set lock poisoned");
        *mine == *theirs
    }
}

impl<T> fmt::Debug for ObservableSet<T>
where
    T: Eq + Hash + Clone + fmt::Display + fmt::Debug + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.to_vec()).finish()
    }
}
