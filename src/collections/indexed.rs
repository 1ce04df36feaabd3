//! Dense, index-addressed observable set.

use std::fmt;
use std::sync::{RwLock, Weak};

use crate::context::ContextId;
use crate::error::{CollectionError, CollectionResult, RelResult};
use crate::observer::{ObserverList, SetEvent, SetObserver};

/// An element that carries its own dense, non-negative index.
pub trait Indexed {
    /// Human-readable kind, used in error messages.
    const KIND: &'static str;

    fn index(&self) -> usize;

    /// The context the index was allocated in, if the element tracks one.
    fn origin(&self) -> Option<ContextId> {
        None
    }
}

struct Slots<T> {
    data: Vec<Option<T>>,
    len: usize,
}

/// An observable set stored as an array addressed by element index.
///
/// Vacated slots become holes; trailing holes are trimmed. Two elements are
/// the same member of the set iff they share an index. All elements that
/// track an origin context must come from the same one.
pub struct IndexedSet<T: 'static> {
    slots: RwLock<Slots<T>>,
    observers: ObserverList<dyn SetObserver<T>>,
}

impl<T> IndexedSet<T>
where
    T: Indexed + Clone + 'static,
{
    pub fn new() -> Self {
        Self {
            slots: RwLock::new(Slots {
                data: Vec::new(),
                len: 0,
            }),
            observers: ObserverList::new(),
        }
    }

    /// Insert `element` at its index.
    ///
    /// Fails, leaving the set untouched, if the element comes from a
    /// different context than the current members or an observer vetoes it.
    /// Both checks run even when the slot is taken. Otherwise returns
    /// `Ok(false)` if the slot is already occupied.
    pub fn add(&self, element: T) -> RelResult<bool> {
        self.check_origin(&element)?;
        let observers = self.observers.snapshot();
        for observer in &observers {
            observer.validate(&element)?;
        }
        if self.contains(&element) {
            return Ok(false);
        }

        let index = element.index();
        {
            let mut slots = self.slots.write().expect("indexed set lock poisoned");
            if slots.data.get(index).is_some_and(Option::is_some) {
                return Ok(false);
            }
            if index >= slots.data.len() {
                slots.data.resize_with(index + 1, || None);
            }
            slots.data[index] = Some(element.clone());
            slots.len += 1;
        }

        for observer in &observers {
            observer.on_event(SetEvent::Added(&element));
        }
        Ok(true)
    }

    /// Insert every element, stopping at the first rejected one.
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

    /// The element stored at `index`.
    pub fn get(&self, index: usize) -> CollectionResult<T> {
        self.slots
            .read()
            .expect("indexed set lock poisoned")
            .data
            .get(index)
            .and_then(|slot| slot.clone())
            .ok_or(CollectionError::NotFound { index })
    }

    /// Whether a member from the same context occupies `element`'s index.
    pub fn contains(&self, element: &T) -> bool {
        self.slots
            .read()
            .expect("indexed set lock poisoned")
            .data
            .get(element.index())
            .and_then(Option::as_ref)
            .is_some_and(|member| match (member.origin(), element.origin()) {
                (Some(mine), Some(theirs)) => mine == theirs,
                _ => true,
            })
    }

    pub fn contains_index(&self, index: usize) -> bool {
        self.slots
            .read()
            .expect("indexed set lock poisoned")
            .data
            .get(index)
            .is_some_and(Option::is_some)
    }

    /// Remove the member sharing `element`'s index. Returns whether one was present.
    pub fn discard(&self, element: &T) -> bool {
        self.discard_index(element.index())
    }

    pub fn discard_index(&self, index: usize) -> bool {
        let removed = {
            let mut slots = self.slots.write().expect("indexed set lock poisoned");
            let removed = slots.data.get_mut(index).and_then(Option::take);
            if removed.is_some() {
                slots.len -= 1;
                while matches!(slots.data.last(), Some(None)) {
                    slots.data.pop();
                }
            }
            removed
        };
        match removed {
            Some(element) => {
                for observer in self.observers.snapshot() {
                    observer.on_event(SetEvent::Removed(&element));
                }
                true
            }
            None => false,
        }
    }

    /// Number of members, not counting holes.
    pub fn len(&self) -> usize {
        self.slots.read().expect("indexed set lock poisoned").len
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Highest occupied index plus one.
    pub fn slot_count(&self) -> usize {
        self.slots.read().expect("indexed set lock poisoned").data.len()
    }

    /// The context shared by the current members, if they track one.
    pub fn origin(&self) -> Option<ContextId> {
        self.slots
            .read()
            .expect("indexed set lock poisoned")
            .data
            .iter()
            .flatten()
            .find_map(Indexed::origin)
    }

    /// Check that `element` may join this set without mixing contexts.
    pub fn check_origin(&self, element: &T) -> CollectionResult<()> {
        check_origin_against::<T>(self.origin(), element)
    }

    /// Members in index order.
    pub fn to_vec(&self) -> Vec<T> {
        self.slots
            .read()
            .expect("indexed set lock poisoned")
            .data
            .iter()
            .flatten()
            .cloned()
            .collect()
    }

    /// Iterate over a snapshot in index order.
    pub fn iter(&self) -> std::vec::IntoIter<T> {
        self.to_vec().into_iter()
    }

    pub fn add_observer(&self, observer: Weak<dyn SetObserver<T>>) -> bool {
        self.observers.add(observer)
    }

    pub fn remove_observer(&self, observer: &Weak<dyn SetObserver<T>>) -> bool {
        self.observers.remove(observer)
    }
}

/// Origin check shared with callers that validate ahead of insertion.
pub(crate) fn check_origin_against<T: Indexed>(
    expected: Option<ContextId>,
    element: &T,
) -> CollectionResult<()> {
    match (expected, element.origin()) {
        (Some(expected), Some(actual)) if expected != actual => {
            Err(CollectionError::ContextMismatch {
                kind: T::KIND,
                index: element.index(),
                expected,
                actual,
            })
        }
        _ => Ok(()),
    }
}

impl<T> Default for IndexedSet<T>
where
    T: Indexed + Clone + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> PartialEq for IndexedSet<T>
where
    T: Indexed + Clone + PartialEq + 'static,
{
    fn eq(&self, other: &Self) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }
        self.len() == other.len()
            && self
                .iter()
                .all(|e| other.get(e.index()).is_ok_and(|o| o == e))
    }
}

impl<T> fmt::Debug for IndexedSet<T>
where
    T: Indexed + Clone + fmt::Debug + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.to_vec()).finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::error::RelError;

    #[derive(Debug, Clone, PartialEq)]
    struct Item {
        index: usize,
        name: &'static str,
        origin: Option<ContextId>,
    }

    impl Indexed for Item {
        const KIND: &'static str = "item";

        fn index(&self) -> usize {
            self.index
        }

        fn origin(&self) -> Option<ContextId> {
            self.origin
        }
    }

    fn item(index: usize, name: &'static str) -> Item {
        Item {
            index,
            name,
            origin: None,
        }
    }

    #[derive(Default)]
    struct Recorder {
        log: Mutex<Vec<String>>,
    }

    impl SetObserver<Item> for Recorder {
        fn on_event(&self, event: SetEvent<'_, Item>) {
            let line = match event {
                SetEvent::Added(i) => format!("+{}", i.index),
                SetEvent::Removed(i) => format!("-{}", i.index),
            };
            self.log.lock().unwrap().push(line);
        }
    }

    #[test]
    fn add_grows_with_holes_and_iterates_in_index_order() {
        let set = IndexedSet::new();
        set.add(item(3, "d")).unwrap();
        set.add(item(0, "a")).unwrap();
        set.add(item(1, "b")).unwrap();

        assert_eq!(set.len(), 3);
        assert_eq!(set.slot_count(), 4);
        let names: Vec<&str> = set.iter().map(|i| i.name).collect();
        assert_eq!(names, vec!["a", "b", "d"]);
        assert!(!set.contains_index(2));
    }

    #[test]
    fn occupied_index_is_a_noop() {
        let set = IndexedSet::new();
        assert!(set.add(item(0, "a")).unwrap());
        assert!(!set.add(item(0, "other")).unwrap());
        assert_eq!(set.get(0).unwrap().name, "a");
    }

    #[test]
    fn get_missing_or_hole_is_not_found() {
        let set = IndexedSet::new();
        set.add(item(0, "a")).unwrap();
        set.add(item(2, "c")).unwrap();
        assert!(matches!(set.get(1), Err(CollectionError::NotFound { index: 1 })));
        assert!(matches!(set.get(9), Err(CollectionError::NotFound { index: 9 })));
    }

    #[test]
    fn discard_leaves_holes_and_trims_the_tail() {
        let set = IndexedSet::new();
        for (i, n) in ["a", "b", "c"].into_iter().enumerate() {
            set.add(item(i, n)).unwrap();
        }

        assert!(set.discard_index(1));
        assert_eq!(set.len(), 2);
        assert_eq!(set.slot_count(), 3);

        assert!(set.discard(&item(2, "c")));
        assert_eq!(set.slot_count(), 1);
        assert!(!set.discard_index(2));
        assert_eq!(set.to_vec(), vec![item(0, "a")]);
    }

    #[test]
    fn observers_see_adds_and_removes() {
        let set = IndexedSet::new();
        let recorder = Arc::new(Recorder::default());
        set.add_observer(Arc::downgrade(&recorder) as Weak<dyn SetObserver<Item>>);

        set.add(item(1, "b")).unwrap();
        set.add(item(1, "b")).unwrap();
        set.discard_index(1);

        assert_eq!(*recorder.log.lock().unwrap(), vec!["+1", "-1"]);
    }

    #[test]
    fn equality_is_by_index() {
        let left = IndexedSet::new();
        let right = IndexedSet::new();
        left.add(item(0, "a")).unwrap();
        left.add(item(1, "b")).unwrap();
        right.add(item(1, "b")).unwrap();
        assert_ne!(left, right);
        right.add(item(0, "a")).unwrap();
        assert_eq!(left, right);
    }

    #[test]
    fn foreign_origin_is_rejected() {
        let ctx_a = ContextId::from_raw(1001);
        let ctx_b = ContextId::from_raw(1002);
        let set = IndexedSet::new();
        set.add(Item {
            index: 0,
            name: "a",
            origin: Some(ctx_a),
        })
        .unwrap();

        let err = set
            .add(Item {
                index: 1,
                name: "b",
                origin: Some(ctx_b),
            })
            .unwrap_err();
        assert!(err.to_string().contains("item 1"));
        assert_eq!(set.len(), 1);
        assert_eq!(set.origin(), Some(ctx_a));
    }

    #[test]
    fn foreign_origin_at_an_occupied_index_is_rejected() {
        let home = Item {
            index: 0,
            name: "home",
            origin: Some(ContextId::from_raw(2001)),
        };
        let stranger = Item {
            index: 0,
            name: "stranger",
            origin: Some(ContextId::from_raw(2002)),
        };
        let set = IndexedSet::new();
        set.add(home.clone()).unwrap();

        assert!(matches!(
            set.add(stranger.clone()),
            Err(RelError::Collection(CollectionError::ContextMismatch { index: 0, .. }))
        ));
        assert!(set.contains(&home));
        assert!(!set.contains(&stranger));
        assert_eq!(set.get(0).unwrap().name, "home");
    }

    #[test]
    fn veto_applies_to_occupied_indices() {
        struct Deny;
        impl SetObserver<Item> for Deny {
            fn validate(&self, element: &Item) -> RelResult<()> {
                Err(CollectionError::NotFound { index: element.index }.into())
            }
            fn on_event(&self, _event: SetEvent<'_, Item>) {}
        }

        let set = IndexedSet::new();
        set.add(item(0, "a")).unwrap();
        let deny = Arc::new(Deny);
        set.add_observer(Arc::downgrade(&deny) as Weak<dyn SetObserver<Item>>);
        assert!(set.add(item(0, "a")).is_err());
        assert_eq!(set.len(), 1);
    }
}
