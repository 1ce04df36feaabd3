//! Observable collections.
//!
//! - [`ObservableSet`]: a hash set that notifies observers on insertion and
//!   removal, and always iterates in the order of its elements' string forms.
//! - [`IndexedSet`]: a dense, index-addressed set for elements that carry their
//!   own index (vocabulary items and individuals), with O(1) lookup by index.
//!
//! Both follow the same mutation protocol: observers may veto an insertion in
//! [`SetObserver::validate`](crate::observer::SetObserver::validate) before
//! anything changes, and are notified after the change with no lock held, so
//! an observer may freely mutate other collections from its callback.

pub mod indexed;
pub mod observable;

pub use indexed::{Indexed, IndexedSet};
pub use observable::ObservableSet;
