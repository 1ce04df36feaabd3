//! Thread-scoped, nestable data contexts.
//!
//! A [`DataContext`] is a type-erased key/value bag describing the state of
//! building one knowledge graph: factory counters, the set of used individual
//! names, and anything else a builder wants to keep per graph. Exactly one
//! context is active per thread at a time:
//!
//! - [`DataContext::current`] returns the active context, lazily creating a
//!   default one for the calling thread.
//! - [`DataContext::enter`] activates a context and returns a [`ContextGuard`]
//!   that restores the previously active one when dropped, on every exit path.
//! - [`DataContext::scoped`] runs a closure inside a brand-new context.
//!
//! Contexts are cheap handles: cloning one yields another handle to the same
//! bag. Threads never observe each other's active context.

use std::any::Any;
use std::cell::RefCell;
use std::marker::PhantomData;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;

use crate::error::ContextError;

/// Source of context identities, shared by all threads.
static NEXT_CONTEXT_ID: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static ACTIVE: RefCell<Option<DataContext>> = const { RefCell::new(None) };
}

/// Opaque identity of a [`DataContext`].
///
/// Every entity created by a factory records the id of the context it was
/// created in, so collections can refuse to mix indices from unrelated
/// numbering schemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct ContextId(u64);

impl ContextId {
    fn fresh() -> Self {
        ContextId(NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    #[cfg(test)]
    pub(crate) fn from_raw(raw: u64) -> Self {
        ContextId(raw)
    }

    /// Get the underlying `u64` value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ContextId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ctx#{}", self.0)
    }
}

type Slot = Box<dyn Any + Send + Sync>;

struct ContextInner {
    id: ContextId,
    entries: DashMap<String, Slot>,
}

/// A nestable key/value store scoping identity allocation for one graph.
#[derive(Clone)]
pub struct DataContext {
    inner: Arc<ContextInner>,
}

impl DataContext {
    /// Create a new, empty context. It is not active until entered.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ContextInner {
                id: ContextId::fresh(),
                entries: DashMap::new(),
            }),
        }
    }

    /// The active context of the calling thread.
    ///
    /// If no context is active, a default one is created and activated; it
    /// stays active until a guard restores "no context" or another context
    /// is entered.
    pub fn current() -> Self {
        ACTIVE.with(|active| {
            active
                .borrow_mut()
                .get_or_insert_with(|| {
                    let ctx = DataContext::new();
                    tracing::debug!(context = %ctx.id(), "created default data context");
                    ctx
                })
                .clone()
        })
    }

    /// The active context of the calling thread, without creating one.
    pub fn try_current() -> Option<Self> {
        ACTIVE.with(|active| active.borrow().clone())
    }

    /// Make `self` the active context of the calling thread.
    ///
    /// The previously active context (if any) is restored when the returned
    /// guard is dropped. If none was active, the thread is left without an
    /// active context, and the next [`current`](Self::current) call creates a
    /// fresh default.
    pub fn enter(&self) -> ContextGuard {
        let previous = ACTIVE.with(|active| active.replace(Some(self.clone())));
        ContextGuard {
            previous,
            _thread_bound: PhantomData,
        }
    }

    /// Run `f` with `self` as the active context.
    pub fn run<R>(&self, f: impl FnOnce() -> R) -> R {
        let _guard = self.enter();
        f()
    }

    /// Run `f` inside a brand-new context.
    pub fn scoped<R>(f: impl FnOnce() -> R) -> R {
        DataContext::new().run(f)
    }

    /// This context's identity.
    pub fn id(&self) -> ContextId {
        self.inner.id
    }

    /// Read the value stored under `key`.
    ///
    /// A key that was never set yields `Ok(None)`; a key holding a value of
    /// another type is a [`ContextError::TypeMismatch`].
    pub fn get<T: Any + Clone>(&self, key: &str) -> Result<Option<T>, ContextError> {
        let Some(entry) = self.inner.entries.get(key) else {
            return Ok(None);
        };
        entry
            .value()
            .as_ref()
            .downcast_ref::<T>()
            .cloned()
            .map(Some)
            .ok_or_else(|| type_mismatch::<T>(key))
    }

    /// Like [`get`](Self::get), but a missing key is an error.
    pub fn require<T: Any + Clone>(&self, key: &str) -> Result<T, ContextError> {
        self.get(key)?.ok_or_else(|| ContextError::KeyNotFound {
            key: key.to_string(),
        })
    }

    /// Store `value` under `key`, replacing whatever was there.
    pub fn set<T: Any + Send + Sync>(&self, key: impl Into<String>, value: T) {
        self.inner.entries.insert(key.into(), Box::new(value));
    }

    /// Mutate the value under `key` in place, inserting `init()` first if the
    /// key is missing.
    ///
    /// Fails without touching the context if the key holds another type.
    pub fn update_or_insert_with<T, R>(
        &self,
        key: &str,
        init: impl FnOnce() -> T,
        f: impl FnOnce(&mut T) -> R,
    ) -> Result<R, ContextError>
    where
        T: Any + Send + Sync,
    {
        let mut entry = self
            .inner
            .entries
            .entry(key.to_string())
            .or_insert_with(|| Box::new(init()));
        let value = entry
            .value_mut()
            .as_mut()
            .downcast_mut::<T>()
            .ok_or_else(|| type_mismatch::<T>(key))?;
        Ok(f(value))
    }

    /// Remove `key`. Returns whether it was present.
    pub fn remove(&self, key: &str) -> bool {
        self.inner.entries.remove(key).is_some()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.inner.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.entries.is_empty()
    }

    /// Drop every key. The context keeps its identity.
    pub fn clear(&self) {
        self.inner.entries.clear();
    }
}

fn type_mismatch<T>(key: &str) -> ContextError {
    ContextError::TypeMismatch {
        key: key.to_string(),
        expected: std::any::type_name::<T>(),
    }
}

impl Default for DataContext {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for DataContext {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for DataContext {}

impl std::fmt::Debug for DataContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataContext")
            .field("id", &self.inner.id)
            .field("keys", &self.inner.entries.len())
            .finish()
    }
}

/// Restores the previously active context when dropped.
///
/// Guards are bound to the thread that created them and must be dropped in
/// reverse order of creation.
#[must_use = "the context is exited as soon as the guard is dropped"]
pub struct ContextGuard {
    previous: Option<DataContext>,
    _thread_bound: PhantomData<*const ()>,
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        let previous = self.previous.take();
        // The thread-local may already be gone during thread teardown.
        let _ = ACTIVE.try_with(|active| *active.borrow_mut() = previous);
    }
}

impl std::fmt::Debug for ContextGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextGuard")
            .field("previous", &self.previous.as_ref().map(DataContext::id))
            .finish()
    }
}
