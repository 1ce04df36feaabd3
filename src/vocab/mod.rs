//! Vocabulary items: classes, relations, and literal types.
//!
//! All three share one representation, [`Vocab<K>`], distinguished at the
//! type level by a kind marker so that a relation can never be passed where a
//! class is expected. Items are created by their [`VocabFactory`] and are
//! immutable afterwards.

pub mod factory;

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::sync::Arc;

use crate::collections::Indexed;
use crate::context::ContextId;

pub use factory::{ClassTypeFactory, LiteralTypeFactory, RelationTypeFactory, VocabFactory};

/// Compile-time description of one vocabulary kind.
pub trait VocabKind: Send + Sync + 'static {
    /// Type name used in the display form, e.g. `ClassType`.
    const LABEL: &'static str;
    /// Lower-case kind used in diagnostics, e.g. `class`.
    const KIND: &'static str;
    /// Context key of the kind's index counter.
    const COUNTER_KEY: &'static str;
}

#[derive(Debug)]
pub enum ClassKind {}

#[derive(Debug)]
pub enum RelationKind {}

#[derive(Debug)]
pub enum LiteralKind {}

impl VocabKind for ClassKind {
    const LABEL: &'static str = "ClassType";
    const KIND: &'static str = "class";
    const COUNTER_KEY: &'static str = "ClassTypeFactory.last_index";
}

impl VocabKind for RelationKind {
    const LABEL: &'static str = "RelationType";
    const KIND: &'static str = "relation";
    const COUNTER_KEY: &'static str = "RelationTypeFactory.last_index";
}

impl VocabKind for LiteralKind {
    const LABEL: &'static str = "LiteralType";
    const KIND: &'static str = "literal";
    const COUNTER_KEY: &'static str = "LiteralTypeFactory.last_index";
}

/// A named, indexed schema element of kind `K`.
///
/// Equality and hashing consider the index only.
pub struct Vocab<K: VocabKind> {
    index: usize,
    name: Arc<str>,
    origin: ContextId,
    _kind: PhantomData<fn() -> K>,
}

pub type ClassType = Vocab<ClassKind>;
pub type RelationType = Vocab<RelationKind>;
pub type LiteralType = Vocab<LiteralKind>;

impl<K: VocabKind> Vocab<K> {
    pub(crate) fn new(index: usize, name: impl Into<Arc<str>>, origin: ContextId) -> Self {
        Self {
            index,
            name: name.into(),
            origin,
            _kind: PhantomData,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The context this item's index was allocated in.
    pub fn origin(&self) -> ContextId {
        self.origin
    }
}

impl<K: VocabKind> Indexed for Vocab<K> {
    const KIND: &'static str = K::KIND;

    fn index(&self) -> usize {
        self.index
    }

    fn origin(&self) -> Option<ContextId> {
        Some(self.origin)
    }
}

impl<K: VocabKind> Clone for Vocab<K> {
    fn clone(&self) -> Self {
        Self {
            index: self.index,
            name: Arc::clone(&self.name),
            origin: self.origin,
            _kind: PhantomData,
        }
    }
}

impl<K: VocabKind> PartialEq for Vocab<K> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl<K: VocabKind> Eq for Vocab<K> {}

impl<K: VocabKind> Hash for Vocab<K> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
    }
}

impl<K: VocabKind> fmt::Display for Vocab<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(index = {}, name = '{}')", K::LABEL, self.index, self.name)
    }
}

impl<K: VocabKind> fmt::Debug for Vocab<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(K::LABEL)
            .field("index", &self.index)
            .field("name", &&*self.name)
            .field("origin", &self.origin)
            .finish()
    }
}
