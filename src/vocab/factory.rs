//! Factories for vocabulary items.

use std::marker::PhantomData;

use crate::allocator::SequentialAllocator;
use crate::context::DataContext;
use crate::error::RelResult;
use crate::vocab::{ClassKind, LiteralKind, RelationKind, Vocab, VocabKind};

/// Creates vocabulary items of kind `K`, numbering them per context.
pub struct VocabFactory<K: VocabKind>(PhantomData<fn() -> K>);

pub type ClassTypeFactory = VocabFactory<ClassKind>;
pub type RelationTypeFactory = VocabFactory<RelationKind>;
pub type LiteralTypeFactory = VocabFactory<LiteralKind>;

impl<K: VocabKind> VocabFactory<K> {
    const ALLOCATOR: SequentialAllocator = SequentialAllocator::new(K::COUNTER_KEY);

    /// Create an item with the next index of the active context.
    pub fn create(name: impl Into<String>) -> RelResult<Vocab<K>> {
        Self::create_in(&DataContext::current(), name)
    }

    /// Create an item with the next index of `ctx`.
    pub fn create_in(ctx: &DataContext, name: impl Into<String>) -> RelResult<Vocab<K>> {
        let name = name.into();
        let index = Self::ALLOCATOR.allocate_in(ctx)?;
        tracing::debug!(kind = K::KIND, index, name = %name, context = %ctx.id(), "created vocabulary item");
        Ok(Vocab::new(index, name, ctx.id()))
    }

    /// Create one item per name, in order.
    pub fn create_all<S: Into<String>>(names: impl IntoIterator<Item = S>) -> RelResult<Vec<Vocab<K>>> {
        let ctx = DataContext::current();
        names
            .into_iter()
            .map(|name| Self::create_in(&ctx, name))
            .collect()
    }

    /// Restart numbering at 0 in the active context.
    pub fn reset() {
        Self::ALLOCATOR.reset();
    }

    pub fn reset_in(ctx: &DataContext) {
        Self::ALLOCATOR.reset_in(ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_are_per_kind_and_contiguous() {
        DataContext::scoped(|| {
            let a = ClassTypeFactory::create("A").unwrap();
            let b = ClassTypeFactory::create("B").unwrap();
            let r = RelationTypeFactory::create("r").unwrap();
            let l = LiteralTypeFactory::create("l").unwrap();
            assert_eq!((a.index(), b.index()), (0, 1));
            assert_eq!(r.index(), 0);
            assert_eq!(l.index(), 0);
            assert_eq!(a.origin(), DataContext::current().id());
        });
    }

    #[test]
    fn nested_contexts_number_independently() {
        let indices = DataContext::scoped(|| {
            let first = ClassTypeFactory::create("x").unwrap().index();
            let inner = DataContext::scoped(|| {
                let a = ClassTypeFactory::create("y").unwrap().index();
                let b = DataContext::scoped(|| ClassTypeFactory::create("z").unwrap().index());
                (a, b)
            });
            let second = ClassTypeFactory::create("w").unwrap().index();
            (first, inner.0, inner.1, second)
        });
        assert_eq!(indices, (0, 0, 0, 1));
    }

    #[test]
    fn reset_restarts_numbering() {
        DataContext::scoped(|| {
            ClassTypeFactory::create_all(["a", "b", "c"]).unwrap();
            ClassTypeFactory::reset();
            assert_eq!(ClassTypeFactory::create("d").unwrap().index(), 0);
            assert_eq!(RelationTypeFactory::create("r").unwrap().index(), 0);
        });
    }
}
