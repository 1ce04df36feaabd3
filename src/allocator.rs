//! Sequential index allocation scoped to a [`DataContext`].
//!
//! Each factory owns one [`SequentialAllocator`] with a distinct key. The
//! counter lives in the active context, so indices handed out in one context
//! form a contiguous run starting at 0, and two contexts number independently.

use crate::context::DataContext;
use crate::error::ContextError;

/// Hands out `0, 1, 2, ...` per context, keyed by a fixed name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequentialAllocator {
    key: &'static str,
}

impl SequentialAllocator {
    pub const fn new(key: &'static str) -> Self {
        Self { key }
    }

    /// The context key holding this allocator's counter.
    pub fn key(&self) -> &'static str {
        self.key
    }

    /// Allocate the next index in the active context.
    pub fn allocate(&self) -> Result<usize, ContextError> {
        self.allocate_in(&DataContext::current())
    }

    /// Allocate the next index in `ctx`.
    pub fn allocate_in(&self, ctx: &DataContext) -> Result<usize, ContextError> {
        let index = ctx.update_or_insert_with(
            self.key,
            || None::<usize>,
            |last| {
                let next = last.map_or(0, |i| i + 1);
                *last = Some(next);
                next
            },
        )?;
        tracing::trace!(key = self.key, context = %ctx.id(), index, "allocated index");
        Ok(index)
    }

    /// The most recently allocated index in `ctx`, if any.
    pub fn last_in(&self, ctx: &DataContext) -> Result<Option<usize>, ContextError> {
        Ok(ctx.get::<Option<usize>>(self.key)?.flatten())
    }

    /// Forget the counter in the active context; the next index is 0 again.
    pub fn reset(&self) {
        self.reset_in(&DataContext::current());
    }

    pub fn reset_in(&self, ctx: &DataContext) {
        ctx.remove(self.key);
    }
}
