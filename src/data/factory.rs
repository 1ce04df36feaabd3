//! Factory for individuals.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::allocator::SequentialAllocator;
use crate::context::DataContext;
use crate::data::individual::{BaseIndividual, Individual, IndividualRef};
use crate::error::{FactoryError, RelResult};

const LAST_INDEX: SequentialAllocator = SequentialAllocator::new("IndividualFactory.last_index");
const USED_NAMES: &str = "IndividualFactory.used_names";

/// Process-wide switch for name-uniqueness checking.
static CHECK_NAMES: AtomicBool = AtomicBool::new(true);

/// Creates individuals, numbering them per context and keeping their names
/// unique within a context.
pub struct IndividualFactory(());

impl IndividualFactory {
    /// Whether name uniqueness is currently enforced.
    pub fn check_names() -> bool {
        CHECK_NAMES.load(Ordering::Relaxed)
    }

    /// Turn name-uniqueness checking on or off for the whole process.
    ///
    /// While disabled, names are not recorded either, so re-enabling the
    /// check does not detect clashes with names created in the meantime.
    pub fn set_check_names(enabled: bool) {
        CHECK_NAMES.store(enabled, Ordering::Relaxed);
    }

    /// Create a plain individual in the active context.
    pub fn create(name: impl Into<String>) -> RelResult<IndividualRef> {
        Self::create_in(&DataContext::current(), name)
    }

    pub fn create_in(ctx: &DataContext, name: impl Into<String>) -> RelResult<IndividualRef> {
        let base: Arc<BaseIndividual> = Self::create_with_in(ctx, name, |base| base)?;
        let individual: IndividualRef = base;
        Ok(individual)
    }

    /// Create a custom individual in the active context.
    ///
    /// `build` receives the base carrying the freshly allocated index and the
    /// name, and must embed it in the returned value.
    pub fn create_with<T, F>(name: impl Into<String>, build: F) -> RelResult<Arc<T>>
    where
        T: Individual,
        F: FnOnce(BaseIndividual) -> T,
    {
        Self::create_with_in(&DataContext::current(), name, build)
    }

    pub fn create_with_in<T, F>(ctx: &DataContext, name: impl Into<String>, build: F) -> RelResult<Arc<T>>
    where
        T: Individual,
        F: FnOnce(BaseIndividual) -> T,
    {
        let name = name.into();
        let check = Self::check_names();
        if check && ctx.update_or_insert_with(USED_NAMES, HashSet::<String>::new, |used| used.contains(&name))? {
            return Err(FactoryError::NameCollision {
                name,
                context: ctx.id(),
            }
            .into());
        }

        let index = LAST_INDEX.allocate_in(ctx)?;
        if check {
            ctx.update_or_insert_with(USED_NAMES, HashSet::<String>::new, |used| used.insert(name.clone()))?;
        }
        tracing::debug!(index, name = %name, context = %ctx.id(), "created individual");
        Ok(Arc::new(build(BaseIndividual::new(index, name, ctx.id()))))
    }

    /// Restart numbering at 0 and forget used names in the active context.
    pub fn reset() {
        Self::reset_in(&DataContext::current());
    }

    pub fn reset_in(ctx: &DataContext) {
        LAST_INDEX.reset_in(ctx);
        ctx.remove(USED_NAMES);
    }
}

/// Serializes unit tests that depend on the process-wide name check.
#[cfg(test)]
pub(crate) static NAME_CHECK_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RelError;

    struct Student {
        base: BaseIndividual,
        school: String,
    }

    impl Individual for Student {
        fn base(&self) -> &BaseIndividual {
            &self.base
        }
    }

    fn name_check_lock() -> std::sync::MutexGuard<'static, ()> {
        NAME_CHECK_LOCK.lock().unwrap_or_else(|e| e.into_inner())
    }

    #[test]
    fn duplicate_name_is_a_collision() {
        let _lock = name_check_lock();
        DataContext::scoped(|| {
            IndividualFactory::create("dup").unwrap();
            let err = IndividualFactory::create("dup").unwrap_err();
            assert!(matches!(err, RelError::Factory(FactoryError::NameCollision { .. })));
            // the failed call consumed no index
            assert_eq!(IndividualFactory::create("fresh").unwrap().index(), 1);
        });
    }

    #[test]
    fn same_name_in_other_context_is_fine() {
        let _lock = name_check_lock();
        let outer = DataContext::scoped(|| {
            let a = IndividualFactory::create("same").unwrap();
            let b = DataContext::scoped(|| IndividualFactory::create("same").unwrap());
            (a.index(), b.index())
        });
        assert_eq!(outer, (0, 0));
    }

    #[test]
    fn disabled_check_skips_bookkeeping() {
        let _lock = name_check_lock();
        DataContext::scoped(|| {
            IndividualFactory::set_check_names(false);
            let a = IndividualFactory::create("SAME-NAME").unwrap();
            let b = IndividualFactory::create("SAME-NAME").unwrap();
            IndividualFactory::set_check_names(true);

            assert_ne!(a.index(), b.index());
            assert!(IndividualFactory::create("SAME-NAME").is_ok());
            assert!(IndividualFactory::create("SAME-NAME").is_err());
        });
    }

    #[test]
    fn custom_individual_types() {
        DataContext::scoped(|| {
            IndividualFactory::create("first").unwrap();
            let student = IndividualFactory::create_with("student", |base| Student {
                base,
                school: "TU Wien".to_string(),
            })
            .unwrap();
            assert_eq!(student.base().index(), 1);
            assert_eq!(student.base().name(), "student");
            assert_eq!(student.school, "TU Wien");

            let as_ref: IndividualRef = student;
            assert_eq!(as_ref.index(), 1);
        });
    }

    #[test]
    fn reset_forgets_names_and_indices() {
        DataContext::scoped(|| {
            IndividualFactory::create("again").unwrap();
            IndividualFactory::reset();
            let ind = IndividualFactory::create("again").unwrap();
            assert_eq!(ind.index(), 0);
        });
    }
}
