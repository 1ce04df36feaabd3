//! Individuals: the nodes of a knowledge graph.
//!
//! Every individual embeds a [`BaseIndividual`] holding its identity and its
//! two observable sets (class memberships and literal values). Changes to
//! either set are relayed to the individual's own observers as
//! [`IndividualEvent`]s, which is how a knowledge graph learns about classes
//! added after the individual was registered.
//!
//! Custom individual types embed the base they receive from
//! [`IndividualFactory::create_with`](crate::data::IndividualFactory::create_with)
//! and implement [`Individual::base`]; everything else is reached through it.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Weak};

use crate::collections::{Indexed, ObservableSet};
use crate::context::ContextId;
use crate::data::provenance::{ClassMembership, LiteralValue};
use crate::error::RelResult;
use crate::observer::{ObserverList, SetEvent, SetObserver};

/// Shared handle to any individual.
pub type IndividualRef = Arc<dyn Individual>;

/// A change to one of an individual's sets.
#[derive(Debug, Clone, Copy)]
pub enum IndividualEvent<'a> {
    ClassAdded {
        individual: usize,
        membership: &'a ClassMembership,
    },
    ClassRemoved {
        individual: usize,
        membership: &'a ClassMembership,
    },
    LiteralAdded {
        individual: usize,
        literal: &'a LiteralValue,
    },
    LiteralRemoved {
        individual: usize,
        literal: &'a LiteralValue,
    },
}

/// Receives [`IndividualEvent`]s from the individuals it subscribed to.
pub trait IndividualObserver: Send + Sync {
    /// Called before a class or literal is added; an error vetoes the addition.
    fn validate(&self, _event: &IndividualEvent<'_>) -> RelResult<()> {
        Ok(())
    }

    fn on_event(&self, event: IndividualEvent<'_>);
}

/// Capability set shared by all individuals.
///
/// Implementors only hand out their embedded [`BaseIndividual`]. Identity,
/// the two fact sets and observer registration are inherent methods of the
/// base and of `dyn Individual`, so no implementation can alter them.
pub trait Individual: Send + Sync + 'static {
    fn base(&self) -> &BaseIndividual;
}

/// Identity and state common to all individuals.
pub struct BaseIndividual {
    index: usize,
    name: Arc<str>,
    origin: ContextId,
    classes: ObservableSet<ClassMembership>,
    literals: ObservableSet<LiteralValue>,
    relay: Arc<Relay>,
}

impl BaseIndividual {
    pub(crate) fn new(index: usize, name: impl Into<Arc<str>>, origin: ContextId) -> Self {
        let relay = Arc::new(Relay {
            individual: index,
            observers: ObserverList::new(),
        });
        let classes = ObservableSet::new();
        let literals = ObservableSet::new();
        classes.add_observer(Arc::downgrade(&relay) as Weak<dyn SetObserver<ClassMembership>>);
        literals.add_observer(Arc::downgrade(&relay) as Weak<dyn SetObserver<LiteralValue>>);
        Self {
            index,
            name: name.into(),
            origin,
            classes,
            literals,
            relay,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The context this individual's index was allocated in.
    pub fn origin(&self) -> ContextId {
        self.origin
    }

    pub fn classes(&self) -> &ObservableSet<ClassMembership> {
        &self.classes
    }

    pub fn literals(&self) -> &ObservableSet<LiteralValue> {
        &self.literals
    }

    /// Subscribe to class and literal changes. Returns `false` if already subscribed.
    pub fn add_observer(&self, observer: Weak<dyn IndividualObserver>) -> bool {
        self.relay.observers.add(observer)
    }

    pub fn remove_observer(&self, observer: &Weak<dyn IndividualObserver>) -> bool {
        self.relay.observers.remove(observer)
    }
}

impl Individual for BaseIndividual {
    fn base(&self) -> &BaseIndividual {
        self
    }
}

impl dyn Individual {
    pub fn index(&self) -> usize {
        self.base().index()
    }

    pub fn name(&self) -> &str {
        self.base().name()
    }

    pub fn origin(&self) -> ContextId {
        self.base().origin()
    }

    pub fn classes(&self) -> &ObservableSet<ClassMembership> {
        self.base().classes()
    }

    pub fn literals(&self) -> &ObservableSet<LiteralValue> {
        self.base().literals()
    }

    pub fn add_observer(&self, observer: Weak<dyn IndividualObserver>) -> bool {
        self.base().add_observer(observer)
    }

    pub fn remove_observer(&self, observer: &Weak<dyn IndividualObserver>) -> bool {
        self.base().remove_observer(observer)
    }
}

impl fmt::Debug for BaseIndividual {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BaseIndividual")
            .field("index", &self.index)
            .field("name", &&*self.name)
            .field("origin", &self.origin)
            .field("classes", &self.classes.len())
            .field("literals", &self.literals.len())
            .finish()
    }
}

/// Forwards set events of one individual to its observers.
struct Relay {
    individual: usize,
    observers: ObserverList<dyn IndividualObserver>,
}

impl Relay {
    fn check(&self, event: IndividualEvent<'_>) -> RelResult<()> {
        for observer in self.observers.snapshot() {
            observer.validate(&event)?;
        }
        Ok(())
    }

    fn notify(&self, event: IndividualEvent<'_>) {
        for observer in self.observers.snapshot() {
            observer.on_event(event);
        }
    }
}

impl SetObserver<ClassMembership> for Relay {
    fn validate(&self, membership: &ClassMembership) -> RelResult<()> {
        self.check(IndividualEvent::ClassAdded {
            individual: self.individual,
            membership,
        })
    }

    fn on_event(&self, event: SetEvent<'_, ClassMembership>) {
        let individual = self.individual;
        self.notify(match event {
            SetEvent::Added(membership) => IndividualEvent::ClassAdded {
                individual,
                membership,
            },
            SetEvent::Removed(membership) => IndividualEvent::ClassRemoved {
                individual,
                membership,
            },
        });
    }
}

impl SetObserver<LiteralValue> for Relay {
    fn validate(&self, literal: &LiteralValue) -> RelResult<()> {
        self.check(IndividualEvent::LiteralAdded {
            individual: self.individual,
            literal,
        })
    }

    fn on_event(&self, event: SetEvent<'_, LiteralValue>) {
        let individual = self.individual;
        self.notify(match event {
            SetEvent::Added(literal) => IndividualEvent::LiteralAdded { individual, literal },
            SetEvent::Removed(literal) => IndividualEvent::LiteralRemoved { individual, literal },
        });
    }
}

// ---------------------------------------------------------------------------
// Trait-object identity
// ---------------------------------------------------------------------------

impl Indexed for IndividualRef {
    const KIND: &'static str = "individual";

    fn index(&self) -> usize {
        self.base().index()
    }

    fn origin(&self) -> Option<ContextId> {
        Some(self.base().origin())
    }
}

impl PartialEq for dyn Individual {
    fn eq(&self, other: &Self) -> bool {
        self.index() == other.index()
    }
}

impl Eq for dyn Individual {}

impl Hash for dyn Individual {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index().hash(state);
    }
}

impl fmt::Display for dyn Individual {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let classes: Vec<String> = self
            .classes()
            .iter()
            .map(|m| format!("{}{}", if m.is_member() { '+' } else { '-' }, m.cls().index()))
            .collect();
        let literals: Vec<String> = self
            .literals()
            .iter()
            .map(|l| format!("({}, {})", l.literal().index(), l.value()))
            .collect();
        write!(
            f,
            "Individual(index = {}, name = '{}', classes = [{}], literals = [{}])",
            self.index(),
            self.name(),
            classes.join(", "),
            literals.join(", ")
        )
    }
}

impl fmt::Debug for dyn Individual {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.base(), f)
    }
}
