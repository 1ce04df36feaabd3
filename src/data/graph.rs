//! Knowledge graph aggregate with reactive closure.
//!
//! A [`KnowledgeGraph`] owns one [`IndexedSet`] each for classes, relations,
//! literal types and individuals, plus an [`ObservableSet`] of triples. It
//! observes all five collections and every individual it contains, and keeps
//! them closed under reference:
//!
//! - adding an individual registers every class and literal type it uses;
//! - adding a triple registers its relation and both individuals;
//! - adding a class or literal to a registered individual registers its type.
//!
//! Every addition is validated against the whole closure before anything is
//! mutated, so a rejected addition leaves the graph untouched. Removals never
//! cascade.

use std::fmt;
use std::sync::{Arc, Weak};

use crate::collections::indexed::check_origin_against;
use crate::collections::{Indexed, IndexedSet, ObservableSet};
use crate::context::ContextId;
use crate::data::individual::{IndividualEvent, IndividualObserver, IndividualRef};
use crate::data::triple::Triple;
use crate::error::{CollectionResult, RelResult};
use crate::observer::{SetEvent, SetObserver};
use crate::vocab::{ClassType, LiteralType, RelationType};

/// Anything that can be added to a [`KnowledgeGraph`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GraphItem {
    Class(ClassType),
    Relation(RelationType),
    Literal(LiteralType),
    Individual(IndividualRef),
    Triple(Triple),
}

impl From<ClassType> for GraphItem {
    fn from(c: ClassType) -> Self {
        GraphItem::Class(c)
    }
}

impl From<RelationType> for GraphItem {
    fn from(r: RelationType) -> Self {
        GraphItem::Relation(r)
    }
}

impl From<LiteralType> for GraphItem {
    fn from(l: LiteralType) -> Self {
        GraphItem::Literal(l)
    }
}

impl From<IndividualRef> for GraphItem {
    fn from(i: IndividualRef) -> Self {
        GraphItem::Individual(i)
    }
}

impl From<Triple> for GraphItem {
    fn from(t: Triple) -> Self {
        GraphItem::Triple(t)
    }
}

impl fmt::Display for GraphItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphItem::Class(c) => write!(f, "{c}"),
            GraphItem::Relation(r) => write!(f, "{r}"),
            GraphItem::Literal(l) => write!(f, "{l}"),
            GraphItem::Individual(i) => write!(f, "{i}"),
            GraphItem::Triple(t) => write!(f, "{t}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Closure validation
// ---------------------------------------------------------------------------

/// Origin contexts the graph's collections would hold after an addition.
///
/// An empty collection takes the origin of the first element admitted into
/// it, so two foreign elements arriving in one addition are caught too.
struct Admission<'g> {
    graph: &'g GraphState,
    classes: Option<ContextId>,
    relations: Option<ContextId>,
    literals: Option<ContextId>,
    individuals: Option<ContextId>,
}

impl<'g> Admission<'g> {
    fn new(graph: &'g GraphState) -> Self {
        Self {
            graph,
            classes: graph.classes.origin(),
            relations: graph.relations.origin(),
            literals: graph.literals.origin(),
            individuals: graph.individuals.origin(),
        }
    }

    fn admit<T: Indexed>(slot: &mut Option<ContextId>, element: &T) -> CollectionResult<()> {
        check_origin_against(*slot, element)?;
        if slot.is_none() {
            *slot = element.origin();
        }
        Ok(())
    }

    fn class(&mut self, class: &ClassType) -> CollectionResult<()> {
        Self::admit(&mut self.classes, class)
    }

    fn relation(&mut self, relation: &RelationType) -> CollectionResult<()> {
        Self::admit(&mut self.relations, relation)
    }

    fn literal(&mut self, literal: &LiteralType) -> CollectionResult<()> {
        Self::admit(&mut self.literals, literal)
    }

    fn individual(&mut self, individual: &IndividualRef) -> CollectionResult<()> {
        Self::admit(&mut self.individuals, individual)?;
        if self.graph.individuals.contains(individual) {
            return Ok(());
        }
        for membership in individual.classes().iter() {
            self.class(membership.cls())?;
        }
        for value in individual.literals().iter() {
            self.literal(value.literal())?;
        }
        Ok(())
    }

    fn triple(&mut self, triple: &Triple) -> CollectionResult<()> {
        self.relation(triple.predicate())?;
        self.individual(triple.subject())?;
        self.individual(triple.object())
    }

    fn item(&mut self, item: &GraphItem) -> CollectionResult<()> {
        match item {
            GraphItem::Class(c) => self.class(c),
            GraphItem::Relation(r) => self.relation(r),
            GraphItem::Literal(l) => self.literal(l),
            GraphItem::Individual(i) => self.individual(i),
            GraphItem::Triple(t) => self.triple(t),
        }
    }
}

// ---------------------------------------------------------------------------
// Shared state and reactions
// ---------------------------------------------------------------------------

struct GraphState {
    me: Weak<GraphState>,
    classes: IndexedSet<ClassType>,
    relations: IndexedSet<RelationType>,
    literals: IndexedSet<LiteralType>,
    individuals: IndexedSet<IndividualRef>,
    triples: ObservableSet<Triple>,
}

impl GraphState {
    fn check_admission(&self, item: &GraphItem) -> RelResult<()> {
        Admission::new(self).item(item)?;
        Ok(())
    }

    fn on_added(&self, item: GraphItem) {
        let result = match &item {
            GraphItem::Class(_) | GraphItem::Relation(_) | GraphItem::Literal(_) => Ok(()),
            GraphItem::Individual(individual) => self.register_individual(individual),
            GraphItem::Triple(triple) => self.register_triple(triple),
        };
        if let Err(error) = result {
            tracing::warn!(%error, %item, "failed to register items referenced by a new graph member");
        }
    }

    fn on_removed(&self, item: GraphItem) {
        if let GraphItem::Individual(individual) = &item {
            let observer: Weak<dyn IndividualObserver> = self.me.clone();
            individual.remove_observer(&observer);
        }
        tracing::trace!(%item, "graph member removed");
    }

    fn register_individual(&self, individual: &IndividualRef) -> RelResult<()> {
        let observer: Weak<dyn IndividualObserver> = self.me.clone();
        individual.add_observer(observer);
        for membership in individual.classes().iter() {
            self.classes.add(membership.cls().clone())?;
        }
        for value in individual.literals().iter() {
            self.literals.add(value.literal().clone())?;
        }
        tracing::debug!(individual = individual.index(), "registered individual");
        Ok(())
    }

    fn register_triple(&self, triple: &Triple) -> RelResult<()> {
        self.relations.add(triple.predicate().clone())?;
        self.individuals.add(triple.subject().clone())?;
        self.individuals.add(triple.object().clone())?;
        Ok(())
    }

    fn dispatch<T: Clone + Into<GraphItem>>(&self, event: SetEvent<'_, T>) {
        match event {
            SetEvent::Added(element) => self.on_added(element.clone().into()),
            SetEvent::Removed(element) => self.on_removed(element.clone().into()),
        }
    }
}

macro_rules! observe_as_graph_item {
    ($($element:ty),* $(,)?) => {
        $(
            impl SetObserver<$element> for GraphState {
                fn validate(&self, element: &$element) -> RelResult<()> {
                    self.check_admission(&GraphItem::from(element.clone()))
                }

                fn on_event(&self, event: SetEvent<'_, $element>) {
                    self.dispatch(event);
                }
            }
        )*
    };
}

observe_as_graph_item!(ClassType, RelationType, LiteralType, IndividualRef, Triple);

impl IndividualObserver for GraphState {
    fn validate(&self, event: &IndividualEvent<'_>) -> RelResult<()> {
        let mut admission = Admission::new(self);
        match *event {
            IndividualEvent::ClassAdded { membership, .. } => admission.class(membership.cls())?,
            IndividualEvent::LiteralAdded { literal, .. } => admission.literal(literal.literal())?,
            IndividualEvent::ClassRemoved { .. } | IndividualEvent::LiteralRemoved { .. } => {}
        }
        Ok(())
    }

    fn on_event(&self, event: IndividualEvent<'_>) {
        let result = match event {
            IndividualEvent::ClassAdded { membership, .. } => {
                self.classes.add(membership.cls().clone()).map(drop)
            }
            IndividualEvent::LiteralAdded { literal, .. } => {
                self.literals.add(literal.literal().clone()).map(drop)
            }
            IndividualEvent::ClassRemoved { .. } | IndividualEvent::LiteralRemoved { .. } => Ok(()),
        };
        if let Err(error) = result {
            tracing::warn!(%error, "failed to register vocabulary of a graph member");
        }
    }
}

// ---------------------------------------------------------------------------
// KnowledgeGraph
// ---------------------------------------------------------------------------

/// A knowledge graph whose collections are always closed under reference.
pub struct KnowledgeGraph {
    state: Arc<GraphState>,
}

impl KnowledgeGraph {
    /// Create a new empty knowledge graph.
    pub fn new() -> Self {
        let state = Arc::new_cyclic(|me| GraphState {
            me: me.clone(),
            classes: IndexedSet::new(),
            relations: IndexedSet::new(),
            literals: IndexedSet::new(),
            individuals: IndexedSet::new(),
            triples: ObservableSet::new(),
        });
        let me = Arc::downgrade(&state);
        state.classes.add_observer(me.clone());
        state.relations.add_observer(me.clone());
        state.literals.add_observer(me.clone());
        state.individuals.add_observer(me.clone());
        state.triples.add_observer(me);
        Self { state }
    }

    pub fn classes(&self) -> &IndexedSet<ClassType> {
        &self.state.classes
    }

    pub fn relations(&self) -> &IndexedSet<RelationType> {
        &self.state.relations
    }

    pub fn literals(&self) -> &IndexedSet<LiteralType> {
        &self.state.literals
    }

    pub fn individuals(&self) -> &IndexedSet<IndividualRef> {
        &self.state.individuals
    }

    pub fn triples(&self) -> &ObservableSet<Triple> {
        &self.state.triples
    }

    /// Add any item to the matching collection.
    ///
    /// Returns `Ok(false)` if it was already present.
    pub fn add(&self, item: impl Into<GraphItem>) -> RelResult<bool> {
        match item.into() {
            GraphItem::Class(c) => self.classes().add(c),
            GraphItem::Relation(r) => self.relations().add(r),
            GraphItem::Literal(l) => self.literals().add(l),
            GraphItem::Individual(i) => self.individuals().add(i),
            GraphItem::Triple(t) => self.triples().add(t),
        }
    }

    pub fn contains(&self, item: &GraphItem) -> bool {
        match item {
            GraphItem::Class(c) => self.classes().contains(c),
            GraphItem::Relation(r) => self.relations().contains(r),
            GraphItem::Literal(l) => self.literals().contains(l),
            GraphItem::Individual(i) => self.individuals().contains(i),
            GraphItem::Triple(t) => self.triples().contains(t),
        }
    }

    /// Whether every referenced class, literal type, relation and individual
    /// is present.
    pub fn is_closed(&self) -> bool {
        let individuals_closed = self.individuals().iter().all(|individual| {
            individual
                .classes()
                .iter()
                .all(|m| self.classes().contains(m.cls()))
                && individual
                    .literals()
                    .iter()
                    .all(|l| self.literals().contains(l.literal()))
        });
        let triples_closed = self.triples().iter().all(|t| {
            self.relations().contains(t.predicate())
                && self.individuals().contains(t.subject())
                && self.individuals().contains(t.object())
        });
        individuals_closed && triples_closed
    }
}

impl Default for KnowledgeGraph {
    fn default() -> Self {
        Self::new()
    }
}

/// Structural equality: equal collections, and every individual carries
/// equal class memberships and literal values in both graphs.
impl PartialEq for KnowledgeGraph {
    fn eq(&self, other: &Self) -> bool {
        if Arc::ptr_eq(&self.state, &other.state) {
            return true;
        }
        self.classes() == other.classes()
            && self.relations() == other.relations()
            && self.literals() == other.literals()
            && self.individuals() == other.individuals()
            && self.triples() == other.triples()
            && self.individuals().iter().all(|mine| {
                other
                    .individuals()
                    .get(mine.index())
                    .is_ok_and(|theirs| mine.classes() == theirs.classes() && mine.literals() == theirs.literals())
            })
    }
}

impl fmt::Debug for KnowledgeGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KnowledgeGraph")
            .field("classes", &self.classes().len())
            .field("relations", &self.relations().len())
            .field("literals", &self.literals().len())
            .field("individuals", &self.individuals().len())
            .field("triples", &self.triples().len())
            .finish()
    }
}
