// Field references inside thiserror's #[error("...{field}...")] strings are
// invisible to the lint through the derive, which reports false positives.
#![allow(unused_assignments)]

//! # reldata
//!
//! Knowledge graphs for relational learning: classes, relations, literal
//! types and individuals, numbered per [`DataContext`](context::DataContext),
//! collected in a [`KnowledgeGraph`](data::KnowledgeGraph) that stays closed
//! under reference as it is mutated.
//!
//! ## Architecture
//!
//! - **Contexts** (`context`, `allocator`): scoped key/value bags that hold
//!   the per-kind index counters
//! - **Collections** (`collections`, `observer`): observable sets, with an
//!   index-addressed variant, that let observers veto and react to changes
//! - **Vocabulary** (`vocab`): class, relation and literal types and their
//!   factories
//! - **Data** (`data`): individuals, facts with provenance, triples and the
//!   graph aggregate
//! - **Persistence** (`io`): a positional text encoding for graphs and graph
//!   sequences
//!
//! ## Library usage
//!
//! ```no_run
//! use reldata::context::DataContext;
//! use reldata::data::{ClassMembership, IndividualFactory, KnowledgeGraph, Triple};
//! use reldata::vocab::{ClassTypeFactory, RelationTypeFactory};
//!
//! DataContext::scoped(|| -> reldata::error::RelResult<()> {
//!     let person = ClassTypeFactory::create("Person")?;
//!     let knows = RelationTypeFactory::create("knows")?;
//!     let alice = IndividualFactory::create("alice")?;
//!     let bob = IndividualFactory::create("bob")?;
//!     alice.classes().add(ClassMembership::specified(person, true))?;
//!
//!     let kg = KnowledgeGraph::new();
//!     kg.add(Triple::fact(alice, knows, bob, true))?;
//!     assert_eq!(kg.classes().len(), 1);
//!     Ok(())
//! })
//! .unwrap();
//! ```

pub mod allocator;
pub mod collections;
pub mod config;
pub mod context;
pub mod data;
pub mod error;
pub mod io;
pub mod observer;
pub mod stats;
pub mod vocab;

/// Restart the numbering of all four factories in the active context and
/// forget the individual names used there.
pub fn reset() {
    vocab::ClassTypeFactory::reset();
    vocab::RelationTypeFactory::reset();
    vocab::LiteralTypeFactory::reset();
    data::IndividualFactory::reset();
}
