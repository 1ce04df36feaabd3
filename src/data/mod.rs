//! Graph data: individuals, their facts, triples, and the graph aggregate.

pub mod factory;
pub mod graph;
pub mod individual;
pub mod provenance;
pub mod triple;

pub use factory::IndividualFactory;
pub use graph::{GraphItem, KnowledgeGraph};
pub use individual::{BaseIndividual, Individual, IndividualEvent, IndividualObserver, IndividualRef};
pub use provenance::{ClassMembership, LiteralValue, Provenance};
pub use triple::Triple;
