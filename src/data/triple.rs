//! Relational triples between individuals.

use std::fmt;
use std::hash::{Hash, Hasher};

use crate::data::individual::IndividualRef;
use crate::data::provenance::Provenance;
use crate::error::DataError;
use crate::vocab::RelationType;

/// An asserted link (`positive`) or an asserted non-link between two
/// individuals through a relation.
///
/// Equality is structural: subject, predicate and object by index, plus
/// polarity and provenance.
#[derive(Debug, Clone)]
pub struct Triple {
    subject: IndividualRef,
    predicate: RelationType,
    object: IndividualRef,
    positive: bool,
    provenance: Provenance,
}

impl Triple {
    pub fn new(
        subject: IndividualRef,
        predicate: RelationType,
        object: IndividualRef,
        positive: bool,
        provenance: Provenance,
    ) -> Self {
        Self {
            subject,
            predicate,
            object,
            positive,
            provenance,
        }
    }

    /// A specified fact.
    pub fn fact(subject: IndividualRef, predicate: RelationType, object: IndividualRef, positive: bool) -> Self {
        Self::new(subject, predicate, object, positive, Provenance::Specified)
    }

    pub fn from_flags(
        subject: IndividualRef,
        predicate: RelationType,
        object: IndividualRef,
        positive: bool,
        inferred: bool,
        prediction: bool,
    ) -> Result<Self, DataError> {
        let provenance = Provenance::from_flags(inferred, prediction, "triple")?;
        Ok(Self::new(subject, predicate, object, positive, provenance))
    }

    pub fn subject(&self) -> &IndividualRef {
        &self.subject
    }

    pub fn predicate(&self) -> &RelationType {
        &self.predicate
    }

    pub fn object(&self) -> &IndividualRef {
        &self.object
    }

    pub fn positive(&self) -> bool {
        self.positive
    }

    pub fn provenance(&self) -> Provenance {
        self.provenance
    }

    pub fn inferred(&self) -> bool {
        self.provenance.is_inferred()
    }

    pub fn prediction(&self) -> bool {
        self.provenance.is_prediction()
    }

    /// Neither inferred nor a prediction.
    pub fn is_fact(&self) -> bool {
        self.provenance.is_specified()
    }
}

impl PartialEq for Triple {
    fn eq(&self, other: &Self) -> bool {
        self.subject.index() == other.subject.index()
            && self.predicate == other.predicate
            && self.object.index() == other.object.index()
            && self.positive == other.positive
            && self.provenance == other.provenance
    }
}

impl Eq for Triple {}

impl Hash for Triple {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.subject.index().hash(state);
        self.predicate.hash(state);
        self.object.index().hash(state);
        self.positive.hash(state);
        self.provenance.hash(state);
    }
}

impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Triple({}, {}, {}, positive = {}, inferred = {}, prediction = {})",
            self.subject.index(),
            self.predicate.index(),
            self.object.index(),
            self.positive,
            self.inferred(),
            self.prediction()
        )
    }
}
