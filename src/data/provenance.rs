//! Provenance-tagged facts: class memberships and literal values.
//!
//! Every fact is either specified (ground truth), inferred (derivable from
//! other facts), or a prediction target (held out). [`Provenance`] makes the
//! three cases mutually exclusive by construction; the flag-based
//! constructors reject the one invalid combination.

use std::fmt;

use crate::error::DataError;
use crate::vocab::{ClassType, LiteralType};

/// Where a fact comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Provenance {
    /// A ground-truth fact.
    #[default]
    Specified,
    /// A fact derivable from the specified ones.
    Inferred,
    /// A held-out fact to be predicted.
    Prediction,
}

impl Provenance {
    /// Map the `(inferred, prediction)` flag pair to a provenance.
    ///
    /// Both flags set is a [`DataError::ConflictingProvenance`] about `what`.
    pub fn from_flags(inferred: bool, prediction: bool, what: &'static str) -> Result<Self, DataError> {
        match (inferred, prediction) {
            (false, false) => Ok(Provenance::Specified),
            (true, false) => Ok(Provenance::Inferred),
            (false, true) => Ok(Provenance::Prediction),
            (true, true) => Err(DataError::ConflictingProvenance { what }),
        }
    }

    pub fn is_specified(self) -> bool {
        self == Provenance::Specified
    }

    pub fn is_inferred(self) -> bool {
        self == Provenance::Inferred
    }

    pub fn is_prediction(self) -> bool {
        self == Provenance::Prediction
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provenance::Specified => write!(f, "specified"),
            Provenance::Inferred => write!(f, "inferred"),
            Provenance::Prediction => write!(f, "prediction"),
        }
    }
}

// ---------------------------------------------------------------------------
// ClassMembership
// ---------------------------------------------------------------------------

/// States that an individual is (or is not) a member of a class.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClassMembership {
    cls: ClassType,
    is_member: bool,
    provenance: Provenance,
}

impl ClassMembership {
    pub fn new(cls: ClassType, is_member: bool, provenance: Provenance) -> Self {
        Self {
            cls,
            is_member,
            provenance,
        }
    }

    /// A specified membership.
    pub fn specified(cls: ClassType, is_member: bool) -> Self {
        Self::new(cls, is_member, Provenance::Specified)
    }

    pub fn from_flags(
        cls: ClassType,
        is_member: bool,
        inferred: bool,
        prediction: bool,
    ) -> Result<Self, DataError> {
        let provenance = Provenance::from_flags(inferred, prediction, "class membership")?;
        Ok(Self::new(cls, is_member, provenance))
    }

    pub fn cls(&self) -> &ClassType {
        &self.cls
    }

    pub fn is_member(&self) -> bool {
        self.is_member
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
}

impl fmt::Display for ClassMembership {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ClassMembership(cls = {}, inferred = {}, is_member = {}, prediction = {})",
            self.cls.index(),
            self.inferred(),
            self.is_member,
            self.prediction()
        )
    }
}

// ---------------------------------------------------------------------------
// LiteralValue
// ---------------------------------------------------------------------------

/// The value of a literal type for one individual.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LiteralValue {
    literal: LiteralType,
    value: String,
    provenance: Provenance,
}

impl LiteralValue {
    pub fn new(literal: LiteralType, value: impl Into<String>, provenance: Provenance) -> Self {
        Self {
            literal,
            value: value.into(),
            provenance,
        }
    }

    pub fn specified(literal: LiteralType, value: impl Into<String>) -> Self {
        Self::new(literal, value, Provenance::Specified)
    }

    pub fn from_flags(
        literal: LiteralType,
        value: impl Into<String>,
        inferred: bool,
        prediction: bool,
    ) -> Result<Self, DataError> {
        let provenance = Provenance::from_flags(inferred, prediction, "literal value")?;
        Ok(Self::new(literal, value, provenance))
    }

    pub fn literal(&self) -> &LiteralType {
        &self.literal
    }

    pub fn value(&self) -> &str {
        &self.value
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
}

impl fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "LiteralValue(literal = {}, value = {}, inferred = {}, prediction = {})",
            self.literal.index(),
            self.value,
            self.inferred(),
            self.prediction()
        )
    }
}
