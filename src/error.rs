//! Rich diagnostic error types for reldata.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]` derives,
//! providing error codes and help text. [`RelError`] ties them together for
//! operations that cross subsystem boundaries, such as adding an item to a
//! [`KnowledgeGraph`](crate::data::KnowledgeGraph) or reading one from disk.

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

use crate::context::ContextId;
use crate::data::Provenance;

/// Top-level error type for reldata.
///
/// Each variant wraps a subsystem-specific error, preserving the full diagnostic
/// chain (error codes, help text, sources) through to the user.
#[derive(Debug, Error, Diagnostic)]
pub enum RelError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Context(#[from] ContextError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Collection(#[from] CollectionError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Data(#[from] DataError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Factory(#[from] FactoryError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),
}

// ---------------------------------------------------------------------------
// Context errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ContextError {
    #[error("context key \"{key}\" does not hold a value of type {expected}")]
    #[diagnostic(
        code(reldata::context::type_mismatch),
        help(
            "Each key in a DataContext holds exactly one value type. \
             Read it back with the type it was stored with, or use a \
             different key for the new type."
        )
    )]
    TypeMismatch { key: String, expected: &'static str },

    #[error("context key \"{key}\" has never been set")]
    #[diagnostic(
        code(reldata::context::key_not_found),
        help("Set the key first, or use `get` to treat a missing key as `None`.")
    )]
    KeyNotFound { key: String },
}

// ---------------------------------------------------------------------------
// Collection errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum CollectionError {
    #[error("no element stored at index {index}")]
    #[diagnostic(
        code(reldata::collection::not_found),
        help(
            "The slot is either beyond the end of the collection or has been \
             vacated by a removal. Check `contains_index` before calling `get`."
        )
    )]
    NotFound { index: usize },

    #[error("{kind} {index} was created in {actual}, but this collection holds elements of {expected}")]
    #[diagnostic(
        code(reldata::collection::context_mismatch),
        help(
            "Indices are only unique within the context that allocated them. \
             Create all vocabulary items (and, separately, all individuals) of \
             one graph inside the same DataContext."
        )
    )]
    ContextMismatch {
        kind: &'static str,
        index: usize,
        expected: ContextId,
        actual: ContextId,
    },
}

pub type CollectionResult<T> = std::result::Result<T, CollectionError>;

// ---------------------------------------------------------------------------
// Data errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum DataError {
    #[error("{what} cannot be both inferred and a prediction")]
    #[diagnostic(
        code(reldata::data::conflicting_provenance),
        help(
            "A fact is either specified, inferred, or held out for prediction. \
             Set at most one of `inferred` and `prediction`."
        )
    )]
    ConflictingProvenance { what: &'static str },
}

// ---------------------------------------------------------------------------
// Factory errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum FactoryError {
    #[error("an individual named \"{name}\" already exists in {context}")]
    #[diagnostic(
        code(reldata::factory::name_collision),
        help(
            "Individual names are unique within a context. Choose another name, \
             build the second individual in a fresh DataContext, or disable the \
             check with `IndividualFactory::set_check_names(false)`."
        )
    )]
    NameCollision { name: String, context: ContextId },
}

// ---------------------------------------------------------------------------
// Format (persistence) errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum FormatError {
    #[error("I/O error on {path}")]
    #[diagnostic(
        code(reldata::format::io),
        help("Ensure the path exists and you have the required permissions.")
    )]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("not a directory: {path}")]
    #[diagnostic(
        code(reldata::format::not_a_directory),
        help("Pass the directory that contains the knowledge graph files.")
    )]
    NotADirectory { path: PathBuf },

    #[error("missing file: {path}")]
    #[diagnostic(
        code(reldata::format::missing_file),
        help(
            "A knowledge graph consists of vocabulary, individuals, and data files \
             sharing one base name. Run `reldata list` to see complete graphs."
        )
    )]
    MissingFile { path: PathBuf },

    #[error("{path}:{line}: {message}")]
    #[diagnostic(
        code(reldata::format::parse),
        help("The file does not follow the positional text encoding; fix or regenerate it.")
    )]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("literal value {value:?} contains a line break")]
    #[diagnostic(
        code(reldata::format::invalid_value),
        help("Literal values are stored one per line and must not contain '\\n' or '\\r'.")
    )]
    InvalidValue { value: String },

    #[error("{kind} {index} has name {name:?}, which cannot be stored on one listing line")]
    #[diagnostic(
        code(reldata::format::invalid_name),
        help(
            "Names must be non-empty, must not contain '\\n' or '\\r', and must not \
             start or end with whitespace."
        )
    )]
    InvalidName {
        kind: &'static str,
        index: usize,
        name: String,
    },

    #[error("individual {individual} is both a member and a non-member of class {class} ({provenance})")]
    #[diagnostic(
        code(reldata::format::conflicting_membership),
        help("A membership matrix holds one value per individual, class and provenance; drop one of the two facts.")
    )]
    ConflictingMembership {
        individual: usize,
        class: usize,
        provenance: Provenance,
    },

    #[error("sequence steps disagree on the name of {kind} {index}: \"{first}\" vs \"{second}\"")]
    #[diagnostic(
        code(reldata::format::inconsistent_sequence),
        help("All steps of a sequence share one vocabulary and one set of individuals.")
    )]
    InconsistentSequence {
        kind: &'static str,
        index: usize,
        first: String,
        second: String,
    },

    #[error("{kind} indices are not dense: {len} members spread over {slots} slots")]
    #[diagnostic(
        code(reldata::format::sparse_indices),
        help(
            "Listings are positional, so the line number is the index. \
             Rebuild the graph in a fresh context so indices run from 0 without gaps."
        )
    )]
    SparseIndices {
        kind: &'static str,
        len: usize,
        slots: usize,
    },

    #[error("cannot write an empty sequence")]
    #[diagnostic(
        code(reldata::format::empty_sequence),
        help("Provide at least one knowledge graph.")
    )]
    EmptySequence,
}

pub type FormatResult<T> = std::result::Result<T, FormatError>;

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("failed to read config: {path}")]
    #[diagnostic(
        code(reldata::config::read),
        help("Ensure the config file exists and is valid TOML.")
    )]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {path}: {message}")]
    #[diagnostic(
        code(reldata::config::parse),
        help("Check the TOML syntax and the field names in the config file.")
    )]
    Parse { path: PathBuf, message: String },

    #[error("failed to write config: {path}")]
    #[diagnostic(
        code(reldata::config::write),
        help("Ensure you have write permissions to the target directory.")
    )]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience alias used throughout reldata.
pub type RelResult<T> = std::result::Result<T, RelError>;
