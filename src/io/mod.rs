//! Positional text encoding of knowledge graphs.
//!
//! A graph named `base` in directory `dir` is stored as:
//!
//! - `base.classes`, `base.relations`, `base.literals`, `base.individuals`:
//!   listings of `"<index> <name>"` lines in index order;
//! - `base.classes.data[.inf|.pred]`: membership matrices, one row per
//!   individual and one column per class, with entries `1`, `-1` or `0`
//!   (unspecified);
//! - `base.literals.data[.inf|.pred]`: `"<individual> <literal> <value>"` lines;
//! - `base.relations.data[.inf|.pred]`: `"<+|-> <subject> <predicate> <object>"`
//!   lines.
//!
//! A sequence of graphs shares the four listings and appends `.<step>` to the
//! names of the data files, counting steps from 0. The `.pred` files are
//! optional when reading.

pub mod reader;
pub mod writer;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::data::Provenance;
use crate::error::{FormatError, FormatResult};

pub use reader::KgReader;
pub use writer::KgWriter;

pub const CLASSES_VOCAB_EXT: &str = ".classes";
pub const RELATIONS_VOCAB_EXT: &str = ".relations";
pub const LITERALS_VOCAB_EXT: &str = ".literals";
pub const INDIVIDUALS_SPEC_EXT: &str = ".individuals";

pub const CLASSES_SPEC_EXT: &str = ".classes.data";
pub const CLASSES_INF_EXT: &str = ".classes.data.inf";
pub const CLASSES_PRED_EXT: &str = ".classes.data.pred";
pub const LITERALS_SPEC_EXT: &str = ".literals.data";
pub const LITERALS_INF_EXT: &str = ".literals.data.inf";
pub const LITERALS_PRED_EXT: &str = ".literals.data.pred";
pub const RELATIONS_SPEC_EXT: &str = ".relations.data";
pub const RELATIONS_INF_EXT: &str = ".relations.data.inf";
pub const RELATIONS_PRED_EXT: &str = ".relations.data.pred";

/// Files every graph must have.
pub const MANDATORY_EXT: [&str; 10] = [
    CLASSES_VOCAB_EXT,
    RELATIONS_VOCAB_EXT,
    LITERALS_VOCAB_EXT,
    INDIVIDUALS_SPEC_EXT,
    CLASSES_SPEC_EXT,
    CLASSES_INF_EXT,
    LITERALS_SPEC_EXT,
    LITERALS_INF_EXT,
    RELATIONS_SPEC_EXT,
    RELATIONS_INF_EXT,
];

/// Prediction files, which older data sets lack.
pub const PREDICTION_EXT: [&str; 3] = [CLASSES_PRED_EXT, LITERALS_PRED_EXT, RELATIONS_PRED_EXT];

static GRAPH_FILE: LazyLock<Regex> = LazyLock::new(|| {
    let alternatives: Vec<String> = MANDATORY_EXT
        .iter()
        .chain(PREDICTION_EXT.iter())
        .map(|ext| regex::escape(&ext[1..]))
        .collect();
    Regex::new(&format!(r"^(?P<base_name>.+)\.(?:{})$", alternatives.join("|")))
        .expect("graph file pattern is valid")
});

static SEQUENCE_FILE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<base_name>.+)\.(?:classes|literals|relations)\.data(?:\.inf|\.pred)?\.\d+$")
        .expect("sequence file pattern is valid")
});

/// Data files of one graph, or of one step of a sequence.
#[derive(Debug, Clone)]
pub struct DataFiles {
    pub classes: [PathBuf; 3],
    pub literals: [PathBuf; 3],
    pub relations: [PathBuf; 3],
}

/// All files making up a graph (or one sequence step).
#[derive(Debug, Clone)]
pub struct KgFiles {
    pub classes_vocab: PathBuf,
    pub relations_vocab: PathBuf,
    pub literals_vocab: PathBuf,
    pub individuals: PathBuf,
    pub data: DataFiles,
}

/// Position of each provenance in the `[spec, inf, pred]` file triples.
pub(crate) const PROVENANCES: [Provenance; 3] = [Provenance::Specified, Provenance::Inferred, Provenance::Prediction];

impl KgFiles {
    /// Paths for `base_name` in `dir`; `step` selects a sequence element.
    pub fn new(dir: &Path, base_name: &str, step: Option<usize>) -> Self {
        let plain = |ext: &str| dir.join(format!("{base_name}{ext}"));
        let data = |ext: &str| match step {
            Some(step) => dir.join(format!("{base_name}{ext}.{step}")),
            None => plain(ext),
        };
        Self {
            classes_vocab: plain(CLASSES_VOCAB_EXT),
            relations_vocab: plain(RELATIONS_VOCAB_EXT),
            literals_vocab: plain(LITERALS_VOCAB_EXT),
            individuals: plain(INDIVIDUALS_SPEC_EXT),
            data: DataFiles {
                classes: [data(CLASSES_SPEC_EXT), data(CLASSES_INF_EXT), data(CLASSES_PRED_EXT)],
                literals: [data(LITERALS_SPEC_EXT), data(LITERALS_INF_EXT), data(LITERALS_PRED_EXT)],
                relations: [
                    data(RELATIONS_SPEC_EXT),
                    data(RELATIONS_INF_EXT),
                    data(RELATIONS_PRED_EXT),
                ],
            },
        }
    }

    /// Files that must exist for the graph to be readable.
    pub fn mandatory(&self) -> Vec<&Path> {
        let mut paths = vec![
            self.classes_vocab.as_path(),
            self.relations_vocab.as_path(),
            self.literals_vocab.as_path(),
            self.individuals.as_path(),
        ];
        paths.extend(self.data.mandatory());
        paths
    }

    /// The first missing mandatory file, as an error.
    pub fn ensure_complete(&self) -> FormatResult<()> {
        match self.mandatory().into_iter().find(|p| !p.is_file()) {
            Some(path) => Err(FormatError::MissingFile {
                path: path.to_path_buf(),
            }),
            None => Ok(()),
        }
    }
}

impl DataFiles {
    /// Specified and inferred files of each kind.
    pub fn mandatory(&self) -> Vec<&Path> {
        [&self.classes, &self.literals, &self.relations]
            .into_iter()
            .flat_map(|files| files[..2].iter().map(PathBuf::as_path))
            .collect()
    }

    pub fn exist(&self) -> bool {
        self.mandatory().iter().all(|p| p.is_file())
    }
}

fn file_names(dir: &Path) -> FormatResult<Vec<String>> {
    if !dir.is_dir() {
        return Err(FormatError::NotADirectory {
            path: dir.to_path_buf(),
        });
    }
    let entries = std::fs::read_dir(dir).map_err(|source| FormatError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| FormatError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        if let Some(name) = entry.file_name().to_str() {
            names.push(name.to_string());
        }
    }
    Ok(names)
}

/// Base names of all complete graphs in `dir`, sorted.
pub fn find_knowledge_graphs(dir: impl AsRef<Path>) -> FormatResult<Vec<String>> {
    let dir = dir.as_ref();
    let candidates: BTreeSet<String> = file_names(dir)?
        .iter()
        .filter_map(|name| GRAPH_FILE.captures(name))
        .map(|caps| caps["base_name"].to_string())
        .collect();
    let found: Vec<String> = candidates
        .into_iter()
        .filter(|base| KgFiles::new(dir, base, None).ensure_complete().is_ok())
        .collect();
    tracing::debug!(dir = %dir.display(), count = found.len(), "found knowledge graphs");
    Ok(found)
}

/// Base names of all graph sequences in `dir` with at least step 0, sorted.
pub fn find_sequences(dir: impl AsRef<Path>) -> FormatResult<Vec<String>> {
    let dir = dir.as_ref();
    let candidates: BTreeSet<String> = file_names(dir)?
        .iter()
        .filter_map(|name| SEQUENCE_FILE.captures(name))
        .map(|caps| caps["base_name"].to_string())
        .collect();
    let found: Vec<String> = candidates
        .into_iter()
        .filter(|base| KgFiles::new(dir, base, Some(0)).ensure_complete().is_ok())
        .collect();
    tracing::debug!(dir = %dir.display(), count = found.len(), "found graph sequences");
    Ok(found)
}

/// Number of consecutive steps, from 0, whose data files all exist.
pub fn sequence_length(dir: impl AsRef<Path>, base_name: &str) -> usize {
    let dir = dir.as_ref();
    (0..)
        .take_while(|&step| KgFiles::new(dir, base_name, Some(step)).data.exist())
        .count()
}
