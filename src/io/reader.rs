//! Loading knowledge graphs from the positional text encoding.

use std::path::Path;
use std::sync::LazyLock;

use rayon::prelude::*;
use regex::Regex;

use crate::context::DataContext;
use crate::data::{
    ClassMembership, IndividualFactory, IndividualRef, KnowledgeGraph, LiteralValue, Provenance, Triple,
};
use crate::error::{FormatError, FormatResult, RelResult};
use crate::io::{DataFiles, KgFiles, PROVENANCES, find_knowledge_graphs, find_sequences, sequence_length};
use crate::vocab::{ClassType, ClassTypeFactory, LiteralType, LiteralTypeFactory, RelationType, RelationTypeFactory};

static LISTING_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?P<index>\d+)\s+(?P<name>\S(?:.*\S)?)\s*$").expect("listing pattern is valid")
});

static LITERAL_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?P<individual>\d+)\s+(?P<literal>\d+)(?: (?P<value>.*))?$").expect("literal pattern is valid")
});

static TRIPLE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?P<sign>[+-])\s*(?P<subject>\d+)\s+(?P<predicate>\d+)\s+(?P<object>\d+)\s*$")
        .expect("triple pattern is valid")
});

fn read_text(path: &Path) -> FormatResult<String> {
    std::fs::read_to_string(path).map_err(|source| FormatError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_error(path: &Path, line: usize, message: impl Into<String>) -> FormatError {
    FormatError::Parse {
        path: path.to_path_buf(),
        line,
        message: message.into(),
    }
}

/// Lines with 1-based numbers and without a trailing carriage return.
fn numbered_lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.strip_suffix('\r').unwrap_or(line)))
}

fn parse_index(path: &Path, line: usize, digits: &str) -> FormatResult<usize> {
    digits
        .parse()
        .map_err(|_| parse_error(path, line, format!("index {digits} is out of range")))
}

/// Names of an `"<index> <name>"` listing, checking that indices count up from 0.
fn read_listing(path: &Path) -> FormatResult<Vec<String>> {
    let text = read_text(path)?;
    let mut names = Vec::new();
    for (line_no, line) in numbered_lines(&text) {
        if line.trim().is_empty() {
            continue;
        }
        let caps = LISTING_LINE
            .captures(line)
            .ok_or_else(|| parse_error(path, line_no, format!("expected \"<index> <name>\", found {line:?}")))?;
        let index = parse_index(path, line_no, &caps["index"])?;
        if index != names.len() {
            return Err(parse_error(
                path,
                line_no,
                format!("expected index {}, found {index}", names.len()),
            ));
        }
        names.push(caps["name"].to_string());
    }
    Ok(names)
}

struct Vocabulary {
    classes: Vec<ClassType>,
    relations: Vec<RelationType>,
    literals: Vec<LiteralType>,
}

impl Vocabulary {
    fn read(files: &KgFiles, ctx: &DataContext) -> RelResult<Self> {
        let classes = read_listing(&files.classes_vocab)?
            .into_iter()
            .map(|name| ClassTypeFactory::create_in(ctx, name))
            .collect::<RelResult<_>>()?;
        let relations = read_listing(&files.relations_vocab)?
            .into_iter()
            .map(|name| RelationTypeFactory::create_in(ctx, name))
            .collect::<RelResult<_>>()?;
        let literals = read_listing(&files.literals_vocab)?
            .into_iter()
            .map(|name| LiteralTypeFactory::create_in(ctx, name))
            .collect::<RelResult<_>>()?;
        Ok(Self {
            classes,
            relations,
            literals,
        })
    }
}

fn create_individuals(names: &[String], ctx: &DataContext) -> RelResult<Vec<IndividualRef>> {
    names
        .iter()
        .map(|name| IndividualFactory::create_in(ctx, name.as_str()))
        .collect()
}

fn lookup<'a, T>(items: &'a [T], kind: &str, index: usize, path: &Path, line: usize) -> FormatResult<&'a T> {
    items
        .get(index)
        .ok_or_else(|| parse_error(path, line, format!("unknown {kind} {index}")))
}

/// One graph being filled from its data files.
struct Loader<'a> {
    kg: KnowledgeGraph,
    vocab: &'a Vocabulary,
    individuals: &'a [IndividualRef],
}

impl<'a> Loader<'a> {
    fn new(vocab: &'a Vocabulary, individuals: &'a [IndividualRef]) -> RelResult<Self> {
        let kg = KnowledgeGraph::new();
        kg.classes().add_all(vocab.classes.iter().cloned())?;
        kg.relations().add_all(vocab.relations.iter().cloned())?;
        kg.literals().add_all(vocab.literals.iter().cloned())?;
        kg.individuals().add_all(individuals.iter().cloned())?;
        Ok(Self { kg, vocab, individuals })
    }

    fn load(self, data: &DataFiles) -> RelResult<KnowledgeGraph> {
        for (slot, provenance) in PROVENANCES.into_iter().enumerate() {
            // only prediction files may be absent
            let wanted = |path: &Path| !provenance.is_prediction() || path.is_file();
            if wanted(&data.classes[slot]) {
                self.load_memberships(&data.classes[slot], provenance)?;
            }
            if wanted(&data.literals[slot]) {
                self.load_literals(&data.literals[slot], provenance)?;
            }
            if wanted(&data.relations[slot]) {
                self.load_triples(&data.relations[slot], provenance)?;
            }
        }
        Ok(self.kg)
    }

    fn load_memberships(&self, path: &Path, provenance: Provenance) -> RelResult<()> {
        let text = read_text(path)?;
        for (line_no, line) in numbered_lines(&text) {
            let row = line_no - 1;
            let values: Vec<&str> = line.split_whitespace().collect();
            if values.is_empty() {
                continue;
            }
            let individual = lookup(self.individuals, "individual", row, path, line_no)?;
            if values.len() > self.vocab.classes.len() {
                return Err(parse_error(
                    path,
                    line_no,
                    format!("{} columns for {} classes", values.len(), self.vocab.classes.len()),
                )
                .into());
            }
            for (column, value) in values.into_iter().enumerate() {
                let is_member = match value {
                    "0" => continue,
                    "1" => true,
                    "-1" => false,
                    other => {
                        return Err(
                            parse_error(path, line_no, format!("membership must be 1, -1 or 0, found {other:?}")).into(),
                        );
                    }
                };
                let cls = self.vocab.classes[column].clone();
                individual
                    .classes()
                    .add(ClassMembership::new(cls, is_member, provenance))?;
            }
        }
        Ok(())
    }

    fn load_literals(&self, path: &Path, provenance: Provenance) -> RelResult<()> {
        let text = read_text(path)?;
        for (line_no, line) in numbered_lines(&text) {
            if line.trim().is_empty() {
                continue;
            }
            let caps = LITERAL_LINE.captures(line).ok_or_else(|| {
                parse_error(path, line_no, format!("expected \"<individual> <literal> <value>\", found {line:?}"))
            })?;
            let individual = lookup(
                self.individuals,
                "individual",
                parse_index(path, line_no, &caps["individual"])?,
                path,
                line_no,
            )?;
            let literal = lookup(
                &self.vocab.literals,
                "literal",
                parse_index(path, line_no, &caps["literal"])?,
                path,
                line_no,
            )?;
            let value = caps.name("value").map_or("", |m| m.as_str());
            individual
                .literals()
                .add(LiteralValue::new(literal.clone(), value, provenance))?;
        }
        Ok(())
    }

    fn load_triples(&self, path: &Path, provenance: Provenance) -> RelResult<()> {
        let text = read_text(path)?;
        for (line_no, line) in numbered_lines(&text) {
            if line.trim().is_empty() {
                continue;
            }
            let caps = TRIPLE_LINE.captures(line).ok_or_else(|| {
                parse_error(
                    path,
                    line_no,
                    format!("expected \"<+|-> <subject> <predicate> <object>\", found {line:?}"),
                )
            })?;
            let index = |name: &str| parse_index(path, line_no, &caps[name]);
            let subject = lookup(self.individuals, "individual", index("subject")?, path, line_no)?;
            let predicate = lookup(&self.vocab.relations, "relation", index("predicate")?, path, line_no)?;
            let object = lookup(self.individuals, "individual", index("object")?, path, line_no)?;
            self.kg.triples().add(Triple::new(
                subject.clone(),
                predicate.clone(),
                object.clone(),
                &caps["sign"] == "+",
                provenance,
            ))?;
        }
        Ok(())
    }
}

/// Reads knowledge graphs and sequences of knowledge graphs.
///
/// Every graph is built in a fresh [`DataContext`], so reading never
/// disturbs the numbering of the caller's context.
#[derive(Debug, Clone)]
pub struct KgReader {
    parallel: bool,
}

impl Default for KgReader {
    fn default() -> Self {
        Self { parallel: true }
    }
}

impl KgReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load several graphs, or several sequence steps, on the rayon pool.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Read the graph `base_name` from `dir`.
    pub fn read(&self, dir: impl AsRef<Path>, base_name: &str) -> RelResult<KnowledgeGraph> {
        let dir = dir.as_ref();
        let files = KgFiles::new(dir, base_name, None);
        files.ensure_complete()?;

        let ctx = DataContext::new();
        let vocab = Vocabulary::read(&files, &ctx)?;
        let individuals = create_individuals(&read_listing(&files.individuals)?, &ctx)?;
        let kg = Loader::new(&vocab, &individuals)?.load(&files.data)?;
        tracing::info!(
            dir = %dir.display(),
            base_name,
            individuals = kg.individuals().len(),
            triples = kg.triples().len(),
            "read knowledge graph"
        );
        Ok(kg)
    }

    /// Read every step of the sequence `base_name` from `dir`.
    ///
    /// All steps share one set of vocabulary items. Each step gets its own
    /// individuals, created from the shared listing in a context of their own.
    pub fn read_sequence(&self, dir: impl AsRef<Path>, base_name: &str) -> RelResult<Vec<KnowledgeGraph>> {
        let dir = dir.as_ref();
        let first = KgFiles::new(dir, base_name, Some(0));
        first.ensure_complete()?;

        let vocab = Vocabulary::read(&first, &DataContext::new())?;
        let names = read_listing(&first.individuals)?;
        let length = sequence_length(dir, base_name);

        let read_step = |step: usize| -> RelResult<KnowledgeGraph> {
            let individuals = create_individuals(&names, &DataContext::new())?;
            let data = KgFiles::new(dir, base_name, Some(step)).data;
            Loader::new(&vocab, &individuals)?.load(&data)
        };
        let steps: Vec<KnowledgeGraph> = if self.parallel {
            (0..length).into_par_iter().map(read_step).collect::<RelResult<_>>()?
        } else {
            (0..length).map(read_step).collect::<RelResult<_>>()?
        };
        tracing::info!(dir = %dir.display(), base_name, steps = steps.len(), "read graph sequence");
        Ok(steps)
    }

    /// Read every complete graph in `dir`, sorted by base name.
    pub fn read_all(&self, dir: impl AsRef<Path>) -> RelResult<Vec<(String, KnowledgeGraph)>> {
        let dir = dir.as_ref();
        let names = find_knowledge_graphs(dir)?;
        self.each(names, |name| self.read(dir, name))
    }

    /// Read every graph sequence in `dir`, sorted by base name.
    pub fn read_all_sequences(&self, dir: impl AsRef<Path>) -> RelResult<Vec<(String, Vec<KnowledgeGraph>)>> {
        let dir = dir.as_ref();
        let names = find_sequences(dir)?;
        self.each(names, |name| self.read_sequence(dir, name))
    }

    fn each<T, F>(&self, names: Vec<String>, read: F) -> RelResult<Vec<(String, T)>>
    where
        T: Send,
        F: Fn(&str) -> RelResult<T> + Sync,
    {
        let read_named = |name: String| read(&name).map(|value| (name, value));
        if self.parallel {
            names.into_par_iter().map(read_named).collect()
        } else {
            names.into_iter().map(read_named).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RelError;

    fn write_files(dir: &Path, base: &str, files: &[(&str, &str)]) {
        for (ext, content) in files {
            std::fs::write(dir.join(format!("{base}{ext}")), content).unwrap();
        }
    }

    fn small_graph(dir: &Path) {
        write_files(
            dir,
            "kg",
            &[
                (".classes", "0 Person\n1 Robot\n"),
                (".relations", "0 knows\n"),
                (".literals", "0 age\n"),
                (".individuals", "0 alice\n1 bob\n"),
                (".classes.data", "1 -1\n0 0\n"),
                (".classes.data.inf", "0 0\n1 0\n"),
                (".literals.data", "0 0 32 years\n"),
                (".literals.data.inf", ""),
                (".relations.data", "+ 0 0 1\n- 1 0 0\n"),
                (".relations.data.inf", "+ 1 0 1\n"),
            ],
        );
    }

    #[test]
    fn reads_a_graph_without_prediction_files() {
        let dir = tempfile::TempDir::new().unwrap();
        small_graph(dir.path());

        let kg = KgReader::new().read(dir.path(), "kg").unwrap();
        assert_eq!(kg.classes().len(), 2);
        assert_eq!(kg.individuals().len(), 2);
        assert_eq!(kg.triples().len(), 3);

        let alice = kg.individuals().get(0).unwrap();
        assert_eq!(alice.name(), "alice");
        assert_eq!(alice.classes().len(), 2);
        let age = alice.literals().to_vec();
        assert_eq!(age[0].value(), "32 years");

        let bob = kg.individuals().get(1).unwrap();
        let inferred = bob.classes().to_vec();
        assert_eq!(inferred.len(), 1);
        assert!(inferred[0].inferred() && inferred[0].is_member());
        assert_eq!(kg.triples().iter().filter(|t| t.inferred()).count(), 1);
    }

    #[test]
    fn reading_leaves_the_callers_numbering_alone() {
        let dir = tempfile::TempDir::new().unwrap();
        small_graph(dir.path());
        DataContext::scoped(|| {
            KgReader::new().read(dir.path(), "kg").unwrap();
            assert_eq!(ClassTypeFactory::create("next").unwrap().index(), 0);
        });
    }

    #[test]
    fn out_of_order_listing_is_a_parse_error() {
        let dir = tempfile::TempDir::new().unwrap();
        small_graph(dir.path());
        write_files(dir.path(), "kg", &[(".classes", "0 Person\n2 Robot\n")]);

        let err = KgReader::new().read(dir.path(), "kg").unwrap_err();
        assert!(matches!(err, RelError::Format(FormatError::Parse { line: 2, .. })));
    }

    #[test]
    fn unknown_reference_is_a_parse_error() {
        let dir = tempfile::TempDir::new().unwrap();
        small_graph(dir.path());
        write_files(dir.path(), "kg", &[(".relations.data", "+ 0 3 1\n")]);

        let err = KgReader::new().read(dir.path(), "kg").unwrap_err();
        match err {
            RelError::Format(FormatError::Parse { message, .. }) => assert!(message.contains("relation 3")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn bad_membership_value_is_a_parse_error() {
        let dir = tempfile::TempDir::new().unwrap();
        small_graph(dir.path());
        write_files(dir.path(), "kg", &[(".classes.data", "1 2\n")]);
        assert!(KgReader::new().read(dir.path(), "kg").is_err());
    }

    #[test]
    fn missing_file_is_reported() {
        let dir = tempfile::TempDir::new().unwrap();
        small_graph(dir.path());
        std::fs::remove_file(dir.path().join("kg.literals.data.inf")).unwrap();

        let err = KgReader::new().read(dir.path(), "kg").unwrap_err();
        assert!(matches!(err, RelError::Format(FormatError::MissingFile { .. })));
    }

    #[test]
    fn windows_line_endings_are_accepted() {
        let dir = tempfile::TempDir::new().unwrap();
        small_graph(dir.path());
        write_files(dir.path(), "kg", &[(".individuals", "0 alice\r\n1 bob\r\n")]);

        let kg = KgReader::new().read(dir.path(), "kg").unwrap();
        assert_eq!(kg.individuals().get(1).unwrap().name(), "bob");
    }
}
