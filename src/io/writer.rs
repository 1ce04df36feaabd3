//! Storing knowledge graphs in the positional text encoding.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use crate::data::{KnowledgeGraph, Provenance};
use crate::error::{FormatError, FormatResult, RelResult};
use crate::io::{DataFiles, KgFiles, PROVENANCES};

/// Writes knowledge graphs and sequences of knowledge graphs.
///
/// Listings are positional, so every kind of vocabulary item and the
/// individuals must be numbered densely from 0 (as they are when a graph is
/// built in a fresh context). Existing files are overwritten.
#[derive(Debug, Clone, Copy, Default)]
pub struct KgWriter;

/// Names by index, as they go into the four listing files.
struct Listings {
    classes: Vec<String>,
    relations: Vec<String>,
    literals: Vec<String>,
    individuals: Vec<String>,
}

impl Listings {
    fn of(graphs: &[KnowledgeGraph]) -> FormatResult<Self> {
        Ok(Self {
            classes: merge(
                "class",
                graphs
                    .iter()
                    .flat_map(|kg| kg.classes().iter().map(|c| (c.index(), c.name().to_string()))),
            )?,
            relations: merge(
                "relation",
                graphs
                    .iter()
                    .flat_map(|kg| kg.relations().iter().map(|r| (r.index(), r.name().to_string()))),
            )?,
            literals: merge(
                "literal",
                graphs
                    .iter()
                    .flat_map(|kg| kg.literals().iter().map(|l| (l.index(), l.name().to_string()))),
            )?,
            individuals: merge(
                "individual",
                graphs
                    .iter()
                    .flat_map(|kg| kg.individuals().iter().map(|i| (i.index(), i.name().to_string()))),
            )?,
        })
    }
}

/// Union of `(index, name)` pairs, which must agree per index and cover
/// `0..n` without gaps.
fn merge(kind: &'static str, entries: impl IntoIterator<Item = (usize, String)>) -> FormatResult<Vec<String>> {
    let mut names: BTreeMap<usize, String> = BTreeMap::new();
    for (index, name) in entries {
        if !storable_name(&name) {
            return Err(FormatError::InvalidName { kind, index, name });
        }
        match names.entry(index) {
            Entry::Vacant(slot) => {
                slot.insert(name);
            }
            Entry::Occupied(slot) if *slot.get() != name => {
                return Err(FormatError::InconsistentSequence {
                    kind,
                    index,
                    first: slot.get().clone(),
                    second: name,
                });
            }
            Entry::Occupied(_) => {}
        }
    }
    let slots = names.keys().next_back().map_or(0, |last| last + 1);
    if slots != names.len() {
        return Err(FormatError::SparseIndices {
            kind,
            len: names.len(),
            slots,
        });
    }
    Ok(names.into_values().collect())
}

/// Whether `name` survives a listing line unchanged.
fn storable_name(name: &str) -> bool {
    !name.is_empty() && !name.contains(['\n', '\r']) && name.trim() == name
}

fn listing(names: &[String]) -> String {
    let mut out = String::new();
    for (index, name) in names.iter().enumerate() {
        let _ = writeln!(out, "{index} {name}");
    }
    out
}

fn ensure_dir(dir: &Path) -> FormatResult<()> {
    if dir.is_dir() {
        Ok(())
    } else {
        Err(FormatError::NotADirectory {
            path: dir.to_path_buf(),
        })
    }
}

/// Membership matrix rows for one provenance: one row per individual, one
/// column per class. A cell holds a single value, so `+C` and `-C` under the
/// same provenance cannot both be stored.
fn memberships(kg: &KnowledgeGraph, num_classes: usize, provenance: Provenance) -> FormatResult<String> {
    let mut out = String::new();
    for individual in kg.individuals().iter() {
        let mut row = vec!["0"; num_classes];
        for membership in individual.classes().iter() {
            if membership.provenance() != provenance {
                continue;
            }
            let class = membership.cls().index();
            if let Some(cell) = row.get_mut(class) {
                if *cell != "0" {
                    return Err(FormatError::ConflictingMembership {
                        individual: individual.index(),
                        class,
                        provenance,
                    });
                }
                *cell = if membership.is_member() { "1" } else { "-1" };
            }
        }
        out.push_str(&row.join(" "));
        out.push('\n');
    }
    Ok(out)
}

fn literals(kg: &KnowledgeGraph, provenance: Provenance) -> FormatResult<String> {
    let mut out = String::new();
    for individual in kg.individuals().iter() {
        for value in individual.literals().iter() {
            if value.provenance() != provenance {
                continue;
            }
            if value.value().contains(['\n', '\r']) {
                return Err(FormatError::InvalidValue {
                    value: value.value().to_string(),
                });
            }
            let _ = writeln!(out, "{} {} {}", individual.index(), value.literal().index(), value.value());
        }
    }
    Ok(out)
}

fn triples(kg: &KnowledgeGraph, provenance: Provenance) -> String {
    let mut out = String::new();
    for triple in kg.triples().iter() {
        if triple.provenance() != provenance {
            continue;
        }
        let _ = writeln!(
            out,
            "{} {} {} {}",
            if triple.positive() { '+' } else { '-' },
            triple.subject().index(),
            triple.predicate().index(),
            triple.object().index()
        );
    }
    out
}

/// Rendered files, written in one go once rendering has succeeded.
#[derive(Default)]
struct Output(Vec<(PathBuf, String)>);

impl Output {
    fn push(&mut self, path: &Path, content: String) {
        self.0.push((path.to_path_buf(), content));
    }

    fn listings(&mut self, listings: &Listings, files: &KgFiles) {
        self.push(&files.classes_vocab, listing(&listings.classes));
        self.push(&files.relations_vocab, listing(&listings.relations));
        self.push(&files.literals_vocab, listing(&listings.literals));
        self.push(&files.individuals, listing(&listings.individuals));
    }

    fn data(&mut self, kg: &KnowledgeGraph, num_classes: usize, files: &DataFiles) -> FormatResult<()> {
        for (slot, provenance) in PROVENANCES.into_iter().enumerate() {
            self.push(&files.classes[slot], memberships(kg, num_classes, provenance)?);
            self.push(&files.literals[slot], literals(kg, provenance)?);
            self.push(&files.relations[slot], triples(kg, provenance));
        }
        Ok(())
    }

    fn flush(self) -> FormatResult<()> {
        for (path, content) in &self.0 {
            std::fs::write(path, content).map_err(|source| FormatError::Io {
                path: path.clone(),
                source,
            })?;
        }
        Ok(())
    }
}

impl KgWriter {
    /// Write `kg` to `dir` under `base_name`.
    pub fn write(kg: &KnowledgeGraph, dir: impl AsRef<Path>, base_name: &str) -> RelResult<()> {
        let dir = dir.as_ref();
        ensure_dir(dir)?;
        let files = KgFiles::new(dir, base_name, None);
        let listings = Listings::of(std::slice::from_ref(kg))?;

        let mut output = Output::default();
        output.listings(&listings, &files);
        output.data(kg, listings.classes.len(), &files.data)?;
        output.flush()?;
        tracing::info!(dir = %dir.display(), base_name, "wrote knowledge graph");
        Ok(())
    }

    /// Write a sequence of graphs that share vocabulary and individuals.
    ///
    /// The listings are the union over all steps; a name that differs between
    /// steps for the same index is an error.
    pub fn write_sequence(graphs: &[KnowledgeGraph], dir: impl AsRef<Path>, base_name: &str) -> RelResult<()> {
        let dir = dir.as_ref();
        ensure_dir(dir)?;
        if graphs.is_empty() {
            return Err(FormatError::EmptySequence.into());
        }
        let listings = Listings::of(graphs)?;

        let mut output = Output::default();
        output.listings(&listings, &KgFiles::new(dir, base_name, None));
        for (step, kg) in graphs.iter().enumerate() {
            let files = KgFiles::new(dir, base_name, Some(step));
            output.data(kg, listings.classes.len(), &files.data)?;
        }
        output.flush()?;
        tracing::info!(dir = %dir.display(), base_name, steps = graphs.len(), "wrote graph sequence");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::DataContext;
    use crate::data::{ClassMembership, IndividualFactory, LiteralValue, Triple};
    use crate::error::RelError;
    use crate::vocab::{ClassTypeFactory, LiteralTypeFactory, RelationTypeFactory};

    fn read(dir: &Path, name: &str) -> String {
        std::fs::read_to_string(dir.join(name)).unwrap()
    }

    #[test]
    fn writes_the_documented_line_formats() {
        let dir = tempfile::TempDir::new().unwrap();
        DataContext::scoped(|| {
            let classes = ClassTypeFactory::create_all(["A", "B", "C"]).unwrap();
            let knows = RelationTypeFactory::create("knows").unwrap();
            let age = LiteralTypeFactory::create("age").unwrap();
            let x = IndividualFactory::create("x").unwrap();
            let y = IndividualFactory::create("y").unwrap();
            x.classes().add(ClassMembership::specified(classes[0].clone(), true)).unwrap();
            x.classes().add(ClassMembership::specified(classes[2].clone(), false)).unwrap();
            y.classes()
                .add(ClassMembership::new(classes[1].clone(), true, Provenance::Prediction))
                .unwrap();
            x.literals().add(LiteralValue::specified(age.clone(), "7 3/4")).unwrap();

            let kg = KnowledgeGraph::new();
            kg.classes().add_all(classes).unwrap();
            kg.add(Triple::fact(x.clone(), knows.clone(), y.clone(), true)).unwrap();
            kg.add(Triple::new(y, knows, x, false, Provenance::Inferred)).unwrap();
            KgWriter::write(&kg, dir.path(), "kg").unwrap();
        });

        assert_eq!(read(dir.path(), "kg.classes"), "0 A\n1 B\n2 C\n");
        assert_eq!(read(dir.path(), "kg.individuals"), "0 x\n1 y\n");
        assert_eq!(read(dir.path(), "kg.classes.data"), "1 0 -1\n0 0 0\n");
        assert_eq!(read(dir.path(), "kg.classes.data.pred"), "0 0 0\n0 1 0\n");
        assert_eq!(read(dir.path(), "kg.literals.data"), "0 0 7 3/4\n");
        assert_eq!(read(dir.path(), "kg.relations.data"), "+ 0 0 1\n");
        assert_eq!(read(dir.path(), "kg.relations.data.inf"), "- 1 0 0\n");
        assert_eq!(read(dir.path(), "kg.relations.data.pred"), "");
    }

    #[test]
    fn sparse_vocabulary_is_rejected() {
        let dir = tempfile::TempDir::new().unwrap();
        DataContext::scoped(|| {
            let classes = ClassTypeFactory::create_all(["unused", "used"]).unwrap();
            let kg = KnowledgeGraph::new();
            kg.add(classes[1].clone()).unwrap();
            let err = KgWriter::write(&kg, dir.path(), "kg").unwrap_err();
            assert!(matches!(
                err,
                RelError::Format(FormatError::SparseIndices {
                    kind: "class",
                    len: 1,
                    slots: 2
                })
            ));
        });
    }

    #[test]
    fn line_breaks_in_values_are_rejected() {
        let dir = tempfile::TempDir::new().unwrap();
        DataContext::scoped(|| {
            let note = LiteralTypeFactory::create("note").unwrap();
            let x = IndividualFactory::create("x").unwrap();
            x.literals().add(LiteralValue::specified(note, "two\nlines")).unwrap();
            let kg = KnowledgeGraph::new();
            kg.add(x).unwrap();
            let err = KgWriter::write(&kg, dir.path(), "kg").unwrap_err();
            assert!(matches!(err, RelError::Format(FormatError::InvalidValue { .. })));
        });
    }

    #[test]
    fn names_that_do_not_fit_a_listing_line_are_rejected() {
        for bad in ["", "two\nlines", "cr\r", " padded", "padded\t"] {
            let dir = tempfile::TempDir::new().unwrap();
            let err = DataContext::scoped(|| {
                let kg = KnowledgeGraph::new();
                kg.add(IndividualFactory::create(bad).unwrap()).unwrap();
                KgWriter::write(&kg, dir.path(), "kg").unwrap_err()
            });
            assert!(
                matches!(err, RelError::Format(FormatError::InvalidName { kind: "individual", index: 0, .. })),
                "{bad:?} was accepted"
            );
            assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
        }
    }

    #[test]
    fn inner_whitespace_in_names_round_trips() {
        let dir = tempfile::TempDir::new().unwrap();
        let kg = DataContext::scoped(|| {
            let kg = KnowledgeGraph::new();
            kg.add(ClassTypeFactory::create("Big  Cat").unwrap()).unwrap();
            kg.add(IndividualFactory::create("Mr. Tom\tCat").unwrap()).unwrap();
            kg
        });
        KgWriter::write(&kg, dir.path(), "kg").unwrap();
        let restored = crate::io::KgReader::new().read(dir.path(), "kg").unwrap();
        assert_eq!(restored.classes().get(0).unwrap().name(), "Big  Cat");
        assert_eq!(restored.individuals().get(0).unwrap().name(), "Mr. Tom\tCat");
        assert_eq!(restored, kg);
    }

    #[test]
    fn opposite_memberships_with_one_provenance_are_rejected() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = DataContext::scoped(|| {
            let cls = ClassTypeFactory::create("A").unwrap();
            let x = IndividualFactory::create("x").unwrap();
            x.classes().add(ClassMembership::specified(cls.clone(), true)).unwrap();
            x.classes().add(ClassMembership::specified(cls, false)).unwrap();
            let kg = KnowledgeGraph::new();
            kg.add(x).unwrap();
            KgWriter::write(&kg, dir.path(), "kg").unwrap_err()
        });
        assert!(matches!(
            err,
            RelError::Format(FormatError::ConflictingMembership {
                individual: 0,
                class: 0,
                provenance: Provenance::Specified
            })
        ));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn sequence_steps_must_agree_on_names() {
        let dir = tempfile::TempDir::new().unwrap();
        let first = DataContext::scoped(|| {
            let kg = KnowledgeGraph::new();
            kg.add(IndividualFactory::create("alpha").unwrap()).unwrap();
            kg
        });
        let second = DataContext::scoped(|| {
            let kg = KnowledgeGraph::new();
            kg.add(IndividualFactory::create("beta").unwrap()).unwrap();
            kg
        });
        let err = KgWriter::write_sequence(&[first, second], dir.path(), "seq").unwrap_err();
        assert!(matches!(
            err,
            RelError::Format(FormatError::InconsistentSequence { kind: "individual", index: 0, .. })
        ));
    }

    #[test]
    fn empty_sequence_and_missing_directory_are_errors() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(matches!(
            KgWriter::write_sequence(&[], dir.path(), "seq").unwrap_err(),
            RelError::Format(FormatError::EmptySequence)
        ));
        assert!(matches!(
            KgWriter::write(&KnowledgeGraph::new(), dir.path().join("nope"), "kg").unwrap_err(),
            RelError::Format(FormatError::NotADirectory { .. })
        ));
    }
}
