//! Persistence tests for the positional text encoding.
//!
//! These tests verify that graphs and graph sequences survive a write/read
//! cycle, that the checked-in fixtures under `tests/fixtures/` load with the
//! expected contents, and that rewriting a fixture reproduces it byte for byte.

use std::path::{Path, PathBuf};

use reldata::context::DataContext;
use reldata::data::{ClassMembership, IndividualFactory, KnowledgeGraph, LiteralValue, Provenance, Triple};
use reldata::error::{FormatError, RelError};
use reldata::io::{self, KgReader, KgWriter};
use reldata::stats::GraphStats;
use reldata::vocab::{ClassTypeFactory, LiteralTypeFactory, RelationTypeFactory};

fn fixtures() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures")
}

/// A graph using every provenance for every kind of fact, with all of its
/// vocabulary registered.
fn mixed_graph() -> KnowledgeGraph {
    DataContext::scoped(|| {
        let classes = ClassTypeFactory::create_all(["Animal", "Cat", "Dog"]).unwrap();
        let relations = RelationTypeFactory::create_all(["chases", "likes"]).unwrap();
        let literals = LiteralTypeFactory::create_all(["name", "legs"]).unwrap();
        let tom = IndividualFactory::create("tom").unwrap();
        let rex = IndividualFactory::create("rex").unwrap();
        let jerry = IndividualFactory::create("jerry").unwrap();

        tom.classes().add(ClassMembership::specified(classes[1].clone(), true)).unwrap();
        tom.classes()
            .add(ClassMembership::new(classes[0].clone(), true, Provenance::Inferred))
            .unwrap();
        rex.classes()
            .add(ClassMembership::new(classes[1].clone(), false, Provenance::Prediction))
            .unwrap();
        tom.literals().add(LiteralValue::specified(literals[0].clone(), "Thomas J. Cat")).unwrap();
        rex.literals()
            .add(LiteralValue::new(literals[1].clone(), "4", Provenance::Inferred))
            .unwrap();
        jerry.literals()
            .add(LiteralValue::new(literals[1].clone(), "", Provenance::Prediction))
            .unwrap();

        let kg = KnowledgeGraph::new();
        kg.classes().add_all(classes).unwrap();
        kg.relations().add_all(relations.clone()).unwrap();
        kg.literals().add_all(literals).unwrap();
        kg.add(Triple::fact(tom.clone(), relations[0].clone(), jerry.clone(), true)).unwrap();
        kg.add(Triple::fact(jerry.clone(), relations[1].clone(), tom.clone(), false)).unwrap();
        kg.add(Triple::new(rex.clone(), relations[0].clone(), tom.clone(), true, Provenance::Inferred))
            .unwrap();
        kg.add(Triple::new(rex, relations[1].clone(), jerry, false, Provenance::Prediction))
            .unwrap();
        kg
    })
}

#[test]
fn graph_round_trips_with_provenance() {
    let dir = tempfile::TempDir::new().unwrap();
    let original = mixed_graph();
    KgWriter::write(&original, dir.path(), "pets").unwrap();

    let restored = KgReader::new().read(dir.path(), "pets").unwrap();
    assert_eq!(restored, original);

    let jerry = restored.individuals().get(2).unwrap();
    let value = jerry.literals().to_vec().remove(0);
    assert_eq!(value.value(), "");
    assert!(value.prediction());
    assert_eq!(restored.triples().iter().filter(|t| t.inferred()).count(), 1);
    assert_eq!(restored.triples().iter().filter(|t| t.prediction()).count(), 1);
}

#[test]
fn family_fixture_loads() {
    let kg = KgReader::new().read(fixtures(), "family").unwrap();
    assert_eq!(kg.classes().len(), 3);
    assert_eq!(kg.relations().len(), 2);
    assert_eq!(kg.individuals().len(), 3);
    assert_eq!(kg.triples().len(), 6);
    assert!(kg.is_closed());

    let bert = kg.individuals().get(1).unwrap();
    assert_eq!(bert.name(), "bert");
    let inferred: Vec<_> = bert.classes().iter().filter(|m| m.inferred()).collect();
    assert_eq!(inferred.len(), 1);
    assert_eq!(inferred[0].cls().name(), "Parent");
    assert!(!inferred[0].is_member());

    let stats = GraphStats::from_graphs([&kg]);
    assert_eq!(stats.classes["Person"].spec_pos, 3);
    assert_eq!(stats.classes["Parent"].pred_neg, 1);
    assert_eq!(stats.classes["Child"].spec_neg, 1);
    assert_eq!(stats.relations["parentOf"].spec_pos, 2);
    assert_eq!(stats.relations["siblingOf"].inf_pos, 2);
    assert_eq!(stats.literals["age"].pred, 1);
}

#[test]
fn rewriting_a_fixture_reproduces_it() {
    let dir = tempfile::TempDir::new().unwrap();
    let kg = KgReader::new().read(fixtures(), "family").unwrap();
    KgWriter::write(&kg, dir.path(), "family").unwrap();

    let mut names: Vec<String> = std::fs::read_dir(fixtures())
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .filter(|n| n.starts_with("family."))
        .collect();
    names.sort();
    assert_eq!(names.len(), 13);
    for name in names {
        let expected = std::fs::read_to_string(fixtures().join(&name)).unwrap();
        let actual = std::fs::read_to_string(dir.path().join(&name)).unwrap();
        assert_eq!(actual, expected, "{name} differs");
    }
}

#[test]
fn legacy_fixture_without_prediction_files_loads() {
    let kg = KgReader::new().read(fixtures(), "legacy").unwrap();
    assert_eq!(kg.individuals().len(), 2);
    assert!(kg.triples().iter().all(|t| !t.prediction()));
    let c3po = kg.individuals().get(1).unwrap();
    assert_eq!(c3po.literals().to_vec()[0].value(), "C-3PO");
}

#[test]
fn fixtures_are_discovered() {
    assert_eq!(io::find_knowledge_graphs(fixtures()).unwrap(), vec!["family", "legacy"]);
    assert!(io::find_sequences(fixtures()).unwrap().is_empty());

    let graphs = KgReader::new().read_all(fixtures()).unwrap();
    let names: Vec<&str> = graphs.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(names, vec!["family", "legacy"]);

    let sequential = KgReader::new().parallel(false).read_all(fixtures()).unwrap();
    for ((_, a), (_, b)) in graphs.iter().zip(&sequential) {
        assert_eq!(a, b);
    }
}

/// Three steps over one vocabulary; each step has its own individuals.
fn sequence() -> Vec<KnowledgeGraph> {
    let vocab = DataContext::new();
    let (classes, knows) = vocab.run(|| {
        (
            ClassTypeFactory::create_all(["Awake", "Asleep"]).unwrap(),
            RelationTypeFactory::create("knows").unwrap(),
        )
    });

    (0..3)
        .map(|step| {
            DataContext::scoped(|| {
                let a = IndividualFactory::create("a").unwrap();
                let b = IndividualFactory::create("b").unwrap();
                let state = &classes[step % 2];
                a.classes().add(ClassMembership::specified(state.clone(), true)).unwrap();
                let kg = KnowledgeGraph::new();
                kg.classes().add_all(classes.iter().cloned()).unwrap();
                kg.add(knows.clone()).unwrap();
                kg.add(b.clone()).unwrap();
                if step > 0 {
                    kg.add(Triple::fact(a, knows.clone(), b, step == 1)).unwrap();
                } else {
                    kg.add(a).unwrap();
                }
                kg
            })
        })
        .collect()
}

#[test]
fn sequence_round_trips() {
    let dir = tempfile::TempDir::new().unwrap();
    let original = sequence();
    KgWriter::write_sequence(&original, dir.path(), "day").unwrap();

    assert!(dir.path().join("day.classes").is_file());
    assert!(dir.path().join("day.classes.data.2").is_file());
    assert!(!dir.path().join("day.classes.data").exists());
    assert_eq!(io::find_sequences(dir.path()).unwrap(), vec!["day"]);
    assert_eq!(io::sequence_length(dir.path(), "day"), 3);

    let restored = KgReader::new().read_sequence(dir.path(), "day").unwrap();
    assert_eq!(restored, original);

    // every step shares the vocabulary objects
    let first = restored[0].classes().get(0).unwrap();
    let last = restored[2].classes().get(0).unwrap();
    assert_eq!(first.origin(), last.origin());
    // but each has individuals of its own
    let a0 = restored[0].individuals().get(0).unwrap();
    let a1 = restored[1].individuals().get(0).unwrap();
    assert_ne!(a0.origin(), a1.origin());

    let all = KgReader::new().read_all_sequences(dir.path()).unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].1.len(), 3);
}

#[test]
fn missing_graph_is_reported() {
    let dir = tempfile::TempDir::new().unwrap();
    let err = KgReader::new().read(dir.path(), "ghost").unwrap_err();
    assert!(matches!(err, RelError::Format(FormatError::MissingFile { .. })));
}
