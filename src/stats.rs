//! Occurrence statistics over one or more knowledge graphs.
//!
//! Vocabulary items are keyed by name, so graphs read from different files
//! (and therefore different contexts) pool their counts.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde::Serialize;

use crate::data::{KnowledgeGraph, Provenance};

/// Positive and negative occurrences per provenance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Occurrences {
    pub spec_pos: usize,
    pub spec_neg: usize,
    pub inf_pos: usize,
    pub inf_neg: usize,
    pub pred_pos: usize,
    pub pred_neg: usize,
}

impl Occurrences {
    pub fn record(&mut self, provenance: Provenance, positive: bool) {
        let slot = match (provenance, positive) {
            (Provenance::Specified, true) => &mut self.spec_pos,
            (Provenance::Specified, false) => &mut self.spec_neg,
            (Provenance::Inferred, true) => &mut self.inf_pos,
            (Provenance::Inferred, false) => &mut self.inf_neg,
            (Provenance::Prediction, true) => &mut self.pred_pos,
            (Provenance::Prediction, false) => &mut self.pred_neg,
        };
        *slot += 1;
    }

    fn add(&mut self, other: &Occurrences) {
        self.spec_pos += other.spec_pos;
        self.spec_neg += other.spec_neg;
        self.inf_pos += other.inf_pos;
        self.inf_neg += other.inf_neg;
        self.pred_pos += other.pred_pos;
        self.pred_neg += other.pred_neg;
    }

    fn cells(&self) -> [String; 3] {
        [
            format!("{} / {}", self.spec_pos, self.spec_neg),
            format!("{} / {}", self.inf_pos, self.inf_neg),
            format!("{} / {}", self.pred_pos, self.pred_neg),
        ]
    }
}

/// Literal value occurrences per provenance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LiteralOccurrences {
    pub spec: usize,
    pub inf: usize,
    pub pred: usize,
}

impl LiteralOccurrences {
    pub fn record(&mut self, provenance: Provenance) {
        match provenance {
            Provenance::Specified => self.spec += 1,
            Provenance::Inferred => self.inf += 1,
            Provenance::Prediction => self.pred += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.spec + self.inf + self.pred
    }
}

/// Pooled statistics of any number of graphs.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GraphStats {
    pub graphs: usize,
    pub individuals: usize,
    pub classes: BTreeMap<String, Occurrences>,
    pub relations: BTreeMap<String, Occurrences>,
    pub literals: BTreeMap<String, LiteralOccurrences>,
}

impl GraphStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the counts of `kg`.
    ///
    /// Every vocabulary item of the graph gets an entry, even when nothing
    /// refers to it.
    pub fn accumulate(&mut self, kg: &KnowledgeGraph) {
        self.graphs += 1;
        self.individuals += kg.individuals().len();

        for cls in kg.classes().iter() {
            self.classes.entry(cls.name().to_string()).or_default();
        }
        for relation in kg.relations().iter() {
            self.relations.entry(relation.name().to_string()).or_default();
        }
        for literal in kg.literals().iter() {
            self.literals.entry(literal.name().to_string()).or_default();
        }

        for individual in kg.individuals().iter() {
            for membership in individual.classes().iter() {
                self.classes
                    .entry(membership.cls().name().to_string())
                    .or_default()
                    .record(membership.provenance(), membership.is_member());
            }
            for value in individual.literals().iter() {
                self.literals
                    .entry(value.literal().name().to_string())
                    .or_default()
                    .record(value.provenance());
            }
        }
        for triple in kg.triples().iter() {
            self.relations
                .entry(triple.predicate().name().to_string())
                .or_default()
                .record(triple.provenance(), triple.positive());
        }
        tracing::debug!(graphs = self.graphs, individuals = self.individuals, "accumulated graph statistics");
    }

    pub fn from_graphs<'a>(graphs: impl IntoIterator<Item = &'a KnowledgeGraph>) -> Self {
        let mut stats = Self::new();
        for kg in graphs {
            stats.accumulate(kg);
        }
        stats
    }

    fn occurrence_table(title: &str, unit: &str, entries: &BTreeMap<String, Occurrences>) -> String {
        let header = [
            "name".to_string(),
            format!("spec. {unit} (+/-)"),
            format!("inf. {unit} (+/-)"),
            format!("pred. {unit} (+/-)"),
        ];
        let mut total = Occurrences::default();
        let mut rows: Vec<Vec<String>> = Vec::with_capacity(entries.len() + 1);
        for (name, occurrences) in entries {
            total.add(occurrences);
            let mut row = vec![name.clone()];
            row.extend(occurrences.cells());
            rows.push(row);
        }
        let mut row = vec!["TOTAL".to_string()];
        row.extend(total.cells());
        rows.push(row);
        render_table(title, &header, &rows)
    }

    /// The CLASSES, RELATIONS and LITERALS tables, preceded by the number
    /// of individuals.
    pub fn render(&self) -> String {
        let mut out = format!("TOTAL INDIVIDUALS: {}\n\n", self.individuals);

        if self.classes.is_empty() {
            out.push_str("No classes were found!\n");
        } else {
            out.push_str(&Self::occurrence_table("CLASSES", "members", &self.classes));
        }
        out.push('\n');

        if self.relations.is_empty() {
            out.push_str("No relations were found!\n");
        } else {
            out.push_str(&Self::occurrence_table("RELATIONS", "triples", &self.relations));
        }
        out.push('\n');

        if self.literals.is_empty() {
            out.push_str("No literals were found!\n");
        } else {
            let header = ["name", "spec.", "inf.", "pred.", "occurrences"].map(String::from);
            let rows: Vec<Vec<String>> = self
                .literals
                .iter()
                .map(|(name, counts)| {
                    vec![
                        name.clone(),
                        counts.spec.to_string(),
                        counts.inf.to_string(),
                        counts.pred.to_string(),
                        counts.total().to_string(),
                    ]
                })
                .collect();
            out.push_str(&render_table("LITERALS", &header, &rows));
        }
        out
    }
}

/// A boxed text table with a centered title:
///
/// ```text
/// =================
/// |    CLASSES    |
/// =================
/// | name | count  |
/// -----------------
/// | A    | 1      |
/// =================
/// ```
pub fn render_table(title: &str, header: &[String], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }
    let total = widths.iter().sum::<usize>() + widths.len() * 3 + 1;
    let border = "=".repeat(total);

    let line = |cells: &[String]| {
        let mut out = String::from("|");
        for (i, &width) in widths.iter().enumerate() {
            let cell = cells.get(i).map_or("", String::as_str);
            let _ = write!(out, " {cell:<width$} |");
        }
        out
    };

    let mut out = String::new();
    let _ = writeln!(out, "{border}");
    let _ = writeln!(out, "|{title:^inner$}|", inner = total - 2);
    let _ = writeln!(out, "{border}");
    let _ = writeln!(out, "{}", line(header));
    let _ = writeln!(out, "{}", "-".repeat(total));
    for row in rows {
        let _ = writeln!(out, "{}", line(row));
    }
    let _ = writeln!(out, "{border}");
    out
}
