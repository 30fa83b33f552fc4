//! Immutable section tree produced by the composer and consumed by renderers.

use crate::chart::ChartSpec;

/// A composed customer document: an ordered list of sections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub customer: String,
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Section {
    Cover(Cover),
    Overview(Overview),
    MetricsTables(Vec<MetricTable>),
    Chart(ChartSpec),
    DetailedNarrative(Vec<NarrativeBlock>),
}

/// Discriminant of a [`Section`], used for ordering checks and logs.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SectionKind {
    Cover,
    Overview,
    MetricsTables,
    Chart,
    DetailedNarrative,
}

impl Section {
    pub fn kind(&self) -> SectionKind {
        match self {
            Section::Cover(_) => SectionKind::Cover,
            Section::Overview(_) => SectionKind::Overview,
            Section::MetricsTables(_) => SectionKind::MetricsTables,
            Section::Chart(_) => SectionKind::Chart,
            Section::DetailedNarrative(_) => SectionKind::DetailedNarrative,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cover {
    pub title: String,
    /// Title-cased customer name.
    pub customer: String,
    pub generated_on: String,
    pub window_statement: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Overview {
    pub heading: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricTable {
    pub group: String,
    /// `(display label, rendered value)`; unresolved metrics are left out.
    pub rows: Vec<(String, String)>,
}

/// One re-flowed line of the detailed narrative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NarrativeBlock {
    Heading(String),
    Bullet(String),
    Paragraph(String),
}

impl Document {
    pub fn kinds(&self) -> Vec<SectionKind> {
        self.sections.iter().map(Section::kind).collect()
    }

    pub fn charts(&self) -> impl Iterator<Item = &ChartSpec> {
        self.sections.iter().filter_map(|s| match s {
            Section::Chart(spec) => Some(spec),
            _ => None,
        })
    }
}
