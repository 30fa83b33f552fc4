//! Document composer: canonical record + narrative → section tree.

use chrono::NaiveDate;
use tracing::{debug, warn};

use tenantpulse_core::{CanonicalRecord, FieldValue};

use crate::chart;
use crate::document::{Cover, Document, MetricTable, NarrativeBlock, Overview, Section};
use crate::error::RenderError;
use crate::narrative::{reflow, split_overview, title_case};

pub const COVER_TITLE: &str = "Customer Health Analysis";
pub const OVERVIEW_HEADING: &str = "Restore Visibility Overview";
pub const OVERVIEW_PLACEHOLDER: &str = "Analysis data not available";
pub const DETAIL_PLACEHOLDER: &str = "Detailed analysis not available";

/// Metric groups shown as tables, each metric matched by label prefix.
pub const METRIC_GROUPS: [(&str, [&str; 3]); 3] = [
    (
        "User Activity",
        [
            "Total Logged In Users",
            "Users Who Performed Actions",
            "Users Who Only Logged In",
        ],
    ),
    (
        "Contract Management",
        [
            "Total Contracts (inc Archived)",
            "Total Live Contracts",
            "Average Contract Value (Live)",
        ],
    ),
    (
        "Feature Adoption",
        ["Smart Forms Count", "Saved Custom Views", "RBAC Status"],
    ),
];

/// Builds [`Document`]s. Stateless apart from the generation date.
#[derive(Debug, Clone, Copy)]
pub struct DocumentComposer {
    generated_on: NaiveDate,
}

impl DocumentComposer {
    pub fn new(generated_on: NaiveDate) -> Self {
        Self { generated_on }
    }

    /// Compose the document for one record.
    ///
    /// Only a blank customer name fails; every other gap degrades the
    /// affected section and logs a warning.
    pub fn compose(&self, record: &CanonicalRecord, narrative: &str) -> Result<Document, RenderError> {
        if record.customer.trim().is_empty() {
            return Err(RenderError::InvalidRecord(format!(
                "tenant {} has no customer name",
                record.tenant_id
            )));
        }

        let mut sections = vec![
            Section::Cover(self.cover(record)),
            Section::Overview(overview(record, narrative)),
            Section::MetricsTables(metric_tables(record)),
        ];
        sections.extend(
            [chart::user_engagement(record), chart::contract_activity(record)]
                .into_iter()
                .flatten()
                .map(Section::Chart),
        );
        sections.push(Section::DetailedNarrative(detailed(record, narrative)));

        debug!(
            tenant_id = %record.tenant_id,
            sections = sections.len(),
            "document composed"
        );
        Ok(Document {
            customer: record.customer.clone(),
            sections,
        })
    }

    fn cover(&self, record: &CanonicalRecord) -> Cover {
        Cover {
            title: COVER_TITLE.to_string(),
            customer: title_case(record.customer.trim()),
            generated_on: format!("Generated on: {}", self.generated_on.format("%B %d, %Y")),
            window_statement: record.months_lookback.statement(),
        }
    }
}

fn overview(record: &CanonicalRecord, narrative: &str) -> Overview {
    let text = if narrative.trim().is_empty() {
        warn!(tenant_id = %record.tenant_id, "narrative is empty; overview uses placeholder");
        OVERVIEW_PLACEHOLDER.to_string()
    } else {
        let summary = split_overview(narrative);
        if summary.is_empty() {
            warn!(tenant_id = %record.tenant_id, "narrative has no overview paragraph");
            OVERVIEW_PLACEHOLDER.to_string()
        } else {
            summary
        }
    };
    Overview {
        heading: OVERVIEW_HEADING.to_string(),
        text,
    }
}

fn metric_tables(record: &CanonicalRecord) -> Vec<MetricTable> {
    let fields = record.labelled_fields();
    METRIC_GROUPS
        .iter()
        .map(|(group, prefixes)| {
            let rows = prefixes
                .iter()
                .filter_map(|prefix| {
                    let found = find_by_prefix(&fields, prefix);
                    if found.is_none() {
                        debug!(tenant_id = %record.tenant_id, metric = prefix, "metric absent from table");
                    }
                    found
                })
                .collect();
            MetricTable {
                group: (*group).to_string(),
                rows,
            }
        })
        .collect()
}

fn find_by_prefix(fields: &[(String, FieldValue)], prefix: &str) -> Option<(String, String)> {
    fields
        .iter()
        .find(|(label, _)| label.starts_with(prefix))
        .map(|(label, value)| (label.clone(), value.to_string()))
}

fn detailed(record: &CanonicalRecord, narrative: &str) -> Vec<NarrativeBlock> {
    let blocks = reflow(narrative);
    if blocks.is_empty() {
        warn!(tenant_id = %record.tenant_id, "narrative is empty; detailed analysis uses placeholder");
        return vec![NarrativeBlock::Paragraph(DETAIL_PLACEHOLDER.to_string())];
    }
    blocks
}
