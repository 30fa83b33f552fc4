//! Run summary returned by the orchestrator.

use std::path::PathBuf;

use tenantpulse_core::{PipelineError, Region, RunId, TenantId};

/// A tenant that was skipped, with enough context to re-run it manually.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedTenant {
    pub tenant_id: TenantId,
    pub customer: String,
    pub error: PipelineError,
}

/// Artifacts written for one tenant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenReport {
    pub tenant_id: TenantId,
    pub document: PathBuf,
    pub raw_data: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionSummary {
    pub region: Region,
    pub tenants_seen: usize,
    pub written: Vec<WrittenReport>,
    pub skipped: Vec<SkippedTenant>,
    /// Error that ended the region before or while listing tenants.
    pub fatal: Option<PipelineError>,
}

impl RegionSummary {
    pub fn new(region: Region) -> Self {
        Self {
            region,
            tenants_seen: 0,
            written: Vec::new(),
            skipped: Vec::new(),
            fatal: None,
        }
    }

    pub fn failed(region: Region, error: PipelineError) -> Self {
        Self {
            fatal: Some(error),
            ..Self::new(region)
        }
    }

    pub fn documents_written(&self) -> usize {
        self.written.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub run_id: RunId,
    pub regions: Vec<RegionSummary>,
}

impl RunSummary {
    pub fn documents_written(&self) -> usize {
        self.regions.iter().map(RegionSummary::documents_written).sum()
    }

    pub fn tenants_skipped(&self) -> usize {
        self.regions.iter().map(|r| r.skipped.len()).sum()
    }

    pub fn failed_regions(&self) -> impl Iterator<Item = &RegionSummary> {
        self.regions.iter().filter(|r| r.fatal.is_some())
    }

    /// Whether any region ended with a fatal error.
    pub fn has_region_failures(&self) -> bool {
        self.failed_regions().next().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn totals_and_failures_aggregate_over_regions() {
        let mut eu = RegionSummary::new(Region::Eu);
        eu.tenants_seen = 2;
        eu.written.push(WrittenReport {
            tenant_id: TenantId::new(1),
            document: PathBuf::from("reports/a.pdf"),
            raw_data: PathBuf::from("raw_data/a.csv"),
        });
        eu.skipped.push(SkippedTenant {
            tenant_id: TenantId::new(2),
            customer: "b".to_string(),
            error: PipelineError::narrative("timeout"),
        });

        let summary = RunSummary {
            run_id: RunId::new(),
            regions: vec![eu, RegionSummary::failed(Region::Us, PipelineError::data_access("refused"))],
        };
        assert_eq!(summary.documents_written(), 1);
        assert_eq!(summary.tenants_skipped(), 1);
        assert!(summary.has_region_failures());
        assert_eq!(summary.failed_regions().map(|r| r.region).collect::<Vec<_>>(), vec![Region::Us]);
    }
}
