//! Region → connection target lookup.

use std::collections::BTreeMap;

use tenantpulse_core::{PipelineError, PipelineResult, Region};

use crate::config::{Settings, legacy_region_var};

/// Maps logical regions to database URLs.
#[derive(Clone, Default)]
pub struct RegionDirectory {
    targets: BTreeMap<Region, String>,
}

impl core::fmt::Debug for RegionDirectory {
    // URLs carry credentials; only the configured regions are shown.
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RegionDirectory")
            .field("regions", &self.targets.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl RegionDirectory {
    pub fn new(targets: impl IntoIterator<Item = (Region, String)>) -> Self {
        Self {
            targets: targets
                .into_iter()
                .filter(|(_, url)| !url.trim().is_empty())
                .collect(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            Region::ALL
                .into_iter()
                .filter_map(|r| settings.region_url(r).map(|url| (r, url.to_string()))),
        )
    }

    /// Connection target for `region`.
    ///
    /// A region without a target is a `Configuration` error, fatal for that region only.
    pub fn target(&self, region: Region) -> PipelineResult<&str> {
        self.targets.get(&region).map(String::as_str).ok_or_else(|| {
            PipelineError::configuration(format!(
                "no database URL configured for region {region} (set {} or regions.{})",
                legacy_region_var(region),
                region.config_key()
            ))
        })
    }

    pub fn configured(&self) -> impl Iterator<Item = Region> + '_ {
        self.targets.keys().copied()
    }
}
