//! Logical regions served by separate data stores.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// A regional data store.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Region {
    Staging,
    #[serde(rename = "APAC")]
    Apac,
    #[serde(rename = "EU")]
    Eu,
    #[serde(rename = "US")]
    Us,
    #[serde(rename = "CA")]
    Ca,
}

impl Region {
    /// Every region, in processing order.
    pub const ALL: [Region; 5] = [
        Region::Staging,
        Region::Apac,
        Region::Eu,
        Region::Us,
        Region::Ca,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Region::Staging => "Staging",
            Region::Apac => "APAC",
            Region::Eu => "EU",
            Region::Us => "US",
            Region::Ca => "CA",
        }
    }

    /// Lower-case key used in configuration files (`regions.apac`).
    pub fn config_key(&self) -> &'static str {
        match self {
            Region::Staging => "staging",
            Region::Apac => "apac",
            Region::Eu => "eu",
            Region::Us => "us",
            Region::Ca => "ca",
        }
    }
}

impl core::fmt::Display for Region {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Region {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Region::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| PipelineError::configuration(format!("unknown region: {s}")))
    }
}
