//! Configuration loading and representation.
//!
//! Sources, lowest to highest priority:
//! 1. built-in defaults
//! 2. `config/tenantpulse.{toml,yaml,json}` (optional)
//! 3. `TENANTPULSE__<SECTION>__<KEY>` environment variables
//! 4. legacy variables: `<REGION>_DB_URL`, `OPENAI_API_KEY`, `OPENAI_MODEL`,
//!    `OPENAI_BASE_URL`, `TEMPERATURE`
//!
//! A `.env` file is read into the process environment first.

use std::collections::BTreeMap;
use std::path::PathBuf;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use tenantpulse_ai::NarratorConfig;
use tenantpulse_core::{PipelineError, Region};

pub const DEFAULT_CONFIG_FILE: &str = "config/tenantpulse";
pub const ENV_PREFIX: &str = "TENANTPULSE";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid value for {key}: {message}")]
    Invalid { key: String, message: String },
}

impl From<ConfigError> for PipelineError {
    fn from(err: ConfigError) -> Self {
        PipelineError::configuration(err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    pub reports_dir: PathBuf,
    pub raw_data_dir: PathBuf,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            reports_dir: PathBuf::from("reports"),
            raw_data_dir: PathBuf::from("raw_data"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSettings {
    /// Users whose e-mail ends with this suffix (staff accounts) are not counted.
    pub excluded_email_suffix: Option<String>,
    pub acquire_timeout_seconds: u64,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            excluded_email_suffix: None,
            acquire_timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Database URL per region, keyed by `Region::config_key`.
    pub regions: BTreeMap<String, String>,
    pub narrative: NarratorConfig,
    pub output: OutputSettings,
    pub source: SourceSettings,
}

/// Name of the legacy per-region URL variable, e.g. `APAC_DB_URL`.
pub fn legacy_region_var(region: Region) -> String {
    format!("{}_DB_URL", region.config_key().to_ascii_uppercase())
}

impl Settings {
    /// Load from `.env`, the default file and the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let env: config::Map<String, String> = std::env::vars().collect();
        Self::load_from(DEFAULT_CONFIG_FILE, env)
    }

    /// Load from an explicit file stem and environment snapshot.
    pub fn load_from(file: &str, env: config::Map<String, String>) -> Result<Self, ConfigError> {
        let legacy = |name: &str| env.get(name).filter(|v| !v.trim().is_empty()).cloned();

        let mut builder = Config::builder()
            .add_source(File::with_name(file).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .source(Some(env.clone())),
            );

        for region in Region::ALL {
            builder = builder.set_override_option(
                format!("regions.{}", region.config_key()),
                legacy(&legacy_region_var(region)),
            )?;
        }
        builder = builder
            .set_override_option("narrative.api_key", legacy("OPENAI_API_KEY"))?
            .set_override_option("narrative.model", legacy("OPENAI_MODEL"))?
            .set_override_option("narrative.base_url", legacy("OPENAI_BASE_URL"))?;

        if let Some(raw) = legacy("TEMPERATURE") {
            let temperature: f64 = raw.trim().parse().map_err(|_| ConfigError::Invalid {
                key: "TEMPERATURE".to_string(),
                message: format!("{raw:?} is not a number"),
            })?;
            builder = builder.set_override("narrative.temperature", temperature)?;
        }

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for key in self.regions.keys() {
            if !Region::ALL.iter().any(|r| r.config_key() == key) {
                return Err(ConfigError::Invalid {
                    key: format!("regions.{key}"),
                    message: "unknown region".to_string(),
                });
            }
        }
        self.narrative
            .validate()
            .map_err(|e| ConfigError::Invalid {
                key: "narrative".to_string(),
                message: e.to_string(),
            })
    }

    /// Configured database URL for `region`, if any.
    pub fn region_url(&self, region: Region) -> Option<&str> {
        self.regions
            .get(region.config_key())
            .map(String::as_str)
            .filter(|url| !url.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NO_FILE: &str = "config/does-not-exist";

    fn env(pairs: &[(&str, &str)]) -> config::Map<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_apply_without_sources() {
        let settings = Settings::load_from(NO_FILE, env(&[])).unwrap();
        assert!(settings.regions.is_empty());
        assert_eq!(settings.narrative.model, "gpt-4");
        assert_eq!(settings.narrative.max_tokens, 4000);
        assert_eq!(settings.output.reports_dir, PathBuf::from("reports"));
        assert_eq!(settings.output.raw_data_dir, PathBuf::from("raw_data"));
    }

    #[test]
    fn legacy_variables_fill_regions_and_narrative() {
        let settings = Settings::load_from(
            NO_FILE,
            env(&[
                ("APAC_DB_URL", "postgres://apac/db"),
                ("STAGING_DB_URL", "postgres://staging/db"),
                ("OPENAI_API_KEY", "sk-test"),
                ("OPENAI_MODEL", "gpt-4o"),
                ("TEMPERATURE", "0.2"),
            ]),
        )
        .unwrap();
        assert_eq!(settings.region_url(Region::Apac), Some("postgres://apac/db"));
        assert_eq!(settings.region_url(Region::Staging), Some("postgres://staging/db"));
        assert_eq!(settings.region_url(Region::Eu), None);
        assert_eq!(settings.narrative.api_key.as_deref(), Some("sk-test"));
        assert_eq!(settings.narrative.model, "gpt-4o");
        assert!((settings.narrative.temperature - 0.2).abs() < f32::EPSILON);
    }

    #[test]
    fn prefixed_variables_are_read_and_legacy_wins() {
        let settings = Settings::load_from(
            NO_FILE,
            env(&[
                ("TENANTPULSE__REGIONS__EU", "postgres://eu-prefixed/db"),
                ("TENANTPULSE__OUTPUT__REPORTS_DIR", "/tmp/out"),
                ("TENANTPULSE__NARRATIVE__MODEL", "from-prefix"),
                ("OPENAI_MODEL", "from-legacy"),
            ]),
        )
        .unwrap();
        assert_eq!(settings.region_url(Region::Eu), Some("postgres://eu-prefixed/db"));
        assert_eq!(settings.output.reports_dir, PathBuf::from("/tmp/out"));
        assert_eq!(settings.narrative.model, "from-legacy");
    }

    #[test]
    fn blank_legacy_values_are_ignored() {
        let settings = Settings::load_from(NO_FILE, env(&[("US_DB_URL", "  ")])).unwrap();
        assert_eq!(settings.region_url(Region::Us), None);
    }

    #[test]
    fn invalid_temperature_is_rejected() {
        let err = Settings::load_from(NO_FILE, env(&[("TEMPERATURE", "warm")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref key, .. } if key == "TEMPERATURE"));

        let err = Settings::load_from(NO_FILE, env(&[("TEMPERATURE", "9")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref key, .. } if key == "narrative"));
    }

    #[test]
    fn legacy_variable_names_follow_region_keys() {
        assert_eq!(legacy_region_var(Region::Ca), "CA_DB_URL");
        assert_eq!(legacy_region_var(Region::Staging), "STAGING_DB_URL");
    }
}
