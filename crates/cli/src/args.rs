//! Command-line surface.

use clap::{Parser, ValueEnum};
use tenantpulse_core::{LookbackWindow, Region};
use tenantpulse_observability::{LogFormat, LogOptions};

#[derive(Debug, Clone, Parser)]
#[command(
    name = "tenantpulse",
    about = "Generate per-customer usage reports for every live tenant"
)]
pub struct Cli {
    /// Region to process.
    #[arg(long, value_enum, ignore_case = true, default_value = "all")]
    pub region: RegionArg,

    /// Process only the first tenant of the first region.
    #[arg(long)]
    pub test: bool,

    /// Narrative temperature override (0.0 to 2.0).
    #[arg(long)]
    pub temperature: Option<f32>,

    /// Lookback window for time-based metrics, in months.
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub months: u32,

    #[arg(long, value_enum, ignore_case = true, default_value = "info")]
    pub log_level: LogLevel,

    #[arg(long, value_enum, default_value = "json")]
    pub log_format: LogFormatArg,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum RegionArg {
    All,
    Staging,
    Apac,
    Eu,
    Us,
    Ca,
}

impl RegionArg {
    /// Regions to process, in run order.
    pub fn regions(self) -> Vec<Region> {
        match self {
            RegionArg::All => Region::ALL.to_vec(),
            RegionArg::Staging => vec![Region::Staging],
            RegionArg::Apac => vec![Region::Apac],
            RegionArg::Eu => vec![Region::Eu],
            RegionArg::Us => vec![Region::Us],
            RegionArg::Ca => vec![Region::Ca],
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    #[value(alias = "warning")]
    Warn,
    #[value(alias = "critical")]
    Error,
}

impl LogLevel {
    pub fn directive(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    Json,
    Compact,
}

impl Cli {
    pub fn window(&self) -> LookbackWindow {
        LookbackWindow::new(self.months).unwrap_or_default()
    }

    pub fn log_options(&self) -> LogOptions {
        LogOptions {
            default_directive: self.log_level.directive().to_string(),
            format: match self.log_format {
                LogFormatArg::Json => LogFormat::Json,
                LogFormatArg::Compact => LogFormat::Compact,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("tenantpulse").chain(args.iter().copied()))
    }

    #[test]
    fn defaults_cover_all_regions_for_one_month() {
        let cli = parse(&[]).unwrap();
        assert_eq!(cli.region.regions(), Region::ALL.to_vec());
        assert!(!cli.test);
        assert_eq!(cli.window().months(), 1);
        assert_eq!(cli.temperature, None);
        assert_eq!(cli.log_options().default_directive, "info");
    }

    #[test]
    fn region_names_are_case_insensitive() {
        let cli = parse(&["--region", "APAC", "--test", "--months", "3"]).unwrap();
        assert_eq!(cli.region.regions(), vec![Region::Apac]);
        assert!(cli.test);
        assert_eq!(cli.window().months(), 3);
    }

    #[test]
    fn zero_months_is_rejected() {
        assert!(parse(&["--months", "0"]).is_err());
    }

    #[test]
    fn legacy_level_names_are_accepted() {
        let cli = parse(&["--log-level", "WARNING"]).unwrap();
        assert_eq!(cli.log_level, LogLevel::Warn);
        let cli = parse(&["--log-level", "critical", "--log-format", "compact"]).unwrap();
        assert_eq!(cli.log_options().default_directive, "error");
        assert_eq!(cli.log_options().format, LogFormat::Compact);
    }
}
