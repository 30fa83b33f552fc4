use anyhow::Context;
use clap::Parser;

use tenantpulse_ai::OpenAiNarrator;
use tenantpulse_cli::{Cli, Orchestrator, RunOptions};
use tenantpulse_infra::{ArtifactWriter, PostgresConnector, RegionDirectory, Settings};
use tenantpulse_report::PdfRenderer;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    tenantpulse_observability::init(&cli.log_options())?;

    if let Err(err) = run(cli).await {
        tracing::error!(error = %format!("{err:#}"), "run failed");
        return Err(err);
    }
    Ok(())
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut settings = Settings::load().context("loading configuration")?;
    if let Some(temperature) = cli.temperature {
        settings.narrative.temperature = temperature;
    }
    settings.validate().context("validating configuration")?;

    if settings.narrative.api_key.is_none() {
        tracing::warn!("no narrative API key configured; narrative requests will be unauthenticated");
    }

    let connector = PostgresConnector::new(RegionDirectory::from_settings(&settings), settings.source.clone());
    let narrator = OpenAiNarrator::new(settings.narrative.clone()).context("building narrative client")?;
    let options = RunOptions {
        window: cli.window(),
        test_mode: cli.test,
        run_date: chrono::Local::now().date_naive(),
    };

    let orchestrator = Orchestrator::new(
        connector,
        narrator,
        PdfRenderer::new(),
        ArtifactWriter::from_settings(&settings.output),
        options,
    );
    let summary = orchestrator.run(&cli.region.regions()).await;

    if summary.has_region_failures() {
        let failed: Vec<String> = summary
            .failed_regions()
            .map(|r| r.region.to_string())
            .collect();
        anyhow::bail!("regions ended with a fatal error: {}", failed.join(", "));
    }
    Ok(())
}
