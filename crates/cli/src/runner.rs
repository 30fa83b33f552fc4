//! Run orchestration: regions → tenants → report.
//!
//! Everything runs sequentially. Per tenant the steps are:
//!
//! | Step | Failure |
//! |------|---------|
//! | resolve namespace | `MissingTenantData`, tenant skipped |
//! | fetch raw facts | `DataAccess`, tenant skipped |
//! | normalize | never fails on gaps |
//! | write flat record | `Artifact`, tenant skipped |
//! | narrate | `NarrativeService`, tenant skipped |
//! | compose + render | `Render`, tenant skipped |
//! | write document | `Artifact`, tenant skipped |
//!
//! Only opening a region session or listing its tenants can end a region.
//! The session is closed once the region is done, whatever happened to its
//! tenants.

use chrono::NaiveDate;
use tracing::{Instrument, error, info, info_span, warn};

use tenantpulse_ai::Narrator;
use tenantpulse_core::{
    LookbackWindow, PipelineError, PipelineResult, Region, RunId, TenantIdentity, normalize,
};
use tenantpulse_infra::{ArtifactWriter, RegionConnector, RegionSession};
use tenantpulse_report::{DocumentComposer, PdfRenderer};

use crate::summary::{RegionSummary, RunSummary, SkippedTenant, WrittenReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    pub window: LookbackWindow,
    /// Keep only the first tenant of the first region processed.
    pub test_mode: bool,
    /// Date stamped on documents and artifact file names.
    pub run_date: NaiveDate,
}

pub struct Orchestrator<C, N> {
    connector: C,
    narrator: N,
    composer: DocumentComposer,
    renderer: PdfRenderer,
    artifacts: ArtifactWriter,
    options: RunOptions,
}

impl<C, N> Orchestrator<C, N>
where
    C: RegionConnector,
    N: Narrator,
{
    pub fn new(
        connector: C,
        narrator: N,
        renderer: PdfRenderer,
        artifacts: ArtifactWriter,
        options: RunOptions,
    ) -> Self {
        Self {
            connector,
            narrator,
            composer: DocumentComposer::new(options.run_date),
            renderer,
            artifacts,
            options,
        }
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Process `regions` in order and report what happened.
    pub async fn run(&self, regions: &[Region]) -> RunSummary {
        let run_id = RunId::new();
        let span = info_span!(
            "run",
            run_id = %run_id,
            window = %self.options.window,
            test_mode = self.options.test_mode
        );

        async move {
            info!(regions = regions.len(), "run started");
            let mut summaries = Vec::with_capacity(regions.len());
            for &region in regions {
                let summary = self
                    .run_region(region)
                    .instrument(info_span!("region", region = %region))
                    .await;
                summaries.push(summary);
                if self.options.test_mode {
                    info!("test mode: stopping after the first region");
                    break;
                }
            }

            let summary = RunSummary {
                run_id,
                regions: summaries,
            };
            info!(
                documents_written = summary.documents_written(),
                tenants_skipped = summary.tenants_skipped(),
                failed_regions = summary.failed_regions().count(),
                "run finished"
            );
            summary
        }
        .instrument(span)
        .await
    }

    async fn run_region(&self, region: Region) -> RegionSummary {
        let session = match self.connector.open(region).await {
            Ok(session) => session,
            Err(err) => {
                let err = PipelineError::from(err);
                error!(error = %err, kind = err.kind(), "region aborted: session could not be opened");
                return RegionSummary::failed(region, err);
            }
        };

        let summary = self.process_region(&session).await;
        session.close().await;
        info!(
            tenants_seen = summary.tenants_seen,
            documents_written = summary.documents_written(),
            tenants_skipped = summary.skipped.len(),
            "region finished"
        );
        summary
    }

    async fn process_region(&self, session: &C::Session) -> RegionSummary {
        let mut summary = RegionSummary::new(session.region());

        let mut tenants = match session.list_live_tenants().await {
            Ok(tenants) => tenants,
            Err(err) => {
                let err = PipelineError::from(err);
                error!(error = %err, kind = err.kind(), "region aborted: tenants could not be listed");
                summary.fatal = Some(err);
                return summary;
            }
        };
        if self.options.test_mode {
            tenants.truncate(1);
        }
        summary.tenants_seen = tenants.len();
        info!(tenants = tenants.len(), "live tenants listed");

        for identity in &tenants {
            let span = info_span!(
                "tenant",
                tenant_id = %identity.tenant_id,
                customer = %identity.customer
            );
            match self.process_tenant(session, identity).instrument(span.clone()).await {
                Ok(report) => summary.written.push(report),
                Err(err) => {
                    span.in_scope(|| error!(error = %err, kind = err.kind(), "tenant skipped"));
                    summary.skipped.push(SkippedTenant {
                        tenant_id: identity.tenant_id,
                        customer: identity.customer.clone(),
                        error: err,
                    });
                }
            }
        }
        summary
    }

    async fn process_tenant(
        &self,
        session: &C::Session,
        identity: &TenantIdentity,
    ) -> PipelineResult<WrittenReport> {
        let schema = identity.namespace()?;
        let facts = session
            .fetch(identity.tenant_id, &schema, self.options.window)
            .await?;
        let record = normalize(identity, &facts)?;

        let raw_data = self.artifacts.write_record(&record, self.options.run_date)?;
        info!(path = %raw_data.display(), "raw data saved");

        let narrative = self.narrator.narrate(&record).await?;
        info!(usage_tokens = narrative.usage_tokens, "narrative generated");
        if narrative.is_blank() {
            warn!("narrative is blank; overview falls back to its placeholder");
        }

        let document = self.composer.compose(&record, &narrative.text)?;
        let bytes = self.renderer.render(&document)?;
        let document = self
            .artifacts
            .write_document(&record.customer, self.options.run_date, &bytes)?;
        info!(path = %document.display(), "report generated");

        Ok(WrittenReport {
            tenant_id: identity.tenant_id,
            document,
            raw_data,
        })
    }
}
