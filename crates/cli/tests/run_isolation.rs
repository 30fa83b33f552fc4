use std::collections::HashSet;

use async_trait::async_trait;
use chrono::NaiveDate;
use tenantpulse_ai::{Narrative, NarrativeError, Narrator};
use tenantpulse_cli::{Orchestrator, RunOptions};
use tenantpulse_core::{
    CanonicalRecord, LookbackWindow, PipelineError, PlanTier, RawFacts, RawValue, Region, TenantId,
    TenantIdentity,
};
use tenantpulse_infra::{ArtifactWriter, InMemoryConnector};
use tenantpulse_report::PdfRenderer;

const NARRATIVE: &str = "0. Overview\nHealthy usage across the account.\n\
1. User Engagement\n- Most users were active this period\nAdoption is steady.";

/// Narrator that fails for selected tenants and echoes a fixed text otherwise.
#[derive(Default)]
struct ScriptedNarrator {
    failing: HashSet<TenantId>,
}

#[async_trait]
impl Narrator for ScriptedNarrator {
    async fn narrate(&self, record: &CanonicalRecord) -> Result<Narrative, NarrativeError> {
        if self.failing.contains(&record.tenant_id) {
            return Err(NarrativeError::Status {
                status: 503,
                body: "upstream unavailable".to_string(),
            });
        }
        Ok(Narrative::new(NARRATIVE).with_usage(321))
    }
}

fn run_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
}

fn tenant(region: Region, id: i64, customer: &str) -> TenantIdentity {
    TenantIdentity {
        customer: customer.to_string(),
        tenant_id: TenantId::new(id),
        plan: PlanTier::Pro,
        schema_name: Some(format!("tenant_{id}")),
        external_crm_id: None,
        region,
    }
}

fn facts() -> RawFacts {
    RawFacts::single_row(
        LookbackWindow::default(),
        [
            ("logged_in_count", RawValue::Integer(12)),
            ("active_count", RawValue::Integer(9)),
            ("live_contracts", RawValue::Integer(40)),
            ("new_live_contracts", RawValue::Integer(4)),
            ("updated_live_contracts", RawValue::Integer(7)),
            ("owned_live_contracts", RawValue::Integer(30)),
            ("main_currency", RawValue::Text("EUR".to_string())),
        ],
    )
}

fn orchestrator<N: Narrator>(
    connector: InMemoryConnector,
    narrator: N,
    out: &std::path::Path,
    months: u32,
    test_mode: bool,
) -> Orchestrator<InMemoryConnector, N> {
    Orchestrator::new(
        connector,
        narrator,
        PdfRenderer::new(),
        ArtifactWriter::new(out.join("reports"), out.join("raw_data")),
        RunOptions {
            window: LookbackWindow::new(months).unwrap(),
            test_mode,
            run_date: run_date(),
        },
    )
}

#[tokio::test]
async fn one_failing_tenant_does_not_stop_the_region() {
    let out = tempfile::tempdir().unwrap();
    let connector = InMemoryConnector::new()
        .with_tenant(tenant(Region::Eu, 1, "Acme Corp"), Some(facts()))
        .with_tenant(tenant(Region::Eu, 2, "Globex"), Some(facts()))
        .with_fetch_failure(Region::Eu, TenantId::new(2), "connection reset")
        .with_tenant(tenant(Region::Eu, 3, "Initech"), Some(facts()));
    let narrator = ScriptedNarrator::default();

    let orchestrator = orchestrator(connector, narrator, out.path(), 1, false);
    let summary = orchestrator.run(&[Region::Eu]).await;

    let eu = &summary.regions[0];
    assert_eq!(eu.tenants_seen, 3);
    assert_eq!(eu.documents_written(), 2);
    assert_eq!(eu.skipped.len(), 1);
    assert_eq!(eu.skipped[0].tenant_id, TenantId::new(2));
    assert!(matches!(eu.skipped[0].error, PipelineError::DataAccess(_)));
    assert!(!summary.has_region_failures());

    assert!(out.path().join("reports/Acme_Corp_20261019.pdf").exists());
    assert!(out.path().join("raw_data/Acme_Corp_20261019.csv").exists());
    assert!(out.path().join("reports/Initech_20261019.pdf").exists());
    assert!(!out.path().join("reports/Globex_20261019.pdf").exists());
    assert_eq!(orchestrator.connector().closed_sessions(), 1);
}

#[tokio::test]
async fn narrative_failure_skips_tenant_without_a_document() {
    let out = tempfile::tempdir().unwrap();
    let connector = InMemoryConnector::new()
        .with_tenant(tenant(Region::Us, 10, "Hooli"), Some(facts()))
        .with_tenant(tenant(Region::Us, 11, "Pied Piper"), Some(facts()));
    let narrator = ScriptedNarrator {
        failing: HashSet::from([TenantId::new(10)]),
    };

    let summary = orchestrator(connector, narrator, out.path(), 1, false)
        .run(&[Region::Us])
        .await;

    let us = &summary.regions[0];
    assert_eq!(us.documents_written(), 1);
    assert!(matches!(us.skipped[0].error, PipelineError::NarrativeService(_)));
    assert!(!out.path().join("reports/Hooli_20261019.pdf").exists());
    assert!(out.path().join("reports/Pied_Piper_20261019.pdf").exists());
}

#[tokio::test]
async fn unusable_schema_is_missing_tenant_data() {
    let out = tempfile::tempdir().unwrap();
    let mut broken = tenant(Region::Apac, 20, "Umbrella");
    broken.schema_name = None;
    let connector = InMemoryConnector::new()
        .with_tenant(broken, Some(facts()))
        .with_tenant(tenant(Region::Apac, 21, "Stark"), None);

    let orchestrator = orchestrator(connector, ScriptedNarrator::default(), out.path(), 1, false);
    let summary = orchestrator.run(&[Region::Apac]).await;

    let apac = &summary.regions[0];
    assert!(matches!(
        apac.skipped[0].error,
        PipelineError::MissingTenantData { tenant_id, .. } if tenant_id == TenantId::new(20)
    ));
    // A tenant whose aggregate returns nothing still gets a report built from defaults.
    assert_eq!(apac.documents_written(), 1);
    assert_eq!(orchestrator.connector().fetches().len(), 1);
}

#[tokio::test]
async fn region_failures_are_fatal_for_that_region_only() {
    let out = tempfile::tempdir().unwrap();
    let connector = InMemoryConnector::new()
        .with_tenant(tenant(Region::Apac, 1, "Soylent"), Some(facts()))
        .with_open_failure(Region::Apac, "connection refused")
        .with_tenant(tenant(Region::Eu, 2, "Tyrell"), Some(facts()))
        .with_list_failure(Region::Eu, "permission denied")
        .with_tenant(tenant(Region::Ca, 3, "Wayne"), Some(facts()));

    let orchestrator = orchestrator(connector, ScriptedNarrator::default(), out.path(), 1, false);
    let summary = orchestrator
        .run(&[Region::Staging, Region::Apac, Region::Eu, Region::Ca])
        .await;

    let fatal: Vec<_> = summary
        .regions
        .iter()
        .map(|r| (r.region, r.fatal.as_ref().map(PipelineError::kind)))
        .collect();
    assert_eq!(
        fatal,
        vec![
            (Region::Staging, Some("configuration")),
            (Region::Apac, Some("data_access")),
            (Region::Eu, Some("data_access")),
            (Region::Ca, None),
        ]
    );
    assert_eq!(summary.documents_written(), 1);
    assert!(summary.has_region_failures());
    // Sessions that opened are closed, including the one whose listing failed.
    assert_eq!(orchestrator.connector().closed_sessions(), 2);
}

#[tokio::test]
async fn test_mode_keeps_first_tenant_of_first_region() {
    let out = tempfile::tempdir().unwrap();
    let connector = InMemoryConnector::new()
        .with_tenant(tenant(Region::Staging, 1, "First"), Some(facts()))
        .with_tenant(tenant(Region::Staging, 2, "Second"), Some(facts()))
        .with_tenant(tenant(Region::Eu, 3, "Elsewhere"), Some(facts()));

    let orchestrator = orchestrator(connector, ScriptedNarrator::default(), out.path(), 3, true);
    let summary = orchestrator.run(&[Region::Staging, Region::Eu]).await;

    assert_eq!(summary.regions.len(), 1);
    assert_eq!(summary.regions[0].tenants_seen, 1);
    assert_eq!(summary.documents_written(), 1);

    let fetches = orchestrator.connector().fetches();
    assert_eq!(fetches.len(), 1);
    assert_eq!(fetches[0].tenant_id, TenantId::new(1));
    assert_eq!(fetches[0].window.months(), 3);
}
