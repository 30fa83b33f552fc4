use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use tenantpulse_core::{LookbackWindow, RawFacts, Region, SchemaName, TenantId, TenantIdentity};

use super::{RegionConnector, RegionSession, SourceError};

#[derive(Debug, Clone, Default)]
struct RegionFixture {
    tenants: Vec<TenantIdentity>,
    facts: HashMap<TenantId, RawFacts>,
    fetch_failures: HashMap<TenantId, String>,
    open_failure: Option<String>,
    list_failure: Option<String>,
}

/// A fetch observed by an in-memory session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchCall {
    pub region: Region,
    pub tenant_id: TenantId,
    pub schema: SchemaName,
    pub window: LookbackWindow,
}

/// In-memory metric source with per-region fixtures.
///
/// Intended for tests/dev. Failures can be injected per region (open, list)
/// and per tenant (fetch).
#[derive(Debug, Default)]
pub struct InMemoryConnector {
    regions: RwLock<BTreeMap<Region, RegionFixture>>,
    fetches: Arc<RwLock<Vec<FetchCall>>>,
    closed: Arc<AtomicUsize>,
}

impl InMemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_fixture(self, region: Region, f: impl FnOnce(&mut RegionFixture)) -> Self {
        if let Ok(mut regions) = self.regions.write() {
            f(regions.entry(region).or_default());
        }
        self
    }

    /// Add a live tenant to its region, with the facts its fetch returns.
    ///
    /// A tenant without facts fetches an empty row set.
    pub fn with_tenant(self, identity: TenantIdentity, facts: Option<RawFacts>) -> Self {
        self.with_fixture(identity.region, |fixture| {
            if let Some(facts) = facts {
                fixture.facts.insert(identity.tenant_id, facts);
            }
            fixture.tenants.push(identity);
        })
    }

    pub fn with_fetch_failure(self, region: Region, tenant_id: TenantId, message: &str) -> Self {
        self.with_fixture(region, |fixture| {
            fixture.fetch_failures.insert(tenant_id, message.to_string());
        })
    }

    pub fn with_open_failure(self, region: Region, message: &str) -> Self {
        self.with_fixture(region, |fixture| fixture.open_failure = Some(message.to_string()))
    }

    pub fn with_list_failure(self, region: Region, message: &str) -> Self {
        self.with_fixture(region, |fixture| fixture.list_failure = Some(message.to_string()))
    }

    /// Number of sessions closed so far.
    pub fn closed_sessions(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    /// Fetches performed so far, in call order.
    pub fn fetches(&self) -> Vec<FetchCall> {
        self.fetches.read().map(|f| f.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl RegionConnector for InMemoryConnector {
    type Session = InMemorySession;

    async fn open(&self, region: Region) -> Result<InMemorySession, SourceError> {
        let regions = self
            .regions
            .read()
            .map_err(|_| SourceError::connection("open", "lock poisoned"))?;

        let fixture = regions.get(&region).cloned().ok_or_else(|| {
            SourceError::Configuration(format!("no database URL configured for region {region}"))
        })?;
        if let Some(message) = &fixture.open_failure {
            return Err(SourceError::connection("open", message.clone()));
        }

        Ok(InMemorySession {
            region,
            fixture,
            fetches: Arc::clone(&self.fetches),
            closed: Arc::clone(&self.closed),
        })
    }
}

#[derive(Debug)]
pub struct InMemorySession {
    region: Region,
    fixture: RegionFixture,
    fetches: Arc<RwLock<Vec<FetchCall>>>,
    closed: Arc<AtomicUsize>,
}

#[async_trait]
impl RegionSession for InMemorySession {
    fn region(&self) -> Region {
        self.region
    }

    async fn list_live_tenants(&self) -> Result<Vec<TenantIdentity>, SourceError> {
        match &self.fixture.list_failure {
            Some(message) => Err(SourceError::query("list_live_tenants", message.clone())),
            None => Ok(self.fixture.tenants.clone()),
        }
    }

    async fn fetch(
        &self,
        tenant_id: TenantId,
        schema: &SchemaName,
        window: LookbackWindow,
    ) -> Result<RawFacts, SourceError> {
        self.fetches
            .write()
            .map_err(|_| SourceError::query("fetch", "lock poisoned"))?
            .push(FetchCall {
                region: self.region,
                tenant_id,
                schema: schema.clone(),
                window,
            });

        if let Some(message) = self.fixture.fetch_failures.get(&tenant_id) {
            return Err(SourceError::query("fetch", message.clone()));
        }
        Ok(match self.fixture.facts.get(&tenant_id) {
            Some(facts) => RawFacts {
                window,
                ..facts.clone()
            },
            None => RawFacts::new(window, Vec::new(), Vec::new()),
        })
    }

    async fn close(self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tenantpulse_core::{PlanTier, RawValue};

    fn tenant(region: Region, id: i64) -> TenantIdentity {
        TenantIdentity {
            customer: format!("customer {id}"),
            tenant_id: TenantId::new(id),
            plan: PlanTier::Pro,
            schema_name: Some(format!("tenant_{id}")),
            external_crm_id: None,
            region,
        }
    }

    #[tokio::test]
    async fn lists_tenants_per_region_and_counts_closes() {
        let connector = InMemoryConnector::new()
            .with_tenant(tenant(Region::Eu, 1), None)
            .with_tenant(tenant(Region::Eu, 2), None)
            .with_tenant(tenant(Region::Us, 3), None);

        let eu = connector.open(Region::Eu).await.unwrap();
        let ids: Vec<i64> = eu
            .list_live_tenants()
            .await
            .unwrap()
            .iter()
            .map(|t| t.tenant_id.get())
            .collect();
        assert_eq!(ids, vec![1, 2]);
        eu.close().await;
        assert_eq!(connector.closed_sessions(), 1);
    }

    #[tokio::test]
    async fn fetch_uses_requested_window_and_records_calls() {
        let facts = RawFacts::single_row(
            LookbackWindow::default(),
            [("live_contracts", RawValue::Integer(4))],
        );
        let connector = InMemoryConnector::new().with_tenant(tenant(Region::Apac, 7), Some(facts));
        let session = connector.open(Region::Apac).await.unwrap();
        let schema = SchemaName::parse("tenant_7").unwrap();
        let window = LookbackWindow::new(3).unwrap();

        let fetched = session.fetch(TenantId::new(7), &schema, window).await.unwrap();
        assert_eq!(fetched.window, window);
        assert_eq!(fetched.rows.len(), 1);
        assert_eq!(connector.fetches()[0].window, window);
    }

    #[tokio::test]
    async fn injected_failures_surface_as_source_errors() {
        let connector = InMemoryConnector::new()
            .with_tenant(tenant(Region::Eu, 1), None)
            .with_fetch_failure(Region::Eu, TenantId::new(1), "relation does not exist")
            .with_tenant(tenant(Region::Ca, 2), None)
            .with_open_failure(Region::Ca, "connection refused");

        assert!(matches!(
            connector.open(Region::Ca).await.unwrap_err(),
            SourceError::Connection { .. }
        ));
        assert!(matches!(
            connector.open(Region::Staging).await.unwrap_err(),
            SourceError::Configuration(_)
        ));

        let session = connector.open(Region::Eu).await.unwrap();
        let schema = SchemaName::parse("tenant_1").unwrap();
        let err = session
            .fetch(TenantId::new(1), &schema, LookbackWindow::default())
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::Query { .. }));
    }
}
