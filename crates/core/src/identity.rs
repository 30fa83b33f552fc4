//! Tenant identity as listed by a regional store.

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, PipelineResult};
use crate::id::TenantId;
use crate::region::Region;

/// Commercial plan of a tenant.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlanTier {
    Starter,
    Pro,
    Enterprise,
    Custom,
    #[serde(rename = "Contract Now")]
    ContractNow,
}

impl PlanTier {
    /// Map the store's numeric plan code. Unknown or missing codes are `ContractNow`.
    pub fn from_code(code: Option<i64>) -> Self {
        match code {
            Some(0) => PlanTier::Starter,
            Some(1) => PlanTier::Pro,
            Some(2) => PlanTier::Enterprise,
            Some(3) => PlanTier::Custom,
            _ => PlanTier::ContractNow,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PlanTier::Starter => "Starter",
            PlanTier::Pro => "Pro",
            PlanTier::Enterprise => "Enterprise",
            PlanTier::Custom => "Custom",
            PlanTier::ContractNow => "Contract Now",
        }
    }
}

impl core::fmt::Display for PlanTier {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated tenant namespace (Postgres schema name).
///
/// Only plain identifiers are accepted, so the name can be spliced into SQL
/// after quoting.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SchemaName(String);

impl SchemaName {
    const MAX_LEN: usize = 63;

    pub fn parse(raw: &str) -> Result<Self, String> {
        let name = raw.trim();
        if name.is_empty() {
            return Err("schema name is empty".to_string());
        }
        if name.len() > Self::MAX_LEN {
            return Err(format!("schema name exceeds {} bytes", Self::MAX_LEN));
        }
        if name.starts_with(|c: char| c.is_ascii_digit()) {
            return Err(format!("schema name {name:?} starts with a digit"));
        }
        if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(format!("schema name {name:?} is not a plain identifier"));
        }
        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Double-quoted form for use in SQL text.
    pub fn quoted(&self) -> String {
        format!("\"{}\"", self.0)
    }
}

impl TryFrom<String> for SchemaName {
    type Error = String;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::parse(&raw)
    }
}

impl From<SchemaName> for String {
    fn from(name: SchemaName) -> Self {
        name.0
    }
}

impl core::fmt::Display for SchemaName {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity of a live tenant, as returned by the store's tenant listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantIdentity {
    pub customer: String,
    pub tenant_id: TenantId,
    pub plan: PlanTier,
    pub schema_name: Option<String>,
    pub external_crm_id: Option<String>,
    pub region: Region,
}

impl TenantIdentity {
    /// Resolve the tenant's namespace.
    ///
    /// Fails with `MissingTenantData` when the schema is absent or unusable.
    pub fn namespace(&self) -> PipelineResult<SchemaName> {
        let raw = self.schema_name.as_deref().ok_or_else(|| {
            PipelineError::missing_tenant_data(self.tenant_id, "no schema is mapped to the tenant")
        })?;
        SchemaName::parse(raw).map_err(|reason| PipelineError::missing_tenant_data(self.tenant_id, reason))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_names_are_validated_when_deserialized() {
        let ok: SchemaName = serde_json::from_str("\"tenant_acme\"").unwrap();
        assert_eq!(ok.as_str(), "tenant_acme");
        assert_eq!(serde_json::to_string(&ok).unwrap(), "\"tenant_acme\"");

        for bad in ["\"\"", "\"9lives\"", "\"a\\\"; DROP TABLE x; --\""] {
            assert!(serde_json::from_str::<SchemaName>(bad).is_err(), "{bad} was accepted");
        }
    }

    fn identity(schema: Option<&str>) -> TenantIdentity {
        TenantIdentity {
            customer: "acme corp".to_string(),
            tenant_id: TenantId::new(12),
            plan: PlanTier::Pro,
            schema_name: schema.map(str::to_string),
            external_crm_id: None,
            region: Region::Eu,
        }
    }

    #[test]
    fn plan_codes_map_to_tiers() {
        assert_eq!(PlanTier::from_code(Some(0)), PlanTier::Starter);
        assert_eq!(PlanTier::from_code(Some(2)), PlanTier::Enterprise);
        assert_eq!(PlanTier::from_code(Some(9)), PlanTier::ContractNow);
        assert_eq!(PlanTier::from_code(None), PlanTier::ContractNow);
        assert_eq!(
            serde_json::to_string(&PlanTier::ContractNow).unwrap(),
            "\"Contract Now\""
        );
    }

    #[test]
    fn namespace_resolves_plain_identifiers() {
        let ns = identity(Some("tenant_acme_12")).namespace().unwrap();
        assert_eq!(ns.as_str(), "tenant_acme_12");
        assert_eq!(ns.quoted(), "\"tenant_acme_12\"");
    }

    #[test]
    fn namespace_rejects_missing_or_unsafe_schemas() {
        for schema in [None, Some(""), Some("  "), Some("1abc"), Some("a;drop table x"), Some("a\"b")] {
            match identity(schema).namespace() {
                Err(PipelineError::MissingTenantData { tenant_id, .. }) => {
                    assert_eq!(tenant_id, TenantId::new(12));
                }
                other => panic!("expected MissingTenantData for {schema:?}, got {other:?}"),
            }
        }
    }
}
