//! Metric normalizer: raw facts → canonical record.
//!
//! Pure transform. Missing aggregates never fail normalization; every gap
//! resolves to a documented default and is reported as a debug event:
//!
//! | Kind            | Default      |
//! |-----------------|--------------|
//! | count           | `0`          |
//! | capability flag | `Disabled` / `OFF` |
//! | label aggregate | `""`         |
//! | decimal average | `0`          |
//! | percentage      | absent when its denominator is `0` |
//! | date / currency | absent       |
//!
//! Derived values are always recomputed here, never trusted from the source:
//! the passive user count and both percentages.

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::debug;

use crate::error::PipelineResult;
use crate::id::TenantId;
use crate::identity::TenantIdentity;
use crate::metric::{MetricKey, RawFacts, RawValue};
use crate::record::{
    Activity, CanonicalRecord, Compliance, Contracts, DocumentIntelligence, Esign, EsignChannel,
    Events, FeatureAdoption, Switch, Toggle, Windowed,
};

/// Build the canonical record for one tenant.
///
/// Fails only when the identity cannot be resolved to a namespace
/// (`PipelineError::MissingTenantData`).
pub fn normalize(identity: &TenantIdentity, facts: &RawFacts) -> PipelineResult<CanonicalRecord> {
    let schema_name = identity.namespace()?;
    let window = facts.window;

    if facts.rows.is_empty() {
        debug!(
            tenant_id = %identity.tenant_id,
            customer = %identity.customer,
            "aggregate returned no rows; all metrics take their defaults"
        );
    }

    let (values, unknown) = facts.resolve();
    for column in &unknown {
        debug!(tenant_id = %identity.tenant_id, column = %column, "ignoring unrecognised metric column");
    }

    let m = Metrics {
        tenant_id: identity.tenant_id,
        values,
    };
    let w = |value| Windowed::new(value, window);

    let logged_in = m.count(MetricKey::LoggedInCount);
    let active = m.count(MetricKey::ActiveCount);
    let activity = Activity {
        logged_in: w(logged_in),
        active: w(active),
        inactive: w(passive_count(logged_in, active)),
    };

    let live = m.count(MetricKey::LiveContracts);
    let owned = m.count(MetricKey::OwnedLiveContracts);
    let contracts = Contracts {
        total: m.count(MetricKey::TotalContracts),
        live,
        new_live: w(m.count(MetricKey::NewLiveContracts)),
        updated_live: w(m.count(MetricKey::UpdatedLiveContracts)),
        currency: m.optional_text(MetricKey::MainCurrency),
        average_value: m.decimal(MetricKey::AverageContractValue),
        owned,
        unowned: m.count(MetricKey::UnownedLiveContracts),
        owned_percentage: percentage(owned, live),
        linked_contracts: m.count(MetricKey::LinkedContracts),
        linked_suppliers: m.count(MetricKey::LinkedSuppliers),
    };

    let master_records = m.count(MetricKey::MasterRecordCount);
    let contract_reviews = m.count(MetricKey::ContractReviews);
    let compliance = Compliance {
        master_records,
        contract_reviews,
        master_record_percentage: percentage(master_records, contract_reviews),
    };

    let intelligence = DocumentIntelligence {
        ai_extract_ready: w(m.count(MetricKey::AiExtractReady)),
        ai_contract_summary: Switch::from_flag(m.flag(MetricKey::AiContractSummary)),
    };

    let events = Events {
        total: m.count(MetricKey::EventsTotal),
        new: w(m.count(MetricKey::EventsNew)),
        completed: w(m.count(MetricKey::EventsCompleted)),
        overdue: m.count(MetricKey::EventsOverdue),
        avg_completion_days: Windowed::new(m.whole_days(MetricKey::EventsAvgCompletionDays), window),
        types: m.text(MetricKey::EventTypes),
    };

    let adoption = FeatureAdoption {
        rbac: Toggle::from_flag(m.flag(MetricKey::RbacStatus)),
        rbac_groups: m.count(MetricKey::RbacGroups),
        saved_views: m.count(MetricKey::SavedCustomViews),
        smart_forms: Switch::from_flag(m.flag(MetricKey::SmartFormsEnabled)),
        smart_forms_count: m.count(MetricKey::SmartFormsCount),
        smart_form_types: m.text(MetricKey::SmartFormTypes),
        smart_forms_latest_score: m.date(MetricKey::SmartFormsLatestScore),
        smart_forms_unscored: m.count(MetricKey::SmartFormsUnscored),
        auto_build: Switch::from_flag(m.flag(MetricKey::AutoBuildEnabled)),
        auto_build_suppliers: m.count(MetricKey::AutoBuildSuppliers),
    };

    let esign = Esign {
        native: EsignChannel {
            enabled: Toggle::from_flag(m.flag(MetricKey::NativeEsignEnabled)),
            signed: w(m.count(MetricKey::NativeEsigns)),
        },
        docusign: EsignChannel {
            enabled: Toggle::from_flag(m.flag(MetricKey::DocusignEnabled)),
            signed: w(m.count(MetricKey::Docusigns)),
        },
    };

    Ok(CanonicalRecord {
        customer: identity.customer.clone(),
        tenant_id: identity.tenant_id,
        plan: identity.plan,
        schema_name,
        external_crm_id: identity.external_crm_id.clone(),
        region: identity.region,
        months_lookback: window,
        activity,
        contracts,
        compliance,
        intelligence,
        events,
        adoption,
        esign,
    })
}

/// Users who logged in without acting; never negative.
pub fn passive_count(logged_in: u64, active: u64) -> u64 {
    logged_in.saturating_sub(active)
}

/// `round(numerator / denominator * 100, 2)`, half away from zero, clamped to
/// `[0, 100]`. Absent when the denominator is zero.
pub fn percentage(numerator: u64, denominator: u64) -> Option<Decimal> {
    if denominator == 0 {
        return None;
    }
    let raw = Decimal::from(numerator) * Decimal::ONE_HUNDRED / Decimal::from(denominator);
    let mut pct = raw
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        .min(Decimal::ONE_HUNDRED);
    pct.rescale(2);
    Some(pct)
}

/// Resolved metric values for one tenant, with gap reporting.
struct Metrics {
    tenant_id: TenantId,
    values: HashMap<MetricKey, RawValue>,
}

impl Metrics {
    fn gap(&self, key: MetricKey, default: &str) {
        debug!(
            tenant_id = %self.tenant_id,
            metric = %key,
            default = default,
            "metric gap resolved to default"
        );
    }

    fn lookup<T>(&self, key: MetricKey, view: impl Fn(&RawValue) -> Option<T>) -> Option<T> {
        let value = self.values.get(&key)?;
        let out = view(value);
        if out.is_none() {
            debug!(tenant_id = %self.tenant_id, metric = %key, value = ?value, "metric value has an unexpected type");
        }
        out
    }

    fn count(&self, key: MetricKey) -> u64 {
        match self.lookup(key, RawValue::as_integer) {
            Some(v) if v < 0 => {
                debug!(tenant_id = %self.tenant_id, metric = %key, value = v, "negative count clamped to 0");
                0
            }
            Some(v) => v as u64,
            None => {
                self.gap(key, "0");
                0
            }
        }
    }

    fn decimal(&self, key: MetricKey) -> Decimal {
        self.lookup(key, RawValue::as_decimal).unwrap_or_else(|| {
            self.gap(key, "0");
            Decimal::ZERO
        })
    }

    fn whole_days(&self, key: MetricKey) -> i64 {
        self.lookup(key, RawValue::as_decimal)
            .and_then(|d| {
                d.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
                    .to_i64()
            })
            .unwrap_or_else(|| {
                self.gap(key, "0");
                0
            })
    }

    fn flag(&self, key: MetricKey) -> bool {
        self.lookup(key, RawValue::as_flag).unwrap_or_else(|| {
            self.gap(key, "off");
            false
        })
    }

    fn text(&self, key: MetricKey) -> String {
        self.optional_text(key).unwrap_or_else(|| {
            self.gap(key, "\"\"");
            String::new()
        })
    }

    fn optional_text(&self, key: MetricKey) -> Option<String> {
        self.lookup(key, |v| v.as_text().map(str::to_string))
    }

    fn date(&self, key: MetricKey) -> Option<NaiveDate> {
        self.lookup(key, RawValue::as_date)
    }
}
