//! The canonical customer record.
//!
//! One record is built per tenant per run by the normalizer, then handed by
//! value to the narrative collaborator and the document composer. It is never
//! mutated after construction.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::id::TenantId;
use crate::identity::{PlanTier, SchemaName};
use crate::metric::MetricKey;
use crate::region::Region;

/// Trailing window, in months, used for every windowed metric of a run.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct LookbackWindow(u32);

impl LookbackWindow {
    /// A window must cover at least one month.
    pub fn new(months: u32) -> Option<Self> {
        (months >= 1).then_some(Self(months))
    }

    pub fn months(&self) -> u32 {
        self.0
    }

    /// Human statement used on the cover page.
    pub fn statement(&self) -> String {
        let plural = if self.0 == 1 { "" } else { "s" };
        format!("Report covers last {} month{}", self.0, plural)
    }
}

impl Default for LookbackWindow {
    fn default() -> Self {
        Self(1)
    }
}

impl TryFrom<u32> for LookbackWindow {
    type Error = String;

    fn try_from(months: u32) -> Result<Self, Self::Error> {
        Self::new(months).ok_or_else(|| format!("lookback window must be at least 1 month, got {months}"))
    }
}

impl From<LookbackWindow> for u32 {
    fn from(window: LookbackWindow) -> Self {
        window.0
    }
}

impl core::fmt::Display for LookbackWindow {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}m", self.0)
    }
}

/// A metric computed over a lookback window, tagged with that window.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Windowed<T> {
    pub value: T,
    pub lookback_months: LookbackWindow,
}

impl<T> Windowed<T> {
    pub fn new(value: T, window: LookbackWindow) -> Self {
        Self {
            value,
            lookback_months: window,
        }
    }
}

/// `Enabled` / `Disabled` capability flag.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Toggle {
    Enabled,
    #[default]
    Disabled,
}

impl Toggle {
    pub fn from_flag(enabled: bool) -> Self {
        if enabled { Toggle::Enabled } else { Toggle::Disabled }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, Toggle::Enabled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Toggle::Enabled => "Enabled",
            Toggle::Disabled => "Disabled",
        }
    }
}

/// `ON` / `OFF` capability flag.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Switch {
    #[serde(rename = "ON")]
    On,
    #[default]
    #[serde(rename = "OFF")]
    Off,
}

impl Switch {
    pub fn from_flag(on: bool) -> Self {
        if on { Switch::On } else { Switch::Off }
    }

    pub fn is_on(&self) -> bool {
        matches!(self, Switch::On)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Switch::On => "ON",
            Switch::Off => "OFF",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub logged_in: Windowed<u64>,
    pub active: Windowed<u64>,
    /// Logged in without performing actions; `max(logged_in - active, 0)`.
    pub inactive: Windowed<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contracts {
    /// All contracts, archived included.
    pub total: u64,
    pub live: u64,
    pub new_live: Windowed<u64>,
    pub updated_live: Windowed<u64>,
    pub currency: Option<String>,
    /// Average annual value of live contracts, in `currency` units.
    #[serde(with = "rust_decimal::serde::str")]
    pub average_value: Decimal,
    pub owned: u64,
    pub unowned: u64,
    /// `owned / live * 100`, absent when there are no live contracts.
    #[serde(with = "rust_decimal::serde::str_option")]
    pub owned_percentage: Option<Decimal>,
    pub linked_contracts: u64,
    pub linked_suppliers: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Compliance {
    pub master_records: u64,
    pub contract_reviews: u64,
    /// `master_records / contract_reviews * 100`, absent when there are no reviews.
    #[serde(with = "rust_decimal::serde::str_option")]
    pub master_record_percentage: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentIntelligence {
    pub ai_extract_ready: Windowed<u64>,
    pub ai_contract_summary: Switch,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Events {
    pub total: u64,
    pub new: Windowed<u64>,
    pub completed: Windowed<u64>,
    pub overdue: u64,
    /// Whole days, rounded half away from zero.
    pub avg_completion_days: Windowed<i64>,
    /// Distinct event type labels joined with ` | `.
    pub types: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureAdoption {
    pub rbac: Toggle,
    pub rbac_groups: u64,
    pub saved_views: u64,
    pub smart_forms: Switch,
    pub smart_forms_count: u64,
    pub smart_form_types: String,
    pub smart_forms_latest_score: Option<NaiveDate>,
    pub smart_forms_unscored: u64,
    pub auto_build: Switch,
    pub auto_build_suppliers: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EsignChannel {
    pub enabled: Toggle,
    pub signed: Windowed<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Esign {
    pub native: EsignChannel,
    pub docusign: EsignChannel,
}

/// Fixed-shape, normalized metric bundle for one tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    pub customer: String,
    pub tenant_id: TenantId,
    pub plan: PlanTier,
    pub schema_name: SchemaName,
    pub external_crm_id: Option<String>,
    pub region: Region,
    pub months_lookback: LookbackWindow,

    pub activity: Activity,
    pub contracts: Contracts,
    pub compliance: Compliance,
    pub intelligence: DocumentIntelligence,
    pub events: Events,
    pub adoption: FeatureAdoption,
    pub esign: Esign,
}

/// A displayable metric value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Count(u64),
    Integer(i64),
    Decimal(Decimal),
    Text(String),
    Date(NaiveDate),
}

impl FieldValue {
    /// Numeric view used by charts. Text and dates have none.
    pub fn as_count(&self) -> Option<u64> {
        match self {
            FieldValue::Count(v) => Some(*v),
            FieldValue::Integer(v) => u64::try_from(*v).ok(),
            _ => None,
        }
    }
}

impl core::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            FieldValue::Count(v) => write!(f, "{v}"),
            FieldValue::Integer(v) => write!(f, "{v}"),
            FieldValue::Decimal(v) => write!(f, "{v}"),
            FieldValue::Text(v) => f.write_str(v),
            FieldValue::Date(v) => write!(f, "{}", v.format("%Y-%m-%d")),
        }
    }
}

impl CanonicalRecord {
    /// Lookback months of every windowed field, in declaration order.
    pub fn windowed_months(&self) -> Vec<u32> {
        [
            self.activity.logged_in.lookback_months,
            self.activity.active.lookback_months,
            self.activity.inactive.lookback_months,
            self.contracts.new_live.lookback_months,
            self.contracts.updated_live.lookback_months,
            self.intelligence.ai_extract_ready.lookback_months,
            self.events.new.lookback_months,
            self.events.completed.lookback_months,
            self.events.avg_completion_days.lookback_months,
            self.esign.native.signed.lookback_months,
            self.esign.docusign.signed.lookback_months,
        ]
        .iter()
        .map(LookbackWindow::months)
        .collect()
    }

    /// Whether every windowed field carries the record's own window.
    pub fn is_window_uniform(&self) -> bool {
        let expected = self.months_lookback.months();
        self.windowed_months().into_iter().all(|m| m == expected)
    }

    /// Metric values keyed by semantic key; absent values are omitted.
    pub fn metric_values(&self) -> Vec<(MetricKey, FieldValue)> {
        use FieldValue::{Count, Date, Decimal as Dec, Integer, Text};
        use MetricKey as K;

        let c = &self.contracts;
        let a = &self.adoption;
        let mut out = vec![
            (K::LoggedInCount, Count(self.activity.logged_in.value)),
            (K::ActiveCount, Count(self.activity.active.value)),
            (K::InactiveCount, Count(self.activity.inactive.value)),
            (K::RbacStatus, Text(a.rbac.as_str().to_string())),
            (K::RbacGroups, Count(a.rbac_groups)),
            (K::TotalContracts, Count(c.total)),
            (K::LiveContracts, Count(c.live)),
            (K::NewLiveContracts, Count(c.new_live.value)),
            (K::UpdatedLiveContracts, Count(c.updated_live.value)),
        ];
        if let Some(currency) = &c.currency {
            out.push((K::MainCurrency, Text(currency.clone())));
        }
        out.push((K::AverageContractValue, Dec(c.average_value)));
        out.push((K::OwnedLiveContracts, Count(c.owned)));
        out.push((K::UnownedLiveContracts, Count(c.unowned)));
        if let Some(pct) = c.owned_percentage {
            out.push((K::OwnedPercentage, Dec(pct)));
        }
        out.push((K::LinkedContracts, Count(c.linked_contracts)));
        out.push((K::LinkedSuppliers, Count(c.linked_suppliers)));
        out.push((K::MasterRecordCount, Count(self.compliance.master_records)));
        out.push((K::ContractReviews, Count(self.compliance.contract_reviews)));
        if let Some(pct) = self.compliance.master_record_percentage {
            out.push((K::MasterRecordPercentage, Dec(pct)));
        }
        out.push((K::AiExtractReady, Count(self.intelligence.ai_extract_ready.value)));
        out.push((
            K::AiContractSummary,
            Text(self.intelligence.ai_contract_summary.as_str().to_string()),
        ));

        let e = &self.events;
        out.extend([
            (K::EventsTotal, Count(e.total)),
            (K::EventsNew, Count(e.new.value)),
            (K::EventsCompleted, Count(e.completed.value)),
            (K::EventsOverdue, Count(e.overdue)),
            (K::EventsAvgCompletionDays, Integer(e.avg_completion_days.value)),
            (K::EventTypes, Text(e.types.clone())),
            (K::SmartFormsEnabled, Text(a.smart_forms.as_str().to_string())),
            (K::SmartFormsCount, Count(a.smart_forms_count)),
            (K::SmartFormTypes, Text(a.smart_form_types.clone())),
        ]);
        if let Some(date) = a.smart_forms_latest_score {
            out.push((K::SmartFormsLatestScore, Date(date)));
        }
        out.extend([
            (K::SmartFormsUnscored, Count(a.smart_forms_unscored)),
            (K::SavedCustomViews, Count(a.saved_views)),
            (K::AutoBuildEnabled, Text(a.auto_build.as_str().to_string())),
            (K::AutoBuildSuppliers, Count(a.auto_build_suppliers)),
            (
                K::NativeEsignEnabled,
                Text(self.esign.native.enabled.as_str().to_string()),
            ),
            (
                K::DocusignEnabled,
                Text(self.esign.docusign.enabled.as_str().to_string()),
            ),
            (K::NativeEsigns, Count(self.esign.native.signed.value)),
            (K::Docusigns, Count(self.esign.docusign.signed.value)),
        ]);
        out
    }

    /// Metric values under display labels, window embedded (`New Events (3m)`).
    ///
    /// Labels are generated here, at render time, from the semantic keys.
    pub fn labelled_fields(&self) -> Vec<(String, FieldValue)> {
        self.metric_values()
            .into_iter()
            .map(|(key, value)| (key.display_label(self.months_lookback), value))
            .collect()
    }

    /// JSON-safe mapping for the narrative collaborator.
    ///
    /// Decimals are encoded as strings and dates as ISO `YYYY-MM-DD`, so the
    /// mapping round-trips without floating-point drift.
    pub fn to_narrative_payload(&self) -> Result<JsonValue, serde_json::Error> {
        serde_json::to_value(self)
    }

    pub fn from_narrative_payload(payload: JsonValue) -> Result<Self, serde_json::Error> {
        serde_json::from_value(payload)
    }

    /// Flat `(column, value)` view of the record for tabular artifacts.
    ///
    /// Columns are the record's field names, nested fields joined with `.`.
    pub fn flat_columns(&self) -> Result<Vec<(String, String)>, serde_json::Error> {
        let payload = self.to_narrative_payload()?;
        let mut out = Vec::new();
        flatten_into(&mut out, String::new(), &payload);
        Ok(out)
    }
}

fn flatten_into(out: &mut Vec<(String, String)>, prefix: String, value: &JsonValue) {
    match value {
        JsonValue::Object(map) => {
            for (key, child) in map {
                let column = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten_into(out, column, child);
            }
        }
        JsonValue::Null => out.push((prefix, String::new())),
        JsonValue::String(s) => out.push((prefix, s.clone())),
        JsonValue::Array(items) => {
            let joined = items
                .iter()
                .map(|i| match i {
                    JsonValue::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join(" | ");
            out.push((prefix, joined));
        }
        other => out.push((prefix, other.to_string())),
    }
}
