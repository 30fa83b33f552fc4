//! Metric keys and the raw columnar facts returned by a metric source.
//!
//! Sources may label columns either with the stable semantic key
//! (`new_live_contracts`) or with a human-readable label that embeds the
//! lookback window (`NEW Live Contracts (3m)`). Both resolve to the same
//! [`MetricKey`], so changing the window never breaks lookup.

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::record::LookbackWindow;

macro_rules! metric_keys {
    ($($variant:ident => $key:literal, $label:literal, $windowed:literal;)+) => {
        /// Stable semantic identity of a metric, independent of the lookback window.
        #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum MetricKey {
            $($variant,)+
        }

        impl MetricKey {
            pub const ALL: &'static [MetricKey] = &[$(MetricKey::$variant,)+];

            /// Stable semantic key (column alias used by the Postgres source).
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(MetricKey::$variant => $key,)+
                }
            }

            /// Display label without any window suffix.
            pub fn label(&self) -> &'static str {
                match self {
                    $(MetricKey::$variant => $label,)+
                }
            }

            /// Whether the metric is computed over the lookback window.
            pub fn is_windowed(&self) -> bool {
                match self {
                    $(MetricKey::$variant => $windowed,)+
                }
            }
        }
    };
}

metric_keys! {
    LoggedInCount => "logged_in_count", "Total Logged In Users", true;
    ActiveCount => "active_count", "Users Who Performed Actions", true;
    InactiveCount => "inactive_count", "Users Who Only Logged In", true;
    RbacStatus => "rbac_status", "RBAC Status", false;
    RbacGroups => "rbac_groups", "RBAC Groups", false;
    TotalContracts => "total_contracts", "Total Contracts (inc Archived)", false;
    LiveContracts => "live_contracts", "Total Live Contracts", false;
    NewLiveContracts => "new_live_contracts", "NEW Live Contracts", true;
    UpdatedLiveContracts => "updated_live_contracts", "Updated Live Contracts", true;
    MainCurrency => "main_currency", "Main Currency", false;
    AverageContractValue => "average_contract_value", "Average Contract Value (Live)", false;
    OwnedLiveContracts => "owned_live_contracts", "Live Contracts with Internal Owners", false;
    UnownedLiveContracts => "unowned_live_contracts", "Live Contracts with NO Internal Owners", false;
    OwnedPercentage => "owned_percentage", "Percent Contracts with Internal Owners", false;
    LinkedContracts => "linked_contracts", "Live Contracts Linked to another Contract", false;
    LinkedSuppliers => "linked_suppliers", "Live Suppliers Linked to another Supplier", false;
    MasterRecordCount => "master_record_count", "Contracts with Master Record", false;
    ContractReviews => "contract_reviews", "Total Contract Reviews", false;
    MasterRecordPercentage => "master_record_percentage", "Percent with Master Record", false;
    AiExtractReady => "ai_extract_ready", "AI Extract - Ready for Review", true;
    AiContractSummary => "ai_contract_summary", "OpenAI Contract Summary", false;
    EventsTotal => "events_total", "Total Events (All Time)", false;
    EventsNew => "events_new", "New Events", true;
    EventsCompleted => "events_completed", "Completed Events", true;
    EventsOverdue => "events_overdue", "Overdue Events", false;
    EventsAvgCompletionDays => "events_avg_completion_days", "Events Avg Completion Time", true;
    EventTypes => "event_types", "Event Types", false;
    SmartFormsEnabled => "smart_forms_enabled", "Smart Forms Enabled", false;
    SmartFormsCount => "smart_forms_count", "Smart Forms Count", false;
    SmartFormTypes => "smart_form_types", "Smart Form Types", false;
    SmartFormsLatestScore => "smart_forms_latest_score", "Latest Updated Score", false;
    SmartFormsUnscored => "smart_forms_unscored", "Smart Forms with No Scores", false;
    SavedCustomViews => "saved_custom_views", "Saved Custom Views", false;
    AutoBuildEnabled => "auto_build_enabled", "Auto Build Enabled", false;
    AutoBuildSuppliers => "auto_build_suppliers", "Autobuild Supplier Count", false;
    NativeEsignEnabled => "native_esign_enabled", "eSign Enabled", false;
    DocusignEnabled => "docusign_enabled", "DocuSign Enabled", false;
    NativeEsigns => "native_esigns", "eSigns", true;
    Docusigns => "docusigns", "DocuSigns", true;
}

impl MetricKey {
    /// Display label for a given window, e.g. `Total Logged In Users (3m)`.
    pub fn display_label(&self, window: LookbackWindow) -> String {
        if self.is_windowed() {
            format!("{} ({}m)", self.label(), window.months())
        } else {
            self.label().to_string()
        }
    }

    /// Resolve a source column name to a metric key.
    ///
    /// Accepts the semantic key or the display label with an optional
    /// trailing ` (<N>m)` window suffix. Matching is case-sensitive on the
    /// label because several labels differ only by case (`eSigns`).
    pub fn resolve(column: &str) -> Option<MetricKey> {
        let column = column.trim();
        if let Some(key) = Self::ALL.iter().find(|k| k.as_str() == column) {
            return Some(*key);
        }
        let base = strip_window_suffix(column);
        Self::ALL.iter().copied().find(|k| k.label() == base)
    }
}

impl core::fmt::Display for MetricKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Drop a trailing ` (<digits>m)` suffix, if present.
fn strip_window_suffix(label: &str) -> &str {
    let Some(open) = label.rfind(" (") else {
        return label;
    };
    let Some(inner) = label[open + 2..].strip_suffix(')') else {
        return label;
    };
    match inner.strip_suffix('m') {
        Some(digits) if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) => {
            &label[..open]
        }
        _ => label,
    }
}

/// One cell of a raw facts row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RawValue {
    Null,
    Integer(i64),
    Decimal(Decimal),
    Text(String),
    Bool(bool),
    Date(NaiveDate),
}

impl RawValue {
    pub fn is_null(&self) -> bool {
        matches!(self, RawValue::Null)
    }

    /// Integer view. Decimals truncate toward zero; text may carry thousands separators.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            RawValue::Integer(v) => Some(*v),
            RawValue::Decimal(d) => d.trunc().to_i64(),
            RawValue::Text(s) => s.trim().replace(',', "").parse::<i64>().ok(),
            _ => None,
        }
    }

    /// Exact decimal view.
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            RawValue::Integer(v) => Some(Decimal::from(*v)),
            RawValue::Decimal(d) => Some(*d),
            RawValue::Text(s) => s.trim().replace(',', "").parse::<Decimal>().ok(),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            RawValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Capability-flag view: booleans, `Enabled`/`Disabled`, `ON`/`OFF`.
    pub fn as_flag(&self) -> Option<bool> {
        match self {
            RawValue::Bool(b) => Some(*b),
            RawValue::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "enabled" | "on" | "true" | "t" => Some(true),
                "disabled" | "off" | "false" | "f" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            RawValue::Date(d) => Some(*d),
            RawValue::Text(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok(),
            _ => None,
        }
    }
}

/// Raw facts for one tenant: the joined-aggregate rows plus their column names.
///
/// Only the first row is meaningful; an empty `rows` means the aggregate
/// produced nothing for this tenant. `window` is the lookback the source
/// queried with.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawFacts {
    pub window: LookbackWindow,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<RawValue>>,
}

impl RawFacts {
    pub fn new(window: LookbackWindow, columns: Vec<String>, rows: Vec<Vec<RawValue>>) -> Self {
        Self {
            window,
            columns,
            rows,
        }
    }

    /// Build a single-row bundle from `(column, value)` pairs.
    pub fn single_row<I, S>(window: LookbackWindow, cells: I) -> Self
    where
        I: IntoIterator<Item = (S, RawValue)>,
        S: Into<String>,
    {
        let (columns, row): (Vec<String>, Vec<RawValue>) =
            cells.into_iter().map(|(c, v)| (c.into(), v)).unzip();
        Self {
            window,
            columns,
            rows: vec![row],
        }
    }

    /// Map the first row onto metric keys.
    ///
    /// Null cells are dropped, so callers see them exactly like missing
    /// columns. Columns that resolve to no key are returned separately.
    pub fn resolve(&self) -> (HashMap<MetricKey, RawValue>, Vec<String>) {
        let mut resolved = HashMap::new();
        let mut unknown = Vec::new();
        let Some(row) = self.rows.first() else {
            return (resolved, unknown);
        };

        for (column, value) in self.columns.iter().zip(row.iter()) {
            match MetricKey::resolve(column) {
                Some(key) => {
                    if !value.is_null() {
                        resolved.entry(key).or_insert_with(|| value.clone());
                    }
                }
                None => unknown.push(column.clone()),
            }
        }
        (resolved, unknown)
    }
}
