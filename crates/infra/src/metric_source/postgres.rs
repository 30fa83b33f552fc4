//! Postgres-backed metric source.
//!
//! One single-connection pool is opened per region and shared by every
//! tenant query in that region.
//!
//! ## Error Mapping
//!
//! | SQLx Error | SourceError | Scenario |
//! |------------|-------------|----------|
//! | Configuration | `Configuration` | Malformed database URL |
//! | Io / Tls / PoolTimedOut / PoolClosed | `Connection` | Store unreachable or pool gone |
//! | Database | `Query` | SQL error reported by the server (code included) |
//! | ColumnDecode / Decode | `Decode` | Column value of an unexpected type |
//! | Other | `Query` | Anything else raised while querying |
//!
//! Columns whose Postgres type has no [`RawValue`] counterpart decode as
//! `RawValue::Null`, so the metric falls back to its default instead of
//! failing the tenant.

use std::time::Duration;

use rust_decimal::Decimal;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{Column, PgPool, Row, TypeInfo};
use tracing::{debug, instrument};

use async_trait::async_trait;
use tenantpulse_core::{
    LookbackWindow, PipelineError, PlanTier, RawFacts, RawValue, Region, SchemaName, TenantId, TenantIdentity,
};

use super::query;
use super::{RegionConnector, RegionSession, SourceError};
use crate::config::SourceSettings;
use crate::region_directory::RegionDirectory;

/// Opens Postgres sessions for the regions listed in a [`RegionDirectory`].
#[derive(Debug, Clone)]
pub struct PostgresConnector {
    directory: RegionDirectory,
    settings: SourceSettings,
}

impl PostgresConnector {
    pub fn new(directory: RegionDirectory, settings: SourceSettings) -> Self {
        Self {
            directory,
            settings,
        }
    }
}

#[async_trait]
impl RegionConnector for PostgresConnector {
    type Session = PostgresSession;

    #[instrument(skip(self), fields(region = %region))]
    async fn open(&self, region: Region) -> Result<PostgresSession, SourceError> {
        let url = self
            .directory
            .target(region)
            .map_err(|e| match e {
                PipelineError::Configuration(msg) => SourceError::Configuration(msg),
                other => SourceError::Configuration(other.to_string()),
            })?;

        let pool = PgPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(Duration::from_secs(self.settings.acquire_timeout_seconds))
            .connect(url)
            .await
            .map_err(|e| map_sqlx_error("open", e))?;

        debug!("region session opened");
        Ok(PostgresSession {
            region,
            pool,
            excluded_email_suffix: self.settings.excluded_email_suffix.clone(),
        })
    }
}

#[derive(Debug)]
pub struct PostgresSession {
    region: Region,
    pool: PgPool,
    excluded_email_suffix: Option<String>,
}

#[async_trait]
impl RegionSession for PostgresSession {
    fn region(&self) -> Region {
        self.region
    }

    #[instrument(skip(self), fields(region = %self.region))]
    async fn list_live_tenants(&self) -> Result<Vec<TenantIdentity>, SourceError> {
        let rows = sqlx::query(query::LIVE_TENANTS)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_live_tenants", e))?;

        rows.iter().map(|row| identity_from_row(row, self.region)).collect()
    }

    #[instrument(skip(self), fields(region = %self.region, tenant_id = %tenant_id, window = %window))]
    async fn fetch(
        &self,
        tenant_id: TenantId,
        schema: &SchemaName,
        window: LookbackWindow,
    ) -> Result<RawFacts, SourceError> {
        let sql = query::tenant_facts(schema);
        let months = i32::try_from(window.months()).map_err(|_| {
            SourceError::Configuration(format!("lookback window {window} is out of range"))
        })?;

        let rows = sqlx::query(&sql)
            .bind(tenant_id.get())
            .bind(months)
            .bind(self.excluded_email_suffix.as_deref())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("fetch", e))?;

        let columns: Vec<String> = rows
            .first()
            .map(|row| row.columns().iter().map(|c| c.name().to_string()).collect())
            .unwrap_or_default();
        let values = rows
            .iter()
            .map(decode_row)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(RawFacts::new(window, columns, values))
    }

    async fn close(self) {
        self.pool.close().await;
        debug!(region = %self.region, "region session closed");
    }
}

fn identity_from_row(row: &PgRow, region: Region) -> Result<TenantIdentity, SourceError> {
    let get_text = |column: &str| -> Result<Option<String>, SourceError> {
        row.try_get::<Option<String>, _>(column)
            .map_err(|e| map_sqlx_error("list_live_tenants", e))
    };

    let tenant_id: i64 = row
        .try_get("tenant_id")
        .map_err(|e| map_sqlx_error("list_live_tenants", e))?;
    let plan_code: Option<i64> = row
        .try_get("plan_code")
        .map_err(|e| map_sqlx_error("list_live_tenants", e))?;

    Ok(TenantIdentity {
        customer: get_text("customer")?.unwrap_or_default(),
        tenant_id: TenantId::new(tenant_id),
        plan: PlanTier::from_code(plan_code),
        schema_name: get_text("schema_name")?,
        external_crm_id: get_text("external_crm_id")?,
        region,
    })
}

fn decode_row(row: &PgRow) -> Result<Vec<RawValue>, SourceError> {
    (0..row.columns().len()).map(|i| decode_cell(row, i)).collect()
}

/// How a Postgres column type is read into a [`RawValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellKind {
    Int8,
    Int4,
    Int2,
    Numeric,
    Float8,
    Float4,
    Bool,
    Date,
    Text,
    Unsupported,
}

impl CellKind {
    fn of(type_name: &str) -> Self {
        match type_name {
            "INT8" => CellKind::Int8,
            "INT4" => CellKind::Int4,
            "INT2" => CellKind::Int2,
            "NUMERIC" => CellKind::Numeric,
            "FLOAT8" => CellKind::Float8,
            "FLOAT4" => CellKind::Float4,
            "BOOL" => CellKind::Bool,
            "DATE" => CellKind::Date,
            "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" => CellKind::Text,
            _ => CellKind::Unsupported,
        }
    }
}

/// Decode one cell by its Postgres type name.
fn decode_cell(row: &PgRow, index: usize) -> Result<RawValue, SourceError> {
    let column = &row.columns()[index];
    let type_name = column.type_info().name();
    let decode_err = |e: sqlx::Error| SourceError::Decode {
        column: column.name().to_string(),
        message: e.to_string(),
    };
    let float = |v: f64| {
        Decimal::try_from(v).map(RawValue::Decimal).map_err(|e| SourceError::Decode {
            column: column.name().to_string(),
            message: e.to_string(),
        })
    };

    let value = match CellKind::of(type_name) {
        CellKind::Int8 => row.try_get::<Option<i64>, _>(index).map_err(decode_err)?.map(RawValue::Integer),
        CellKind::Int4 => row
            .try_get::<Option<i32>, _>(index)
            .map_err(decode_err)?
            .map(|v| RawValue::Integer(v.into())),
        CellKind::Int2 => row
            .try_get::<Option<i16>, _>(index)
            .map_err(decode_err)?
            .map(|v| RawValue::Integer(v.into())),
        CellKind::Numeric => row
            .try_get::<Option<Decimal>, _>(index)
            .map_err(decode_err)?
            .map(RawValue::Decimal),
        CellKind::Float8 => row
            .try_get::<Option<f64>, _>(index)
            .map_err(decode_err)?
            .map(float)
            .transpose()?,
        CellKind::Float4 => row
            .try_get::<Option<f32>, _>(index)
            .map_err(decode_err)?
            .map(|v| float(f64::from(v)))
            .transpose()?,
        CellKind::Bool => row.try_get::<Option<bool>, _>(index).map_err(decode_err)?.map(RawValue::Bool),
        CellKind::Date => row
            .try_get::<Option<chrono::NaiveDate>, _>(index)
            .map_err(decode_err)?
            .map(RawValue::Date),
        CellKind::Text => row
            .try_get::<Option<String>, _>(index)
            .map_err(decode_err)?
            .map(RawValue::Text),
        CellKind::Unsupported => {
            debug!(column = column.name(), type_name, "unsupported column type decoded as null");
            None
        }
    };

    Ok(value.unwrap_or(RawValue::Null))
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> SourceError {
    match err {
        sqlx::Error::Configuration(e) => {
            SourceError::Configuration(format!("invalid database URL in {operation}: {e}"))
        }
        sqlx::Error::Io(e) => SourceError::connection(operation, e.to_string()),
        sqlx::Error::Tls(e) => SourceError::connection(operation, e.to_string()),
        sqlx::Error::PoolTimedOut => {
            SourceError::connection(operation, "timed out acquiring a connection")
        }
        sqlx::Error::PoolClosed => SourceError::connection(operation, "connection pool closed"),
        sqlx::Error::Database(db_err) => {
            let code = db_err.code().map(|c| c.to_string()).unwrap_or_default();
            SourceError::query(operation, format!("[{code}] {}", db_err.message()))
        }
        sqlx::Error::ColumnDecode { index, source } => SourceError::Decode {
            column: index,
            message: source.to_string(),
        },
        sqlx::Error::Decode(e) => SourceError::Decode {
            column: operation.to_string(),
            message: e.to_string(),
        },
        other => SourceError::query(operation, other.to_string()),
    }
}
