//! Historical usage data access
//!
//! The data store is opened once by the caller and passed explicitly to every
//! per-VM pipeline run.

use crate::error::ForecastError;
use crate::models::UsageRecord;
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::info;

/// How long opening the pool may wait for a first connection by default
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Read-only queries against the usage history
#[async_trait]
pub trait UsageStore: Send + Sync {
    /// Every VM with at least one usage value, in a stable order
    async fn list_vms(&self) -> Result<Vec<String>, ForecastError>;

    /// Non-null usage rows for `vm` within `[start, end]`, ordered by date
    async fn usage_history(
        &self,
        vm: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<UsageRecord>, ForecastError>;

    /// Most recent non-null provisioned capacity of `vm`
    async fn provisioned_capacity(&self, vm: &str) -> Result<Option<f64>, ForecastError>;
}

const LIST_VMS: &str = r#"
    SELECT DISTINCT "VM"
    FROM info
    WHERE "In_Use_MiB" IS NOT NULL AND "VM" IS NOT NULL
    ORDER BY "VM"
"#;

const USAGE_HISTORY: &str = r#"
    SELECT "Date"::date, "In_Use_MiB"::float8
    FROM info
    WHERE "VM" = $1
      AND "In_Use_MiB" IS NOT NULL
      AND "Date"::date BETWEEN $2 AND $3
    ORDER BY "Date"
"#;

const PROVISIONED_CAPACITY: &str = r#"
    SELECT "Provisioned_MiB"::float8
    FROM info
    WHERE "VM" = $1 AND "Provisioned_MiB" IS NOT NULL
    ORDER BY "Date" DESC
    LIMIT 1
"#;

/// PostgreSQL-backed usage store over the `info` table
pub struct PgUsageStore {
    pool: PgPool,
}

impl PgUsageStore {
    /// Open a connection pool
    pub async fn connect(database_url: &str) -> Result<Self, ForecastError> {
        Self::connect_with_timeout(database_url, DEFAULT_CONNECT_TIMEOUT).await
    }

    /// Open a connection pool, giving up after `timeout` without a connection
    pub async fn connect_with_timeout(
        database_url: &str,
        timeout: Duration,
    ) -> Result<Self, ForecastError> {
        info!(timeout_ms = timeout.as_millis() as u64, "Connecting to database...");

        let pool = PgPoolOptions::new()
            .max_connections(2)
            .min_connections(1)
            .acquire_timeout(timeout)
            .connect(database_url)
            .await?;

        info!("Database connection established");

        Ok(Self { pool })
    }

    /// Close every pooled connection
    pub async fn close(self) {
        self.pool.close().await;
        info!("Database connection closed");
    }
}

#[async_trait]
impl UsageStore for PgUsageStore {
    async fn list_vms(&self) -> Result<Vec<String>, ForecastError> {
        sqlx::query_scalar::<_, String>(LIST_VMS)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| ForecastError::Lookup(e.to_string()))
    }

    async fn usage_history(
        &self,
        vm: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<UsageRecord>, ForecastError> {
        let rows = sqlx::query_as::<_, (NaiveDate, f64)>(USAGE_HISTORY)
            .bind(vm)
            .bind(start)
            .bind(end)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(date, in_use_mib)| UsageRecord::new(date, in_use_mib))
            .collect())
    }

    async fn provisioned_capacity(&self, vm: &str) -> Result<Option<f64>, ForecastError> {
        Ok(sqlx::query_scalar::<_, f64>(PROVISIONED_CAPACITY)
            .bind(vm)
            .fetch_optional(&self.pool)
            .await?)
    }
}

/// In-memory usage store
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    usage: BTreeMap<String, Vec<UsageRecord>>,
    capacity: BTreeMap<String, f64>,
    lookup_failure: Option<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add usage rows for a VM
    pub fn with_usage(mut self, vm: impl Into<String>, records: Vec<UsageRecord>) -> Self {
        self.usage.entry(vm.into()).or_default().extend(records);
        self
    }

    /// Set the provisioned capacity of a VM
    pub fn with_capacity(mut self, vm: impl Into<String>, provisioned_mib: f64) -> Self {
        self.capacity.insert(vm.into(), provisioned_mib);
        self
    }

    /// Make `list_vms` fail with the given message
    pub fn with_lookup_failure(mut self, message: impl Into<String>) -> Self {
        self.lookup_failure = Some(message.into());
        self
    }
}

#[async_trait]
impl UsageStore for MemoryStore {
    async fn list_vms(&self) -> Result<Vec<String>, ForecastError> {
        if let Some(message) = &self.lookup_failure {
            return Err(ForecastError::Lookup(message.clone()));
        }
        Ok(self
            .usage
            .iter()
            .filter(|(_, records)| !records.is_empty())
            .map(|(vm, _)| vm.clone())
            .collect())
    }

    async fn usage_history(
        &self,
        vm: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<UsageRecord>, ForecastError> {
        let mut records: Vec<UsageRecord> = self
            .usage
            .get(vm)
            .map(|records| {
                records
                    .iter()
                    .filter(|r| r.date >= start && r.date <= end && !r.in_use_mib.is_nan())
                    .copied()
                    .collect()
            })
            .unwrap_or_default();
        records.sort_by_key(|r| r.date);
        Ok(records)
    }

    async fn provisioned_capacity(&self, vm: &str) -> Result<Option<f64>, ForecastError> {
        Ok(self.capacity.get(vm).copied())
    }
}
