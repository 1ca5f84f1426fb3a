//! Repository layer for database operations.
//!
//! This module provides the `Repository` struct for all database operations.
//! Methods are organized across submodules by domain:
//! - `leads.rs` - Lead CRUD and rate-context hydration
//! - `rates.rs` - Rate, building, assignment, and scheduled-change operations
//!
//! `Repository` also implements the `CommissionStore` port the batch jobs
//! consume.

mod leads;
mod rates;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqlitePool;

use crate::domain::{LeadRateContext, Money, ScheduledRateChange};
use crate::store::{CommissionStore, StoreError};

/// Repository for database operations.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Repository { pool }
    }
}

/// Decode a decimal TEXT column, surfacing parse failures as column errors.
pub(crate) fn decode_decimal_column(
    column: &str,
    err: rust_decimal::Error,
) -> sqlx::Error {
    sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(err),
    }
}

#[async_trait]
impl CommissionStore for Repository {
    async fn load_delivered_leads_with_rate_context(
        &self,
    ) -> Result<Vec<LeadRateContext>, StoreError> {
        Ok(Repository::load_delivered_leads_with_rate_context(self).await?)
    }

    async fn update_lead_commission(
        &self,
        lead_id: i64,
        commission: Money,
        source_rate_id: Option<i64>,
    ) -> Result<(), StoreError> {
        Ok(Repository::update_lead_commission(self, lead_id, commission, source_rate_id).await?)
    }

    async fn load_due_scheduled_changes(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<ScheduledRateChange>, StoreError> {
        Ok(Repository::load_due_scheduled_changes(self, now).await?)
    }

    async fn assign_building_rate(
        &self,
        building_id: i64,
        rate_id: i64,
    ) -> Result<(), StoreError> {
        Ok(Repository::assign_building_rate(self, building_id, rate_id).await?)
    }

    async fn assign_unit_type_rate(
        &self,
        building_unit_type_id: i64,
        rate_id: i64,
    ) -> Result<(), StoreError> {
        Ok(Repository::assign_unit_type_rate(self, building_unit_type_id, rate_id).await?)
    }

    async fn mark_change_executed(&self, change_id: i64) -> Result<(), StoreError> {
        Ok(Repository::mark_change_executed(self, change_id).await?)
    }
}
