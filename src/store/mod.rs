//! Read/write port consumed by the batch jobs.
//!
//! The jobs never talk to sqlx directly; they go through `CommissionStore`,
//! which the SQLite `Repository` implements in production and `MockStore`
//! implements in tests (including injected per-item failures).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::{LeadRateContext, Money, ScheduledRateChange};

pub mod mock;

pub use mock::MockStore;

/// Errors surfaced by a commission store implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Persistence operations the commission engine needs.
#[async_trait]
pub trait CommissionStore: Send + Sync {
    /// Load every lead in the terminal delivered state, hydrated with its
    /// unit-type link (active rate assignments included) and its building
    /// (building rate included).
    async fn load_delivered_leads_with_rate_context(
        &self,
    ) -> Result<Vec<LeadRateContext>, StoreError>;

    /// Persist a recomputed commission and the rate record that produced it.
    async fn update_lead_commission(
        &self,
        lead_id: i64,
        commission: Money,
        source_rate_id: Option<i64>,
    ) -> Result<(), StoreError>;

    /// Load unexecuted scheduled changes due at or before `now`, ordered by
    /// effective time ascending.
    async fn load_due_scheduled_changes(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<ScheduledRateChange>, StoreError>;

    /// Set a building's directly-assigned rate.
    async fn assign_building_rate(&self, building_id: i64, rate_id: i64)
        -> Result<(), StoreError>;

    /// Replace a unit-type association's active rate assignment with one for
    /// the given rate. Previous assignments are deactivated, not deleted.
    async fn assign_unit_type_rate(
        &self,
        building_unit_type_id: i64,
        rate_id: i64,
    ) -> Result<(), StoreError>;

    /// Flip a scheduled change's executed flag to true.
    async fn mark_change_executed(&self, change_id: i64) -> Result<(), StoreError>;
}
