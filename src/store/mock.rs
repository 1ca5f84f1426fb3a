//! In-memory store for exercising the batch jobs without a database,
//! including injected per-item failures.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{LeadRateContext, Money, ScheduledRateChange};

use super::{CommissionStore, StoreError};

/// A recorded lead-commission write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedUpdate {
    pub lead_id: i64,
    pub commission: Money,
    pub source_rate_id: Option<i64>,
}

/// Mock store backed by plain collections. Build with the `with_*` methods,
/// then inspect the recorded writes after running a job.
#[derive(Debug, Default)]
pub struct MockStore {
    leads: Vec<LeadRateContext>,
    changes: Mutex<Vec<ScheduledRateChange>>,
    fail_lead_updates: HashSet<i64>,
    fail_building_assignments: HashSet<i64>,
    lead_updates: Mutex<Vec<RecordedUpdate>>,
    building_rates: Mutex<HashMap<i64, i64>>,
    unit_type_rates: Mutex<HashMap<i64, i64>>,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_lead(mut self, ctx: LeadRateContext) -> Self {
        self.leads.push(ctx);
        self
    }

    pub fn with_leads(mut self, leads: Vec<LeadRateContext>) -> Self {
        self.leads.extend(leads);
        self
    }

    pub fn with_change(self, change: ScheduledRateChange) -> Self {
        self.changes.lock().unwrap().push(change);
        self
    }

    /// Make `update_lead_commission` fail for the given lead id.
    pub fn failing_lead_update(mut self, lead_id: i64) -> Self {
        self.fail_lead_updates.insert(lead_id);
        self
    }

    /// Make `assign_building_rate` fail for the given building id.
    pub fn failing_building_assignment(mut self, building_id: i64) -> Self {
        self.fail_building_assignments.insert(building_id);
        self
    }

    /// Lead-commission writes recorded so far, in order.
    pub fn recorded_updates(&self) -> Vec<RecordedUpdate> {
        self.lead_updates.lock().unwrap().clone()
    }

    /// The rate currently assigned to a building, if any write happened.
    pub fn building_rate(&self, building_id: i64) -> Option<i64> {
        self.building_rates.lock().unwrap().get(&building_id).copied()
    }

    /// The rate currently assigned to a unit-type link, if any write happened.
    pub fn unit_type_rate(&self, building_unit_type_id: i64) -> Option<i64> {
        self.unit_type_rates
            .lock()
            .unwrap()
            .get(&building_unit_type_id)
            .copied()
    }

    /// Snapshot of the scheduled-change records, executed flags included.
    pub fn changes(&self) -> Vec<ScheduledRateChange> {
        self.changes.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommissionStore for MockStore {
    async fn load_delivered_leads_with_rate_context(
        &self,
    ) -> Result<Vec<LeadRateContext>, StoreError> {
        Ok(self.leads.clone())
    }

    async fn update_lead_commission(
        &self,
        lead_id: i64,
        commission: Money,
        source_rate_id: Option<i64>,
    ) -> Result<(), StoreError> {
        if self.fail_lead_updates.contains(&lead_id) {
            return Err(StoreError::Unavailable(format!(
                "injected failure for lead {}",
                lead_id
            )));
        }
        self.lead_updates.lock().unwrap().push(RecordedUpdate {
            lead_id,
            commission,
            source_rate_id,
        });
        Ok(())
    }

    async fn load_due_scheduled_changes(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<ScheduledRateChange>, StoreError> {
        let mut due: Vec<ScheduledRateChange> = self
            .changes
            .lock()
            .unwrap()
            .iter()
            .filter(|c| !c.executed && c.effective_at <= now)
            .cloned()
            .collect();
        due.sort_by_key(|c| c.effective_at);
        Ok(due)
    }

    async fn assign_building_rate(
        &self,
        building_id: i64,
        rate_id: i64,
    ) -> Result<(), StoreError> {
        if self.fail_building_assignments.contains(&building_id) {
            return Err(StoreError::Unavailable(format!(
                "injected failure for building {}",
                building_id
            )));
        }
        self.building_rates
            .lock()
            .unwrap()
            .insert(building_id, rate_id);
        Ok(())
    }

    async fn assign_unit_type_rate(
        &self,
        building_unit_type_id: i64,
        rate_id: i64,
    ) -> Result<(), StoreError> {
        self.unit_type_rates
            .lock()
            .unwrap()
            .insert(building_unit_type_id, rate_id);
        Ok(())
    }

    async fn mark_change_executed(&self, change_id: i64) -> Result<(), StoreError> {
        let mut changes = self.changes.lock().unwrap();
        match changes.iter_mut().find(|c| c.id == change_id) {
            Some(change) => {
                change.executed = true;
                Ok(())
            }
            None => Err(StoreError::NotFound(format!(
                "scheduled change {}",
                change_id
            ))),
        }
    }
}
