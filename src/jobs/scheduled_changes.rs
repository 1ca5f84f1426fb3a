//! Execution of scheduled commission-rate changes that have reached their
//! effective date.
//!
//! Changes are applied in ascending effective-time order, so when two due
//! changes target the same entity the later-dated one is applied second and
//! ends up in effect. Each change is marked executed immediately after its
//! mutation; the executed flag keeps a second pass from touching it again.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::config::UnsupportedTargetPolicy;
use crate::domain::ChangeTarget;
use crate::store::{CommissionStore, StoreError};

/// Counters reported by an executor pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionReport {
    pub total_processed: usize,
    pub executed: usize,
    pub errors: usize,
}

/// Apply every pending scheduled change due at or before `now`.
///
/// Applying a change does not recalculate commissions; the next
/// recalculation pass picks the new rates up.
///
/// # Errors
/// Only the initial bulk load propagates; everything after is per-change.
pub async fn execute_scheduled_changes(
    store: &dyn CommissionStore,
    now: DateTime<Utc>,
    policy: UnsupportedTargetPolicy,
) -> Result<ExecutionReport, StoreError> {
    info!("starting execution of scheduled commission changes");

    let changes = store.load_due_scheduled_changes(now).await?;
    info!(total = changes.len(), "loaded due scheduled changes");

    let mut executed = 0usize;
    let mut errors = 0usize;

    for change in &changes {
        let applied = match change.target {
            ChangeTarget::Building(building_id) => store
                .assign_building_rate(building_id, change.new_rate_id)
                .await
                .map(|()| true),
            ChangeTarget::UnitType(building_unit_type_id) => store
                .assign_unit_type_rate(building_unit_type_id, change.new_rate_id)
                .await
                .map(|()| true),
            ChangeTarget::Global => match policy {
                UnsupportedTargetPolicy::MarkExecutedNoop => {
                    warn!(
                        change_id = change.id,
                        "global commission change not implemented, consuming record"
                    );
                    Ok(true)
                }
                UnsupportedTargetPolicy::LeavePending => {
                    warn!(
                        change_id = change.id,
                        "global commission change not implemented, leaving pending"
                    );
                    Ok(false)
                }
                UnsupportedTargetPolicy::Error => Err(StoreError::Unavailable(
                    "global commission changes are not supported".to_string(),
                )),
            },
        };

        match applied {
            Ok(true) => match store.mark_change_executed(change.id).await {
                Ok(()) => {
                    executed += 1;
                    info!(
                        change_id = change.id,
                        effective_at = %change.effective_at,
                        rate_id = change.new_rate_id,
                        "executed scheduled change"
                    );
                }
                Err(err) => {
                    errors += 1;
                    error!(change_id = change.id, %err, "failed to mark change executed");
                }
            },
            Ok(false) => {}
            Err(err) => {
                errors += 1;
                error!(change_id = change.id, %err, "failed to execute scheduled change");
            }
        }
    }

    let report = ExecutionReport {
        total_processed: changes.len(),
        executed,
        errors,
    };
    info!(
        total = report.total_processed,
        executed = report.executed,
        errors = report.errors,
        "scheduled commission changes execution completed"
    );
    Ok(report)
}
