//! Commission recalculation over delivered leads.
//!
//! Re-runnable any number of times: a pass that finds nothing changed writes
//! nothing. Per-lead failures are counted and logged, never fatal to the
//! pass; the next scheduled tick is the retry mechanism.

use serde::Serialize;
use tracing::{error, info};

use crate::engine::{commission_for, resolve_rate, should_persist};
use crate::store::{CommissionStore, StoreError};

/// Counters reported by a recalculation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecalculationReport {
    pub total_processed: usize,
    pub updated: usize,
    pub errors: usize,
}

/// Run one recalculation pass over all delivered leads.
///
/// # Errors
/// Only the initial bulk load propagates; everything after is per-lead.
pub async fn recalculate_commissions(
    store: &dyn CommissionStore,
) -> Result<RecalculationReport, StoreError> {
    info!("starting commission recalculation for delivered leads");

    let contexts = store.load_delivered_leads_with_rate_context().await?;
    info!(total = contexts.len(), "loaded delivered leads");

    let mut updated = 0usize;
    let mut errors = 0usize;

    for ctx in &contexts {
        let lead = &ctx.lead;
        let resolved = resolve_rate(ctx);

        // No resolvable source: leave the lead untouched. In particular a
        // lead whose rate link was removed keeps its previously-computed
        // commission.
        if !resolved.has_source() {
            continue;
        }

        let new_commission = commission_for(lead.total_amount, resolved.percentage);
        if !should_persist(
            new_commission,
            lead.commission,
            resolved.source_rate_id,
            lead.base_rate_id,
        ) {
            continue;
        }

        match store
            .update_lead_commission(lead.id, new_commission, resolved.source_rate_id)
            .await
        {
            Ok(()) => {
                updated += 1;
                info!(
                    lead_id = lead.id,
                    old = %lead.commission,
                    new = %new_commission,
                    pct = %resolved.percentage,
                    "updated lead commission"
                );
            }
            Err(err) => {
                errors += 1;
                error!(lead_id = lead.id, %err, "failed to update lead commission");
            }
        }
    }

    let report = RecalculationReport {
        total_processed: contexts.len(),
        updated,
        errors,
    };
    info!(
        total = report.total_processed,
        updated = report.updated,
        errors = report.errors,
        unchanged = report.total_processed - report.updated - report.errors,
        "commission recalculation completed"
    );
    Ok(report)
}
