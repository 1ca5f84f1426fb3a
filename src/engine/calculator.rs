//! Commission arithmetic and the update-worthiness rule.

use crate::domain::{materiality_threshold, Money, Rate};

/// Compute a lead's commission: `total × fraction`, exact decimal math.
pub fn commission_for(total: Money, pct: Rate) -> Money {
    total.apply_rate(pct)
}

/// Whether a newly computed commission should replace the stored one.
///
/// A write happens only when the amount moved by more than the materiality
/// threshold (0.01 currency units) or the resolved source rate record
/// changed. Recomputations that reproduce the stored state stay silent,
/// which is what makes the recalculation batch idempotent.
pub fn should_persist(
    new_commission: Money,
    stored_commission: Money,
    new_source_rate_id: Option<i64>,
    stored_source_rate_id: Option<i64>,
) -> bool {
    (new_commission - stored_commission).abs() > materiality_threshold()
        || new_source_rate_id != stored_source_rate_id
}
