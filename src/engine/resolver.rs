//! Hierarchical rate resolution for a lead.
//!
//! Priority order, first match wins:
//! 1. the lead's unit-type-in-building link, via its first active rate
//!    assignment;
//! 2. the lead's building, via the building's directly-assigned rate;
//! 3. nothing resolves: percentage 0, no source. The caller decides what
//!    that means (the batch job skips the lead, the lead-edit path zeroes
//!    the commission).

use crate::domain::{LeadRateContext, Rate};

/// Outcome of rate resolution: the applicable fraction and the rate record
/// that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedRate {
    pub percentage: Rate,
    pub source_rate_id: Option<i64>,
}

impl ResolvedRate {
    /// True when some rate source resolved for the lead.
    pub fn has_source(&self) -> bool {
        self.source_rate_id.is_some()
    }

    fn none() -> Self {
        ResolvedRate {
            percentage: Rate::zero(),
            source_rate_id: None,
        }
    }
}

/// Resolve the applicable commission rate for a hydrated lead.
///
/// Pure: reads only the already-loaded context, no side effects.
pub fn resolve_rate(ctx: &LeadRateContext) -> ResolvedRate {
    if let Some(unit_type) = &ctx.unit_type {
        if let Some(assignment) = unit_type.active_assignments.first() {
            return ResolvedRate {
                percentage: assignment.rate.percentage,
                source_rate_id: Some(assignment.rate.id),
            };
        }
    }

    if let Some(building) = &ctx.building {
        if let Some(rate) = &building.rate {
            return ResolvedRate {
                percentage: rate.percentage,
                source_rate_id: Some(rate.id),
            };
        }
    }

    ResolvedRate::none()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        BuildingRateContext, CommissionRate, Lead, LeadRateContext, LeadStatus, Money,
        RateAssignment, UnitTypeRateContext,
    };

    fn rate(id: i64, pct: &str) -> CommissionRate {
        CommissionRate {
            id,
            name: format!("rate-{}", id),
            percentage: Rate::from_str_canonical(pct).unwrap(),
            active: true,
        }
    }

    fn lead() -> Lead {
        Lead {
            id: 1,
            broker_id: 10,
            total_amount: Money::from(100_000_000),
            commission_pct: Rate::zero(),
            commission: Money::zero(),
            status: LeadStatus::Delivered,
            unit_id: None,
            building_unit_type_id: Some(5),
            building_id: Some(7),
            base_rate_id: None,
        }
    }

    fn ctx_with(
        unit_type: Option<UnitTypeRateContext>,
        building: Option<BuildingRateContext>,
    ) -> LeadRateContext {
        LeadRateContext {
            lead: lead(),
            unit_type,
            building,
        }
    }

    #[test]
    fn test_unit_type_assignment_wins_over_building_rate() {
        let ctx = ctx_with(
            Some(UnitTypeRateContext {
                building_unit_type_id: 5,
                active_assignments: vec![RateAssignment {
                    id: 1,
                    building_unit_type_id: 5,
                    rate: rate(100, "0.07"),
                    active: true,
                }],
            }),
            Some(BuildingRateContext {
                building_id: 7,
                rate: Some(rate(200, "0.05")),
            }),
        );

        let resolved = resolve_rate(&ctx);
        assert_eq!(resolved.source_rate_id, Some(100));
        assert_eq!(resolved.percentage, Rate::from_str_canonical("0.07").unwrap());
    }

    #[test]
    fn test_falls_back_to_building_rate() {
        let ctx = ctx_with(
            None,
            Some(BuildingRateContext {
                building_id: 7,
                rate: Some(rate(200, "0.05")),
            }),
        );

        let resolved = resolve_rate(&ctx);
        assert_eq!(resolved.source_rate_id, Some(200));
        assert_eq!(resolved.percentage, Rate::from_str_canonical("0.05").unwrap());
    }

    #[test]
    fn test_unit_type_without_active_assignment_falls_back() {
        let ctx = ctx_with(
            Some(UnitTypeRateContext {
                building_unit_type_id: 5,
                active_assignments: vec![],
            }),
            Some(BuildingRateContext {
                building_id: 7,
                rate: Some(rate(200, "0.05")),
            }),
        );

        assert_eq!(resolve_rate(&ctx).source_rate_id, Some(200));
    }

    #[test]
    fn test_no_source_resolves_to_zero_and_none() {
        let ctx = ctx_with(
            None,
            Some(BuildingRateContext {
                building_id: 7,
                rate: None,
            }),
        );

        let resolved = resolve_rate(&ctx);
        assert!(!resolved.has_source());
        assert!(resolved.percentage.is_zero());
    }

    #[test]
    fn test_first_active_assignment_is_used() {
        let ctx = ctx_with(
            Some(UnitTypeRateContext {
                building_unit_type_id: 5,
                active_assignments: vec![
                    RateAssignment {
                        id: 1,
                        building_unit_type_id: 5,
                        rate: rate(100, "0.03"),
                        active: true,
                    },
                    RateAssignment {
                        id: 2,
                        building_unit_type_id: 5,
                        rate: rate(101, "0.10"),
                        active: true,
                    },
                ],
            }),
            None,
        );

        assert_eq!(resolve_rate(&ctx).source_rate_id, Some(100));
    }
}
