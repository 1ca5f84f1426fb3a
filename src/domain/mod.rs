//! Domain types for the commission engine.
//!
//! This module provides:
//! - Lossless decimal handling via the Money and Rate newtypes
//! - The Lead entity with its lifecycle states
//! - Rate entities: CommissionRate, Building, BuildingUnitType, assignments,
//!   and scheduled rate changes
//! - The hydrated LeadRateContext read model the pure resolver consumes

pub mod lead;
pub mod money;
pub mod rates;

pub use lead::{
    BuildingRateContext, Lead, LeadRateContext, LeadStatus, LeadStatusParseError, NewLead,
    UnitTypeRateContext,
};
pub use money::{materiality_threshold, Money, Rate};
pub use rates::{
    Building, BuildingUnitType, ChangeTarget, CommissionRate, RateAssignment, ScheduledRateChange,
};
