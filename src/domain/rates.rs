//! Commission-rate entities: rate definitions, the building/unit-type
//! hierarchy they attach to, and scheduled rate changes.

use chrono::{DateTime, Utc};

use super::money::Rate;

/// A named commission rate definition. The percentage is a fraction
/// (0.03 = 3%). Editing it does not retroactively touch computed leads until
/// the next recalculation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommissionRate {
    pub id: i64,
    pub name: String,
    pub percentage: Rate,
    pub active: bool,
}

/// A building with at most one directly-assigned rate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Building {
    pub id: i64,
    pub name: String,
    pub rate_id: Option<i64>,
}

/// Association between a unit-type taxonomy entry and a specific building.
/// Its rate comes from `RateAssignment` rows, at most one active at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildingUnitType {
    pub id: i64,
    pub building_id: i64,
    pub unit_type_name: String,
}

/// Links a `BuildingUnitType` to a `CommissionRate`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateAssignment {
    pub id: i64,
    pub building_unit_type_id: i64,
    pub rate: CommissionRate,
    pub active: bool,
}

/// What a scheduled change applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeTarget {
    Building(i64),
    UnitType(i64),
    /// No specific target. Not supported; handling is a configuration
    /// choice (see `UnsupportedTargetPolicy`).
    Global,
}

/// A pending rate mutation scheduled for a future date. Flipped from
/// `executed = false` to `true` exactly once by the executor, never back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledRateChange {
    pub id: i64,
    pub effective_at: DateTime<Utc>,
    pub target: ChangeTarget,
    pub new_rate_id: i64,
    pub executed: bool,
}
