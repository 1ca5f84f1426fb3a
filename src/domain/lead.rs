//! Lead entity, lifecycle states, and the hydrated rate-resolution context.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::money::{Money, Rate};
use super::rates::{CommissionRate, RateAssignment};

/// Lifecycle state of a lead. Only `Delivered` leads generate payable
/// commissions; `Delivered` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LeadStatus {
    Submitted,
    InReview,
    Observed,
    Approved,
    Rejected,
    ReservationPaid,
    ContractSigned,
    CheckInDone,
    Delivered,
}

impl LeadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeadStatus::Submitted => "SUBMITTED",
            LeadStatus::InReview => "IN_REVIEW",
            LeadStatus::Observed => "OBSERVED",
            LeadStatus::Approved => "APPROVED",
            LeadStatus::Rejected => "REJECTED",
            LeadStatus::ReservationPaid => "RESERVATION_PAID",
            LeadStatus::ContractSigned => "CONTRACT_SIGNED",
            LeadStatus::CheckInDone => "CHECK_IN_DONE",
            LeadStatus::Delivered => "DELIVERED",
        }
    }

    pub fn is_delivered(&self) -> bool {
        matches!(self, LeadStatus::Delivered)
    }
}

impl fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error for unrecognized lead status strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeadStatusParseError(pub String);

impl fmt::Display for LeadStatusParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown lead status: {}", self.0)
    }
}

impl std::error::Error for LeadStatusParseError {}

impl FromStr for LeadStatus {
    type Err = LeadStatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SUBMITTED" => Ok(LeadStatus::Submitted),
            "IN_REVIEW" => Ok(LeadStatus::InReview),
            "OBSERVED" => Ok(LeadStatus::Observed),
            "APPROVED" => Ok(LeadStatus::Approved),
            "REJECTED" => Ok(LeadStatus::Rejected),
            "RESERVATION_PAID" => Ok(LeadStatus::ReservationPaid),
            "CONTRACT_SIGNED" => Ok(LeadStatus::ContractSigned),
            "CHECK_IN_DONE" => Ok(LeadStatus::CheckInDone),
            "DELIVERED" => Ok(LeadStatus::Delivered),
            other => Err(LeadStatusParseError(other.to_string())),
        }
    }
}

/// A brokered transaction record. Financial history: never deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lead {
    pub id: i64,
    pub broker_id: i64,
    /// Total deal amount the commission is computed over.
    pub total_amount: Money,
    /// Snapshot of the percentage last applied to this lead.
    pub commission_pct: Rate,
    /// Derived: `total_amount × commission_pct` as of the last
    /// recalculation or delivery transition.
    pub commission: Money,
    pub status: LeadStatus,
    pub unit_id: Option<i64>,
    /// Link to a unit-type-within-building association.
    pub building_unit_type_id: Option<i64>,
    /// Direct link to a building.
    pub building_id: Option<i64>,
    /// The rate record that last produced this lead's commission.
    pub base_rate_id: Option<i64>,
}

/// Fields required to register a new lead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLead {
    pub broker_id: i64,
    pub total_amount: Money,
    pub status: LeadStatus,
    pub unit_id: Option<i64>,
    pub building_unit_type_id: Option<i64>,
    pub building_id: Option<i64>,
}

/// A lead's unit-type link hydrated with its active rate assignments.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UnitTypeRateContext {
    pub building_unit_type_id: i64,
    /// Active assignments only, in assignment-id order. At most one is
    /// conventionally active; the resolver uses the first.
    pub active_assignments: Vec<RateAssignment>,
}

/// A lead's building link hydrated with the building's own rate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildingRateContext {
    pub building_id: i64,
    pub rate: Option<CommissionRate>,
}

/// Fully-hydrated read model consumed by the rate resolver: the lead plus
/// every related record rate resolution can touch, loaded in one pass so the
/// resolver itself stays pure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeadRateContext {
    pub lead: Lead,
    pub unit_type: Option<UnitTypeRateContext>,
    pub building: Option<BuildingRateContext>,
}
