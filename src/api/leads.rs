//! Typed lead endpoints.
//!
//! Requests are strongly-typed DTOs validated by serde at the boundary; the
//! update payload carries an explicit optional `commission` override, the
//! administrative escape hatch for terminal leads.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::domain::{Lead, LeadStatus, Money, NewLead, Rate};
use crate::engine::{commission_for, resolve_rate};
use crate::error::AppError;

use super::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLeadRequest {
    pub broker_id: i64,
    pub total_amount: Money,
    pub status: LeadStatus,
    pub unit_id: Option<i64>,
    pub building_unit_type_id: Option<i64>,
    pub building_id: Option<i64>,
}

/// All-optional patch; absent fields are left unchanged.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLeadRequest {
    pub status: Option<LeadStatus>,
    pub total_amount: Option<Money>,
    pub unit_id: Option<i64>,
    pub building_unit_type_id: Option<i64>,
    pub building_id: Option<i64>,
    /// Administrative override: sets the stored commission directly instead
    /// of recomputing it. Documented inconsistency risk.
    pub commission: Option<Money>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadDto {
    pub id: i64,
    pub broker_id: i64,
    pub total_amount: String,
    pub commission_pct: String,
    pub commission: String,
    pub status: LeadStatus,
    pub unit_id: Option<i64>,
    pub building_unit_type_id: Option<i64>,
    pub building_id: Option<i64>,
    pub base_rate_id: Option<i64>,
}

impl From<Lead> for LeadDto {
    fn from(lead: Lead) -> Self {
        LeadDto {
            id: lead.id,
            broker_id: lead.broker_id,
            total_amount: lead.total_amount.to_canonical_string(),
            commission_pct: lead.commission_pct.to_canonical_string(),
            commission: lead.commission.to_canonical_string(),
            status: lead.status,
            unit_id: lead.unit_id,
            building_unit_type_id: lead.building_unit_type_id,
            building_id: lead.building_id,
            base_rate_id: lead.base_rate_id,
        }
    }
}

pub async fn create_lead(
    State(state): State<AppState>,
    Json(req): Json<CreateLeadRequest>,
) -> Result<(StatusCode, Json<LeadDto>), AppError> {
    let lead_id = state
        .repo
        .insert_lead(&NewLead {
            broker_id: req.broker_id,
            total_amount: req.total_amount,
            status: req.status,
            unit_id: req.unit_id,
            building_unit_type_id: req.building_unit_type_id,
            building_id: req.building_id,
        })
        .await?;

    if req.status.is_delivered() {
        recompute_commission(&state, lead_id).await?;
    }

    let lead = state
        .repo
        .get_lead(lead_id)
        .await?
        .ok_or_else(|| AppError::Internal(format!("lead {} vanished after insert", lead_id)))?;
    Ok((StatusCode::CREATED, Json(lead.into())))
}

pub async fn get_lead(
    State(state): State<AppState>,
    Path(lead_id): Path<i64>,
) -> Result<Json<LeadDto>, AppError> {
    let lead = state
        .repo
        .get_lead(lead_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("lead {}", lead_id)))?;
    Ok(Json(lead.into()))
}

pub async fn update_lead(
    State(state): State<AppState>,
    Path(lead_id): Path<i64>,
    Json(req): Json<UpdateLeadRequest>,
) -> Result<Json<LeadDto>, AppError> {
    let mut lead = state
        .repo
        .get_lead(lead_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("lead {}", lead_id)))?;

    if lead.status.is_delivered() && matches!(req.status, Some(s) if !s.is_delivered()) {
        return Err(AppError::BadRequest(
            "delivered is a terminal state".to_string(),
        ));
    }

    if let Some(status) = req.status {
        lead.status = status;
    }
    if let Some(total) = req.total_amount {
        lead.total_amount = total;
    }
    if let Some(unit_id) = req.unit_id {
        lead.unit_id = Some(unit_id);
    }
    if let Some(id) = req.building_unit_type_id {
        lead.building_unit_type_id = Some(id);
    }
    if let Some(id) = req.building_id {
        lead.building_id = Some(id);
    }
    if let Some(commission) = req.commission {
        lead.commission = commission;
    }

    state.repo.save_lead(&lead).await?;

    // Unless the caller overrode the commission directly, a delivered lead's
    // commission is re-derived from its current rate links. On this path a
    // lead with no resolvable source goes to zero.
    if req.commission.is_none() && lead.status.is_delivered() {
        recompute_commission(&state, lead_id).await?;
    }

    let lead = state
        .repo
        .get_lead(lead_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("lead {}", lead_id)))?;
    Ok(Json(lead.into()))
}

async fn recompute_commission(state: &AppState, lead_id: i64) -> Result<(), AppError> {
    let ctx = state
        .repo
        .load_lead_rate_context(lead_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("lead {}", lead_id)))?;

    let resolved = resolve_rate(&ctx);
    let mut lead = ctx.lead;
    if resolved.has_source() {
        lead.commission = commission_for(lead.total_amount, resolved.percentage);
        lead.commission_pct = resolved.percentage;
        lead.base_rate_id = resolved.source_rate_id;
    } else {
        lead.commission = Money::zero();
        lead.commission_pct = Rate::zero();
        lead.base_rate_id = None;
    }

    state.repo.save_lead(&lead).await?;
    Ok(())
}
