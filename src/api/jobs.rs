//! Manual job triggers ("Ejecutar Ahora" / "Ejecutar Todos los Trabajos").
//!
//! These run the batch passes synchronously and surface the aggregate
//! counters to the caller; individual item failures only appear in logs.

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use crate::error::AppError;
use crate::jobs::{
    execute_scheduled_changes, recalculate_commissions, ExecutionReport, RecalculationReport,
};

use super::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunAllResponse {
    pub scheduled_changes: ExecutionReport,
    pub recalculation: RecalculationReport,
    pub message: String,
}

pub async fn run_recalculation(
    State(state): State<AppState>,
) -> Result<Json<RecalculationReport>, AppError> {
    let report = recalculate_commissions(state.repo.as_ref()).await?;
    Ok(Json(report))
}

pub async fn run_scheduled_changes(
    State(state): State<AppState>,
) -> Result<Json<ExecutionReport>, AppError> {
    let report = execute_scheduled_changes(
        state.repo.as_ref(),
        Utc::now(),
        state.config.on_unsupported_target,
    )
    .await?;
    Ok(Json(report))
}

/// Run both jobs back to back: changes first so the recalculation pass sees
/// freshly-applied rates.
pub async fn run_all(State(state): State<AppState>) -> Result<Json<RunAllResponse>, AppError> {
    let scheduled_changes = execute_scheduled_changes(
        state.repo.as_ref(),
        Utc::now(),
        state.config.on_unsupported_target,
    )
    .await?;
    let recalculation = recalculate_commissions(state.repo.as_ref()).await?;

    let message = format!(
        "Executed {} scheduled change(s), updated {} lead(s), {} error(s)",
        scheduled_changes.executed,
        recalculation.updated,
        scheduled_changes.errors + recalculation.errors
    );

    Ok(Json(RunAllResponse {
        scheduled_changes,
        recalculation,
        message,
    }))
}
