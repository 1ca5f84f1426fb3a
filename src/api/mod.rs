pub mod health;
pub mod jobs;
pub mod leads;

use crate::config::Config;
use crate::db::Repository;
use axum::{
    routing::{get, patch, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub config: Config,
}

impl AppState {
    pub fn new(repo: Arc<Repository>, config: Config) -> Self {
        Self { repo, config }
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/v1/jobs/recalculate", post(jobs::run_recalculation))
        .route(
            "/v1/jobs/scheduled-changes",
            post(jobs::run_scheduled_changes),
        )
        .route("/v1/jobs/run-all", post(jobs::run_all))
        .route("/v1/leads", post(leads::create_lead))
        .route("/v1/leads/:id", get(leads::get_lead))
        .route("/v1/leads/:id", patch(leads::update_lead))
        .layer(cors)
        .with_state(state)
}
