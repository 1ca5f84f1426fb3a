use axum::http::StatusCode;
use corredora::api::{self, AppState};
use corredora::config::{Config, UnsupportedTargetPolicy};
use corredora::db::init_db;
use corredora::domain::Rate;
use corredora::Repository;
use std::str::FromStr;
use std::sync::Arc;
use tempfile::TempDir;
use tower::util::ServiceExt;

struct TestApp {
    app: axum::Router,
    repo: Arc<Repository>,
    _temp: TempDir,
}

async fn setup_test_app() -> TestApp {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir
        .path()
        .join("test.db")
        .to_string_lossy()
        .to_string();
    let pool = init_db(&db_path).await.expect("init_db failed");
    let repo = Arc::new(Repository::new(pool));

    let config = Config {
        port: 0,
        database_path: db_path,
        job_interval_secs: 3600,
        on_unsupported_target: UnsupportedTargetPolicy::MarkExecutedNoop,
    };

    let app = api::create_router(AppState::new(repo.clone(), config));
    TestApp {
        app,
        repo,
        _temp: temp_dir,
    }
}

async fn request(
    app: axum::Router,
    method: &str,
    uri: &str,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let builder = axum::http::Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(axum::body::Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(axum::body::Body::empty()).unwrap(),
    };
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}

async fn seed_building_with_rate(repo: &Repository, pct: &str) -> (i64, i64) {
    let rate_id = repo
        .insert_commission_rate("standard", Rate::from_str(pct).unwrap(), true)
        .await
        .unwrap();
    let building_id = repo.insert_building("Mirador", Some(rate_id)).await.unwrap();
    (building_id, rate_id)
}

#[tokio::test]
async fn test_create_delivered_lead_computes_commission() {
    let test = setup_test_app().await;
    let (building_id, rate_id) = seed_building_with_rate(&test.repo, "0.03").await;

    let (status, body) = request(
        test.app,
        "POST",
        "/v1/leads",
        Some(serde_json::json!({
            "brokerId": 1,
            "totalAmount": 100000000,
            "status": "DELIVERED",
            "buildingId": building_id,
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["commission"], "3000000");
    assert_eq!(body["commissionPct"], "0.03");
    assert_eq!(body["baseRateId"], rate_id);
}

#[tokio::test]
async fn test_create_non_delivered_lead_has_zero_commission() {
    let test = setup_test_app().await;
    let (building_id, _) = seed_building_with_rate(&test.repo, "0.03").await;

    let (status, body) = request(
        test.app,
        "POST",
        "/v1/leads",
        Some(serde_json::json!({
            "brokerId": 1,
            "totalAmount": 100000000,
            "status": "APPROVED",
            "buildingId": building_id,
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["commission"], "0");
    assert_eq!(body["status"], "APPROVED");
}

#[tokio::test]
async fn test_delivery_transition_recomputes_commission() {
    let test = setup_test_app().await;
    let (building_id, rate_id) = seed_building_with_rate(&test.repo, "0.05").await;

    let (_, created) = request(
        test.app.clone(),
        "POST",
        "/v1/leads",
        Some(serde_json::json!({
            "brokerId": 2,
            "totalAmount": 80000000,
            "status": "CHECK_IN_DONE",
            "buildingId": building_id,
        })),
    )
    .await;
    let lead_id = created["id"].as_i64().unwrap();

    let (status, body) = request(
        test.app,
        "PATCH",
        &format!("/v1/leads/{}", lead_id),
        Some(serde_json::json!({"status": "DELIVERED"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["commission"], "4000000");
    assert_eq!(body["baseRateId"], rate_id);
}

#[tokio::test]
async fn test_update_without_source_zeroes_commission() {
    let test = setup_test_app().await;
    let building_id = test.repo.insert_building("SinComision", None).await.unwrap();

    let (_, created) = request(
        test.app.clone(),
        "POST",
        "/v1/leads",
        Some(serde_json::json!({
            "brokerId": 2,
            "totalAmount": 80000000,
            "status": "CHECK_IN_DONE",
            "buildingId": building_id,
        })),
    )
    .await;
    let lead_id = created["id"].as_i64().unwrap();

    let (status, body) = request(
        test.app,
        "PATCH",
        &format!("/v1/leads/{}", lead_id),
        Some(serde_json::json!({"status": "DELIVERED"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["commission"], "0");
    assert_eq!(body["baseRateId"], serde_json::Value::Null);
}

#[tokio::test]
async fn test_commission_override_escape_hatch() {
    let test = setup_test_app().await;
    let (building_id, _) = seed_building_with_rate(&test.repo, "0.03").await;

    let (_, created) = request(
        test.app.clone(),
        "POST",
        "/v1/leads",
        Some(serde_json::json!({
            "brokerId": 3,
            "totalAmount": 100000000,
            "status": "DELIVERED",
            "buildingId": building_id,
        })),
    )
    .await;
    let lead_id = created["id"].as_i64().unwrap();
    assert_eq!(created["commission"], "3000000");

    let (status, body) = request(
        test.app,
        "PATCH",
        &format!("/v1/leads/{}", lead_id),
        Some(serde_json::json!({"commission": 1234567})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["commission"], "1234567");
}

#[tokio::test]
async fn test_delivered_is_terminal() {
    let test = setup_test_app().await;
    let (building_id, _) = seed_building_with_rate(&test.repo, "0.03").await;

    let (_, created) = request(
        test.app.clone(),
        "POST",
        "/v1/leads",
        Some(serde_json::json!({
            "brokerId": 3,
            "totalAmount": 100000000,
            "status": "DELIVERED",
            "buildingId": building_id,
        })),
    )
    .await;
    let lead_id = created["id"].as_i64().unwrap();

    let (status, _) = request(
        test.app,
        "PATCH",
        &format!("/v1/leads/{}", lead_id),
        Some(serde_json::json!({"status": "APPROVED"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_get_missing_lead_is_404() {
    let test = setup_test_app().await;
    let (status, _) = request(test.app, "GET", "/v1/leads/9999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
