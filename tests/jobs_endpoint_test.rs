use axum::http::StatusCode;
use chrono::{Duration, Utc};
use corredora::api::{self, AppState};
use corredora::config::{Config, UnsupportedTargetPolicy};
use corredora::db::init_db;
use corredora::domain::{ChangeTarget, LeadStatus, Money, NewLead, Rate};
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

async fn post(app: axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = axum::http::Request::builder()
        .method("POST")
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, json)
}

#[tokio::test]
async fn test_health_endpoint() {
    let test = setup_test_app().await;

    let request = axum::http::Request::builder()
        .method("GET")
        .uri("/health")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = test.app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_recalculate_endpoint_returns_counts() {
    let test = setup_test_app().await;

    let rate_id = test
        .repo
        .insert_commission_rate("basica", Rate::from_str("0.03").unwrap(), true)
        .await
        .unwrap();
    let building_id = test
        .repo
        .insert_building("Mirador", Some(rate_id))
        .await
        .unwrap();
    test.repo
        .insert_lead(&NewLead {
            broker_id: 1,
            total_amount: Money::from_str("100000000").unwrap(),
            status: LeadStatus::Delivered,
            unit_id: None,
            building_unit_type_id: None,
            building_id: Some(building_id),
        })
        .await
        .unwrap();

    let (status, body) = post(test.app, "/v1/jobs/recalculate").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalProcessed"], 1);
    assert_eq!(body["updated"], 1);
    assert_eq!(body["errors"], 0);
}

#[tokio::test]
async fn test_scheduled_changes_endpoint_returns_counts() {
    let test = setup_test_app().await;

    let new_rate = test
        .repo
        .insert_commission_rate("vip", Rate::from_str("0.10").unwrap(), true)
        .await
        .unwrap();
    let building_id = test.repo.insert_building("Mirador", None).await.unwrap();
    test.repo
        .insert_scheduled_change(
            Utc::now() - Duration::hours(1),
            ChangeTarget::Building(building_id),
            new_rate,
        )
        .await
        .unwrap();

    let (status, body) = post(test.app, "/v1/jobs/scheduled-changes").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalProcessed"], 1);
    assert_eq!(body["executed"], 1);
    assert_eq!(body["errors"], 0);

    let building = test.repo.get_building(building_id).await.unwrap().unwrap();
    assert_eq!(building.rate_id, Some(new_rate));
}

#[tokio::test]
async fn test_run_all_applies_changes_before_recalculating() {
    let test = setup_test_app().await;

    let new_rate = test
        .repo
        .insert_commission_rate("vip", Rate::from_str("0.10").unwrap(), true)
        .await
        .unwrap();
    let building_id = test.repo.insert_building("Mirador", None).await.unwrap();
    let lead_id = test
        .repo
        .insert_lead(&NewLead {
            broker_id: 1,
            total_amount: Money::from_str("100000000").unwrap(),
            status: LeadStatus::Delivered,
            unit_id: None,
            building_unit_type_id: None,
            building_id: Some(building_id),
        })
        .await
        .unwrap();
    test.repo
        .insert_scheduled_change(
            Utc::now() - Duration::hours(1),
            ChangeTarget::Building(building_id),
            new_rate,
        )
        .await
        .unwrap();

    let (status, body) = post(test.app, "/v1/jobs/run-all").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["scheduledChanges"]["executed"], 1);
    assert_eq!(body["recalculation"]["updated"], 1);
    assert!(body["message"].as_str().unwrap().contains("1 lead"));

    let lead = test.repo.get_lead(lead_id).await.unwrap().unwrap();
    assert_eq!(lead.commission, Money::from_str("10000000").unwrap());
}
