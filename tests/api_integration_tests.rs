//! HTTP-surface tests driving the axum application end to end.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};
use tower::ServiceExt;

use nova_import::config::AppConfig;
use nova_import::progress::ProgressRegistry;
use nova_import::server::{AppState, create_app};

mod test_utils;
use test_utils::{
    application_resource, count_signups, event_resource, mock_applications, mock_event,
    mock_login_success, mock_user_search, setup_test_db, user_resource,
};

const TEST_TOKEN: &str = "test-operator-token";

async fn test_app_state() -> AppState {
    AppState {
        config: Arc::new(AppConfig {
            operator_tokens: vec![TEST_TOKEN.to_string()],
            ..Default::default()
        }),
        db: setup_test_db().await,
        progress: Arc::new(ProgressRegistry::new()),
    }
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn root_returns_service_info() {
    let app = create_app(test_app_state().await);

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["service"], "nova-import");
}

#[tokio::test]
async fn import_endpoints_require_operator_token() {
    let app = create_app(test_app_state().await);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/import/user")
                .header("content-type", "application/json")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn malformed_target_email_is_rejected() {
    let app = create_app(test_app_state().await);

    let payload = json!({
        "target_email": "not-an-email",
        "credentials": {
            "base_url": "https://legacy.example.org",
            "email": "admin@example.org",
            "password": "hunter2"
        }
    });

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/import/user")
                .header("content-type", "application/json")
                .header("authorization", format!("Bearer {}", TEST_TOKEN))
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["code"], "VALIDATION_FAILED");
}

#[tokio::test]
async fn missing_credentials_are_rejected_before_orchestration() {
    let app = create_app(test_app_state().await);

    let payload = json!({
        "target_email": "jane@x.com",
        "credentials": {
            "base_url": "",
            "email": "",
            "password": ""
        }
    });

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/import/user")
                .header("content-type", "application/json")
                .header("authorization", format!("Bearer {}", TEST_TOKEN))
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["details"]["credentials.base_url"].is_string());
    assert!(body["details"]["credentials.password"].is_string());
}

#[tokio::test]
async fn empty_batch_is_rejected() {
    let app = create_app(test_app_state().await);

    let payload = json!({
        "target_emails": [],
        "credentials": {
            "base_url": "https://legacy.example.org",
            "email": "admin@example.org",
            "password": "hunter2"
        }
    });

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/import/batch")
                .header("content-type", "application/json")
                .header("authorization", format!("Bearer {}", TEST_TOKEN))
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn single_user_import_over_http_returns_summary() {
    let server = wiremock::MockServer::start().await;
    mock_login_success(&server).await;
    mock_user_search(
        &server,
        "jane@x.com",
        vec![user_resource(1, "jane@x.com", "Jane", "Doe")],
    )
    .await;
    mock_applications(
        &server,
        1,
        vec![application_resource(11, 101, 2, "Accepted", Some("Kitchen Help"))],
    )
    .await;
    mock_event(&server, 101, event_resource(101, "2030-06-01", "09:00", "13:00")).await;

    let state = test_app_state().await;
    let db = state.db.clone();
    let app = create_app(state);

    let payload = json!({
        "target_email": "jane@x.com",
        "credentials": {
            "base_url": server.uri(),
            "email": "admin@example.org",
            "password": "hunter2"
        }
    });

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/import/user")
                .header("content-type", "application/json")
                .header("authorization", format!("Bearer {}", TEST_TOKEN))
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;

    assert_eq!(body["success"], true);
    assert_eq!(body["shifts_imported"], 1);
    assert_eq!(body["signups_imported"], 1);
    assert_eq!(body["user_results"][0]["status"], "imported_history");

    assert_eq!(count_signups(&db).await, 1);
}
