#![allow(dead_code)]

//! Shared helpers for integration tests: an in-memory database with
//! migrations applied, Nova envelope builders, and wiremock mounts for the
//! legacy admin API.

use sea_orm::{DatabaseConnection, EntityTrait, PaginatorTrait};
use serde_json::{Value, json};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use migration::MigratorTrait;
use nova_import::nova::NovaCredentials;

pub async fn setup_test_db() -> DatabaseConnection {
    let db = sea_orm::Database::connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");
    migration::Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");
    db
}

pub fn credentials(server: &MockServer) -> NovaCredentials {
    NovaCredentials {
        base_url: server.uri(),
        email: "admin@example.org".to_string(),
        password: "hunter2".to_string(),
    }
}

pub async fn mock_login_success(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .mount(server)
        .await;
}

pub async fn mock_login_rejected(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"error": "invalid credentials"})),
        )
        .mount(server)
        .await;
}

/// Nova user resource envelope as returned by the search projection.
pub fn user_resource(id: i64, email: &str, first_name: &str, last_name: &str) -> Value {
    json!({
        "id": {"value": id},
        "fields": [
            {"attribute": "email", "value": email},
            {"attribute": "first_name", "value": first_name},
            {"attribute": "last_name", "value": last_name}
        ]
    })
}

/// Nova event application envelope.
pub fn application_resource(
    id: i64,
    event_id: i64,
    status_id: i64,
    status_name: &str,
    position: Option<&str>,
) -> Value {
    let mut fields = vec![
        json!({"attribute": "event", "value": format!("Event {}", event_id), "belongsToId": event_id}),
        json!({"attribute": "application_status", "value": status_name, "belongsToId": status_id}),
        json!({"attribute": "created_at", "value": "2024-01-10T09:00:00Z"}),
        json!({"attribute": "updated_at", "value": "2024-01-11T09:00:00Z"}),
    ];
    if let Some(position) = position {
        fields.push(json!({"attribute": "position", "value": position, "belongsToId": 1}));
    }

    json!({"id": {"value": id}, "fields": fields})
}

/// Nova event envelope.
pub fn event_resource(id: i64, date: &str, start: &str, end: &str) -> Value {
    json!({
        "id": {"value": id},
        "fields": [
            {"attribute": "date", "value": date},
            {"attribute": "start_time", "value": start},
            {"attribute": "end_time", "value": end},
            {"attribute": "location", "value": "Community Center"},
            {"attribute": "volunteers_needed", "value": 10}
        ]
    })
}

pub async fn mock_user_search(server: &MockServer, query: &str, users: Vec<Value>) {
    Mock::given(method("GET"))
        .and(path("/api/users"))
        .and(query_param("search", query))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"resources": users})))
        .mount(server)
        .await;
}

/// Single page of event applications with no next-page cursor.
pub async fn mock_applications(server: &MockServer, user_id: i64, applications: Vec<Value>) {
    Mock::given(method("GET"))
        .and(path("/api/event_applications"))
        .and(query_param("user_id", user_id.to_string()))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"resources": applications})),
        )
        .mount(server)
        .await;
}

pub async fn mock_event(server: &MockServer, event_id: i64, event: Value) {
    Mock::given(method("GET"))
        .and(path(format!("/api/events/{}", event_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"resource": event})))
        .mount(server)
        .await;
}

pub async fn mock_event_failure(server: &MockServer, event_id: i64) {
    Mock::given(method("GET"))
        .and(path(format!("/api/events/{}", event_id)))
        .respond_with(ResponseTemplate::new(500).set_body_string("legacy server error"))
        .mount(server)
        .await;
}

pub async fn count_users(db: &DatabaseConnection) -> u64 {
    nova_import::models::User::find().count(db).await.unwrap()
}

pub async fn count_shift_types(db: &DatabaseConnection) -> u64 {
    nova_import::models::ShiftType::find()
        .count(db)
        .await
        .unwrap()
}

pub async fn count_shifts(db: &DatabaseConnection) -> u64 {
    nova_import::models::Shift::find().count(db).await.unwrap()
}

pub async fn count_signups(db: &DatabaseConnection) -> u64 {
    nova_import::models::Signup::find().count(db).await.unwrap()
}
