//! # Import API Handlers
//!
//! Entry points for triggering history imports: one for a single target
//! email and one for a list of emails. Both validate the request body,
//! authenticate against Nova once, and hand off to the orchestrator,
//! returning the batch summary as the authoritative machine-readable result.

use std::sync::Arc;

use axum::{extract::State, response::Json};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::auth::OperatorAuth;
use crate::error::{ApiError, validation_error};
use crate::import::{BatchImportSummary, HistoryImporter, ImportOptions};
use crate::nova::NovaCredentials;
use crate::repositories::DbHistoryStore;
use crate::server::AppState;

/// Request body for a single-user import
#[derive(Debug, Deserialize, ToSchema)]
pub struct ImportUserRequest {
    /// Email of the volunteer whose history should be imported
    pub target_email: String,
    /// Credentials for the legacy Nova admin panel
    pub credentials: NovaCredentials,
    #[serde(default)]
    pub options: ImportOptions,
    /// Progress channel session to publish into, if an observer is attached
    pub session_id: Option<String>,
}

/// Request body for a batch import
#[derive(Debug, Deserialize, ToSchema)]
pub struct ImportBatchRequest {
    /// Emails of the volunteers whose history should be imported
    pub target_emails: Vec<String>,
    /// Credentials for the legacy Nova admin panel
    pub credentials: NovaCredentials,
    #[serde(default)]
    pub options: ImportOptions,
    /// Progress channel session to publish into, if an observer is attached
    pub session_id: Option<String>,
}

fn validate_credentials(credentials: &NovaCredentials) -> Result<(), ApiError> {
    let mut field_errors = serde_json::Map::new();

    if credentials.base_url.trim().is_empty() {
        field_errors.insert(
            "credentials.base_url".to_string(),
            "Must not be empty".into(),
        );
    }
    if credentials.email.trim().is_empty() {
        field_errors.insert("credentials.email".to_string(), "Must not be empty".into());
    }
    if credentials.password.is_empty() {
        field_errors.insert(
            "credentials.password".to_string(),
            "Must not be empty".into(),
        );
    }

    if field_errors.is_empty() {
        Ok(())
    } else {
        Err(validation_error(
            "Missing legacy credentials",
            serde_json::Value::Object(field_errors),
        ))
    }
}

fn validate_email(field: &str, email: &str) -> Result<(), ApiError> {
    if email.trim().is_empty() || !email.contains('@') {
        let mut field_errors = serde_json::Map::new();
        field_errors.insert(
            field.to_string(),
            "Must be a non-empty email address".into(),
        );
        return Err(validation_error(
            "Invalid target email",
            serde_json::Value::Object(field_errors),
        ));
    }
    Ok(())
}

fn importer(state: &AppState) -> HistoryImporter {
    HistoryImporter::new(
        Arc::new(DbHistoryStore::new(state.db.clone())),
        Arc::clone(&state.progress),
    )
}

/// Import one volunteer's history from the legacy system
#[utoipa::path(
    post,
    path = "/api/import/user",
    security(("bearer_auth" = [])),
    request_body = ImportUserRequest,
    responses(
        (status = 200, description = "Import ran to completion; inspect errors[] and user_results[] for the outcome", body = BatchImportSummary),
        (status = 400, description = "Invalid request body", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError)
    ),
    tag = "import"
)]
pub async fn import_user(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    Json(payload): Json<ImportUserRequest>,
) -> Result<Json<BatchImportSummary>, ApiError> {
    validate_email("target_email", &payload.target_email)?;
    validate_credentials(&payload.credentials)?;

    let emails = vec![payload.target_email];
    let summary = importer(&state)
        .run_batch(
            &payload.credentials,
            &emails,
            payload.options,
            payload.session_id.as_deref(),
        )
        .await;

    Ok(Json(summary))
}

/// Import several volunteers' histories from the legacy system
#[utoipa::path(
    post,
    path = "/api/import/batch",
    security(("bearer_auth" = [])),
    request_body = ImportBatchRequest,
    responses(
        (status = 200, description = "Batch ran to completion; inspect errors[] and user_results[] for the outcome", body = BatchImportSummary),
        (status = 400, description = "Invalid request body", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError)
    ),
    tag = "import"
)]
pub async fn import_batch(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    Json(payload): Json<ImportBatchRequest>,
) -> Result<Json<BatchImportSummary>, ApiError> {
    if payload.target_emails.is_empty() {
        return Err(validation_error(
            "No target emails",
            serde_json::json!({ "target_emails": "Must contain at least one email" }),
        ));
    }
    for email in &payload.target_emails {
        validate_email("target_emails", email)?;
    }
    validate_credentials(&payload.credentials)?;

    let summary = importer(&state)
        .run_batch(
            &payload.credentials,
            &payload.target_emails,
            payload.options,
            payload.session_id.as_deref(),
        )
        .await;

    Ok(Json(summary))
}
