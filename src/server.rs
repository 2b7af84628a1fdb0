//! # Server Configuration
//!
//! This module contains the server setup and configuration for the Nova
//! Import API.

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use sea_orm::DatabaseConnection;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::auth_middleware;
use crate::config::AppConfig;
use crate::handlers;
use crate::progress::ProgressRegistry;

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: DatabaseConnection,
    /// Session registry for live import progress; the service's only shared
    /// mutable state
    pub progress: Arc<ProgressRegistry>,
}

/// Creates and configures the Axum application router
pub fn create_app(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/import/user", post(handlers::import::import_user))
        .route("/import/batch", post(handlers::import::import_batch))
        .route(
            "/import/progress/{session_id}",
            get(handlers::progress::progress_stream),
        )
        .layer(axum::middleware::from_fn_with_state(
            Arc::clone(&state.config),
            auth_middleware,
        ));

    Router::new()
        .route("/", get(handlers::root))
        .route("/healthz", get(handlers::healthz))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
}

/// Starts the server with the given configuration
pub async fn run_server(
    config: AppConfig,
    db: DatabaseConnection,
) -> Result<(), Box<dyn std::error::Error>> {
    let addr = config
        .bind_addr()
        .map_err(|e| format!("Invalid server address: {}", e))?;
    let profile = config.profile.clone();

    let state = AppState {
        config: Arc::new(config),
        db,
        progress: Arc::new(ProgressRegistry::new()),
    };
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Server listening on: {}", addr);
    tracing::info!("Running in profile: {}", profile);

    axum::serve(listener, app).await?;

    Ok(())
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::root,
        crate::handlers::healthz,
        crate::handlers::import::import_user,
        crate::handlers::import::import_batch,
        crate::handlers::progress::progress_stream,
    ),
    components(
        schemas(
            crate::models::ServiceInfo,
            crate::error::ApiError,
            crate::nova::NovaCredentials,
            crate::import::ImportOptions,
            crate::import::UserImportStatus,
            crate::import::UserImportResult,
            crate::import::BatchImportSummary,
            crate::progress::ProgressEvent,
            crate::handlers::import::ImportUserRequest,
            crate::handlers::import::ImportBatchRequest,
        )
    ),
    info(
        title = "Nova Import API",
        description = "API for migrating historical volunteer activity out of the legacy Nova admin platform",
        version = env!("CARGO_PKG_VERSION"),
    )
)]
pub struct ApiDoc;
