//! Route definitions for the API.

use axum::{
    http::{header, StatusCode},
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::handlers;
use crate::api::middleware::{cors, log_request};
use crate::config::{DeploymentMode, StaticFilesConfig, DEFAULT_ACTION_PREFIX};
use crate::error::PanicHandler;
use crate::AppState;

/// OpenAPI documentation.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::process_workflow_decision,
        handlers::service_metadata,
        handlers::health_check,
    ),
    components(schemas(
        crate::api::types::HealthResponse,
        crate::domain::DecisionRequest,
        crate::domain::DecisionResult,
        crate::domain::DecisionCode,
        crate::domain::ErrorCode,
    )),
    tags(
        (name = "workflow", description = "Workflow decision relay"),
        (name = "health", description = "Health and status endpoints")
    ),
    info(
        title = "Workflow Relay API",
        version = "0.1.0",
        description = "Forwards approve/reject decisions for workflow tasks to the task-processing service",
        license(name = "MIT")
    )
)]
pub struct ApiDoc;

/// OpenAPI document with the action paths moved under `action_prefix`.
pub fn api_doc(action_prefix: &str) -> utoipa::openapi::OpenApi {
    let mut doc = ApiDoc::openapi();
    if action_prefix != DEFAULT_ACTION_PREFIX {
        doc.paths.paths = std::mem::take(&mut doc.paths.paths)
            .into_iter()
            .map(|(path, item)| match path.strip_prefix(DEFAULT_ACTION_PREFIX) {
                Some(rest) => (format!("{}{}", action_prefix, rest), item),
                None => (path, item),
            })
            .collect();
    }
    doc
}

/// Build the shell router.
///
/// Layer order, outermost first: tracing, CORS (answers `OPTIONS`),
/// request logging, panic catching.
pub fn build_router(
    state: AppState,
    action_prefix: &str,
    static_files: &StaticFilesConfig,
    mode: DeploymentMode,
) -> Router {
    let login_page = static_files.login_page.clone();

    Router::new()
        // Decision relay
        .route(
            &format!("{}/processWorkflowDecision", action_prefix),
            post(handlers::process_workflow_decision),
        )
        .route(
            &format!("{}/$metadata", action_prefix),
            get(handlers::service_metadata),
        )
        // Health
        .route("/health", get(handlers::health_check))
        .with_state(state)
        // Static assets
        .route(
            "/",
            get(move || {
                let login_page = login_page.clone();
                async move { (StatusCode::FOUND, [(header::LOCATION, login_page)]) }
            }),
        )
        .nest_service(&static_files.mount_path, ServeDir::new(&static_files.directory))
        // OpenAPI docs
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api_doc(action_prefix)))
        // Middleware
        .layer(CatchPanicLayer::custom(PanicHandler::new(mode)))
        .layer(middleware::from_fn(log_request))
        .layer(middleware::from_fn(cors))
        .layer(TraceLayer::new_for_http())
}
