use axum::{
    Router,
    extract::{FromRef, Request},
    http::HeaderName,
    middleware::{self, Next},
    response::Response,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod auth;
pub mod config;
pub mod error;
pub mod forms;
pub mod handlers;
pub mod models;
pub mod password;
pub mod repository;
pub mod sanitize;
pub mod session;
pub mod views;

// Routing segregation (Public, Admin).
pub mod routes;
use auth::AdminUser;
use routes::{admin, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use error::AppError;
pub use repository::{PostgresRepository, RepositoryState};
pub use session::{Session, SessionSettings};

/// ApiDoc
///
/// OpenAPI description of every route, served at `/api-docs/openapi.json`
/// and browsable through Swagger UI.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::get_all_posts, handlers::show_post, handlers::add_comment,
        handlers::register_form, handlers::register, handlers::login_form,
        handlers::login, handlers::logout, handlers::new_post_form,
        handlers::create_post, handlers::edit_post_form, handlers::edit_post,
        handlers::delete_post, handlers::about, handlers::contact
    ),
    components(
        schemas(
            forms::RegisterForm, forms::LoginForm, forms::CommentForm, forms::PostForm,
            models::Post, models::Comment, models::Role,
        )
    ),
    tags(
        (name = "blog-portal", description = "Blog with admin-authored posts and reader comments")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single shared container handed to every request: the repository and
/// the immutable configuration.
#[derive(Clone)]
pub struct AppState {
    /// Repository Layer: abstracts database access.
    pub repo: RepositoryState,
    /// Configuration loaded at startup.
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

// Let extractors pull just the component they need out of AppState.

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

impl FromRef<AppState> for SessionSettings {
    fn from_ref(app_state: &AppState) -> SessionSettings {
        app_state.config.session_settings()
    }
}

/// admin_guard
///
/// Middleware placed in front of the admin router. Extracting `AdminUser`
/// rejects anonymous and non-admin visitors with 403 before the handler runs.
async fn admin_guard(_admin: AdminUser, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// create_router
///
/// Assembles the routing table, applies the admin guard and the observability
/// layers, and registers the application state.
pub fn create_router(state: AppState) -> Router {
    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        // Documentation: Swagger UI over the generated OpenAPI document.
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Public Routes: no guard.
        .merge(public::public_routes())
        // Admin Routes: guarded as a whole.
        .merge(
            admin::admin_routes()
                .route_layer(middleware::from_fn_with_state(state.clone(), admin_guard)),
        )
        .with_state(state);

    base_router.layer(
        ServiceBuilder::new()
            // Every request gets a UUID before tracing starts.
            .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(trace_span_logger)
                    .on_response(
                        DefaultOnResponse::new()
                            .level(Level::INFO)
                            .latency_unit(tower_http::LatencyUnit::Millis),
                    ),
            )
            // Echo the id back to the client.
            .layer(PropagateRequestIdLayer::new(x_request_id)),
    )
}

/// trace_span_logger
///
/// Builds the per-request span so every log line carries method, URI and the
/// request id.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
