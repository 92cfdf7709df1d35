use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Public Router Module
///
/// Endpoints reachable without a login: browsing, authentication forms and the
/// static pages.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for load balancers.
        .route("/health", get(|| async { "ok" }))
        // GET /
        // Post listing with author names.
        .route("/", get(handlers::get_all_posts))
        // GET/POST /post/{post_id}
        // Post detail; POST submits a comment and requires a logged-in session,
        // otherwise it redirects to /login with a flash.
        .route(
            "/post/{post_id}",
            get(handlers::show_post).post(handlers::add_comment),
        )
        // GET/POST /register, /login
        .route(
            "/register",
            get(handlers::register_form).post(handlers::register),
        )
        .route("/login", get(handlers::login_form).post(handlers::login))
        // GET /logout
        .route("/logout", get(handlers::logout))
        // Static content.
        .route("/about", get(handlers::about))
        .route("/contact", get(handlers::contact))
}
