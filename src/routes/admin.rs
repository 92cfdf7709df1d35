use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Admin Router Module
///
/// Post creation, editing and deletion. The caller mounts this router behind
/// the `admin_guard` middleware, which answers 403 to anonymous and non-admin
/// visitors before any handler runs. Handlers still take `AdminUser` to learn
/// who the admin is.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET/POST /new-post
        .route(
            "/new-post",
            get(handlers::new_post_form).post(handlers::create_post),
        )
        // GET/POST /edit-post/{post_id}
        // 404 when the post does not exist.
        .route(
            "/edit-post/{post_id}",
            get(handlers::edit_post_form).post(handlers::edit_post),
        )
        // GET /delete/{post_id}
        // Kept as GET for link-driven deletion from the listing page.
        .route("/delete/{post_id}", get(handlers::delete_post))
}
