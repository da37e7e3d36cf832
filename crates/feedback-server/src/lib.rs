use axum::response::Redirect;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use feedback_api::{AppState, auth, feedback, users};

/// The full route table. Pulled out of `main` so integration tests can
/// drive the router directly.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { Redirect::to("/register") }))
        .route("/register", get(auth::show_register).post(auth::handle_register))
        .route("/login", get(auth::show_login).post(auth::handle_login))
        .route("/logout", post(auth::logout))
        .route("/users/{username}", get(users::show_user))
        .route("/users/{username}/delete", post(users::delete_user))
        .route(
            "/users/{username}/feedback/add",
            get(feedback::show_add).post(feedback::handle_add),
        )
        .route(
            "/feedback/{id}/update",
            get(feedback::show_update).post(feedback::handle_update),
        )
        .route("/feedback/{id}/delete", post(feedback::delete))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
