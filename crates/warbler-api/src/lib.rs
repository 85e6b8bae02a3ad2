pub mod auth;
pub mod error;
pub mod messages;
pub mod middleware;
pub mod state;
pub mod users;
pub mod validation;

use axum::{
    Router, middleware as axum_middleware,
    routing::{delete, get, patch, post},
};

use crate::middleware::require_auth;
pub use crate::state::{AppState, AppStateInner};

/// All routes, with state applied. Cross-cutting layers (CORS, tracing) are
/// added by the server binary.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/users", get(users::list_users))
        .route("/users/{user_id}", get(users::show_user))
        .route("/users/{user_id}/following", get(users::show_following))
        .route("/users/{user_id}/followers", get(users::show_followers))
        .route("/users/{user_id}/likes", get(users::show_likes))
        .route("/messages/{message_id}", get(messages::show_message))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/", get(messages::home_timeline))
        .route("/users", delete(users::delete_account))
        .route("/users/profile", patch(users::edit_profile))
        .route(
            "/users/follow/{user_id}",
            post(users::follow).delete(users::unfollow),
        )
        .route("/messages", post(messages::create_message))
        .route("/messages/{message_id}", delete(messages::delete_message))
        .route("/messages/{message_id}/like", post(messages::toggle_like))
        .layer(axum_middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state);

    Router::new().merge(public_routes).merge(protected_routes)
}
