use axum::{Router, middleware, routing::post};

use super::handlers::{checkout, webhook};
use crate::app_state::AppState;
use crate::middleware::auth::require_auth;

pub fn routes() -> Router<AppState> {
    let protected = Router::new()
        .route("/checkout", post(checkout))
        .route_layer(middleware::from_fn(require_auth));

    // The webhook authenticates by signature, not by user identity.
    Router::new().route("/webhook", post(webhook)).merge(protected)
}
