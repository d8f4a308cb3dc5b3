use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use super::handlers::{
    cancel_event, check_in, create_event, get_event, get_participants, get_ticket, join_event,
    leave_event, list_events, list_my_events, publish_event, save_draft, update_event,
};
use crate::app_state::AppState;
use crate::middleware::auth::require_auth;

pub fn routes() -> Router<AppState> {
    let protected = Router::new()
        .route("/", post(create_event))
        .route("/mine", get(list_my_events))
        .route("/check-in", post(check_in))
        .route("/:id", put(update_event))
        .route("/:id/draft", put(save_draft))
        .route("/:id/publish", post(publish_event))
        .route("/:id/cancel", post(cancel_event))
        .route("/:id/join", post(join_event))
        .route("/:id/leave", post(leave_event))
        .route("/:id/ticket", get(get_ticket))
        .route("/:id/participants", get(get_participants))
        .route_layer(middleware::from_fn(require_auth));

    Router::new()
        .route("/", get(list_events))
        .route("/:id", get(get_event))
        .merge(protected)
}
