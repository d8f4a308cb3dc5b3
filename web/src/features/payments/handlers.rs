use axum::{
    Extension, Json,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use storage::dto::payment::{CheckoutRequest, CheckoutResponse};

use crate::app_state::AppState;
use crate::error::WebError;
use crate::middleware::auth::CurrentUser;
use crate::stripe::{self, SIGNATURE_HEADER, WebhookEvent};

use super::services;

#[utoipa::path(
    post,
    path = "/api/payments/checkout",
    request_body = CheckoutRequest,
    security(("auth_proxy" = [])),
    responses(
        (status = 201, description = "Checkout session created; follow checkout_url", body = CheckoutResponse),
        (status = 404, description = "Event not found"),
        (status = 409, description = "Already participating"),
        (status = 422, description = "Event is free, full, or not accepting participants"),
        (status = 502, description = "Payment provider unreachable")
    ),
    tag = "payments"
)]
pub async fn checkout(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<CheckoutRequest>,
) -> Result<Response, WebError> {
    let response = services::initiate_checkout(&state, &user, req.event_id).await?;

    Ok((StatusCode::CREATED, Json(response)).into_response())
}

#[utoipa::path(
    post,
    path = "/api/payments/webhook",
    request_body = Vec<u8>,
    responses(
        (status = 200, description = "Webhook processed (idempotent on replays)"),
        (status = 400, description = "Missing signature or malformed payload"),
        (status = 401, description = "Signature verification failed")
    ),
    tag = "payments"
)]
pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, WebError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| WebError::BadRequest("Missing signature header".to_string()))?;

    let now = chrono::Utc::now().timestamp();
    if !stripe::verify_signature(&body, signature, &state.config.stripe_webhook_secret, now) {
        tracing::warn!("webhook signature verification failed");
        return Err(WebError::Unauthorized);
    }

    let event: WebhookEvent = serde_json::from_slice(&body)
        .map_err(|e| WebError::BadRequest(format!("Malformed webhook payload: {e}")))?;

    services::handle_webhook(&state, event).await?;

    Ok(StatusCode::OK)
}
