use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use storage::{
    dto::common::{PaginatedResponse, PaginationParams},
    dto::event::{CreateEventRequest, EventResponse, UpdateEventRequest},
    dto::participation::{
        CheckInRequest, CheckInResponse, ParticipantDetail, ParticipationResponse, TicketResponse,
    },
    models::EventCategory,
};
use utoipa::IntoParams;
use uuid::Uuid;
use validator::Validate;

use crate::app_state::AppState;
use crate::error::WebError;
use crate::middleware::auth::CurrentUser;

use super::services;

#[derive(Debug, Deserialize, IntoParams)]
pub struct EventFilter {
    pub category: Option<EventCategory>,
}

#[utoipa::path(
    get,
    path = "/api/events",
    params(EventFilter, PaginationParams),
    responses(
        (status = 200, description = "Published events for discovery", body = PaginatedResponse<EventResponse>)
    ),
    tag = "events"
)]
pub async fn list_events(
    State(state): State<AppState>,
    Query(filter): Query<EventFilter>,
    Query(pagination): Query<PaginationParams>,
) -> Result<Response, WebError> {
    pagination.validate().map_err(WebError::BadRequest)?;

    let (events, total_items) = services::list_published(
        state.db.pool(),
        filter.category,
        i64::from(pagination.limit()),
        i64::from(pagination.offset()),
    )
    .await?;

    let data: Vec<EventResponse> = events.into_iter().map(EventResponse::from).collect();
    let response =
        PaginatedResponse::new(data, pagination.page, pagination.page_size, total_items);

    Ok(Json(response).into_response())
}

#[utoipa::path(
    get,
    path = "/api/events/mine",
    security(("auth_proxy" = [])),
    responses(
        (status = 200, description = "Events organized by the current user", body = Vec<EventResponse>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "events"
)]
pub async fn list_my_events(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Response, WebError> {
    let events = services::list_my_events(state.db.pool(), &user).await?;

    let response: Vec<EventResponse> = events.into_iter().map(EventResponse::from).collect();

    Ok(Json(response).into_response())
}

#[utoipa::path(
    get,
    path = "/api/events/{id}",
    params(("id" = Uuid, Path, description = "Event id")),
    responses(
        (status = 200, description = "Event found", body = EventResponse),
        (status = 404, description = "Event not found (drafts are hidden from non-organizers)")
    ),
    tag = "events"
)]
pub async fn get_event(
    State(state): State<AppState>,
    viewer: Option<Extension<CurrentUser>>,
    Path(id): Path<Uuid>,
) -> Result<Response, WebError> {
    let viewer_id = viewer.map(|Extension(user)| user.id);
    let event = services::get_event(state.db.pool(), viewer_id, id).await?;

    Ok(Json(EventResponse::from(event)).into_response())
}

#[utoipa::path(
    post,
    path = "/api/events",
    request_body = CreateEventRequest,
    security(("auth_proxy" = [])),
    responses(
        (status = 201, description = "Event created", body = EventResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "events"
)]
pub async fn create_event(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<CreateEventRequest>,
) -> Result<Response, WebError> {
    req.validate()?;
    req.validate_schedule()
        .map_err(|e| WebError::BadRequest(e.to_string()))?;

    let event = services::create_event(state.db.pool(), &user, &req).await?;

    Ok((StatusCode::CREATED, Json(EventResponse::from(event))).into_response())
}

#[utoipa::path(
    put,
    path = "/api/events/{id}/draft",
    params(("id" = Uuid, Path, description = "Event id")),
    request_body = UpdateEventRequest,
    security(("auth_proxy" = [])),
    responses(
        (status = 200, description = "Draft saved", body = EventResponse),
        (status = 403, description = "Not the organizer"),
        (status = 404, description = "Event not found"),
        (status = 422, description = "Event is not a draft")
    ),
    tag = "events"
)]
pub async fn save_draft(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateEventRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    let event = services::save_draft(state.db.pool(), &user, id, &req).await?;

    Ok(Json(EventResponse::from(event)).into_response())
}

#[utoipa::path(
    put,
    path = "/api/events/{id}",
    params(("id" = Uuid, Path, description = "Event id")),
    request_body = UpdateEventRequest,
    security(("auth_proxy" = [])),
    responses(
        (status = 200, description = "Event updated", body = EventResponse),
        (status = 403, description = "Not the organizer"),
        (status = 404, description = "Event not found"),
        (status = 422, description = "Event can no longer be edited")
    ),
    tag = "events"
)]
pub async fn update_event(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateEventRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    let event =
        services::update_event(state.db.pool(), &state.notifier, &user, id, &req).await?;

    Ok(Json(EventResponse::from(event)).into_response())
}

#[utoipa::path(
    post,
    path = "/api/events/{id}/publish",
    params(("id" = Uuid, Path, description = "Event id")),
    security(("auth_proxy" = [])),
    responses(
        (status = 200, description = "Event published", body = EventResponse),
        (status = 400, description = "Mandatory fields missing"),
        (status = 403, description = "Not the organizer"),
        (status = 422, description = "Event is not a draft")
    ),
    tag = "events"
)]
pub async fn publish_event(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Response, WebError> {
    let event = services::publish_event(state.db.pool(), &user, id).await?;

    Ok(Json(EventResponse::from(event)).into_response())
}

#[utoipa::path(
    post,
    path = "/api/events/{id}/cancel",
    params(("id" = Uuid, Path, description = "Event id")),
    security(("auth_proxy" = [])),
    responses(
        (status = 200, description = "Event cancelled (idempotent)", body = EventResponse),
        (status = 403, description = "Not the organizer"),
        (status = 422, description = "Drafts cannot be cancelled")
    ),
    tag = "events"
)]
pub async fn cancel_event(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Response, WebError> {
    let event = services::cancel_event(state.db.pool(), &state.notifier, &user, id).await?;

    Ok(Json(EventResponse::from(event)).into_response())
}

#[utoipa::path(
    post,
    path = "/api/events/{id}/join",
    params(("id" = Uuid, Path, description = "Event id")),
    security(("auth_proxy" = [])),
    responses(
        (status = 201, description = "Joined; status is CONFIRMED or WAITLISTED", body = ParticipationResponse),
        (status = 404, description = "Event not found"),
        (status = 409, description = "Already participating"),
        (status = 422, description = "Event is not accepting participants")
    ),
    tag = "participation"
)]
pub async fn join_event(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Response, WebError> {
    let participation = services::join_event(state.db.pool(), &state.notifier, &user, id).await?;

    Ok((
        StatusCode::CREATED,
        Json(ParticipationResponse::from(participation)),
    )
        .into_response())
}

#[utoipa::path(
    post,
    path = "/api/events/{id}/leave",
    params(("id" = Uuid, Path, description = "Event id")),
    security(("auth_proxy" = [])),
    responses(
        (status = 200, description = "Participation cancelled", body = ParticipationResponse),
        (status = 404, description = "No active participation")
    ),
    tag = "participation"
)]
pub async fn leave_event(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Response, WebError> {
    let participation = services::leave_event(state.db.pool(), &state.notifier, &user, id).await?;

    Ok(Json(ParticipationResponse::from(participation)).into_response())
}

#[utoipa::path(
    post,
    path = "/api/events/check-in",
    request_body = CheckInRequest,
    security(("auth_proxy" = [])),
    responses(
        (status = 200, description = "Checked in (idempotent on re-scan)", body = CheckInResponse),
        (status = 400, description = "Unrecognized ticket code"),
        (status = 403, description = "Not the organizer of this event"),
        (status = 404, description = "Participation not found"),
        (status = 422, description = "Participation is cancelled")
    ),
    tag = "participation"
)]
pub async fn check_in(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<CheckInRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    let participation = services::check_in(state.db.pool(), &user, &req.code).await?;

    let checked_in_at = participation.checked_in_at.ok_or_else(|| {
        WebError::InternalServerError("check-in returned no timestamp".to_string())
    })?;

    Ok(Json(CheckInResponse {
        participation_id: participation.participation_id,
        status: participation.status,
        checked_in_at,
    })
    .into_response())
}

#[utoipa::path(
    get,
    path = "/api/events/{id}/participants",
    params(("id" = Uuid, Path, description = "Event id")),
    security(("auth_proxy" = [])),
    responses(
        (status = 200, description = "Participants with contact snapshots", body = Vec<ParticipantDetail>),
        (status = 403, description = "Only the organizer may list participants"),
        (status = 404, description = "Event not found")
    ),
    tag = "participation"
)]
pub async fn get_participants(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Response, WebError> {
    let participants = services::get_participants(state.db.pool(), &user, id).await?;

    let response: Vec<ParticipantDetail> =
        participants.into_iter().map(ParticipantDetail::from).collect();

    Ok(Json(response).into_response())
}

#[utoipa::path(
    get,
    path = "/api/events/{id}/ticket",
    params(("id" = Uuid, Path, description = "Event id")),
    security(("auth_proxy" = [])),
    responses(
        (status = 200, description = "The caller's ticket for this event", body = TicketResponse),
        (status = 404, description = "No active participation")
    ),
    tag = "participation"
)]
pub async fn get_ticket(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Response, WebError> {
    let (participation, code, qr_url) =
        services::get_ticket(state.db.pool(), &state.config.qr_render_url, &user, id).await?;

    Ok(Json(TicketResponse {
        participation_id: participation.participation_id,
        event_id: participation.event_id,
        code,
        qr_url,
        status: participation.status,
        checked_in_at: participation.checked_in_at,
    })
    .into_response())
}
