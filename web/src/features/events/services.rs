use sqlx::PgPool;
use storage::{
    dto::event::{CreateEventRequest, UpdateEventRequest},
    error::StorageError,
    models::{Event, EventCategory, EventStatus, Participation, ParticipationStatus, ticket},
    repository::event::EventRepository,
    repository::participation::ParticipationRepository,
    services::capacity,
};
use uuid::Uuid;

use crate::error::{WebError, WebResult};
use crate::middleware::auth::CurrentUser;
use crate::notifier::{Notification, Notifier};

/// Create a new event, as a draft or directly published.
pub async fn create_event(
    pool: &PgPool,
    user: &CurrentUser,
    req: &CreateEventRequest,
) -> WebResult<Event> {
    let status = if req.publish_immediately {
        let missing = req.missing_publish_fields();
        if !missing.is_empty() {
            return Err(WebError::BadRequest(format!(
                "Cannot publish: missing {}",
                missing.join(", ")
            )));
        }
        EventStatus::Published
    } else {
        EventStatus::Draft
    };

    let repo = EventRepository::new(pool);
    Ok(repo.create(user.id, req, status).await?)
}

/// Drafts are visible to their organizer only; to anyone else they do not
/// exist.
pub async fn get_event(pool: &PgPool, viewer: Option<Uuid>, event_id: Uuid) -> WebResult<Event> {
    let repo = EventRepository::new(pool);
    let event = repo.find_by_id(event_id).await?;

    if event.status == EventStatus::Draft && viewer != Some(event.organizer_id) {
        return Err(WebError::NotFound);
    }

    Ok(event)
}

pub async fn list_published(
    pool: &PgPool,
    category: Option<EventCategory>,
    limit: i64,
    offset: i64,
) -> WebResult<(Vec<Event>, i64)> {
    let repo = EventRepository::new(pool);
    Ok(repo.list_published(category, limit, offset).await?)
}

pub async fn list_my_events(pool: &PgPool, user: &CurrentUser) -> WebResult<Vec<Event>> {
    let repo = EventRepository::new(pool);
    Ok(repo.list_by_organizer(user.id).await?)
}

/// Draft-only edit path.
pub async fn save_draft(
    pool: &PgPool,
    user: &CurrentUser,
    event_id: Uuid,
    req: &UpdateEventRequest,
) -> WebResult<Event> {
    if req.status.is_some() {
        return Err(WebError::BadRequest(
            "Draft saves cannot change the event status".to_string(),
        ));
    }

    let repo = EventRepository::new(pool);
    let event = repo.find_by_id(event_id).await?;

    if !event.is_owned_by(user.id) {
        return Err(WebError::Forbidden);
    }
    if event.status != EventStatus::Draft {
        return Err(
            StorageError::InvalidState("Only drafts can be saved as drafts".to_string()).into(),
        );
    }

    Ok(repo.update_fields(event_id, req).await?)
}

/// Edit path for drafts and published events. A `status: CANCELLED` payload
/// routes through the cancel transition; raising the capacity of a published
/// event pulls waiting participants into the freed seats.
pub async fn update_event(
    pool: &PgPool,
    notifier: &Notifier,
    user: &CurrentUser,
    event_id: Uuid,
    req: &UpdateEventRequest,
) -> WebResult<Event> {
    req.validate_status_change()
        .map_err(|e| WebError::BadRequest(e.to_string()))?;

    let repo = EventRepository::new(pool);
    let event = repo.find_by_id(event_id).await?;

    if !event.is_owned_by(user.id) {
        return Err(WebError::Forbidden);
    }

    if req.requests_cancellation() {
        return cancel_event(pool, notifier, user, event_id).await;
    }

    if !event.status.is_editable() {
        return Err(
            StorageError::InvalidState("Cancelled events cannot be edited".to_string()).into(),
        );
    }

    let previous_capacity = event.capacity;
    let updated = repo.update_fields(event_id, req).await?;

    if updated.status == EventStatus::Published && updated.capacity > previous_capacity {
        let promoted = capacity::promote_up_to_capacity(pool, event_id).await?;
        for participation in promoted {
            notifier.notify(Notification::SpotOpened {
                user_id: participation.user_id,
                event_id,
                event_title: updated.title.clone(),
            });
        }
    }

    Ok(updated)
}

/// DRAFT -> PUBLISHED. Completeness is checked on the stored row, the
/// transition itself by a conditional update, so concurrent publishes cannot
/// both succeed.
pub async fn publish_event(pool: &PgPool, user: &CurrentUser, event_id: Uuid) -> WebResult<Event> {
    let repo = EventRepository::new(pool);
    let event = repo.find_by_id(event_id).await?;

    if !event.is_owned_by(user.id) {
        return Err(WebError::Forbidden);
    }
    if event.status != EventStatus::Draft {
        return Err(
            StorageError::InvalidState("Only a draft can be published".to_string()).into(),
        );
    }

    let missing = event.missing_publish_fields();
    if !missing.is_empty() {
        return Err(WebError::BadRequest(format!(
            "Cannot publish: missing {}",
            missing.join(", ")
        )));
    }

    Ok(repo.publish(event_id).await?)
}

/// PUBLISHED -> CANCELLED. Idempotent on an already-cancelled event; rejected
/// on a draft. Active participations are cancelled in the same transaction
/// and each participant is notified.
pub async fn cancel_event(
    pool: &PgPool,
    notifier: &Notifier,
    user: &CurrentUser,
    event_id: Uuid,
) -> WebResult<Event> {
    let repo = EventRepository::new(pool);
    let event = repo.find_by_id(event_id).await?;

    if !event.is_owned_by(user.id) {
        return Err(WebError::Forbidden);
    }

    match event.status {
        EventStatus::Cancelled => Ok(event),
        EventStatus::Draft => Err(StorageError::InvalidState(
            "Only a published event can be cancelled".to_string(),
        )
        .into()),
        EventStatus::Published => match repo.cancel_with_cascade(event_id).await? {
            Some((cancelled, affected)) => {
                for participation in affected {
                    notifier.notify(Notification::EventCancelled {
                        user_id: participation.user_id,
                        event_id,
                        event_title: cancelled.title.clone(),
                    });
                }
                Ok(cancelled)
            }
            // Lost the race against another cancel; same outcome.
            None => Ok(repo.find_by_id(event_id).await?),
        },
    }
}

/// Join a free event: confirmed while seats remain, waitlisted after.
/// Priced events confirm through checkout instead.
pub async fn join_event(
    pool: &PgPool,
    notifier: &Notifier,
    user: &CurrentUser,
    event_id: Uuid,
) -> WebResult<Participation> {
    let events = EventRepository::new(pool);
    let event = events.find_by_id(event_id).await?;

    if !event.status.is_joinable() {
        return Err(StorageError::InvalidState(format!(
            "Cannot join a {} event",
            event.status.as_str().to_lowercase()
        ))
        .into());
    }
    if !event.is_free() {
        return Err(StorageError::InvalidState(
            "This is a paid event; start a checkout instead".to_string(),
        )
        .into());
    }

    let participations = ParticipationRepository::new(pool);
    let participation = participations
        .join(event_id, user.id, user.email.as_deref(), user.name.as_deref())
        .await?;

    let notification = match participation.status {
        ParticipationStatus::Confirmed => Notification::ParticipationConfirmed {
            user_id: user.id,
            event_id,
            event_title: event.title.clone(),
        },
        _ => Notification::Waitlisted {
            user_id: user.id,
            event_id,
            event_title: event.title.clone(),
        },
    };
    notifier.notify(notification);

    Ok(participation)
}

/// Cancel the caller's participation; a freed confirmed seat is released to
/// the waitlist head.
pub async fn leave_event(
    pool: &PgPool,
    notifier: &Notifier,
    user: &CurrentUser,
    event_id: Uuid,
) -> WebResult<Participation> {
    let events = EventRepository::new(pool);
    let event = events.find_by_id(event_id).await?;

    let participations = ParticipationRepository::new(pool);
    let (prior_status, cancelled) = participations.leave(event_id, user.id).await?;

    if prior_status == ParticipationStatus::Confirmed {
        if let Some(promoted) = capacity::release_slot(pool, event_id).await? {
            notifier.notify(Notification::SpotOpened {
                user_id: promoted.user_id,
                event_id,
                event_title: event.title,
            });
        }
    }

    Ok(cancelled)
}

/// Door check-in by ticket code or bare participation id. Organizer-only.
/// Idempotent: a re-scan returns the original timestamp.
pub async fn check_in(pool: &PgPool, user: &CurrentUser, code: &str) -> WebResult<Participation> {
    let participation_id =
        ticket::parse_ticket_code(code).ok_or_else(|| WebError::BadRequest(
            "Unrecognized ticket code".to_string(),
        ))?;

    let participations = ParticipationRepository::new(pool);
    let participation = participations.find_by_id(participation_id).await?;

    let events = EventRepository::new(pool);
    let event = events.find_by_id(participation.event_id).await?;
    if !event.is_owned_by(user.id) {
        return Err(WebError::Forbidden);
    }

    if participation.status == ParticipationStatus::Cancelled {
        return Err(StorageError::InvalidState(
            "Cancelled participations cannot be checked in".to_string(),
        )
        .into());
    }

    let checked_in = participations.check_in(participation_id).await?;

    if checked_in.status == ParticipationStatus::Waitlisted {
        tracing::warn!(
            participation_id = %checked_in.participation_id,
            event_id = %event.event_id,
            "check-in accepted for a waitlisted participation"
        );
    }

    Ok(checked_in)
}

/// Organizer-only participant list; the only place contact snapshots leave
/// the store.
pub async fn get_participants(
    pool: &PgPool,
    user: &CurrentUser,
    event_id: Uuid,
) -> WebResult<Vec<Participation>> {
    let events = EventRepository::new(pool);
    let event = events.find_by_id(event_id).await?;

    if !event.is_owned_by(user.id) {
        return Err(WebError::Forbidden);
    }

    let participations = ParticipationRepository::new(pool);
    Ok(participations.list_for_event(event_id).await?)
}

/// The caller's ticket for an event: the scan code plus where to render it.
pub async fn get_ticket(
    pool: &PgPool,
    qr_base_url: &str,
    user: &CurrentUser,
    event_id: Uuid,
) -> WebResult<(Participation, String, String)> {
    let participations = ParticipationRepository::new(pool);
    let participation = participations
        .find_active(event_id, user.id)
        .await?
        .ok_or(WebError::NotFound)?;

    let code = ticket::ticket_code(participation.participation_id);
    let qr_url = crate::qr::render_url(qr_base_url, &code);

    Ok((participation, code, qr_url))
}
