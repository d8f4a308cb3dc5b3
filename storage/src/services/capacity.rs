use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::{Result, StorageError};
use crate::models::{EventStatus, Participation};

/// The slice of an event row the capacity ledger works with. Obtained under a
/// row lock, so capacity decisions made while it is held cannot race.
#[derive(Debug, FromRow)]
pub struct EventSeats {
    pub event_id: Uuid,
    pub status: EventStatus,
    pub price: i64,
    pub capacity: i32,
}

/// Locks the event row for the rest of the transaction. This is the single
/// per-event serialization point: every count-and-reserve, promotion, and
/// settlement decision happens while holding it.
pub async fn lock_event(
    tx: &mut Transaction<'_, Postgres>,
    event_id: Uuid,
) -> Result<EventSeats> {
    let seats = sqlx::query_as::<_, EventSeats>(
        "SELECT event_id, status, price, capacity FROM events WHERE event_id = $1 FOR UPDATE",
    )
    .bind(event_id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or(StorageError::NotFound)?;

    Ok(seats)
}

pub async fn confirmed_count(
    tx: &mut Transaction<'_, Postgres>,
    event_id: Uuid,
) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM participations WHERE event_id = $1 AND status = 'CONFIRMED'",
    )
    .bind(event_id)
    .fetch_one(&mut **tx)
    .await?;

    Ok(count)
}

/// Promotes the waitlist head: earliest joined_at, participation id as the
/// tie-break. Holds whose payment has not SUCCEEDED are skipped; a pending
/// checkout must never be promoted into an unpaid confirmed seat.
///
/// Callers must hold the event row lock and have verified a free slot exists.
pub async fn promote_next(
    tx: &mut Transaction<'_, Postgres>,
    event_id: Uuid,
) -> Result<Option<Participation>> {
    let promoted = sqlx::query_as::<_, Participation>(
        r#"
        UPDATE participations
        SET status = 'CONFIRMED'
        WHERE participation_id = (
            SELECT p.participation_id
            FROM participations p
            JOIN events e ON e.event_id = p.event_id
            WHERE p.event_id = $1
              AND p.status = 'WAITLISTED'
              AND (
                  e.price = 0
                  OR EXISTS (
                      SELECT 1 FROM payments pay
                      WHERE pay.participation_id = p.participation_id
                        AND pay.status = 'SUCCEEDED'
                  )
              )
            ORDER BY p.joined_at ASC, p.participation_id ASC
            LIMIT 1
        )
        RETURNING participation_id, event_id, user_id, user_email, user_name,
                  status, joined_at, checked_in_at
        "#,
    )
    .bind(event_id)
    .fetch_optional(&mut **tx)
    .await?;

    Ok(promoted)
}

/// Called when a confirmed slot frees up: promotes the waitlist head if the
/// event is still accepting participants and a slot is actually free.
pub async fn release_slot(pool: &PgPool, event_id: Uuid) -> Result<Option<Participation>> {
    let mut tx = pool.begin().await?;
    let seats = lock_event(&mut tx, event_id).await?;

    let promoted = if seats.status.is_joinable() {
        let confirmed = confirmed_count(&mut tx, event_id).await?;
        if confirmed < i64::from(seats.capacity) {
            promote_next(&mut tx, event_id).await?
        } else {
            None
        }
    } else {
        None
    };

    tx.commit().await?;

    Ok(promoted)
}

/// Fills every free confirmed slot from the waitlist, in join order. Used when
/// an organizer raises the capacity of a published event.
pub async fn promote_up_to_capacity(pool: &PgPool, event_id: Uuid) -> Result<Vec<Participation>> {
    let mut tx = pool.begin().await?;
    let seats = lock_event(&mut tx, event_id).await?;

    let mut promoted = Vec::new();

    if seats.status.is_joinable() {
        loop {
            let confirmed = confirmed_count(&mut tx, event_id).await?;
            if confirmed >= i64::from(seats.capacity) {
                break;
            }
            match promote_next(&mut tx, event_id).await? {
                Some(participation) => promoted.push(participation),
                None => break,
            }
        }
    }

    tx.commit().await?;

    Ok(promoted)
}
