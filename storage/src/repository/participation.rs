use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{Result, StorageError};
use crate::models::{Participation, ParticipationStatus};
use crate::services::capacity;

/// Repository for Participation database operations
pub struct ParticipationRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ParticipationRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Join a free event. The event row lock makes the count-and-reserve
    /// atomic: under concurrent joins the number of CONFIRMED rows can never
    /// exceed capacity, and the overflow lands on the waitlist. A duplicate
    /// active participation trips the partial unique index and surfaces as
    /// `Conflict`.
    pub async fn join(
        &self,
        event_id: Uuid,
        user_id: Uuid,
        user_email: Option<&str>,
        user_name: Option<&str>,
    ) -> Result<Participation> {
        let mut tx = self.pool.begin().await?;

        let seats = capacity::lock_event(&mut tx, event_id).await?;
        if !seats.status.is_joinable() {
            return Err(StorageError::InvalidState(format!(
                "Cannot join a {} event",
                seats.status.as_str().to_lowercase()
            )));
        }

        let confirmed = capacity::confirmed_count(&mut tx, event_id).await?;
        let status = if confirmed < i64::from(seats.capacity) {
            ParticipationStatus::Confirmed
        } else {
            ParticipationStatus::Waitlisted
        };

        let participation = sqlx::query_as::<_, Participation>(
            r#"
            INSERT INTO participations (event_id, user_id, user_email, user_name, status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING participation_id, event_id, user_id, user_email, user_name,
                      status, joined_at, checked_in_at
            "#,
        )
        .bind(event_id)
        .bind(user_id)
        .bind(user_email)
        .bind(user_name)
        .bind(status)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| StorageError::from(e).into_conflict("Already participating in this event"))?;

        tx.commit().await?;

        Ok(participation)
    }

    /// Cancel the caller's active participation. Returns the status the row
    /// held before cancellation (the caller releases the slot when it was
    /// CONFIRMED) along with the cancelled row. A second leave finds no
    /// active row and fails with `NotFound`.
    pub async fn leave(
        &self,
        event_id: Uuid,
        user_id: Uuid,
    ) -> Result<(ParticipationStatus, Participation)> {
        let mut tx = self.pool.begin().await?;

        let active = sqlx::query_as::<_, Participation>(
            r#"
            SELECT participation_id, event_id, user_id, user_email, user_name,
                   status, joined_at, checked_in_at
            FROM participations
            WHERE event_id = $1 AND user_id = $2 AND status <> 'CANCELLED'
            FOR UPDATE
            "#,
        )
        .bind(event_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(StorageError::NotFound)?;

        let cancelled = sqlx::query_as::<_, Participation>(
            r#"
            UPDATE participations
            SET status = 'CANCELLED'
            WHERE participation_id = $1
            RETURNING participation_id, event_id, user_id, user_email, user_name,
                      status, joined_at, checked_in_at
            "#,
        )
        .bind(active.participation_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok((active.status, cancelled))
    }

    pub async fn find_by_id(&self, participation_id: Uuid) -> Result<Participation> {
        let participation = sqlx::query_as::<_, Participation>(
            r#"
            SELECT participation_id, event_id, user_id, user_email, user_name,
                   status, joined_at, checked_in_at
            FROM participations
            WHERE participation_id = $1
            "#,
        )
        .bind(participation_id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(StorageError::NotFound)?;

        Ok(participation)
    }

    pub async fn find_active(
        &self,
        event_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Participation>> {
        let participation = sqlx::query_as::<_, Participation>(
            r#"
            SELECT participation_id, event_id, user_id, user_email, user_name,
                   status, joined_at, checked_in_at
            FROM participations
            WHERE event_id = $1 AND user_id = $2 AND status <> 'CANCELLED'
            "#,
        )
        .bind(event_id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(participation)
    }

    /// All participations for an event, confirmed first, then by join order.
    pub async fn list_for_event(&self, event_id: Uuid) -> Result<Vec<Participation>> {
        let participations = sqlx::query_as::<_, Participation>(
            r#"
            SELECT participation_id, event_id, user_id, user_email, user_name,
                   status, joined_at, checked_in_at
            FROM participations
            WHERE event_id = $1
            ORDER BY status ASC, joined_at ASC, participation_id ASC
            "#,
        )
        .bind(event_id)
        .fetch_all(self.pool)
        .await?;

        Ok(participations)
    }

    /// Confirmed-seat count outside a transaction; advisory only (the binding
    /// check always happens under the event row lock).
    pub async fn confirmed_count(&self, event_id: Uuid) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM participations WHERE event_id = $1 AND status = 'CONFIRMED'",
        )
        .bind(event_id)
        .fetch_one(self.pool)
        .await?;

        Ok(count)
    }

    /// Door check-in. Idempotent: a re-scan keeps the original timestamp and
    /// succeeds. The status guard refuses rows that raced to CANCELLED.
    pub async fn check_in(&self, participation_id: Uuid) -> Result<Participation> {
        let participation = sqlx::query_as::<_, Participation>(
            r#"
            UPDATE participations
            SET checked_in_at = COALESCE(checked_in_at, now())
            WHERE participation_id = $1 AND status <> 'CANCELLED'
            RETURNING participation_id, event_id, user_id, user_email, user_name,
                      status, joined_at, checked_in_at
            "#,
        )
        .bind(participation_id)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| {
            StorageError::InvalidState("Cancelled participations cannot be checked in".to_string())
        })?;

        Ok(participation)
    }
}
