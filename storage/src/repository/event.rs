use sqlx::{PgPool, QueryBuilder};
use uuid::Uuid;

use crate::dto::event::{CreateEventRequest, UpdateEventRequest};
use crate::error::{Result, StorageError};
use crate::models::{Event, EventCategory, EventStatus, Participation};

/// Repository for Event database operations
pub struct EventRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> EventRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create a new event in the given initial status (DRAFT, or PUBLISHED for
    /// the create-and-publish shortcut).
    pub async fn create(
        &self,
        organizer_id: Uuid,
        req: &CreateEventRequest,
        status: EventStatus,
    ) -> Result<Event> {
        let event = sqlx::query_as::<_, Event>(
            r#"
            INSERT INTO events (
                organizer_id, status, title, description, category, event_date,
                start_time, end_time, duration_minutes, location_name, address,
                latitude, longitude, price, currency, capacity
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            RETURNING event_id, organizer_id, status, title, description, category,
                      event_date, start_time, end_time, duration_minutes, location_name,
                      address, latitude, longitude, price, currency, capacity,
                      created_at, updated_at
            "#,
        )
        .bind(organizer_id)
        .bind(status)
        .bind(&req.title)
        .bind(&req.description)
        .bind(req.category)
        .bind(req.event_date)
        .bind(req.start_time)
        .bind(req.end_time)
        .bind(req.duration_minutes)
        .bind(&req.location_name)
        .bind(&req.address)
        .bind(req.latitude)
        .bind(req.longitude)
        .bind(req.price)
        .bind(&req.currency)
        .bind(req.capacity)
        .fetch_one(self.pool)
        .await?;

        Ok(event)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Event> {
        let event = sqlx::query_as::<_, Event>(
            r#"
            SELECT event_id, organizer_id, status, title, description, category,
                   event_date, start_time, end_time, duration_minutes, location_name,
                   address, latitude, longitude, price, currency, capacity,
                   created_at, updated_at
            FROM events
            WHERE event_id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(StorageError::NotFound)?;

        Ok(event)
    }

    /// Published events for public discovery, optionally filtered by category.
    pub async fn list_published(
        &self,
        category: Option<EventCategory>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Event>, i64)> {
        let mut count_query =
            QueryBuilder::new("SELECT COUNT(*) FROM events WHERE status = 'PUBLISHED'");

        if let Some(cat) = category {
            count_query.push(" AND category = ");
            count_query.push_bind(cat);
        }

        let total_items = count_query
            .build_query_scalar::<i64>()
            .fetch_one(self.pool)
            .await?;

        let mut query = QueryBuilder::new(
            r#"
            SELECT event_id, organizer_id, status, title, description, category,
                   event_date, start_time, end_time, duration_minutes, location_name,
                   address, latitude, longitude, price, currency, capacity,
                   created_at, updated_at
            FROM events
            WHERE status = 'PUBLISHED'
            "#,
        );

        if let Some(cat) = category {
            query.push(" AND category = ");
            query.push_bind(cat);
        }

        query.push(" ORDER BY event_date ASC NULLS LAST, start_time ASC NULLS LAST, created_at DESC");
        query.push(" LIMIT ");
        query.push_bind(limit);
        query.push(" OFFSET ");
        query.push_bind(offset);

        let events = query.build_query_as::<Event>().fetch_all(self.pool).await?;

        Ok((events, total_items))
    }

    pub async fn list_by_organizer(&self, organizer_id: Uuid) -> Result<Vec<Event>> {
        let events = sqlx::query_as::<_, Event>(
            r#"
            SELECT event_id, organizer_id, status, title, description, category,
                   event_date, start_time, end_time, duration_minutes, location_name,
                   address, latitude, longitude, price, currency, capacity,
                   created_at, updated_at
            FROM events
            WHERE organizer_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(organizer_id)
        .fetch_all(self.pool)
        .await?;

        Ok(events)
    }

    /// Partial field update; absent fields keep their value. The status guard
    /// makes the edit a no-op once the event raced to CANCELLED, and the
    /// capacity guard (evaluated under the row lock the update takes) refuses
    /// shrinking below the current confirmed count, so confirmed seats can
    /// never exceed capacity through this path either.
    pub async fn update_fields(&self, id: Uuid, req: &UpdateEventRequest) -> Result<Event> {
        let event = sqlx::query_as::<_, Event>(
            r#"
            UPDATE events
            SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                category = COALESCE($4, category),
                event_date = COALESCE($5, event_date),
                start_time = COALESCE($6, start_time),
                end_time = COALESCE($7, end_time),
                duration_minutes = COALESCE($8, duration_minutes),
                location_name = COALESCE($9, location_name),
                address = COALESCE($10, address),
                latitude = COALESCE($11, latitude),
                longitude = COALESCE($12, longitude),
                price = COALESCE($13, price),
                currency = COALESCE($14, currency),
                capacity = COALESCE($15, capacity),
                updated_at = now()
            WHERE event_id = $1
              AND status <> 'CANCELLED'
              AND ($15::int IS NULL OR $15::int >= (
                  SELECT COUNT(*) FROM participations
                  WHERE event_id = $1 AND status = 'CONFIRMED'
              ))
            RETURNING event_id, organizer_id, status, title, description, category,
                      event_date, start_time, end_time, duration_minutes, location_name,
                      address, latitude, longitude, price, currency, capacity,
                      created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&req.title)
        .bind(&req.description)
        .bind(req.category)
        .bind(req.event_date)
        .bind(req.start_time)
        .bind(req.end_time)
        .bind(req.duration_minutes)
        .bind(&req.location_name)
        .bind(&req.address)
        .bind(req.latitude)
        .bind(req.longitude)
        .bind(req.price)
        .bind(&req.currency)
        .bind(req.capacity)
        .fetch_optional(self.pool)
        .await?;

        match event {
            Some(event) => Ok(event),
            None => {
                let current = self.find_by_id(id).await?;
                if current.status == EventStatus::Cancelled {
                    Err(StorageError::InvalidState(
                        "Cancelled events cannot be edited".to_string(),
                    ))
                } else {
                    Err(StorageError::Conflict(
                        "Capacity cannot be reduced below the confirmed participant count"
                            .to_string(),
                    ))
                }
            }
        }
    }

    /// DRAFT -> PUBLISHED, atomic with respect to concurrent publishes.
    pub async fn publish(&self, id: Uuid) -> Result<Event> {
        let event = sqlx::query_as::<_, Event>(
            r#"
            UPDATE events
            SET status = 'PUBLISHED', updated_at = now()
            WHERE event_id = $1 AND status = 'DRAFT'
            RETURNING event_id, organizer_id, status, title, description, category,
                      event_date, start_time, end_time, duration_minutes, location_name,
                      address, latitude, longitude, price, currency, capacity,
                      created_at, updated_at
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| StorageError::InvalidState("Only a draft can be published".to_string()))?;

        Ok(event)
    }

    /// PUBLISHED -> CANCELLED plus the participation cascade, in one
    /// transaction. Returns `None` when the event was already cancelled by a
    /// concurrent request (the caller treats that as idempotent success).
    pub async fn cancel_with_cascade(&self, id: Uuid) -> Result<Option<(Event, Vec<Participation>)>> {
        let mut tx = self.pool.begin().await?;

        let event = sqlx::query_as::<_, Event>(
            r#"
            UPDATE events
            SET status = 'CANCELLED', updated_at = now()
            WHERE event_id = $1 AND status = 'PUBLISHED'
            RETURNING event_id, organizer_id, status, title, description, category,
                      event_date, start_time, end_time, duration_minutes, location_name,
                      address, latitude, longitude, price, currency, capacity,
                      created_at, updated_at
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(event) = event else {
            return Ok(None);
        };

        let affected = sqlx::query_as::<_, Participation>(
            r#"
            UPDATE participations
            SET status = 'CANCELLED'
            WHERE event_id = $1 AND status <> 'CANCELLED'
            RETURNING participation_id, event_id, user_id, user_email, user_name,
                      status, joined_at, checked_in_at
            "#,
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Some((event, affected)))
    }
}
