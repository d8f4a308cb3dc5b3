use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{Result, StorageError};
use crate::models::{Participation, Payment};

/// Repository for Payment database operations
pub struct PaymentRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PaymentRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Creates the checkout pair: a WAITLISTED hold participation and its
    /// PENDING payment, in one transaction. The hold trips the active-unique
    /// index for duplicate checkouts (`Conflict`).
    pub async fn create_pending(
        &self,
        event_id: Uuid,
        user_id: Uuid,
        user_email: Option<&str>,
        user_name: Option<&str>,
        amount: i64,
        currency: &str,
        platform_fee: i64,
        provider_ref: &str,
    ) -> Result<(Participation, Payment)> {
        let mut tx = self.pool.begin().await?;

        let participation = sqlx::query_as::<_, Participation>(
            r#"
            INSERT INTO participations (event_id, user_id, user_email, user_name, status)
            VALUES ($1, $2, $3, $4, 'WAITLISTED')
            RETURNING participation_id, event_id, user_id, user_email, user_name,
                      status, joined_at, checked_in_at
            "#,
        )
        .bind(event_id)
        .bind(user_id)
        .bind(user_email)
        .bind(user_name)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| StorageError::from(e).into_conflict("Already participating in this event"))?;

        let payment = sqlx::query_as::<_, Payment>(
            r#"
            INSERT INTO payments (participation_id, amount, currency, status, platform_fee, provider_ref)
            VALUES ($1, $2, $3, 'PENDING', $4, $5)
            RETURNING payment_id, participation_id, amount, currency, status,
                      platform_fee, provider_ref, created_at, updated_at
            "#,
        )
        .bind(participation.participation_id)
        .bind(amount)
        .bind(currency)
        .bind(platform_fee)
        .bind(provider_ref)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok((participation, payment))
    }

}
