use sqlx::PgPool;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{Participation, Payment};
use crate::services::capacity;

/// What the webhook reconciliation decided for a provider success event.
#[derive(Debug)]
pub enum SettlementOutcome {
    /// Payment succeeded and a confirmed seat was available.
    Confirmed {
        payment: Payment,
        participation: Participation,
    },
    /// Payment succeeded but every seat was taken by the time it landed (or
    /// the event is no longer accepting participants). The money must go
    /// back: the payment is marked REFUNDED, the participation CANCELLED, and
    /// the caller instructs the provider to refund.
    RefundDue {
        payment: Payment,
        participation: Participation,
    },
    /// Replay of an already-settled provider event; acknowledged, no effect.
    AlreadyProcessed,
    /// Provider reference unknown to this store.
    UnknownReference,
}

/// Reconcile a provider "payment succeeded" event with participation state.
///
/// The PENDING -> SUCCEEDED update is conditional on the current status, so a
/// replayed webhook finds nothing to update and is acknowledged without
/// re-processing. The seat decision happens under the event row lock, racing
/// fairly with concurrent joins and other settlements.
pub async fn settle_success(pool: &PgPool, provider_ref: &str) -> Result<SettlementOutcome> {
    let mut tx = pool.begin().await?;

    let payment = sqlx::query_as::<_, Payment>(
        r#"
        UPDATE payments
        SET status = 'SUCCEEDED', updated_at = now()
        WHERE provider_ref = $1 AND status = 'PENDING'
        RETURNING payment_id, participation_id, amount, currency, status,
                  platform_fee, provider_ref, created_at, updated_at
        "#,
    )
    .bind(provider_ref)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(payment) = payment else {
        let known = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM payments WHERE provider_ref = $1)",
        )
        .bind(provider_ref)
        .fetch_one(pool)
        .await?;

        return Ok(if known {
            SettlementOutcome::AlreadyProcessed
        } else {
            SettlementOutcome::UnknownReference
        });
    };

    let hold = fetch_participation(&mut tx, payment.participation_id).await?;

    let seats = capacity::lock_event(&mut tx, hold.event_id).await?;
    let confirmed = capacity::confirmed_count(&mut tx, hold.event_id).await?;

    if seats.status.is_joinable() && confirmed < i64::from(seats.capacity) {
        let participation = sqlx::query_as::<_, Participation>(
            r#"
            UPDATE participations
            SET status = 'CONFIRMED'
            WHERE participation_id = $1
            RETURNING participation_id, event_id, user_id, user_email, user_name,
                      status, joined_at, checked_in_at
            "#,
        )
        .bind(payment.participation_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(SettlementOutcome::Confirmed {
            payment,
            participation,
        })
    } else {
        let payment = sqlx::query_as::<_, Payment>(
            r#"
            UPDATE payments
            SET status = 'REFUNDED', updated_at = now()
            WHERE payment_id = $1
            RETURNING payment_id, participation_id, amount, currency, status,
                      platform_fee, provider_ref, created_at, updated_at
            "#,
        )
        .bind(payment.payment_id)
        .fetch_one(&mut *tx)
        .await?;

        let participation = sqlx::query_as::<_, Participation>(
            r#"
            UPDATE participations
            SET status = 'CANCELLED'
            WHERE participation_id = $1
            RETURNING participation_id, event_id, user_id, user_email, user_name,
                      status, joined_at, checked_in_at
            "#,
        )
        .bind(payment.participation_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(SettlementOutcome::RefundDue {
            payment,
            participation,
        })
    }
}

/// Reconcile a provider failure or expiry: the payment goes PENDING -> FAILED
/// and the hold participation is released. Replays and unknown references
/// settle to `None`.
pub async fn settle_failure(
    pool: &PgPool,
    provider_ref: &str,
) -> Result<Option<(Payment, Participation)>> {
    let mut tx = pool.begin().await?;

    let payment = sqlx::query_as::<_, Payment>(
        r#"
        UPDATE payments
        SET status = 'FAILED', updated_at = now()
        WHERE provider_ref = $1 AND status = 'PENDING'
        RETURNING payment_id, participation_id, amount, currency, status,
                  platform_fee, provider_ref, created_at, updated_at
        "#,
    )
    .bind(provider_ref)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(payment) = payment else {
        return Ok(None);
    };

    let participation = sqlx::query_as::<_, Participation>(
        r#"
        UPDATE participations
        SET status = 'CANCELLED'
        WHERE participation_id = $1 AND status = 'WAITLISTED'
        RETURNING participation_id, event_id, user_id, user_email, user_name,
                  status, joined_at, checked_in_at
        "#,
    )
    .bind(payment.participation_id)
    .fetch_optional(&mut *tx)
    .await?;

    let participation = match participation {
        Some(p) => p,
        None => fetch_participation(&mut tx, payment.participation_id).await?,
    };

    tx.commit().await?;

    Ok(Some((payment, participation)))
}

async fn fetch_participation(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    participation_id: Uuid,
) -> Result<Participation> {
    let participation = sqlx::query_as::<_, Participation>(
        r#"
        SELECT participation_id, event_id, user_id, user_email, user_name,
               status, joined_at, checked_in_at
        FROM participations
        WHERE participation_id = $1
        "#,
    )
    .bind(participation_id)
    .fetch_one(&mut **tx)
    .await?;

    Ok(participation)
}
