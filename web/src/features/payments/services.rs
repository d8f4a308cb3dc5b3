use storage::{
    dto::payment::CheckoutResponse,
    error::StorageError,
    models::{EventStatus, payment},
    repository::event::EventRepository,
    repository::participation::ParticipationRepository,
    repository::payment::PaymentRepository,
    services::settlement::{self, SettlementOutcome},
};
use uuid::Uuid;

use crate::app_state::AppState;
use crate::error::WebResult;
use crate::middleware::auth::CurrentUser;
use crate::notifier::Notification;
use crate::stripe::{CheckoutParams, WebhookEvent};

/// Start the paid-seat flow: create the provider checkout session and the
/// local hold (WAITLISTED participation + PENDING payment). The seat itself
/// is only granted when the provider confirms the payment.
pub async fn initiate_checkout(
    state: &AppState,
    user: &CurrentUser,
    event_id: Uuid,
) -> WebResult<CheckoutResponse> {
    let pool = state.db.pool();

    let events = EventRepository::new(pool);
    let event = events.find_by_id(event_id).await?;

    if event.status != EventStatus::Published {
        return Err(StorageError::InvalidState(format!(
            "Cannot check out for a {} event",
            event.status.as_str().to_lowercase()
        ))
        .into());
    }
    if event.is_free() {
        return Err(StorageError::InvalidState(
            "This event is free; join it directly".to_string(),
        )
        .into());
    }

    let participations = ParticipationRepository::new(pool);
    if participations
        .find_active(event_id, user.id)
        .await?
        .is_some()
    {
        return Err(
            StorageError::Conflict("Already participating in this event".to_string()).into(),
        );
    }

    // Advisory pre-check; the binding decision still happens at settlement,
    // under the event row lock.
    let confirmed = participations.confirmed_count(event_id).await?;
    if confirmed >= i64::from(event.capacity) {
        return Err(StorageError::InvalidState("Event is full".to_string()).into());
    }

    let platform_fee = payment::platform_fee(event.price, state.config.platform_fee_percent);

    let reference = event_id.to_string();
    let session = state
        .stripe
        .create_checkout_session(&CheckoutParams {
            amount: event.price,
            currency: &event.currency,
            product_name: &event.title,
            application_fee: platform_fee,
            success_url: &state.config.checkout_success_url,
            cancel_url: &state.config.checkout_cancel_url,
            client_reference_id: &reference,
        })
        .await?;

    let payments = PaymentRepository::new(pool);
    let (participation, payment) = payments
        .create_pending(
            event_id,
            user.id,
            user.email.as_deref(),
            user.name.as_deref(),
            event.price,
            &event.currency,
            platform_fee,
            &session.id,
        )
        .await?;

    Ok(CheckoutResponse {
        payment_id: payment.payment_id,
        participation_id: participation.participation_id,
        checkout_url: session.url,
        amount: payment.amount,
        currency: payment.currency,
        status: payment.status,
    })
}

/// Reconcile a verified provider webhook with participation state. Always
/// idempotent: replayed deliveries find nothing left to settle.
pub async fn handle_webhook(state: &AppState, event: WebhookEvent) -> WebResult<()> {
    let pool = state.db.pool();
    let session_id = event.data.object.id.as_str();

    match event.event_type.as_str() {
        "checkout.session.completed" => {
            match settlement::settle_success(pool, session_id).await? {
                SettlementOutcome::Confirmed {
                    payment,
                    participation,
                } => {
                    let events = EventRepository::new(pool);
                    let title = events
                        .find_by_id(participation.event_id)
                        .await
                        .map(|e| e.title)
                        .unwrap_or_default();

                    state.notifier.notify(Notification::PaymentReceived {
                        user_id: participation.user_id,
                        event_id: participation.event_id,
                        amount: payment.amount,
                        currency: payment.currency.clone(),
                    });
                    state.notifier.notify(Notification::ParticipationConfirmed {
                        user_id: participation.user_id,
                        event_id: participation.event_id,
                        event_title: title,
                    });
                }
                SettlementOutcome::RefundDue {
                    payment,
                    participation,
                } => {
                    tracing::warn!(
                        payment_id = %payment.payment_id,
                        event_id = %participation.event_id,
                        "payment landed after capacity was exhausted; refunding"
                    );

                    // The ledger already records the refund; the provider call
                    // is best-effort and reconciled by ops if it fails.
                    match event.data.object.payment_intent.as_deref() {
                        Some(payment_intent) => {
                            if let Err(e) = state.stripe.refund_payment(payment_intent).await {
                                tracing::error!(
                                    payment_id = %payment.payment_id,
                                    error = %e,
                                    "provider refund failed; needs reconciliation"
                                );
                            }
                        }
                        None => {
                            tracing::error!(
                                payment_id = %payment.payment_id,
                                "webhook carried no payment intent; refund needs reconciliation"
                            );
                        }
                    }

                    state.notifier.notify(Notification::PaymentRefunded {
                        user_id: participation.user_id,
                        event_id: participation.event_id,
                        amount: payment.amount,
                        currency: payment.currency.clone(),
                    });
                }
                SettlementOutcome::AlreadyProcessed => {
                    tracing::debug!(session_id, "webhook replay; already settled");
                }
                SettlementOutcome::UnknownReference => {
                    tracing::warn!(session_id, "webhook for unknown checkout session");
                }
            }
        }
        "checkout.session.expired" | "checkout.session.async_payment_failed" => {
            if let Some((payment, participation)) =
                settlement::settle_failure(pool, session_id).await?
            {
                tracing::info!(
                    payment_id = %payment.payment_id,
                    participation_id = %participation.participation_id,
                    "checkout did not complete; hold released"
                );
            }
        }
        other => {
            tracing::debug!(event_type = other, "ignoring unhandled webhook event type");
        }
    }

    Ok(())
}
