//! Fire-and-forget notification dispatch.
//!
//! State transitions queue notifications here; a background task drains the
//! queue and hands each one to the delivery collaborator (email / in-app
//! push). Delivery failures are logged and dropped; they must never fail or
//! roll back the transition that triggered them.

use serde::Serialize;
use tokio::sync::mpsc;
use uuid::Uuid;

/// One variant per notification kind, each carrying its own payload shape.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notification {
    ParticipationConfirmed {
        user_id: Uuid,
        event_id: Uuid,
        event_title: String,
    },
    Waitlisted {
        user_id: Uuid,
        event_id: Uuid,
        event_title: String,
    },
    SpotOpened {
        user_id: Uuid,
        event_id: Uuid,
        event_title: String,
    },
    EventCancelled {
        user_id: Uuid,
        event_id: Uuid,
        event_title: String,
    },
    PaymentReceived {
        user_id: Uuid,
        event_id: Uuid,
        amount: i64,
        currency: String,
    },
    PaymentRefunded {
        user_id: Uuid,
        event_id: Uuid,
        amount: i64,
        currency: String,
    },
}

impl Notification {
    pub fn recipient(&self) -> Uuid {
        match self {
            Notification::ParticipationConfirmed { user_id, .. }
            | Notification::Waitlisted { user_id, .. }
            | Notification::SpotOpened { user_id, .. }
            | Notification::EventCancelled { user_id, .. }
            | Notification::PaymentReceived { user_id, .. }
            | Notification::PaymentRefunded { user_id, .. } => *user_id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Notification::ParticipationConfirmed { .. } => "participation_confirmed",
            Notification::Waitlisted { .. } => "waitlisted",
            Notification::SpotOpened { .. } => "spot_opened",
            Notification::EventCancelled { .. } => "event_cancelled",
            Notification::PaymentReceived { .. } => "payment_received",
            Notification::PaymentRefunded { .. } => "payment_refunded",
        }
    }
}

#[derive(Clone)]
pub struct Notifier {
    tx: mpsc::UnboundedSender<Notification>,
}

impl Notifier {
    /// Starts the drain task and returns the sending handle. `delivery_url`
    /// is the collaborator endpoint; without one, notifications are logged
    /// only (useful in development).
    pub fn spawn(delivery_url: Option<String>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<Notification>();

        tokio::spawn(async move {
            let client = reqwest::Client::new();
            while let Some(notification) = rx.recv().await {
                deliver(&client, delivery_url.as_deref(), &notification).await;
            }
        });

        Self { tx }
    }

    pub fn notify(&self, notification: Notification) {
        if self.tx.send(notification).is_err() {
            tracing::warn!("Notification queue closed; dropping notification");
        }
    }
}

async fn deliver(client: &reqwest::Client, url: Option<&str>, notification: &Notification) {
    let kind = notification.kind();
    let recipient = notification.recipient();

    let Some(url) = url else {
        tracing::info!(kind, %recipient, "notification (no delivery endpoint configured)");
        return;
    };

    match client.post(url).json(notification).send().await {
        Ok(resp) if resp.status().is_success() => {
            tracing::debug!(kind, %recipient, "notification delivered");
        }
        Ok(resp) => {
            tracing::warn!(kind, %recipient, status = %resp.status(), "notification delivery rejected");
        }
        Err(e) => {
            tracing::warn!(kind, %recipient, error = %e, "notification delivery failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_is_tagged_by_kind() {
        let n = Notification::SpotOpened {
            user_id: Uuid::new_v4(),
            event_id: Uuid::new_v4(),
            event_title: "Yoga in the park".to_string(),
        };

        let json = serde_json::to_value(&n).unwrap();
        assert_eq!(json["kind"], "spot_opened");
        assert_eq!(json["event_title"], "Yoga in the park");
    }

    #[test]
    fn kind_matches_serialized_tag() {
        let n = Notification::PaymentRefunded {
            user_id: Uuid::new_v4(),
            event_id: Uuid::new_v4(),
            amount: 1500,
            currency: "eur".to_string(),
        };

        let json = serde_json::to_value(&n).unwrap();
        assert_eq!(json["kind"], n.kind());
    }

    #[test]
    fn recipient_is_the_notified_user() {
        let user_id = Uuid::new_v4();
        let n = Notification::EventCancelled {
            user_id,
            event_id: Uuid::new_v4(),
            event_title: "Street chess".to_string(),
        };

        assert_eq!(n.recipient(), user_id);
    }
}
