use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "participation_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum ParticipationStatus {
    Confirmed,
    Waitlisted,
    Cancelled,
}

impl ParticipationStatus {
    /// Active participations hold the per-(event, user) uniqueness slot and
    /// can be checked in; cancelled ones cannot.
    pub fn is_active(self) -> bool {
        matches!(
            self,
            ParticipationStatus::Confirmed | ParticipationStatus::Waitlisted
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ParticipationStatus::Confirmed => "CONFIRMED",
            ParticipationStatus::Waitlisted => "WAITLISTED",
            ParticipationStatus::Cancelled => "CANCELLED",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Participation {
    pub participation_id: Uuid,
    pub event_id: Uuid,
    pub user_id: Uuid,
    /// Contact snapshot taken at join time; user records live with the auth
    /// collaborator, not in this store.
    pub user_email: Option<String>,
    pub user_name: Option<String>,
    pub status: ParticipationStatus,
    pub joined_at: DateTime<Utc>,
    pub checked_in_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confirmed_and_waitlisted_are_active() {
        assert!(ParticipationStatus::Confirmed.is_active());
        assert!(ParticipationStatus::Waitlisted.is_active());
        assert!(!ParticipationStatus::Cancelled.is_active());
    }
}
