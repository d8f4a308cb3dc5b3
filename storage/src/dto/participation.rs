use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::{Participation, ParticipationStatus};

/// Response for the joining user's own participation.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ParticipationResponse {
    pub participation_id: Uuid,
    pub event_id: Uuid,
    pub status: ParticipationStatus,
    pub joined_at: DateTime<Utc>,
    pub checked_in_at: Option<DateTime<Utc>>,
}

impl From<Participation> for ParticipationResponse {
    fn from(p: Participation) -> Self {
        Self {
            participation_id: p.participation_id,
            event_id: p.event_id,
            status: p.status,
            joined_at: p.joined_at,
            checked_in_at: p.checked_in_at,
        }
    }
}

/// Organizer-facing participant row. Contact fields are only ever exposed to
/// the event's organizer.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ParticipantDetail {
    pub participation_id: Uuid,
    pub user_id: Uuid,
    pub user_email: Option<String>,
    pub user_name: Option<String>,
    pub status: ParticipationStatus,
    pub joined_at: DateTime<Utc>,
    pub checked_in_at: Option<DateTime<Utc>>,
}

impl From<Participation> for ParticipantDetail {
    fn from(p: Participation) -> Self {
        Self {
            participation_id: p.participation_id,
            user_id: p.user_id,
            user_email: p.user_email,
            user_name: p.user_name,
            status: p.status,
            joined_at: p.joined_at,
            checked_in_at: p.checked_in_at,
        }
    }
}

/// Door scan input: a prefixed ticket code or a bare participation id.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CheckInRequest {
    #[validate(length(min = 1, max = 100, message = "Code must be between 1 and 100 characters"))]
    pub code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CheckInResponse {
    pub participation_id: Uuid,
    /// WAITLISTED here means the scan was accepted for someone without a
    /// confirmed seat; the door UI should flag it.
    pub status: ParticipationStatus,
    pub checked_in_at: DateTime<Utc>,
}

/// The scannable ticket artifact for an active participation.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TicketResponse {
    pub participation_id: Uuid,
    pub event_id: Uuid,
    pub code: String,
    /// Renderer URL producing the scannable image for `code`.
    pub qr_url: String,
    pub status: ParticipationStatus,
    pub checked_in_at: Option<DateTime<Utc>>,
}
