use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Lifecycle state of an event.
///
/// Transitions are one-way: DRAFT -> PUBLISHED -> CANCELLED. There is no path
/// back to DRAFT after publishing and no path out of CANCELLED.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "event_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum EventStatus {
    Draft,
    Published,
    Cancelled,
}

impl EventStatus {
    pub fn can_transition_to(self, next: EventStatus) -> bool {
        matches!(
            (self, next),
            (EventStatus::Draft, EventStatus::Published)
                | (EventStatus::Published, EventStatus::Cancelled)
        )
    }

    /// New participations are accepted only while published.
    pub fn is_joinable(self) -> bool {
        self == EventStatus::Published
    }

    /// Organizer edits are allowed in DRAFT (full) and PUBLISHED (partial).
    pub fn is_editable(self) -> bool {
        matches!(self, EventStatus::Draft | EventStatus::Published)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EventStatus::Draft => "DRAFT",
            EventStatus::Published => "PUBLISHED",
            EventStatus::Cancelled => "CANCELLED",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "event_category", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum EventCategory {
    Workout,
    Workshop,
    Kids,
    Meetup,
    Lecture,
    Leisure,
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Event {
    pub event_id: Uuid,
    pub organizer_id: Uuid,
    pub status: EventStatus,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<EventCategory>,
    pub event_date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub duration_minutes: Option<i32>,
    pub location_name: Option<String>,
    pub address: Option<String>,
    pub latitude: Option<Decimal>,
    pub longitude: Option<Decimal>,
    /// Price in minor currency units; 0 means free.
    pub price: i64,
    pub currency: String,
    pub capacity: i32,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl Event {
    pub fn is_free(&self) -> bool {
        self.price == 0
    }

    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.organizer_id == user_id
    }

    /// Fields that must be present before the event can go live. Drafts may be
    /// saved with any of these missing.
    pub fn missing_publish_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();

        if self.title.trim().is_empty() {
            missing.push("title");
        }
        if self.description.as_deref().is_none_or(|d| d.trim().is_empty()) {
            missing.push("description");
        }
        if self.category.is_none() {
            missing.push("category");
        }
        if self.event_date.is_none() {
            missing.push("event_date");
        }
        if self.start_time.is_none() {
            missing.push("start_time");
        }
        if self.location_name.as_deref().is_none_or(|l| l.trim().is_empty()) {
            missing.push("location_name");
        }
        if self.address.as_deref().is_none_or(|a| a.trim().is_empty()) {
            missing.push("address");
        }
        if self.latitude.is_none() {
            missing.push("latitude");
        }
        if self.longitude.is_none() {
            missing.push("longitude");
        }

        missing
    }

    pub fn ready_to_publish(&self) -> bool {
        self.missing_publish_fields().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn complete_draft() -> Event {
        Event {
            event_id: Uuid::new_v4(),
            organizer_id: Uuid::new_v4(),
            status: EventStatus::Draft,
            title: "Morning run around the lake".to_string(),
            description: Some("Easy 5k, all paces welcome".to_string()),
            category: Some(EventCategory::Workout),
            event_date: Some(NaiveDate::from_ymd_opt(2026, 9, 12).unwrap()),
            start_time: Some(NaiveTime::from_hms_opt(8, 30, 0).unwrap()),
            end_time: None,
            duration_minutes: Some(60),
            location_name: Some("Lakeside park".to_string()),
            address: Some("Parkweg 1".to_string()),
            latitude: Some(Decimal::new(52_520_000, 6)),
            longitude: Some(Decimal::new(13_405_000, 6)),
            price: 0,
            currency: "eur".to_string(),
            capacity: 12,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn draft_can_only_become_published() {
        assert!(EventStatus::Draft.can_transition_to(EventStatus::Published));
        assert!(!EventStatus::Draft.can_transition_to(EventStatus::Cancelled));
        assert!(!EventStatus::Draft.can_transition_to(EventStatus::Draft));
    }

    #[test]
    fn published_can_only_become_cancelled() {
        assert!(EventStatus::Published.can_transition_to(EventStatus::Cancelled));
        assert!(!EventStatus::Published.can_transition_to(EventStatus::Draft));
        assert!(!EventStatus::Published.can_transition_to(EventStatus::Published));
    }

    #[test]
    fn cancelled_is_terminal() {
        assert!(!EventStatus::Cancelled.can_transition_to(EventStatus::Draft));
        assert!(!EventStatus::Cancelled.can_transition_to(EventStatus::Published));
        assert!(!EventStatus::Cancelled.can_transition_to(EventStatus::Cancelled));
    }

    #[test]
    fn only_published_is_joinable() {
        assert!(EventStatus::Published.is_joinable());
        assert!(!EventStatus::Draft.is_joinable());
        assert!(!EventStatus::Cancelled.is_joinable());
    }

    #[test]
    fn complete_draft_is_ready_to_publish() {
        let event = complete_draft();
        assert!(event.ready_to_publish());
        assert!(event.missing_publish_fields().is_empty());
    }

    #[test]
    fn incomplete_draft_reports_missing_fields() {
        let mut event = complete_draft();
        event.description = None;
        event.event_date = None;
        event.latitude = None;

        let missing = event.missing_publish_fields();
        assert_eq!(missing, vec!["description", "event_date", "latitude"]);
        assert!(!event.ready_to_publish());
    }

    #[test]
    fn blank_strings_count_as_missing() {
        let mut event = complete_draft();
        event.address = Some("   ".to_string());

        assert_eq!(event.missing_publish_fields(), vec!["address"]);
    }
}
