use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::{Event, EventCategory, EventStatus};

/// Request payload for creating a new event. Everything beyond the title may
/// stay empty while drafting; publishing enforces completeness.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateEventRequest {
    #[validate(length(
        min = 1,
        max = 200,
        message = "Title must be between 1 and 200 characters"
    ))]
    pub title: String,

    #[validate(length(max = 4000))]
    pub description: Option<String>,

    pub category: Option<EventCategory>,

    pub event_date: Option<NaiveDate>,

    pub start_time: Option<NaiveTime>,

    pub end_time: Option<NaiveTime>,

    #[validate(range(min = 1, max = 1440, message = "Duration must be between 1 and 1440 minutes"))]
    pub duration_minutes: Option<i32>,

    #[validate(length(max = 255))]
    pub location_name: Option<String>,

    #[validate(length(max = 500))]
    pub address: Option<String>,

    #[validate(custom(function = "validate_latitude"))]
    pub latitude: Option<Decimal>,

    #[validate(custom(function = "validate_longitude"))]
    pub longitude: Option<Decimal>,

    /// Price in minor currency units; 0 (the default) means free.
    #[validate(range(min = 0, message = "Price must not be negative"))]
    #[serde(default)]
    pub price: i64,

    #[validate(custom(function = "validate_currency"))]
    #[serde(default = "default_currency")]
    pub currency: String,

    #[validate(range(min = 1, max = 10000, message = "Capacity must be between 1 and 10000"))]
    pub capacity: i32,

    /// Skip the draft stage and go straight to PUBLISHED.
    #[serde(default)]
    pub publish_immediately: bool,
}

/// Partial update. `None` leaves a field unchanged; fields cannot be cleared
/// once set. `status` may only carry CANCELLED, which routes through the
/// cancel transition.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateEventRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,

    #[validate(length(max = 4000))]
    pub description: Option<String>,

    pub category: Option<EventCategory>,

    pub event_date: Option<NaiveDate>,

    pub start_time: Option<NaiveTime>,

    pub end_time: Option<NaiveTime>,

    #[validate(range(min = 1, max = 1440))]
    pub duration_minutes: Option<i32>,

    #[validate(length(max = 255))]
    pub location_name: Option<String>,

    #[validate(length(max = 500))]
    pub address: Option<String>,

    #[validate(custom(function = "validate_latitude"))]
    pub latitude: Option<Decimal>,

    #[validate(custom(function = "validate_longitude"))]
    pub longitude: Option<Decimal>,

    #[validate(range(min = 0))]
    pub price: Option<i64>,

    #[validate(custom(function = "validate_currency"))]
    pub currency: Option<String>,

    #[validate(range(min = 1, max = 10000))]
    pub capacity: Option<i32>,

    pub status: Option<EventStatus>,
}

impl UpdateEventRequest {
    pub fn requests_cancellation(&self) -> bool {
        self.status == Some(EventStatus::Cancelled)
    }

    /// `status` is not a free-form field: the only status change expressible
    /// through update is CANCELLED.
    pub fn validate_status_change(&self) -> Result<(), &'static str> {
        match self.status {
            None | Some(EventStatus::Cancelled) => Ok(()),
            Some(_) => Err("Status can only be changed to CANCELLED here; use publish for drafts"),
        }
    }
}

/// Response containing event details.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EventResponse {
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
    pub price: i64,
    pub currency: String,
    pub capacity: i32,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<Event> for EventResponse {
    fn from(event: Event) -> Self {
        Self {
            event_id: event.event_id,
            organizer_id: event.organizer_id,
            status: event.status,
            title: event.title,
            description: event.description,
            category: event.category,
            event_date: event.event_date,
            start_time: event.start_time,
            end_time: event.end_time,
            duration_minutes: event.duration_minutes,
            location_name: event.location_name,
            address: event.address,
            latitude: event.latitude,
            longitude: event.longitude,
            price: event.price,
            currency: event.currency,
            capacity: event.capacity,
            created_at: event.created_at,
        }
    }
}

// Validation helpers

fn default_currency() -> String {
    "eur".to_string()
}

fn validate_currency(currency: &str) -> Result<(), validator::ValidationError> {
    if currency.len() == 3 && currency.chars().all(|c| c.is_ascii_lowercase()) {
        Ok(())
    } else {
        Err(validator::ValidationError::new("invalid_currency"))
    }
}

fn validate_latitude(latitude: &Decimal) -> Result<(), validator::ValidationError> {
    if *latitude >= Decimal::from(-90) && *latitude <= Decimal::from(90) {
        Ok(())
    } else {
        Err(validator::ValidationError::new("invalid_latitude"))
    }
}

fn validate_longitude(longitude: &Decimal) -> Result<(), validator::ValidationError> {
    if *longitude >= Decimal::from(-180) && *longitude <= Decimal::from(180) {
        Ok(())
    } else {
        Err(validator::ValidationError::new("invalid_longitude"))
    }
}

impl CreateEventRequest {
    /// Additional validation across fields.
    pub fn validate_schedule(&self) -> Result<(), &'static str> {
        if let (Some(start), Some(end)) = (self.start_time, self.end_time) {
            if end <= start {
                return Err("End time must be after start time");
            }
        }

        Ok(())
    }

    /// Same completeness rule as [`Event::missing_publish_fields`], applied
    /// before insertion so a failed create-and-publish leaves no draft behind.
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
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_request() -> CreateEventRequest {
        CreateEventRequest {
            title: "Chess in the courtyard".to_string(),
            description: None,
            category: None,
            event_date: None,
            start_time: None,
            end_time: None,
            duration_minutes: None,
            location_name: None,
            address: None,
            latitude: None,
            longitude: None,
            price: 0,
            currency: "eur".to_string(),
            capacity: 8,
            publish_immediately: false,
        }
    }

    #[test]
    fn minimal_draft_request_is_valid() {
        assert!(minimal_request().validate().is_ok());
    }

    #[test]
    fn capacity_below_one_is_rejected() {
        let mut req = minimal_request();
        req.capacity = 0;
        assert!(req.validate().is_err());
    }

    #[test]
    fn negative_price_is_rejected() {
        let mut req = minimal_request();
        req.price = -500;
        assert!(req.validate().is_err());
    }

    #[test]
    fn currency_must_be_three_lowercase_letters() {
        let mut req = minimal_request();
        req.currency = "EUR".to_string();
        assert!(req.validate().is_err());

        req.currency = "euro".to_string();
        assert!(req.validate().is_err());

        req.currency = "czk".to_string();
        assert!(req.validate().is_ok());
    }

    #[test]
    fn out_of_range_coordinates_are_rejected() {
        let mut req = minimal_request();
        req.latitude = Some(Decimal::from(91));
        assert!(req.validate().is_err());

        req.latitude = Some(Decimal::from(50));
        req.longitude = Some(Decimal::from(-181));
        assert!(req.validate().is_err());
    }

    #[test]
    fn minimal_request_is_not_publishable() {
        let missing = minimal_request().missing_publish_fields();
        assert!(missing.contains(&"description"));
        assert!(missing.contains(&"event_date"));
        assert!(missing.contains(&"longitude"));
        assert!(!missing.contains(&"title"));
    }

    #[test]
    fn end_before_start_fails_schedule_check() {
        let mut req = minimal_request();
        req.start_time = NaiveTime::from_hms_opt(18, 0, 0);
        req.end_time = NaiveTime::from_hms_opt(17, 0, 0);
        assert!(req.validate_schedule().is_err());
    }

    #[test]
    fn update_status_accepts_only_cancelled() {
        let mut req = UpdateEventRequest {
            title: None,
            description: None,
            category: None,
            event_date: None,
            start_time: None,
            end_time: None,
            duration_minutes: None,
            location_name: None,
            address: None,
            latitude: None,
            longitude: None,
            price: None,
            currency: None,
            capacity: None,
            status: Some(EventStatus::Cancelled),
        };
        assert!(req.validate_status_change().is_ok());
        assert!(req.requests_cancellation());

        req.status = Some(EventStatus::Draft);
        assert!(req.validate_status_change().is_err());

        req.status = None;
        assert!(req.validate_status_change().is_ok());
    }
}
