use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::PaymentStatus;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CheckoutRequest {
    pub event_id: Uuid,
}

/// Returned from checkout initiation; the client follows `checkout_url` to the
/// payment provider.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CheckoutResponse {
    pub payment_id: Uuid,
    pub participation_id: Uuid,
    pub checkout_url: String,
    pub amount: i64,
    pub currency: String,
    pub status: PaymentStatus,
}
