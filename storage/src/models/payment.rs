use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "payment_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentStatus {
    Pending,
    Succeeded,
    Failed,
    Refunded,
}

impl PaymentStatus {
    /// PENDING -> SUCCEEDED | FAILED; SUCCEEDED -> REFUNDED. Terminal states
    /// do not revert.
    pub fn can_transition_to(self, next: PaymentStatus) -> bool {
        matches!(
            (self, next),
            (PaymentStatus::Pending, PaymentStatus::Succeeded)
                | (PaymentStatus::Pending, PaymentStatus::Failed)
                | (PaymentStatus::Succeeded, PaymentStatus::Refunded)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Succeeded => "SUCCEEDED",
            PaymentStatus::Failed => "FAILED",
            PaymentStatus::Refunded => "REFUNDED",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Payment {
    pub payment_id: Uuid,
    pub participation_id: Uuid,
    /// Amount in minor currency units.
    pub amount: i64,
    pub currency: String,
    pub status: PaymentStatus,
    /// Marketplace share in minor units, deducted before organizer payout.
    pub platform_fee: i64,
    /// Checkout session id at the payment provider.
    pub provider_ref: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Platform share of a paid seat: `round(amount * fee_percent / 100)` in minor
/// units, midpoints rounded away from zero.
pub fn platform_fee(amount: i64, fee_percent: Decimal) -> i64 {
    let fee = (Decimal::from(amount) * fee_percent / Decimal::from(100))
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);

    fee.to_i64().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_resolves_to_succeeded_or_failed() {
        assert!(PaymentStatus::Pending.can_transition_to(PaymentStatus::Succeeded));
        assert!(PaymentStatus::Pending.can_transition_to(PaymentStatus::Failed));
        assert!(!PaymentStatus::Pending.can_transition_to(PaymentStatus::Refunded));
    }

    #[test]
    fn only_succeeded_can_be_refunded() {
        assert!(PaymentStatus::Succeeded.can_transition_to(PaymentStatus::Refunded));
        assert!(!PaymentStatus::Failed.can_transition_to(PaymentStatus::Refunded));
        assert!(!PaymentStatus::Refunded.can_transition_to(PaymentStatus::Succeeded));
        assert!(!PaymentStatus::Failed.can_transition_to(PaymentStatus::Succeeded));
    }

    #[test]
    fn fee_is_ten_percent_by_default_policy() {
        assert_eq!(platform_fee(1000, Decimal::from(10)), 100);
        assert_eq!(platform_fee(999, Decimal::from(10)), 100);
        assert_eq!(platform_fee(994, Decimal::from(10)), 99);
    }

    #[test]
    fn fee_midpoint_rounds_up() {
        // 10% of 995 is 99.5
        assert_eq!(platform_fee(995, Decimal::from(10)), 100);
        // 2.5% of 100 is 2.5
        assert_eq!(platform_fee(100, Decimal::new(25, 1)), 3);
    }

    #[test]
    fn fee_of_free_amount_is_zero() {
        assert_eq!(platform_fee(0, Decimal::from(10)), 0);
    }

    #[test]
    fn fee_with_custom_percent() {
        assert_eq!(platform_fee(2000, Decimal::from(15)), 300);
        assert_eq!(platform_fee(2000, Decimal::ZERO), 0);
    }
}
