//! Order lifecycle status enums.
//!
//! An order starts as a draft while the buyer is redirected to the payment
//! provider. Payment confirmation moves it to confirmed, after which the
//! buyer can mark it completed on arrival or cancel it. Draft orders that
//! are abandoned are deleted outright rather than transitioned.

use serde::{Deserialize, Serialize};

/// Order fulfillment status.
///
/// Stored as lowercase text in `orders.status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Created but not yet paid; invisible in order history.
    #[default]
    Draft,
    /// Payment confirmed.
    Confirmed,
    /// Cancelled by the buyer.
    Cancelled,
    /// Received by the buyer.
    Completed,
}

impl OrderStatus {
    /// Whether a buyer-initiated cancellation is allowed from this status.
    ///
    /// Only an already-cancelled order is rejected; cancelling a completed
    /// order is intentionally permitted (matches the storefront contract).
    #[must_use]
    pub fn can_cancel(self) -> bool {
        self != Self::Cancelled
    }

    /// Whether marking the order as received is allowed from this status.
    #[must_use]
    pub fn can_complete(self) -> bool {
        self != Self::Completed
    }

    /// Lowercase database representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
            Self::Completed => "completed",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "confirmed" => Ok(Self::Confirmed),
            "cancelled" => Ok(Self::Cancelled),
            "completed" => Ok(Self::Completed),
            _ => Err(format!("invalid order status: {s}")),
        }
    }
}

/// Order payment status.
///
/// Stored as lowercase text in `orders.payment_status`. Moves forward only:
/// `pending` -> `paid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
}

impl PaymentStatus {
    /// Lowercase database representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            _ => Err(format!("invalid payment status: {s}")),
        }
    }
}

// SQLx support (with postgres feature): both enums are TEXT columns.
#[cfg(feature = "postgres")]
mod pg {
    use super::{OrderStatus, PaymentStatus};

    macro_rules! text_enum_pg {
        ($name:ident) => {
            impl sqlx::Type<sqlx::Postgres> for $name {
                fn type_info() -> sqlx::postgres::PgTypeInfo {
                    <String as sqlx::Type<sqlx::Postgres>>::type_info()
                }

                fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
                    <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
                }
            }

            impl<'r> sqlx::Decode<'r, sqlx::Postgres> for $name {
                fn decode(
                    value: sqlx::postgres::PgValueRef<'r>,
                ) -> Result<Self, sqlx::error::BoxDynError> {
                    let s = <&str as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
                    Ok(s.parse::<$name>()?)
                }
            }

            impl sqlx::Encode<'_, sqlx::Postgres> for $name {
                fn encode_by_ref(
                    &self,
                    buf: &mut sqlx::postgres::PgArgumentBuffer,
                ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
                    <&str as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.as_str(), buf)
                }
            }
        };
    }

    text_enum_pg!(OrderStatus);
    text_enum_pg!(PaymentStatus);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_roundtrip() {
        for status in [
            OrderStatus::Draft,
            OrderStatus::Confirmed,
            OrderStatus::Cancelled,
            OrderStatus::Completed,
        ] {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
        assert!("shipped".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_payment_status_roundtrip() {
        assert_eq!("pending".parse::<PaymentStatus>().unwrap(), PaymentStatus::Pending);
        assert_eq!("paid".parse::<PaymentStatus>().unwrap(), PaymentStatus::Paid);
        assert!("refunded".parse::<PaymentStatus>().is_err());
    }

    #[test]
    fn test_cancel_guard() {
        assert!(OrderStatus::Draft.can_cancel());
        assert!(OrderStatus::Confirmed.can_cancel());
        assert!(OrderStatus::Completed.can_cancel());
        assert!(!OrderStatus::Cancelled.can_cancel());
    }

    #[test]
    fn test_complete_guard() {
        assert!(OrderStatus::Draft.can_complete());
        assert!(OrderStatus::Confirmed.can_complete());
        assert!(OrderStatus::Cancelled.can_complete());
        assert!(!OrderStatus::Completed.can_complete());
    }

    #[test]
    fn test_serde_lowercase() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::Confirmed).unwrap(),
            "\"confirmed\""
        );
        assert_eq!(
            serde_json::to_string(&PaymentStatus::Paid).unwrap(),
            "\"paid\""
        );
    }
}
