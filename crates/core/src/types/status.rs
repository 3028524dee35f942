//! Role and status enums for various entities.
//!
//! Every enum is stored as upper-case text (guarded by a `CHECK` constraint)
//! and travels over JSON in upper case (`"PENDING"`, `"ADMIN"`), matching the
//! values the storefront frontend already sends. Parsing from strings is
//! case-insensitive so query parameters like `?status=inactive` work.

use serde::{Deserialize, Serialize};

/// Error returned when a string does not name a known variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind}: {value}")]
pub struct UnknownVariant {
    /// Which enum was being parsed.
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

impl UnknownVariant {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_owned(),
        }
    }
}

/// Account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    /// Shopper account created through registration.
    #[default]
    Customer,
    /// Full back-office access including employee management.
    Admin,
    /// Back-office access to catalog, orders and finances.
    Manager,
}

impl Role {
    /// Whether this role may use the back office.
    #[must_use]
    pub const fn is_staff(self) -> bool {
        matches!(self, Self::Admin | Self::Manager)
    }

    /// Upper-case wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Customer => "CUSTOMER",
            Self::Admin => "ADMIN",
            Self::Manager => "MANAGER",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CUSTOMER" => Ok(Self::Customer),
            "ADMIN" => Ok(Self::Admin),
            "MANAGER" => Ok(Self::Manager),
            _ => Err(UnknownVariant::new("role", s)),
        }
    }
}

/// Order fulfillment status.
///
/// Transitions are unrestricted; only entering `Delivered` has a side effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Upper-case wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Processing => "PROCESSING",
            Self::Shipped => "SHIPPED",
            Self::Delivered => "DELIVERED",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// Whether moving from `previous` to `self` is the first arrival at
    /// `Delivered`.
    #[must_use]
    pub fn is_delivery_of(self, previous: Self) -> bool {
        self == Self::Delivered && previous != Self::Delivered
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Ok(Self::Pending),
            "PROCESSING" => Ok(Self::Processing),
            "SHIPPED" => Ok(Self::Shipped),
            "DELIVERED" => Ok(Self::Delivered),
            "CANCELLED" => Ok(Self::Cancelled),
            _ => Err(UnknownVariant::new("order status", s)),
        }
    }
}

/// Payment status of an order.
///
/// There is no payment gateway; orders are recorded as `Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentStatus {
    Pending,
    #[default]
    Completed,
    Failed,
    Refunded,
}

/// Catalog visibility of a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProductStatus {
    #[default]
    Active,
    Inactive,
}

impl PaymentStatus {
    /// Upper-case wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
            Self::Refunded => "REFUNDED",
        }
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Ok(Self::Pending),
            "COMPLETED" => Ok(Self::Completed),
            "FAILED" => Ok(Self::Failed),
            "REFUNDED" => Ok(Self::Refunded),
            _ => Err(UnknownVariant::new("payment status", s)),
        }
    }
}

impl ProductStatus {
    /// Upper-case wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Inactive => "INACTIVE",
        }
    }
}

impl std::str::FromStr for ProductStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ACTIVE" => Ok(Self::Active),
            "INACTIVE" => Ok(Self::Inactive),
            _ => Err(UnknownVariant::new("product status", s)),
        }
    }
}

/// Kind of ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionType {
    Order,
    Refund,
}

impl TransactionType {
    /// Upper-case wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Order => "ORDER",
            Self::Refund => "REFUND",
        }
    }
}

impl std::str::FromStr for TransactionType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ORDER" => Ok(Self::Order),
            "REFUND" => Ok(Self::Refund),
            _ => Err(UnknownVariant::new("transaction type", s)),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse_is_case_insensitive() {
        assert_eq!("manager".parse::<Role>().unwrap(), Role::Manager);
        assert_eq!(" ADMIN ".parse::<Role>().unwrap(), Role::Admin);
        assert!("owner".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_staff() {
        assert!(Role::Admin.is_staff());
        assert!(Role::Manager.is_staff());
        assert!(!Role::Customer.is_staff());
    }

    #[test]
    fn test_status_wire_format() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::Delivered).unwrap(),
            "\"DELIVERED\""
        );
        assert_eq!(
            serde_json::from_str::<ProductStatus>("\"INACTIVE\"").unwrap(),
            ProductStatus::Inactive
        );
        assert_eq!(
            serde_json::to_string(&TransactionType::Order).unwrap(),
            "\"ORDER\""
        );
    }

    #[test]
    fn test_delivery_only_fires_on_entry() {
        assert!(OrderStatus::Delivered.is_delivery_of(OrderStatus::Shipped));
        assert!(!OrderStatus::Delivered.is_delivery_of(OrderStatus::Delivered));
        assert!(!OrderStatus::Shipped.is_delivery_of(OrderStatus::Delivered));
    }

    #[test]
    fn test_as_str_parses_back() {
        for status in [OrderStatus::Pending, OrderStatus::Cancelled] {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
        assert_eq!(
            PaymentStatus::Refunded.as_str().parse::<PaymentStatus>().unwrap(),
            PaymentStatus::Refunded
        );
        assert_eq!(
            "order".parse::<TransactionType>().unwrap(),
            TransactionType::Order
        );
    }

    #[test]
    fn test_unknown_variant_message() {
        let err = "lost".parse::<OrderStatus>().unwrap_err();
        assert_eq!(err.to_string(), "invalid order status: lost");
    }
}
