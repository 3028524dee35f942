//! Orders, their line items and the shipping address snapshot.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use strive_core::{
    AddressId, OrderAddressId, OrderId, OrderItemId, OrderStatus, PaymentStatus, ProductId, UserId,
};

use super::address::Address;
use super::{check_length, require_text};

/// Shipping details copied at order time. Never changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderAddress {
    pub id: OrderAddressId,
    pub name: Option<String>,
    pub recipient_name: String,
    pub recipient_phone: String,
    pub street_address: String,
    pub city: String,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: String,
}

/// One line of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: OrderItemId,
    pub product_id: ProductId,
    pub quantity: i32,
    pub size: Option<String>,
    pub price: Decimal,
}

/// An order with its address snapshot and items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    /// Id of the address snapshot, not of the saved address it came from.
    pub address_id: Option<OrderAddressId>,
    pub order_address: Option<OrderAddress>,
    pub total_amount: Decimal,
    pub status: OrderStatus,
    pub payment_method: Option<String>,
    pub payment_status: PaymentStatus,
    pub card_last_four: Option<String>,
    pub card_expiry: Option<String>,
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderItem>,
}

impl Order {
    /// Distinct product ids in line order.
    #[must_use]
    pub fn product_ids(&self) -> Vec<ProductId> {
        let mut ids: Vec<ProductId> = Vec::with_capacity(self.items.len());
        for item in &self.items {
            if !ids.contains(&item.product_id) {
                ids.push(item.product_id);
            }
        }
        ids
    }
}

/// Shipping details typed in at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderAddressInput {
    pub name: Option<String>,
    pub recipient_name: String,
    pub recipient_phone: String,
    pub street_address: String,
    pub city: String,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: String,
}

impl OrderAddressInput {
    /// # Errors
    ///
    /// Returns the client-facing message for the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        check_length(self.name.as_deref(), "Name", 25)?;
        require_text(&self.recipient_name, "Recipient name", 100)?;
        require_text(&self.recipient_phone, "Recipient phone", 20)?;
        require_text(&self.street_address, "Street address", 255)?;
        require_text(&self.city, "City", 25)?;
        check_length(self.state.as_deref(), "State", 25)?;
        check_length(self.postal_code.as_deref(), "Postal code", 25)?;
        require_text(&self.country, "Country", 25)
    }
}

impl From<Address> for OrderAddressInput {
    fn from(address: Address) -> Self {
        Self {
            name: Some(address.name),
            recipient_name: address.recipient_name,
            recipient_phone: address.recipient_phone,
            street_address: address.street_address,
            city: address.city,
            state: address.state,
            postal_code: address.postal_code,
            country: address.country,
        }
    }
}

/// A line item as submitted.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemInput {
    pub product_id: ProductId,
    pub quantity: i32,
    pub size: Option<String>,
    pub price: Decimal,
}

/// Where the shipping snapshot comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressSource {
    /// Details typed in at checkout.
    New(OrderAddressInput),
    /// A saved address from the user's address book.
    Saved(AddressId),
}

/// Body of `POST /api/orders`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrder {
    pub user_id: UserId,
    pub address_id: Option<AddressId>,
    pub order_address: Option<OrderAddressInput>,
    pub total_amount: Decimal,
    pub payment_method: Option<String>,
    pub card_last_four: Option<String>,
    pub card_expiry: Option<String>,
    #[serde(default)]
    pub items: Vec<OrderItemInput>,
}

impl CreateOrder {
    /// Check the items, amounts and card fields.
    ///
    /// # Errors
    ///
    /// Returns the client-facing message for the first problem found.
    pub fn validate(&self) -> Result<(), String> {
        if self.items.is_empty() {
            return Err("Order must contain at least one item".to_string());
        }
        if self.items.iter().any(|item| item.quantity < 1) {
            return Err("Item quantity must be at least 1".to_string());
        }
        if self.items.iter().any(|item| item.price.is_sign_negative()) {
            return Err("Item price must not be negative".to_string());
        }
        for item in &self.items {
            check_length(item.size.as_deref(), "Size", 20)?;
        }
        if self.total_amount.is_sign_negative() {
            return Err("Total amount must not be negative".to_string());
        }
        check_length(self.payment_method.as_deref(), "Payment method", 50)?;
        check_length(self.card_last_four.as_deref(), "Card last four", 4)?;
        check_length(self.card_expiry.as_deref(), "Card expiry", 7)?;
        if let Some(address) = &self.order_address {
            address.validate()?;
        }
        Ok(())
    }

    /// A typed-in address wins over a saved one.
    ///
    /// # Errors
    ///
    /// Returns a message when neither is present.
    pub fn address_source(&self) -> Result<AddressSource, String> {
        match (&self.order_address, self.address_id) {
            (Some(address), _) => Ok(AddressSource::New(address.clone())),
            (None, Some(id)) => Ok(AddressSource::Saved(id)),
            (None, None) => Err("Order address information is required".to_string()),
        }
    }
}

/// Body of `PATCH /api/orders/{id}/status`.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusChange {
    pub status: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body() -> serde_json::Value {
        json!({
            "userId": 1,
            "orderAddress": {
                "name": "Home",
                "recipientName": "Ana Silva",
                "recipientPhone": "912345678",
                "streetAddress": "Rua Augusta 10",
                "city": "Lisbon",
                "country": "Portugal"
            },
            "totalAmount": "59.98",
            "paymentMethod": "CARD",
            "cardLastFour": "4242",
            "cardExpiry": "12/28",
            "items": [
                {"productId": 5, "quantity": 2, "size": "M", "price": "29.99"}
            ]
        })
    }

    #[test]
    fn test_valid_order() {
        let order: CreateOrder = serde_json::from_value(body()).unwrap();
        assert!(order.validate().is_ok());
        assert!(matches!(order.address_source(), Ok(AddressSource::New(_))));
    }

    #[test]
    fn test_empty_items_rejected() {
        let mut value = body();
        value["items"] = json!([]);
        let order: CreateOrder = serde_json::from_value(value).unwrap();
        assert_eq!(
            order.validate(),
            Err("Order must contain at least one item".into())
        );
    }

    #[test]
    fn test_zero_quantity_rejected() {
        let mut value = body();
        value["items"][0]["quantity"] = json!(0);
        let order: CreateOrder = serde_json::from_value(value).unwrap();
        assert!(order.validate().is_err());
    }

    #[test]
    fn test_overlong_size_rejected() {
        let mut value = body();
        value["items"][0]["size"] = json!("X".repeat(21));
        let order: CreateOrder = serde_json::from_value(value).unwrap();
        assert_eq!(
            order.validate(),
            Err("Size must not exceed 20 characters".into())
        );
    }

    #[test]
    fn test_overlong_payment_method_rejected() {
        let mut value = body();
        value["paymentMethod"] = json!("P".repeat(51));
        let order: CreateOrder = serde_json::from_value(value).unwrap();
        assert!(order.validate().is_err());
    }

    #[test]
    fn test_address_source() {
        let mut value = body();
        value["orderAddress"] = serde_json::Value::Null;
        value["addressId"] = json!(8);
        let order: CreateOrder = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(
            order.address_source(),
            Ok(AddressSource::Saved(AddressId::new(8)))
        );

        value["addressId"] = serde_json::Value::Null;
        let order: CreateOrder = serde_json::from_value(value).unwrap();
        assert_eq!(
            order.address_source(),
            Err("Order address information is required".into())
        );
    }

    #[test]
    fn test_product_ids_are_distinct() {
        let item = |id: i32, product: i32| OrderItem {
            id: OrderItemId::new(id),
            product_id: ProductId::new(product),
            quantity: 1,
            size: None,
            price: Decimal::ONE,
        };
        let order = Order {
            id: OrderId::new(1),
            user_id: UserId::new(1),
            address_id: None,
            order_address: None,
            total_amount: Decimal::ONE,
            status: OrderStatus::Pending,
            payment_method: None,
            payment_status: PaymentStatus::Completed,
            card_last_four: None,
            card_expiry: None,
            created_at: Utc::now(),
            items: vec![item(1, 5), item(2, 6), item(3, 5)],
        };
        assert_eq!(order.product_ids(), vec![ProductId::new(5), ProductId::new(6)]);
    }
}
