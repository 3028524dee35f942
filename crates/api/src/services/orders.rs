//! Order placement and fulfilment.
//!
//! Wraps [`OrderRepository`] with the checkout rules that need more than one
//! table (saved-address ownership) and the customer notifications sent after
//! an order is committed.

use std::collections::HashMap;

use sqlx::PgPool;
use tracing::{info, instrument, warn};

use strive_core::{OrderId, OrderStatus, ProductId};

use crate::db::addresses::AddressRepository;
use crate::db::orders::OrderRepository;
use crate::db::products::ProductRepository;
use crate::db::users::UserRepository;
use crate::error::AppError;
use crate::models::address::Address;
use crate::models::order::{AddressSource, CreateOrder, Order, OrderAddressInput};
use crate::models::product::{ProductImageView, ProductView};
use crate::services::email::{
    ConfirmationLine, Mailer, MAX_INLINE_IMAGE_BYTES, OrderConfirmation, ReviewLink,
};

const ORDER_DATE_FORMAT: &str = "%B %-d, %Y";

/// Order placement service.
pub struct OrderService<'a> {
    orders: OrderRepository<'a>,
    addresses: AddressRepository<'a>,
    users: UserRepository<'a>,
    products: ProductRepository<'a>,
    mailer: &'a Mailer,
}

impl<'a> OrderService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool, mailer: &'a Mailer) -> Self {
        Self {
            orders: OrderRepository::new(pool),
            addresses: AddressRepository::new(pool),
            users: UserRepository::new(pool),
            products: ProductRepository::new(pool),
            mailer,
        }
    }

    /// Place an order and send the confirmation email.
    ///
    /// The email is best-effort: a failure is logged and the order stands.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` for an invalid body or a missing
    /// address, and `AppError::NotFound` for a saved address that doesn't
    /// exist or belongs to someone else.
    #[instrument(skip(self, input), fields(user_id = %input.user_id))]
    pub async fn place(&self, input: CreateOrder) -> Result<Order, AppError> {
        input.validate().map_err(AppError::BadRequest)?;

        let address = match input.address_source().map_err(AppError::BadRequest)? {
            AddressSource::New(address) => address,
            AddressSource::Saved(id) => {
                let saved = self
                    .addresses
                    .get_by_id(id)
                    .await?
                    .filter(|address| address.user_id == input.user_id)
                    .ok_or_else(|| AppError::not_found("Address not found"))?;
                snapshot_saved(saved)?
            }
        };

        let order = self.orders.create(&input, &address).await?;
        info!(order_id = %order.id, total = %order.total_amount, "Order placed");

        if let Err(e) = self.send_confirmation(&order).await {
            warn!(order_id = %order.id, error = %e, "Failed to send order confirmation");
        }

        Ok(order)
    }

    /// Change an order's status. Moving into DELIVERED from any other status
    /// sends the delivered email with review links, best-effort.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the order doesn't exist.
    #[instrument(skip(self))]
    pub async fn update_status(&self, id: OrderId, status: OrderStatus) -> Result<Order, AppError> {
        let (previous, order) = self
            .orders
            .update_status(id, status)
            .await
            .map_err(AppError::not_found_as("Order not found"))?;

        info!(order_id = %id, from = %previous.as_str(), to = %status.as_str(), "Order status changed");

        if status.is_delivery_of(previous)
            && let Err(e) = self.send_delivered(&order).await
        {
            warn!(order_id = %id, error = %e, "Failed to send delivery notification");
        }

        Ok(order)
    }

    /// Send the confirmation email again. Unlike placement, failures are
    /// reported.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Email` if the email fails to send.
    #[instrument(skip(self, order), fields(order_id = %order.id))]
    pub async fn resend_confirmation(&self, order: &Order) -> Result<(), AppError> {
        self.send_confirmation(order).await
    }

    async fn send_confirmation(&self, order: &Order) -> Result<(), AppError> {
        let user = self
            .users
            .get_by_id(order.user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;
        let products = self.product_lookup(order).await?;

        let confirmation = OrderConfirmation {
            order_id: order.id,
            order_date: order.created_at.format(ORDER_DATE_FORMAT).to_string(),
            total_amount: order.total_amount,
            lines: confirmation_lines(order, &products),
        };

        self.mailer
            .send_order_confirmation(user.email.as_str(), &user.first_name, &confirmation)
            .await?;
        Ok(())
    }

    async fn send_delivered(&self, order: &Order) -> Result<(), AppError> {
        let user = self
            .users
            .get_by_id(order.user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;
        let products = self.product_lookup(order).await?;

        let links: Vec<ReviewLink> = order
            .product_ids()
            .into_iter()
            .map(|id| ReviewLink {
                name: product_name(&products, id),
                review_url: self.mailer.review_url(id),
            })
            .collect();

        self.mailer
            .send_order_delivered(user.email.as_str(), &user.first_name, order.id, &links)
            .await?;
        Ok(())
    }

    async fn product_lookup(
        &self,
        order: &Order,
    ) -> Result<HashMap<ProductId, ProductView>, AppError> {
        let views = self.products.get_views(&order.product_ids()).await?;
        Ok(views.into_iter().map(|view| (view.id, view)).collect())
    }
}

/// Copy a saved address into an order snapshot. The snapshot columns are
/// narrower than the address book's, so the copy is validated again.
fn snapshot_saved(saved: Address) -> Result<OrderAddressInput, AppError> {
    let address = OrderAddressInput::from(saved);
    address.validate().map_err(AppError::BadRequest)?;
    Ok(address)
}

/// Products that have since been deleted are named by id.
fn product_name(products: &HashMap<ProductId, ProductView>, id: ProductId) -> String {
    products
        .get(&id)
        .map_or_else(|| format!("Product #{id}"), |view| view.name.clone())
}

fn confirmation_lines(
    order: &Order,
    products: &HashMap<ProductId, ProductView>,
) -> Vec<ConfirmationLine> {
    order
        .items
        .iter()
        .map(|item| ConfirmationLine {
            name: product_name(products, item.product_id),
            size: item.size.clone(),
            quantity: item.quantity,
            price: item.price,
            image_uri: products
                .get(&item.product_id)
                .and_then(|view| view.images.first())
                .and_then(inline_image),
        })
        .collect()
}

/// `data:` URI for an image small enough to embed in an email.
fn inline_image(image: &ProductImageView) -> Option<String> {
    let decoded_len = image.image_base64.len() / 4 * 3;
    if image.image_base64.is_empty() || decoded_len > MAX_INLINE_IMAGE_BYTES {
        return None;
    }
    Some(format!(
        "data:{};base64,{}",
        image.image_type.as_deref().unwrap_or("image/jpeg"),
        image.image_base64
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;
    use strive_core::{
        AddressId, OrderItemId, PaymentStatus, ProductImageId, ProductStatus, UserId,
    };

    use crate::models::order::OrderItem;

    fn order() -> Order {
        Order {
            id: OrderId::new(31),
            user_id: UserId::new(4),
            address_id: None,
            order_address: None,
            total_amount: Decimal::new(12_998, 2),
            status: OrderStatus::Pending,
            payment_method: Some("CARD".into()),
            payment_status: PaymentStatus::Completed,
            card_last_four: Some("4242".into()),
            card_expiry: Some("12/27".into()),
            created_at: Utc.with_ymd_and_hms(2024, 3, 5, 10, 0, 0).unwrap(),
            items: vec![
                OrderItem {
                    id: OrderItemId::new(1),
                    product_id: ProductId::new(7),
                    quantity: 1,
                    size: Some("M".into()),
                    price: Decimal::new(8999, 2),
                },
                OrderItem {
                    id: OrderItemId::new(2),
                    product_id: ProductId::new(9),
                    quantity: 2,
                    size: None,
                    price: Decimal::new(1999, 2),
                },
            ],
        }
    }

    fn view(id: i32, name: &str, images: Vec<ProductImageView>) -> ProductView {
        ProductView {
            id: ProductId::new(id),
            name: name.into(),
            description: None,
            price: Decimal::new(8999, 2),
            category_id: None,
            category_name: None,
            status: ProductStatus::Active,
            images,
            stocks: Vec::new(),
            is_featured: false,
            display_order: None,
            average_rating: None,
            review_count: None,
        }
    }

    fn image(base64: String) -> ProductImageView {
        ProductImageView {
            id: ProductImageId::new(1),
            image_base64: base64,
            image_type: Some("image/png".into()),
            display_order: 1,
        }
    }

    #[test]
    fn test_lines_fall_back_to_product_id() {
        let products: HashMap<_, _> = [(ProductId::new(7), view(7, "Trail Runner", Vec::new()))]
            .into_iter()
            .collect();
        let lines = confirmation_lines(&order(), &products);

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].name, "Trail Runner");
        assert_eq!(lines[0].size.as_deref(), Some("M"));
        assert_eq!(lines[1].name, "Product #9");
        assert_eq!(lines[1].quantity, 2);
        assert!(lines[0].image_uri.is_none());
    }

    #[test]
    fn test_small_first_image_is_inlined() {
        let products: HashMap<_, _> = [(
            ProductId::new(7),
            view(7, "Trail Runner", vec![image("iVBORw0KGgo=".into())]),
        )]
        .into_iter()
        .collect();
        let lines = confirmation_lines(&order(), &products);
        assert_eq!(
            lines[0].image_uri.as_deref(),
            Some("data:image/png;base64,iVBORw0KGgo=")
        );
    }

    #[test]
    fn test_large_image_is_not_inlined() {
        let big = "A".repeat(MAX_INLINE_IMAGE_BYTES / 3 * 4 + 8);
        assert!(inline_image(&image(big)).is_none());
        assert!(inline_image(&image(String::new())).is_none());
    }

    fn saved_address(phone: &str) -> Address {
        Address {
            id: AddressId::new(2),
            user_id: UserId::new(4),
            name: "Home".into(),
            recipient_name: "Ana Silva".into(),
            recipient_phone: phone.into(),
            street_address: "Rua Augusta 10".into(),
            city: "Lisbon".into(),
            state: None,
            postal_code: Some("1100-053".into()),
            country: "Portugal".into(),
            is_default: true,
        }
    }

    #[test]
    fn test_saved_address_is_snapshotted() {
        let snapshot = snapshot_saved(saved_address("+351912345678")).unwrap();
        assert_eq!(snapshot.name.as_deref(), Some("Home"));
        assert_eq!(snapshot.recipient_phone, "+351912345678");
    }

    #[test]
    fn test_saved_phone_too_long_for_order_is_bad_request() {
        // Valid in the address book (25), too long for an order (20)
        let phone = "+351 912 345 678 000 00";
        assert_eq!(phone.len(), 23);
        let err = snapshot_saved(saved_address(phone)).unwrap_err();
        assert!(
            matches!(&err, AppError::BadRequest(msg) if msg == "Recipient phone must not exceed 20 characters")
        );
    }

    #[test]
    fn test_order_date_format() {
        assert_eq!(
            order().created_at.format(ORDER_DATE_FORMAT).to_string(),
            "March 5, 2024"
        );
    }
}
