//! Order repository.
//!
//! Placing an order writes the address snapshot, the order, its items, the
//! ledger transaction and the day's metric row in one transaction, so the
//! ledger never disagrees with the orders table.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use strive_core::ledger::order_description;
use strive_core::{
    OrderAddressId, OrderId, OrderItemId, OrderStatus, PaymentStatus, ProductId, TransactionType,
    UserId,
};

use super::{RepositoryError, parse_column};
use crate::models::order::{CreateOrder, Order, OrderAddress, OrderAddressInput, OrderItem};

const ORDER_SELECT: &str = "SELECT o.id, o.user_id, o.address_id, o.total_amount, o.status, \
                                   o.payment_method, o.payment_status, o.card_last_four, \
                                   o.card_expiry, o.created_at, \
                                   a.name AS a_name, a.recipient_name AS a_recipient_name, \
                                   a.recipient_phone AS a_recipient_phone, \
                                   a.street_address AS a_street_address, a.city AS a_city, \
                                   a.state AS a_state, a.postal_code AS a_postal_code, \
                                   a.country AS a_country \
                            FROM shop.orders o \
                            LEFT JOIN shop.order_addresses a ON a.id = o.address_id";

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i32,
    user_id: i32,
    address_id: Option<i32>,
    total_amount: Decimal,
    status: String,
    payment_method: Option<String>,
    payment_status: String,
    card_last_four: Option<String>,
    card_expiry: Option<String>,
    created_at: DateTime<Utc>,
    a_name: Option<String>,
    a_recipient_name: Option<String>,
    a_recipient_phone: Option<String>,
    a_street_address: Option<String>,
    a_city: Option<String>,
    a_state: Option<String>,
    a_postal_code: Option<String>,
    a_country: Option<String>,
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItem>) -> Result<Order, RepositoryError> {
        let order_address = match (
            self.address_id,
            self.a_recipient_name,
            self.a_recipient_phone,
            self.a_street_address,
            self.a_city,
            self.a_country,
        ) {
            (
                Some(id),
                Some(recipient_name),
                Some(recipient_phone),
                Some(street_address),
                Some(city),
                Some(country),
            ) => Some(OrderAddress {
                id: OrderAddressId::new(id),
                name: self.a_name,
                recipient_name,
                recipient_phone,
                street_address,
                city,
                state: self.a_state,
                postal_code: self.a_postal_code,
                country,
            }),
            _ => None,
        };

        Ok(Order {
            id: OrderId::new(self.id),
            user_id: UserId::new(self.user_id),
            address_id: self.address_id.map(OrderAddressId::new),
            order_address,
            total_amount: self.total_amount,
            status: parse_column(&self.status)?,
            payment_method: self.payment_method,
            payment_status: parse_column(&self.payment_status)?,
            card_last_four: self.card_last_four,
            card_expiry: self.card_expiry,
            created_at: self.created_at,
            items,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    id: i32,
    order_id: i32,
    product_id: i32,
    quantity: i32,
    size: Option<String>,
    price: Decimal,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        Self {
            id: OrderItemId::new(row.id),
            product_id: ProductId::new(row.product_id),
            quantity: row.quantity,
            size: row.size,
            price: row.price,
        }
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for orders.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Place an order shipped to `address`.
    ///
    /// Also records an `ORDER` ledger transaction for the total and adds it
    /// to the metric row of the order's date.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails; nothing is
    /// written in that case.
    pub async fn create(
        &self,
        order: &CreateOrder,
        address: &OrderAddressInput,
    ) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let address_id: i32 = sqlx::query_scalar(
            "INSERT INTO shop.order_addresses \
                 (name, recipient_name, recipient_phone, street_address, city, state, \
                  postal_code, country) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING id",
        )
        .bind(address.name.as_deref())
        .bind(&address.recipient_name)
        .bind(&address.recipient_phone)
        .bind(&address.street_address)
        .bind(&address.city)
        .bind(address.state.as_deref())
        .bind(address.postal_code.as_deref())
        .bind(&address.country)
        .fetch_one(&mut *tx)
        .await?;

        let (order_id, created_at): (OrderId, DateTime<Utc>) = sqlx::query_as(
            "INSERT INTO shop.orders \
                 (user_id, address_id, total_amount, status, payment_method, payment_status, \
                  card_last_four, card_expiry) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING id, created_at",
        )
        .bind(order.user_id)
        .bind(address_id)
        .bind(order.total_amount)
        .bind(OrderStatus::Pending.as_str())
        .bind(order.payment_method.as_deref())
        .bind(PaymentStatus::Completed.as_str())
        .bind(order.card_last_four.as_deref())
        .bind(order.card_expiry.as_deref())
        .fetch_one(&mut *tx)
        .await?;

        for item in &order.items {
            sqlx::query(
                "INSERT INTO shop.order_items (order_id, product_id, quantity, size, price) \
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(order_id)
            .bind(item.product_id)
            .bind(item.quantity)
            .bind(item.size.as_deref())
            .bind(item.price)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query(
            "INSERT INTO shop.financial_transactions \
                 (order_id, amount, description, transaction_type) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(order_id)
        .bind(order.total_amount)
        .bind(order_description(order_id))
        .bind(TransactionType::Order.as_str())
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO shop.financial_metrics (date, daily_revenue, orders_count) \
             VALUES ($1, $2, 1) \
             ON CONFLICT (date) DO UPDATE SET \
                 daily_revenue = financial_metrics.daily_revenue + EXCLUDED.daily_revenue, \
                 orders_count = financial_metrics.orders_count + 1",
        )
        .bind(created_at.date_naive())
        .bind(order.total_amount)
        .execute(&mut *tx)
        .await?;

        let row = sqlx::query_as::<_, OrderRow>(&format!("{ORDER_SELECT} WHERE o.id = $1"))
            .bind(order_id)
            .fetch_one(&mut *tx)
            .await?;
        let items = fetch_items(&mut tx, &[order_id.as_i32()])
            .await?
            .remove(&order_id.as_i32())
            .unwrap_or_default();

        tx.commit().await?;

        row.into_order(items)
    }

    /// Every order, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    /// Returns `RepositoryError::DataCorruption` if a status column is invalid.
    pub async fn list_all(&self) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!("{ORDER_SELECT} ORDER BY o.id DESC"))
            .fetch_all(self.pool)
            .await?;

        self.with_items(rows).await
    }

    /// A user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    /// Returns `RepositoryError::DataCorruption` if a status column is invalid.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "{ORDER_SELECT} WHERE o.user_id = $1 ORDER BY o.created_at DESC, o.id DESC"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        self.with_items(rows).await
    }

    /// Get an order with its items.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    /// Returns `RepositoryError::DataCorruption` if a status column is invalid.
    pub async fn get_by_id(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!("{ORDER_SELECT} WHERE o.id = $1"))
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        match row {
            Some(row) => Ok(self.with_items(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    /// Set an order's status. Returns the status it had before along with the
    /// updated order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist.
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn update_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<(OrderStatus, Order), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let previous: String =
            sqlx::query_scalar("SELECT status FROM shop.orders WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or(RepositoryError::NotFound)?;

        sqlx::query("UPDATE shop.orders SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(status.as_str())
            .execute(&mut *tx)
            .await?;

        let row = sqlx::query_as::<_, OrderRow>(&format!("{ORDER_SELECT} WHERE o.id = $1"))
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
        let items = fetch_items(&mut tx, &[id.as_i32()])
            .await?
            .remove(&id.as_i32())
            .unwrap_or_default();

        tx.commit().await?;

        Ok((parse_column(&previous)?, row.into_order(items)?))
    }

    async fn with_items(&self, rows: Vec<OrderRow>) -> Result<Vec<Order>, RepositoryError> {
        let ids: Vec<i32> = rows.iter().map(|row| row.id).collect();
        let mut conn = self.pool.acquire().await?;
        let mut items = fetch_items(&mut conn, &ids).await?;

        rows.into_iter()
            .map(|row| {
                let lines = items.remove(&row.id).unwrap_or_default();
                row.into_order(lines)
            })
            .collect()
    }
}

/// Items of the given orders keyed by order id, in insertion order.
async fn fetch_items(
    conn: &mut sqlx::PgConnection,
    order_ids: &[i32],
) -> Result<HashMap<i32, Vec<OrderItem>>, RepositoryError> {
    let mut grouped: HashMap<i32, Vec<OrderItem>> = HashMap::new();
    if order_ids.is_empty() {
        return Ok(grouped);
    }

    let rows = sqlx::query_as::<_, OrderItemRow>(
        "SELECT id, order_id, product_id, quantity, size, price \
         FROM shop.order_items WHERE order_id = ANY($1) ORDER BY id",
    )
    .bind(order_ids)
    .fetch_all(&mut *conn)
    .await?;

    for row in rows {
        grouped.entry(row.order_id).or_default().push(row.into());
    }
    Ok(grouped)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::db::FinanceRepository;
    use crate::db::fixtures;
    use crate::models::order::OrderItemInput;

    fn address() -> OrderAddressInput {
        OrderAddressInput {
            name: Some("Home".into()),
            recipient_name: "Ana Silva".into(),
            recipient_phone: "912345678".into(),
            street_address: "Rua Augusta 10".into(),
            city: "Lisbon".into(),
            state: None,
            postal_code: Some("1100-053".into()),
            country: "Portugal".into(),
        }
    }

    fn order(user_id: UserId, total: Decimal, size: &str) -> CreateOrder {
        CreateOrder {
            user_id,
            address_id: None,
            order_address: Some(address()),
            total_amount: total,
            payment_method: Some("CARD".into()),
            card_last_four: Some("4242".into()),
            card_expiry: Some("12/28".into()),
            items: vec![OrderItemInput {
                product_id: ProductId::new(5),
                quantity: 1,
                size: Some(size.into()),
                price: total,
            }],
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_same_day_orders_share_one_metric_row(pool: PgPool) {
        let user = fixtures::user(&pool, "ana@strive.shop").await;
        let repo = OrderRepository::new(&pool);

        let first = repo
            .create(&order(user, Decimal::new(5998, 2), "M"), &address())
            .await
            .unwrap();
        let second = repo
            .create(&order(user, Decimal::new(2002, 2), "L"), &address())
            .await
            .unwrap();
        assert_eq!(first.created_at.date_naive(), second.created_at.date_naive());
        assert_eq!(first.status, OrderStatus::Pending);
        assert_eq!(second.items.len(), 1);

        let metrics = FinanceRepository::new(&pool).recent_metrics(10).await.unwrap();
        assert_eq!(metrics.len(), 1);
        assert_eq!(metrics[0].date, first.created_at.date_naive());
        assert_eq!(metrics[0].daily_revenue, Decimal::new(8000, 2));
        assert_eq!(metrics[0].orders_count, 2);
        assert_eq!(metrics[0].average_order_value, Decimal::new(4000, 2));

        assert_eq!(fixtures::count(&pool, "financial_transactions").await, 2);
        assert_eq!(fixtures::count(&pool, "order_addresses").await, 2);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_failed_order_writes_nothing(pool: PgPool) {
        let user = fixtures::user(&pool, "ana@strive.shop").await;

        // The item insert fails after the address and order rows were written
        let result = OrderRepository::new(&pool)
            .create(&order(user, Decimal::new(5998, 2), &"X".repeat(25)), &address())
            .await;
        assert!(matches!(result, Err(RepositoryError::Database(_))));

        for table in [
            "order_addresses",
            "orders",
            "order_items",
            "financial_transactions",
            "financial_metrics",
        ] {
            assert_eq!(fixtures::count(&pool, table).await, 0, "{table} not rolled back");
        }
    }
}
