use async_trait::async_trait;
use rand::Rng;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    dto::orders::PlacedOrder,
    error::{AppError, AppResult},
    models::{Order, OrderLine},
};

pub const ORDER_CODE_PREFIX: &str = "ORDER-";
pub const MAX_CODE_ATTEMPTS: usize = 10;

const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const CODE_SUFFIX_LEN: usize = 6;

/// Order ready for insertion. The store assigns id and timestamps and
/// stamps the initial status.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub order_code: String,
    pub user_id: Option<Uuid>,
    pub user_email: Option<String>,
    pub lines: Vec<OrderLine>,
    pub total_amount: Decimal,
}

#[derive(Debug, Clone)]
pub struct Purchaser {
    pub id: Uuid,
    pub email: Option<String>,
}

/// Persistence capability the order assembly needs. Injected so tests can
/// substitute an in-memory fake; the production impl delegates to SeaORM.
#[async_trait]
pub trait CheckoutStore {
    async fn order_code_exists(&self, code: &str) -> AppResult<bool>;
    async fn insert_order(&self, order: NewOrder) -> AppResult<Order>;
    async fn clear_cart(&self, user_id: Uuid) -> AppResult<u64>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct Pricing {
    pub subtotal: Decimal,
    pub shipping: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

/// Subtotal over the line snapshots, flat-rate shipping waived strictly
/// above the free-shipping threshold, 8% tax rounded to cents.
pub fn price_lines(lines: &[OrderLine]) -> Pricing {
    let free_shipping_over = Decimal::new(50, 0);
    let flat_shipping = Decimal::new(999, 2);
    let tax_rate = Decimal::new(8, 2);

    let subtotal: Decimal = lines
        .iter()
        .map(|line| line.unit_price * Decimal::from(line.quantity))
        .sum();
    let shipping = if subtotal > free_shipping_over {
        Decimal::ZERO
    } else {
        flat_shipping
    };
    let tax = (subtotal * tax_rate).round_dp(2);
    let total = subtotal + shipping + tax;

    Pricing {
        subtotal,
        shipping,
        tax,
        total,
    }
}

pub fn generate_order_code() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..CODE_SUFFIX_LEN)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect();
    format!("{ORDER_CODE_PREFIX}{suffix}")
}

async fn unique_order_code<S: CheckoutStore + Sync>(store: &S) -> AppResult<String> {
    for _ in 0..MAX_CODE_ATTEMPTS {
        let candidate = generate_order_code();
        if !store.order_code_exists(&candidate).await? {
            return Ok(candidate);
        }
    }
    Err(AppError::CodeGenerationExhausted)
}

/// Turn validated line snapshots into a persisted order with a unique code
/// and a server-computed total, then clear the purchaser's cart.
///
/// The total is always recomputed here; a caller-supplied figure is never
/// trusted. Stock is not decremented by order placement. A cart-clear
/// failure after a successful insert leaves the order standing and the
/// cart stale, which the next cart read resolves.
pub async fn place_order<S: CheckoutStore + Sync>(
    store: &S,
    lines: Vec<OrderLine>,
    purchaser: Option<Purchaser>,
) -> AppResult<PlacedOrder> {
    if lines.is_empty() {
        return Err(AppError::BadRequest("Cart is empty".into()));
    }
    if lines.iter().any(|line| line.quantity < 1) {
        return Err(AppError::BadRequest(
            "quantity must be at least 1".into(),
        ));
    }

    let order_code = unique_order_code(store).await?;
    let pricing = price_lines(&lines);

    let order = store
        .insert_order(NewOrder {
            order_code,
            user_id: purchaser.as_ref().map(|p| p.id),
            user_email: purchaser.as_ref().and_then(|p| p.email.clone()),
            lines,
            total_amount: pricing.total,
        })
        .await?;

    if let Some(purchaser) = &purchaser {
        // The order stands even if the clear fails; stale cart rows are
        // cleaned up by the next successful checkout.
        if let Err(err) = store.clear_cart(purchaser.id).await {
            tracing::warn!(error = %err, order_code = %order.order_code, "cart clear failed after order insert");
        }
    }

    Ok(PlacedOrder {
        order_code: order.order_code,
        total_amount: order.total_amount,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    };

    #[derive(Default)]
    struct FakeStore {
        orders: Mutex<Vec<Order>>,
        cart_rows: Mutex<Vec<Uuid>>,
        exists_calls: AtomicUsize,
        insert_calls: AtomicUsize,
        clear_calls: AtomicUsize,
        always_collide: bool,
    }

    #[async_trait]
    impl CheckoutStore for FakeStore {
        async fn order_code_exists(&self, code: &str) -> AppResult<bool> {
            self.exists_calls.fetch_add(1, Ordering::SeqCst);
            if self.always_collide {
                return Ok(true);
            }
            let orders = self.orders.lock().unwrap();
            Ok(orders.iter().any(|o| o.order_code == code))
        }

        async fn insert_order(&self, order: NewOrder) -> AppResult<Order> {
            self.insert_calls.fetch_add(1, Ordering::SeqCst);
            let now = Utc::now();
            let stored = Order {
                id: Uuid::new_v4(),
                order_code: order.order_code,
                user_id: order.user_id,
                user_email: order.user_email,
                product_ids: order.lines,
                total_amount: order.total_amount,
                status: "pending".into(),
                created_at: now,
                updated_at: now,
            };
            let mut orders = self.orders.lock().unwrap();
            orders.push(stored.clone());
            Ok(stored)
        }

        async fn clear_cart(&self, user_id: Uuid) -> AppResult<u64> {
            self.clear_calls.fetch_add(1, Ordering::SeqCst);
            let mut rows = self.cart_rows.lock().unwrap();
            let before = rows.len();
            rows.retain(|owner| *owner != user_id);
            Ok((before - rows.len()) as u64)
        }
    }

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn line(unit_price: &str, quantity: i32) -> OrderLine {
        OrderLine {
            product_id: Uuid::new_v4(),
            name: "Linen Shirt".into(),
            unit_price: dec(unit_price),
            quantity,
            size: Some("M".into()),
            color: Some("White".into()),
        }
    }

    fn purchaser() -> Purchaser {
        Purchaser {
            id: Uuid::new_v4(),
            email: Some("buyer@example.com".into()),
        }
    }

    #[test]
    fn order_code_format() {
        for _ in 0..200 {
            let code = generate_order_code();
            let suffix = code.strip_prefix("ORDER-").expect("prefix");
            assert_eq!(suffix.len(), 6);
            assert!(
                suffix
                    .bytes()
                    .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit()),
                "unexpected character in {code}"
            );
        }
    }

    #[test]
    fn shipping_is_charged_at_exactly_fifty() {
        let pricing = price_lines(&[line("50.00", 1)]);
        assert_eq!(pricing.shipping, dec("9.99"));
    }

    #[test]
    fn shipping_is_free_above_fifty() {
        let pricing = price_lines(&[line("50.01", 1)]);
        assert_eq!(pricing.shipping, Decimal::ZERO);
    }

    #[test]
    fn tax_is_eight_percent_of_subtotal() {
        let pricing = price_lines(&[line("25.00", 4)]);
        assert_eq!(pricing.subtotal, dec("100.00"));
        assert_eq!(pricing.tax, dec("8.00"));
        assert_eq!(pricing.total, dec("108.00"));
    }

    #[test]
    fn subtotal_sums_quantity_weighted_lines() {
        let pricing = price_lines(&[line("19.99", 2), line("5.50", 3)]);
        assert_eq!(pricing.subtotal, dec("56.48"));
        assert_eq!(pricing.shipping, Decimal::ZERO);
    }

    #[tokio::test]
    async fn placed_orders_get_distinct_codes() {
        let store = FakeStore::default();
        let first = place_order(&store, vec![line("10.00", 1)], None)
            .await
            .unwrap();
        let second = place_order(&store, vec![line("10.00", 1)], None)
            .await
            .unwrap();
        assert_ne!(first.order_code, second.order_code);
    }

    #[tokio::test]
    async fn code_generation_gives_up_after_ten_attempts() {
        let store = FakeStore {
            always_collide: true,
            ..FakeStore::default()
        };
        let err = place_order(&store, vec![line("10.00", 1)], Some(purchaser()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::CodeGenerationExhausted));
        assert_eq!(store.exists_calls.load(Ordering::SeqCst), 10);
        assert_eq!(store.insert_calls.load(Ordering::SeqCst), 0);
        assert_eq!(store.clear_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn empty_cart_is_rejected_before_any_store_call() {
        let store = FakeStore::default();
        let err = place_order(&store, Vec::new(), Some(purchaser()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
        assert_eq!(store.exists_calls.load(Ordering::SeqCst), 0);
        assert_eq!(store.insert_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn zero_quantity_line_is_rejected() {
        let store = FakeStore::default();
        let err = place_order(&store, vec![line("10.00", 0)], None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
        assert_eq!(store.insert_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn guest_order_has_no_user_and_clears_no_cart() {
        let store = FakeStore::default();
        store.cart_rows.lock().unwrap().push(Uuid::new_v4());

        let placed = place_order(&store, vec![line("12.00", 2)], None)
            .await
            .unwrap();
        assert!(placed.order_code.starts_with("ORDER-"));
        assert_eq!(store.clear_calls.load(Ordering::SeqCst), 0);
        assert_eq!(store.cart_rows.lock().unwrap().len(), 1);

        let orders = store.orders.lock().unwrap();
        assert_eq!(orders.len(), 1);
        assert!(orders[0].user_id.is_none());
        assert_eq!(orders[0].status, "pending");
    }

    #[tokio::test]
    async fn cart_clear_is_scoped_to_the_purchaser() {
        let store = FakeStore::default();
        let buyer = purchaser();
        let other_user = Uuid::new_v4();
        {
            let mut rows = store.cart_rows.lock().unwrap();
            rows.push(buyer.id);
            rows.push(buyer.id);
            rows.push(other_user);
        }

        place_order(&store, vec![line("10.00", 1)], Some(buyer.clone()))
            .await
            .unwrap();

        let rows = store.cart_rows.lock().unwrap();
        assert!(rows.iter().all(|owner| *owner != buyer.id));
        assert_eq!(rows.iter().filter(|owner| **owner == other_user).count(), 1);
    }

    #[tokio::test]
    async fn snapshot_survives_later_price_changes() {
        let store = FakeStore::default();
        let mut snapshot_line = line("20.00", 1);
        snapshot_line.name = "Wool Coat".into();

        let placed = place_order(&store, vec![snapshot_line.clone()], None)
            .await
            .unwrap();
        assert_eq!(placed.total_amount, dec("31.59"));

        // Mutating the caller's copy models a later catalog price change;
        // the stored snapshot must be unaffected.
        snapshot_line.unit_price = dec("99.00");

        let orders = store.orders.lock().unwrap();
        assert_eq!(orders[0].product_ids[0].unit_price, dec("20.00"));
        assert_eq!(orders[0].product_ids[0].name, "Wool Coat");
        assert_eq!(orders[0].total_amount, dec("31.59"));
    }

    #[tokio::test]
    async fn total_covers_subtotal_shipping_and_tax_below_threshold() {
        let store = FakeStore::default();
        let placed = place_order(&store, vec![line("10.00", 2)], None)
            .await
            .unwrap();
        // 20.00 subtotal + 9.99 shipping + 1.60 tax
        assert_eq!(placed.total_amount, dec("31.59"));
    }
}
