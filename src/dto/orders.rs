use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::Order;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckoutItemRequest {
    pub product_id: Uuid,
    pub quantity: i32,
    pub size: Option<String>,
    pub color: Option<String>,
}

/// Checkout payload. Authenticated callers may omit `items`: their
/// server-side cart is the source of truth. Guests must supply `items`.
/// Prices are always looked up server-side, never taken from the client.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckoutRequest {
    pub items: Option<Vec<CheckoutItemRequest>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PlacedOrder {
    pub order_code: String,
    pub total_amount: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<Order>,
}
