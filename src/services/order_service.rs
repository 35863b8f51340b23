use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use std::collections::HashMap;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    db::OrmConn,
    dto::orders::{CheckoutRequest, OrderList, PlacedOrder},
    entity::{
        cart_items::{Column as CartCol, Entity as CartItems},
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Order, OrderLine, Product},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    services::checkout::{self, CheckoutStore, NewOrder, Purchaser},
    state::AppState,
};

#[async_trait]
impl CheckoutStore for OrmConn {
    async fn order_code_exists(&self, code: &str) -> AppResult<bool> {
        let count = Orders::find()
            .filter(OrderCol::OrderCode.eq(code))
            .count(self)
            .await?;
        Ok(count > 0)
    }

    async fn insert_order(&self, order: NewOrder) -> AppResult<Order> {
        let lines =
            serde_json::to_value(&order.lines).map_err(|e| AppError::Internal(e.into()))?;
        let model = OrderActive {
            id: Set(Uuid::new_v4()),
            order_code: Set(order.order_code),
            user_id: Set(order.user_id),
            user_email: Set(order.user_email),
            product_ids: Set(lines),
            total_amount: Set(order.total_amount),
            status: Set("pending".into()),
            created_at: NotSet,
            updated_at: NotSet,
        }
        .insert(self)
        .await?;
        Ok(order_from_entity(model))
    }

    async fn clear_cart(&self, user_id: Uuid) -> AppResult<u64> {
        let result = CartItems::delete_many()
            .filter(CartCol::UserId.eq(user_id))
            .exec(self)
            .await?;
        Ok(result.rows_affected)
    }
}

#[derive(sqlx::FromRow)]
struct CartLineRow {
    product_id: Uuid,
    name: String,
    price: Decimal,
    sale_price: Option<Decimal>,
    quantity: i32,
    size: Option<String>,
    color: Option<String>,
}

pub async fn place(
    state: &AppState,
    user: Option<&AuthUser>,
    payload: CheckoutRequest,
) -> AppResult<ApiResponse<PlacedOrder>> {
    let (lines, purchaser) = match user {
        Some(user) => {
            let rows = sqlx::query_as::<_, CartLineRow>(
                r#"
                SELECT ci.product_id, p.name, p.price, p.sale_price,
                       ci.quantity, ci.size, ci.color
                FROM cart_items ci
                JOIN products p ON p.id = ci.product_id
                WHERE ci.user_id = $1
                ORDER BY ci.created_at
                "#,
            )
            .bind(user.user_id)
            .fetch_all(&state.pool)
            .await?;

            if rows.is_empty() {
                return Err(AppError::BadRequest("Cart is empty".into()));
            }

            let lines = rows
                .into_iter()
                .map(|row| OrderLine {
                    product_id: row.product_id,
                    name: row.name,
                    unit_price: row.sale_price.unwrap_or(row.price),
                    quantity: row.quantity,
                    size: row.size,
                    color: row.color,
                })
                .collect();

            let email: Option<(String,)> =
                sqlx::query_as("SELECT email FROM users WHERE id = $1")
                    .bind(user.user_id)
                    .fetch_optional(&state.pool)
                    .await?;

            (
                lines,
                Some(Purchaser {
                    id: user.user_id,
                    email: email.map(|(e,)| e),
                }),
            )
        }
        None => {
            let items = payload.items.unwrap_or_default();
            if items.is_empty() {
                return Err(AppError::BadRequest("No cart items provided".into()));
            }

            let ids: Vec<Uuid> = items.iter().map(|item| item.product_id).collect();
            let products = sqlx::query_as::<_, Product>(
                "SELECT * FROM products WHERE id = ANY($1)",
            )
            .bind(&ids)
            .fetch_all(&state.pool)
            .await?;
            let by_id: HashMap<Uuid, &Product> =
                products.iter().map(|p| (p.id, p)).collect();

            let mut lines = Vec::with_capacity(items.len());
            for item in &items {
                let product = by_id.get(&item.product_id).ok_or_else(|| {
                    AppError::BadRequest(format!("product {} not found", item.product_id))
                })?;
                lines.push(OrderLine {
                    product_id: product.id,
                    name: product.name.clone(),
                    unit_price: product.effective_price(),
                    quantity: item.quantity,
                    size: item.size.clone(),
                    color: item.color.clone(),
                });
            }

            (lines, None)
        }
    };

    let placed = checkout::place_order(&state.orm, lines, purchaser).await?;

    if let Err(err) = log_audit(
        &state.pool,
        user.map(|u| u.user_id),
        "order_placed",
        Some("orders"),
        Some(serde_json::json!({ "order_code": placed.order_code })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Order placed",
        placed,
        Some(Meta::empty()),
    ))
}

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination.normalize();
    let mut condition = Condition::all().add(OrderCol::UserId.eq(user.user_id));
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(OrderCol::Status.eq(status.clone()));
    }

    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);

    let mut finder = Orders::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Ok",
        OrderList { items: orders },
        Some(meta),
    ))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Order>> {
    let order = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::UserId.eq(user.user_id))
                .add(OrderCol::Id.eq(id)),
        )
        .one(&state.orm)
        .await?;
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    Ok(ApiResponse::success(
        "OK",
        order_from_entity(order),
        Some(Meta::empty()),
    ))
}

pub(crate) fn order_from_entity(model: OrderModel) -> Order {
    Order {
        id: model.id,
        order_code: model.order_code,
        user_id: model.user_id,
        user_email: model.user_email,
        product_ids: serde_json::from_value(model.product_ids).unwrap_or_default(),
        total_amount: model.total_amount,
        status: model.status,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}
