use std::collections::BTreeMap;

use anyhow::anyhow;
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseTransaction, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, SqlErr, Statement, TransactionTrait,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    audit,
    cart::CartLine,
    dto::orders::{OrderRequest, ShippingAddress},
    entity::{
        order_items::{
            ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems,
            Model as OrderItemModel,
        },
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        products::{Column as ProdCol, Entity as Products},
    },
    error::{AppError, AppResult},
    models::{Order, OrderStatus, PaymentMethod, PaymentStatus},
    response::ApiResponse,
    state::AppState,
};

pub const ORDER_NUMBER_PREFIX: &str = "CL";

/// Money columns are `NUMERIC(12,2)`.
const MONEY_SCALE: u32 = 2;
const MONEY_INTEGER_DIGITS: u32 = 10;

/// Outcome of `POST /api/orders`.
#[derive(Debug)]
pub enum Placed {
    Created(ApiResponse<Order>),
    /// The idempotency key was already used; this is the order it produced.
    Replayed(ApiResponse<Order>),
}

pub async fn create_order(
    state: &AppState,
    idempotency_key: Option<Uuid>,
    payload: OrderRequest,
) -> AppResult<Placed> {
    payload.validate()?;
    check_lines(&payload)?;

    if let Some(key) = idempotency_key {
        let existing = Orders::find()
            .filter(OrderCol::IdempotencyKey.eq(key))
            .one(&state.orm)
            .await?;
        if let Some(order) = existing {
            let items = load_items(&state.orm, order.id).await?;
            let order = order_from_entity(order, items)?;
            if !same_order(&order, &payload) {
                tracing::warn!(order_number = %order.order_number, "idempotency key reused for a different order");
                return Err(AppError::Conflict(
                    "Idempotency key was already used for a different order".into(),
                ));
            }
            tracing::info!(order_number = %order.order_number, "replaying order for idempotency key");
            return Ok(Placed::Replayed(ApiResponse::success(
                "Order already placed",
                order,
                None,
            )));
        }
    }

    let txn = state.orm.begin().await?;

    reserve_stock(&txn, &payload.items).await?;

    let order_number = format_order_number(next_order_sequence(&txn).await?);
    let shipping_address =
        serde_json::to_value(&payload.shipping_address).map_err(|e| AppError::Internal(e.into()))?;

    let inserted = OrderActive {
        id: Set(Uuid::new_v4()),
        order_number: Set(order_number),
        idempotency_key: Set(idempotency_key),
        total: Set(payload.total),
        shipping_address: Set(shipping_address),
        payment_method: Set(payload.payment_method.as_str().to_string()),
        status: Set(OrderStatus::Pending.as_str().to_string()),
        payment_status: Set(PaymentStatus::Pending.as_str().to_string()),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await;

    let order = match inserted {
        Ok(order) => order,
        Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
            return Err(AppError::Conflict(
                "This order is already being processed".into(),
            ));
        }
        Err(err) => return Err(err.into()),
    };

    let mut items = Vec::with_capacity(payload.items.len());
    for (position, line) in payload.items.iter().enumerate() {
        let item = OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            position: Set(i32::try_from(position).map_err(|e| AppError::Internal(e.into()))?),
            product_id: Set(line.product_id.clone()),
            name: Set(line.name.clone()),
            unit_price: Set(line.unit_price),
            quantity: Set(db_quantity(line.quantity)?),
            size_variant: Set(line.size_variant.clone()),
            image_ref: Set(line.image_ref.clone()),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;
        items.push(item);
    }

    txn.commit().await?;

    tracing::info!(
        order_number = %order.order_number,
        total = %order.total,
        lines = items.len(),
        "order created"
    );
    audit::record(
        &state.pool,
        "order_created",
        "orders",
        serde_json::json!({ "order_id": order.id, "order_number": order.order_number }),
    )
    .await;

    Ok(Placed::Created(ApiResponse::success(
        "Order placed",
        order_from_entity(order, items)?,
        None,
    )))
}

pub async fn get_order_by_number(
    state: &AppState,
    order_number: &str,
) -> AppResult<ApiResponse<Order>> {
    let order = Orders::find()
        .filter(OrderCol::OrderNumber.eq(order_number))
        .one(&state.orm)
        .await?;
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    let items = load_items(&state.orm, order.id).await?;
    Ok(ApiResponse::success("OK", order_from_entity(order, items)?, None))
}

pub fn format_order_number(sequence: i64) -> String {
    format!("{ORDER_NUMBER_PREFIX}{sequence:06}")
}

/// Checks that do not need the database.
pub fn check_lines(payload: &OrderRequest) -> AppResult<()> {
    for line in &payload.items {
        if line.product_id.trim().is_empty() {
            return Err(AppError::BadRequest("Order line is missing a product".into()));
        }
        if line.quantity < 1 {
            return Err(AppError::BadRequest(format!(
                "Quantity for {} must be at least 1",
                line.name
            )));
        }
        if line.unit_price < Decimal::ZERO || !fits_money_column(line.unit_price) {
            return Err(AppError::BadRequest(format!("Invalid price for {}", line.name)));
        }
    }

    if !fits_money_column(payload.total) || payload.items_total() != Some(payload.total) {
        return Err(AppError::BadRequest(
            "Order total does not match items".into(),
        ));
    }

    Ok(())
}

fn fits_money_column(value: Decimal) -> bool {
    let limit = Decimal::from(10_i64.pow(MONEY_INTEGER_DIGITS));
    value.normalize().scale() <= MONEY_SCALE && value.abs() < limit
}

/// Whether a stored order was placed from exactly this request.
fn same_order(order: &Order, payload: &OrderRequest) -> bool {
    order.items == payload.items
        && order.total == payload.total
        && order.shipping_address == payload.shipping_address
        && order.payment_method == payload.payment_method
}

/// Lock each ordered product, confirm stock and decrement it. Sizes of the
/// same product share one stock counter.
async fn reserve_stock(txn: &DatabaseTransaction, lines: &[CartLine]) -> AppResult<()> {
    let mut wanted: BTreeMap<&str, u32> = BTreeMap::new();
    for line in lines {
        let entry = wanted.entry(line.product_id.as_str()).or_default();
        *entry = entry.saturating_add(line.quantity);
    }

    for (product_id, quantity) in wanted {
        let unavailable = || AppError::BadRequest(format!("Product {product_id} is not available"));
        let id = Uuid::parse_str(product_id).map_err(|_| unavailable())?;

        let product = Products::find_by_id(id)
            .lock(LockType::Update)
            .one(txn)
            .await?
            .ok_or_else(unavailable)?;

        let quantity = db_quantity(quantity)?;
        if product.stock < quantity {
            return Err(AppError::BadRequest(format!(
                "Insufficient stock for {}",
                product.name
            )));
        }

        Products::update_many()
            .col_expr(ProdCol::Stock, Expr::col(ProdCol::Stock).sub(quantity))
            .filter(ProdCol::Id.eq(id))
            .exec(txn)
            .await?;
    }

    Ok(())
}

async fn next_order_sequence(txn: &DatabaseTransaction) -> AppResult<i64> {
    let row = txn
        .query_one(Statement::from_string(
            txn.get_database_backend(),
            "SELECT nextval('order_number_seq') AS seq",
        ))
        .await?
        .ok_or_else(|| AppError::Internal(anyhow!("order number sequence returned no row")))?;
    Ok(row.try_get::<i64>("", "seq")?)
}

async fn load_items<C: ConnectionTrait>(conn: &C, order_id: Uuid) -> AppResult<Vec<OrderItemModel>> {
    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order_id))
        .order_by_asc(OrderItemCol::Position)
        .all(conn)
        .await?;
    Ok(items)
}

fn db_quantity(quantity: u32) -> AppResult<i32> {
    i32::try_from(quantity).map_err(|_| AppError::BadRequest("Quantity is too large".into()))
}

fn order_from_entity(model: OrderModel, items: Vec<OrderItemModel>) -> AppResult<Order> {
    let shipping_address: ShippingAddress = serde_json::from_value(model.shipping_address)
        .map_err(|e| AppError::Internal(e.into()))?;
    let items = items
        .into_iter()
        .map(line_from_entity)
        .collect::<AppResult<Vec<_>>>()?;

    Ok(Order {
        id: model.id,
        order_number: model.order_number,
        items,
        total: model.total,
        shipping_address,
        payment_method: parse_column::<PaymentMethod>(&model.payment_method)?,
        status: parse_column::<OrderStatus>(&model.status)?,
        payment_status: parse_column::<PaymentStatus>(&model.payment_status)?,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    })
}

fn line_from_entity(model: OrderItemModel) -> AppResult<CartLine> {
    Ok(CartLine {
        product_id: model.product_id,
        name: model.name,
        unit_price: model.unit_price,
        quantity: u32::try_from(model.quantity).map_err(|e| AppError::Internal(e.into()))?,
        size_variant: model.size_variant,
        image_ref: model.image_ref,
    })
}

fn parse_column<T>(value: &str) -> AppResult<T>
where
    T: std::str::FromStr<Err = crate::models::UnknownVariant>,
{
    value.parse().map_err(|e: crate::models::UnknownVariant| AppError::Internal(e.into()))
}
