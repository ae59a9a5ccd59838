mod common;

use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use storefront::{
    entity::{AuditLogs, Products, audit_logs::Column as AuditCol},
    error::AppError,
    models::{OrderStatus, PaymentMethod, PaymentStatus},
    services::order_service::{self, Placed},
};
use uuid::Uuid;

use common::{create_product, order_request, setup_state};

// Integration flow: place an order -> stock drops -> replay with same key -> lookup -> stock shortfall.
#[tokio::test]
async fn place_replay_and_lookup_order_flow() -> anyhow::Result<()> {
    // Allow skipping when no DB is configured in the environment.
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let product_id = create_product(&state, "Rose Water", Decimal::from(100), 10).await?;
    let request = order_request(product_id, 3);
    let key = Uuid::new_v4();

    let placed = order_service::create_order(&state, Some(key), request.clone()).await?;
    let Placed::Created(response) = placed else {
        panic!("first submission must create an order");
    };
    let order = response.data.expect("order data");
    assert_eq!(order.order_number, "CL000001");
    assert_eq!(order.total, Decimal::from(300));
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.payment_status, PaymentStatus::Pending);
    assert_eq!(order.items, request.items);

    let product = Products::find_by_id(product_id)
        .one(&state.orm)
        .await?
        .expect("product");
    assert_eq!(product.stock, 7);

    // Retried submission after a lost response.
    let replayed = order_service::create_order(&state, Some(key), request.clone()).await?;
    let Placed::Replayed(response) = replayed else {
        panic!("same idempotency key must not create a second order");
    };
    assert_eq!(response.data.expect("order data").order_number, order.order_number);

    let product = Products::find_by_id(product_id)
        .one(&state.orm)
        .await?
        .expect("product");
    assert_eq!(product.stock, 7, "replay must not take stock twice");

    // The same key with a different address or payment method is not a retry.
    let mut changed = request.clone();
    changed.shipping_address.city = "Ankara".into();
    changed.payment_method = PaymentMethod::CreditCard;
    match order_service::create_order(&state, Some(key), changed).await {
        Err(AppError::Conflict(message)) => {
            assert_eq!(message, "Idempotency key was already used for a different order")
        }
        other => panic!("expected idempotency conflict, got {other:?}"),
    }

    let fetched = order_service::get_order_by_number(&state, &order.order_number).await?;
    assert_eq!(fetched.data.expect("order data").id, order.id);

    let audits = AuditLogs::find()
        .filter(AuditCol::Action.eq("order_created"))
        .all(&state.orm)
        .await?;
    assert_eq!(audits.len(), 1);

    // Stock shortfall is rejected and leaves stock untouched.
    let scarce_id = create_product(&state, "Lavender Oil", Decimal::from(100), 2).await?;
    let result = order_service::create_order(&state, None, order_request(scarce_id, 3)).await;
    match result {
        Err(AppError::BadRequest(message)) => {
            assert_eq!(message, "Insufficient stock for Lavender Oil")
        }
        other => panic!("expected stock rejection, got {other:?}"),
    }

    let scarce = Products::find_by_id(scarce_id)
        .one(&state.orm)
        .await?
        .expect("product");
    assert_eq!(scarce.stock, 2);

    let missing = order_service::get_order_by_number(&state, "CL999999").await;
    assert!(matches!(missing, Err(AppError::NotFound)));

    Ok(())
}
