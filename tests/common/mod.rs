use rust_decimal::Decimal;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ConnectionTrait, Set, Statement};
use storefront::{
    cart::CartLine,
    db::run_migrations,
    dto::orders::{OrderRequest, ShippingAddress},
    entity::products::ActiveModel as ProductActive,
    models::PaymentMethod,
    state::AppState,
};
use uuid::Uuid;

/// Connects to the test database and empties it, or returns `None` when no
/// database is configured.
pub async fn setup_state() -> anyhow::Result<Option<AppState>> {
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            return Ok(None);
        }
    };

    let state = AppState::connect(&database_url).await?;
    run_migrations(&state.orm).await?;

    // Clean tables between runs. The order number sequence is not owned by a
    // column, so RESTART IDENTITY leaves it alone.
    let backend = state.orm.get_database_backend();
    for sql in [
        "TRUNCATE TABLE order_items, orders, audit_logs, products, blogs RESTART IDENTITY CASCADE",
        "ALTER SEQUENCE order_number_seq RESTART",
    ] {
        state
            .orm
            .execute(Statement::from_string(backend, sql))
            .await?;
    }

    Ok(Some(state))
}

pub async fn create_product(
    state: &AppState,
    name: &str,
    price: Decimal,
    stock: i32,
) -> anyhow::Result<Uuid> {
    let product = ProductActive {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        slug: Set(name.to_lowercase().replace(' ', "-")),
        description: Set(None),
        price: Set(price),
        category: Set(None),
        sizes: Set(serde_json::json!(["250ml"])),
        image_ref: Set(String::new()),
        stock: Set(stock),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(product.id)
}

pub fn order_request(product_id: Uuid, quantity: u32) -> OrderRequest {
    let items = vec![CartLine {
        product_id: product_id.to_string(),
        name: "Rose Water".into(),
        unit_price: Decimal::from(100),
        quantity,
        size_variant: Some("250ml".into()),
        image_ref: String::new(),
    }];
    OrderRequest {
        total: Decimal::from(100 * quantity),
        items,
        shipping_address: ShippingAddress {
            full_name: "Ayşe Yılmaz".into(),
            email: "ayse@example.com".into(),
            phone: "+90 555 000 00 00".into(),
            address: "Bağdat Cd. 12".into(),
            city: "Istanbul".into(),
            district: "Kadıköy".into(),
            postal_code: None,
            notes: None,
        },
        payment_method: PaymentMethod::CashOnDelivery,
    }
}
