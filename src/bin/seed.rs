use rust_decimal::Decimal;
use storefront::{config::AppConfig, db::create_pool};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    // Ensure migrations are applied.
    sqlx::migrate!("./migrations").run(&pool).await?;

    seed_products(&pool).await?;
    seed_blogs(&pool).await?;

    println!("Seed completed");
    Ok(())
}

async fn seed_products(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let products = [
        ("Rose Water", "rose-water", "Steam-distilled Damask rose water", Decimal::new(14990, 2), "toners", &["250ml", "500ml"][..], 120),
        ("Lavender Oil", "lavender-oil", "Cold-pressed lavender essential oil", Decimal::new(4550, 2), "oils", &["10ml", "30ml"][..], 80),
        ("Olive Oil Soap", "olive-oil-soap", "Hand-cut soap with laurel", Decimal::new(3500, 2), "soaps", &[][..], 300),
        ("Argan Hair Serum", "argan-hair-serum", "Light serum for dry ends", Decimal::new(21900, 2), "hair", &["50ml"][..], 40),
    ];

    for (name, slug, desc, price, category, sizes, stock) in products {
        sqlx::query(
            r#"
            INSERT INTO products (id, name, slug, description, price, category, sizes, image_ref, stock)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(slug)
        .bind(desc)
        .bind(price)
        .bind(category)
        .bind(serde_json::json!(sizes))
        .bind(format!("/images/products/{slug}.webp"))
        .bind(stock)
        .execute(pool)
        .await?;
    }

    println!("Seeded products");
    Ok(())
}

async fn seed_blogs(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let posts = [
        ("Building a simple skincare routine", "simple-skincare-routine", "Three steps that cover most skin types."),
        ("How rose water is made", "how-rose-water-is-made", "From the harvest in Isparta to the bottle."),
    ];

    for (title, slug, excerpt) in posts {
        sqlx::query(
            r#"
            INSERT INTO blogs (id, title, slug, excerpt, content)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (slug) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(title)
        .bind(slug)
        .bind(excerpt)
        .bind(format!("{excerpt}\n\nFull article coming soon."))
        .execute(pool)
        .await?;
    }

    println!("Seeded blogs");
    Ok(())
}
