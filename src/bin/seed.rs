use argon2::{
    Argon2, PasswordHasher,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum_storefront_api::{config::AppConfig, db::create_pool};
use rust_decimal::Decimal;
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url, config.max_db_connections).await?;

    let admin_id = ensure_user_with_role(&pool, "admin@example.com", "admin123", "admin").await?;
    let user_id = ensure_user_with_role(&pool, "user@example.com", "user123", "user").await?;
    seed_catalog(&pool).await?;

    println!("Seed completed. Admin ID: {admin_id}, User ID: {user_id}");
    Ok(())
}

async fn ensure_user_with_role(
    pool: &sqlx::PgPool,
    email: &str,
    password: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();

    let row: Option<(Uuid,)> = sqlx::query_as(
        r#"
        INSERT INTO users (id, email, password_hash, role)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(password_hash)
    .bind(role)
    .fetch_optional(pool)
    .await?;

    let user_id = match row {
        Some((id,)) => id,
        None => {
            let existing: (Uuid,) = sqlx::query_as("SELECT id FROM users WHERE email = $1")
                .bind(email)
                .fetch_one(pool)
                .await?;
            existing.0
        }
    };

    println!("Ensured user {email} (role={role})");
    Ok(user_id)
}

async fn ensure_category(
    pool: &sqlx::PgPool,
    name: &str,
    slug: &str,
    description: &str,
) -> anyhow::Result<Uuid> {
    sqlx::query(
        r#"
        INSERT INTO categories (id, name, slug, description)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (slug) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(slug)
    .bind(description)
    .execute(pool)
    .await?;

    let (id,): (Uuid,) = sqlx::query_as("SELECT id FROM categories WHERE slug = $1")
        .bind(slug)
        .fetch_one(pool)
        .await?;
    Ok(id)
}

async fn ensure_subcategory(
    pool: &sqlx::PgPool,
    category_id: Uuid,
    name: &str,
    slug: &str,
) -> anyhow::Result<Uuid> {
    sqlx::query(
        r#"
        INSERT INTO subcategories (id, category_id, name, slug)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (slug) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(category_id)
    .bind(name)
    .bind(slug)
    .execute(pool)
    .await?;

    let (id,): (Uuid,) = sqlx::query_as("SELECT id FROM subcategories WHERE slug = $1")
        .bind(slug)
        .fetch_one(pool)
        .await?;
    Ok(id)
}

async fn seed_catalog(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let men = ensure_category(pool, "Men", "men", "Menswear").await?;
    let women = ensure_category(pool, "Women", "women", "Womenswear").await?;

    let men_tops = ensure_subcategory(pool, men, "Tops", "men-tops").await?;
    let men_outerwear = ensure_subcategory(pool, men, "Outerwear", "men-outerwear").await?;
    let women_dresses = ensure_subcategory(pool, women, "Dresses", "women-dresses").await?;

    let products: Vec<(&str, &str, &str, Option<&str>, bool, bool, i32, Uuid, Uuid)> = vec![
        (
            "Linen Shirt",
            "Breathable summer shirt",
            "39.99",
            None,
            false,
            true,
            50,
            men,
            men_tops,
        ),
        (
            "Wool Coat",
            "Heavy winter coat",
            "129.00",
            Some("99.00"),
            true,
            true,
            20,
            men,
            men_outerwear,
        ),
        (
            "Graphic Tee",
            "Organic cotton tee",
            "19.99",
            None,
            false,
            false,
            200,
            men,
            men_tops,
        ),
        (
            "Midi Dress",
            "Floral midi dress",
            "59.50",
            Some("44.99"),
            true,
            false,
            75,
            women,
            women_dresses,
        ),
    ];

    for (name, desc, price, sale_price, on_sale, featured, stock, category_id, subcategory_id) in
        products
    {
        let price: Decimal = price.parse()?;
        let sale_price: Option<Decimal> = sale_price.map(str::parse).transpose()?;
        sqlx::query(
            r#"
            INSERT INTO products
                (id, name, description, price, sale_price, is_on_sale, is_featured,
                 stock_quantity, sizes, colors, category_id, subcategory_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(desc)
        .bind(price)
        .bind(sale_price)
        .bind(on_sale)
        .bind(featured)
        .bind(stock)
        .bind(vec!["S".to_string(), "M".to_string(), "L".to_string()])
        .bind(vec!["Black".to_string(), "White".to_string()])
        .bind(category_id)
        .bind(subcategory_id)
        .execute(pool)
        .await?;
    }

    println!("Seeded catalog");
    Ok(())
}
