use anyhow::Context;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use super::dto::Macronutrients;

pub const SOURCE_MANUAL: &str = "manual";
pub const SOURCE_OPENFOODFACTS: &str = "openfoodfacts";

#[derive(Debug, Clone, FromRow)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub calories: i32,
    pub protein: i32,
    pub carbs: i32,
    pub fat: i32,
    pub image_key: Option<String>,
    pub barcode: Option<String>,
    pub source: String,
    pub seq: i64,
    pub created_at: OffsetDateTime,
}

impl Product {
    pub fn macronutrients(&self) -> Macronutrients {
        Macronutrients {
            calories: self.calories,
            protein: self.protein,
            carbs: self.carbs,
            fat: self.fat,
        }
    }
}

const COLUMNS: &str =
    "id, name, calories, protein, carbs, fat, image_key, barcode, source, seq, created_at";

pub async fn insert(
    db: &PgPool,
    name: &str,
    macros: &Macronutrients,
    image_key: Option<&str>,
    barcode: Option<&str>,
    source: &str,
) -> anyhow::Result<Uuid> {
    let (id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO product (name, calories, protein, carbs, fat, image_key, barcode, source)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING id
        "#,
    )
    .bind(name)
    .bind(macros.calories)
    .bind(macros.protein)
    .bind(macros.carbs)
    .bind(macros.fat)
    .bind(image_key)
    .bind(barcode)
    .bind(source)
    .fetch_one(db)
    .await
    .context("insert product")?;
    Ok(id)
}

pub async fn find(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Product>> {
    let row = sqlx::query_as::<_, Product>(&format!(
        "SELECT {COLUMNS} FROM product WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(db)
    .await
    .context("find product")?;
    Ok(row)
}

/// Insertion-reverse browse order, keyset-paginated on seq.
pub async fn browse_page(
    db: &PgPool,
    last_seq: Option<i64>,
    limit: i64,
) -> anyhow::Result<Vec<Product>> {
    let rows = sqlx::query_as::<_, Product>(&format!(
        r#"
        SELECT {COLUMNS}
        FROM product
        WHERE ($1::BIGINT IS NULL OR seq < $1)
        ORDER BY seq DESC
        LIMIT $2
        "#
    ))
    .bind(last_seq)
    .bind(limit)
    .fetch_all(db)
    .await
    .context("browse products")?;
    Ok(rows)
}

/// Search-ranked name query; rank order has no stable key, so pages advance
/// by offset carried in the cursor.
pub async fn search_page(
    db: &PgPool,
    name_filter: &str,
    offset: i64,
    limit: i64,
) -> anyhow::Result<Vec<Product>> {
    let rows = sqlx::query_as::<_, Product>(&format!(
        r#"
        SELECT {COLUMNS}
        FROM product
        WHERE to_tsvector('simple', name) @@ plainto_tsquery('simple', $1)
        ORDER BY ts_rank(to_tsvector('simple', name), plainto_tsquery('simple', $1)) DESC,
                 seq DESC
        OFFSET $2 LIMIT $3
        "#
    ))
    .bind(name_filter)
    .bind(offset)
    .bind(limit)
    .fetch_all(db)
    .await
    .context("search products")?;
    Ok(rows)
}

pub async fn update_fields(
    db: &PgPool,
    id: Uuid,
    name: &str,
    macros: &Macronutrients,
    image_key: Option<&str>,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        UPDATE product
        SET name = $2, calories = $3, protein = $4, carbs = $5, fat = $6, image_key = $7
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(name)
    .bind(macros.calories)
    .bind(macros.protein)
    .bind(macros.carbs)
    .bind(macros.fat)
    .bind(image_key)
    .execute(db)
    .await
    .context("update product")?;
    Ok(())
}

pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<()> {
    sqlx::query("DELETE FROM product WHERE id = $1")
        .bind(id)
        .execute(db)
        .await
        .context("delete product")?;
    Ok(())
}
