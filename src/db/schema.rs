use tracing::info;

use super::core::Database;
use crate::TARGET_DB;

impl Database {
    pub(crate) async fn initialize_schema(&self) -> Result<(), sqlx::Error> {
        let mut conn = self.pool().acquire().await?;
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS blogs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                slug TEXT NOT NULL UNIQUE,
                title TEXT NOT NULL,
                content TEXT NOT NULL,
                category TEXT NOT NULL,
                subcategory TEXT,
                author TEXT NOT NULL,
                image_url TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                view_count INTEGER NOT NULL DEFAULT 0,
                featured BOOLEAN NOT NULL DEFAULT 0,
                featured_in_category BOOLEAN NOT NULL DEFAULT 0,
                popular BOOLEAN NOT NULL DEFAULT 0,
                popular_in_games BOOLEAN NOT NULL DEFAULT 0,
                popular_in_tech BOOLEAN NOT NULL DEFAULT 0,
                popular_in_entertainment BOOLEAN NOT NULL DEFAULT 0,
                popular_in_gadgets BOOLEAN NOT NULL DEFAULT 0,
                popular_in_stocks BOOLEAN NOT NULL DEFAULT 0
            );
            CREATE INDEX IF NOT EXISTS idx_blogs_category ON blogs (category, created_at);
            CREATE INDEX IF NOT EXISTS idx_blogs_featured ON blogs (featured);
            CREATE INDEX IF NOT EXISTS idx_blogs_featured_in_category ON blogs (category, featured_in_category);
            CREATE INDEX IF NOT EXISTS idx_blogs_created_at ON blogs (created_at);

            CREATE TABLE IF NOT EXISTS mobile_products (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                brand TEXT NOT NULL,
                model_name TEXT,
                price INTEGER NOT NULL CHECK (price >= 0),
                display_specs TEXT NOT NULL,
                processor TEXT NOT NULL,
                ram TEXT NOT NULL,
                storage TEXT NOT NULL,
                battery TEXT NOT NULL,
                os TEXT,
                color TEXT,
                camera TEXT,
                chipset TEXT,
                image_url TEXT,
                gallery_images TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_mobile_products_created_at ON mobile_products (created_at);
            CREATE INDEX IF NOT EXISTS idx_mobile_products_brand ON mobile_products (brand);
            CREATE INDEX IF NOT EXISTS idx_mobile_products_family ON mobile_products (name, brand);

            CREATE TABLE IF NOT EXISTS laptops (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                brand TEXT NOT NULL,
                model_name TEXT,
                price INTEGER NOT NULL CHECK (price >= 0),
                display_specs TEXT NOT NULL,
                processor TEXT NOT NULL,
                ram TEXT NOT NULL,
                storage TEXT NOT NULL,
                battery TEXT NOT NULL,
                os TEXT,
                color TEXT,
                graphics TEXT,
                ports TEXT,
                image_url TEXT,
                gallery_images TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_laptops_created_at ON laptops (created_at);
            CREATE INDEX IF NOT EXISTS idx_laptops_brand ON laptops (brand);
            CREATE INDEX IF NOT EXISTS idx_laptops_family ON laptops (name, brand);

            CREATE TABLE IF NOT EXISTS expert_reviews (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                product_id INTEGER NOT NULL,
                rating REAL NOT NULL CHECK (rating >= 0 AND rating <= 10),
                author TEXT NOT NULL,
                summary TEXT NOT NULL,
                pros TEXT NOT NULL,
                cons TEXT NOT NULL,
                verdict TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_expert_reviews_product_id ON expert_reviews (product_id);

            CREATE TABLE IF NOT EXISTS product_ratings (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                product_id INTEGER NOT NULL,
                rating INTEGER NOT NULL CHECK (rating >= 1 AND rating <= 5),
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_product_ratings_product_id ON product_ratings (product_id);

            CREATE TABLE IF NOT EXISTS product_reviews (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                product_id INTEGER NOT NULL,
                rating INTEGER NOT NULL,
                user_name TEXT NOT NULL,
                review_text TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_product_reviews_product_id ON product_reviews (product_id, created_at);
            "#,
        )
        .execute(&mut *conn)
        .await?;

        info!(target: TARGET_DB, "Database schema initialized");
        Ok(())
    }
}
