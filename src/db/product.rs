use serde::Deserialize;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::{debug, instrument};

use super::core::Database;
use crate::catalog::types::{Product, ProductKind, SortKey};
use crate::util::now_timestamp;
use crate::TARGET_DB;

/// Filter/sort/range parameters for a product listing fetch. Name search
/// is not a fetch parameter: it happens in `catalog::filter` over the
/// fetched page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductQuery {
    pub brand: Option<String>,
    pub sort: Option<SortKey>,
    pub offset: Option<i64>,
    pub limit: Option<i64>,
}

/// Writable product fields, shared by insert and update. Variant-specific
/// fields are ignored for the other kind.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductDraft {
    pub name: String,
    pub brand: String,
    pub model_name: Option<String>,
    pub price: i64,
    pub display_specs: String,
    pub processor: String,
    pub ram: String,
    pub storage: String,
    pub battery: String,
    pub os: Option<String>,
    pub color: Option<String>,
    pub camera: Option<String>,
    pub chipset: Option<String>,
    pub graphics: Option<String>,
    pub ports: Option<String>,
    pub image_url: Option<String>,
    #[serde(default)]
    pub gallery_images: Vec<String>,
}

fn variant_columns(kind: ProductKind) -> (&'static str, &'static str) {
    match kind {
        ProductKind::Mobile => ("camera", "chipset"),
        ProductKind::Laptop => ("graphics", "ports"),
    }
}

fn select_columns(kind: ProductKind) -> String {
    let (a, b) = variant_columns(kind);
    format!(
        "id, name, brand, model_name, price, display_specs, processor, ram, storage, battery, \
         os, color, {}, {}, image_url, gallery_images, created_at, updated_at",
        a, b
    )
}

fn product_from_row(kind: ProductKind, row: &SqliteRow) -> Product {
    let (a, b) = variant_columns(kind);
    let gallery_json: Option<String> = row.get("gallery_images");
    let gallery_images = gallery_json
        .as_deref()
        .and_then(|json| serde_json::from_str(json).ok())
        .unwrap_or_default();
    let (camera, chipset, graphics, ports) = match kind {
        ProductKind::Mobile => (row.get(a), row.get(b), None, None),
        ProductKind::Laptop => (None, None, row.get(a), row.get(b)),
    };
    Product {
        id: row.get("id"),
        kind,
        name: row.get("name"),
        brand: row.get("brand"),
        model_name: row.get("model_name"),
        price: row.get("price"),
        display_specs: row.get("display_specs"),
        processor: row.get("processor"),
        ram: row.get("ram"),
        storage: row.get("storage"),
        battery: row.get("battery"),
        os: row.get("os"),
        color: row.get("color"),
        camera,
        chipset,
        graphics,
        ports,
        image_url: row.get("image_url"),
        gallery_images,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

impl Database {
    /// Lists products of one kind. Default order is recency; price sorts
    /// are applied in SQL so ranges stay consistent across pages.
    #[instrument(target = "db_query", level = "info", skip(self))]
    pub async fn list_products(
        &self,
        kind: ProductKind,
        query: &ProductQuery,
    ) -> Result<Vec<Product>, sqlx::Error> {
        let mut sql = format!(
            "SELECT {} FROM {} WHERE 1=1",
            select_columns(kind),
            kind.table()
        );
        if query.brand.is_some() {
            sql.push_str(" AND brand = ?");
        }
        match query.sort.unwrap_or(SortKey::Default) {
            SortKey::Default => sql.push_str(" ORDER BY created_at DESC"),
            SortKey::PriceLowHigh => sql.push_str(" ORDER BY price ASC, created_at DESC"),
            SortKey::PriceHighLow => sql.push_str(" ORDER BY price DESC, created_at DESC"),
        }
        if query.limit.is_some() {
            sql.push_str(" LIMIT ?");
        } else if query.offset.is_some() {
            // OFFSET is only valid after a LIMIT clause.
            sql.push_str(" LIMIT -1");
        }
        if query.offset.is_some() {
            sql.push_str(" OFFSET ?");
        }

        let mut q = sqlx::query(&sql);
        if let Some(brand) = &query.brand {
            q = q.bind(brand);
        }
        if let Some(limit) = query.limit {
            q = q.bind(limit);
        }
        if let Some(offset) = query.offset {
            q = q.bind(offset);
        }

        let rows = q.fetch_all(self.pool()).await?;
        Ok(rows.iter().map(|row| product_from_row(kind, row)).collect())
    }

    #[instrument(target = "db_query", level = "info", skip(self))]
    pub async fn get_product(
        &self,
        kind: ProductKind,
        product_id: i64,
    ) -> Result<Option<Product>, sqlx::Error> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM {} WHERE id = ?",
            select_columns(kind),
            kind.table()
        ))
        .bind(product_id)
        .fetch_optional(self.pool())
        .await?;

        Ok(row.as_ref().map(|row| product_from_row(kind, row)))
    }

    /// The variant family of a product: rows sharing (name, brand), which
    /// differ by storage/color/price. Returned in fetch order; display
    /// ordering is `catalog::filter::sort_products`.
    #[instrument(target = "db_query", level = "info", skip(self))]
    pub async fn list_variants(
        &self,
        kind: ProductKind,
        name: &str,
        brand: &str,
    ) -> Result<Vec<Product>, sqlx::Error> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM {} WHERE name = ? AND brand = ? ORDER BY created_at DESC",
            select_columns(kind),
            kind.table()
        ))
        .bind(name)
        .bind(brand)
        .fetch_all(self.pool())
        .await?;

        Ok(rows.iter().map(|row| product_from_row(kind, row)).collect())
    }

    #[instrument(target = "db_query", level = "info", skip(self, draft))]
    pub async fn insert_product(
        &self,
        kind: ProductKind,
        draft: &ProductDraft,
    ) -> Result<i64, sqlx::Error> {
        let (a, b) = variant_columns(kind);
        let (va, vb) = match kind {
            ProductKind::Mobile => (&draft.camera, &draft.chipset),
            ProductKind::Laptop => (&draft.graphics, &draft.ports),
        };
        let now = now_timestamp();
        let gallery = serde_json::to_string(&draft.gallery_images)
            .unwrap_or_else(|_| "[]".to_string());
        debug!(target: TARGET_DB, "Adding {} product: {}", kind.as_str(), draft.name);

        let (id,): (i64,) = sqlx::query_as(&format!(
            r#"
            INSERT INTO {} (name, brand, model_name, price, display_specs, processor, ram,
                storage, battery, os, color, {}, {}, image_url, gallery_images, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)
            RETURNING id
            "#,
            kind.table(),
            a,
            b
        ))
        .bind(&draft.name)
        .bind(&draft.brand)
        .bind(&draft.model_name)
        .bind(draft.price)
        .bind(&draft.display_specs)
        .bind(&draft.processor)
        .bind(&draft.ram)
        .bind(&draft.storage)
        .bind(&draft.battery)
        .bind(&draft.os)
        .bind(&draft.color)
        .bind(va)
        .bind(vb)
        .bind(&draft.image_url)
        .bind(&gallery)
        .bind(&now)
        .bind(&now)
        .fetch_one(self.pool())
        .await?;

        Ok(id)
    }

    #[instrument(target = "db_query", level = "info", skip(self, draft))]
    pub async fn update_product(
        &self,
        kind: ProductKind,
        product_id: i64,
        draft: &ProductDraft,
    ) -> Result<(), sqlx::Error> {
        let (a, b) = variant_columns(kind);
        let (va, vb) = match kind {
            ProductKind::Mobile => (&draft.camera, &draft.chipset),
            ProductKind::Laptop => (&draft.graphics, &draft.ports),
        };
        let gallery = serde_json::to_string(&draft.gallery_images)
            .unwrap_or_else(|_| "[]".to_string());

        let result = sqlx::query(&format!(
            r#"
            UPDATE {}
            SET name = ?1, brand = ?2, model_name = ?3, price = ?4, display_specs = ?5,
                processor = ?6, ram = ?7, storage = ?8, battery = ?9, os = ?10, color = ?11,
                {} = ?12, {} = ?13, image_url = ?14, gallery_images = ?15, updated_at = ?16
            WHERE id = ?17
            "#,
            kind.table(),
            a,
            b
        ))
        .bind(&draft.name)
        .bind(&draft.brand)
        .bind(&draft.model_name)
        .bind(draft.price)
        .bind(&draft.display_specs)
        .bind(&draft.processor)
        .bind(&draft.ram)
        .bind(&draft.storage)
        .bind(&draft.battery)
        .bind(&draft.os)
        .bind(&draft.color)
        .bind(va)
        .bind(vb)
        .bind(&draft.image_url)
        .bind(&gallery)
        .bind(now_timestamp())
        .bind(product_id)
        .execute(self.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }
        Ok(())
    }

    #[instrument(target = "db_query", level = "info", skip(self))]
    pub async fn delete_product(
        &self,
        kind: ProductKind,
        product_id: i64,
    ) -> Result<(), sqlx::Error> {
        let result = sqlx::query(&format!("DELETE FROM {} WHERE id = ?", kind.table()))
            .bind(product_id)
            .execute(self.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phone(name: &str, brand: &str, price: i64, storage: &str) -> ProductDraft {
        ProductDraft {
            name: name.to_string(),
            brand: brand.to_string(),
            model_name: Some(name.to_string()),
            price,
            display_specs: "6.1\" OLED".to_string(),
            processor: "Octa-core".to_string(),
            ram: "8GB".to_string(),
            storage: storage.to_string(),
            battery: "4500mAh".to_string(),
            camera: Some("50MP".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn insert_and_get_round_trips_variant_fields() {
        let db = Database::new_in_memory().await.unwrap();
        let id = db
            .insert_product(ProductKind::Mobile, &phone("Pixel 9", "Google", 65000, "128GB"))
            .await
            .unwrap();

        let product = db
            .get_product(ProductKind::Mobile, id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(product.kind, ProductKind::Mobile);
        assert_eq!(product.camera.as_deref(), Some("50MP"));
        assert!(product.graphics.is_none());
        assert!(product.gallery_images.is_empty());
    }

    #[tokio::test]
    async fn price_sort_orders_listing() {
        let db = Database::new_in_memory().await.unwrap();
        db.insert_product(ProductKind::Mobile, &phone("A", "Acme", 30000, "128GB"))
            .await
            .unwrap();
        db.insert_product(ProductKind::Mobile, &phone("B", "Acme", 10000, "128GB"))
            .await
            .unwrap();
        db.insert_product(ProductKind::Mobile, &phone("C", "Acme", 20000, "128GB"))
            .await
            .unwrap();

        let products = db
            .list_products(
                ProductKind::Mobile,
                &ProductQuery {
                    sort: Some(SortKey::PriceLowHigh),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let prices: Vec<i64> = products.iter().map(|p| p.price).collect();
        assert_eq!(prices, vec![10000, 20000, 30000]);
    }

    #[tokio::test]
    async fn variant_family_groups_by_name_and_brand() {
        let db = Database::new_in_memory().await.unwrap();
        db.insert_product(ProductKind::Mobile, &phone("Pixel 9", "Google", 65000, "128GB"))
            .await
            .unwrap();
        db.insert_product(ProductKind::Mobile, &phone("Pixel 9", "Google", 75000, "256GB"))
            .await
            .unwrap();
        db.insert_product(ProductKind::Mobile, &phone("Pixel 9a", "Google", 45000, "128GB"))
            .await
            .unwrap();

        let family = db
            .list_variants(ProductKind::Mobile, "Pixel 9", "Google")
            .await
            .unwrap();
        assert_eq!(family.len(), 2);
        assert!(family.iter().all(|p| p.name == "Pixel 9"));
    }

    #[tokio::test]
    async fn range_pages_do_not_overlap() {
        let db = Database::new_in_memory().await.unwrap();
        for i in 0..10 {
            db.insert_product(
                ProductKind::Laptop,
                &ProductDraft {
                    name: format!("Book {}", i),
                    brand: "Acme".to_string(),
                    price: 50000 + i,
                    display_specs: "14\"".to_string(),
                    processor: "M".to_string(),
                    ram: "16GB".to_string(),
                    storage: "512GB".to_string(),
                    battery: "70Wh".to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        }

        let first = db
            .list_products(
                ProductKind::Laptop,
                &ProductQuery {
                    sort: Some(SortKey::PriceLowHigh),
                    offset: Some(0),
                    limit: Some(4),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let second = db
            .list_products(
                ProductKind::Laptop,
                &ProductQuery {
                    sort: Some(SortKey::PriceLowHigh),
                    offset: Some(4),
                    limit: Some(4),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(first.len(), 4);
        assert_eq!(second.len(), 4);
        let first_ids: Vec<i64> = first.iter().map(|p| p.id).collect();
        assert!(second.iter().all(|p| !first_ids.contains(&p.id)));
    }
}
