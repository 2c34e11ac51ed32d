use serde::Deserialize;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::instrument;

use super::core::Database;
use crate::catalog::types::{ExpertReview, UserReview};
use crate::util::now_timestamp;

/// Writable expert review fields.
#[derive(Debug, Clone, Deserialize)]
pub struct ExpertReviewDraft {
    pub rating: f64,
    pub author: String,
    pub summary: String,
    #[serde(default)]
    pub pros: Vec<String>,
    #[serde(default)]
    pub cons: Vec<String>,
    pub verdict: String,
}

fn expert_review_from_row(row: &SqliteRow) -> ExpertReview {
    let pros: String = row.get("pros");
    let cons: String = row.get("cons");
    ExpertReview {
        id: row.get("id"),
        product_id: row.get("product_id"),
        rating: row.get("rating"),
        author: row.get("author"),
        summary: row.get("summary"),
        pros: serde_json::from_str(&pros).unwrap_or_default(),
        cons: serde_json::from_str(&cons).unwrap_or_default(),
        verdict: row.get("verdict"),
        created_at: row.get("created_at"),
    }
}

fn user_review_from_row(row: &SqliteRow) -> UserReview {
    UserReview {
        id: row.get("id"),
        product_id: row.get("product_id"),
        rating: row.get("rating"),
        user_name: row.get("user_name"),
        review_text: row.get("review_text"),
        created_at: row.get("created_at"),
    }
}

impl Database {
    /// The expert review for a product. One-per-product is a query
    /// pattern, not a constraint: the latest row wins.
    #[instrument(target = "db_query", level = "info", skip(self))]
    pub async fn get_expert_review(
        &self,
        product_id: i64,
    ) -> Result<Option<ExpertReview>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT id, product_id, rating, author, summary, pros, cons, verdict, created_at
            FROM expert_reviews WHERE product_id = ?
            ORDER BY created_at DESC LIMIT 1
            "#,
        )
        .bind(product_id)
        .fetch_optional(self.pool())
        .await?;

        Ok(row.as_ref().map(expert_review_from_row))
    }

    /// Replaces the expert review for a product: earlier rows for the same
    /// product are dropped so the query pattern stays one-to-one. The
    /// delete and insert run in one transaction, so a failed replacement
    /// leaves the existing review in place.
    #[instrument(target = "db_query", level = "info", skip(self, draft))]
    pub async fn upsert_expert_review(
        &self,
        product_id: i64,
        draft: &ExpertReviewDraft,
    ) -> Result<i64, sqlx::Error> {
        let pros = serde_json::to_string(&draft.pros).unwrap_or_else(|_| "[]".to_string());
        let cons = serde_json::to_string(&draft.cons).unwrap_or_else(|_| "[]".to_string());

        let mut tx = self.pool().begin().await?;

        sqlx::query("DELETE FROM expert_reviews WHERE product_id = ?")
            .bind(product_id)
            .execute(&mut *tx)
            .await?;

        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO expert_reviews (product_id, rating, author, summary, pros, cons, verdict, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            RETURNING id
            "#,
        )
        .bind(product_id)
        .bind(draft.rating)
        .bind(&draft.author)
        .bind(&draft.summary)
        .bind(&pros)
        .bind(&cons)
        .bind(&draft.verdict)
        .bind(now_timestamp())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(id)
    }

    #[instrument(target = "db_query", level = "info", skip(self))]
    pub async fn list_user_reviews(
        &self,
        product_id: i64,
    ) -> Result<Vec<UserReview>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT id, product_id, rating, user_name, review_text, created_at
            FROM product_reviews WHERE product_id = ?
            ORDER BY created_at DESC
            "#,
        )
        .bind(product_id)
        .fetch_all(self.pool())
        .await?;

        Ok(rows.iter().map(user_review_from_row).collect())
    }

    pub(crate) async fn insert_user_review(
        &self,
        product_id: i64,
        rating: i64,
        user_name: &str,
        review_text: &str,
    ) -> Result<i64, sqlx::Error> {
        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO product_reviews (product_id, rating, user_name, review_text, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            RETURNING id
            "#,
        )
        .bind(product_id)
        .bind(rating)
        .bind(user_name)
        .bind(review_text)
        .bind(now_timestamp())
        .fetch_one(self.pool())
        .await?;

        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review(author: &str, rating: f64) -> ExpertReviewDraft {
        ExpertReviewDraft {
            rating,
            author: author.to_string(),
            summary: "Solid all-rounder".to_string(),
            pros: vec!["Battery life".to_string(), "Display".to_string()],
            cons: vec!["Price".to_string()],
            verdict: "Recommended".to_string(),
        }
    }

    #[tokio::test]
    async fn expert_review_round_trips_pros_and_cons() {
        let db = Database::new_in_memory().await.unwrap();
        db.upsert_expert_review(42, &review("Jane", 8.5)).await.unwrap();

        let fetched = db.get_expert_review(42).await.unwrap().unwrap();
        assert_eq!(fetched.rating, 8.5);
        assert_eq!(fetched.pros.len(), 2);
        assert_eq!(fetched.cons, vec!["Price"]);
    }

    #[tokio::test]
    async fn upsert_replaces_the_previous_review() {
        let db = Database::new_in_memory().await.unwrap();
        db.upsert_expert_review(42, &review("Jane", 8.5)).await.unwrap();
        db.upsert_expert_review(42, &review("Raj", 7.0)).await.unwrap();

        let fetched = db.get_expert_review(42).await.unwrap().unwrap();
        assert_eq!(fetched.author, "Raj");

        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM expert_reviews WHERE product_id = 42")
                .fetch_one(db.pool())
                .await
                .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn failed_replacement_keeps_the_existing_review() {
        let db = Database::new_in_memory().await.unwrap();
        db.upsert_expert_review(42, &review("Jane", 8.5)).await.unwrap();

        // Violates the 0-10 rating CHECK, so the insert fails after the
        // delete; the transaction must roll both back.
        assert!(db.upsert_expert_review(42, &review("Raj", 20.0)).await.is_err());

        let fetched = db.get_expert_review(42).await.unwrap().unwrap();
        assert_eq!(fetched.author, "Jane");
        assert_eq!(fetched.rating, 8.5);
    }

    #[tokio::test]
    async fn missing_expert_review_is_none() {
        let db = Database::new_in_memory().await.unwrap();
        assert!(db.get_expert_review(7).await.unwrap().is_none());
    }
}
