use serde::Serialize;
use tracing::{instrument, warn};

use super::core::Database;
use crate::catalog::rating::RatingStats;
use crate::util::now_timestamp;
use crate::TARGET_DB;

/// Outcome of a rating submission. The rating and the optional review are
/// two independent inserts: a review failure after the rating landed is
/// reported here rather than rolled back.
#[derive(Debug, Clone, Serialize)]
pub struct RatingSubmission {
    pub rating_recorded: bool,
    pub review_recorded: bool,
}

impl Database {
    pub(crate) async fn insert_rating(
        &self,
        product_id: i64,
        stars: i64,
    ) -> Result<i64, sqlx::Error> {
        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO product_ratings (product_id, rating, created_at)
            VALUES (?1, ?2, ?3)
            RETURNING id
            "#,
        )
        .bind(product_id)
        .bind(stars)
        .bind(now_timestamp())
        .fetch_one(self.pool())
        .await?;

        Ok(id)
    }

    /// Aggregate star ratings for a product. The distribution is ordered
    /// five-star first, matching how the breakdown is displayed.
    #[instrument(target = "db_query", level = "info", skip(self))]
    pub async fn product_rating_stats(
        &self,
        product_id: i64,
    ) -> Result<RatingStats, sqlx::Error> {
        let ratings: Vec<i64> =
            sqlx::query_scalar("SELECT rating FROM product_ratings WHERE product_id = ?")
                .bind(product_id)
                .fetch_all(self.pool())
                .await?;

        Ok(RatingStats::from_ratings(&ratings))
    }

    /// Records a star rating and, when review text is present, a user review.
    /// The rating insert must succeed; a review insert failure afterwards
    /// keeps the rating and reports the partial outcome.
    #[instrument(target = "db_query", level = "info", skip(self, review_text))]
    pub async fn submit_rating(
        &self,
        product_id: i64,
        stars: i64,
        user_name: &str,
        review_text: Option<&str>,
    ) -> Result<RatingSubmission, sqlx::Error> {
        self.insert_rating(product_id, stars).await?;

        let text = review_text.map(str::trim).filter(|t| !t.is_empty());
        let review_recorded = match text {
            Some(text) => match self.insert_user_review(product_id, stars, user_name, text).await {
                Ok(_) => true,
                Err(e) => {
                    warn!(
                        target: TARGET_DB,
                        "Rating recorded but review insert failed for product {}: {}",
                        product_id, e
                    );
                    false
                }
            },
            None => false,
        };

        Ok(RatingSubmission {
            rating_recorded: true,
            review_recorded,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rating_without_text_creates_no_review() {
        let db = Database::new_in_memory().await.unwrap();
        let outcome = db.submit_rating(1, 4, "sam", None).await.unwrap();
        assert!(outcome.rating_recorded);
        assert!(!outcome.review_recorded);

        let reviews = db.list_user_reviews(1).await.unwrap();
        assert!(reviews.is_empty());

        let stats = db.product_rating_stats(1).await.unwrap();
        assert_eq!(stats.total_ratings, 1);
    }

    #[tokio::test]
    async fn rating_with_text_creates_both_rows() {
        let db = Database::new_in_memory().await.unwrap();
        let outcome = db
            .submit_rating(1, 5, "sam", Some("Great phone"))
            .await
            .unwrap();
        assert!(outcome.rating_recorded);
        assert!(outcome.review_recorded);

        let reviews = db.list_user_reviews(1).await.unwrap();
        assert_eq!(reviews.len(), 1);
        assert_eq!(reviews[0].review_text, "Great phone");
        assert_eq!(reviews[0].rating, 5);
    }

    #[tokio::test]
    async fn blank_review_text_is_treated_as_absent() {
        let db = Database::new_in_memory().await.unwrap();
        let outcome = db.submit_rating(1, 3, "sam", Some("   ")).await.unwrap();
        assert!(!outcome.review_recorded);
        assert!(db.list_user_reviews(1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn stats_aggregate_across_submissions() {
        let db = Database::new_in_memory().await.unwrap();
        for stars in [5, 5, 4, 1] {
            db.submit_rating(9, stars, "anon", None).await.unwrap();
        }
        db.submit_rating(8, 2, "anon", None).await.unwrap();

        let stats = db.product_rating_stats(9).await.unwrap();
        assert_eq!(stats.total_ratings, 4);
        assert_eq!(stats.rating_distribution, [2, 1, 0, 0, 1]);
        assert!((stats.average_rating - 3.8).abs() < 1e-9);
    }

    #[tokio::test]
    async fn unrated_product_has_empty_stats() {
        let db = Database::new_in_memory().await.unwrap();
        let stats = db.product_rating_stats(123).await.unwrap();
        assert_eq!(stats.total_ratings, 0);
        assert_eq!(stats.average_rating, 0.0);
        assert_eq!(stats.rating_distribution, [0, 0, 0, 0, 0]);
    }
}
