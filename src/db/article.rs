use rand::Rng;
use serde::Deserialize;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tokio::time::{sleep, Duration};
use tracing::{debug, error, info, instrument};

use super::core::{Database, DbLockErrorExt};
use crate::catalog::filter::PopularScope;
use crate::catalog::types::{Article, Category};
use crate::util::{now_timestamp, slugify};
use crate::TARGET_DB;

const ARTICLE_COLUMNS: &str = "id, slug, title, content, category, subcategory, author, \
     image_url, created_at, updated_at, view_count, featured, featured_in_category, popular, \
     popular_in_games, popular_in_tech, popular_in_entertainment, popular_in_gadgets, \
     popular_in_stocks";

/// Filter/range parameters for a blogs listing fetch. Results are always
/// ordered by recency. Subcategory selection is not a fetch parameter:
/// it happens in `catalog::filter` over the fetched page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArticleQuery {
    pub category: Option<Category>,
    pub featured: Option<bool>,
    pub featured_in_category: Option<bool>,
    pub popular: Option<PopularScope>,
    pub search: Option<String>,
    pub offset: Option<i64>,
    pub limit: Option<i64>,
}

/// Maximum number of globally featured articles.
pub const MAX_FEATURED: i64 = 6;
/// Maximum number of featured articles per category page.
pub const MAX_FEATURED_PER_CATEGORY: i64 = 7;

/// Outcome of a guarded featured toggle. The capacity check is
/// count-then-write: two concurrent writers can race past it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Applied,
    CapacityFull { limit: i64 },
}

/// Writable article fields, shared by insert and update.
#[derive(Debug, Clone, Deserialize)]
pub struct ArticleDraft {
    pub title: String,
    pub content: String,
    pub category: Category,
    pub subcategory: Option<String>,
    pub author: String,
    pub image_url: Option<String>,
}

fn article_from_row(row: &SqliteRow) -> Article {
    Article {
        id: row.get("id"),
        slug: row.get("slug"),
        title: row.get("title"),
        content: row.get("content"),
        category: row.get("category"),
        subcategory: row.get("subcategory"),
        author: row.get("author"),
        image_url: row.get("image_url"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        view_count: row.get("view_count"),
        featured: row.get("featured"),
        featured_in_category: row.get("featured_in_category"),
        popular: row.get("popular"),
        popular_in_games: row.get("popular_in_games"),
        popular_in_tech: row.get("popular_in_tech"),
        popular_in_entertainment: row.get("popular_in_entertainment"),
        popular_in_gadgets: row.get("popular_in_gadgets"),
        popular_in_stocks: row.get("popular_in_stocks"),
    }
}

impl Database {
    /// Lists articles matching the query, newest first.
    #[instrument(target = "db_query", level = "info", skip(self))]
    pub async fn list_articles(&self, query: &ArticleQuery) -> Result<Vec<Article>, sqlx::Error> {
        let mut sql = format!("SELECT {} FROM blogs WHERE 1=1", ARTICLE_COLUMNS);
        if query.category.is_some() {
            sql.push_str(" AND category = ?");
        }
        if query.featured.is_some() {
            sql.push_str(" AND featured = ?");
        }
        if query.featured_in_category.is_some() {
            sql.push_str(" AND featured_in_category = ?");
        }
        match query.popular {
            // The flag column comes from the explicit per-category table,
            // never from user input.
            Some(PopularScope::Home) => sql.push_str(" AND popular = 1"),
            Some(PopularScope::Category(category)) => {
                sql.push_str(&format!(" AND {} = 1", category.popular_flag_column()));
            }
            None => {}
        }
        if query.search.is_some() {
            sql.push_str(" AND title LIKE ?");
        }
        sql.push_str(" ORDER BY created_at DESC");
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
        if let Some(category) = query.category {
            q = q.bind(category.as_str());
        }
        if let Some(featured) = query.featured {
            q = q.bind(featured);
        }
        if let Some(featured_in_category) = query.featured_in_category {
            q = q.bind(featured_in_category);
        }
        if let Some(search) = &query.search {
            q = q.bind(format!("%{}%", search));
        }
        if let Some(limit) = query.limit {
            q = q.bind(limit);
        }
        if let Some(offset) = query.offset {
            q = q.bind(offset);
        }

        let rows = q.fetch_all(self.pool()).await?;
        Ok(rows.iter().map(article_from_row).collect())
    }

    #[instrument(target = "db_query", level = "info", skip(self))]
    pub async fn get_article_by_slug(&self, slug: &str) -> Result<Option<Article>, sqlx::Error> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM blogs WHERE slug = ?",
            ARTICLE_COLUMNS
        ))
        .bind(slug)
        .fetch_optional(self.pool())
        .await?;

        Ok(row.as_ref().map(article_from_row))
    }

    #[instrument(target = "db_query", level = "info", skip(self))]
    pub async fn get_article(&self, article_id: i64) -> Result<Option<Article>, sqlx::Error> {
        let row = sqlx::query(&format!("SELECT {} FROM blogs WHERE id = ?", ARTICLE_COLUMNS))
            .bind(article_id)
            .fetch_optional(self.pool())
            .await?;

        Ok(row.as_ref().map(article_from_row))
    }

    /// Bumps the article view counter. At-least-once: a retried page load
    /// counts again, duplicates are accepted.
    #[instrument(target = "db_query", level = "info", skip(self))]
    pub async fn increment_view_count(&self, article_id: i64) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE blogs SET view_count = view_count + 1 WHERE id = ?")
            .bind(article_id)
            .execute(self.pool())
            .await?;
        Ok(())
    }

    /// Inserts an article, retrying with exponential backoff when the
    /// database is locked. Returns the new row id.
    #[instrument(target = "db_query", level = "info", skip(self, draft))]
    pub async fn insert_article(&self, draft: &ArticleDraft) -> Result<i64, sqlx::Error> {
        let slug = slugify(&draft.title);
        let now = now_timestamp();
        debug!(target: TARGET_DB, "Adding article: {}", slug);

        let mut backoff = 100; // initial delay in milliseconds
        let max_retries = 5;

        for attempt in 1..=max_retries {
            match sqlx::query_as::<_, (i64,)>(
                r#"
                INSERT INTO blogs (slug, title, content, category, subcategory, author, image_url, created_at, updated_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                RETURNING id
                "#,
            )
            .bind(&slug)
            .bind(&draft.title)
            .bind(&draft.content)
            .bind(draft.category.as_str())
            .bind(&draft.subcategory)
            .bind(&draft.author)
            .bind(&draft.image_url)
            .bind(&now)
            .bind(&now)
            .fetch_one(self.pool())
            .await
            {
                Ok((id,)) => {
                    debug!(target: TARGET_DB, "Article added: {} with id {}", slug, id);
                    return Ok(id);
                }
                Err(err) => {
                    if err.is_database_lock_error() {
                        info!(target: TARGET_DB, "Database is locked, waiting {}ms before retrying attempt {}/{}: {}", backoff, attempt, max_retries, slug);
                        sleep(Duration::from_millis(backoff)).await;
                        backoff = backoff.saturating_mul(2); // exponential backoff
                        if attempt == max_retries {
                            // Randomness to avoid the "thundering herd problem"
                            let random_jitter = rand::rng().random_range(0..200);
                            backoff += random_jitter;
                            sleep(Duration::from_millis(backoff)).await;
                        }
                    } else {
                        error!(target: TARGET_DB, "Failed to add article: {}", err);
                        return Err(err);
                    }
                }
            }
        }

        Err(sqlx::Error::Protocol(
            "Maximum retries exceeded for adding article".into(),
        ))
    }

    #[instrument(target = "db_query", level = "info", skip(self, draft))]
    pub async fn update_article(
        &self,
        article_id: i64,
        draft: &ArticleDraft,
    ) -> Result<(), sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE blogs
            SET title = ?1, content = ?2, category = ?3, subcategory = ?4,
                author = ?5, image_url = ?6, updated_at = ?7
            WHERE id = ?8
            "#,
        )
        .bind(&draft.title)
        .bind(&draft.content)
        .bind(draft.category.as_str())
        .bind(&draft.subcategory)
        .bind(&draft.author)
        .bind(&draft.image_url)
        .bind(now_timestamp())
        .bind(article_id)
        .execute(self.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }
        Ok(())
    }

    #[instrument(target = "db_query", level = "info", skip(self))]
    pub async fn delete_article(&self, article_id: i64) -> Result<(), sqlx::Error> {
        let result = sqlx::query("DELETE FROM blogs WHERE id = ?")
            .bind(article_id)
            .execute(self.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }
        Ok(())
    }

    /// Count of articles featured on the home page. Callers check this
    /// against the slot limit before toggling; the check is advisory and
    /// two concurrent writers can race past it.
    pub async fn count_featured(&self) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM blogs WHERE featured = 1")
            .fetch_one(self.pool())
            .await
    }

    pub async fn count_featured_in_category(
        &self,
        category: Category,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM blogs WHERE category = ? AND featured_in_category = 1",
        )
        .bind(category.as_str())
        .fetch_one(self.pool())
        .await
    }

    #[instrument(target = "db_query", level = "info", skip(self))]
    pub async fn set_featured(&self, article_id: i64, value: bool) -> Result<(), sqlx::Error> {
        let result = sqlx::query("UPDATE blogs SET featured = ? WHERE id = ?")
            .bind(value)
            .bind(article_id)
            .execute(self.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }
        Ok(())
    }

    #[instrument(target = "db_query", level = "info", skip(self))]
    pub async fn set_featured_in_category(
        &self,
        article_id: i64,
        value: bool,
    ) -> Result<(), sqlx::Error> {
        let result = sqlx::query("UPDATE blogs SET featured_in_category = ? WHERE id = ?")
            .bind(value)
            .bind(article_id)
            .execute(self.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }
        Ok(())
    }

    /// Toggles the global featured flag, refusing to fill a seventh slot.
    /// The count-then-write check is advisory, not serialized.
    #[instrument(target = "db_query", level = "info", skip(self))]
    pub async fn set_featured_guarded(
        &self,
        article_id: i64,
        value: bool,
    ) -> Result<ToggleOutcome, sqlx::Error> {
        if value && self.count_featured().await? >= MAX_FEATURED {
            return Ok(ToggleOutcome::CapacityFull {
                limit: MAX_FEATURED,
            });
        }
        self.set_featured(article_id, value).await?;
        Ok(ToggleOutcome::Applied)
    }

    /// Toggles the per-category featured flag against that category's own
    /// slot budget. The article's category is read from its row.
    #[instrument(target = "db_query", level = "info", skip(self))]
    pub async fn set_featured_in_category_guarded(
        &self,
        article_id: i64,
        value: bool,
    ) -> Result<ToggleOutcome, sqlx::Error> {
        let article = self
            .get_article(article_id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)?;
        let category = Category::parse(&article.category).ok_or_else(|| {
            sqlx::Error::Decode(format!("unknown category: {}", article.category).into())
        })?;

        if value && self.count_featured_in_category(category).await? >= MAX_FEATURED_PER_CATEGORY {
            return Ok(ToggleOutcome::CapacityFull {
                limit: MAX_FEATURED_PER_CATEGORY,
            });
        }
        self.set_featured_in_category(article_id, value).await?;
        Ok(ToggleOutcome::Applied)
    }

    /// Toggles a popular flag, globally or within a category, through the
    /// explicit flag-column table.
    #[instrument(target = "db_query", level = "info", skip(self))]
    pub async fn set_popular(
        &self,
        article_id: i64,
        scope: PopularScope,
        value: bool,
    ) -> Result<(), sqlx::Error> {
        let column = match scope {
            PopularScope::Home => "popular",
            PopularScope::Category(category) => category.popular_flag_column(),
        };
        let result = sqlx::query(&format!("UPDATE blogs SET {} = ? WHERE id = ?", column))
            .bind(value)
            .bind(article_id)
            .execute(self.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }
        Ok(())
    }
}
