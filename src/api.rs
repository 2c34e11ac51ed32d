use anyhow::Result;
use axum::body::Bytes;
use axum::extract::{Json, Path, Query};
use axum::http::{header::CONTENT_TYPE, HeaderMap};
use axum::routing::{get, post, put};
use axum::Router;
use axum_extra::extract::TypedHeader;
use axum_extra::headers::{authorization::Bearer, Authorization};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use once_cell::sync::Lazy;
use ring::rand::{SecureRandom, SystemRandom};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use tokio::net::TcpListener;
use tokio::time::Duration;
use tracing::{info, warn};

use crate::catalog::compare::MAX_COMPARED;
use crate::catalog::filter::{
    filter_articles, filter_products, popular_articles, sort_products, PopularScope,
};
use crate::catalog::rating::RatingStats;
use crate::catalog::types::{
    Article, Category, ExpertReview, Product, ProductKind, SortKey, UserReview,
};
use crate::catalog::{ComparisonSelector, Paginator, SpecRow};
use crate::db::{
    ArticleDraft, ArticleQuery, Database, ExpertReviewDraft, ProductDraft, ProductQuery,
    RatingSubmission, ToggleOutcome, MAX_FEATURED,
};
use crate::{environment, storage, ApiError, ApiResult, TARGET_API_REQUEST};

/// Page size for article listing tabs.
pub const ARTICLE_PAGE_SIZE: usize = 6;
/// Page size for the popular-articles sidebar.
pub const SIDEBAR_PAGE_SIZE: usize = 5;
/// Page size for product grids.
pub const PRODUCT_PAGE_SIZE: usize = 8;

/// Retries after a failed landing fetch, so each one gets three attempts.
const HOME_FETCH_RETRIES: usize = 2;
const HOME_RETRY_DELAY_MS: u64 = 1000;

#[derive(Serialize)]
struct AuthResponse {
    token: String,
}

#[derive(Serialize, Deserialize)]
struct Claims {
    sub: String,
    exp: usize,
}

#[derive(Deserialize)]
struct LoginRequest {
    password: String,
}

/// Static private key used for encoding and decoding JWT tokens.
static PRIVATE_KEY: Lazy<Mutex<Vec<u8>>> = Lazy::new(|| {
    let rng = SystemRandom::new();
    let mut key_bytes = vec![0u8; 32]; // 256-bit key for HMAC
    rng.fill(&mut key_bytes)
        .expect("Failed to generate secure random bytes");
    Mutex::new(key_bytes)
});

static ENCODING_KEY: Lazy<EncodingKey> = Lazy::new(|| {
    let key = PRIVATE_KEY.lock().unwrap();
    EncodingKey::from_secret(&key)
});

static DECODING_KEY: Lazy<DecodingKey> = Lazy::new(|| {
    let key = PRIVATE_KEY.lock().unwrap();
    DecodingKey::from_secret(&key)
});

/// Main application loop, setting up and running the Axum-based API server.
pub async fn api_loop() -> Result<()> {
    let app = Router::new()
        .route("/api/home", get(home))
        .route("/api/articles", get(list_articles))
        .route("/api/articles/{slug}", get(article_detail))
        .route("/api/products/{kind}", get(list_products))
        .route("/api/products/{kind}/{id}", get(product_detail))
        .route("/api/products/{kind}/{id}/reviews", get(product_reviews))
        .route("/api/products/{kind}/{id}/ratings", post(submit_product_rating))
        .route("/api/compare", post(compare_products))
        .route("/api/admin/login", post(admin_login))
        .route("/api/admin/articles", post(create_article))
        .route(
            "/api/admin/articles/{id}",
            put(update_article).delete(delete_article),
        )
        .route("/api/admin/articles/{id}/featured", post(set_featured))
        .route(
            "/api/admin/articles/{id}/category-featured",
            post(set_category_featured),
        )
        .route("/api/admin/articles/{id}/popular", post(set_popular))
        .route("/api/admin/products/{kind}", post(create_product))
        .route(
            "/api/admin/products/{kind}/{id}",
            put(update_product).delete(delete_product),
        )
        .route(
            "/api/admin/products/{kind}/{id}/expert-review",
            put(put_expert_review),
        )
        .route("/api/admin/uploads", post(upload_image));

    let port: u16 = environment::get_env_var_parsed("PORT", 8080);
    let addr = format!("0.0.0.0:{}", port);

    let listener = TcpListener::bind(&addr).await?;
    info!(target: TARGET_API_REQUEST, "Server running on http://{}", addr);

    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}

fn parse_category(s: &str) -> Result<Category, ApiError> {
    Category::parse(s).ok_or_else(|| ApiError::Validation(format!("unknown category: {}", s)))
}

fn parse_kind(s: &str) -> Result<ProductKind, ApiError> {
    ProductKind::parse(s)
        .ok_or_else(|| ApiError::Validation(format!("unknown product kind: {}", s)))
}

fn verify_token(token: &str) -> Result<String, ApiError> {
    decode::<Claims>(token, &DECODING_KEY, &Validation::new(Algorithm::HS256))
        .map(|data| data.claims.sub)
        .map_err(|e| {
            warn!(target: TARGET_API_REQUEST, "JWT validation failed: {:#?}", e);
            ApiError::Unauthorized("invalid or expired token".to_string())
        })
}

fn require_admin(auth_header: &TypedHeader<Authorization<Bearer>>) -> Result<(), ApiError> {
    verify_token(auth_header.token()).map(|_| ())
}

/// Runs a fetch with a fixed number of delayed retries. The landing page
/// calls this so a transient backend hiccup does not blank the whole page.
async fn with_retries<T, F, Fut>(what: &str, op: F) -> Result<T, sqlx::Error>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<T, sqlx::Error>>,
{
    for attempt in 1..=HOME_FETCH_RETRIES {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                warn!(
                    target: TARGET_API_REQUEST,
                    "{} fetch failed (attempt {}/{}), retrying in {}ms: {}",
                    what,
                    attempt,
                    HOME_FETCH_RETRIES + 1,
                    HOME_RETRY_DELAY_MS,
                    e
                );
                tokio::time::sleep(Duration::from_millis(HOME_RETRY_DELAY_MS)).await;
            }
        }
    }
    op().await
}

#[derive(Serialize)]
struct HomePayload {
    featured_articles: Vec<Article>,
    popular_articles: Vec<Article>,
    latest_mobiles: Vec<Product>,
}

/// Landing page payload: two retried fetches (recent articles, recent
/// mobiles), shaped in memory by `catalog::filter`.
async fn home() -> ApiResult<Json<HomePayload>> {
    let db = Database::instance().await;

    let article_query = ArticleQuery::default();
    let product_query = ProductQuery {
        limit: Some(PRODUCT_PAGE_SIZE as i64),
        ..Default::default()
    };

    let articles = with_retries("recent articles", || db.list_articles(&article_query)).await?;
    let latest_mobiles = with_retries("latest mobiles", || {
        db.list_products(ProductKind::Mobile, &product_query)
    })
    .await?;

    let featured_articles: Vec<Article> = articles
        .iter()
        .filter(|a| a.featured)
        .take(MAX_FEATURED as usize)
        .cloned()
        .collect();
    let popular: Vec<Article> = popular_articles(&articles, PopularScope::Home)
        .into_iter()
        .take(SIDEBAR_PAGE_SIZE)
        .cloned()
        .collect();

    Ok(Json(HomePayload {
        featured_articles,
        popular_articles: popular,
        latest_mobiles,
    }))
}

#[derive(Deserialize)]
struct ArticleListParams {
    category: Option<String>,
    subcategory: Option<String>,
    featured: Option<bool>,
    category_featured: Option<bool>,
    popular: Option<bool>,
    search: Option<String>,
    page: Option<usize>,
    sidebar: Option<bool>,
}

#[derive(Serialize)]
struct ArticleList {
    articles: Vec<Article>,
    page: usize,
    has_more: bool,
}

async fn list_articles(Query(params): Query<ArticleListParams>) -> ApiResult<Json<ArticleList>> {
    let db = Database::instance().await;

    let category = params.category.as_deref().map(parse_category).transpose()?;
    let popular = match (params.popular.unwrap_or(false), category) {
        (true, Some(category)) => Some(PopularScope::Category(category)),
        (true, None) => Some(PopularScope::Home),
        (false, _) => None,
    };
    if params.subcategory.is_some() && category.is_none() {
        return Err(ApiError::Validation(
            "subcategory requires a category".to_string(),
        ));
    }
    let key = ArticleQuery {
        category,
        featured: params.featured,
        featured_in_category: params.category_featured,
        popular,
        search: params.search,
        offset: None,
        limit: None,
    };

    let page = params.page.unwrap_or(0);
    let page_size = if params.sidebar.unwrap_or(false) {
        SIDEBAR_PAGE_SIZE
    } else {
        ARTICLE_PAGE_SIZE
    };

    let mut paginator = Paginator::resume(key, page_size, page);
    let Some(request) = paginator.begin() else {
        return Ok(Json(ArticleList {
            articles: Vec::new(),
            page,
            has_more: false,
        }));
    };

    let mut query = request.key.clone();
    query.offset = Some(request.offset);
    query.limit = Some(request.limit);
    let rows = db.list_articles(&query).await?;
    paginator.complete(request, rows);

    // Subcategory tabs narrow the fetched page in memory, so a filtered
    // page can hold fewer than page_size items while has_more still
    // reflects the raw fetch.
    let has_more = paginator.has_more();
    let mut articles = paginator.into_items();
    if let (Some(category), Some(sub)) = (category, params.subcategory.as_deref()) {
        articles = filter_articles(&articles, category, Some(sub))
            .into_iter()
            .cloned()
            .collect();
    }

    Ok(Json(ArticleList {
        page,
        has_more,
        articles,
    }))
}

/// Article detail by slug. Every successful fetch counts as a view.
async fn article_detail(Path(slug): Path<String>) -> ApiResult<Json<Article>> {
    let db = Database::instance().await;
    let article = db
        .get_article_by_slug(&slug)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("no article with slug: {}", slug)))?;

    db.increment_view_count(article.id).await?;
    Ok(Json(article))
}

#[derive(Deserialize)]
struct ProductListParams {
    brand: Option<String>,
    search: Option<String>,
    sort: Option<String>,
    page: Option<usize>,
}

#[derive(Serialize)]
struct ProductList {
    products: Vec<Product>,
    page: usize,
    has_more: bool,
}

async fn list_products(
    Path(kind): Path<String>,
    Query(params): Query<ProductListParams>,
) -> ApiResult<Json<ProductList>> {
    let db = Database::instance().await;
    let kind = parse_kind(&kind)?;

    // "all" from the brand dropdown means no brand filter.
    let brand = params
        .brand
        .filter(|b| !b.eq_ignore_ascii_case("all"));
    let key = ProductQuery {
        brand,
        sort: params.sort.as_deref().map(SortKey::parse),
        offset: None,
        limit: None,
    };

    let page = params.page.unwrap_or(0);
    let mut paginator = Paginator::resume(key, PRODUCT_PAGE_SIZE, page);
    let Some(request) = paginator.begin() else {
        return Ok(Json(ProductList {
            products: Vec::new(),
            page,
            has_more: false,
        }));
    };

    let mut query = request.key.clone();
    query.offset = Some(request.offset);
    query.limit = Some(request.limit);
    let rows = db.list_products(kind, &query).await?;
    paginator.complete(request, rows);

    // Name search narrows the fetched page in memory; has_more reflects
    // the raw fetch.
    let has_more = paginator.has_more();
    let mut products = paginator.into_items();
    if let Some(search) = params.search.as_deref() {
        products = filter_products(&products, None, Some(search))
            .into_iter()
            .cloned()
            .collect();
    }

    Ok(Json(ProductList {
        page,
        has_more,
        products,
    }))
}

#[derive(Serialize)]
struct ProductDetail {
    product: Product,
    variants: Vec<Product>,
    expert_review: Option<ExpertReview>,
    rating_stats: RatingStats,
}

async fn product_detail(
    Path((kind, id)): Path<(String, i64)>,
) -> ApiResult<Json<ProductDetail>> {
    let db = Database::instance().await;
    let kind = parse_kind(&kind)?;

    let product = db
        .get_product(kind, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("no {} product: {}", kind.as_str(), id)))?;
    let mut variants = db.list_variants(kind, &product.name, &product.brand).await?;
    sort_products(&mut variants, SortKey::PriceLowHigh);
    let expert_review = db.get_expert_review(id).await?;
    let rating_stats = db.product_rating_stats(id).await?;

    Ok(Json(ProductDetail {
        product,
        variants,
        expert_review,
        rating_stats,
    }))
}

async fn product_reviews(
    Path((kind, id)): Path<(String, i64)>,
) -> ApiResult<Json<Vec<UserReview>>> {
    let db = Database::instance().await;
    parse_kind(&kind)?;
    Ok(Json(db.list_user_reviews(id).await?))
}

#[derive(Deserialize)]
struct RatingRequest {
    stars: i64,
    user_name: Option<String>,
    review_text: Option<String>,
}

async fn submit_product_rating(
    Path((kind, id)): Path<(String, i64)>,
    Json(payload): Json<RatingRequest>,
) -> ApiResult<Json<RatingSubmission>> {
    let db = Database::instance().await;
    let kind = parse_kind(&kind)?;

    if !(1..=5).contains(&payload.stars) {
        return Err(ApiError::Validation(format!(
            "rating must be between 1 and 5, got {}",
            payload.stars
        )));
    }
    db.get_product(kind, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("no {} product: {}", kind.as_str(), id)))?;

    let user_name = payload
        .user_name
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| "Anonymous".to_string());
    let outcome = db
        .submit_rating(id, payload.stars, &user_name, payload.review_text.as_deref())
        .await?;

    Ok(Json(outcome))
}

#[derive(Deserialize)]
struct CompareRequest {
    kind: String,
    product_ids: Vec<i64>,
}

#[derive(Serialize)]
struct CompareResponse {
    products: Vec<Product>,
    rows: Vec<SpecRow>,
}

/// Builds the side-by-side comparison table. The first id is the anchor;
/// duplicates are collapsed.
async fn compare_products(Json(payload): Json<CompareRequest>) -> ApiResult<Json<CompareResponse>> {
    let db = Database::instance().await;
    let kind = parse_kind(&payload.kind)?;

    if payload.product_ids.is_empty() {
        return Err(ApiError::Validation(
            "at least one product id is required".to_string(),
        ));
    }
    if payload.product_ids.len() > MAX_COMPARED {
        return Err(ApiError::Validation(format!(
            "at most {} products can be compared",
            MAX_COMPARED
        )));
    }

    let mut products = Vec::with_capacity(payload.product_ids.len());
    for id in &payload.product_ids {
        let product = db.get_product(kind, *id).await?.ok_or_else(|| {
            ApiError::NotFound(format!("no {} product: {}", kind.as_str(), id))
        })?;
        products.push(product);
    }

    let mut iter = products.into_iter();
    let Some(anchor) = iter.next() else {
        return Err(ApiError::Validation(
            "at least one product id is required".to_string(),
        ));
    };
    let mut selector = ComparisonSelector::new(anchor);
    for product in iter {
        selector.add(product);
    }

    Ok(Json(CompareResponse {
        rows: selector.table(),
        products: selector.products().to_vec(),
    }))
}

async fn admin_login(Json(payload): Json<LoginRequest>) -> ApiResult<Json<AuthResponse>> {
    let expected = std::env::var("ADMIN_PASSWORD")
        .map_err(|_| ApiError::Unauthorized("admin login is not configured".to_string()))?;
    if payload.password != expected {
        warn!(target: TARGET_API_REQUEST, "Admin login attempt with wrong password");
        return Err(ApiError::Unauthorized("invalid password".to_string()));
    }

    let claims = Claims {
        sub: "admin".to_string(),
        exp: (chrono::Utc::now() + chrono::Duration::hours(24)).timestamp() as usize,
    };
    let token = encode(&Header::new(Algorithm::HS256), &claims, &ENCODING_KEY)
        .expect("Failed to encode JWT");

    info!(target: TARGET_API_REQUEST, "Admin logged in");
    Ok(Json(AuthResponse { token }))
}

#[derive(Serialize)]
struct CreatedResponse {
    id: i64,
}

async fn create_article(
    auth_header: TypedHeader<Authorization<Bearer>>,
    Json(draft): Json<ArticleDraft>,
) -> ApiResult<Json<CreatedResponse>> {
    require_admin(&auth_header)?;
    let db = Database::instance().await;
    let id = db.insert_article(&draft).await?;
    Ok(Json(CreatedResponse { id }))
}

async fn update_article(
    auth_header: TypedHeader<Authorization<Bearer>>,
    Path(id): Path<i64>,
    Json(draft): Json<ArticleDraft>,
) -> ApiResult<Json<serde_json::Value>> {
    require_admin(&auth_header)?;
    let db = Database::instance().await;
    db.update_article(id, &draft).await?;
    Ok(Json(serde_json::json!({ "ok": true })))
}

async fn delete_article(
    auth_header: TypedHeader<Authorization<Bearer>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<serde_json::Value>> {
    require_admin(&auth_header)?;
    let db = Database::instance().await;
    db.delete_article(id).await?;
    Ok(Json(serde_json::json!({ "ok": true })))
}

#[derive(Deserialize)]
struct FlagRequest {
    value: bool,
}

/// Toggles the home-page featured flag. The slot check is advisory: it
/// reads the current count and can race a concurrent toggle.
async fn set_featured(
    auth_header: TypedHeader<Authorization<Bearer>>,
    Path(id): Path<i64>,
    Json(payload): Json<FlagRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    require_admin(&auth_header)?;
    let db = Database::instance().await;

    match db.set_featured_guarded(id, payload.value).await? {
        ToggleOutcome::Applied => Ok(Json(serde_json::json!({ "ok": true }))),
        ToggleOutcome::CapacityFull { limit } => Err(ApiError::CapacityExceeded(format!(
            "all {} home featured slots are taken",
            limit
        ))),
    }
}

async fn set_category_featured(
    auth_header: TypedHeader<Authorization<Bearer>>,
    Path(id): Path<i64>,
    Json(payload): Json<FlagRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    require_admin(&auth_header)?;
    let db = Database::instance().await;

    match db.set_featured_in_category_guarded(id, payload.value).await? {
        ToggleOutcome::Applied => Ok(Json(serde_json::json!({ "ok": true }))),
        ToggleOutcome::CapacityFull { limit } => Err(ApiError::CapacityExceeded(format!(
            "all {} category featured slots are taken",
            limit
        ))),
    }
}

#[derive(Deserialize)]
struct PopularRequest {
    value: bool,
    category: Option<String>,
}

async fn set_popular(
    auth_header: TypedHeader<Authorization<Bearer>>,
    Path(id): Path<i64>,
    Json(payload): Json<PopularRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    require_admin(&auth_header)?;
    let db = Database::instance().await;

    let scope = match payload.category.as_deref() {
        Some(category) => PopularScope::Category(parse_category(category)?),
        None => PopularScope::Home,
    };
    db.set_popular(id, scope, payload.value).await?;
    Ok(Json(serde_json::json!({ "ok": true })))
}

async fn create_product(
    auth_header: TypedHeader<Authorization<Bearer>>,
    Path(kind): Path<String>,
    Json(draft): Json<ProductDraft>,
) -> ApiResult<Json<CreatedResponse>> {
    require_admin(&auth_header)?;
    let db = Database::instance().await;
    let kind = parse_kind(&kind)?;
    let id = db.insert_product(kind, &draft).await?;
    Ok(Json(CreatedResponse { id }))
}

async fn update_product(
    auth_header: TypedHeader<Authorization<Bearer>>,
    Path((kind, id)): Path<(String, i64)>,
    Json(draft): Json<ProductDraft>,
) -> ApiResult<Json<serde_json::Value>> {
    require_admin(&auth_header)?;
    let db = Database::instance().await;
    let kind = parse_kind(&kind)?;
    db.update_product(kind, id, &draft).await?;
    Ok(Json(serde_json::json!({ "ok": true })))
}

async fn delete_product(
    auth_header: TypedHeader<Authorization<Bearer>>,
    Path((kind, id)): Path<(String, i64)>,
) -> ApiResult<Json<serde_json::Value>> {
    require_admin(&auth_header)?;
    let db = Database::instance().await;
    let kind = parse_kind(&kind)?;
    db.delete_product(kind, id).await?;
    Ok(Json(serde_json::json!({ "ok": true })))
}

async fn put_expert_review(
    auth_header: TypedHeader<Authorization<Bearer>>,
    Path((kind, id)): Path<(String, i64)>,
    Json(draft): Json<ExpertReviewDraft>,
) -> ApiResult<Json<CreatedResponse>> {
    require_admin(&auth_header)?;
    let db = Database::instance().await;
    let kind = parse_kind(&kind)?;

    if !(0.0..=10.0).contains(&draft.rating) {
        return Err(ApiError::Validation(format!(
            "expert rating must be between 0 and 10, got {}",
            draft.rating
        )));
    }
    db.get_product(kind, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("no {} product: {}", kind.as_str(), id)))?;

    let review_id = db.upsert_expert_review(id, &draft).await?;
    Ok(Json(CreatedResponse { id: review_id }))
}

#[derive(Deserialize)]
struct UploadParams {
    folder: Option<String>,
}

#[derive(Serialize)]
struct UploadResponse {
    url: String,
}

async fn upload_image(
    auth_header: TypedHeader<Authorization<Bearer>>,
    Query(params): Query<UploadParams>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<UploadResponse>> {
    require_admin(&auth_header)?;

    let folder = params.folder.unwrap_or_else(|| "main".to_string());
    if folder != "main" && folder != "gallery" {
        return Err(ApiError::Validation(format!("unknown folder: {}", folder)));
    }
    if body.is_empty() {
        return Err(ApiError::Validation("empty upload body".to_string()));
    }
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("image/jpeg")
        .to_string();

    let url = storage::upload_image(body.to_vec(), &folder, &content_type)
        .await
        .ok_or_else(|| ApiError::Storage("image upload failed".to_string()))?;

    Ok(Json(UploadResponse { url }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_verifies() {
        let claims = Claims {
            sub: "admin".to_string(),
            exp: (chrono::Utc::now() + chrono::Duration::hours(1)).timestamp() as usize,
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &ENCODING_KEY).unwrap();
        assert_eq!(verify_token(&token).unwrap(), "admin");
    }

    #[test]
    fn garbage_token_is_rejected() {
        assert!(matches!(
            verify_token("not-a-jwt"),
            Err(ApiError::Unauthorized(_))
        ));
    }

    #[test]
    fn expired_token_is_rejected() {
        let claims = Claims {
            sub: "admin".to_string(),
            exp: (chrono::Utc::now() - chrono::Duration::hours(1)).timestamp() as usize,
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &ENCODING_KEY).unwrap();
        assert!(verify_token(&token).is_err());
    }

    #[test]
    fn kind_parsing_rejects_unknown_kinds() {
        assert_eq!(parse_kind("laptop").unwrap(), ProductKind::Laptop);
        assert_eq!(parse_kind("MOBILE").unwrap(), ProductKind::Mobile);
        assert!(parse_kind("tablet").is_err());
    }

    #[tokio::test]
    async fn landing_fetch_recovers_after_a_transient_failure() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let calls = AtomicUsize::new(0);
        let result = with_retries("recent articles", || {
            let attempt = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt == 0 {
                    Err(sqlx::Error::PoolClosed)
                } else {
                    Ok(7)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn landing_fetch_gives_up_after_three_attempts() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let calls = AtomicUsize::new(0);
        let result = with_retries("latest mobiles", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<i32, sqlx::Error>(sqlx::Error::PoolClosed) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), HOME_FETCH_RETRIES + 1);
    }
}
