mod article;
mod core;
mod product;
mod rating;
mod review;
mod schema;

pub use article::{
    ArticleDraft, ArticleQuery, ToggleOutcome, MAX_FEATURED, MAX_FEATURED_PER_CATEGORY,
};
pub use core::{Database, DbLockErrorExt};
pub use product::{ProductDraft, ProductQuery};
pub use rating::RatingSubmission;
pub use review::ExpertReviewDraft;

pub use sqlx::Row;
