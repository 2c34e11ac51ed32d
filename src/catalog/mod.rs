//! Aggregation layer: the pure data-shaping logic that turns fetched rows
//! into filtered, paginated, compared view models.

pub mod compare;
pub mod filter;
pub mod pagination;
pub mod rating;
pub mod types;

pub use self::compare::{AddOutcome, ComparisonSelector, SpecRow, MAX_COMPARED};
pub use self::pagination::{PageRequest, Paginator};
pub use self::rating::RatingStats;
pub use self::types::*;
