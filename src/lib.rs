pub mod api;
pub mod catalog;
pub mod db;
pub mod environment;
pub mod error;
pub mod logging;
pub mod storage;
pub mod util;

pub const TARGET_API_REQUEST: &str = "api_request";
pub const TARGET_DB: &str = "db_query";
pub const TARGET_STORAGE: &str = "storage";

pub use error::{ApiError, ApiResult};
