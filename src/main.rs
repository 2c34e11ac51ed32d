use anyhow::Result;
use tracing::info;

use techscope::api;
use techscope::db::Database;
use techscope::logging;

#[tokio::main]
async fn main() -> Result<()> {
    logging::configure_logging();

    info!("Starting techscope");

    // Open the pool and initialize the schema before accepting requests.
    Database::instance().await;

    api::api_loop().await
}
