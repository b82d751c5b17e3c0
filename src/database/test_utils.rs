use tracing_subscriber::EnvFilter;

use crate::errors::StoreResult;
use crate::store::TagStore;

/// Routes tracing output, including generated SQL, to the test harness.
/// Safe to call from every test.
pub fn init_test_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("tagstore=debug,sqlx=debug,sea_orm=info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .without_time()
        .try_init();
}

/// In-memory store with the schema applied and logging wired up.
pub async fn setup_test_store() -> StoreResult<TagStore> {
    init_test_logging();
    TagStore::in_memory().await
}
