use std::sync::Arc;

use crate::clock::Clock;
use crate::config::SessionConfig;
use crate::storage::database::DatabaseSessionDriver;
use crate::storage::errors::StorageError;
use crate::storage::file::FileSessionDriver;
use crate::storage::memory::MemorySessionDriver;
use crate::storage::redis::RedisSessionDriver;
use crate::storage::types::{DriverKind, SessionDriver};

/// Build the driver selected by `session.driver`.
pub async fn create_driver(
    config: &SessionConfig,
    clock: Arc<dyn Clock>,
) -> Result<Arc<dyn SessionDriver>, StorageError> {
    let url = || {
        config.driver_url.as_deref().ok_or_else(|| {
            StorageError::InvalidInput(format!("The {} driver requires a URL", config.driver))
        })
    };

    tracing::info!("Initializing session driver: {}", config.driver);

    let driver: Arc<dyn SessionDriver> = match config.driver {
        DriverKind::Memory => Arc::new(MemorySessionDriver::new(clock)),
        DriverKind::File => Arc::new(FileSessionDriver::new(url()?, clock).await?),
        DriverKind::Sqlite => {
            Arc::new(DatabaseSessionDriver::sqlite(url()?, &config.table, clock).await?)
        }
        DriverKind::Postgres => {
            Arc::new(DatabaseSessionDriver::postgres(url()?, &config.table, clock).await?)
        }
        DriverKind::Redis => Arc::new(RedisSessionDriver::new(url()?).await?),
    };

    Ok(driver)
}
