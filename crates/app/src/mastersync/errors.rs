//! Master-sync errors.

use thiserror::Error;
use tokio::time::error::Elapsed;

#[derive(Debug, Error)]
pub enum MasterSyncError {
    #[error("master-sync store timed out")]
    Timeout(#[from] Elapsed),

    #[error("storage error")]
    Sql(#[from] sqlx::Error),
}
