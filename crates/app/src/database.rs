//! Database connection management

use std::{future::Future, time::Duration};

use sqlx::{PgPool, Postgres, Transaction, query, query_as};
use thiserror::Error;
use tokio::time::{error::Elapsed, timeout};

use shopsync::uuids::ShopUuid;

/// SQL used to set shop context for row-level security.
pub const SET_SHOP_CONTEXT_SQL: &str = "SELECT set_config('app.current_shop_uuid', $1, true)";

/// Default bound on a single store operation.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(15);

/// Connected role would bypass row-level security.
#[derive(Debug, Error)]
pub enum RlsRoleError {
    #[error("failed to inspect database role")]
    Sql(#[from] sqlx::Error),

    #[error("database role `{0}` bypasses row-level security; connect as the app role")]
    Bypasses(String),
}

#[derive(Debug, Clone)]
pub struct Db {
    pool: PgPool,
    timeout: Duration,
}

impl Db {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run `operation`, failing with [`Elapsed`] once the store timeout passes.
    ///
    /// # Errors
    ///
    /// Returns the operation's own error, or `E::from(Elapsed)` on timeout.
    pub async fn bounded<F, T, E>(&self, operation: F) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
        E: From<Elapsed>,
    {
        timeout(self.timeout, operation).await?
    }

    /// Begin a transaction and set shop context for RLS policies.
    ///
    /// # Errors
    ///
    /// Returns an error when starting the transaction or setting shop context fails.
    pub async fn begin_shop_transaction(
        &self,
        shop: ShopUuid,
    ) -> Result<Transaction<'static, Postgres>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        query(SET_SHOP_CONTEXT_SQL)
            .bind(shop.into_uuid().to_string())
            .execute(&mut *tx)
            .await?;

        Ok(tx)
    }
}

/// Connect to `PostgreSQL`.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPool::connect(database_url).await
}

/// Refuse to run as a role that bypasses row-level security.
///
/// # Errors
///
/// Returns an error when the connected role is a superuser or has `BYPASSRLS`.
pub async fn ensure_rls_enforced_role(pool: &PgPool) -> Result<(), RlsRoleError> {
    let (name, bypasses) = query_as::<_, (String, bool)>(
        "SELECT current_user::text, (rolsuper OR rolbypassrls) FROM pg_roles WHERE rolname = current_user",
    )
    .fetch_one(pool)
    .await?;

    if bypasses {
        return Err(RlsRoleError::Bypasses(name));
    }

    Ok(())
}
