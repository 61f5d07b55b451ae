//! Throwaway `PostgreSQL` databases for store tests.
//!
//! One container is started per test binary. Every [`TestDb`] is a fresh
//! database inside it with the shopsync migrations applied.

use once_cell::sync::Lazy;
use sqlx::{Connection, PgConnection, PgPool, query};
use testcontainers::{ContainerAsync, ImageExt, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres as PostgresImage;
use tokio::sync::OnceCell;
use uuid::Uuid;

const ADMIN_USER: &str = "shopsync_test";
const ADMIN_PASSWORD: &str = "shopsync_test_password";

/// Runtime role the services connect as. Created with the same flags
/// `shopsync-app db ensure-app-role` uses, so row-level security applies.
const APP_ROLE: &str = "shopsync_app_test";
const APP_PASSWORD: &str = "shopsync_app_test_password";

static POSTGRES: Lazy<OnceCell<ContainerAsync<PostgresImage>>> = Lazy::new(OnceCell::new);

async fn start_postgres() -> ContainerAsync<PostgresImage> {
    PostgresImage::default()
        .with_user(ADMIN_USER)
        .with_password(ADMIN_PASSWORD)
        .with_db_name("shopsync_test")
        .start()
        .await
        .expect("Failed to start PostgreSQL container")
}

/// `host:port` of the shared container.
async fn server_address() -> String {
    let container = POSTGRES.get_or_init(start_postgres).await;

    let port = container
        .get_host_port_ipv4(5432)
        .await
        .expect("Failed to get container port");

    let host = std::env::var("TESTCONTAINERS_HOST_OVERRIDE")
        .unwrap_or_else(|_| "localhost".to_string());

    format!("{host}:{port}")
}

fn url_for(server: &str, user: &str, password: &str, database: &str) -> String {
    format!("postgresql://{user}:{password}@{server}/{database}")
}

#[derive(Debug)]
pub struct TestDb {
    /// Superuser pool; bypasses row-level security.
    pub pool: PgPool,

    pub name: String,

    server: String,
}

impl TestDb {
    /// Create a uniquely named database and migrate it.
    pub async fn new() -> Self {
        let server = server_address().await;
        let name = format!("shopsync_{}", Uuid::now_v7().simple());

        let maintenance = url_for(&server, ADMIN_USER, ADMIN_PASSWORD, "postgres");

        let mut admin = PgConnection::connect(&maintenance)
            .await
            .expect("Failed to connect to the maintenance database");

        query(&format!("CREATE DATABASE \"{name}\""))
            .execute(&mut admin)
            .await
            .expect("Failed to create test database");

        admin.close().await.expect("Failed to close admin connection");

        let pool = PgPool::connect(&url_for(&server, ADMIN_USER, ADMIN_PASSWORD, &name))
            .await
            .expect("Failed to connect to test database");

        sqlx::migrate!("../../migrations")
            .run(&pool)
            .await
            .expect("Failed to run migrations");

        Self { pool, name, server }
    }

    /// Pool connected as the row-level-security-bound runtime role.
    pub async fn app_pool(&self) -> PgPool {
        let mut admin = self
            .pool
            .acquire()
            .await
            .expect("Failed to acquire admin connection");

        // Roles are server-wide and tests run in parallel; 42710 and 23505 mean
        // another test created it first.
        if let Err(error) = query(&format!(
            "CREATE ROLE {APP_ROLE} LOGIN PASSWORD '{APP_PASSWORD}' \
             NOSUPERUSER NOCREATEDB NOCREATEROLE NOREPLICATION NOBYPASSRLS"
        ))
        .execute(&mut *admin)
        .await
        {
            let code = error.as_database_error().and_then(|error| error.code());

            assert!(
                matches!(code.as_deref(), Some("42710" | "23505")),
                "Failed to create app role: {error}"
            );
        }

        for statement in [
            format!("GRANT CONNECT ON DATABASE \"{}\" TO {APP_ROLE}", self.name),
            format!("GRANT USAGE ON SCHEMA public TO {APP_ROLE}"),
            format!(
                "GRANT SELECT, INSERT, UPDATE, DELETE ON ALL TABLES IN SCHEMA public TO {APP_ROLE}"
            ),
        ] {
            query(&statement)
                .execute(&mut *admin)
                .await
                .expect("Failed to grant app role privileges");
        }

        PgPool::connect(&url_for(&self.server, APP_ROLE, APP_PASSWORD, &self.name))
            .await
            .expect("Failed to connect as app role")
    }
}

#[cfg(test)]
mod tests {
    use sqlx::query_scalar;
    use testresult::TestResult;

    use super::*;

    #[tokio::test]
    async fn migrations_create_every_app_table() -> TestResult {
        let db = TestDb::new().await;

        for table in ["documents", "master_sync_markers", "sale_channel_projections"] {
            let exists: bool = query_scalar("SELECT to_regclass($1) IS NOT NULL")
                .bind(table)
                .fetch_one(&db.pool)
                .await?;

            assert!(exists, "{table} missing after migrations");
        }

        Ok(())
    }

    #[tokio::test]
    async fn databases_do_not_share_rows() -> TestResult {
        let first = TestDb::new().await;
        let second = TestDb::new().await;

        assert_ne!(first.name, second.name);

        query(
            "INSERT INTO master_sync_markers (shop_id, module, changed_at) \
             VALUES ($1, 'saleChannel', now())",
        )
        .bind(Uuid::now_v7())
        .execute(&first.pool)
        .await?;

        let count: i64 = query_scalar("SELECT count(*) FROM master_sync_markers")
            .fetch_one(&second.pool)
            .await?;

        assert_eq!(count, 0);

        Ok(())
    }
}
