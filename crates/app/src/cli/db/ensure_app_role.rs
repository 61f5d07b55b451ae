use clap::Args;
use shopsync_app::database;
use sqlx::{PgConnection, query, query_scalar};

/// Tables the runtime role reads and writes.
const APP_TABLES: [&str; 3] = [
    "documents",
    "master_sync_markers",
    "sale_channel_projections",
];

/// Flags that keep the runtime role subject to row-level security.
const ROLE_FLAGS: &str = "LOGIN NOSUPERUSER NOCREATEDB NOCREATEROLE NOREPLICATION NOBYPASSRLS";

#[derive(Debug, Args)]
pub(crate) struct EnsureAppRoleArgs {
    /// Administrative PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,

    /// Application runtime role name
    #[arg(long, default_value = "shopsync_app")]
    role_name: String,

    /// Application role password
    #[arg(long, env = "APP_DB_PASSWORD", hide_env_values = true)]
    password: String,
}

fn role_statement(exists: bool, role: &str, password: &str) -> String {
    let verb = if exists { "ALTER" } else { "CREATE" };

    format!("{verb} ROLE {role} {ROLE_FLAGS} PASSWORD {password}")
}

fn grant_statements(database: &str, role: &str) -> Vec<String> {
    let mut statements = vec![
        format!("GRANT CONNECT ON DATABASE {database} TO {role}"),
        format!("GRANT USAGE ON SCHEMA public TO {role}"),
    ];

    statements.extend(
        APP_TABLES
            .iter()
            .map(|table| format!("GRANT SELECT, INSERT, UPDATE, DELETE ON {table} TO {role}")),
    );

    statements
}

async fn quoted(conn: &mut PgConnection, function: &str, value: &str) -> Result<String, String> {
    query_scalar(&format!("SELECT {function}($1)"))
        .bind(value)
        .fetch_one(conn)
        .await
        .map_err(|error| format!("failed to run {function}: {error}"))
}

pub(crate) async fn run(args: EnsureAppRoleArgs) -> Result<(), String> {
    if args.role_name.trim().is_empty() {
        return Err("role_name cannot be empty".to_string());
    }

    if args.password.trim().is_empty() {
        return Err("password cannot be empty".to_string());
    }

    let pool = database::connect(&args.database_url)
        .await
        .map_err(|error| format!("failed to connect to database: {error}"))?;

    let mut tx = pool
        .begin()
        .await
        .map_err(|error| format!("failed to start transaction: {error}"))?;

    // Role identifiers cannot be bound; quote them server-side.
    let role = quoted(&mut tx, "quote_ident", &args.role_name).await?;
    let password = quoted(&mut tx, "quote_literal", &args.password).await?;

    let database: String = query_scalar("SELECT quote_ident(current_database())")
        .fetch_one(&mut *tx)
        .await
        .map_err(|error| format!("failed to resolve database name: {error}"))?;

    let exists: bool = query_scalar("SELECT EXISTS (SELECT 1 FROM pg_roles WHERE rolname = $1)")
        .bind(&args.role_name)
        .fetch_one(&mut *tx)
        .await
        .map_err(|error| format!("failed to check role existence: {error}"))?;

    query(&role_statement(exists, &role, &password))
        .execute(&mut *tx)
        .await
        .map_err(|error| format!("failed to create/update role: {error}"))?;

    for sql in grant_statements(&database, &role) {
        query(&sql)
            .execute(&mut *tx)
            .await
            .map_err(|error| format!("failed to apply `{sql}`: {error}"))?;
    }

    tx.commit()
        .await
        .map_err(|error| format!("failed to commit changes: {error}"))?;

    println!("app role ready: {}", args.role_name);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_never_bypasses_row_level_security() {
        let sql = role_statement(false, "\"shopsync_app\"", "'secret'");

        assert!(sql.starts_with("CREATE ROLE \"shopsync_app\""));
        assert!(sql.contains("NOBYPASSRLS"));
        assert!(sql.ends_with("PASSWORD 'secret'"));
        assert!(role_statement(true, "app", "'x'").starts_with("ALTER ROLE app"));
    }

    #[test]
    fn grants_cover_every_app_table() {
        let grants = grant_statements("shop", "app");

        assert_eq!(grants.len(), 2 + APP_TABLES.len());
        assert!(grants.iter().any(|sql| sql.ends_with("ON documents TO app")));
    }
}
