use std::sync::Arc;

use clap::Args;
use tracing::info;
use tracing_subscriber::EnvFilter;

use shopsync_app::{
    database::{self, Db},
    events::NatsMessageBus,
    projection::{PgProjectionStore, ProjectionHandler, ProjectionWorker},
    salechannels::SaleChannelRow,
    settings::{BusArgs, StoreArgs},
};

#[derive(Debug, Args)]
pub(crate) struct RunArgs {
    #[command(flatten)]
    store: StoreArgs,

    #[command(flatten)]
    bus: BusArgs,

    /// Consumer group; each group receives every event once
    #[arg(long, env = "PROJECTOR_GROUP", default_value = "projector")]
    group: String,
}

pub(crate) async fn run(args: RunArgs) -> Result<(), String> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let pool = database::connect(&args.store.database_url)
        .await
        .map_err(|error| format!("failed to connect to database: {error}"))?;

    database::ensure_rls_enforced_role(&pool)
        .await
        .map_err(|error| error.to_string())?;

    let db = Db::new(pool).with_timeout(args.store.store_timeout());

    let bus = NatsMessageBus::connect(&args.bus.nats_url)
        .await
        .map_err(|error| error.to_string())?;

    let topics = args.bus.topics();

    let handler = Arc::new(ProjectionHandler::new(
        PgProjectionStore::<SaleChannelRow>::new(db),
        topics.clone(),
    ));

    let worker = ProjectionWorker::new(handler, bus.jetstream().clone(), topics, args.group);

    tokio::select! {
        result = worker.run() => result.map_err(|error| error.to_string()),
        _ = tokio::signal::ctrl_c() => {
            info!("interrupt received, stopping projector");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use testresult::TestResult;

    use super::*;

    #[derive(Debug, Parser)]
    struct Projector {
        #[command(flatten)]
        run: RunArgs,
    }

    #[test]
    fn accepts_the_same_flags_as_the_api_server() -> TestResult {
        let args = Projector::try_parse_from([
            "projector",
            "--database-url",
            "postgres://localhost/shopsync",
            "--subject-prefix",
            "staging",
            "--store-timeout-seconds",
            "5",
        ])?;

        assert_eq!(args.run.bus.subject_prefix, "staging");
        assert_eq!(args.run.store.store_timeout_seconds, 5);
        assert_eq!(args.run.group, "projector");

        Ok(())
    }
}
