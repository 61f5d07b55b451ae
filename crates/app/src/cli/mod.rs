use clap::{Parser, Subcommand};

mod db;
mod projector;

#[derive(Debug, Parser)]
#[command(name = "shopsync-app", about = "Shopsync CLI", long_about = None)]
pub(crate) struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Db(db::DbCommand),
    Projector(projector::ProjectorCommand),
}

impl Cli {
    pub(crate) async fn run(self) -> Result<(), String> {
        match self.command {
            Commands::Db(command) => db::run(command).await,
            Commands::Projector(command) => projector::run(command).await,
        }
    }
}
