use clap::{Args, Subcommand};

mod run;

#[derive(Debug, Args)]
pub(crate) struct ProjectorCommand {
    #[command(subcommand)]
    command: ProjectorSubcommand,
}

#[derive(Debug, Subcommand)]
enum ProjectorSubcommand {
    /// Consume sale channel events into the local projection
    Run(run::RunArgs),
}

pub(crate) async fn run(command: ProjectorCommand) -> Result<(), String> {
    match command.command {
        ProjectorSubcommand::Run(args) => run::run(args).await,
    }
}
