use crate::approve::{run_approve, ApproveArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use crewmatch::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "crewmatch",
    about = "Match approved job postings to skilled workers and fan out invitations",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Approve a job from a seed fixture and print the resulting invitations
    Approve(ApproveArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Approve(args) => run_approve(args).await,
    }
}
