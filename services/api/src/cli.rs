use crate::commands::{run_batch, run_lookup, BatchArgs, LookupArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use eligibility_lookup::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Eligibility Lookup",
    about = "Serve or run census tract eligibility lookups from the command line",
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
    /// Run every address in a CSV through the lookup and write a results CSV
    Batch(BatchArgs),
    /// Look up a single address and print the outcome as JSON
    Lookup(LookupArgs),
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
        Command::Batch(args) => run_batch(args).await,
        Command::Lookup(args) => run_lookup(args).await,
    }
}
