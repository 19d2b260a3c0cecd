use clap::Parser;
use whalewatch::cli::{self, output, Cli, Commands, RunArgs};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let result = match &cli.command {
        None => cli::run::execute(&cli.config, &RunArgs::default()).await,
        Some(Commands::Run(args)) => cli::run::execute(&cli.config, args).await,
        Some(Commands::Check) => cli::check::execute(&cli.config).await,
        Some(Commands::Trades(args)) => cli::inspect::execute_trades(&cli.config, args).await,
        Some(Commands::Failed(args)) => cli::inspect::execute_failed(&cli.config, args).await,
    };

    if let Err(e) = result {
        output::error(&e.to_string());
        std::process::exit(1);
    }
}
