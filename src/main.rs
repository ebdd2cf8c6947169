use clap::Parser;
use team_key_provisioner::cli::{self, Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve => cli::serve::run().await,
        Command::Sign(args) => cli::sign::run(args),
    }
}
