use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "shelfd-cli", about = "Library catalog server", version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Launch the catalog server and bind it to the configured port
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => shelfd::run().await,
    }
}
