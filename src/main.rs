use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

mod api;
mod cache;
mod cli;
mod config;
mod error;
mod forms;
mod model;
mod nodes;
mod output;
mod session;
mod tui;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // The TUI sets up its own file logging
    if !matches!(cli.command, Commands::Tui(_)) {
        // Initialize tracing - only show logs with --verbose
        let filter = if cli.verbose {
            EnvFilter::new("planctl=debug")
        } else {
            EnvFilter::new("planctl=warn")
        };

        fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }

    match cli.command {
        Commands::Login(args) => cli::auth::login(&cli.global, args).await,
        Commands::Logout => cli::auth::logout(&cli.global),
        Commands::Me => cli::auth::me(&cli.global).await,
        Commands::Nodes { command } => cli::nodes::execute(&cli.global, command).await,
        Commands::Scenarios { command } => cli::scenarios::execute(&cli.global, command).await,
        Commands::Services { command } => cli::services::execute(&cli.global, command).await,
        Commands::Tui(args) => cli::tui::execute(&cli.global, args, cli.verbose).await,
        Commands::Schema => cli::schema::execute(),
    }
}
