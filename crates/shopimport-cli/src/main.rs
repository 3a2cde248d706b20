mod commands;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "shopimport-cli")]
#[command(about = "Product import pipeline command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Extract a product record from a listing URL and print it as JSON.
    ///
    /// Talks to the upstream site directly; no cache or import log involved.
    Import {
        /// The listing URL to import.
        url: String,
    },
    /// List the supported platforms.
    Platforms,
    /// Show the most recent import log entries (requires DATABASE_URL).
    Recent {
        /// Maximum number of entries to show.
        #[arg(long, default_value_t = 20)]
        limit: i64,
        /// Restrict to one user identity (hex hash as stored in the log).
        #[arg(long)]
        user: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Import { url } => commands::run_import(&url).await,
        Commands::Platforms => {
            commands::run_platforms();
            Ok(())
        }
        Commands::Recent { limit, user } => commands::run_recent(limit, user.as_deref()).await,
    }
}
